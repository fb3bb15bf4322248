//! Read-side projections over inventory snapshots.
//!
//! # Responsibility
//! - Derive the filtered material list, per-category statistics and totals.
//! - Filter and group journal entries for the journal view.
//!
//! # Invariants
//! - Every function is pure over its inputs; nothing here touches storage.
//! - Input ordering is preserved wherever a function filters.

use crate::model::category::ALL_CATEGORIES;
use crate::model::material::Material;
use crate::model::usage_log::{UsageEventKind, UsageLogEntry};
use chrono::{TimeZone, Utc};

/// Units held in one category and their share of the whole inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStat {
    pub category: String,
    pub units: i64,
    /// Share of total units, 0-100.
    pub percentage: f64,
}

/// Headline numbers for the stats view.
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySummary {
    pub total_items: usize,
    pub total_units: i64,
    pub categories_used: usize,
    pub top_category: Option<String>,
    pub stats: Vec<CategoryStat>,
}

/// Journal filter chip selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalFilter {
    #[default]
    All,
    Kind(UsageEventKind),
}

impl JournalFilter {
    /// Parses `All` or an event wire string (`ADDED`, `USED`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case(ALL_CATEGORIES) {
            return Some(Self::All);
        }
        UsageEventKind::parse(&trimmed.to_ascii_uppercase()).map(Self::Kind)
    }

    fn matches(self, entry: &UsageLogEntry) -> bool {
        match self {
            Self::All => true,
            Self::Kind(kind) => entry.kind == kind,
        }
    }
}

/// Journal entries sharing one calendar month (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup {
    /// `YYYY-MM`.
    pub month: String,
    pub entries: Vec<UsageLogEntry>,
}

/// Materials whose name or description contains `search` (case-insensitive),
/// restricted to `category` unless it is the `All` sentinel.
pub fn filter_materials(materials: &[Material], search: &str, category: &str) -> Vec<Material> {
    let needle = search.to_lowercase();
    materials
        .iter()
        .filter(|material| {
            material.name.to_lowercase().contains(&needle)
                || material.description.to_lowercase().contains(&needle)
        })
        .filter(|material| category == ALL_CATEGORIES || material.category == category)
        .cloned()
        .collect()
}

/// Sum of all material quantities.
pub fn total_units(materials: &[Material]) -> i64 {
    materials.iter().map(|material| material.quantity).sum()
}

/// Per-category unit totals for the known `categories`.
///
/// Categories holding zero units are left out; the result is sorted by units,
/// largest first, keeping category order for ties. Percentages are relative
/// to all units, including those under category names no longer in the list.
pub fn category_stats(materials: &[Material], categories: &[String]) -> Vec<CategoryStat> {
    let total = total_units(materials);
    if total == 0 {
        return Vec::new();
    }

    let mut stats: Vec<CategoryStat> = categories
        .iter()
        .map(|category| {
            let units = materials
                .iter()
                .filter(|material| &material.category == category)
                .map(|material| material.quantity)
                .sum::<i64>();
            CategoryStat {
                category: category.clone(),
                units,
                percentage: units as f64 / total as f64 * 100.0,
            }
        })
        .filter(|stat| stat.units > 0)
        .collect();
    stats.sort_by(|left, right| right.units.cmp(&left.units));
    stats
}

pub fn inventory_summary(materials: &[Material], categories: &[String]) -> InventorySummary {
    let stats = category_stats(materials, categories);
    InventorySummary {
        total_items: materials.len(),
        total_units: total_units(materials),
        categories_used: stats.len(),
        top_category: stats.first().map(|stat| stat.category.clone()),
        stats,
    }
}

pub fn filter_logs(logs: &[UsageLogEntry], filter: JournalFilter) -> Vec<UsageLogEntry> {
    logs.iter()
        .filter(|entry| filter.matches(entry))
        .cloned()
        .collect()
}

/// Groups entries by UTC month in first-seen order.
///
/// With newest-first input, months come out newest first and entries keep
/// their order inside each month.
pub fn group_logs_by_month(logs: &[UsageLogEntry]) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();
    for entry in logs {
        let month = month_key(entry.timestamp);
        match groups.iter_mut().find(|group| group.month == month) {
            Some(group) => group.entries.push(entry.clone()),
            None => groups.push(MonthGroup {
                month,
                entries: vec![entry.clone()],
            }),
        }
    }
    groups
}

fn month_key(epoch_ms: i64) -> String {
    match Utc.timestamp_millis_opt(epoch_ms).single() {
        Some(at) => at.format("%Y-%m").to_string(),
        None => "unknown".to_string(),
    }
}
