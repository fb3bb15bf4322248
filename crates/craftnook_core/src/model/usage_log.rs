//! Usage-journal entry model.
//!
//! # Responsibility
//! - Define the append-only event record written for inventory mutations.
//! - Map event kinds to their stable wire/storage strings.
//!
//! # Invariants
//! - Entries are never mutated after insert.
//! - `material_name`/`category` are snapshots taken at event time.
//! - `quantity_after` is the material quantity right after the event.

use super::material::Material;
use super::now_epoch_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of inventory-affecting event.
///
/// A downward correction is recorded as `Restocked`; there is no separate
/// correction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageEventKind {
    Added,
    Restocked,
    Used,
    Deleted,
}

impl UsageEventKind {
    pub const ALL: [UsageEventKind; 4] = [Self::Added, Self::Restocked, Self::Used, Self::Deleted];

    /// Stable storage string (`ADDED|RESTOCKED|USED|DELETED`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "ADDED",
            Self::Restocked => "RESTOCKED",
            Self::Used => "USED",
            Self::Deleted => "DELETED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADDED" => Some(Self::Added),
            "RESTOCKED" => Some(Self::Restocked),
            "USED" => Some(Self::Used),
            "DELETED" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Human-readable label for journal rows and filter chips.
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Restocked => "Restocked",
            Self::Used => "Used",
            Self::Deleted => "Deleted",
        }
    }
}

/// One usage-journal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLogEntry {
    pub id: String,
    pub material_id: String,
    pub material_name: String,
    pub category: String,
    #[serde(rename = "eventType")]
    pub kind: UsageEventKind,
    /// Positive = gained, negative = consumed or deleted.
    pub quantity_delta: i64,
    pub quantity_after: i64,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl UsageLogEntry {
    /// Builds a fresh entry snapshotting `material` at the current time.
    pub fn record(
        material: &Material,
        kind: UsageEventKind,
        quantity_delta: i64,
        quantity_after: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            material_id: material.id.clone(),
            material_name: material.name.clone(),
            category: material.category.clone(),
            kind,
            quantity_delta,
            quantity_after,
            timestamp: now_epoch_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UsageEventKind;

    #[test]
    fn event_kind_strings_roundtrip() {
        for kind in UsageEventKind::ALL {
            assert_eq!(UsageEventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(UsageEventKind::parse("CORRECTED"), None);
    }

    #[test]
    fn event_kind_serializes_as_screaming_case() {
        let json = serde_json::to_string(&UsageEventKind::Restocked).unwrap();
        assert_eq!(json, "\"RESTOCKED\"");
    }
}
