//! Category domain model.
//!
//! # Invariants
//! - `name` is the identity; storage rejects exact duplicates silently.
//! - Names are trimmed and inner whitespace runs collapse to one space.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Filter sentinel meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Categories seeded on first database creation, alphabetical.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "A4 Notebooks",
    "A5 Notebooks",
    "Alcohol Markers",
    "Brushes",
    "Colored Pencils",
    "Crayons",
    "Drawing Pencils",
    "Erasers",
    "Fineliners",
    "Fountain Pen Cartridges",
    "Glitter Pens",
    "Highlighters",
    "Mechanical Pencil Leads",
    "Mechanical Pencils",
    "Metallic Pens",
    "Paint",
    "Paper",
    "Pens",
    "Water-based Markers",
    "White Pens",
];

/// User-managed grouping label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    /// Whether the row came from the seeded default set.
    pub is_default: bool,
}

/// Normalizes a user-entered category name.
///
/// Returns `None` for blank input.
pub fn normalize_category_name(name: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(name.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}
