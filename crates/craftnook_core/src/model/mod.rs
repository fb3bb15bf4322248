//! Inventory domain model.
//!
//! # Responsibility
//! - Define the records owned by the store: materials, categories and
//!   usage-journal entries.
//! - Hold the validation rules shared by repositories and services.
//!
//! # Invariants
//! - Every material and journal entry is identified by a stable string id.
//! - Material quantity is never negative.
//! - Journal entries are append-only snapshots, never live references.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category;
pub mod material;
pub mod usage_log;

/// Field-level validation failure for inventory records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Stored quantity would drop below zero.
    NegativeQuantity(i64),
    /// New materials must start with at least one unit.
    NonPositiveInitialQuantity(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} cannot be empty"),
            Self::NegativeQuantity(value) => {
                write!(f, "quantity cannot be negative (got {value})")
            }
            Self::NonPositiveInitialQuantity(value) => {
                write!(f, "quantity must be greater than 0 (got {value})")
            }
        }
    }
}

impl Error for ValidationError {}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
