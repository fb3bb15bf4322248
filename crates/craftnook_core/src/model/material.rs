//! Material domain model.
//!
//! # Responsibility
//! - Define the inventory row tracked per craft supply.
//! - Build new rows with the defaults applied on "add".
//!
//! # Invariants
//! - `id` is stable and never reused for another material.
//! - `quantity >= 0` at all times.
//! - `category` is a soft reference to a category name; it may outlive the
//!   category it names.

use super::{now_epoch_ms, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one material row.
pub type MaterialId = String;

/// Description stored when the caller leaves it blank.
pub const DEFAULT_DESCRIPTION: &str = "No brand specified";
/// Unit label stored when the caller leaves it blank.
pub const DEFAULT_UNIT: &str = "unit";

/// One trackable craft-supply inventory row.
///
/// Serialized in camelCase because the same shape is written to backups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub quantity: i64,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Path to the photo file. Owned photos live under the image store root.
    #[serde(default)]
    pub photo_uri: Option<String>,
    /// Unix epoch milliseconds of the last write.
    #[serde(default)]
    pub last_updated: i64,
}

impl Material {
    /// Validates fields that must hold for every persisted row.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::BlankField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("name"));
        }
        if self.quantity < 0 {
            return Err(ValidationError::NegativeQuantity(self.quantity));
        }
        Ok(())
    }
}

/// Input for the "add material" use-case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewMaterial {
    pub name: String,
    /// Brand or free-text description.
    pub description: String,
    pub category: String,
    pub quantity: i64,
    /// Falls back to [`DEFAULT_UNIT`] when `None` or blank.
    pub unit: Option<String>,
    pub photo_uri: Option<String>,
}

impl NewMaterial {
    pub fn new(name: impl Into<String>, quantity: i64, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            category: category.into(),
            ..Self::default()
        }
    }

    /// Checks the add-only rules: non-blank name and a strictly positive
    /// starting quantity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("name"));
        }
        if self.quantity <= 0 {
            return Err(ValidationError::NonPositiveInitialQuantity(self.quantity));
        }
        Ok(())
    }

    /// Materializes a row with a generated id and defaults applied.
    pub fn into_material(self) -> Material {
        let description = if self.description.trim().is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            self.description
        };
        let unit = self
            .unit
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(default_unit);

        Material {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            description,
            category: self.category,
            quantity: self.quantity,
            unit,
            photo_uri: self.photo_uri,
            last_updated: now_epoch_ms(),
        }
    }
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}
