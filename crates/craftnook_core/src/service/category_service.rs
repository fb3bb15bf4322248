//! Category use-case service.
//!
//! # Invariants
//! - Added names are normalized (trimmed, whitespace collapsed).
//! - A name matching an existing one case-insensitively is not inserted.
//! - Removing a category leaves materials that reference it untouched.

use crate::model::category::{normalize_category_name, Category};
use crate::model::ValidationError;
use crate::repo::category_repo::CategoryRepository;
use crate::service::inventory_service::InventoryResult;
use log::info;

/// Outcome of an add-category request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryAddOutcome {
    Added(String),
    /// An existing category already uses this name, ignoring case.
    AlreadyExists(String),
}

/// Use-case service wrapper for category management.
pub struct CategoryService<C: CategoryRepository> {
    repo: C,
}

impl<C: CategoryRepository> CategoryService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Category names, A to Z.
    pub fn list_categories(&self) -> InventoryResult<Vec<String>> {
        Ok(self.repo.list_categories()?)
    }

    pub fn list_category_records(&self) -> InventoryResult<Vec<Category>> {
        Ok(self.repo.list_category_records()?)
    }

    /// Adds a user category.
    ///
    /// Blank names are rejected with `Validation`.
    pub fn add_category(&self, name: &str) -> InventoryResult<CategoryAddOutcome> {
        let normalized =
            normalize_category_name(name).ok_or(ValidationError::BlankField("category"))?;

        let existing = self.repo.list_categories()?;
        if let Some(found) = existing
            .into_iter()
            .find(|current| current.to_lowercase() == normalized.to_lowercase())
        {
            return Ok(CategoryAddOutcome::AlreadyExists(found));
        }

        self.repo.insert_category(&normalized)?;
        info!("event=category_add module=category status=ok");
        Ok(CategoryAddOutcome::Added(normalized))
    }

    /// Removes a category by exact name. Returns whether a row was removed.
    pub fn delete_category(&self, name: &str) -> InventoryResult<bool> {
        let removed = self.repo.delete_category(name)?;
        info!("event=category_delete module=category status=ok removed={removed}");
        Ok(removed)
    }
}
