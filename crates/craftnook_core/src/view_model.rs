//! Inventory view-model: UI-facing state plus derived projections.
//!
//! # Responsibility
//! - Hold transient UI state (search text, category filter, pending
//!   quantity confirmation, last error, last backup result).
//! - Route user actions to services and push fresh snapshots to
//!   subscribers after every write.
//! - Recompute filtered lists and statistics from the store on read.
//!
//! # Invariants
//! - Derived views are pure functions of store contents plus UI state.
//! - A failed action leaves store and UI state as they were and records a
//!   human-readable error message.
//! - Deleting the selected category resets the filter to `All`; materials
//!   keep their category string.

use crate::media::image_store::ImageStore;
use crate::model::category::{normalize_category_name, ALL_CATEGORIES};
use crate::model::material::{Material, NewMaterial};
use crate::model::usage_log::UsageLogEntry;
use crate::repo::category_repo::SqliteCategoryRepository;
use crate::repo::material_repo::SqliteMaterialRepository;
use crate::repo::usage_log_repo::SqliteUsageLogRepository;
use crate::service::backup_service::{BackupError, BackupService, ExportSummary, ImportSummary};
use crate::service::category_service::{CategoryAddOutcome, CategoryService};
use crate::service::inventory_service::{
    InventoryError, InventoryResult, InventoryService, JournaledChange,
    PendingQuantityConfirmation, QuantityDecision, UpdateOutcome,
};
use crate::service::projection::{
    self, CategoryStat, InventorySummary, JournalFilter, MonthGroup,
};
use crate::watch::{ChangeFeed, Subscription};
use log::warn;
use rusqlite::Connection;
use std::fmt::Display;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

type SqliteInventoryService<'conn> =
    InventoryService<SqliteMaterialRepository<'conn>, SqliteUsageLogRepository<'conn>>;
type SqliteBackupService<'conn> =
    BackupService<SqliteMaterialRepository<'conn>, SqliteUsageLogRepository<'conn>>;

/// Result of the latest export/import, shown once then cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    ExportSuccess,
    ImportSuccess {
        materials_added: usize,
        logs_added: usize,
    },
    Failure(String),
}

/// View-model bound to one SQLite connection.
pub struct InventoryViewModel<'conn> {
    inventory: SqliteInventoryService<'conn>,
    categories: CategoryService<SqliteCategoryRepository<'conn>>,
    backup: SqliteBackupService<'conn>,
    feed: Arc<ChangeFeed>,
    search_query: String,
    selected_category: String,
    pending_confirmation: Option<PendingQuantityConfirmation>,
    error_message: Option<String>,
    backup_result: Option<BackupOutcome>,
}

impl<'conn> InventoryViewModel<'conn> {
    /// Creates a view-model with a private change feed.
    pub fn new(conn: &'conn Connection, images: ImageStore) -> Self {
        Self::with_feed(conn, images, Arc::new(ChangeFeed::new()))
    }

    /// Creates a view-model publishing into a shared change feed.
    pub fn with_feed(conn: &'conn Connection, images: ImageStore, feed: Arc<ChangeFeed>) -> Self {
        let materials = SqliteMaterialRepository::new(conn);
        let logs = SqliteUsageLogRepository::new(conn);
        Self {
            inventory: InventoryService::new(materials, logs, images.clone()),
            categories: CategoryService::new(SqliteCategoryRepository::new(conn)),
            backup: BackupService::new(materials, logs, images),
            feed,
            search_query: String::new(),
            selected_category: ALL_CATEGORIES.to_string(),
            pending_confirmation: None,
            error_message: None,
            backup_result: None,
        }
    }

    pub fn feed(&self) -> Arc<ChangeFeed> {
        Arc::clone(&self.feed)
    }

    // UI state

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn selected_category(&self) -> &str {
        &self.selected_category
    }

    pub fn select_category(&mut self, category: impl Into<String>) {
        self.selected_category = category.into();
    }

    pub fn pending_confirmation(&self) -> Option<&PendingQuantityConfirmation> {
        self.pending_confirmation.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    pub fn backup_result(&self) -> Option<&BackupOutcome> {
        self.backup_result.as_ref()
    }

    pub fn clear_backup_result(&mut self) {
        self.backup_result = None;
    }

    // Derived views

    pub fn all_materials(&self) -> InventoryResult<Vec<Material>> {
        self.inventory.list_materials()
    }

    /// Materials matching the current search text and category filter.
    pub fn filtered_materials(&self) -> InventoryResult<Vec<Material>> {
        let materials = self.inventory.list_materials()?;
        Ok(projection::filter_materials(
            &materials,
            &self.search_query,
            &self.selected_category,
        ))
    }

    pub fn available_categories(&self) -> InventoryResult<Vec<String>> {
        self.categories.list_categories()
    }

    pub fn category_stats(&self) -> InventoryResult<Vec<CategoryStat>> {
        let materials = self.inventory.list_materials()?;
        let categories = self.categories.list_categories()?;
        Ok(projection::category_stats(&materials, &categories))
    }

    pub fn total_units(&self) -> InventoryResult<i64> {
        let materials = self.inventory.list_materials()?;
        Ok(projection::total_units(&materials))
    }

    pub fn summary(&self) -> InventoryResult<InventorySummary> {
        let materials = self.inventory.list_materials()?;
        let categories = self.categories.list_categories()?;
        Ok(projection::inventory_summary(&materials, &categories))
    }

    /// Journal entries, newest first.
    pub fn log_entries(&self) -> InventoryResult<Vec<UsageLogEntry>> {
        self.inventory.list_logs()
    }

    /// Journal entries filtered by kind and grouped by month.
    pub fn journal(&self, filter: JournalFilter) -> InventoryResult<Vec<MonthGroup>> {
        let logs = self.inventory.list_logs()?;
        Ok(projection::group_logs_by_month(&projection::filter_logs(
            &logs, filter,
        )))
    }

    // Subscriptions

    pub fn subscribe_materials(&self) -> InventoryResult<Subscription<Vec<Material>>> {
        Ok(self
            .feed
            .subscribe_materials(self.inventory.list_materials()?))
    }

    pub fn subscribe_categories(&self) -> InventoryResult<Subscription<Vec<String>>> {
        Ok(self
            .feed
            .subscribe_categories(self.categories.list_categories()?))
    }

    pub fn subscribe_logs(&self) -> InventoryResult<Subscription<Vec<UsageLogEntry>>> {
        Ok(self.feed.subscribe_logs(self.inventory.list_logs()?))
    }

    // Category actions

    /// Adds a category. Blank names are ignored and return `Ok(None)`.
    pub fn add_category(&mut self, name: &str) -> InventoryResult<Option<CategoryAddOutcome>> {
        if normalize_category_name(name).is_none() {
            return Ok(None);
        }
        let outcome = self.record(self.categories.add_category(name))?;
        if matches!(outcome, CategoryAddOutcome::Added(_)) {
            self.publish_categories();
        }
        Ok(Some(outcome))
    }

    /// Removes a category; resets the filter when it was the selected one.
    pub fn delete_category(&mut self, name: &str) -> InventoryResult<bool> {
        let removed = self.record(self.categories.delete_category(name))?;
        if self.selected_category == name {
            self.selected_category = ALL_CATEGORIES.to_string();
        }
        if removed {
            self.publish_categories();
        }
        Ok(removed)
    }

    // Inventory actions

    pub fn add_material(&mut self, request: NewMaterial) -> InventoryResult<JournaledChange> {
        self.error_message = None;
        let result = self.inventory.add_material(request);
        if inventory_written(&result) {
            self.publish_inventory();
        }
        self.record(result)
    }

    /// Saves an edited material.
    ///
    /// A quantity decrease is held as the pending confirmation until
    /// [`Self::confirm_quantity_change`] or
    /// [`Self::dismiss_quantity_confirmation`] is called.
    pub fn update_material(&mut self, material: Material) -> InventoryResult<UpdateOutcome> {
        self.error_message = None;
        let result = self.inventory.update_material(material);
        if inventory_written(&result) {
            self.publish_inventory();
        }
        let outcome = self.record(result)?;
        // Any saved edit supersedes an earlier unanswered reduction.
        self.pending_confirmation = match &outcome {
            UpdateOutcome::NeedsConfirmation(pending) => Some(pending.clone()),
            UpdateOutcome::Unchanged(_) | UpdateOutcome::Restocked(_) => None,
        };
        Ok(outcome)
    }

    /// Resolves the pending reduction: `true` journals `Used`, `false`
    /// journals a `Restocked` correction. No-op without a pending value.
    pub fn confirm_quantity_change(
        &mut self,
        was_used: bool,
    ) -> InventoryResult<Option<UsageLogEntry>> {
        let Some(pending) = self.pending_confirmation.take() else {
            return Ok(None);
        };
        let entry = self.record(
            self.inventory
                .resolve_quantity_change(&pending, QuantityDecision::from_was_used(was_used)),
        )?;
        self.publish_logs();
        Ok(Some(entry))
    }

    /// Drops the pending reduction without journaling anything.
    pub fn dismiss_quantity_confirmation(&mut self) {
        self.pending_confirmation = None;
    }

    pub fn delete_material(&mut self, id: &str) -> InventoryResult<JournaledChange> {
        self.error_message = None;
        let result = self.inventory.delete_material(id);
        if inventory_written(&result) {
            if self
                .pending_confirmation
                .as_ref()
                .is_some_and(|pending| pending.material.id == id)
            {
                self.pending_confirmation = None;
            }
            self.publish_inventory();
        }
        self.record(result)
    }

    /// Direct quantity write; does not journal.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) -> InventoryResult<()> {
        self.error_message = None;
        self.record(self.inventory.set_quantity(id, quantity))?;
        self.publish_materials();
        Ok(())
    }

    pub fn clear_journal(&mut self) -> InventoryResult<usize> {
        let removed = self.record(self.inventory.clear_journal())?;
        self.publish_logs();
        Ok(removed)
    }

    // Backup actions

    pub fn export_backup(&mut self, writer: impl Write) -> Result<ExportSummary, BackupError> {
        let result = self.backup.export_to_writer(writer);
        self.backup_result = Some(match &result {
            Ok(_) => BackupOutcome::ExportSuccess,
            Err(err) => BackupOutcome::Failure(err.to_string()),
        });
        result
    }

    pub fn export_backup_to_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<ExportSummary, BackupError> {
        match std::fs::File::create(path) {
            Ok(file) => self.export_backup(file),
            Err(err) => {
                let err = BackupError::from(err);
                self.backup_result = Some(BackupOutcome::Failure(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn import_backup(&mut self, reader: impl Read) -> Result<ImportSummary, BackupError> {
        let result = self.backup.import_from_reader(reader);
        self.backup_result = Some(match &result {
            Ok(summary) => BackupOutcome::ImportSuccess {
                materials_added: summary.materials_imported,
                logs_added: summary.logs_imported,
            },
            Err(err) => BackupOutcome::Failure(err.to_string()),
        });
        // Partial imports leave rows behind, so subscribers refresh either way.
        self.publish_inventory();
        result
    }

    pub fn import_backup_from_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<ImportSummary, BackupError> {
        match std::fs::File::open(path) {
            Ok(file) => self.import_backup(file),
            Err(err) => {
                let err = BackupError::from(err);
                self.backup_result = Some(BackupOutcome::Failure(err.to_string()));
                Err(err)
            }
        }
    }

    fn record<T, E: Display>(&mut self, result: Result<T, E>) -> Result<T, E> {
        if let Err(err) = &result {
            self.error_message = Some(err.to_string());
        }
        result
    }

    fn publish_inventory(&self) {
        self.publish_materials();
        self.publish_logs();
    }

    fn publish_materials(&self) {
        match self.inventory.list_materials() {
            Ok(snapshot) => self.feed.publish_materials(snapshot),
            Err(err) => log_publish_failure("materials", &err),
        }
    }

    fn publish_logs(&self) {
        match self.inventory.list_logs() {
            Ok(snapshot) => self.feed.publish_logs(snapshot),
            Err(err) => log_publish_failure("usage_logs", &err),
        }
    }

    fn publish_categories(&self) {
        match self.categories.list_categories() {
            Ok(snapshot) => self.feed.publish_categories(snapshot),
            Err(err) => log_publish_failure("categories", &err),
        }
    }
}

/// Whether the inventory row was written, even if its journal entry failed.
fn inventory_written<T>(result: &InventoryResult<T>) -> bool {
    matches!(result, Ok(_) | Err(InventoryError::Journal { .. }))
}

fn log_publish_failure(collection: &str, err: &dyn Display) {
    warn!("event=feed_publish module=view_model status=error collection={collection} error={err}");
}
