//! Core domain logic for CraftNook, a craft-supply inventory.
//! This crate is the single source of truth for inventory invariants.

pub mod db;
pub mod logging;
pub mod media;
pub mod model;
pub mod repo;
pub mod service;
pub mod view_model;
pub mod watch;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use media::image_store::{ImageStore, ImageStoreError};
pub use model::category::{Category, ALL_CATEGORIES, DEFAULT_CATEGORIES};
pub use model::material::{Material, MaterialId, NewMaterial};
pub use model::usage_log::{UsageEventKind, UsageLogEntry};
pub use model::ValidationError;
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::material_repo::{
    MaterialRepository, RepoError, RepoResult, SqliteMaterialRepository,
};
pub use repo::usage_log_repo::{SqliteUsageLogRepository, UsageLogRepository};
pub use service::backup_service::{
    BackupEnvelope, BackupError, BackupService, ExportSummary, ImportSummary,
};
pub use service::category_service::{CategoryAddOutcome, CategoryService};
pub use service::inventory_service::{
    InventoryError, InventoryResult, InventoryService, JournaledChange,
    PendingQuantityConfirmation, QuantityDecision, UpdateOutcome,
};
pub use service::projection::{CategoryStat, InventorySummary, JournalFilter, MonthGroup};
pub use view_model::{BackupOutcome, InventoryViewModel};
pub use watch::{ChangeFeed, Subscription};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
