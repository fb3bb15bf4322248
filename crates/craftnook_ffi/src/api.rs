//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose inventory, category, journal, stats and backup use-cases to
//!   Dart via FRB as flat sync functions.
//! - Translate every core error into a response envelope.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Each call opens its own connection; no state is held between calls
//!   besides the resolved storage paths.
//! - A quantity reduction is only journaled once the host answers it through
//!   [`inventory_confirm_quantity`].

use craftnook_core::db::open_db;
use craftnook_core::service::backup_service::BackupResult;
use craftnook_core::service::projection::{self, JournalFilter, MonthGroup};
use craftnook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BackupService, CategoryAddOutcome, CategoryService, ImageStore, InventoryError,
    InventoryResult, InventoryService, Material, MaterialRepository, NewMaterial,
    PendingQuantityConfirmation, QuantityDecision, SqliteCategoryRepository,
    SqliteMaterialRepository, SqliteUsageLogRepository, UpdateOutcome, UsageLogEntry,
};
use log::warn;
use rusqlite::Connection;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::OnceLock;

const DB_FILE_NAME: &str = "craftnook.sqlite3";
const FILES_DIR_NAME: &str = "craftnook_files";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static FILES_DIR: OnceLock<PathBuf> = OnceLock::new();

type FfiInventory<'conn> =
    InventoryService<SqliteMaterialRepository<'conn>, SqliteUsageLogRepository<'conn>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Material row as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub quantity: i64,
    pub unit: String,
    pub photo_uri: Option<String>,
    /// Unix epoch milliseconds.
    pub last_updated: i64,
}

/// Editable material fields sent from Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialInput {
    pub name: String,
    pub description: String,
    pub category: String,
    pub quantity: i64,
    /// Blank means `unit` on add and the current unit on update.
    pub unit: String,
    pub photo_uri: Option<String>,
}

/// Journal entry as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageLogItem {
    pub id: String,
    pub material_id: String,
    pub material_name: String,
    pub category: String,
    /// `ADDED|RESTOCKED|USED|DELETED`.
    pub event_type: String,
    pub quantity_delta: i64,
    pub quantity_after: i64,
    pub timestamp: i64,
}

/// Journal entries for one `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalMonth {
    pub month: String,
    pub entries: Vec<UsageLogItem>,
}

/// Quantity reduction waiting for a used/correction answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuantityItem {
    pub material_id: String,
    pub old_quantity: i64,
    pub new_quantity: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStatItem {
    pub category: String,
    pub units: i64,
    pub percentage: f64,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialListResponse {
    pub ok: bool,
    pub items: Vec<MaterialItem>,
    pub message: String,
}

/// Response for add/delete material calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialActionResponse {
    pub ok: bool,
    pub material: Option<MaterialItem>,
    pub message: String,
}

impl MaterialActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            material: None,
            message: message.into(),
        }
    }
}

/// Response for a full material update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryUpdateResponse {
    pub ok: bool,
    pub material: Option<MaterialItem>,
    /// Present when the quantity went down; answer with
    /// [`inventory_confirm_quantity`].
    pub pending: Option<PendingQuantityItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListResponse {
    pub ok: bool,
    pub items: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalResponse {
    pub ok: bool,
    pub months: Vec<JournalMonth>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsResponse {
    pub ok: bool,
    pub total_items: u32,
    pub total_units: i64,
    pub categories_used: u32,
    pub top_category: Option<String>,
    pub stats: Vec<CategoryStatItem>,
    pub message: String,
}

/// Backup result; counts are rows written (export) or newly inserted (import).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupResponse {
    pub ok: bool,
    pub materials: u32,
    pub usage_logs: u32,
    pub message: String,
}

impl BackupResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            materials: 0,
            usage_logs: 0,
            message: message.into(),
        }
    }
}

/// Lists materials filtered by search text and category (`All` for none).
#[flutter_rust_bridge::frb(sync)]
pub fn inventory_list(search: String, category: String) -> MaterialListResponse {
    let category = if category.trim().is_empty() {
        craftnook_core::ALL_CATEGORIES.to_string()
    } else {
        category
    };
    match with_inventory(|inventory| inventory.list_materials()) {
        Ok(materials) => {
            let items = projection::filter_materials(&materials, search.trim(), &category)
                .into_iter()
                .map(to_material_item)
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No materials.".to_string()
            } else {
                format!("Found {} material(s).", items.len())
            };
            MaterialListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => MaterialListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("inventory_list failed: {err}"),
        },
    }
}

/// Adds a material and journals `ADDED`.
#[flutter_rust_bridge::frb(sync)]
pub fn inventory_add(input: MaterialInput) -> MaterialActionResponse {
    let request = NewMaterial {
        name: input.name.trim().to_string(),
        description: input.description.trim().to_string(),
        category: input.category.trim().to_string(),
        quantity: input.quantity,
        unit: Some(input.unit),
        photo_uri: input.photo_uri,
    };
    match with_inventory(|inventory| inventory.add_material(request)) {
        Ok(change) => MaterialActionResponse {
            ok: true,
            material: Some(to_material_item(change.material)),
            message: "Material added.".to_string(),
        },
        Err(err) => MaterialActionResponse::failure(format!("inventory_add failed: {err}")),
    }
}

/// Replaces an existing material.
///
/// A quantity increase is journaled as `RESTOCKED` right away. A decrease is
/// stored but returned as `pending` with nothing journaled.
#[flutter_rust_bridge::frb(sync)]
pub fn inventory_update(id: String, input: MaterialInput) -> InventoryUpdateResponse {
    let result = with_inventory(|inventory| {
        let current = inventory
            .get_material(&id)?
            .ok_or_else(|| InventoryError::NotFound(id.clone()))?;
        let unit = if input.unit.trim().is_empty() {
            current.unit.clone()
        } else {
            input.unit.trim().to_string()
        };
        let edited = Material {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            category: input.category.trim().to_string(),
            quantity: input.quantity,
            unit,
            photo_uri: input.photo_uri,
            ..current
        };
        inventory.update_material(edited)
    });

    match result {
        Ok(UpdateOutcome::NeedsConfirmation(pending)) => InventoryUpdateResponse {
            ok: true,
            pending: Some(PendingQuantityItem {
                material_id: pending.material.id.clone(),
                old_quantity: pending.old_quantity,
                new_quantity: pending.new_quantity,
            }),
            material: Some(to_material_item(pending.material)),
            message: "Quantity reduced; confirm usage.".to_string(),
        },
        Ok(outcome) => InventoryUpdateResponse {
            ok: true,
            material: Some(to_material_item(outcome.material().clone())),
            pending: None,
            message: "Material updated.".to_string(),
        },
        Err(err) => InventoryUpdateResponse {
            ok: false,
            material: None,
            pending: None,
            message: format!("inventory_update failed: {err}"),
        },
    }
}

/// Journals a pending reduction: `was_used` records `USED`, otherwise the
/// change is recorded as a `RESTOCKED` correction.
#[flutter_rust_bridge::frb(sync)]
pub fn inventory_confirm_quantity(pending: PendingQuantityItem, was_used: bool) -> ActionResponse {
    if pending.new_quantity >= pending.old_quantity {
        return ActionResponse::failure(
            "inventory_confirm_quantity failed: new_quantity must be lower than old_quantity",
        );
    }
    let result = with_inventory(|inventory| {
        let material = inventory
            .get_material(&pending.material_id)?
            .ok_or_else(|| InventoryError::NotFound(pending.material_id.clone()))?;
        let pending = PendingQuantityConfirmation {
            material,
            old_quantity: pending.old_quantity,
            new_quantity: pending.new_quantity,
        };
        inventory.resolve_quantity_change(&pending, QuantityDecision::from_was_used(was_used))
    });
    match result {
        Ok(entry) => ActionResponse::success(format!("Recorded as {}.", entry.kind.label())),
        Err(err) => ActionResponse::failure(format!("inventory_confirm_quantity failed: {err}")),
    }
}

/// Deletes a material and journals `DELETED`.
#[flutter_rust_bridge::frb(sync)]
pub fn inventory_delete(id: String) -> MaterialActionResponse {
    match with_inventory(|inventory| inventory.delete_material(&id)) {
        Ok(change) => MaterialActionResponse {
            ok: true,
            material: Some(to_material_item(change.material)),
            message: "Material deleted.".to_string(),
        },
        Err(err) => MaterialActionResponse::failure(format!("inventory_delete failed: {err}")),
    }
}

/// Writes a quantity directly; nothing is journaled.
#[flutter_rust_bridge::frb(sync)]
pub fn inventory_set_quantity(id: String, quantity: i64) -> ActionResponse {
    match with_inventory(|inventory| inventory.set_quantity(&id, quantity)) {
        Ok(()) => ActionResponse::success("Quantity updated."),
        Err(err) => ActionResponse::failure(format!("inventory_set_quantity failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn category_list() -> CategoryListResponse {
    match with_connection(|conn| {
        CategoryService::new(SqliteCategoryRepository::new(conn)).list_categories()
    }) {
        Ok(items) => CategoryListResponse {
            ok: true,
            message: format!("Found {} categor(ies).", items.len()),
            items,
        },
        Err(err) => CategoryListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("category_list failed: {err}"),
        },
    }
}

/// Adds a category; blank names and case-insensitive duplicates are no-ops.
#[flutter_rust_bridge::frb(sync)]
pub fn category_add(name: String) -> ActionResponse {
    if name.trim().is_empty() {
        return ActionResponse::success("Blank category ignored.");
    }
    match with_connection(|conn| {
        CategoryService::new(SqliteCategoryRepository::new(conn)).add_category(&name)
    }) {
        Ok(CategoryAddOutcome::Added(name)) => {
            ActionResponse::success(format!("Category `{name}` added."))
        }
        Ok(CategoryAddOutcome::AlreadyExists(name)) => {
            ActionResponse::success(format!("Category `{name}` already exists."))
        }
        Err(err) => ActionResponse::failure(format!("category_add failed: {err}")),
    }
}

/// Removes a category. Materials keep their category text.
#[flutter_rust_bridge::frb(sync)]
pub fn category_delete(name: String) -> ActionResponse {
    match with_connection(|conn| {
        CategoryService::new(SqliteCategoryRepository::new(conn)).delete_category(&name)
    }) {
        Ok(true) => ActionResponse::success("Category deleted."),
        Ok(false) => ActionResponse::success("Category not found."),
        Err(err) => ActionResponse::failure(format!("category_delete failed: {err}")),
    }
}

/// Journal grouped by month, newest first.
///
/// `filter` is `All` or one of `ADDED|RESTOCKED|USED|DELETED`.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_list(filter: String) -> JournalResponse {
    let Some(filter) = JournalFilter::parse(&filter) else {
        return JournalResponse {
            ok: false,
            months: Vec::new(),
            message: format!("journal_list failed: unknown filter `{}`", filter.trim()),
        };
    };
    match with_inventory(|inventory| inventory.list_logs()) {
        Ok(logs) => {
            let months = projection::group_logs_by_month(&projection::filter_logs(&logs, filter))
                .into_iter()
                .map(to_journal_month)
                .collect::<Vec<_>>();
            JournalResponse {
                ok: true,
                message: format!("Found {} month(s).", months.len()),
                months,
            }
        }
        Err(err) => JournalResponse {
            ok: false,
            months: Vec::new(),
            message: format!("journal_list failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn stats_overview() -> StatsResponse {
    let result = with_connection(|conn| -> InventoryResult<_> {
        let materials = SqliteMaterialRepository::new(conn).list_materials()?;
        let categories =
            CategoryService::new(SqliteCategoryRepository::new(conn)).list_categories()?;
        Ok(projection::inventory_summary(&materials, &categories))
    });
    match result {
        Ok(summary) => StatsResponse {
            ok: true,
            total_items: saturating_u32(summary.total_items),
            total_units: summary.total_units,
            categories_used: saturating_u32(summary.categories_used),
            top_category: summary.top_category,
            stats: summary
                .stats
                .into_iter()
                .map(|stat| CategoryStatItem {
                    category: stat.category,
                    units: stat.units,
                    percentage: stat.percentage,
                })
                .collect(),
            message: "Stats computed.".to_string(),
        },
        Err(err) => StatsResponse {
            ok: false,
            total_items: 0,
            total_units: 0,
            categories_used: 0,
            top_category: None,
            stats: Vec::new(),
            message: format!("stats_overview failed: {err}"),
        },
    }
}

/// Writes a JSON backup with inline photos to `path`.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_export(path: String) -> BackupResponse {
    match with_backup(|backup| backup.export_to_path(path.trim())) {
        Ok(summary) => BackupResponse {
            ok: true,
            materials: saturating_u32(summary.materials),
            usage_logs: saturating_u32(summary.usage_logs),
            message: format!("Exported {} material(s).", summary.materials),
        },
        Err(err) => BackupResponse::failure(format!("backup_export failed: {err}")),
    }
}

/// Merges the backup at `path` into the store without overwriting rows.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_import(path: String) -> BackupResponse {
    match with_backup(|backup| backup.import_from_path(path.trim())) {
        Ok(summary) => BackupResponse {
            ok: true,
            materials: saturating_u32(summary.materials_imported),
            usage_logs: saturating_u32(summary.logs_imported),
            message: format!(
                "Imported {} material(s) and {} log entr(ies).",
                summary.materials_imported, summary.logs_imported
            ),
        },
        Err(err) => BackupResponse::failure(format!("backup_import failed: {err}")),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            env_path("CRAFTNOOK_DB_PATH").unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
        })
        .clone()
}

fn resolve_files_dir() -> PathBuf {
    FILES_DIR
        .get_or_init(|| {
            env_path("CRAFTNOOK_FILES_DIR")
                .unwrap_or_else(|| std::env::temp_dir().join(FILES_DIR_NAME))
        })
        .clone()
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn with_connection<T, E: Display>(
    f: impl FnOnce(&Connection) -> Result<T, E>,
) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error error={err}");
        format!("DB open failed: {err}")
    })?;
    f(&conn).map_err(|err| err.to_string())
}

fn image_store() -> Result<ImageStore, String> {
    ImageStore::new(resolve_files_dir()).map_err(|err| format!("image store init failed: {err}"))
}

fn with_inventory<T>(f: impl FnOnce(&FfiInventory<'_>) -> InventoryResult<T>) -> Result<T, String> {
    let images = image_store()?;
    with_connection(|conn| {
        let inventory = InventoryService::new(
            SqliteMaterialRepository::new(conn),
            SqliteUsageLogRepository::new(conn),
            images,
        );
        f(&inventory)
    })
}

fn with_backup<T>(
    f: impl FnOnce(
        &BackupService<SqliteMaterialRepository<'_>, SqliteUsageLogRepository<'_>>,
    ) -> BackupResult<T>,
) -> Result<T, String> {
    let images = image_store()?;
    with_connection(|conn| {
        let backup = BackupService::new(
            SqliteMaterialRepository::new(conn),
            SqliteUsageLogRepository::new(conn),
            images,
        );
        f(&backup)
    })
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_material_item(material: Material) -> MaterialItem {
    MaterialItem {
        id: material.id,
        name: material.name,
        description: material.description,
        category: material.category,
        quantity: material.quantity,
        unit: material.unit,
        photo_uri: material.photo_uri,
        last_updated: material.last_updated,
    }
}

fn to_log_item(entry: UsageLogEntry) -> UsageLogItem {
    UsageLogItem {
        id: entry.id,
        material_id: entry.material_id,
        material_name: entry.material_name,
        category: entry.category,
        event_type: entry.kind.as_str().to_string(),
        quantity_delta: entry.quantity_delta,
        quantity_after: entry.quantity_after,
        timestamp: entry.timestamp,
    }
}

fn to_journal_month(group: MonthGroup) -> JournalMonth {
    JournalMonth {
        month: group.month,
        entries: group.entries.into_iter().map(to_log_item).collect(),
    }
}
