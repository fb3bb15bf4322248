//! Usage-journal repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append journal entries and read them back newest first.
//! - Support merge-import through insert-if-absent.
//!
//! # Invariants
//! - Entries are only inserted or bulk-cleared, never updated in place.
//! - Listing order is `timestamp DESC, id ASC`.

use crate::model::usage_log::{UsageEventKind, UsageLogEntry};
use crate::repo::material_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const LOG_SELECT_SQL: &str = "SELECT
    id,
    material_id,
    material_name,
    category,
    event_type,
    quantity_delta,
    quantity_after,
    timestamp
FROM usage_logs";

/// Repository interface for the append-only usage journal.
pub trait UsageLogRepository {
    /// All entries, newest first.
    fn list_logs(&self) -> RepoResult<Vec<UsageLogEntry>>;
    fn list_logs_by_type(&self, kind: UsageEventKind) -> RepoResult<Vec<UsageLogEntry>>;
    fn list_logs_for_material(&self, material_id: &str) -> RepoResult<Vec<UsageLogEntry>>;
    /// Unconditional append.
    fn insert_log(&self, entry: &UsageLogEntry) -> RepoResult<()>;
    /// Returns `true` when inserted, `false` when the id already exists.
    fn insert_log_if_absent(&self, entry: &UsageLogEntry) -> RepoResult<bool>;
    /// Removes every entry and returns the removed count.
    fn clear_logs(&self) -> RepoResult<usize>;
}

/// SQLite-backed usage-journal repository.
#[derive(Clone, Copy)]
pub struct SqliteUsageLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUsageLogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_logs(&self, filter: Option<(&str, Value)>) -> RepoResult<Vec<UsageLogEntry>> {
        let mut sql = format!("{LOG_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some((column, value)) = filter {
            sql.push_str(&format!(" AND {column} = ?"));
            bind_values.push(value);
        }
        sql.push_str(" ORDER BY timestamp DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_log_row(row)?);
        }
        Ok(entries)
    }
}

impl UsageLogRepository for SqliteUsageLogRepository<'_> {
    fn list_logs(&self) -> RepoResult<Vec<UsageLogEntry>> {
        self.query_logs(None)
    }

    fn list_logs_by_type(&self, kind: UsageEventKind) -> RepoResult<Vec<UsageLogEntry>> {
        self.query_logs(Some(("event_type", Value::Text(kind.as_str().to_string()))))
    }

    fn list_logs_for_material(&self, material_id: &str) -> RepoResult<Vec<UsageLogEntry>> {
        self.query_logs(Some(("material_id", Value::Text(material_id.to_string()))))
    }

    fn insert_log(&self, entry: &UsageLogEntry) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO usage_logs (
                id,
                material_id,
                material_name,
                category,
                event_type,
                quantity_delta,
                quantity_after,
                timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                entry.id.as_str(),
                entry.material_id.as_str(),
                entry.material_name.as_str(),
                entry.category.as_str(),
                entry.kind.as_str(),
                entry.quantity_delta,
                entry.quantity_after,
                entry.timestamp,
            ],
        )?;
        Ok(())
    }

    fn insert_log_if_absent(&self, entry: &UsageLogEntry) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO usage_logs (
                id,
                material_id,
                material_name,
                category,
                event_type,
                quantity_delta,
                quantity_after,
                timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                entry.id.as_str(),
                entry.material_id.as_str(),
                entry.material_name.as_str(),
                entry.category.as_str(),
                entry.kind.as_str(),
                entry.quantity_delta,
                entry.quantity_after,
                entry.timestamp,
            ],
        )?;
        Ok(changed == 1)
    }

    fn clear_logs(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM usage_logs;", [])?)
    }
}

fn parse_log_row(row: &Row<'_>) -> RepoResult<UsageLogEntry> {
    let event_text: String = row.get("event_type")?;
    let kind = UsageEventKind::parse(&event_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid event type `{event_text}` in usage_logs.event_type"
        ))
    })?;

    Ok(UsageLogEntry {
        id: row.get("id")?,
        material_id: row.get("material_id")?,
        material_name: row.get("material_name")?,
        category: row.get("category")?,
        kind,
        quantity_delta: row.get("quantity_delta")?,
        quantity_after: row.get("quantity_after")?,
        timestamp: row.get("timestamp")?,
    })
}
