//! Category repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Inserting an existing name (exact, case-sensitive) is a silent no-op.
//! - Deleting a category never touches `art_materials`.
//! - Listing order is alphabetical by name.

use crate::model::category::Category;
use crate::repo::material_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for category management.
pub trait CategoryRepository {
    /// Category names, A to Z.
    fn list_categories(&self) -> RepoResult<Vec<String>>;
    /// Category rows including the default-seed flag, A to Z.
    fn list_category_records(&self) -> RepoResult<Vec<Category>>;
    /// Returns `true` when a new row was written.
    fn insert_category(&self, name: &str) -> RepoResult<bool>;
    /// Returns `true` when a row was removed.
    fn delete_category(&self, name: &str) -> RepoResult<bool>;
}

/// SQLite-backed category repository.
#[derive(Clone, Copy)]
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn list_categories(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .list_category_records()?
            .into_iter()
            .map(|category| category.name)
            .collect())
    }

    fn list_category_records(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, is_default FROM categories ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let is_default = match row.get::<_, i64>("is_default")? {
                0 => false,
                1 => true,
                other => {
                    return Err(RepoError::InvalidData(format!(
                        "invalid is_default value `{other}` for category `{name}`"
                    )));
                }
            };
            categories.push(Category { name, is_default });
        }
        Ok(categories)
    }

    fn insert_category(&self, name: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO categories (name, is_default) VALUES (?1, ?2);",
            params![name, 0_i64],
        )?;
        Ok(changed == 1)
    }

    fn delete_category(&self, name: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE name = ?1;", [name])?;
        Ok(changed == 1)
    }
}
