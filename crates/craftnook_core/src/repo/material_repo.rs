//! Material repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `art_materials` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Material::validate()` before SQL mutations.
//! - Mutations on a missing id return `RepoError::NotFound`.
//! - Listing order is name (case-insensitive) then id.

use crate::db::DbError;
use crate::model::material::{Material, MaterialId};
use crate::model::{now_epoch_ms, ValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MATERIAL_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    category,
    quantity,
    unit,
    photo_uri,
    last_updated
FROM art_materials";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by material, category and journal persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "material with id {id} not found"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for material CRUD operations.
pub trait MaterialRepository {
    /// All materials ordered by name.
    fn list_materials(&self) -> RepoResult<Vec<Material>>;
    fn get_material(&self, id: &str) -> RepoResult<Option<Material>>;
    /// Inserts a new row. Fails when the id already exists.
    fn insert_material(&self, material: &Material) -> RepoResult<MaterialId>;
    /// Replaces every field of an existing row and refreshes `last_updated`.
    fn update_material(&self, material: &Material) -> RepoResult<Material>;
    fn delete_material(&self, id: &str) -> RepoResult<()>;
    /// Writes only the quantity and refreshes `last_updated`.
    fn set_quantity(&self, id: &str, quantity: i64) -> RepoResult<()>;
    /// Inserts unless a row with the same id exists. Returns `true` when inserted.
    fn insert_material_if_absent(&self, material: &Material) -> RepoResult<bool>;
    fn count_materials(&self) -> RepoResult<u64>;
}

/// SQLite-backed material repository.
#[derive(Clone, Copy)]
pub struct SqliteMaterialRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMaterialRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MaterialRepository for SqliteMaterialRepository<'_> {
    fn list_materials(&self) -> RepoResult<Vec<Material>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MATERIAL_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut materials = Vec::new();
        while let Some(row) = rows.next()? {
            materials.push(parse_material_row(row)?);
        }
        Ok(materials)
    }

    fn get_material(&self, id: &str) -> RepoResult<Option<Material>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MATERIAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_material_row(row)?));
        }
        Ok(None)
    }

    fn insert_material(&self, material: &Material) -> RepoResult<MaterialId> {
        material.validate()?;
        self.conn.execute(
            "INSERT INTO art_materials (
                id,
                name,
                description,
                category,
                quantity,
                unit,
                photo_uri,
                last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                material.id.as_str(),
                material.name.as_str(),
                material.description.as_str(),
                material.category.as_str(),
                material.quantity,
                material.unit.as_str(),
                material.photo_uri.as_deref(),
                material.last_updated,
            ],
        )?;
        Ok(material.id.clone())
    }

    fn update_material(&self, material: &Material) -> RepoResult<Material> {
        material.validate()?;
        let mut updated = material.clone();
        updated.last_updated = now_epoch_ms();

        let changed = self.conn.execute(
            "UPDATE art_materials
             SET
                name = ?2,
                description = ?3,
                category = ?4,
                quantity = ?5,
                unit = ?6,
                photo_uri = ?7,
                last_updated = ?8
             WHERE id = ?1;",
            params![
                updated.id.as_str(),
                updated.name.as_str(),
                updated.description.as_str(),
                updated.category.as_str(),
                updated.quantity,
                updated.unit.as_str(),
                updated.photo_uri.as_deref(),
                updated.last_updated,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(material.id.clone()));
        }
        Ok(updated)
    }

    fn delete_material(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM art_materials WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_quantity(&self, id: &str, quantity: i64) -> RepoResult<()> {
        if quantity < 0 {
            return Err(ValidationError::NegativeQuantity(quantity).into());
        }
        let changed = self.conn.execute(
            "UPDATE art_materials
             SET quantity = ?2, last_updated = ?3
             WHERE id = ?1;",
            params![id, quantity, now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn insert_material_if_absent(&self, material: &Material) -> RepoResult<bool> {
        material.validate()?;
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO art_materials (
                id,
                name,
                description,
                category,
                quantity,
                unit,
                photo_uri,
                last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                material.id.as_str(),
                material.name.as_str(),
                material.description.as_str(),
                material.category.as_str(),
                material.quantity,
                material.unit.as_str(),
                material.photo_uri.as_deref(),
                material.last_updated,
            ],
        )?;
        Ok(changed == 1)
    }

    fn count_materials(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM art_materials;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative material count `{count}`")))
    }
}

fn parse_material_row(row: &Row<'_>) -> RepoResult<Material> {
    let material = Material {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        category: row.get("category")?,
        quantity: row.get("quantity")?,
        unit: row.get("unit")?,
        photo_uri: row.get("photo_uri")?,
        last_updated: row.get("last_updated")?,
    };
    material.validate().map_err(|err| {
        RepoError::InvalidData(format!("art_materials row `{}`: {err}", material.id))
    })?;
    Ok(material)
}
