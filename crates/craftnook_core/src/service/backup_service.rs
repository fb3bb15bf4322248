//! JSON backup export and merge-import.
//!
//! # Responsibility
//! - Serialize every material and journal entry, with owned photos inlined
//!   as base64, into one versioned envelope.
//! - Restore an envelope by writing photos to fresh owned files and
//!   inserting only rows whose id is not present yet.
//!
//! # Invariants
//! - Import never overwrites an existing material or journal row.
//! - Re-importing the same file inserts nothing (idempotent retry).
//! - Photos are written only for materials that are actually inserted.
//! - Any I/O, decode or parse failure aborts the whole operation; rows
//!   inserted before the failure stay in place.
//! - Unknown envelope fields are ignored; a missing `images` list means a
//!   version 1 backup without inline photos.

use crate::media::image_store::{ImageStore, ImageStoreError};
use crate::model::material::Material;
use crate::model::now_epoch_ms;
use crate::model::usage_log::UsageLogEntry;
use crate::repo::material_repo::{MaterialRepository, RepoError};
use crate::repo::usage_log_repo::UsageLogRepository;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

/// Envelope version written by this build.
pub const BACKUP_SCHEMA_VERSION: u32 = 2;

pub type BackupResult<T> = Result<T, BackupError>;

#[derive(Debug)]
pub enum BackupError {
    /// Reading or writing the backup stream failed.
    Io(io::Error),
    /// Backup text is not a valid envelope.
    Parse(serde_json::Error),
    /// Inline photo data for `material_id` is not valid base64.
    InvalidImage {
        material_id: String,
        message: String,
    },
    Image(ImageStoreError),
    Repo(RepoError),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "backup I/O failed: {err}"),
            Self::Parse(err) => write!(f, "backup file is malformed: {err}"),
            Self::InvalidImage {
                material_id,
                message,
            } => write!(f, "backup image for material {material_id} is invalid: {message}"),
            Self::Image(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidImage { .. } => None,
            Self::Image(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<io::Error> for BackupError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<ImageStoreError> for BackupError {
    fn from(value: ImageStoreError) -> Self {
        Self::Image(value)
    }
}

impl From<RepoError> for BackupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// One inline photo, linked to its material by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupImage {
    pub material_id: String,
    /// Standard base64 without line breaks.
    pub base64_data: String,
}

/// Top-level backup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEnvelope {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub exported_at: i64,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub usage_logs: Vec<UsageLogEntry>,
    #[serde(default)]
    pub images: Vec<BackupImage>,
}

fn default_schema_version() -> u32 {
    BACKUP_SCHEMA_VERSION
}

/// Row counts written by an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub materials: usize,
    pub usage_logs: usize,
    pub images: usize,
}

/// Rows newly inserted by an import (skipped duplicates excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub materials_imported: usize,
    pub logs_imported: usize,
}

/// Backup service over material and journal repositories.
pub struct BackupService<M: MaterialRepository, L: UsageLogRepository> {
    materials: M,
    logs: L,
    images: ImageStore,
}

impl<M: MaterialRepository, L: UsageLogRepository> BackupService<M, L> {
    pub fn new(materials: M, logs: L, images: ImageStore) -> Self {
        Self {
            materials,
            logs,
            images,
        }
    }

    /// Builds the envelope for the current store contents.
    pub fn snapshot(&self) -> BackupResult<BackupEnvelope> {
        let materials = self.materials.list_materials()?;
        let usage_logs = self.logs.list_logs()?;

        let mut images = Vec::new();
        for material in &materials {
            let Some(path) = material.photo_uri.as_deref() else {
                continue;
            };
            if let Some(bytes) = self.images.read_owned(path)? {
                images.push(BackupImage {
                    material_id: material.id.clone(),
                    base64_data: STANDARD.encode(bytes),
                });
            }
        }

        Ok(BackupEnvelope {
            schema_version: BACKUP_SCHEMA_VERSION,
            exported_at: now_epoch_ms(),
            materials,
            usage_logs,
            images,
        })
    }

    /// Writes a pretty-printed backup to `writer`.
    pub fn export_to_writer(&self, writer: impl Write) -> BackupResult<ExportSummary> {
        let started_at = Instant::now();
        let result = self.write_envelope(writer);
        match &result {
            Ok(summary) => info!(
                "event=backup_export module=backup status=ok duration_ms={} materials={} logs={} images={}",
                started_at.elapsed().as_millis(),
                summary.materials,
                summary.usage_logs,
                summary.images
            ),
            Err(err) => error!(
                "event=backup_export module=backup status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Creates (or truncates) `path` and exports into it.
    pub fn export_to_path(&self, path: impl AsRef<Path>) -> BackupResult<ExportSummary> {
        let file = File::create(path)?;
        self.export_to_writer(file)
    }

    /// Reads a backup from `reader` and merges it into the store.
    pub fn import_from_reader(&self, reader: impl Read) -> BackupResult<ImportSummary> {
        let started_at = Instant::now();
        let result = self.read_and_restore(reader);

        match &result {
            Ok(summary) => info!(
                "event=backup_import module=backup status=ok duration_ms={} materials_imported={} logs_imported={}",
                started_at.elapsed().as_millis(),
                summary.materials_imported,
                summary.logs_imported
            ),
            Err(err) => error!(
                "event=backup_import module=backup status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    pub fn import_from_path(&self, path: impl AsRef<Path>) -> BackupResult<ImportSummary> {
        let file = File::open(path)?;
        self.import_from_reader(file)
    }

    /// Merges an already-parsed envelope into the store.
    pub fn restore(&self, envelope: BackupEnvelope) -> BackupResult<ImportSummary> {
        let mut image_bytes: HashMap<String, Vec<u8>> = HashMap::new();
        for image in &envelope.images {
            let bytes = STANDARD.decode(image.base64_data.as_bytes()).map_err(|err| {
                BackupError::InvalidImage {
                    material_id: image.material_id.clone(),
                    message: err.to_string(),
                }
            })?;
            image_bytes.insert(image.material_id.clone(), bytes);
        }

        let mut materials_imported = 0;
        for material in envelope.materials {
            if self.restore_material(material, &mut image_bytes)? {
                materials_imported += 1;
            }
        }

        let mut logs_imported = 0;
        for entry in &envelope.usage_logs {
            if self.logs.insert_log_if_absent(entry)? {
                logs_imported += 1;
            }
        }

        Ok(ImportSummary {
            materials_imported,
            logs_imported,
        })
    }

    /// Inserts one material if its id is new. Its photo is only written to
    /// disk for rows that are actually inserted.
    fn restore_material(
        &self,
        mut material: Material,
        image_bytes: &mut HashMap<String, Vec<u8>>,
    ) -> BackupResult<bool> {
        if self.materials.get_material(&material.id)?.is_some() {
            return Ok(false);
        }

        let written = match image_bytes.remove(&material.id) {
            Some(bytes) => Some(self.images.write_bytes(&bytes)?),
            None => None,
        };
        if let Some(path) = &written {
            material.photo_uri = Some(path.clone());
        }

        let inserted = match self.materials.insert_material_if_absent(&material) {
            Ok(inserted) => inserted,
            Err(err) => {
                self.images.delete_owned(written.as_deref());
                return Err(err.into());
            }
        };
        if !inserted {
            self.images.delete_owned(written.as_deref());
        }
        Ok(inserted)
    }

    fn read_and_restore(&self, mut reader: impl Read) -> BackupResult<ImportSummary> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let envelope: BackupEnvelope = serde_json::from_str(&text)?;
        self.restore(envelope)
    }

    fn write_envelope(&self, writer: impl Write) -> BackupResult<ExportSummary> {
        let envelope = self.snapshot()?;
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, &envelope)?;
        writer.flush()?;
        Ok(ExportSummary {
            materials: envelope.materials.len(),
            usage_logs: envelope.usage_logs.len(),
            images: envelope.images.len(),
        })
    }
}
