//! Private image directory owned by the inventory core.
//!
//! # Responsibility
//! - Copy picked photos into `<files_dir>/images/<uuid>.jpg`.
//! - Tell owned photo paths apart from external ones.
//! - Read/write/delete owned photo bytes for backup and cleanup.
//!
//! # Invariants
//! - Only paths under `images_dir` are ever read for export or deleted.
//! - Every written file gets a fresh UUID name; existing files are never
//!   overwritten.

use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

const IMAGES_DIR_NAME: &str = "images";
const IMAGE_EXTENSION: &str = "jpg";

pub type ImageStoreResult<T> = Result<T, ImageStoreError>;

#[derive(Debug)]
pub enum ImageStoreError {
    /// Files root is empty or relative.
    InvalidRoot(String),
    Io { path: PathBuf, source: io::Error },
}

impl Display for ImageStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRoot(value) => write!(f, "invalid image store root `{value}`"),
            Self::Io { path, source } => {
                write!(f, "image file error at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ImageStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRoot(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Handle to the app-private image directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStore {
    images_dir: PathBuf,
}

impl ImageStore {
    /// Opens (and creates if needed) `<files_dir>/images`.
    pub fn new(files_dir: impl AsRef<Path>) -> ImageStoreResult<Self> {
        let files_dir = files_dir.as_ref();
        if files_dir.as_os_str().is_empty() || !files_dir.is_absolute() {
            return Err(ImageStoreError::InvalidRoot(
                files_dir.display().to_string(),
            ));
        }
        let images_dir = files_dir.join(IMAGES_DIR_NAME);
        fs::create_dir_all(&images_dir).map_err(|source| ImageStoreError::Io {
            path: images_dir.clone(),
            source,
        })?;
        Ok(Self { images_dir })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Returns whether `path` points inside the owned images directory.
    ///
    /// Paths containing `..` are never owned, even when they start with the
    /// images directory.
    pub fn is_owned(&self, path: &str) -> bool {
        let path = Path::new(path);
        path.starts_with(&self.images_dir)
            && !path
                .components()
                .any(|component| matches!(component, Component::ParentDir))
    }

    /// Copies an external image into the owned directory and returns the new path.
    pub fn import_file(&self, source: impl AsRef<Path>) -> ImageStoreResult<String> {
        let destination = self.next_path();
        fs::copy(source.as_ref(), &destination).map_err(|source_err| ImageStoreError::Io {
            path: source.as_ref().to_path_buf(),
            source: source_err,
        })?;
        debug!("event=image_import module=media status=ok");
        Ok(destination.to_string_lossy().into_owned())
    }

    /// Writes raw image bytes to a fresh owned file and returns its path.
    pub fn write_bytes(&self, bytes: &[u8]) -> ImageStoreResult<String> {
        let destination = self.next_path();
        fs::write(&destination, bytes).map_err(|source| ImageStoreError::Io {
            path: destination.clone(),
            source,
        })?;
        Ok(destination.to_string_lossy().into_owned())
    }

    /// Reads an owned image. Returns `None` for external or missing files.
    pub fn read_owned(&self, path: &str) -> ImageStoreResult<Option<Vec<u8>>> {
        if !self.is_owned(path) {
            return Ok(None);
        }
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ImageStoreError::Io {
                path: PathBuf::from(path),
                source,
            }),
        }
    }

    /// Deletes an owned image. External paths and `None` are ignored.
    ///
    /// Returns `true` when a file was removed.
    pub fn delete_owned(&self, path: Option<&str>) -> bool {
        let Some(path) = path else {
            return false;
        };
        if !self.is_owned(path) {
            return false;
        }
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("event=image_delete module=media status=error error={err}");
                }
                false
            }
        }
    }

    /// Moves an arbitrary photo reference under ownership.
    ///
    /// Owned paths are returned unchanged. External paths are copied in;
    /// when the copy fails the original reference is kept.
    pub fn adopt(&self, path: &str) -> String {
        if self.is_owned(path) {
            return path.to_string();
        }
        match self.import_file(path) {
            Ok(owned) => owned,
            Err(err) => {
                warn!("event=image_adopt module=media status=error error={err}");
                path.to_string()
            }
        }
    }

    fn next_path(&self) -> PathBuf {
        self.images_dir
            .join(format!("{}.{IMAGE_EXTENSION}", Uuid::new_v4()))
    }
}
