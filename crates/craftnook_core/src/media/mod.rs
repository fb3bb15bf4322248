//! Locally-owned media files (material photos).

pub mod image_store;
