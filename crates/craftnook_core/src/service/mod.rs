//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Classify inventory writes into usage-journal events.
//! - Derive read-side projections and move data in and out of backups.
//!
//! Services hold no UI state; that lives in [`crate::view_model`].

pub mod backup_service;
pub mod category_service;
pub mod inventory_service;
pub mod projection;
