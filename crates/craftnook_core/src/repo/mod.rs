//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for materials,
//!   categories and the usage journal.
//! - Isolate SQLite query details from service/view-model orchestration.
//!
//! # Invariants
//! - Material writes enforce `Material::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to DB transport errors.

pub mod category_repo;
pub mod material_repo;
pub mod usage_log_repo;
