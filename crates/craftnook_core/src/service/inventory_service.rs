//! Inventory use-case service.
//!
//! # Responsibility
//! - Apply material add/update/delete/quantity writes through repositories.
//! - Classify each write into the usage-journal event it produces.
//! - Keep owned photo files in step with material rows.
//!
//! # Invariants
//! - Add always journals `Added` (+quantity, after = quantity).
//! - Delete always journals `Deleted` (-prior quantity, after = 0).
//! - Update journals `Restocked` on increase, nothing on no change, and
//!   defers to a caller decision on decrease.
//! - Journal writes follow the inventory write and are not atomic with it.

use crate::media::image_store::ImageStore;
use crate::model::material::{Material, MaterialId, NewMaterial};
use crate::model::usage_log::{UsageEventKind, UsageLogEntry};
use crate::model::ValidationError;
use crate::repo::material_repo::{MaterialRepository, RepoError};
use crate::repo::usage_log_repo::UsageLogRepository;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Service error for inventory use-cases.
#[derive(Debug)]
pub enum InventoryError {
    /// Input rejected before any write.
    Validation(ValidationError),
    /// Target material does not exist.
    NotFound(MaterialId),
    /// Persistence-layer failure; nothing was applied.
    Repo(RepoError),
    /// Inventory write applied, but its journal entry could not be stored.
    Journal {
        material_id: MaterialId,
        source: RepoError,
    },
}

impl Display for InventoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "material with id {id} not found"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Journal {
                material_id,
                source,
            } => write!(
                f,
                "journal entry for material {material_id} was not recorded: {source}"
            ),
        }
    }
}

impl Error for InventoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) | Self::Journal { source: err, .. } => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for InventoryError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for InventoryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Material write paired with the journal entry it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournaledChange {
    pub material: Material,
    pub entry: UsageLogEntry,
}

/// Quantity reduction waiting for the caller to say what it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuantityConfirmation {
    /// Material as stored after the update.
    pub material: Material,
    pub old_quantity: i64,
    pub new_quantity: i64,
}

impl PendingQuantityConfirmation {
    /// Signed delta the eventual journal entry will carry (always negative).
    pub fn delta(&self) -> i64 {
        self.new_quantity - self.old_quantity
    }
}

/// Caller answer to "was this consumption, or a data correction?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityDecision {
    /// Units were consumed; journaled as `Used`.
    Used,
    /// The old count was wrong; journaled as `Restocked`.
    Correction,
}

impl QuantityDecision {
    pub fn from_was_used(was_used: bool) -> Self {
        if was_used {
            Self::Used
        } else {
            Self::Correction
        }
    }

    fn event_kind(self) -> UsageEventKind {
        match self {
            Self::Used => UsageEventKind::Used,
            Self::Correction => UsageEventKind::Restocked,
        }
    }
}

/// Result of a full material update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Quantity unchanged; no journal entry.
    Unchanged(Material),
    /// Quantity increased; `Restocked` recorded.
    Restocked(JournaledChange),
    /// Quantity decreased; nothing recorded until resolved.
    NeedsConfirmation(PendingQuantityConfirmation),
}

impl UpdateOutcome {
    pub fn material(&self) -> &Material {
        match self {
            Self::Unchanged(material) => material,
            Self::Restocked(change) => &change.material,
            Self::NeedsConfirmation(pending) => &pending.material,
        }
    }
}

/// Use-case service over material and journal repositories.
pub struct InventoryService<M: MaterialRepository, L: UsageLogRepository> {
    materials: M,
    logs: L,
    images: ImageStore,
}

impl<M: MaterialRepository, L: UsageLogRepository> InventoryService<M, L> {
    pub fn new(materials: M, logs: L, images: ImageStore) -> Self {
        Self {
            materials,
            logs,
            images,
        }
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// All materials ordered by name.
    pub fn list_materials(&self) -> InventoryResult<Vec<Material>> {
        Ok(self.materials.list_materials()?)
    }

    pub fn get_material(&self, id: &str) -> InventoryResult<Option<Material>> {
        Ok(self.materials.get_material(id)?)
    }

    /// All journal entries, newest first.
    pub fn list_logs(&self) -> InventoryResult<Vec<UsageLogEntry>> {
        Ok(self.logs.list_logs()?)
    }

    pub fn list_logs_for_material(&self, material_id: &str) -> InventoryResult<Vec<UsageLogEntry>> {
        Ok(self.logs.list_logs_for_material(material_id)?)
    }

    /// Removes every journal entry. Inventory rows are untouched.
    pub fn clear_journal(&self) -> InventoryResult<usize> {
        let removed = self.logs.clear_logs()?;
        info!("event=journal_clear module=inventory status=ok removed={removed}");
        Ok(removed)
    }

    /// Creates a material and journals `Added`.
    ///
    /// # Contract
    /// - Rejects blank names and quantities below 1.
    /// - An external photo path is copied into the owned image directory.
    pub fn add_material(&self, request: NewMaterial) -> InventoryResult<JournaledChange> {
        request.validate()?;
        let mut material = request.into_material();
        material.photo_uri = material
            .photo_uri
            .as_deref()
            .map(|path| self.images.adopt(path));

        self.materials.insert_material(&material)?;
        info!(
            "event=material_add module=inventory status=ok material_id={} quantity={}",
            material.id, material.quantity
        );

        let entry = UsageLogEntry::record(
            &material,
            UsageEventKind::Added,
            material.quantity,
            material.quantity,
        );
        self.append_journal(&entry)?;
        Ok(JournaledChange { material, entry })
    }

    /// Replaces an existing material and classifies the quantity change.
    ///
    /// # Contract
    /// - Missing id -> `NotFound`; negative quantity -> `Validation`.
    /// - A new external photo is copied in; after a successful copy the
    ///   previous owned photo is deleted.
    pub fn update_material(&self, material: Material) -> InventoryResult<UpdateOutcome> {
        material.validate()?;
        let previous = self
            .materials
            .get_material(&material.id)?
            .ok_or_else(|| InventoryError::NotFound(material.id.clone()))?;

        let mut candidate = material;
        candidate.photo_uri = self.resolve_photo(&previous, candidate.photo_uri.take());
        let stored = self.materials.update_material(&candidate)?;

        let delta = stored.quantity - previous.quantity;
        info!(
            "event=material_update module=inventory status=ok material_id={} delta={delta}",
            stored.id
        );

        if delta > 0 {
            let entry = UsageLogEntry::record(
                &stored,
                UsageEventKind::Restocked,
                delta,
                stored.quantity,
            );
            self.append_journal(&entry)?;
            return Ok(UpdateOutcome::Restocked(JournaledChange {
                material: stored,
                entry,
            }));
        }

        if delta < 0 {
            return Ok(UpdateOutcome::NeedsConfirmation(
                PendingQuantityConfirmation {
                    old_quantity: previous.quantity,
                    new_quantity: stored.quantity,
                    material: stored,
                },
            ));
        }

        Ok(UpdateOutcome::Unchanged(stored))
    }

    /// Commits the journal entry for a deferred quantity reduction.
    ///
    /// A correction is journaled as `Restocked` with the same negative delta.
    pub fn resolve_quantity_change(
        &self,
        pending: &PendingQuantityConfirmation,
        decision: QuantityDecision,
    ) -> InventoryResult<UsageLogEntry> {
        let entry = UsageLogEntry::record(
            &pending.material,
            decision.event_kind(),
            pending.delta(),
            pending.new_quantity,
        );
        self.append_journal(&entry)?;
        Ok(entry)
    }

    /// Deletes a material, its owned photo, and journals `Deleted`.
    pub fn delete_material(&self, id: &str) -> InventoryResult<JournaledChange> {
        let snapshot = self
            .materials
            .get_material(id)?
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        self.materials.delete_material(id)?;
        let photo_removed = self.images.delete_owned(snapshot.photo_uri.as_deref());
        info!(
            "event=material_delete module=inventory status=ok material_id={id} photo_removed={photo_removed}"
        );

        let entry = UsageLogEntry::record(
            &snapshot,
            UsageEventKind::Deleted,
            -snapshot.quantity,
            0,
        );
        self.append_journal(&entry)?;
        Ok(JournaledChange {
            material: snapshot,
            entry,
        })
    }

    /// Writes a quantity directly without journaling.
    pub fn set_quantity(&self, id: &str, quantity: i64) -> InventoryResult<()> {
        self.materials.set_quantity(id, quantity)?;
        info!(
            "event=material_set_quantity module=inventory status=ok material_id={id} quantity={quantity}"
        );
        Ok(())
    }

    fn resolve_photo(&self, previous: &Material, requested: Option<String>) -> Option<String> {
        let requested = requested?;
        if self.images.is_owned(&requested) {
            return Some(requested);
        }

        let adopted = self.images.adopt(&requested);
        let copied = adopted != requested;
        if copied && previous.photo_uri.as_deref() != Some(requested.as_str()) {
            self.images.delete_owned(previous.photo_uri.as_deref());
        }
        Some(adopted)
    }

    fn append_journal(&self, entry: &UsageLogEntry) -> InventoryResult<()> {
        self.logs.insert_log(entry).map_err(|source| {
            error!(
                "event=journal_append module=inventory status=error material_id={} kind={} error={}",
                entry.material_id,
                entry.kind.as_str(),
                source
            );
            InventoryError::Journal {
                material_id: entry.material_id.clone(),
                source,
            }
        })
    }
}
