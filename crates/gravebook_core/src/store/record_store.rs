//! Authoritative in-memory working set plus sync bookkeeping.
//!
//! # Responsibility
//! - CRUD for cemeteries, plots, individuals and photos with synchronous
//!   referential-integrity checks.
//! - Bump per-record revisions on every mutation and keep tombstones for
//!   deletes that still need backend reconciliation.
//! - Apply push/pull outcomes without ever clobbering unpushed local edits.
//!
//! # Invariants
//! - A mutation either fully applies or leaves the store untouched.
//! - Sync metadata exists for exactly the live entities plus tombstones.
//! - Pull application never overwrites `PendingPush`/`PushFailed`/
//!   `LocalOnly` records; conflicts are flagged, never merged.

use crate::model::cemetery::Cemetery;
use crate::model::coordinate::Coordinate;
use crate::model::photo::{OcrText, Photo};
use crate::model::plot::{Individual, Plot};
use crate::model::{Entity, EntityKind, RecordId, ValidationError};
use crate::repo::snapshot::{SnapshotRepository, SnapshotResult};
use crate::sync::record::{SyncRecord, SyncState};
use log::{error, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Mutation/query failure for the working set.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Validation(ValidationError),
    NotFound {
        kind: EntityKind,
        id: RecordId,
    },
    /// A plot/individual/photo mutation would point at a missing owner.
    MissingOwner {
        kind: EntityKind,
        owner: EntityKind,
        owner_id: RecordId,
    },
    DuplicateId {
        kind: EntityKind,
        id: RecordId,
    },
    /// Conflict-resolution call on a record that is not in conflict.
    NotInConflict {
        kind: EntityKind,
        id: RecordId,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::MissingOwner {
                kind,
                owner,
                owner_id,
            } => write!(f, "{kind} references missing {owner}: {owner_id}"),
            Self::DuplicateId { kind, id } => write!(f, "{kind} id already in use: {id}"),
            Self::NotInConflict { kind, id } => {
                write!(f, "{kind} {id} is not in conflict state")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Outcome of applying one pulled record to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullApply {
    /// Remote copy written into the working set.
    Applied,
    /// Remote revision was not newer than what this session already holds.
    SkippedStale,
    /// Local unpushed edits take precedence; remote copy dropped.
    SkippedLocalPrecedence,
    /// Entity was deleted locally and the delete is still unconfirmed.
    SkippedTombstone,
    /// Backend advanced while local edits were unpushed; record flagged.
    ConflictDetected,
}

/// Hit returned by the read-only text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: EntityKind,
    pub id: RecordId,
    pub snippet: String,
}

/// Authoritative working copy of all records for the active session.
#[derive(Debug, Default)]
pub struct RecordStore {
    cemeteries: BTreeMap<RecordId, Cemetery>,
    plots: BTreeMap<RecordId, Plot>,
    individuals: BTreeMap<RecordId, Individual>,
    photos: BTreeMap<RecordId, Photo>,
    sync: BTreeMap<(EntityKind, RecordId), SyncRecord>,
    backend_configured: bool,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        cemeteries: BTreeMap<RecordId, Cemetery>,
        plots: BTreeMap<RecordId, Plot>,
        individuals: BTreeMap<RecordId, Individual>,
        photos: BTreeMap<RecordId, Photo>,
        sync: BTreeMap<(EntityKind, RecordId), SyncRecord>,
    ) -> Self {
        Self {
            cemeteries,
            plots,
            individuals,
            photos,
            sync,
            backend_configured: false,
        }
    }

    /// Records that a backend exists for this session and promotes every
    /// `LocalOnly` record into the push queue.
    pub fn configure_backend(&mut self) {
        self.backend_configured = true;
        for record in self.sync.values_mut() {
            if record.state == SyncState::LocalOnly {
                record.state = SyncState::PendingPush;
            }
        }
    }

    pub fn backend_configured(&self) -> bool {
        self.backend_configured
    }

    /// Writes the full working set plus sync metadata to local storage.
    ///
    /// Never contacts the network; this is the offline fallback the
    /// operator always keeps, whatever the backend is doing.
    pub fn save_locally<R: SnapshotRepository>(&self, repo: &R) -> SnapshotResult<()> {
        match repo.save_snapshot(self) {
            Ok(()) => {
                info!(
                    "event=save_locally module=store status=ok records={}",
                    self.sync.len()
                );
                Ok(())
            }
            Err(err) => {
                error!("event=save_locally module=store status=error error={err}");
                Err(err)
            }
        }
    }

    /// Restores the working set persisted by `save_locally`, typically at
    /// session start. Backend-configured state is session-scoped and is
    /// not restored.
    pub fn load_locally<R: SnapshotRepository>(repo: &R) -> SnapshotResult<Self> {
        let store = repo.load_snapshot()?;
        info!(
            "event=load_locally module=store status=ok records={}",
            store.sync.len()
        );
        Ok(store)
    }

    // ----- cemetery mutations -------------------------------------------

    pub fn create_cemetery(&mut self, cemetery: Cemetery) -> StoreResult<RecordId> {
        cemetery.validate()?;
        let id = cemetery.id;
        if self.cemeteries.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                kind: EntityKind::Cemetery,
                id,
            });
        }
        self.cemeteries.insert(id, cemetery);
        self.note_created(EntityKind::Cemetery, id);
        Ok(id)
    }

    pub fn update_cemetery(&mut self, cemetery: Cemetery) -> StoreResult<()> {
        cemetery.validate()?;
        let id = cemetery.id;
        if !self.cemeteries.contains_key(&id) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Cemetery,
                id,
            });
        }
        self.cemeteries.insert(id, cemetery);
        self.note_mutated(EntityKind::Cemetery, id);
        Ok(())
    }

    /// Stores a geocoded (or manually entered) position on a cemetery.
    pub fn set_cemetery_coordinate(
        &mut self,
        id: RecordId,
        coordinate: Option<Coordinate>,
    ) -> StoreResult<()> {
        let cemetery = self
            .cemeteries
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Cemetery,
                id,
            })?;
        cemetery.coordinate = coordinate;
        self.note_mutated(EntityKind::Cemetery, id);
        Ok(())
    }

    /// Deletes a cemetery and cascades into its plots, individuals and
    /// photos. Every cascaded record follows the tombstone rule.
    pub fn delete_cemetery(&mut self, id: RecordId) -> StoreResult<()> {
        if !self.cemeteries.contains_key(&id) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Cemetery,
                id,
            });
        }
        let plot_ids: Vec<RecordId> = self
            .plots
            .values()
            .filter(|plot| plot.cemetery_id == id)
            .map(|plot| plot.id)
            .collect();
        for plot_id in plot_ids {
            self.delete_plot_unchecked(plot_id);
        }
        self.cemeteries.remove(&id);
        self.note_deleted(EntityKind::Cemetery, id);
        Ok(())
    }

    // ----- plot mutations -----------------------------------------------

    pub fn create_plot(&mut self, plot: Plot) -> StoreResult<RecordId> {
        plot.validate()?;
        self.require_cemetery(EntityKind::Plot, plot.cemetery_id)?;
        let id = plot.id;
        if self.plots.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                kind: EntityKind::Plot,
                id,
            });
        }
        self.plots.insert(id, plot);
        self.note_created(EntityKind::Plot, id);
        Ok(id)
    }

    pub fn update_plot(&mut self, plot: Plot) -> StoreResult<()> {
        plot.validate()?;
        self.require_cemetery(EntityKind::Plot, plot.cemetery_id)?;
        let id = plot.id;
        if !self.plots.contains_key(&id) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Plot,
                id,
            });
        }
        self.plots.insert(id, plot);
        self.note_mutated(EntityKind::Plot, id);
        Ok(())
    }

    pub fn set_plot_coordinate(
        &mut self,
        id: RecordId,
        coordinate: Option<Coordinate>,
    ) -> StoreResult<()> {
        let plot = self.plots.get_mut(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::Plot,
            id,
        })?;
        plot.coordinate = coordinate;
        self.note_mutated(EntityKind::Plot, id);
        Ok(())
    }

    /// Deletes a plot and cascades into its individuals and photos.
    pub fn delete_plot(&mut self, id: RecordId) -> StoreResult<()> {
        if !self.plots.contains_key(&id) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Plot,
                id,
            });
        }
        self.delete_plot_unchecked(id);
        Ok(())
    }

    fn delete_plot_unchecked(&mut self, id: RecordId) {
        let individual_ids: Vec<RecordId> = self
            .individuals
            .values()
            .filter(|individual| individual.plot_id == id)
            .map(|individual| individual.id)
            .collect();
        for individual_id in individual_ids {
            self.individuals.remove(&individual_id);
            self.note_deleted(EntityKind::Individual, individual_id);
        }
        let photo_ids: Vec<RecordId> = self
            .photos
            .values()
            .filter(|photo| photo.plot_id == id)
            .map(|photo| photo.id)
            .collect();
        for photo_id in photo_ids {
            self.photos.remove(&photo_id);
            self.note_deleted(EntityKind::Photo, photo_id);
        }
        self.plots.remove(&id);
        self.note_deleted(EntityKind::Plot, id);
    }

    // ----- individual mutations -----------------------------------------

    pub fn create_individual(&mut self, individual: Individual) -> StoreResult<RecordId> {
        individual.validate()?;
        self.require_plot(EntityKind::Individual, individual.plot_id)?;
        let id = individual.id;
        if self.individuals.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                kind: EntityKind::Individual,
                id,
            });
        }
        self.individuals.insert(id, individual);
        self.note_created(EntityKind::Individual, id);
        Ok(id)
    }

    pub fn update_individual(&mut self, individual: Individual) -> StoreResult<()> {
        individual.validate()?;
        self.require_plot(EntityKind::Individual, individual.plot_id)?;
        let id = individual.id;
        if !self.individuals.contains_key(&id) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Individual,
                id,
            });
        }
        self.individuals.insert(id, individual);
        self.note_mutated(EntityKind::Individual, id);
        Ok(())
    }

    pub fn delete_individual(&mut self, id: RecordId) -> StoreResult<()> {
        if self.individuals.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                kind: EntityKind::Individual,
                id,
            });
        }
        self.note_deleted(EntityKind::Individual, id);
        Ok(())
    }

    // ----- photo mutations ----------------------------------------------

    pub fn create_photo(&mut self, photo: Photo) -> StoreResult<RecordId> {
        photo.validate()?;
        self.require_plot(EntityKind::Photo, photo.plot_id)?;
        let id = photo.id;
        if self.photos.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                kind: EntityKind::Photo,
                id,
            });
        }
        self.photos.insert(id, photo);
        self.note_created(EntityKind::Photo, id);
        Ok(id)
    }

    pub fn update_photo(&mut self, photo: Photo) -> StoreResult<()> {
        photo.validate()?;
        self.require_plot(EntityKind::Photo, photo.plot_id)?;
        let id = photo.id;
        if !self.photos.contains_key(&id) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Photo,
                id,
            });
        }
        self.photos.insert(id, photo);
        self.note_mutated(EntityKind::Photo, id);
        Ok(())
    }

    pub fn delete_photo(&mut self, id: RecordId) -> StoreResult<()> {
        if self.photos.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                kind: EntityKind::Photo,
                id,
            });
        }
        self.note_deleted(EntityKind::Photo, id);
        Ok(())
    }

    /// Stores the recognition collaborator's result on a photo. The core
    /// never produces OCR text itself.
    pub fn attach_ocr_text(
        &mut self,
        photo_id: RecordId,
        text: impl Into<String>,
        confidence: f64,
    ) -> StoreResult<()> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::ConfidenceOutOfRange(confidence).into());
        }
        let photo = self.photos.get_mut(&photo_id).ok_or(StoreError::NotFound {
            kind: EntityKind::Photo,
            id: photo_id,
        })?;
        photo.ocr = Some(OcrText {
            text: text.into(),
            confidence,
        });
        self.note_mutated(EntityKind::Photo, photo_id);
        Ok(())
    }

    // ----- read-only queries --------------------------------------------

    pub fn cemetery(&self, id: RecordId) -> Option<&Cemetery> {
        self.cemeteries.get(&id)
    }

    /// All cemeteries ordered by name, then id for ties.
    pub fn list_cemeteries(&self) -> Vec<&Cemetery> {
        let mut all: Vec<&Cemetery> = self.cemeteries.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        all
    }

    pub fn plot(&self, id: RecordId) -> Option<&Plot> {
        self.plots.get(&id)
    }

    /// Plots of one cemetery ordered by plot number.
    pub fn plots_in(&self, cemetery_id: RecordId) -> Vec<&Plot> {
        let mut plots: Vec<&Plot> = self
            .plots
            .values()
            .filter(|plot| plot.cemetery_id == cemetery_id)
            .collect();
        plots.sort_by(|a, b| a.plot_number.cmp(&b.plot_number).then(a.id.cmp(&b.id)));
        plots
    }

    pub fn individual(&self, id: RecordId) -> Option<&Individual> {
        self.individuals.get(&id)
    }

    pub fn individuals_in(&self, plot_id: RecordId) -> Vec<&Individual> {
        let mut individuals: Vec<&Individual> = self
            .individuals
            .values()
            .filter(|individual| individual.plot_id == plot_id)
            .collect();
        individuals.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        individuals
    }

    pub fn photo(&self, id: RecordId) -> Option<&Photo> {
        self.photos.get(&id)
    }

    pub fn photos_in(&self, plot_id: RecordId) -> Vec<&Photo> {
        let mut photos: Vec<&Photo> = self
            .photos
            .values()
            .filter(|photo| photo.plot_id == plot_id)
            .collect();
        photos.sort_by(|a, b| a.filename.cmp(&b.filename).then(a.id.cmp(&b.id)));
        photos
    }

    /// Case-insensitive substring search over cemetery names, plot numbers,
    /// individual names and epitaphs. Read-only; never touches sync state.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for cemetery in self.cemeteries.values() {
            if cemetery.name.to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    kind: EntityKind::Cemetery,
                    id: cemetery.id,
                    snippet: cemetery.name.clone(),
                });
            }
        }
        for plot in self.plots.values() {
            if plot.plot_number.to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    kind: EntityKind::Plot,
                    id: plot.id,
                    snippet: plot.plot_number.clone(),
                });
            }
        }
        for individual in self.individuals.values() {
            if individual.name.to_lowercase().contains(&needle)
                || individual.epitaph.to_lowercase().contains(&needle)
            {
                hits.push(SearchHit {
                    kind: EntityKind::Individual,
                    id: individual.id,
                    snippet: individual.name.clone(),
                });
            }
        }
        hits.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then(a.snippet.cmp(&b.snippet))
                .then(a.id.cmp(&b.id))
        });
        hits
    }

    pub fn sync_record(&self, kind: EntityKind, id: RecordId) -> Option<&SyncRecord> {
        self.sync.get(&(kind, id))
    }

    pub fn sync_records(&self) -> impl Iterator<Item = &SyncRecord> {
        self.sync.values()
    }

    /// One entity of any kind by key, cloned for wire encoding.
    pub fn entity(&self, kind: EntityKind, id: RecordId) -> Option<Entity> {
        match kind {
            EntityKind::Cemetery => self.cemeteries.get(&id).cloned().map(Entity::Cemetery),
            EntityKind::Plot => self.plots.get(&id).cloned().map(Entity::Plot),
            EntityKind::Individual => self.individuals.get(&id).cloned().map(Entity::Individual),
            EntityKind::Photo => self.photos.get(&id).cloned().map(Entity::Photo),
        }
    }

    pub(crate) fn cemeteries_iter(&self) -> impl Iterator<Item = &Cemetery> {
        self.cemeteries.values()
    }

    pub(crate) fn plots_iter(&self) -> impl Iterator<Item = &Plot> {
        self.plots.values()
    }

    pub(crate) fn individuals_iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.values()
    }

    pub(crate) fn photos_iter(&self) -> impl Iterator<Item = &Photo> {
        self.photos.values()
    }

    // ----- sync-side application ----------------------------------------

    /// Snapshot of every record due for push: upserts owner-first, then
    /// tombstones dependent-first, each group in local-revision order.
    pub fn pending_push_records(&self) -> Vec<SyncRecord> {
        let mut batch = Vec::new();
        for kind in EntityKind::UPSERT_ORDER {
            let mut group: Vec<SyncRecord> = self
                .sync
                .values()
                .filter(|record| record.kind == kind && record.needs_push() && !record.tombstone)
                .cloned()
                .collect();
            group.sort_by_key(|record| record.local_revision);
            batch.extend(group);
        }
        for kind in EntityKind::DELETE_ORDER {
            let mut group: Vec<SyncRecord> = self
                .sync
                .values()
                .filter(|record| record.kind == kind && record.needs_push() && record.tombstone)
                .cloned()
                .collect();
            group.sort_by_key(|record| record.local_revision);
            batch.extend(group);
        }
        batch
    }

    /// Highest backend revision this session has observed for one entity
    /// kind; the `since` watermark for pulls.
    pub fn remote_watermark(&self, kind: EntityKind) -> u64 {
        self.sync
            .values()
            .filter(|record| record.kind == kind)
            .filter_map(|record| record.remote_revision)
            .max()
            .unwrap_or(0)
    }

    /// Marks one push as accepted by the backend.
    ///
    /// `pushed_revision` is the local revision captured when the batch was
    /// assembled; a record edited after that stays in the push queue so a
    /// stale push can never mask newer local changes.
    pub fn apply_push_success(
        &mut self,
        kind: EntityKind,
        id: RecordId,
        pushed_revision: u64,
        remote_revision: u64,
    ) {
        let key = (kind, id);
        let Some(record) = self.sync.get_mut(&key) else {
            return;
        };
        if record.tombstone {
            if record.local_revision == pushed_revision {
                // Delete confirmed; the tombstone has done its job.
                self.sync.remove(&key);
            }
            return;
        }
        if record.local_revision == pushed_revision {
            record.mark_push_succeeded(remote_revision);
        } else if remote_revision > record.remote_revision.unwrap_or(0) {
            record.remote_revision = Some(remote_revision);
        }
    }

    /// Marks one push as failed; the entity stays fully editable.
    pub fn apply_push_failure(&mut self, kind: EntityKind, id: RecordId, pushed_revision: u64) {
        if let Some(record) = self.sync.get_mut(&(kind, id)) {
            if record.local_revision == pushed_revision {
                record.mark_push_failed();
            }
        }
    }

    /// Applies one pulled record. Local edits always take precedence;
    /// a backend advance over unpushed edits flags a conflict instead of
    /// merging.
    pub fn apply_remote(
        &mut self,
        entity: Entity,
        remote_revision: u64,
    ) -> StoreResult<PullApply> {
        let kind = entity.kind();
        let id = entity.id();
        let key = (kind, id);

        let known = match self.sync.get(&key) {
            Some(record) if record.tombstone => return Ok(PullApply::SkippedTombstone),
            Some(record) => Some((record.state, record.remote_revision.unwrap_or(0))),
            None => None,
        };

        match known {
            Some((SyncState::Synced, known_remote)) => {
                if remote_revision <= known_remote {
                    return Ok(PullApply::SkippedStale);
                }
                self.write_remote_entity(entity)?;
                if let Some(record) = self.sync.get_mut(&key) {
                    record.remote_revision = Some(remote_revision);
                    record.local_revision = record.local_revision.max(remote_revision);
                }
                Ok(PullApply::Applied)
            }
            Some((SyncState::Conflict, _)) => Ok(PullApply::SkippedLocalPrecedence),
            Some((_, known_remote)) => {
                // PendingPush / PushFailed / LocalOnly: local edits win.
                if remote_revision > known_remote {
                    if let Some(record) = self.sync.get_mut(&key) {
                        record.state = SyncState::Conflict;
                    }
                    Ok(PullApply::ConflictDetected)
                } else {
                    Ok(PullApply::SkippedLocalPrecedence)
                }
            }
            None => {
                self.write_remote_entity(entity)?;
                self.sync
                    .insert(key, SyncRecord::for_pulled_entity(kind, id, remote_revision));
                Ok(PullApply::Applied)
            }
        }
    }

    /// Keeps the local copy of a conflicted record and re-queues it for
    /// push (the operator decided local wins).
    pub fn resolve_conflict_keep_local(&mut self, kind: EntityKind, id: RecordId) -> StoreResult<()> {
        let record = self
            .sync
            .get_mut(&(kind, id))
            .ok_or(StoreError::NotFound { kind, id })?;
        if record.state != SyncState::Conflict {
            return Err(StoreError::NotInConflict { kind, id });
        }
        record.state = SyncState::PendingPush;
        Ok(())
    }

    /// Replaces the local copy of a conflicted record with the backend's
    /// copy (the operator decided remote wins).
    pub fn resolve_conflict_accept_remote(
        &mut self,
        entity: Entity,
        remote_revision: u64,
    ) -> StoreResult<()> {
        let kind = entity.kind();
        let id = entity.id();
        let key = (kind, id);
        {
            let record = self
                .sync
                .get(&key)
                .ok_or(StoreError::NotFound { kind, id })?;
            if record.state != SyncState::Conflict {
                return Err(StoreError::NotInConflict { kind, id });
            }
        }
        self.write_remote_entity(entity)?;
        if let Some(record) = self.sync.get_mut(&key) {
            record.state = SyncState::Synced;
            record.remote_revision = Some(remote_revision);
            record.local_revision = record.local_revision.max(remote_revision);
        }
        Ok(())
    }

    // ----- internals ----------------------------------------------------

    fn write_remote_entity(&mut self, entity: Entity) -> StoreResult<()> {
        entity.validate()?;
        match entity {
            Entity::Cemetery(cemetery) => {
                self.cemeteries.insert(cemetery.id, cemetery);
            }
            Entity::Plot(plot) => {
                self.require_cemetery(EntityKind::Plot, plot.cemetery_id)?;
                self.plots.insert(plot.id, plot);
            }
            Entity::Individual(individual) => {
                self.require_plot(EntityKind::Individual, individual.plot_id)?;
                self.individuals.insert(individual.id, individual);
            }
            Entity::Photo(photo) => {
                self.require_plot(EntityKind::Photo, photo.plot_id)?;
                self.photos.insert(photo.id, photo);
            }
        }
        Ok(())
    }

    fn require_cemetery(&self, kind: EntityKind, cemetery_id: RecordId) -> StoreResult<()> {
        if self.cemeteries.contains_key(&cemetery_id) {
            Ok(())
        } else {
            Err(StoreError::MissingOwner {
                kind,
                owner: EntityKind::Cemetery,
                owner_id: cemetery_id,
            })
        }
    }

    fn require_plot(&self, kind: EntityKind, plot_id: RecordId) -> StoreResult<()> {
        if self.plots.contains_key(&plot_id) {
            Ok(())
        } else {
            Err(StoreError::MissingOwner {
                kind,
                owner: EntityKind::Plot,
                owner_id: plot_id,
            })
        }
    }

    fn note_created(&mut self, kind: EntityKind, id: RecordId) {
        self.sync.insert(
            (kind, id),
            SyncRecord::for_new_entity(kind, id, self.backend_configured),
        );
    }

    fn note_mutated(&mut self, kind: EntityKind, id: RecordId) {
        let backend_configured = self.backend_configured;
        if let Some(record) = self.sync.get_mut(&(kind, id)) {
            record.note_local_edit(backend_configured);
        }
    }

    fn note_deleted(&mut self, kind: EntityKind, id: RecordId) {
        let key = (kind, id);
        let Some(record) = self.sync.get_mut(&key) else {
            return;
        };
        let never_left_this_session =
            record.state == SyncState::LocalOnly && record.remote_revision.is_none();
        if never_left_this_session {
            self.sync.remove(&key);
            return;
        }
        record.local_revision += 1;
        record.tombstone = true;
        record.state = SyncState::PendingPush;
    }
}
