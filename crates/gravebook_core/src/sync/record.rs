//! Per-record synchronization metadata.
//!
//! # Responsibility
//! - Track, for every entity in the working set, how the local copy relates
//!   to the backend copy.
//! - Keep tombstones for deletions that still need backend reconciliation.
//!
//! # Invariants
//! - `local_revision` is monotonic; every local mutation bumps it.
//! - `remote_revision` only ever reflects a value the backend actually
//!   returned or served.
//! - A tombstoned record keeps its metadata until a push confirms the
//!   delete, so a stale pull cannot resurrect the entity.

use crate::model::{EntityKind, RecordId};

/// Relationship between the local copy and the backend copy of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No backend has ever been configured for this session.
    LocalOnly,
    /// Local and backend copies agree as of `remote_revision`.
    Synced,
    /// Local edits exist that the backend has not seen.
    PendingPush,
    /// The last push attempt failed; the record stays fully editable.
    PushFailed,
    /// Backend advanced past what this session observed while local edits
    /// were unpushed. Resolution is manual, never auto-merged.
    Conflict,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalOnly => "local_only",
            Self::Synced => "synced",
            Self::PendingPush => "pending_push",
            Self::PushFailed => "push_failed",
            Self::Conflict => "conflict",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local_only" => Some(Self::LocalOnly),
            "synced" => Some(Self::Synced),
            "pending_push" => Some(Self::PendingPush),
            "push_failed" => Some(Self::PushFailed),
            "conflict" => Some(Self::Conflict),
            _ => None,
        }
    }
}

/// Sync bookkeeping for one entity, keyed by `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRecord {
    pub kind: EntityKind,
    pub id: RecordId,
    /// Monotonic counter bumped on every local mutation.
    pub local_revision: u64,
    /// Last revision the backend returned for this record, if ever pushed.
    pub remote_revision: Option<u64>,
    pub state: SyncState,
    /// Entity was deleted locally but the delete is not yet confirmed
    /// by the backend.
    pub tombstone: bool,
}

impl SyncRecord {
    /// Metadata for a freshly created local entity.
    pub fn for_new_entity(kind: EntityKind, id: RecordId, backend_configured: bool) -> Self {
        Self {
            kind,
            id,
            local_revision: 1,
            remote_revision: None,
            state: if backend_configured {
                SyncState::PendingPush
            } else {
                SyncState::LocalOnly
            },
            tombstone: false,
        }
    }

    /// Metadata for an entity first seen via a backend pull.
    pub fn for_pulled_entity(kind: EntityKind, id: RecordId, remote_revision: u64) -> Self {
        Self {
            kind,
            id,
            local_revision: remote_revision,
            remote_revision: Some(remote_revision),
            state: SyncState::Synced,
            tombstone: false,
        }
    }

    /// Records one local mutation: bumps the revision and re-marks the
    /// record for push. A conflicted record stays conflicted; the operator
    /// resolves it explicitly.
    pub fn note_local_edit(&mut self, backend_configured: bool) {
        self.local_revision += 1;
        if self.state != SyncState::Conflict {
            self.state = if backend_configured {
                SyncState::PendingPush
            } else {
                SyncState::LocalOnly
            };
        }
    }

    /// Whether this record is due in the next push batch.
    pub fn needs_push(&self) -> bool {
        matches!(self.state, SyncState::PendingPush | SyncState::PushFailed)
    }

    /// Whether the local copy carries edits the backend has not accepted.
    pub fn has_unpushed_edits(&self) -> bool {
        !matches!(self.state, SyncState::Synced)
    }

    pub fn mark_push_succeeded(&mut self, remote_revision: u64) {
        self.state = SyncState::Synced;
        self.remote_revision = Some(remote_revision);
    }

    pub fn mark_push_failed(&mut self) {
        self.state = SyncState::PushFailed;
    }
}
