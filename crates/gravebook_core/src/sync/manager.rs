//! Push/pull reconciliation between the record store and the backend.
//!
//! # Responsibility
//! - Push every pending record (upserts owner-first, tombstone deletes
//!   dependent-first) with per-record failure isolation.
//! - Pull backend changes per entity kind and apply them through the
//!   store's precedence rules.
//!
//! # Invariants
//! - One record's failure never aborts the rest of the batch.
//! - A push failure leaves the record fully editable; a pull failure
//!   degrades to a no-op for that kind.
//! - The manager never touches entity maps directly; every application
//!   goes through the store contract.

use crate::model::{EntityKind, RecordId};
use crate::net::{BackendGateway, Method, TransportError};
use crate::store::record_store::{PullApply, RecordStore, StoreError};
use crate::sync::record::SyncRecord;
use crate::sync::wire;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Identifies one record in a sync report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncKey {
    pub kind: EntityKind,
    pub id: RecordId,
}

impl Display for SyncKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Why one record (or one kind's pull) failed.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncFailureReason {
    /// Network or HTTP-level failure, unmodified from the gateway.
    Transport(TransportError),
    /// Backend answered 2xx but the body did not decode.
    MalformedResponse { detail: String },
    /// Pulled record could not be applied (e.g. owner missing locally).
    Apply(StoreError),
}

impl Display for SyncFailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "{err}"),
            Self::MalformedResponse { detail } => {
                write!(f, "backend response was not a valid payload: {detail}")
            }
            Self::Apply(err) => write!(f, "pulled record not applied: {err}"),
        }
    }
}

impl Error for SyncFailureReason {}

/// One failed record in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncFailure {
    pub kind: EntityKind,
    /// Absent for kind-level pull fetch failures.
    pub id: Option<RecordId>,
    pub reason: SyncFailureReason,
}

/// Outcome of one push or pull batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncReport {
    /// Records upserted or delete-confirmed (push), or applied (pull).
    pub succeeded: Vec<SyncKey>,
    pub failed: Vec<SyncFailure>,
    /// Records flipped to `Conflict` during this pull.
    pub conflicts: Vec<SyncKey>,
    /// Pulled records dropped because local edits take precedence
    /// (includes tombstoned and stale records).
    pub skipped: usize,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.conflicts.is_empty()
    }
}

/// Reconciles the record store against the backend gateway.
pub struct SyncManager {
    gateway: Arc<dyn BackendGateway>,
}

impl SyncManager {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self { gateway }
    }

    /// Pushes every record in `PendingPush`/`PushFailed`.
    ///
    /// Always attempts the whole batch; failures are recorded per record
    /// and the affected entities stay fully usable locally.
    pub fn push_pending(&self, store: &mut RecordStore, timeout_ms: u64) -> SyncReport {
        let batch = store.pending_push_records();
        let mut report = SyncReport::default();

        for record in batch {
            if record.tombstone {
                self.push_delete(store, &record, timeout_ms, &mut report);
            } else {
                self.push_upsert(store, &record, timeout_ms, &mut report);
            }
        }

        info!(
            "event=push_pending module=sync status={} pushed={} failed={}",
            if report.failed.is_empty() { "ok" } else { "partial" },
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }

    fn push_upsert(
        &self,
        store: &mut RecordStore,
        record: &SyncRecord,
        timeout_ms: u64,
        report: &mut SyncReport,
    ) {
        let key = SyncKey {
            kind: record.kind,
            id: record.id,
        };
        let Some(entity) = store.entity(record.kind, record.id) else {
            // Entity vanished between batch assembly and push; the next
            // batch will carry its tombstone.
            report.skipped += 1;
            return;
        };

        let body = wire::encode_push(&entity, record.local_revision);
        let path = format!("/api/{}/{}", record.kind.collection(), record.id);
        match self
            .gateway
            .request(Method::Put, &path, &[], Some(&body), timeout_ms)
        {
            Ok(response) => match wire::decode_push_ack(&response.body) {
                Ok(ack) => {
                    store.apply_push_success(
                        record.kind,
                        record.id,
                        record.local_revision,
                        ack.revision,
                    );
                    report.succeeded.push(key);
                }
                Err(detail) => {
                    warn!(
                        "event=push_record module=sync status=malformed_ack kind={} id={}",
                        record.kind, record.id
                    );
                    store.apply_push_failure(record.kind, record.id, record.local_revision);
                    report.failed.push(SyncFailure {
                        kind: record.kind,
                        id: Some(record.id),
                        reason: SyncFailureReason::MalformedResponse { detail },
                    });
                }
            },
            Err(err) => {
                warn!(
                    "event=push_record module=sync status=error kind={} id={} error={err}",
                    record.kind, record.id
                );
                store.apply_push_failure(record.kind, record.id, record.local_revision);
                report.failed.push(SyncFailure {
                    kind: record.kind,
                    id: Some(record.id),
                    reason: SyncFailureReason::Transport(err),
                });
            }
        }
    }

    fn push_delete(
        &self,
        store: &mut RecordStore,
        record: &SyncRecord,
        timeout_ms: u64,
        report: &mut SyncReport,
    ) {
        let key = SyncKey {
            kind: record.kind,
            id: record.id,
        };
        let path = format!("/api/{}/{}", record.kind.collection(), record.id);
        let outcome = self
            .gateway
            .request(Method::Delete, &path, &[], None, timeout_ms);

        match outcome {
            // 404 means the backend never had (or already dropped) the
            // record; the delete is reconciled either way.
            Ok(_) | Err(TransportError::Http { status: 404, .. }) => {
                store.apply_push_success(
                    record.kind,
                    record.id,
                    record.local_revision,
                    record.remote_revision.unwrap_or(0),
                );
                report.succeeded.push(key);
            }
            Err(err) => {
                warn!(
                    "event=push_delete module=sync status=error kind={} id={} error={err}",
                    record.kind, record.id
                );
                store.apply_push_failure(record.kind, record.id, record.local_revision);
                report.failed.push(SyncFailure {
                    kind: record.kind,
                    id: Some(record.id),
                    reason: SyncFailureReason::Transport(err),
                });
            }
        }
    }

    /// Pulls backend changes since the last observed revision per kind.
    ///
    /// Owners are pulled before dependents so newly appearing plots find
    /// their cemetery. A fetch failure degrades to a no-op for that kind.
    pub fn pull_updates(&self, store: &mut RecordStore, timeout_ms: u64) -> SyncReport {
        let mut report = SyncReport::default();

        for kind in EntityKind::UPSERT_ORDER {
            let since = store.remote_watermark(kind);
            let path = format!("/api/{}", kind.collection());
            let since_text = since.to_string();
            let response = match self.gateway.request(
                Method::Get,
                &path,
                &[("since", since_text.as_str())],
                None,
                timeout_ms,
            ) {
                Ok(response) => response,
                Err(err) => {
                    warn!(
                        "event=pull_updates module=sync status=fetch_error kind={kind} error={err}"
                    );
                    report.failed.push(SyncFailure {
                        kind,
                        id: None,
                        reason: SyncFailureReason::Transport(err),
                    });
                    continue;
                }
            };

            let page = match wire::decode_pull_page(kind, &response.body) {
                Ok(page) => page,
                Err(detail) => {
                    warn!(
                        "event=pull_updates module=sync status=malformed_page kind={kind}"
                    );
                    report.failed.push(SyncFailure {
                        kind,
                        id: None,
                        reason: SyncFailureReason::MalformedResponse { detail },
                    });
                    continue;
                }
            };

            for (entity, revision) in page {
                let key = SyncKey {
                    kind,
                    id: entity.id(),
                };
                match store.apply_remote(entity, revision) {
                    Ok(PullApply::Applied) => report.succeeded.push(key),
                    Ok(PullApply::ConflictDetected) => report.conflicts.push(key),
                    Ok(
                        PullApply::SkippedStale
                        | PullApply::SkippedLocalPrecedence
                        | PullApply::SkippedTombstone,
                    ) => report.skipped += 1,
                    Err(err) => report.failed.push(SyncFailure {
                        kind,
                        id: Some(key.id),
                        reason: SyncFailureReason::Apply(err),
                    }),
                }
            }
        }

        info!(
            "event=pull_updates module=sync status={} applied={} conflicts={} skipped={}",
            if report.failed.is_empty() { "ok" } else { "partial" },
            report.succeeded.len(),
            report.conflicts.len(),
            report.skipped
        );
        report
    }
}
