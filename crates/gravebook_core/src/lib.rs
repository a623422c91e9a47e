//! Core domain logic for Gravebook.
//!
//! Cemetery plot records assembled from headstone photographs: a local
//! authoritative working set, an address geocoding client, and a sync
//! manager reconciling local edits with the backend. This crate is the
//! single source of truth for business invariants; GUI, OCR and image
//! tooling live outside it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod net;
pub mod repo;
pub mod store;
pub mod sync;
pub mod worker;

pub use config::SessionConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cemetery::Cemetery;
pub use model::coordinate::Coordinate;
pub use model::photo::{OcrText, Photo, PhotoKind};
pub use model::plot::{Individual, Plot};
pub use model::{Entity, EntityKind, RecordId, ValidationError};
pub use net::gateway::HttpGateway;
pub use net::geocode::{GeocodeClient, GeocodeError, ResolvedLocation};
pub use net::{BackendGateway, GatewayResponse, Method, TransportError};
pub use repo::snapshot::{SnapshotError, SnapshotRepository, SqliteSnapshotRepository};
pub use store::record_store::{PullApply, RecordStore, SearchHit, StoreError, StoreResult};
pub use sync::manager::{SyncFailure, SyncFailureReason, SyncKey, SyncManager, SyncReport};
pub use sync::record::{SyncRecord, SyncState};
pub use worker::{Completion, Job, JobId, JobOutcome, SessionWorker};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
