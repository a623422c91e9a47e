//! Synchronization between the local working set and the backend.
//!
//! # Responsibility
//! - Track per-record sync state (`record`), encode/decode the REST wire
//!   shapes (`wire`), and drive push/pull reconciliation (`manager`).
//!
//! # Invariants
//! - Push failures are isolated per record; one failure never aborts the
//!   batch.
//! - Pull never overwrites unpushed local edits; divergence becomes a
//!   `Conflict` the operator resolves manually.

pub mod manager;
pub mod record;
pub mod wire;
