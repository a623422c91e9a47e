//! Snapshot persistence layer.
//!
//! # Responsibility
//! - Serialize the whole working set plus sync metadata into the local
//!   SQLite snapshot, and load it back at session start.
//! - Keep SQL details inside this boundary; the store never sees a row.
//!
//! # Invariants
//! - A snapshot save is atomic: one transaction, all tables or nothing.
//! - Load rejects invalid persisted state instead of masking it.

pub mod snapshot;
