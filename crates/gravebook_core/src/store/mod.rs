//! In-session record store.
//!
//! # Responsibility
//! - Hold the authoritative working copy of all cemetery records for the
//!   active session.
//! - Funnel every mutation through one typed contract so sync metadata
//!   stays consistent (no ambient module state, no direct field access
//!   across threads).
//!
//! # Invariants
//! - Referential integrity is enforced synchronously: no mutation may
//!   leave a plot, individual or photo without its owner.
//! - Queries never mutate sync state.

pub mod record_store;
