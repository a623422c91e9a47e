//! Local snapshot storage bootstrap.
//!
//! # Responsibility
//! - Open and configure the SQLite file backing `save_locally()` /
//!   `load_locally()`.
//! - Apply snapshot schema migrations in deterministic order.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No snapshot data is read or written before migrations succeed.
//! - Opening the snapshot never contacts the network.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_snapshot, open_snapshot_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or migrating the local snapshot file.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Snapshot was written by a newer build than this one supports.
    SchemaVersionTooNew {
        file_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaVersionTooNew {
                file_version,
                latest_supported,
            } => write!(
                f,
                "snapshot schema version {file_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaVersionTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
