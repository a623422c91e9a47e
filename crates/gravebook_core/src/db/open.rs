//! Snapshot connection bootstrap.
//!
//! # Responsibility
//! - Open file or in-memory snapshot connections.
//! - Configure pragmas and run migrations before handing out the
//!   connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have all migrations applied.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens the local snapshot file, creating and migrating it as needed.
///
/// # Side effects
/// - Emits `snapshot_open` logging events with duration and status.
pub fn open_snapshot(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_inner(|| Connection::open(path.as_ref()), "file")
}

/// Opens an in-memory snapshot database (tests, throwaway sessions).
pub fn open_snapshot_in_memory() -> DbResult<Connection> {
    open_inner(Connection::open_in_memory, "memory")
}

fn open_inner(
    open: impl FnOnce() -> rusqlite::Result<Connection>,
    mode: &str,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=snapshot_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=snapshot_open module=db status=error mode={mode} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;

    match apply_migrations(&mut conn) {
        Ok(()) => {
            info!(
                "event=snapshot_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=snapshot_open module=db status=error mode={mode} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}
