//! Snapshot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - `save_snapshot`: replace the on-disk snapshot with the current
//!   working set in one transaction.
//! - `load_snapshot`: rebuild a `RecordStore` from the snapshot file.
//!
//! # Invariants
//! - Writes never contact the network; this is the offline fallback path.
//! - Tombstoned sync rows survive round-trips so pending deletes are not
//!   lost across sessions.

use crate::db::DbError;
use crate::model::cemetery::Cemetery;
use crate::model::coordinate::Coordinate;
use crate::model::photo::{OcrText, Photo, PhotoKind};
use crate::model::plot::{Individual, Plot};
use crate::model::{EntityKind, RecordId};
use crate::store::record_store::RecordStore;
use crate::sync::record::{SyncRecord, SyncState};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Local persistence failure: the disk side of dual persistence.
#[derive(Debug)]
pub enum SnapshotError {
    Db(DbError),
    /// The connection has not been migrated to the expected schema.
    UninitializedSnapshot {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted bytes cannot be decoded into a valid working set.
    InvalidData(String),
    /// Session has no snapshot file configured to save into.
    NoSnapshotPath,
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "local snapshot storage failed: {err}"),
            Self::UninitializedSnapshot {
                expected_version,
                actual_version,
            } => write!(
                f,
                "snapshot connection at schema version {actual_version}, expected {expected_version}"
            ),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted snapshot data: {message}")
            }
            Self::NoSnapshotPath => {
                write!(f, "no local snapshot path configured for this session")
            }
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for SnapshotError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SnapshotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract used by `RecordStore::save_locally` /
/// `load_locally`.
pub trait SnapshotRepository {
    fn save_snapshot(&self, store: &RecordStore) -> SnapshotResult<()>;
    fn load_snapshot(&self) -> SnapshotResult<RecordStore>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Wraps a migrated snapshot connection.
    ///
    /// Rejects connections whose schema version does not match this build,
    /// so snapshot I/O cannot run against a half-initialized file.
    pub fn try_new(conn: &'conn Connection) -> SnapshotResult<Self> {
        let expected = crate::db::migrations::latest_version();
        let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual != expected {
            return Err(SnapshotError::UninitializedSnapshot {
                expected_version: expected,
                actual_version: actual,
            });
        }
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn save_snapshot(&self, store: &RecordStore) -> SnapshotResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute_batch(
            "DELETE FROM sync_records;
             DELETE FROM photos;
             DELETE FROM individuals;
             DELETE FROM plots;
             DELETE FROM cemeteries;",
        )?;

        for cemetery in store.cemeteries_iter() {
            tx.execute(
                "INSERT INTO cemeteries (id, name, location, description, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    cemetery.id.to_string(),
                    cemetery.name.as_str(),
                    cemetery.location.as_str(),
                    cemetery.description.as_str(),
                    cemetery.coordinate.map(|c| c.latitude),
                    cemetery.coordinate.map(|c| c.longitude),
                ],
            )?;
        }

        for plot in store.plots_iter() {
            tx.execute(
                "INSERT INTO plots (id, cemetery_id, plot_number, section, row, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    plot.id.to_string(),
                    plot.cemetery_id.to_string(),
                    plot.plot_number.as_str(),
                    plot.section.as_str(),
                    plot.row.as_str(),
                    plot.coordinate.map(|c| c.latitude),
                    plot.coordinate.map(|c| c.longitude),
                ],
            )?;
        }

        for individual in store.individuals_iter() {
            tx.execute(
                "INSERT INTO individuals (id, plot_id, name, born_date, died_date, epitaph, relationship)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    individual.id.to_string(),
                    individual.plot_id.to_string(),
                    individual.name.as_str(),
                    individual.born_date.as_deref(),
                    individual.died_date.as_deref(),
                    individual.epitaph.as_str(),
                    individual.relationship.as_str(),
                ],
            )?;
        }

        for photo in store.photos_iter() {
            tx.execute(
                "INSERT INTO photos (id, plot_id, filename, storage_path, kind, ocr_text, ocr_confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    photo.id.to_string(),
                    photo.plot_id.to_string(),
                    photo.filename.as_str(),
                    photo.storage_path.as_str(),
                    photo.kind.as_str(),
                    photo.ocr.as_ref().map(|ocr| ocr.text.as_str()),
                    photo.ocr.as_ref().map(|ocr| ocr.confidence),
                ],
            )?;
        }

        for record in store.sync_records() {
            tx.execute(
                "INSERT INTO sync_records (kind, id, local_revision, remote_revision, state, tombstone)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    record.kind.as_str(),
                    record.id.to_string(),
                    i64::try_from(record.local_revision).map_err(|_| {
                        SnapshotError::InvalidData(format!(
                            "local revision {} does not fit snapshot storage",
                            record.local_revision
                        ))
                    })?,
                    record
                        .remote_revision
                        .map(|revision| revision as i64),
                    record.state.as_str(),
                    record.tombstone as i64,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn load_snapshot(&self) -> SnapshotResult<RecordStore> {
        let mut cemeteries = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT id, name, location, description, latitude, longitude FROM cemeteries;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let cemetery = parse_cemetery_row(row)?;
            cemeteries.insert(cemetery.id, cemetery);
        }

        let mut plots = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT id, cemetery_id, plot_number, section, row, latitude, longitude FROM plots;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let plot = parse_plot_row(row)?;
            plots.insert(plot.id, plot);
        }

        let mut individuals = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT id, plot_id, name, born_date, died_date, epitaph, relationship
             FROM individuals;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let individual = parse_individual_row(row)?;
            individuals.insert(individual.id, individual);
        }

        let mut photos = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT id, plot_id, filename, storage_path, kind, ocr_text, ocr_confidence
             FROM photos;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let photo = parse_photo_row(row)?;
            photos.insert(photo.id, photo);
        }

        let mut sync = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT kind, id, local_revision, remote_revision, state, tombstone
             FROM sync_records;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let record = parse_sync_row(row)?;
            sync.insert((record.kind, record.id), record);
        }

        Ok(RecordStore::from_parts(
            cemeteries,
            plots,
            individuals,
            photos,
            sync,
        ))
    }
}

fn parse_uuid(column: &str, value: String) -> SnapshotResult<RecordId> {
    Uuid::parse_str(&value)
        .map_err(|_| SnapshotError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn parse_coordinate(
    table: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> SnapshotResult<Option<Coordinate>> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude)
            .map(Some)
            .map_err(|err| SnapshotError::InvalidData(format!("{table}: {err}"))),
        _ => Err(SnapshotError::InvalidData(format!(
            "{table}: latitude/longitude pair is half-populated"
        ))),
    }
}

fn parse_cemetery_row(row: &Row<'_>) -> SnapshotResult<Cemetery> {
    let id = parse_uuid("cemeteries.id", row.get("id")?)?;
    let coordinate = parse_coordinate("cemeteries", row.get("latitude")?, row.get("longitude")?)?;
    Ok(Cemetery {
        id,
        name: row.get("name")?,
        location: row.get("location")?,
        description: row.get("description")?,
        coordinate,
    })
}

fn parse_plot_row(row: &Row<'_>) -> SnapshotResult<Plot> {
    let id = parse_uuid("plots.id", row.get("id")?)?;
    let cemetery_id = parse_uuid("plots.cemetery_id", row.get("cemetery_id")?)?;
    let coordinate = parse_coordinate("plots", row.get("latitude")?, row.get("longitude")?)?;
    Ok(Plot {
        id,
        cemetery_id,
        plot_number: row.get("plot_number")?,
        section: row.get("section")?,
        row: row.get("row")?,
        coordinate,
    })
}

fn parse_individual_row(row: &Row<'_>) -> SnapshotResult<Individual> {
    let id = parse_uuid("individuals.id", row.get("id")?)?;
    let plot_id = parse_uuid("individuals.plot_id", row.get("plot_id")?)?;
    Ok(Individual {
        id,
        plot_id,
        name: row.get("name")?,
        born_date: row.get("born_date")?,
        died_date: row.get("died_date")?,
        epitaph: row.get("epitaph")?,
        relationship: row.get("relationship")?,
    })
}

fn parse_photo_row(row: &Row<'_>) -> SnapshotResult<Photo> {
    let id = parse_uuid("photos.id", row.get("id")?)?;
    let plot_id = parse_uuid("photos.plot_id", row.get("plot_id")?)?;

    let kind_text: String = row.get("kind")?;
    let kind = PhotoKind::parse(&kind_text).ok_or_else(|| {
        SnapshotError::InvalidData(format!("invalid photo kind `{kind_text}` in photos.kind"))
    })?;

    let ocr = match (
        row.get::<_, Option<String>>("ocr_text")?,
        row.get::<_, Option<f64>>("ocr_confidence")?,
    ) {
        (None, None) => None,
        (Some(text), Some(confidence)) => {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(SnapshotError::InvalidData(format!(
                    "photos.ocr_confidence {confidence} outside [0, 1]"
                )));
            }
            Some(OcrText { text, confidence })
        }
        _ => {
            return Err(SnapshotError::InvalidData(
                "photos: ocr text/confidence pair is half-populated".to_string(),
            ));
        }
    };

    Ok(Photo {
        id,
        plot_id,
        filename: row.get("filename")?,
        storage_path: row.get("storage_path")?,
        kind,
        ocr,
    })
}

fn parse_sync_row(row: &Row<'_>) -> SnapshotResult<SyncRecord> {
    let kind_text: String = row.get("kind")?;
    let kind = EntityKind::parse(&kind_text).ok_or_else(|| {
        SnapshotError::InvalidData(format!(
            "invalid entity kind `{kind_text}` in sync_records.kind"
        ))
    })?;
    let id = parse_uuid("sync_records.id", row.get("id")?)?;

    let state_text: String = row.get("state")?;
    let state = SyncState::parse(&state_text).ok_or_else(|| {
        SnapshotError::InvalidData(format!(
            "invalid sync state `{state_text}` in sync_records.state"
        ))
    })?;

    let local_revision: i64 = row.get("local_revision")?;
    let local_revision = u64::try_from(local_revision).map_err(|_| {
        SnapshotError::InvalidData(format!(
            "negative local revision {local_revision} in sync_records"
        ))
    })?;

    let remote_revision = match row.get::<_, Option<i64>>("remote_revision")? {
        Some(value) => Some(u64::try_from(value).map_err(|_| {
            SnapshotError::InvalidData(format!("negative remote revision {value} in sync_records"))
        })?),
        None => None,
    };

    let tombstone = match row.get::<_, i64>("tombstone")? {
        0 => false,
        1 => true,
        other => {
            return Err(SnapshotError::InvalidData(format!(
                "invalid tombstone value `{other}` in sync_records.tombstone"
            )));
        }
    };

    Ok(SyncRecord {
        kind,
        id,
        local_revision,
        remote_revision,
        state,
        tombstone,
    })
}
