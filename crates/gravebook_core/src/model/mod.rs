//! Domain model for cemetery plot records.
//!
//! # Responsibility
//! - Define the canonical entities assembled from headstone photographs.
//! - Enforce field-level invariants before anything is persisted or pushed.
//!
//! # Invariants
//! - Every entity is identified by a stable `RecordId`.
//! - Coordinates exist only as a complete latitude/longitude pair.
//! - Write paths must call `validate()` before the record leaves the model
//!   layer.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod cemetery;
pub mod coordinate;
pub mod photo;
pub mod plot;

use cemetery::Cemetery;
use photo::Photo;
use plot::{Individual, Plot};

/// Stable identifier for every record in the working set.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = Uuid;

/// Which entity table a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Cemetery,
    Plot,
    Individual,
    Photo,
}

impl EntityKind {
    /// Push order: owners before dependents, so backend foreign keys hold.
    pub const UPSERT_ORDER: [EntityKind; 4] = [
        EntityKind::Cemetery,
        EntityKind::Plot,
        EntityKind::Individual,
        EntityKind::Photo,
    ];

    /// Delete order: dependents before owners.
    pub const DELETE_ORDER: [EntityKind; 4] = [
        EntityKind::Photo,
        EntityKind::Individual,
        EntityKind::Plot,
        EntityKind::Cemetery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cemetery => "cemetery",
            Self::Plot => "plot",
            Self::Individual => "individual",
            Self::Photo => "photo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cemetery" => Some(Self::Cemetery),
            "plot" => Some(Self::Plot),
            "individual" => Some(Self::Individual),
            "photo" => Some(Self::Photo),
            _ => None,
        }
    }

    /// REST collection segment on the backend, e.g. `plots` in
    /// `PUT /api/plots/<id>`.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Cemetery => "cemeteries",
            Self::Plot => "plots",
            Self::Individual => "individuals",
            Self::Photo => "photos",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity of any kind, used by pull application and conflict
/// resolution where the concrete type is chosen at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Cemetery(Cemetery),
    Plot(Plot),
    Individual(Individual),
    Photo(Photo),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Cemetery(_) => EntityKind::Cemetery,
            Self::Plot(_) => EntityKind::Plot,
            Self::Individual(_) => EntityKind::Individual,
            Self::Photo(_) => EntityKind::Photo,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            Self::Cemetery(cemetery) => cemetery.id,
            Self::Plot(plot) => plot.id,
            Self::Individual(individual) => individual.id,
            Self::Photo(photo) => photo.id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Cemetery(cemetery) => cemetery.validate(),
            Self::Plot(plot) => plot.validate(),
            Self::Individual(individual) => individual.validate(),
            Self::Photo(photo) => photo.validate(),
        }
    }
}

/// Field-level validation failure shared by all entities.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
    /// Latitude outside [-90, 90].
    LatitudeOutOfRange(f64),
    /// Longitude outside [-180, 180].
    LongitudeOutOfRange(f64),
    /// OCR confidence outside [0.0, 1.0].
    ConfidenceOutOfRange(f64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field } => {
                write!(f, "{entity}.{field} must not be empty")
            }
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} outside valid range [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} outside valid range [-180, 180]")
            }
            Self::ConfidenceOutOfRange(value) => {
                write!(f, "ocr confidence {value} outside valid range [0, 1]")
            }
        }
    }
}

impl Error for ValidationError {}
