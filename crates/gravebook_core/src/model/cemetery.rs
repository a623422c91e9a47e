//! Cemetery domain model.
//!
//! # Responsibility
//! - Represent one cemetery site with its free-text address and, once
//!   geocoded, its resolved coordinate.
//!
//! # Invariants
//! - `id` is stable and never reused for another cemetery.
//! - `coordinate` is set as a whole pair by geocoding or manual entry,
//!   never half-populated.

use super::coordinate::Coordinate;
use super::{RecordId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cemetery site and its optional resolved position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cemetery {
    /// Stable global ID used for sync keying and plot ownership.
    pub id: RecordId,
    pub name: String,
    /// Free-text address as entered by the operator; geocoding input.
    pub location: String,
    pub description: String,
    /// Resolved position, if geocoded or entered manually.
    pub coordinate: Option<Coordinate>,
}

impl Cemetery {
    /// Creates a cemetery with a generated stable ID and no coordinate.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a cemetery with a caller-provided stable ID.
    ///
    /// Used by pull/import paths where identity already exists remotely.
    pub fn with_id(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            location: String::new(),
            description: String::new(),
            coordinate: None,
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                entity: "cemetery",
                field: "name",
            });
        }
        Ok(())
    }
}
