//! Plot and individual domain models.
//!
//! # Responsibility
//! - Represent one burial plot (section/row/number) inside a cemetery.
//! - Represent the zero-or-more individuals recorded on that plot's stone
//!   (family-plot support).
//!
//! # Invariants
//! - `Plot.cemetery_id` must reference an existing cemetery; the store
//!   enforces this synchronously on every mutation.
//! - Dates on individuals are free-text as transcribed from the stone;
//!   unknown or partial dates are valid.

use super::coordinate::Coordinate;
use super::{RecordId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One burial plot inside a cemetery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: RecordId,
    pub cemetery_id: RecordId,
    pub plot_number: String,
    pub section: String,
    pub row: String,
    /// Plot-level position overriding the cemetery's default, when known.
    pub coordinate: Option<Coordinate>,
}

impl Plot {
    /// Creates a plot with a generated stable ID.
    pub fn new(cemetery_id: RecordId, plot_number: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), cemetery_id, plot_number)
    }

    /// Creates a plot with a caller-provided stable ID (pull/import paths).
    pub fn with_id(
        id: RecordId,
        cemetery_id: RecordId,
        plot_number: impl Into<String>,
    ) -> Self {
        Self {
            id,
            cemetery_id,
            plot_number: plot_number.into(),
            section: String::new(),
            row: String::new(),
            coordinate: None,
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.plot_number.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                entity: "plot",
                field: "plot_number",
            });
        }
        Ok(())
    }
}

/// One person recorded on a plot's headstone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: RecordId,
    pub plot_id: RecordId,
    pub name: String,
    /// Birth date as transcribed, e.g. `1844` or `Mar 3 1901`. None when
    /// the stone does not carry one.
    pub born_date: Option<String>,
    /// Death date as transcribed. None when unreadable or absent.
    pub died_date: Option<String>,
    pub epitaph: String,
    /// Relationship noted on the stone (`wife`, `son`, ...), free text.
    pub relationship: String,
}

impl Individual {
    /// Creates an individual with a generated stable ID.
    pub fn new(plot_id: RecordId, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), plot_id, name)
    }

    /// Creates an individual with a caller-provided stable ID.
    pub fn with_id(id: RecordId, plot_id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            plot_id,
            name: name.into(),
            born_date: None,
            died_date: None,
            epitaph: String::new(),
            relationship: String::new(),
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                entity: "individual",
                field: "name",
            });
        }
        Ok(())
    }
}
