//! Geographic coordinate pair.
//!
//! # Invariants
//! - A coordinate is always a complete pair; "latitude without longitude"
//!   cannot be represented. Optional positions are `Option<Coordinate>`.
//! - Values are range-checked at construction.

use super::ValidationError;
use serde::{Deserialize, Serialize};

/// Resolved latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a range-checked coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}
