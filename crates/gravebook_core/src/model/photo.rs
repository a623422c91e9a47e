//! Photo metadata model.
//!
//! # Invariants
//! - OCR fields are written only through the recognition-collaborator seam
//!   (`RecordStore::attach_ocr_text`); the core never synthesizes them.
//! - `ocr.confidence` stays inside [0.0, 1.0].

use super::{RecordId, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a stored photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoKind {
    /// Close-up of a single headstone.
    Headstone,
    /// Wide shot used for orientation within a section.
    Panoramic,
    /// Scanned cemetery blueprint or plat map.
    Blueprint,
}

impl PhotoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Headstone => "headstone",
            Self::Panoramic => "panoramic",
            Self::Blueprint => "blueprint",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "headstone" => Some(Self::Headstone),
            "panoramic" => Some(Self::Panoramic),
            "blueprint" => Some(Self::Blueprint),
            _ => None,
        }
    }
}

/// Text extracted from a photo by the external recognition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrText {
    pub text: String,
    /// Recognition confidence in [0.0, 1.0].
    pub confidence: f64,
}

/// Metadata for one photograph attached to a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: RecordId,
    pub plot_id: RecordId,
    pub filename: String,
    /// Where the image file lives on local disk or backend storage.
    pub storage_path: String,
    pub kind: PhotoKind,
    pub ocr: Option<OcrText>,
}

impl Photo {
    /// Creates a photo record with a generated stable ID and no OCR text.
    pub fn new(plot_id: RecordId, filename: impl Into<String>, kind: PhotoKind) -> Self {
        Self::with_id(Uuid::new_v4(), plot_id, filename, kind)
    }

    /// Creates a photo record with a caller-provided stable ID.
    pub fn with_id(
        id: RecordId,
        plot_id: RecordId,
        filename: impl Into<String>,
        kind: PhotoKind,
    ) -> Self {
        Self {
            id,
            plot_id,
            filename: filename.into(),
            storage_path: String::new(),
            kind,
            ocr: None,
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.filename.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                entity: "photo",
                field: "filename",
            });
        }
        if let Some(ocr) = &self.ocr {
            if !(0.0..=1.0).contains(&ocr.confidence) {
                return Err(ValidationError::ConfidenceOutOfRange(ocr.confidence));
            }
        }
        Ok(())
    }
}
