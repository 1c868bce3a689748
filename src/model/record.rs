//! The per-image annotation record.

use super::Page;
use serde::{Deserialize, Serialize};

/// Everything recognised in one input file.
///
/// `pages` is required and unknown keys are rejected when reading, so a raw
/// label is never mistaken for a simplified one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotationRecord {
    /// Source file name (without directory)
    pub file_name: String,

    /// Full document text as returned by the service
    #[serde(default)]
    pub text: String,

    /// Pages in order
    pub pages: Vec<Page>,

    /// Error reported for this image, if any
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl AnnotationRecord {
    /// Create an empty record for a file.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    /// Create a record that only carries an error.
    pub fn failed(file_name: impl Into<String>, error: ApiError) -> Self {
        Self {
            file_name: file_name.into(),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of words across all pages.
    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|p| p.words().count()).sum()
    }

    /// Mean of the page confidences, 0.0 without pages.
    pub fn average_confidence(&self) -> f32 {
        if self.pages.is_empty() {
            return 0.0;
        }
        self.pages.iter().map(|p| p.confidence).sum::<f32>() / self.pages.len() as f32
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether nothing was recognised.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.pages.iter().all(Page::is_empty)
    }
}

/// An error reported by the OCR service for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Status code (gRPC code for in-body errors, HTTP status for rejected requests)
    pub code: i32,
    pub message: String,
}

impl ApiError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
