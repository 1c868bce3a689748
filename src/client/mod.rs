//! OCR client adapter.
//!
//! [`OcrClient`] is the seam between the batch dumper and the cloud
//! service. [`VisionClient`] talks to Google Cloud Vision; tests plug in a
//! mock that returns canned responses.

mod credentials;
mod vision_client;
mod vision_config;

pub use credentials::{AccessToken, AssertionClaims, ServiceAccountKey, TokenProvider, VISION_SCOPE};
pub use vision_client::VisionClient;
pub use vision_config::VisionConfig;

use crate::detect::InputFormat;
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// An input file loaded into memory.
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// File name without directory
    pub name: String,
    /// Format derived from the extension
    pub format: InputFormat,
    /// File contents
    pub content: Vec<u8>,
}

impl ImageSource {
    /// Create a source from bytes.
    pub fn new(name: impl Into<String>, format: InputFormat, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format,
            content,
        }
    }

    /// Read a source from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = InputFormat::from_path(path).ok_or_else(|| {
            Error::UnsupportedFormat(
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            )
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = std::fs::read(path)?;
        Ok(Self::new(name, format, content))
    }
}

/// A document-text-detection backend.
///
/// Implementations return the service's per-image response as raw JSON.
/// An error reported inside a response body is not an `Err`: it stays in
/// the returned value for the mapper to record.
pub trait OcrClient {
    /// Annotate a single image or document.
    fn annotate(&self, source: &ImageSource) -> Result<Value>;

    /// Annotate several sources; the result has one entry per source, in
    /// order.
    fn annotate_batch(&self, sources: &[ImageSource]) -> Vec<Result<Value>> {
        sources.iter().map(|s| self.annotate(s)).collect()
    }
}

impl<C: OcrClient + ?Sized> OcrClient for &C {
    fn annotate(&self, source: &ImageSource) -> Result<Value> {
        (**self).annotate(source)
    }

    fn annotate_batch(&self, sources: &[ImageSource]) -> Vec<Result<Value>> {
        (**self).annotate_batch(sources)
    }
}

impl<C: OcrClient + ?Sized> OcrClient for Box<C> {
    fn annotate(&self, source: &ImageSource) -> Result<Value> {
        (**self).annotate(source)
    }

    fn annotate_batch(&self, sources: &[ImageSource]) -> Vec<Result<Value>> {
        (**self).annotate_batch(sources)
    }
}
