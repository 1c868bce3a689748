//! # ocrdump
//!
//! Batch OCR annotation dumper for Google Cloud Vision.
//!
//! Feeds images and one-page PDFs through `DOCUMENT_TEXT_DETECTION`, writes a
//! copy of every input under `images/` and its annotation as JSON under
//! `labels/`, and can draw the detected regions back onto the images.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ocrdump::{OcrDump, VisionClient, VisionConfig};
//!
//! fn main() -> ocrdump::Result<()> {
//!     let client = VisionClient::from_credentials_file("key.json", VisionConfig::default())?;
//!
//!     let summary = OcrDump::new()
//!         .with_output_dir("./ocr_output")
//!         .recursive(true)
//!         .run(&client, "./scans")?;
//!
//!     println!("{} processed, {} failed", summary.processed(), summary.failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two label layouts**: the verbatim service response, or a normalized
//!   page/block/paragraph/word/symbol record
//! - **Batched requests**: up to 16 images per call
//! - **Per-item failures**: recorded in the label and the summary, never fatal
//! - **Rendering** (`render` feature): YAML-styled bounding boxes and labels

pub mod client;
pub mod config;
pub mod detect;
pub mod dump;
pub mod error;
pub mod input;
pub mod mapper;
pub mod model;
pub mod report;
pub mod vision;

#[cfg(feature = "render")]
pub mod render;

// Re-export commonly used types
pub use client::{ImageSource, OcrClient, ServiceAccountKey, TokenProvider, VisionClient, VisionConfig};
pub use config::Settings;
pub use detect::{detect_format_from_bytes, detect_format_from_path, InputFormat};
pub use dump::{BatchSummary, DumpOptions, Dumper, ItemReport, ItemStatus};
pub use error::{Error, Result};
pub use input::{resolve, validate_file, FileValidation, ResolveOptions, ResolvedInputs};
pub use mapper::{JsonFormat, LabelFile, MappingMode};
pub use model::{AnnotationRecord, ApiError, Block, BlockType, BoundingPoly, Page, Paragraph, Symbol, Vertex, Word};
pub use report::{write_summary_report, ReadingStatistics};

#[cfg(feature = "render")]
pub use render::{DrawSettings, RenderSummary, Renderer};

use std::path::Path;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Read a label file in either layout into an annotation record.
///
/// # Example
///
/// ```no_run
/// let record = ocrdump::load_label("ocr_output/labels/receipt.json").unwrap();
/// println!("{} words", record.word_count());
/// ```
pub fn load_label<P: AsRef<Path>>(path: P) -> Result<AnnotationRecord> {
    LabelFile::from_path(path)?.into_record()
}

/// Builder for resolving an input path and dumping it.
///
/// # Example
///
/// ```no_run
/// use ocrdump::{MappingMode, OcrDump};
/// # fn client() -> ocrdump::VisionClient { unimplemented!() }
///
/// let summary = OcrDump::new()
///     .with_mode(MappingMode::Simplified)
///     .with_batch_size(8)
///     .compact()
///     .run(client(), "receipt.jpg")?;
/// # Ok::<(), ocrdump::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OcrDump {
    dump_options: DumpOptions,
    resolve_options: ResolveOptions,
}

impl OcrDump {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.dump_options = self.dump_options.with_output_dir(dir);
        self
    }

    /// Set the label layout.
    pub fn with_mode(mut self, mode: MappingMode) -> Self {
        self.dump_options = self.dump_options.with_mode(mode);
        self
    }

    /// Descend into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.resolve_options = self.resolve_options.with_recursive(recursive);
        self
    }

    /// Set the number of images per request.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.dump_options = self.dump_options.with_batch_size(size);
        self
    }

    /// Write compact JSON labels.
    pub fn compact(mut self) -> Self {
        self.dump_options = self.dump_options.with_json_format(JsonFormat::Compact);
        self
    }

    pub fn dump_options(&self) -> &DumpOptions {
        &self.dump_options
    }

    /// Resolve `input` and dump every supported file.
    pub fn run<C: OcrClient, P: AsRef<Path>>(&self, client: C, input: P) -> Result<BatchSummary> {
        self.run_with_progress(client, input, |_| {})
    }

    /// Like [`OcrDump::run`], calling `progress` after each item.
    pub fn run_with_progress<C, P, F>(&self, client: C, input: P, progress: F) -> Result<BatchSummary>
    where
        C: OcrClient,
        P: AsRef<Path>,
        F: FnMut(&ItemReport),
    {
        let resolved = resolve(input, self.resolve_options)?;
        let dumper = Dumper::new(client, self.dump_options.clone());
        let mut summary = dumper.dump_with_progress(&resolved.files, progress)?;

        summary.skipped = resolved.unsupported;
        summary.skipped.extend(resolved.oversized);
        Ok(summary)
    }
}
