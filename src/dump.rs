//! Batch dumper: annotate files and write `images/` + `labels/`.
//!
//! Each processed input yields a copy of the source under `images/` and a
//! `<stem>.json` label under `labels/`. Failures are recorded per item and
//! never stop the batch.

use crate::client::{ImageSource, OcrClient};
use crate::config::{DEFAULT_OUTPUT_DIR, MAX_BATCH_SIZE};
use crate::error::{Error, Result};
use crate::mapper::{self, JsonFormat, LabelFile, MappingMode};
use crate::model::AnnotationRecord;
use crate::report::ReadingStatistics;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const IMAGES_DIR: &str = "images";
pub const LABELS_DIR: &str = "labels";

/// Options for a dump run.
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Root of the `images/` and `labels/` folders
    pub output_dir: PathBuf,

    /// Label layout
    pub mode: MappingMode,

    /// Pretty or compact label JSON
    pub json_format: JsonFormat,

    /// Files per client call, 1 to 16
    pub batch_size: usize,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            mode: MappingMode::default(),
            json_format: JsonFormat::default(),
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl DumpOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_mode(mut self, mode: MappingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set the batch size, clamped into 1..=16.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join(IMAGES_DIR)
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.output_dir.join(LABELS_DIR)
    }
}

/// Outcome of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Annotated without error
    Success,
    /// The service reported an error for this image
    ApiError,
    /// The request or writing the outputs failed
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Success => "success",
            ItemStatus::ApiError => "api error",
            ItemStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub source: PathBuf,
    pub file_name: String,
    pub status: ItemStatus,
    /// Copy under `images/`, if written
    pub image_path: Option<PathBuf>,
    /// Label under `labels/`, if written
    pub label_path: Option<PathBuf>,
    /// Characters of recognised text
    pub text_length: usize,
    pub page_count: usize,
    pub average_confidence: f32,
    pub error: Option<String>,
    pub statistics: ReadingStatistics,
}

impl ItemReport {
    fn new(source: &Path, file_name: &str) -> Self {
        Self {
            source: source.to_path_buf(),
            file_name: file_name.to_string(),
            status: ItemStatus::Success,
            image_path: None,
            label_path: None,
            text_length: 0,
            page_count: 0,
            average_confidence: 0.0,
            error: None,
            statistics: ReadingStatistics::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ItemStatus::Success
    }

    fn fail(&mut self, error: &Error) {
        self.status = ItemStatus::Failed;
        self.error = Some(error.to_string());
    }

    fn absorb(&mut self, record: &AnnotationRecord) {
        self.text_length = record.text.chars().count();
        self.page_count = record.page_count();
        self.average_confidence = record.average_confidence();
        self.statistics = ReadingStatistics::from_record(record);

        if let Some(api_error) = &record.error {
            if self.status == ItemStatus::Success {
                self.status = ItemStatus::ApiError;
            }
            self.error.get_or_insert_with(|| api_error.to_string());
        }
    }
}

/// Result of a dump run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// One report per processed file, in input order
    pub items: Vec<ItemReport>,
    /// Inputs that were never sent (unsupported or oversized)
    pub skipped: Vec<PathBuf>,
}

impl BatchSummary {
    /// Number of files that were processed.
    pub fn processed(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    /// Items with an API error or a failure.
    pub fn failed(&self) -> usize {
        self.processed() - self.succeeded()
    }
}

/// Runs a batch of files through an [`OcrClient`].
pub struct Dumper<C> {
    client: C,
    options: DumpOptions,
}

impl<C: OcrClient> Dumper<C> {
    pub fn new(client: C, options: DumpOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &DumpOptions {
        &self.options
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Process `files` in order.
    pub fn dump(&self, files: &[PathBuf]) -> Result<BatchSummary> {
        self.dump_with_progress(files, |_| {})
    }

    /// Process `files` in order, calling `progress` after each item.
    ///
    /// Only failing to create the output folders is an error; everything
    /// per item is recorded in the summary.
    pub fn dump_with_progress<F>(&self, files: &[PathBuf], mut progress: F) -> Result<BatchSummary>
    where
        F: FnMut(&ItemReport),
    {
        fs::create_dir_all(self.options.images_dir())?;
        fs::create_dir_all(self.options.labels_dir())?;
        warn_on_stem_collisions(files);

        log::info!(
            "Processing {} file(s) into {} (batch size {})",
            files.len(),
            self.options.output_dir.display(),
            self.options.batch_size
        );

        let mut summary = BatchSummary::default();

        for chunk in files.chunks(self.options.batch_size.max(1)) {
            let mut sources = Vec::with_capacity(chunk.len());
            let mut outcomes: Vec<Option<Result<Value>>> = Vec::with_capacity(chunk.len());

            for path in chunk {
                match ImageSource::from_path(path) {
                    Ok(source) => {
                        sources.push(source);
                        outcomes.push(None);
                    }
                    Err(e) => outcomes.push(Some(Err(e))),
                }
            }

            let mut responses = if sources.is_empty() {
                Vec::new().into_iter()
            } else {
                self.client.annotate_batch(&sources).into_iter()
            };

            for (path, outcome) in chunk.iter().zip(outcomes) {
                let outcome = outcome.unwrap_or_else(|| {
                    responses.next().unwrap_or_else(|| {
                        Err(Error::UnexpectedResponse(
                            "client returned fewer results than requested".to_string(),
                        ))
                    })
                });

                let report = self.process_item(path, outcome);
                progress(&report);
                summary.items.push(report);
            }
        }

        log::info!(
            "Processed {} file(s): {} succeeded, {} failed",
            summary.processed(),
            summary.succeeded(),
            summary.failed()
        );

        Ok(summary)
    }

    fn process_item(&self, path: &Path, outcome: Result<Value>) -> ItemReport {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut report = ItemReport::new(path, &file_name);
        let mode = self.options.mode;

        let label = match outcome.and_then(|v| mapper::to_label(&file_name, v, mode)) {
            Ok(label) => label,
            Err(e) => {
                log::error!("{}: {}", file_name, e);
                report.fail(&e);
                mapper::failure_label(&file_name, &e, mode)
            }
        };

        if let Err(e) = self.write_outputs(path, &file_name, &label, &mut report) {
            log::error!("{}: could not write outputs: {}", file_name, e);
            report.fail(&e);
            return report;
        }

        match label.into_record() {
            Ok(record) => report.absorb(&record),
            Err(e) => report.fail(&e),
        }

        log::debug!("{}: {}", file_name, report.status);
        report
    }

    /// Label first, so a label exists even when the copy fails.
    fn write_outputs(
        &self,
        source: &Path,
        file_name: &str,
        label: &LabelFile,
        report: &mut ItemReport,
    ) -> Result<()> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());

        let label_path = self.options.labels_dir().join(format!("{}.json", stem));
        fs::write(&label_path, mapper::to_json(label, self.options.json_format)?)?;
        report.label_path = Some(label_path);

        let image_path = self.options.images_dir().join(file_name);
        fs::copy(source, &image_path)?;
        report.image_path = Some(image_path);

        Ok(())
    }
}

/// Files from different folders may share a stem; the later one wins.
fn warn_on_stem_collisions(files: &[PathBuf]) {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for path in files {
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let stem = stem.to_string_lossy().into_owned();
        if let Some(previous) = seen.insert(stem.clone(), path) {
            log::warn!(
                "{} and {} share the name '{}'; the later output overwrites the earlier",
                previous.display(),
                path.display(),
                stem
            );
        }
    }
}
