//! Reading statistics and the batch summary report.

use crate::dump::{BatchSummary, ItemStatus};
use crate::error::Result;
use crate::model::AnnotationRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Text and confidence statistics for one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadingStatistics {
    pub characters: usize,
    pub words: usize,
    pub lines: usize,
    pub paragraphs: usize,
    /// Over page and block confidences
    pub confidence: ConfidenceStats,
}

impl ReadingStatistics {
    pub fn from_record(record: &AnnotationRecord) -> Self {
        let text = &record.text;
        let samples: Vec<f32> = record
            .pages
            .iter()
            .flat_map(|page| {
                std::iter::once(page.confidence).chain(page.blocks.iter().map(|b| b.confidence))
            })
            .collect();

        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: text.lines().count(),
            paragraphs: text.split("\n\n").filter(|p| !p.trim().is_empty()).count(),
            confidence: ConfidenceStats::from_samples(&samples),
        }
    }
}

/// Summary of a set of confidence values. All zero without samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConfidenceStats {
    pub samples: usize,
    pub mean: f32,
    pub min: f32,
    pub max: f32,
    /// Population standard deviation
    pub std_dev: f32,
}

impl ConfidenceStats {
    pub fn from_samples(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len() as f32;
        let mean = samples.iter().sum::<f32>() / n;
        let variance = samples.iter().map(|c| (c - mean).powi(2)).sum::<f32>() / n;

        Self {
            samples: samples.len(),
            mean,
            min: samples.iter().copied().fold(f32::INFINITY, f32::min),
            max: samples.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            std_dev: variance.sqrt(),
        }
    }
}

/// One file in the summary report.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub file_name: String,
    pub status: ItemStatus,
    pub page_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub statistics: ReadingStatistics,
}

/// Totals over every successfully read file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverallStatistics {
    pub total_characters: usize,
    pub total_words: usize,
    pub average_confidence: f32,
}

/// The contents of `reports/summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub generation_time: DateTime<Utc>,
    pub total_files: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub files: Vec<FileEntry>,
    pub overall_statistics: OverallStatistics,
}

impl SummaryReport {
    pub fn from_summary(summary: &BatchSummary) -> Self {
        let files: Vec<FileEntry> = summary
            .items
            .iter()
            .map(|item| FileEntry {
                file_name: item.file_name.clone(),
                status: item.status,
                page_count: item.page_count,
                error: item.error.clone(),
                statistics: item.statistics.clone(),
            })
            .collect();

        let read: Vec<&FileEntry> = files
            .iter()
            .filter(|f| f.status == ItemStatus::Success)
            .collect();
        let confidences: Vec<f32> = read
            .iter()
            .filter(|f| f.statistics.confidence.samples > 0)
            .map(|f| f.statistics.confidence.mean)
            .collect();

        let overall_statistics = OverallStatistics {
            total_characters: read.iter().map(|f| f.statistics.characters).sum(),
            total_words: read.iter().map(|f| f.statistics.words).sum(),
            average_confidence: ConfidenceStats::from_samples(&confidences).mean,
        };

        Self {
            generation_time: Utc::now(),
            total_files: summary.items.len() + summary.skipped.len(),
            processed: summary.processed(),
            failed: summary.failed(),
            skipped: summary.skipped.len(),
            files,
            overall_statistics,
        }
    }
}

/// Write `reports/summary.json` under `output_dir` and return its path.
pub fn write_summary_report<P: AsRef<Path>>(summary: &BatchSummary, output_dir: P) -> Result<PathBuf> {
    let dir = output_dir.as_ref().join("reports");
    fs::create_dir_all(&dir)?;

    let path = dir.join("summary.json");
    let report = SummaryReport::from_summary(summary);
    fs::write(&path, serde_json::to_string_pretty(&report)?)?;

    log::info!("Summary report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Page};

    #[test]
    fn test_text_statistics() {
        let mut record = AnnotationRecord::new("a.png");
        record.text = "Héllo world\nsecond line\n\nnew paragraph\n".to_string();

        let stats = ReadingStatistics::from_record(&record);
        assert_eq!(stats.characters, 39);
        assert_eq!(stats.words, 6);
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.confidence.samples, 0);
    }

    #[test]
    fn test_confidence_statistics() {
        let mut page = Page::new(10, 10);
        page.confidence = 0.9;
        page.blocks = vec![
            Block {
                confidence: 0.5,
                ..Default::default()
            },
            Block {
                confidence: 0.7,
                ..Default::default()
            },
        ];
        let mut record = AnnotationRecord::new("a.png");
        record.pages = vec![page];

        let conf = ReadingStatistics::from_record(&record).confidence;
        assert_eq!(conf.samples, 3);
        assert!((conf.mean - 0.7).abs() < 1e-6);
        assert_eq!(conf.min, 0.5);
        assert_eq!(conf.max, 0.9);
        assert!((conf.std_dev - 0.163_299_3).abs() < 1e-5);
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(ConfidenceStats::from_samples(&[]), ConfidenceStats::default());
    }
}
