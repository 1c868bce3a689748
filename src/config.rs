//! Environment-driven configuration.
//!
//! Defaults come from the process environment (optionally seeded from a
//! `.env` file). Command-line flags override them in the CLI.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Service-side size limit for a single input file, in MiB.
pub const MAX_FILE_SIZE_MB: f64 = 20.0;

/// Budget for the base64 image content of one `images:annotate` request.
/// The service rejects JSON bodies above 10 MB.
pub const MAX_REQUEST_BYTES: usize = 10_000_000;

/// Files above this size are accepted but flagged as slow, in MiB.
pub const LARGE_FILE_WARNING_MB: f64 = 10.0;

/// Maximum number of images the service accepts in one request.
pub const MAX_BATCH_SIZE: usize = 16;

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "./ocr_output";

/// Default API base URL.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

/// Environment variable names.
pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_OUTPUT_DIR: &str = "OCR_OUTPUT_DIR";
pub const ENV_BATCH_SIZE: &str = "OCR_BATCH_SIZE";
pub const ENV_LOG_LEVEL: &str = "OCR_LOG_LEVEL";
pub const ENV_RECURSIVE: &str = "OCR_RECURSIVE_DEFAULT";
pub const ENV_ENDPOINT: &str = "OCR_VISION_ENDPOINT";

/// Recognised environment variables and what they control.
pub const ENV_VARS: &[(&str, &str)] = &[
    (ENV_CREDENTIALS, "Path to Google Cloud credentials JSON file"),
    (ENV_OUTPUT_DIR, "Default output directory for OCR annotations"),
    (ENV_BATCH_SIZE, "Number of images sent per API request (1-16)"),
    (ENV_LOG_LEVEL, "Logging level (DEBUG, INFO, WARNING, ERROR)"),
    (ENV_RECURSIVE, "Search input directories recursively by default"),
    (ENV_ENDPOINT, "Base URL of the Vision API"),
];

/// Load a `.env` file from the working directory if one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Could not load .env file: {}", e),
    }
}

/// Settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Service-account key path
    pub credentials_path: Option<PathBuf>,
    /// Output directory for `images/` and `labels/`
    pub output_dir: PathBuf,
    /// Images per API request
    pub batch_size: usize,
    /// Log filter, lowercase
    pub log_level: String,
    /// Recurse into subdirectories by default
    pub recursive: bool,
    /// Vision API base URL
    pub endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials_path: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            batch_size: MAX_BATCH_SIZE,
            log_level: "info".to_string(),
            recursive: false,
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            credentials_path: lookup(ENV_CREDENTIALS)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            output_dir: lookup(ENV_OUTPUT_DIR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            batch_size: lookup(ENV_BATCH_SIZE)
                .map(|v| parse_batch_size(&v))
                .unwrap_or(defaults.batch_size),
            log_level: lookup(ENV_LOG_LEVEL)
                .map(|v| normalize_log_level(&v))
                .unwrap_or(defaults.log_level),
            recursive: lookup(ENV_RECURSIVE)
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.recursive),
            endpoint: lookup(ENV_ENDPOINT)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.endpoint),
        }
    }
}

/// Parse a batch size, falling back to the maximum on garbage and clamping
/// into the accepted range.
pub fn parse_batch_size(value: &str) -> usize {
    value
        .trim()
        .parse::<usize>()
        .unwrap_or(MAX_BATCH_SIZE)
        .clamp(1, MAX_BATCH_SIZE)
}

/// `true`, `1` and `yes` (any case) enable a flag.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Map level aliases such as `WARNING` or `CRITICAL` onto `log` filter names.
pub fn normalize_log_level(value: &str) -> String {
    match value.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "" => "info".to_string(),
        other => other.to_string(),
    }
}

/// Check that a credentials path was given and points at a regular file.
///
/// The file contents are validated later, when the client loads the key.
pub fn validate_credentials(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.ok_or_else(|| {
        Error::Credentials(format!(
            "no credentials file given; pass --credentials or set {}",
            ENV_CREDENTIALS
        ))
    })?;

    if !path.is_file() {
        return Err(Error::Credentials(format!(
            "credentials file not found: {}",
            path.display()
        )));
    }

    Ok(path.to_path_buf())
}

/// Size of a file in MiB.
pub fn file_size_mb<P: AsRef<Path>>(path: P) -> Result<f64> {
    let len = std::fs::metadata(path)?.len();
    Ok(len as f64 / (1024.0 * 1024.0))
}
