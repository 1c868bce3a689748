//! Input format detection.
//!
//! Formats are recognised by file extension first, which is what decides
//! whether a file enters the batch. Magic-byte sniffing is available for
//! callers that only have bytes.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A file format accepted by the OCR service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
    Raw,
    Ico,
    Pdf,
    Tiff,
}

/// Every extension (lowercase, without dot) that enters the batch.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "raw", "ico", "pdf", "tiff", "tif",
];

impl InputFormat {
    /// Look up a format from a file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let format = match ext.to_ascii_lowercase().as_str() {
            "png" => InputFormat::Png,
            "jpg" | "jpeg" => InputFormat::Jpeg,
            "gif" => InputFormat::Gif,
            "bmp" => InputFormat::Bmp,
            "webp" => InputFormat::WebP,
            "raw" => InputFormat::Raw,
            "ico" => InputFormat::Ico,
            "pdf" => InputFormat::Pdf,
            "tiff" | "tif" => InputFormat::Tiff,
            _ => return None,
        };
        Some(format)
    }

    /// Look up a format from a path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// MIME type sent to the service.
    pub fn mime_type(&self) -> &'static str {
        match self {
            InputFormat::Png => "image/png",
            InputFormat::Jpeg => "image/jpeg",
            InputFormat::Gif => "image/gif",
            InputFormat::Bmp => "image/bmp",
            InputFormat::WebP => "image/webp",
            InputFormat::Raw => "image/x-raw",
            InputFormat::Ico => "image/x-icon",
            InputFormat::Pdf => "application/pdf",
            InputFormat::Tiff => "image/tiff",
        }
    }

    /// Whether the service must be called through its file endpoint.
    pub fn is_document(&self) -> bool {
        matches!(self, InputFormat::Pdf)
    }

    /// Whether the renderer can decode and draw on this format.
    pub fn is_raster(&self) -> bool {
        !matches!(self, InputFormat::Pdf | InputFormat::Raw)
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InputFormat::Png => "PNG",
            InputFormat::Jpeg => "JPEG",
            InputFormat::Gif => "GIF",
            InputFormat::Bmp => "BMP",
            InputFormat::WebP => "WebP",
            InputFormat::Raw => "RAW",
            InputFormat::Ico => "ICO",
            InputFormat::Pdf => "PDF",
            InputFormat::Tiff => "TIFF",
        };
        f.write_str(name)
    }
}

/// Check whether a path has a supported extension.
pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
    InputFormat::from_path(path).is_some()
}

/// Detect the format of a file from its leading bytes.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<InputFormat> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut header = Vec::with_capacity(16);
    reader.take(16).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the format from magic bytes.
///
/// RAW has no common signature and is never returned here.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<InputFormat> {
    let format = if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        InputFormat::Png
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        InputFormat::Jpeg
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        InputFormat::Gif
    } else if data.starts_with(b"BM") {
        InputFormat::Bmp
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        InputFormat::WebP
    } else if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        InputFormat::Ico
    } else if data.starts_with(b"%PDF-") {
        InputFormat::Pdf
    } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        InputFormat::Tiff
    } else {
        return Err(Error::UnsupportedFormat("unrecognised file signature".to_string()));
    };
    Ok(format)
}
