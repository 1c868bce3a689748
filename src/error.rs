//! Error types for the ocrdump library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ocrdump operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while dumping or rendering annotations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The drawing settings file could not be parsed.
    #[cfg(feature = "render")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Image decoding or encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The OCR service answered with a non-success status.
    #[error("OCR service returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message reported by the service
        message: String,
    },

    /// A batched request failed for every item it carried.
    #[error("Request failed: {0}")]
    Request(String),

    /// Credentials are missing or unusable.
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    /// Exchanging the signed assertion for an access token failed.
    #[error("Token exchange failed: {0}")]
    Token(String),

    /// The file extension is not one the service accepts.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The requested input path does not exist.
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The service response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Error while drawing annotations.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Credentials(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Api {
            status: 403,
            message: "Cloud Vision API has not been used".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "OCR service returned 403: Cloud Vision API has not been used"
        );

        let err = Error::InputNotFound(PathBuf::from("scans/missing.png"));
        assert_eq!(err.to_string(), "Input not found: scans/missing.png");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
