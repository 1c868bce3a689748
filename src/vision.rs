//! Wire types for the Cloud Vision REST API.
//!
//! Only what this crate reads or sends is modelled. Responses are kept as
//! raw JSON elsewhere, so fields missing here are never lost from a dump.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// The only feature ever requested.
pub const DOCUMENT_TEXT_DETECTION: &str = "DOCUMENT_TEXT_DETECTION";

/// Body of `POST /v1/images:annotate`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchAnnotateImagesRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

/// One image in an images request.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotateImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
}

impl AnnotateImageRequest {
    /// Build a document-text-detection request for raw image bytes.
    pub fn document_text(content: &[u8]) -> Self {
        Self {
            image: ImageContent {
                content: encode(content),
            },
            features: vec![Feature::document_text()],
        }
    }
}

/// Inline image payload (base64).
#[derive(Debug, Clone, Serialize)]
pub struct ImageContent {
    pub content: String,
}

/// A requested detection feature.
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Feature {
    pub fn document_text() -> Self {
        Self {
            kind: DOCUMENT_TEXT_DETECTION.to_string(),
        }
    }
}

/// Body of `POST /v1/files:annotate`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchAnnotateFilesRequest {
    pub requests: Vec<AnnotateFileRequest>,
}

/// One file in a files request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateFileRequest {
    pub input_config: InputConfig,
    pub features: Vec<Feature>,
    pub pages: Vec<u32>,
}

impl AnnotateFileRequest {
    /// Build a request for the first page of a document.
    pub fn first_page(content: &[u8], mime_type: &str) -> Self {
        Self {
            input_config: InputConfig {
                content: encode(content),
                mime_type: mime_type.to_string(),
            },
            features: vec![Feature::document_text()],
            pages: vec![1],
        }
    }
}

/// Inline document payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    pub content: String,
    pub mime_type: String,
}

fn encode(content: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(content)
}

/// Response for a single image.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotateImageResponse {
    pub full_text_annotation: Option<TextAnnotation>,
    pub error: Option<Status>,
}

/// An error reported inside a response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

/// Error envelope of a rejected HTTP request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorEnvelope {
    pub error: Status,
}

/// Full document text with its page hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextAnnotation {
    pub pages: Vec<Page>,
    pub text: String,
}

/// Page width and height are pixels for images and points for PDFs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Page {
    pub width: u32,
    pub height: u32,
    pub blocks: Vec<Block>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Block {
    pub bounding_box: Option<BoundingPoly>,
    pub paragraphs: Vec<Paragraph>,
    pub block_type: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paragraph {
    pub bounding_box: Option<BoundingPoly>,
    pub words: Vec<Word>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Word {
    pub bounding_box: Option<BoundingPoly>,
    pub symbols: Vec<Symbol>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Symbol {
    pub bounding_box: Option<BoundingPoly>,
    pub text: String,
    pub confidence: f32,
}

/// Image boxes carry pixel `vertices`; PDF boxes carry `normalizedVertices`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoundingPoly {
    pub vertices: Vec<Vertex>,
    pub normalized_vertices: Vec<NormalizedVertex>,
}

/// Zero coordinates are omitted on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizedVertex {
    pub x: f32,
    pub y: f32,
}
