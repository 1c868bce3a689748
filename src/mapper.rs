//! Mapping from service responses to label files.
//!
//! A label is written either as a verbatim passthrough of the service
//! response (`Raw`) or as the normalized [`AnnotationRecord`]
//! (`Simplified`). Both layouts read back into the same record.

use crate::error::{Error, Result};
use crate::model::{
    AnnotationRecord, ApiError, Block, BlockType, BoundingPoly, Page, Paragraph, Symbol, Vertex,
    Word,
};
use crate::vision;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

/// gRPC `UNKNOWN`, used for failures that never reached the service.
const CODE_UNKNOWN: i32 = 2;

/// Layout of the label files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingMode {
    /// `{"file_name", "response"}` with the verbatim response
    #[default]
    Raw,
    /// The normalized annotation record
    Simplified,
}

impl FromStr for MappingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(MappingMode::Raw),
            "simplified" | "simple" => Ok(MappingMode::Simplified),
            other => Err(Error::Config(format!("unknown mapping mode: {}", other))),
        }
    }
}

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// A raw label: file name plus the service response as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLabel {
    pub file_name: String,
    pub response: Value,
}

/// The contents of one label file, in either layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelFile {
    Raw(RawLabel),
    Simplified(AnnotationRecord),
}

impl LabelFile {
    /// Name of the source file this label describes.
    pub fn file_name(&self) -> &str {
        match self {
            LabelFile::Raw(raw) => &raw.file_name,
            LabelFile::Simplified(record) => &record.file_name,
        }
    }

    /// Parse a label from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a label file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Normalize into an annotation record.
    pub fn into_record(self) -> Result<AnnotationRecord> {
        match self {
            LabelFile::Raw(raw) => to_record(&raw.file_name, &raw.response),
            LabelFile::Simplified(record) => Ok(record),
        }
    }
}

/// Normalize a service response into an annotation record.
///
/// A response without `fullTextAnnotation` (blank image, or an error)
/// yields a record without pages.
pub fn to_record(file_name: &str, response: &Value) -> Result<AnnotationRecord> {
    let parsed = vision::AnnotateImageResponse::deserialize(response).map_err(|e| {
        Error::UnexpectedResponse(format!("{}: {}", file_name, e))
    })?;

    let mut record = AnnotationRecord::new(file_name);
    record.error = parsed
        .error
        .filter(|status| status.code != 0 || !status.message.is_empty())
        .map(|status| ApiError::new(status.code, status.message));

    if let Some(annotation) = parsed.full_text_annotation {
        record.text = annotation.text;
        record.pages = annotation.pages.iter().map(map_page).collect();
    }

    Ok(record)
}

/// Build the label to write for a response.
pub fn to_label(file_name: &str, response: Value, mode: MappingMode) -> Result<LabelFile> {
    match mode {
        MappingMode::Raw => Ok(LabelFile::Raw(RawLabel {
            file_name: file_name.to_string(),
            response,
        })),
        MappingMode::Simplified => Ok(LabelFile::Simplified(to_record(file_name, &response)?)),
    }
}

/// Build the label recorded for an item whose request failed.
pub fn failure_label(file_name: &str, error: &Error, mode: MappingMode) -> LabelFile {
    let api_error = match error {
        Error::Api { status, message } => ApiError::new(i32::from(*status), message.clone()),
        other => ApiError::new(CODE_UNKNOWN, other.to_string()),
    };

    match mode {
        MappingMode::Raw => LabelFile::Raw(RawLabel {
            file_name: file_name.to_string(),
            response: serde_json::json!({
                "error": {"code": api_error.code, "message": api_error.message}
            }),
        }),
        MappingMode::Simplified => {
            LabelFile::Simplified(AnnotationRecord::failed(file_name, api_error))
        }
    }
}

/// Serialize a label.
pub fn to_json(label: &LabelFile, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(label)?,
        JsonFormat::Compact => serde_json::to_string(label)?,
    };
    Ok(json)
}

fn map_page(page: &vision::Page) -> Page {
    let scale = (page.width, page.height);
    Page {
        width: page.width,
        height: page.height,
        confidence: page.confidence,
        blocks: page.blocks.iter().map(|b| map_block(b, scale)).collect(),
    }
}

fn map_block(block: &vision::Block, scale: (u32, u32)) -> Block {
    Block {
        block_type: BlockType::from_tag(&block.block_type),
        confidence: block.confidence,
        bounding_box: map_poly(block.bounding_box.as_ref(), scale),
        paragraphs: block
            .paragraphs
            .iter()
            .map(|p| map_paragraph(p, scale))
            .collect(),
    }
}

fn map_paragraph(paragraph: &vision::Paragraph, scale: (u32, u32)) -> Paragraph {
    Paragraph {
        confidence: paragraph.confidence,
        bounding_box: map_poly(paragraph.bounding_box.as_ref(), scale),
        words: paragraph.words.iter().map(|w| map_word(w, scale)).collect(),
    }
}

fn map_word(word: &vision::Word, scale: (u32, u32)) -> Word {
    let symbols = word
        .symbols
        .iter()
        .map(|s| Symbol {
            text: s.text.clone(),
            confidence: s.confidence,
            bounding_box: map_poly(s.bounding_box.as_ref(), scale),
        })
        .collect();

    Word::from_symbols(
        word.confidence,
        map_poly(word.bounding_box.as_ref(), scale),
        symbols,
    )
}

/// Pixel vertices win; normalized vertices are scaled by the page size.
fn map_poly(poly: Option<&vision::BoundingPoly>, (width, height): (u32, u32)) -> BoundingPoly {
    let Some(poly) = poly else {
        return BoundingPoly::default();
    };

    if !poly.vertices.is_empty() {
        return BoundingPoly::new(
            poly.vertices
                .iter()
                .map(|v| Vertex::new(v.x, v.y))
                .collect(),
        );
    }

    BoundingPoly::new(
        poly.normalized_vertices
            .iter()
            .map(|v| {
                Vertex::new(
                    (v.x * width as f32).round() as i32,
                    (v.y * height as f32).round() as i32,
                )
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> Value {
        json!({
            "fullTextAnnotation": {
                "text": "Hi\n",
                "pages": [{
                    "width": 200,
                    "height": 100,
                    "confidence": 0.97,
                    "property": {"detectedLanguages": [{"languageCode": "en"}]},
                    "blocks": [{
                        "blockType": "TEXT",
                        "confidence": 0.96,
                        "boundingBox": {"vertices": [{"x": 10, "y": 10}, {"x": 50, "y": 10}, {"x": 50, "y": 30}, {"x": 10, "y": 30}]},
                        "paragraphs": [{
                            "confidence": 0.95,
                            "boundingBox": {"vertices": [{"x": 10, "y": 10}, {"x": 50, "y": 10}, {"x": 50, "y": 30}, {"x": 10, "y": 30}]},
                            "words": [{
                                "confidence": 0.94,
                                "boundingBox": {"vertices": [{"x": 10, "y": 10}, {"x": 50, "y": 10}, {"x": 50, "y": 30}, {"x": 10, "y": 30}]},
                                "symbols": [
                                    {"text": "H", "confidence": 0.93, "boundingBox": {"vertices": [{"x": 10, "y": 10}, {"x": 30, "y": 10}, {"x": 30, "y": 30}, {"x": 10, "y": 30}]}},
                                    {"text": "i", "confidence": 0.92, "boundingBox": {"vertices": [{"x": 30, "y": 10}, {"x": 50, "y": 10}, {"x": 50, "y": 30}, {"x": 30, "y": 30}]}}
                                ]
                            }]
                        }]
                    }]
                }]
            }
        })
    }

    #[test]
    fn test_to_record_maps_hierarchy() {
        let record = to_record("hi.png", &sample_response()).unwrap();

        assert_eq!(record.file_name, "hi.png");
        assert_eq!(record.text, "Hi\n");
        assert_eq!(record.pages.len(), 1);

        let page = &record.pages[0];
        assert_eq!((page.width, page.height), (200, 100));
        let block = &page.blocks[0];
        assert_eq!(block.block_type, BlockType::Text);
        assert_eq!(block.bounding_box, BoundingPoly::rect(10, 10, 50, 30));

        let word = &block.paragraphs[0].words[0];
        assert_eq!(word.text, "Hi");
        assert_eq!(word.symbols.len(), 2);
        assert!((word.symbols[1].confidence - 0.92).abs() < 1e-6);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_to_record_empty_response() {
        let record = to_record("blank.png", &json!({})).unwrap();
        assert!(record.is_empty());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_to_record_carries_api_error() {
        let record = to_record(
            "bad.png",
            &json!({"error": {"code": 3, "message": "Bad image data."}}),
        )
        .unwrap();
        assert_eq!(record.error, Some(ApiError::new(3, "Bad image data.")));
    }

    #[test]
    fn test_normalized_vertices_are_scaled() {
        let response = json!({
            "fullTextAnnotation": {
                "text": "",
                "pages": [{
                    "width": 612,
                    "height": 792,
                    "blocks": [{
                        "boundingBox": {"normalizedVertices": [{"x": 0.5, "y": 0.25}, {"x": 1.0}, {"x": 1.0, "y": 1.0}, {"y": 1.0}]}
                    }]
                }]
            }
        });
        let record = to_record("doc.pdf", &response).unwrap();
        let poly = &record.pages[0].blocks[0].bounding_box;
        assert_eq!(poly.vertices()[0], Vertex::new(306, 198));
        assert_eq!(poly.vertices()[1], Vertex::new(612, 0));
        assert_eq!(poly.vertices()[3], Vertex::new(0, 792));
    }

    #[test]
    fn test_raw_label_keeps_response_verbatim() {
        let label = to_label("hi.png", sample_response(), MappingMode::Raw).unwrap();
        let json = to_json(&label, JsonFormat::Pretty).unwrap();
        let reread = LabelFile::from_json(&json).unwrap();

        match &reread {
            LabelFile::Raw(raw) => assert_eq!(raw.response, sample_response()),
            LabelFile::Simplified(_) => panic!("expected raw layout"),
        }
        assert_eq!(reread.file_name(), "hi.png");
    }

    #[test]
    fn test_simplified_label_reads_back_equal() {
        let label = to_label("hi.png", sample_response(), MappingMode::Simplified).unwrap();
        let json = to_json(&label, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));

        let reread = LabelFile::from_json(&json).unwrap();
        assert!(matches!(reread, LabelFile::Simplified(_)));
        assert_eq!(reread, label);
    }

    #[test]
    fn test_label_without_response_is_rejected() {
        for json in [
            r#"{"file_name": "hi.png"}"#,
            r#"{"file_name": "hi.png", "respons": {"fullTextAnnotation": {}}}"#,
        ] {
            assert!(
                matches!(LabelFile::from_json(json), Err(Error::Json(_))),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn test_failure_label_layouts() {
        let err = Error::Api {
            status: 429,
            message: "Quota exceeded".to_string(),
        };

        let raw = failure_label("a.png", &err, MappingMode::Raw)
            .into_record()
            .unwrap();
        assert_eq!(raw.error, Some(ApiError::new(429, "Quota exceeded")));

        let simplified = failure_label("a.png", &err, MappingMode::Simplified)
            .into_record()
            .unwrap();
        assert_eq!(simplified, raw);
    }

    #[test]
    fn test_mapping_mode_from_str() {
        assert_eq!("raw".parse::<MappingMode>().unwrap(), MappingMode::Raw);
        assert_eq!(
            "Simplified".parse::<MappingMode>().unwrap(),
            MappingMode::Simplified
        );
        assert!("yaml".parse::<MappingMode>().is_err());
    }
}
