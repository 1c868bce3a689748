//! Annotation model.
//!
//! The normalized, service-independent representation of one image's OCR
//! result. Produced once per image by the mapper and serialized verbatim in
//! the simplified label layout.

mod geometry;
mod page;
mod record;

pub use geometry::{BoundingPoly, Vertex};
pub use page::{Block, BlockType, Page, Paragraph, Symbol, Word};
pub use record::{AnnotationRecord, ApiError};
