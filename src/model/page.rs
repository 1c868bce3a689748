//! Page-level types: page, block, paragraph, word, symbol.

use super::BoundingPoly;
use serde::{Deserialize, Serialize};

/// A single page of OCR output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Width in pixels (points for PDF input)
    pub width: u32,

    /// Height in pixels (points for PDF input)
    pub height: u32,

    /// Recognition confidence, 0.0 to 1.0
    #[serde(default)]
    pub confidence: f32,

    /// Blocks in reading order
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Page {
    /// Create an empty page with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Iterate over every paragraph on the page.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().flat_map(|b| b.paragraphs.iter())
    }

    /// Iterate over every word on the page.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.paragraphs().flat_map(|p| p.words.iter())
    }

    /// Iterate over every symbol on the page.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.words().flat_map(|w| w.symbols.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Kind of content a block holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Text,
    Table,
    Picture,
    Ruler,
    Barcode,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BlockType {
    /// Parse the service's tag; anything unrecognised is `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "TEXT" => BlockType::Text,
            "TABLE" => BlockType::Table,
            "PICTURE" => BlockType::Picture,
            "RULER" => BlockType::Ruler,
            "BARCODE" => BlockType::Barcode,
            _ => BlockType::Unknown,
        }
    }

    /// The service's tag for this block type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Unknown => "UNKNOWN",
            BlockType::Text => "TEXT",
            BlockType::Table => "TABLE",
            BlockType::Picture => "PICTURE",
            BlockType::Ruler => "RULER",
            BlockType::Barcode => "BARCODE",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A block of text, table, picture, etc.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub block_type: BlockType,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub bounding_box: BoundingPoly,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

/// A run of words.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub bounding_box: BoundingPoly,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Paragraph {
    /// Word texts joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A single word; `text` is the concatenation of its symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub bounding_box: BoundingPoly,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
}

impl Word {
    /// Build a word from its symbols.
    pub fn from_symbols(confidence: f32, bounding_box: BoundingPoly, symbols: Vec<Symbol>) -> Self {
        let text = symbols.iter().map(|s| s.text.as_str()).collect();
        Self {
            text,
            confidence,
            bounding_box,
            symbols,
        }
    }
}

/// A single character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub bounding_box: BoundingPoly,
}
