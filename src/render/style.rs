//! Drawing style loaded from YAML.
//!
//! ```yaml
//! page:
//!   draw: true
//!   color: [0, 0, 255]
//!   thickness: 3
//!   draw_text: true
//! word:
//!   min_confidence: 0.8
//! global:
//!   output_format: jpg
//!   confidence_threshold: 0.5
//! ```
//!
//! Keys left out of a level keep that level's defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One level of the annotation hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationLevel {
    Page,
    Block,
    Paragraph,
    Word,
    Character,
}

impl AnnotationLevel {
    /// Levels in drawing order.
    pub const ALL: [AnnotationLevel; 5] = [
        AnnotationLevel::Page,
        AnnotationLevel::Block,
        AnnotationLevel::Paragraph,
        AnnotationLevel::Word,
        AnnotationLevel::Character,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationLevel::Page => "page",
            AnnotationLevel::Block => "block",
            AnnotationLevel::Paragraph => "paragraph",
            AnnotationLevel::Word => "word",
            AnnotationLevel::Character => "character",
        }
    }

    /// Whether the global confidence threshold applies to this level.
    pub fn uses_global_threshold(&self) -> bool {
        matches!(self, AnnotationLevel::Word | AnnotationLevel::Character)
    }
}

/// Style of one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStyle {
    pub draw: bool,
    /// Outline color, RGB
    pub color: [u8; 3],
    /// Outline width in pixels
    pub thickness: u32,
    pub draw_text: bool,
    /// Label color, RGB; the outline color when unset
    pub text_color: Option<[u8; 3]>,
    /// Label height in pixels. Values up to 4 are read as a scale factor
    /// of a 24 px base.
    pub text_size: f32,
    pub text_thickness: u32,
    /// Skip items below this confidence
    pub min_confidence: Option<f32>,
}

impl LevelStyle {
    fn new(draw: bool, color: [u8; 3], thickness: u32, draw_text: bool) -> Self {
        Self {
            draw,
            color,
            thickness,
            draw_text,
            text_color: None,
            text_size: 0.5,
            text_thickness: 1,
            min_confidence: None,
        }
    }

    pub fn label_color(&self) -> [u8; 3] {
        self.text_color.unwrap_or(self.color)
    }

    /// Label height in pixels.
    pub fn text_px(&self) -> f32 {
        if self.text_size <= 4.0 {
            self.text_size * 24.0
        } else {
            self.text_size
        }
    }

    /// Default style of a level.
    pub fn default_for(level: AnnotationLevel) -> Self {
        match level {
            AnnotationLevel::Page => Self::new(true, [0, 0, 255], 3, true),
            AnnotationLevel::Block => Self::new(true, [0, 255, 0], 2, true),
            AnnotationLevel::Paragraph => Self::new(true, [255, 0, 0], 2, false),
            AnnotationLevel::Word => Self::new(true, [0, 255, 255], 1, true),
            AnnotationLevel::Character => Self::new(false, [255, 0, 255], 1, false),
        }
    }
}

/// Settings that are not tied to a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStyle {
    pub output_dir: PathBuf,
    /// Output file extension (`png`, `jpg`, ...)
    pub output_format: String,
    /// Append `(conf: x.xx)` to page, block and paragraph labels
    pub show_confidence: bool,
    /// Minimum confidence for words and characters
    pub confidence_threshold: f32,
    pub text_background: bool,
    pub text_background_color: [u8; 3],
    /// TrueType font for labels; common system fonts are tried otherwise
    pub font_path: Option<PathBuf>,
}

impl Default for GlobalStyle {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./visualizations"),
            output_format: "png".to_string(),
            show_confidence: true,
            confidence_threshold: 0.5,
            text_background: true,
            text_background_color: [255, 255, 255],
            font_path: None,
        }
    }
}

/// The full drawing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SettingsFile")]
pub struct DrawSettings {
    pub page: LevelStyle,
    pub block: LevelStyle,
    pub paragraph: LevelStyle,
    pub word: LevelStyle,
    pub character: LevelStyle,
    pub global: GlobalStyle,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            page: LevelStyle::default_for(AnnotationLevel::Page),
            block: LevelStyle::default_for(AnnotationLevel::Block),
            paragraph: LevelStyle::default_for(AnnotationLevel::Paragraph),
            word: LevelStyle::default_for(AnnotationLevel::Word),
            character: LevelStyle::default_for(AnnotationLevel::Character),
            global: GlobalStyle::default(),
        }
    }
}

impl DrawSettings {
    /// Parse settings from YAML text. An empty document gives the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load settings, falling back to the defaults with a warning.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded drawing settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!(
                    "Could not load drawing settings from {}: {}; using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn level(&self, level: AnnotationLevel) -> &LevelStyle {
        match level {
            AnnotationLevel::Page => &self.page,
            AnnotationLevel::Block => &self.block,
            AnnotationLevel::Paragraph => &self.paragraph,
            AnnotationLevel::Word => &self.word,
            AnnotationLevel::Character => &self.character,
        }
    }

    pub fn level_mut(&mut self, level: AnnotationLevel) -> &mut LevelStyle {
        match level {
            AnnotationLevel::Page => &mut self.page,
            AnnotationLevel::Block => &mut self.block,
            AnnotationLevel::Paragraph => &mut self.paragraph,
            AnnotationLevel::Word => &mut self.word,
            AnnotationLevel::Character => &mut self.character,
        }
    }

    /// Confidence below which items of `level` are skipped.
    pub fn threshold(&self, level: AnnotationLevel) -> Option<f32> {
        self.level(level).min_confidence.or_else(|| {
            level
                .uses_global_threshold()
                .then_some(self.global.confidence_threshold)
        })
    }

    /// Whether any level draws anything.
    pub fn any_enabled(&self) -> bool {
        AnnotationLevel::ALL.iter().any(|l| self.level(*l).draw)
    }

    /// Whether any enabled level draws labels.
    pub fn any_labels(&self) -> bool {
        AnnotationLevel::ALL.iter().any(|l| {
            let style = self.level(*l);
            style.draw && style.draw_text
        })
    }

    /// Turn every level off.
    pub fn disable_all(&mut self) {
        for level in AnnotationLevel::ALL {
            self.level_mut(level).draw = false;
        }
    }

    /// Check values the renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if image::ImageFormat::from_extension(&self.global.output_format).is_none() {
            return Err(Error::Config(format!(
                "unknown output format: {}",
                self.global.output_format
            )));
        }
        Ok(())
    }
}

/// Per-level overrides as written in the YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LevelOverrides {
    draw: Option<bool>,
    color: Option<[u8; 3]>,
    thickness: Option<u32>,
    draw_text: Option<bool>,
    text_color: Option<[u8; 3]>,
    text_size: Option<f32>,
    text_thickness: Option<u32>,
    min_confidence: Option<f32>,
}

impl LevelOverrides {
    fn apply(self, level: AnnotationLevel) -> LevelStyle {
        let base = LevelStyle::default_for(level);
        LevelStyle {
            draw: self.draw.unwrap_or(base.draw),
            color: self.color.unwrap_or(base.color),
            thickness: self.thickness.unwrap_or(base.thickness).max(1),
            draw_text: self.draw_text.unwrap_or(base.draw_text),
            text_color: self.text_color.or(base.text_color),
            text_size: self.text_size.unwrap_or(base.text_size),
            text_thickness: self.text_thickness.unwrap_or(base.text_thickness).max(1),
            min_confidence: self.min_confidence.or(base.min_confidence),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    page: LevelOverrides,
    block: LevelOverrides,
    paragraph: LevelOverrides,
    word: LevelOverrides,
    character: LevelOverrides,
    global: GlobalStyle,
}

impl From<SettingsFile> for DrawSettings {
    fn from(file: SettingsFile) -> Self {
        Self {
            page: file.page.apply(AnnotationLevel::Page),
            block: file.block.apply(AnnotationLevel::Block),
            paragraph: file.paragraph.apply(AnnotationLevel::Paragraph),
            word: file.word.apply(AnnotationLevel::Word),
            character: file.character.apply(AnnotationLevel::Character),
            global: file.global,
        }
    }
}
