//! Drawing annotation records back onto their images.
//!
//! Enabled by the `render` feature.

mod canvas;
mod renderer;
mod style;

pub use canvas::{truncate_label, MAX_LABEL_CHARS};
pub use renderer::{RenderSummary, Renderer};
pub use style::{AnnotationLevel, DrawSettings, GlobalStyle, LevelStyle};
