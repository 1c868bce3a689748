//! Drawing primitives on RGBA canvases.

use crate::model::Vertex;
use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

/// Labels longer than this are shortened.
pub const MAX_LABEL_CHARS: usize = 20;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn rgba([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// Load a TrueType font from `path`, or from the first common system font
/// that exists.
pub fn load_font(path: Option<&Path>) -> Option<FontVec> {
    let candidates: Vec<PathBuf> = match path {
        Some(path) => vec![path.to_path_buf()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };

    for candidate in candidates {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                log::debug!("Using font {}", candidate.display());
                return Some(font);
            }
            Err(e) => log::warn!("Invalid font {}: {}", candidate.display(), e),
        }
    }
    None
}

/// Shorten a label to at most [`MAX_LABEL_CHARS`] characters.
pub fn truncate_label(text: &str) -> String {
    if text.chars().count() > MAX_LABEL_CHARS {
        let head: String = text.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Draw a closed polygon outline `thickness` pixels wide.
pub fn draw_polygon(canvas: &mut RgbaImage, vertices: &[Vertex], color: Rgba<u8>, thickness: u32) {
    if vertices.len() < 2 {
        return;
    }

    let thickness = thickness.max(1) as i32;
    let offsets = -(thickness - 1) / 2..=thickness / 2;

    for (i, start) in vertices.iter().enumerate() {
        let end = &vertices[(i + 1) % vertices.len()];
        for d in offsets.clone() {
            let d = d as f32;
            let (x0, y0, x1, y1) = (start.x as f32, start.y as f32, end.x as f32, end.y as f32);
            draw_line_segment_mut(canvas, (x0 + d, y0), (x1 + d, y1), color);
            draw_line_segment_mut(canvas, (x0, y0 + d), (x1, y1 + d), color);
        }
    }
}

/// How a label is painted.
#[derive(Debug, Clone, Copy)]
pub struct LabelStyle {
    pub color: Rgba<u8>,
    /// Glyph height in pixels
    pub size: f32,
    /// Repeats of the glyphs, one pixel apart
    pub thickness: u32,
    pub background: Option<Rgba<u8>>,
}

/// Draw `text` with its baseline-left corner near `anchor`, kept inside the
/// canvas.
pub fn draw_label(
    canvas: &mut RgbaImage,
    font: &FontVec,
    text: &str,
    anchor: (i32, i32),
    style: &LabelStyle,
) {
    let text = truncate_label(text);
    if text.is_empty() {
        return;
    }

    let scale = PxScale::from(style.size.max(1.0));
    let (w, h) = text_size(scale, font, &text);
    let (w, h) = (w as i32, h as i32);
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);

    let x = anchor.0.min(cw - w).max(0);
    let top = (anchor.1 - h).min(ch - h).max(0);

    if let Some(background) = style.background {
        let rect = Rect::at(x - 2, top - 2).of_size(w as u32 + 4, h as u32 + 4);
        draw_filled_rect_mut(canvas, rect, background);
    }

    for dx in 0..style.thickness.max(1) as i32 {
        draw_text_mut(canvas, style.color, x + dx, top, scale, font, &text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short"), "short");
        assert_eq!(truncate_label("exactly twenty chars"), "exactly twenty chars");
        assert_eq!(
            truncate_label("this label is far too long"),
            "this label is far..."
        );
        assert_eq!(truncate_label("ééééééééééééééééééééé").chars().count(), 20);
    }

    #[test]
    fn test_draw_polygon_outline() {
        let mut canvas = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let square = [
            Vertex::new(5, 5),
            Vertex::new(15, 5),
            Vertex::new(15, 15),
            Vertex::new(5, 15),
        ];
        draw_polygon(&mut canvas, &square, Rgba([255, 0, 0, 255]), 1);

        assert_eq!(canvas.get_pixel(10, 5), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(5, 10), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_thick_outline() {
        let mut canvas = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let square = [
            Vertex::new(5, 5),
            Vertex::new(15, 5),
            Vertex::new(15, 15),
            Vertex::new(5, 15),
        ];
        draw_polygon(&mut canvas, &square, Rgba([0, 255, 0, 255]), 3);

        assert_eq!(canvas.get_pixel(10, 4), &Rgba([0, 255, 0, 255]));
        assert_eq!(canvas.get_pixel(10, 6), &Rgba([0, 255, 0, 255]));
        assert_eq!(canvas.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_missing_font_path() {
        assert!(load_font(Some(Path::new("/nonexistent/font.ttf"))).is_none());
    }
}
