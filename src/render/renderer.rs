use super::canvas::{self, LabelStyle};
use super::style::{AnnotationLevel, DrawSettings, LevelStyle};
use crate::detect::InputFormat;
use crate::error::{Error, Result};
use crate::mapper::LabelFile;
use crate::model::{AnnotationRecord, BoundingPoly, Page, Vertex};
use ab_glyph::FontVec;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of rendering a folder.
#[derive(Debug, Clone, Default)]
pub struct RenderSummary {
    /// Written visualizations
    pub rendered: Vec<PathBuf>,
    /// Images without a `<stem>.json` label
    pub missing_labels: Vec<PathBuf>,
    /// Images that could not be rendered, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Paints annotation records onto their source images.
pub struct Renderer {
    settings: DrawSettings,
    font: Option<FontVec>,
}

impl Renderer {
    pub fn new(settings: DrawSettings) -> Self {
        let font = if settings.any_labels() {
            let font = canvas::load_font(settings.global.font_path.as_deref());
            if font.is_none() {
                log::warn!("No usable font found; labels will not be drawn");
            }
            font
        } else {
            None
        };

        Self { settings, font }
    }

    pub fn settings(&self) -> &DrawSettings {
        &self.settings
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw every page of `record` onto `canvas`. Returns the number of
    /// outlines drawn.
    pub fn draw(&self, canvas: &mut RgbaImage, record: &AnnotationRecord) -> usize {
        record.pages.iter().map(|page| self.draw_page(canvas, page)).sum()
    }

    fn draw_page(&self, canvas: &mut RgbaImage, page: &Page) -> usize {
        let mut drawn = 0;
        let conf = |c: f32| self.confidence_suffix(c);

        let style = &self.settings.page;
        if style.draw {
            let (w, h) = (canvas.width() as i32, canvas.height() as i32);
            let frame = BoundingPoly::rect(0, 0, (w - 1).max(0), (h - 1).max(0));
            drawn += self.outline(canvas, style, &frame);
            self.label(canvas, style, &format!("Page{}", conf(page.confidence)), (10, 30));
        }

        for block in &page.blocks {
            let text = format!("{}{}", block.block_type, conf(block.confidence));
            drawn += self.item(canvas, AnnotationLevel::Block, block.confidence, &block.bounding_box, &text);
        }

        for paragraph in page.paragraphs() {
            let text = format!("Para{}", conf(paragraph.confidence));
            drawn += self.item(
                canvas,
                AnnotationLevel::Paragraph,
                paragraph.confidence,
                &paragraph.bounding_box,
                &text,
            );
        }

        for word in page.words() {
            drawn += self.item(canvas, AnnotationLevel::Word, word.confidence, &word.bounding_box, &word.text);
        }

        for symbol in page.symbols() {
            drawn += self.item(
                canvas,
                AnnotationLevel::Character,
                symbol.confidence,
                &symbol.bounding_box,
                &symbol.text,
            );
        }

        drawn
    }

    fn confidence_suffix(&self, confidence: f32) -> String {
        if self.settings.global.show_confidence {
            format!(" (conf: {:.2})", confidence)
        } else {
            String::new()
        }
    }

    fn item(
        &self,
        canvas: &mut RgbaImage,
        level: AnnotationLevel,
        confidence: f32,
        poly: &BoundingPoly,
        text: &str,
    ) -> usize {
        let style = self.settings.level(level);
        if !style.draw || !poly.is_drawable() {
            return 0;
        }
        if let Some(threshold) = self.settings.threshold(level) {
            if confidence < threshold {
                return 0;
            }
        }

        let drawn = self.outline(canvas, style, poly);
        if let Some(Vertex { x, y }) = poly.anchor() {
            self.label(canvas, style, text, (x, y));
        }
        drawn
    }

    fn outline(&self, canvas: &mut RgbaImage, style: &LevelStyle, poly: &BoundingPoly) -> usize {
        canvas::draw_polygon(canvas, poly.vertices(), canvas::rgba(style.color), style.thickness);
        1
    }

    fn label(&self, canvas: &mut RgbaImage, style: &LevelStyle, text: &str, anchor: (i32, i32)) {
        let Some(font) = &self.font else {
            return;
        };
        if !style.draw_text || text.is_empty() {
            return;
        }

        let global = &self.settings.global;
        let label_style = LabelStyle {
            color: canvas::rgba(style.label_color()),
            size: style.text_px(),
            thickness: style.text_thickness,
            background: global
                .text_background
                .then(|| canvas::rgba(global.text_background_color)),
        };
        canvas::draw_label(canvas, font, text, anchor, &label_style);
    }

    /// Where the visualization of `image_path` goes inside `output_dir`.
    pub fn output_path_for(&self, image_path: &Path, output_dir: &Path) -> PathBuf {
        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        output_dir.join(format!("{}_visualized.{}", stem, self.settings.global.output_format))
    }

    /// Render one image with its label.
    ///
    /// `output_path` defaults to `<output_dir>/<stem>_visualized.<format>`
    /// from the global settings.
    pub fn visualize(
        &self,
        image_path: &Path,
        label_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<PathBuf> {
        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => self.output_path_for(image_path, &self.settings.global.output_dir),
        };
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let record = LabelFile::from_path(label_path)?.into_record()?;
        if record.pages.is_empty() {
            log::warn!("No pages in {}", label_path.display());
        }

        let mut canvas = image::open(image_path)?.to_rgba8();
        let drawn = self.draw(&mut canvas, &record);

        if drawn == 0 && same_format(image_path, &output_path) {
            fs::copy(image_path, &output_path)?;
        } else {
            save(canvas, &output_path)?;
        }

        log::info!("Saved visualization to {}", output_path.display());
        Ok(output_path)
    }

    /// Render every raster image in `images_dir` that has a matching
    /// `<stem>.json` in `labels_dir`.
    pub fn visualize_folder(
        &self,
        images_dir: &Path,
        labels_dir: &Path,
        output_dir: Option<&Path>,
    ) -> Result<RenderSummary> {
        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.global.output_dir.clone());
        fs::create_dir_all(&output_dir)?;

        let mut images = Vec::new();
        for entry in fs::read_dir(images_dir)? {
            let path = entry?.path();
            if path.is_file() && InputFormat::from_path(&path).is_some_and(|f| f.is_raster()) {
                images.push(path);
            }
        }
        images.sort();

        if images.is_empty() {
            log::warn!("No images found in {}", images_dir.display());
        } else {
            log::info!("Found {} image(s) to visualize", images.len());
        }

        let mut summary = RenderSummary::default();
        for image_path in images {
            let stem = image_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let label_path = labels_dir.join(format!("{}.json", stem));

            if !label_path.is_file() {
                log::warn!("No label file for {}", image_path.display());
                summary.missing_labels.push(image_path);
                continue;
            }

            let output_path = self.output_path_for(&image_path, &output_dir);
            match self.visualize(&image_path, &label_path, Some(&output_path)) {
                Ok(path) => summary.rendered.push(path),
                Err(e) => {
                    log::error!("Could not visualize {}: {}", image_path.display(), e);
                    summary.failed.push((image_path, e.to_string()));
                }
            }
        }

        log::info!("Visualized {} image(s)", summary.rendered.len());
        Ok(summary)
    }
}

fn output_format(path: &Path) -> Result<ImageFormat> {
    ImageFormat::from_path(path)
        .map_err(|_| Error::Render(format!("unknown output format: {}", path.display())))
}

fn same_format(source: &Path, output: &Path) -> bool {
    match (ImageFormat::from_path(source), ImageFormat::from_path(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn save(canvas: RgbaImage, path: &Path) -> Result<()> {
    match output_format(path)? {
        ImageFormat::Jpeg | ImageFormat::Bmp => {
            DynamicImage::ImageRgba8(canvas).to_rgb8().save(path)?;
        }
        _ => canvas.save(path)?,
    }
    Ok(())
}
