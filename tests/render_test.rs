//! Integration tests for the renderer.

#![cfg(feature = "render")]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use ocrdump::mapper::{self, JsonFormat, MappingMode};
use ocrdump::render::AnnotationLevel;
use ocrdump::{DrawSettings, Renderer};
use serde_json::{json, Value};
use tempfile::TempDir;

const BACKGROUND: Rgba<u8> = Rgba([250, 250, 250, 255]);

fn response() -> Value {
    json!({
        "fullTextAnnotation": {
            "text": "Hi",
            "pages": [{
                "width": 64,
                "height": 48,
                "confidence": 0.9,
                "blocks": [{
                    "blockType": "TEXT",
                    "confidence": 0.9,
                    "boundingBox": {"vertices": [{"x": 8, "y": 8}, {"x": 40, "y": 8}, {"x": 40, "y": 30}, {"x": 8, "y": 30}]},
                    "paragraphs": [{
                        "confidence": 0.9,
                        "boundingBox": {"vertices": [{"x": 10, "y": 10}, {"x": 38, "y": 10}, {"x": 38, "y": 28}, {"x": 10, "y": 28}]},
                        "words": [{
                            "confidence": 0.9,
                            "boundingBox": {"vertices": [{"x": 12, "y": 12}, {"x": 36, "y": 12}, {"x": 36, "y": 26}, {"x": 12, "y": 26}]},
                            "symbols": [{"text": "H", "confidence": 0.9}, {"text": "i", "confidence": 0.9}]
                        }]
                    }]
                }]
            }]
        }
    })
}

fn write_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(64, 48, BACKGROUND).save(&path).unwrap();
    path
}

fn write_label(dir: &Path, stem: &str, mode: MappingMode) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let label = mapper::to_label(&format!("{}.png", stem), response(), mode).unwrap();
    let path = dir.join(format!("{}.json", stem));
    fs::write(&path, mapper::to_json(&label, JsonFormat::Pretty).unwrap()).unwrap();
    path
}

fn outlines_only() -> DrawSettings {
    let mut settings = DrawSettings::default();
    for level in AnnotationLevel::ALL {
        settings.level_mut(level).draw_text = false;
    }
    settings
}

#[test]
fn test_all_levels_disabled_copies_source() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "scan.png");
    let label = write_label(&dir.path().join("labels"), "scan", MappingMode::Raw);

    let mut settings = DrawSettings::default();
    settings.disable_all();
    let renderer = Renderer::new(settings);

    let output = dir.path().join("out/scan_visualized.png");
    let written = renderer.visualize(&image, &label, Some(&output)).unwrap();

    assert_eq!(written, output);
    assert_eq!(fs::read(&image).unwrap(), fs::read(&output).unwrap());
}

#[test]
fn test_disabled_levels_keep_pixels_across_formats() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "scan.bmp");
    let label = write_label(dir.path(), "scan", MappingMode::Simplified);

    let mut settings = DrawSettings::default();
    settings.disable_all();
    let renderer = Renderer::new(settings);

    let output = dir.path().join("scan_visualized.png");
    renderer.visualize(&image, &label, Some(&output)).unwrap();

    let source = image::open(&image).unwrap().to_rgba8();
    let rendered = image::open(&output).unwrap().to_rgba8();
    assert_eq!(source, rendered);
}

#[test]
fn test_outlines_change_pixels() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "scan.png");
    let label = write_label(dir.path(), "scan", MappingMode::Raw);

    let renderer = Renderer::new(outlines_only());
    let output = dir.path().join("scan_visualized.png");
    renderer.visualize(&image, &label, Some(&output)).unwrap();

    let rendered = image::open(&output).unwrap().to_rgba8();
    // block outline, green
    assert_eq!(rendered.get_pixel(20, 8), &Rgba([0, 255, 0, 255]));
    // page frame, blue
    assert_eq!(rendered.get_pixel(30, 0), &Rgba([0, 0, 255, 255]));
    // inside the word, untouched
    assert_eq!(rendered.get_pixel(24, 19), &BACKGROUND);
}

#[test]
fn test_word_threshold_skips_low_confidence() {
    let dir = TempDir::new().unwrap();
    let image = write_image(dir.path(), "scan.png");
    let label = write_label(dir.path(), "scan", MappingMode::Raw);

    let mut settings = outlines_only();
    settings.page.draw = false;
    settings.block.draw = false;
    settings.paragraph.draw = false;
    settings.global.confidence_threshold = 0.95;
    let renderer = Renderer::new(settings);

    let output = dir.path().join("scan_visualized.png");
    renderer.visualize(&image, &label, Some(&output)).unwrap();

    assert_eq!(fs::read(&image).unwrap(), fs::read(&output).unwrap());
}

#[test]
fn test_visualize_folder_skips_missing_labels() {
    let dir = TempDir::new().unwrap();
    let images = dir.path().join("images");
    let labels = dir.path().join("labels");
    fs::create_dir_all(&images).unwrap();

    write_image(&images, "first.png");
    write_image(&images, "second.png");
    fs::write(images.join("notes.txt"), b"not an image").unwrap();
    write_label(&labels, "first", MappingMode::Raw);

    let mut settings = outlines_only();
    settings.global.output_format = "jpg".to_string();
    let renderer = Renderer::new(settings);

    let out = dir.path().join("visualizations");
    let summary = renderer.visualize_folder(&images, &labels, Some(&out)).unwrap();

    assert_eq!(summary.rendered, vec![out.join("first_visualized.jpg")]);
    assert_eq!(summary.missing_labels, vec![images.join("second.png")]);
    assert!(summary.failed.is_empty());
    assert!(out.join("first_visualized.jpg").is_file());
}

#[test]
fn test_settings_file_drives_rendering() {
    let dir = TempDir::new().unwrap();
    let settings_path = dir.path().join("draw_settings.yaml");
    fs::write(
        &settings_path,
        "page:\n  draw: false\nblock:\n  color: [255, 0, 0]\n  draw_text: false\nparagraph:\n  draw: false\nword:\n  draw: false\n",
    )
    .unwrap();

    let image = write_image(dir.path(), "scan.png");
    let label = write_label(dir.path(), "scan", MappingMode::Raw);

    let renderer = Renderer::new(DrawSettings::load_or_default(&settings_path));
    let output = dir.path().join("scan_visualized.png");
    renderer.visualize(&image, &label, Some(&output)).unwrap();

    let rendered = image::open(&output).unwrap().to_rgba8();
    assert_eq!(rendered.get_pixel(20, 8), &Rgba([255, 0, 0, 255]));
    assert_eq!(rendered.get_pixel(30, 0), &BACKGROUND);
}
