use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

use stitchgrid_lib::config::PatternSettings;
use stitchgrid_lib::pipeline::{self, PREVIEW_READY};
use stitchgrid_lib::thread_palette::ThreadPalette;

fn write_quadrants(dir: &Path, name: &str, size: u32) -> PathBuf {
    let raster = RgbImage::from_fn(size, size, |x, y| match (x < size / 2, y < size / 2) {
        (true, true) => Rgb([0, 0, 0]),
        (false, true) => Rgb([255, 255, 255]),
        (true, false) => Rgb([200, 20, 30]),
        (false, false) => Rgb([20, 60, 200]),
    });
    let path = dir.join(name);
    raster.save(&path).unwrap();
    path
}

fn is_empty_dir(dir: &Path) -> bool {
    !dir.exists() || fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
fn preview_succeeds_and_cleans_up_scratch() {
    let work = tempfile::tempdir().unwrap();
    let scratch = work.path().join("scratch");
    let source = write_quadrants(work.path(), "quadrants.png", 40);

    let settings = PatternSettings {
        width: 20,
        height: 20,
        colors: 4,
        ..PatternSettings::default()
    };
    let palette = ThreadPalette::dmc().unwrap();
    let response = pipeline::generate_preview(&source, &settings, palette, &scratch);

    assert!(response.success, "{}", response.message);
    assert_eq!(response.message, PREVIEW_READY);
    assert_eq!((response.width, response.height), (20, 20));
    assert!(response.thread_count >= 1 && response.thread_count <= 4);

    let preview = response.preview.unwrap();
    assert!(preview.starts_with("<table class=\"Preview\""));
    assert_eq!(preview.matches("<tr>").count(), 20);
    assert!(response.table.unwrap().contains("class=\"Code\""));

    assert!(is_empty_dir(&scratch));
}

#[test]
fn preview_rejects_unknown_extensions() {
    let work = tempfile::tempdir().unwrap();
    let scratch = work.path().join("scratch");
    let source = work.path().join("drawing.bmp");
    fs::write(&source, b"BM not really").unwrap();

    let palette = ThreadPalette::dmc().unwrap();
    let response =
        pipeline::generate_preview(&source, &PatternSettings::default(), palette, &scratch);

    assert!(!response.success);
    assert!(response.message.contains("Unrecognized file extension"));
    assert!(response.preview.is_none());
    assert!(is_empty_dir(&scratch));
}

#[test]
fn preview_reports_undecodable_images() {
    let work = tempfile::tempdir().unwrap();
    let scratch = work.path().join("scratch");
    let source = work.path().join("broken.png");
    fs::write(&source, b"definitely not a png").unwrap();

    let palette = ThreadPalette::dmc().unwrap();
    let response =
        pipeline::generate_preview(&source, &PatternSettings::default(), palette, &scratch);

    assert!(!response.success);
    assert!(response.message.contains("Unable to load image"));
    assert!(is_empty_dir(&scratch));
}

#[test]
fn pattern_writes_document_and_cover() {
    let work = tempfile::tempdir().unwrap();
    let scratch = work.path().join("scratch");
    let output = work.path().join("out");
    let source = write_quadrants(work.path(), "quadrants.png", 60);

    let settings = PatternSettings {
        width: 60,
        height: 60,
        colors: 4,
        ..PatternSettings::default()
    };
    let palette = ThreadPalette::dmc().unwrap();
    let artifacts =
        pipeline::generate_pattern(&source, &settings, palette, &scratch, &output).unwrap();

    assert_eq!(artifacts.document.extension().unwrap(), "html");
    assert_eq!(artifacts.cover.extension().unwrap(), "png");
    assert_eq!(
        artifacts.document.file_stem(),
        artifacts.cover.file_stem()
    );

    let document = fs::read_to_string(&artifacts.document).unwrap();
    assert!(document.contains("60 by 60 stitches"));
    assert!(document.contains("id=\"Thread\""));

    let cover = image::open(&artifacts.cover).unwrap();
    assert_eq!((cover.width(), cover.height()), (60, 60));

    assert!(is_empty_dir(&scratch));
}

#[test]
fn repeated_patterns_do_not_overwrite_each_other() {
    let work = tempfile::tempdir().unwrap();
    let scratch = work.path().join("scratch");
    let output = work.path().join("out");
    let source = write_quadrants(work.path(), "quadrants.png", 20);

    let settings = PatternSettings {
        width: 20,
        height: 20,
        colors: 4,
        ..PatternSettings::default()
    };
    let palette = ThreadPalette::dmc().unwrap();
    let first = pipeline::generate_pattern(&source, &settings, palette, &scratch, &output).unwrap();
    let second =
        pipeline::generate_pattern(&source, &settings, palette, &scratch, &output).unwrap();

    assert_ne!(first.document, second.document);
    assert!(first.document.exists() && second.document.exists());
}
