//! End-to-end filling tests on generated form images

use formfill_core::{
    CoordinateMap, Field, FormFillError, FormSchema, JsonLayoutFile, LayoutAnalysis,
    LayoutAnalyzer, NormalizedPoint, OverrideStore, PixelPoint,
};
use formfill_overlay::{
    CoordinateSource, CoordinateSources, FormCanvas, FormFiller, OverlayConfig, OverlayError,
    OverlayFont, OverlayRenderer, PlacementOrigin, RenderOptions,
};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn filler() -> FormFiller {
    FormFiller::new(&OverlayConfig::default()).with_renderer(OverlayRenderer::new(
        OverlayFont::Blocks,
        RenderOptions::default(),
    ))
}

fn blank_form(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(width, height, WHITE)
        .save(&path)
        .unwrap();
    path
}

fn schema(fields: &[(&str, &str)]) -> FormSchema {
    FormSchema::from_fields(
        fields
            .iter()
            .map(|(label, value)| Field::with_value(*label, *value))
            .collect(),
    )
}

struct FailingAnalyzer;

impl LayoutAnalyzer for FailingAnalyzer {
    fn analyze(&self, _image_path: &Path) -> formfill_core::Result<LayoutAnalysis> {
        Err(FormFillError::AnalysisError("service unavailable".to_string()))
    }
}

const LAYOUT_JSON: &str = r#"{
    "pages": [{
        "width": 8.5,
        "height": 11.0,
        "lines": [
            {"content": "City", "polygon": [1.0, 2.2, 2.4, 2.2, 2.4, 2.4, 1.0, 2.4]},
            {"content": "ZIP Code", "polygon": [4.25, 5.5, 5.25, 5.5]}
        ]
    }]
}"#;

#[test]
fn test_empty_map_renders_fallback_in_red() {
    let canvas = FormCanvas::from_image(RgbaImage::from_pixel(400, 400, WHITE));
    let out = filler().render(
        canvas,
        &schema(&[("Favorite Color", "blue")]),
        &CoordinateMap::new(),
    );

    assert_eq!(out.placed().len(), 1);
    let placed = &out.placed()[0];
    assert_eq!(placed.origin, PlacementOrigin::Fallback);
    assert_eq!(placed.position, PixelPoint::new(120.0, 340.0));
    assert!(out.image().pixels().any(|p| *p == RED));
    assert!(!out.image().pixels().any(|p| *p == BLACK));
}

#[test]
fn test_blank_values_leave_image_untouched() {
    let canvas = FormCanvas::from_image(RgbaImage::from_pixel(100, 100, WHITE));
    let mut coords = CoordinateMap::new();
    coords.insert("email", NormalizedPoint::new(0.5, 0.5));
    let out = filler().render(canvas, &schema(&[("Email", ""), ("Phone", "  ")]), &coords);
    assert!(out.placed().is_empty());
    assert!(out.image().pixels().all(|p| *p == WHITE));
}

#[test]
fn test_fill_with_coordinate_file() {
    let dir = tempfile::tempdir().unwrap();
    let image = blank_form(dir.path(), "application.png", 1000, 2000);
    let coords_path = dir.path().join("coords.json");
    std::fs::write(&coords_path, r#"{"city": [0.25, 0.5]}"#).unwrap();

    let sources = CoordinateSources {
        coordinate_file: Some(&coords_path),
        ..CoordinateSources::default()
    };
    let report = filler()
        .fill(&image, &schema(&[("City", "Anytown"), ("Email", "")]), &sources, None)
        .unwrap();

    assert_eq!(report.source, CoordinateSource::File(coords_path.clone()));
    assert_eq!(report.output, dir.path().join("filled_application.jpg"));
    assert_eq!(report.placed[0].position, PixelPoint::new(250.0, 1000.0));
    assert_eq!(report.matched_count(), 1);
    assert_eq!(report.fallback_count(), 0);
    assert_eq!(report.skipped, 1);

    let written = image::open(&report.output).unwrap();
    assert_eq!((written.width(), written.height()), (1000, 2000));
}

#[test]
fn test_invalid_coordinate_file_falls_through_to_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let image = blank_form(dir.path(), "form.png", 850, 1100);
    let coords_path = dir.path().join("coords.json");
    std::fs::write(&coords_path, "{ broken").unwrap();
    let layout_path = dir.path().join("layout.json");
    std::fs::write(&layout_path, LAYOUT_JSON).unwrap();
    let analyzer = JsonLayoutFile::new(&layout_path);

    let sources = CoordinateSources {
        coordinate_file: Some(&coords_path),
        analyzer: Some(&analyzer),
        persist_fresh: true,
        ..CoordinateSources::default()
    };
    let f = filler();
    let resolved = f.resolve_coordinates(&image, &sources).unwrap();
    assert_eq!(resolved.source, CoordinateSource::Fresh);
    let zip = resolved.coordinates.get("zip").unwrap();
    assert!((zip.x - 4.75 / 8.5).abs() < 1e-12);
    assert!((zip.y - 0.5).abs() < 1e-12);

    // Persisted map is picked up by the next run
    let again = f.resolve_coordinates(&image, &sources).unwrap();
    assert_eq!(again.source, CoordinateSource::File(coords_path.clone()));
    assert_eq!(again.coordinates, resolved.coordinates);
}

#[test]
fn test_empty_analysis_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let image = blank_form(dir.path(), "form.png", 850, 1100);
    let coords_path = dir.path().join("coords.json");
    let layout_path = dir.path().join("layout.json");
    std::fs::write(
        &layout_path,
        r#"{"pages": [{"lines": [{"content": "Favorite color", "polygon": [0.1, 0.1, 0.2, 0.1]}]}]}"#,
    )
    .unwrap();
    let analyzer = JsonLayoutFile::new(&layout_path);

    let sources = CoordinateSources {
        coordinate_file: Some(&coords_path),
        analyzer: Some(&analyzer),
        persist_fresh: true,
        ..CoordinateSources::default()
    };
    let f = filler();
    let first = f.resolve_coordinates(&image, &sources).unwrap();
    assert_eq!(first.source, CoordinateSource::Fresh);
    assert!(first.coordinates.is_empty());
    assert!(!coords_path.exists());

    // Analysis is retried once the layout has labels
    std::fs::write(&layout_path, LAYOUT_JSON).unwrap();
    let second = f.resolve_coordinates(&image, &sources).unwrap();
    assert_eq!(second.source, CoordinateSource::Fresh);
    assert!(second.coordinates.get("city").is_some());
}

#[test]
fn test_empty_coordinate_file_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let image = blank_form(dir.path(), "form.png", 850, 1100);
    let coords_path = dir.path().join("coords.json");
    std::fs::write(&coords_path, "{}").unwrap();
    let layout_path = dir.path().join("layout.json");
    std::fs::write(&layout_path, LAYOUT_JSON).unwrap();
    let analyzer = JsonLayoutFile::new(&layout_path);

    let sources = CoordinateSources {
        coordinate_file: Some(&coords_path),
        analyzer: Some(&analyzer),
        ..CoordinateSources::default()
    };
    let resolved = filler().resolve_coordinates(&image, &sources).unwrap();
    assert_eq!(resolved.source, CoordinateSource::Fresh);
    assert_eq!(resolved.coordinates.len(), 2);
}

#[test]
fn test_override_coordinates_win() {
    let dir = tempfile::tempdir().unwrap();
    let image = blank_form(dir.path(), "w9.png", 200, 200);
    let mut map = CoordinateMap::new();
    map.insert("ssn", NormalizedPoint::new(0.5, 0.25));

    let mut store = OverrideStore::empty(dir.path().join("hardcoded_data"));
    store.create_entry(&image, map, Some("W-9")).unwrap();

    let coords_path = dir.path().join("coords.json");
    std::fs::write(&coords_path, r#"{"ssn": [0.1, 0.1]}"#).unwrap();

    let sources = CoordinateSources {
        overrides: Some(&store),
        coordinate_file: Some(&coords_path),
        ..CoordinateSources::default()
    };
    let output = dir.path().join("out.jpg");
    let report = filler()
        .fill(
            &image,
            &schema(&[("Social Security Number", "123-45-6789")]),
            &sources,
            Some(&output),
        )
        .unwrap();

    assert!(matches!(report.source, CoordinateSource::Override(_)));
    assert_eq!(report.output, output);
    assert_eq!(report.placed[0].position, PixelPoint::new(100.0, 50.0));
    assert!(output.is_file());
}

#[test]
fn test_override_presets_fill_missing_answers() {
    let dir = tempfile::tempdir().unwrap();
    let image = blank_form(dir.path(), "invoice.png", 100, 100);
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("invoice.json"),
        r#"{"metadata": {"filename": "invoice.png"}, "hardcoded_values": {"Tax Year": "2024"}}"#,
    )
    .unwrap();
    let store = OverrideStore::load_dir(&data).unwrap();

    let sources = CoordinateSources {
        overrides: Some(&store),
        ..CoordinateSources::default()
    };
    let report = filler()
        .fill(&image, &schema(&[("Tax Year", "")]), &sources, None)
        .unwrap();

    assert_eq!(report.source, CoordinateSource::Empty);
    assert_eq!(report.placed.len(), 1);
    assert_eq!(report.placed[0].value, "2024");
    assert_eq!(report.fallback_count(), 1);
}

#[test]
fn test_analysis_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let image = blank_form(dir.path(), "form.png", 10, 10);
    let sources = CoordinateSources {
        analyzer: Some(&FailingAnalyzer),
        ..CoordinateSources::default()
    };
    let err = filler()
        .fill(&image, &schema(&[("City", "Anytown")]), &sources, None)
        .unwrap_err();
    assert!(matches!(
        err,
        OverlayError::Core(FormFillError::AnalysisError(_))
    ));
}

#[test]
fn test_unreadable_image_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = filler()
        .fill(
            &dir.path().join("missing.png"),
            &schema(&[("City", "Anytown")]),
            &CoordinateSources::default(),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, OverlayError::ImageOpen { .. }));
}
