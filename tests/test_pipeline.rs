mod common;
use common::*;

use formscan::classify::{GlyphClassifier, NetworkClassifier};
use formscan::detection::preprocessing::rotate;
use formscan::{BatchExecutor, FormPipeline, ScanSource, segment_form};
use std::sync::Arc;
use tempfile::TempDir;

/// Reads every glyph as a `1`.
struct Ones;

impl GlyphClassifier for Ones {
    fn input_size(&self) -> usize {
        16 * 16
    }

    fn classify(&self, input: &[f64]) -> formscan::Result<char> {
        assert_eq!(input.len(), 256);
        Ok('1')
    }
}

fn pipeline() -> FormPipeline {
    FormPipeline::new(synthetic_template(), PipelineConfig::default())
}

#[test]
fn filled_form_yields_glyphs_in_first_field() -> anyhow::Result<()> {
    let result = pipeline().process(&to_scan(&filled_form()), "filled")?;

    assert_eq!(result.name, "filled");
    assert_eq!(result.segments.rotation, 0.0);
    assert_eq!(result.segments.fields.len(), 2);
    let field = &result.segments.fields[0];
    assert_eq!(field.window, Rectangle::new(106, 159, 109, 39));
    assert_eq!(field.glyphs().len(), 2);
    assert_eq!(field.glyphs()[0].bounds, Rectangle::new(24, 11, 5, 5));
    assert_eq!(field.glyphs()[1].bounds, Rectangle::new(44, 11, 5, 5));
    assert!(result.segments.fields[1].glyphs().is_empty());
    assert!(result.values.is_none());
    Ok(())
}

#[test]
fn segment_form_on_binary_scan() -> anyhow::Result<()> {
    let segments = segment_form(
        filled_form(),
        &synthetic_template(),
        &PipelineConfig::default(),
        &CancellationToken::new(),
    )?;
    assert_eq!(segments.glyph_count(), 2);
    assert_eq!(segments.skipped_count(), 0);
    assert_eq!(segments.coordinate_system.origin(), Point::new(39, 39));
    Ok(())
}

#[test]
fn classifier_fills_field_values() -> anyhow::Result<()> {
    let result = pipeline()
        .with_classifier(Arc::new(Ones))
        .process(&to_scan(&filled_form()), "filled")?;
    let values = result.values.expect("classifier attached");
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].text, "11");
    assert!(values[0].issue.is_none());
    assert_eq!(values[1].text, "");
    Ok(())
}

#[test]
fn network_output_is_decoded_to_labels() -> anyhow::Result<()> {
    let network = NetworkClassifier::new(8 * 8, |input| {
        assert_eq!(input.len(), 64);
        let mut activations = vec![0.0; 11];
        activations[7] = 0.9;
        Ok(activations)
    });
    let result = pipeline()
        .with_classifier(Arc::new(network))
        .process(&to_scan(&filled_form()), "filled")?;
    let values = result.values.expect("classifier attached");
    assert_eq!(values[0].text, "77");
    Ok(())
}

#[test]
fn network_without_output_fails_classification() {
    let network = NetworkClassifier::new(4, |_| Ok(Vec::new()));
    assert!(matches!(network.classify(&[0.0; 4]), Err(FormError::InvalidArgument(_))));
    assert!(matches!(network.classify(&[0.0; 3]), Err(FormError::InvalidArgument(_))));
}

#[test]
fn field_outside_scan_is_skipped() -> anyhow::Result<()> {
    let base = synthetic_template();
    let mut builder = FormTemplateBuilder::new(
        *base.coordinate_system(),
        *base.marker_positions(),
        MARKER_SIZE,
        FORM_WIDTH,
        FORM_HEIGHT,
        Polarity::DarkOnLight,
    );
    builder.add_field(base.fields()[0].clone());
    builder.add_field(RegionEdge::rectangle(Rectangle::new(380, 380, 40, 40)));
    let template = builder.build();

    let result = FormPipeline::new(template, PipelineConfig::default()).process(&to_scan(&filled_form()), "edge")?;
    assert_eq!(result.segments.skipped_count(), 1);
    assert!(matches!(
        &result.segments.fields[1].outcome,
        FieldOutcome::Skipped(FormError::Cropping { field: 1, .. })
    ));
    assert_eq!(result.segments.fields[0].glyphs().len(), 2);
    Ok(())
}

#[test]
fn scan_without_markers_fails() {
    let blank = PixelGrid::new(FORM_WIDTH, FORM_HEIGHT, PAPER);
    let err = pipeline().process(&to_scan(&blank), "blank").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FormError>(),
        Some(FormError::MarkerDetection(_))
    ));
}

#[test]
fn rotated_scan_is_registered() -> anyhow::Result<()> {
    let rotated = rotate(&filled_form(), 0.05, Polarity::DarkOnLight);
    let result = pipeline().process(&to_scan(&rotated), "rotated")?;

    assert!((result.segments.rotation + 0.05).abs() < 0.02, "rotation {}", result.segments.rotation);
    let origin = result.segments.coordinate_system.origin();
    assert!((origin.x - 39).abs() <= 3 && (origin.y - 39).abs() <= 3, "origin {origin}");
    assert!(!result.segments.fields[0].is_skipped());
    assert!(!result.segments.fields[0].glyphs().is_empty());
    Ok(())
}

#[test]
fn cancelled_pipeline_stops() {
    let pipeline = pipeline();
    pipeline.cancellation_token().cancel();
    let err = pipeline.process(&to_scan(&filled_form()), "filled").unwrap_err();
    assert!(matches!(err.downcast_ref::<FormError>(), Some(FormError::Cancelled)));
}

#[test]
fn debug_directory_must_be_empty() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;
    assert!(pipeline().with_debug(dir.path().to_path_buf()).is_err());
    Ok(())
}

#[test]
fn debug_images_are_written_per_form() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let out = dir.path().join("debug");
    let pipeline = pipeline().with_debug(out.clone())?;
    pipeline.process(&to_scan(&filled_form()), "scan01")?;

    let form_dir = out.join("scan01");
    for file in ["00_input.png", "01_binarized.png", "02_aligned.png", "field_000/crop.png", "field_000/01.png"] {
        assert!(form_dir.join(file).exists(), "missing {file}");
    }
    assert!(!form_dir.join("field_001/00.png").exists());
    Ok(())
}

#[test]
fn glyphs_are_written_by_field_then_form() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pipeline = pipeline().with_glyph_output(dir.path().to_path_buf());
    pipeline.process(&to_scan(&filled_form()), "scan01")?;

    let glyph = dir.path().join("field_000").join("scan01").join("00.png");
    assert!(glyph.exists());
    let img = image::open(&glyph)?;
    assert_eq!((img.width(), img.height()), (50, 50));
    assert!(dir.path().join("field_000/scan01/01.png").exists());
    assert!(!dir.path().join("field_001").exists());
    Ok(())
}

#[test]
fn batch_keeps_order_and_isolates_failures() -> anyhow::Result<()> {
    let inputs = vec![
        ScanSource::Image {
            name: "first".to_string(),
            image: to_scan(&filled_form()),
        },
        ScanSource::Image {
            name: "no-markers".to_string(),
            image: to_scan(&PixelGrid::new(FORM_WIDTH, FORM_HEIGHT, PAPER)),
        },
        ScanSource::Image {
            name: "third".to_string(),
            image: to_scan(&blank_form()),
        },
    ];
    let outcomes = BatchExecutor::new(pipeline()).with_workers(2).execute(inputs)?;

    let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["first", "no-markers", "third"]);
    assert_eq!(outcomes[0].result.as_ref().map(|r| r.segments.glyph_count()).ok(), Some(2));
    assert!(outcomes[1].result.is_err());
    assert_eq!(outcomes[2].result.as_ref().map(|r| r.segments.glyph_count()).ok(), Some(0));
    Ok(())
}

#[test]
fn batch_reads_scans_from_disk() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let good = dir.path().join("good.png");
    to_scan(&filled_form()).save(&good)?;
    let missing = dir.path().join("missing.png");

    let outcomes = BatchExecutor::new(pipeline())
        .with_workers(4)
        .execute(vec![ScanSource::Path(missing), ScanSource::Path(good)])?;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].name, "missing");
    assert!(outcomes[0].result.is_err());
    assert_eq!(outcomes[1].name, "good");
    assert!(outcomes[1].result.is_ok());
    Ok(())
}

#[test]
fn empty_batch_is_empty() -> anyhow::Result<()> {
    let outcomes = BatchExecutor::new(pipeline()).execute(Vec::new())?;
    assert!(outcomes.is_empty());
    Ok(())
}
