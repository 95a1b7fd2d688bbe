use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::detection::edges::EdgeTracer;
use crate::detection::markers::{BoundaryMarkerDetector, MarkerLocator, marker_centers};
use crate::error::{FormError, Result};
use crate::form::rectify;
use crate::form::segment::segment_field;
use crate::form::template::FormTemplate;
use crate::geometry::{CoordinateSystem, Rectangle};
use crate::models::{FieldOutcome, FieldSegments, FormSegments};
use crate::raster::{PixelGrid, Raster};

/// A scan registered against a template.
#[derive(Debug, Clone)]
pub struct FormInstance {
    aligned: PixelGrid,
    coordinate_system: CoordinateSystem,
    rotation: f64,
}

fn locate_frame(
    image: &dyn Raster,
    template: &FormTemplate,
    config: &PipelineConfig,
    window_factor: u32,
    cancel: &CancellationToken,
) -> Result<CoordinateSystem> {
    let boundary = BoundaryMarkerDetector {
        polarity: template.polarity(),
        min_marker_size: config.boundary_detector.min_marker_size,
        max_marker_fraction: config.boundary_detector.max_marker_fraction,
        tracer: EdgeTracer::new(config.boundary_detector.min_edge_pixels),
    };
    let locator = MarkerLocator::standard(
        *template.marker_positions(),
        template.marker_size().saturating_mul(window_factor),
        template.polarity(),
        boundary,
    );
    let markers = locator.locate(image, cancel)?;
    CoordinateSystem::from_markers(&marker_centers(&markers)?)
}

impl FormInstance {
    /// Finds the markers on a binarized scan, rotates the scan into the
    /// template's orientation and locates the markers again on the result.
    pub fn register(
        scan: PixelGrid,
        template: &FormTemplate,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        cancel.check()?;
        let initial = locate_frame(&scan, template, config, config.initial_window_factor, cancel)?;
        let rotation = rectify::rotation_angle(template.coordinate_system(), &initial);

        if rotation.abs() < config.rotation_tolerance {
            log::debug!("scan within rotation tolerance ({rotation:.5} rad)");
            return Ok(Self {
                aligned: scan,
                coordinate_system: initial,
                rotation: 0.0,
            });
        }

        cancel.check()?;
        let aligned = rectify::align(&scan, rotation, template.polarity());
        let refined = locate_frame(&aligned, template, config, config.refine_window_factor, cancel)?;
        log::debug!("registered frame after rotation: {refined}");
        Ok(Self {
            aligned,
            coordinate_system: refined,
            rotation,
        })
    }

    /// Binarized scan in template orientation
    pub fn aligned(&self) -> &PixelGrid {
        &self.aligned
    }

    pub fn coordinate_system(&self) -> &CoordinateSystem {
        &self.coordinate_system
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Crop window of template field `index` on this scan.
    pub fn field_window(&self, template: &FormTemplate, index: usize, config: &PipelineConfig) -> Result<Rectangle> {
        let field = template.fields().get(index).ok_or_else(|| {
            FormError::InvalidArgument(format!(
                "field {index} out of range, template has {}",
                template.field_count()
            ))
        })?;
        let mapped = rectify::map_rectangle(
            field.bounding_rect(),
            template.coordinate_system(),
            &self.coordinate_system,
        );
        rectify::crop_window(index, mapped, &config.margins)
    }

    fn segment_one(&self, template: &FormTemplate, index: usize, config: &PipelineConfig) -> Result<FieldSegments> {
        let window = self.field_window(template, index, config)?;
        let crop = rectify::crop_field(&self.aligned, index, window)?;
        let glyphs = segment_field(&crop, &config.segment_filter, template.polarity());
        Ok(FieldSegments {
            index,
            window,
            outcome: FieldOutcome::Segmented(glyphs),
        })
    }

    /// Segments every template field. Fields that cannot be cropped are
    /// reported as skipped instead of failing the form.
    pub fn segment_fields(&self, template: &FormTemplate, config: &PipelineConfig) -> FormSegments {
        let fields = (0..template.field_count())
            .map(|index| match self.segment_one(template, index, config) {
                Ok(segments) => segments,
                Err(e) => {
                    log::warn!("skipping field {index}: {e}");
                    FieldSegments {
                        index,
                        window: Rectangle::default(),
                        outcome: FieldOutcome::Skipped(e),
                    }
                }
            })
            .collect();

        FormSegments {
            coordinate_system: self.coordinate_system,
            rotation: self.rotation,
            fields,
        }
    }
}
