use crate::classify::FieldValue;
use crate::error::FormError;
use crate::geometry::{CoordinateSystem, Rectangle};
use crate::raster::PixelGrid;

/// One glyph candidate cut out of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphSegment {
    /// Bounding rectangle relative to the field crop
    pub bounds: Rectangle,
    /// The component alone, foreground = ink
    pub raster: PixelGrid,
}

impl GlyphSegment {
    pub fn width(&self) -> u32 {
        self.bounds.width.max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.bounds.height.max(0) as u32
    }
}

#[derive(Debug)]
pub enum FieldOutcome {
    Segmented(Vec<GlyphSegment>),
    /// The field could not be cropped from this scan
    Skipped(FormError),
}

#[derive(Debug)]
pub struct FieldSegments {
    /// Index of the field in the template
    pub index: usize,
    /// Crop window in scan coordinates, margins already removed
    pub window: Rectangle,
    pub outcome: FieldOutcome,
}

impl FieldSegments {
    pub fn glyphs(&self) -> &[GlyphSegment] {
        match &self.outcome {
            FieldOutcome::Segmented(glyphs) => glyphs,
            FieldOutcome::Skipped(_) => &[],
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, FieldOutcome::Skipped(_))
    }
}

/// Segmentation of every template field on one registered scan.
#[derive(Debug)]
pub struct FormSegments {
    pub coordinate_system: CoordinateSystem,
    /// Rotation applied to the scan before field mapping, in radians
    pub rotation: f64,
    pub fields: Vec<FieldSegments>,
}

impl FormSegments {
    pub fn glyph_count(&self) -> usize {
        self.fields.iter().map(|f| f.glyphs().len()).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_skipped()).count()
    }
}

/// Result of running one scan through the pipeline.
#[derive(Debug)]
pub struct FormResult {
    pub name: String,
    pub segments: FormSegments,
    /// Classified field values, one per field, when a classifier is attached
    pub values: Option<Vec<FieldValue>>,
}
