use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detection::preprocessing::ThresholdBinarizer;
use crate::error::{FormError, Result};
use crate::raster::Polarity;

/// Pixels trimmed from each side of a mapped field before segmentation,
/// so the printed field border stays out of the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 8,
            bottom: 2,
            left: 5,
            right: 5,
        }
    }
}

/// Thresholds used to tell glyph ink apart from form lines and specks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentFilter {
    /// The band ends at the first row at or below the peak whose share is at
    /// most `1 / upper_ratio` of the peak share.
    pub upper_ratio: u32,
    /// The band starts after the last row above the peak whose share is at
    /// most `1 / lower_ratio` of the peak share.
    pub lower_ratio: u32,
    /// Width of the left and right strips where tall components count as borders
    pub border_strip: i32,
    /// Components longer than `1 / line_fraction` of the field are line candidates
    pub line_fraction: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub min_pixels: usize,
}

impl Default for SegmentFilter {
    fn default() -> Self {
        Self {
            upper_ratio: 4,
            lower_ratio: 3,
            border_strip: 5,
            line_fraction: 3,
            min_width: 2,
            min_height: 2,
            min_pixels: 4,
        }
    }
}

/// Settings of the boundary-based marker detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryDetectorConfig {
    pub min_marker_size: i32,
    pub max_marker_fraction: i32,
    pub min_edge_pixels: usize,
}

impl Default for BoundaryDetectorConfig {
    fn default() -> Self {
        Self {
            min_marker_size: 10,
            max_marker_fraction: 10,
            min_edge_pixels: 5,
        }
    }
}

/// Everything the registration pipeline can be tuned with.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub binarization: ThresholdBinarizer,
    /// Ink convention given to newly authored templates; registration uses
    /// the template's own
    pub polarity: Polarity,
    pub margins: Margins,
    pub segment_filter: SegmentFilter,
    pub boundary_detector: BoundaryDetectorConfig,
    /// Search window for the first marker pass, in marker sizes
    pub initial_window_factor: u32,
    /// Search window after global rotation, in marker sizes
    pub refine_window_factor: u32,
    /// Rotations smaller than this (radians) are not applied
    pub rotation_tolerance: f64,
    pub glyph_size: u32,
    /// Worker threads for batch runs; 0 uses the available parallelism
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            binarization: ThresholdBinarizer::default(),
            polarity: Polarity::default(),
            margins: Margins::default(),
            segment_filter: SegmentFilter::default(),
            boundary_detector: BoundaryDetectorConfig::default(),
            initial_window_factor: 2,
            refine_window_factor: 3,
            rotation_tolerance: 1e-3,
            glyph_size: 50,
            workers: 0,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Rejects values the detectors divide by or cannot search with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str| Err(FormError::InvalidArgument(format!("config: {key} must be positive")));
        if self.segment_filter.line_fraction <= 0 {
            return invalid("segment_filter.line_fraction");
        }
        if self.boundary_detector.max_marker_fraction <= 0 {
            return invalid("boundary_detector.max_marker_fraction");
        }
        if self.initial_window_factor == 0 {
            return invalid("initial_window_factor");
        }
        if self.refine_window_factor == 0 {
            return invalid("refine_window_factor");
        }
        if self.glyph_size == 0 {
            return invalid("glyph_size");
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        }
    }
}
