#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from formscan for tests
pub use formscan::{
    CancellationToken, CoordinateSystem, FieldOutcome, FormError, FormTemplate, FormTemplateBuilder,
    GridView, Line, PipelineConfig, PixelGrid, Point, Polarity, Raster, Rectangle, Region,
    RegionEdge,
};
