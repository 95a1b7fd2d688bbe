pub mod cancel;
pub mod classify;
pub mod config;
pub mod detection;
pub mod error;
pub mod form;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod raster;

pub use cancel::CancellationToken;
pub use config::PipelineConfig;
pub use error::{FormError, Result};
pub use form::{FormInstance, FormTemplate, FormTemplateBuilder, segment_form};
pub use geometry::{CoordinateSystem, Line, Point, Rectangle, Region, RegionEdge};
pub use models::{FieldOutcome, FieldSegments, FormResult, FormSegments, GlyphSegment};
pub use pipeline::{BatchExecutor, BatchOutcome, FormPipeline, ScanSource};
pub use raster::{GridView, PixelGrid, Polarity, Raster};
