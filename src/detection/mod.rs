pub mod edges;
pub mod flood_fill;
pub mod labeling;
pub mod markers;
pub mod preprocessing;

pub use edges::{EdgeTracer, rectangle_edge};
pub use flood_fill::{edge_to_region, flood_fill};
pub use labeling::label_components;
pub use markers::{
    BoundaryMarkerDetector, MarkerDetector, MarkerLocator, PositionMarkerDetector, marker_centers,
};
pub use preprocessing::{Binarizer, GrayscaleMethod, Threshold, ThresholdBinarizer};
