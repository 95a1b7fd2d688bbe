use std::path::PathBuf;
use thiserror::Error;

/// The main error type for form registration and segmentation.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("region ({x}, {y}, {width}x{height}) is outside the {bound_width}x{bound_height} raster")]
    InvalidRegion {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        bound_width: u32,
        bound_height: u32,
    },

    #[error("cannot compute {0} of an empty region")]
    EmptyRegion(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("marker detection failed: {0}")]
    MarkerDetection(String),

    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("field {field} cannot be cropped: {reason}")]
    Cropping { field: usize, reason: String },

    #[error("invalid template file {path}: {reason}")]
    TemplateFormat { path: PathBuf, reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl FormError {
    /// Out-of-bounds access of a single pixel.
    pub(crate) fn pixel_out_of_bounds(x: i64, y: i64, bound_width: u32, bound_height: u32) -> Self {
        FormError::InvalidRegion {
            x,
            y,
            width: 1,
            height: 1,
            bound_width,
            bound_height,
        }
    }

    /// Whether this failure only concerns a single field of a form.
    pub fn is_field_local(&self) -> bool {
        matches!(self, FormError::Cropping { .. })
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
