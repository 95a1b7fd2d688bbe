pub mod instance;
pub mod rectify;
pub mod segment;
pub mod template;

pub use instance::FormInstance;
pub use template::{FormTemplate, FormTemplateBuilder};

use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::FormSegments;
use crate::raster::PixelGrid;

/// Registers a binarized scan against `template` and segments its fields.
///
/// Only marker detection and cancellation fail the form; per-field cropping
/// failures are reported inside the result.
pub fn segment_form(
    scan: PixelGrid,
    template: &FormTemplate,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<FormSegments> {
    let instance = FormInstance::register(scan, template, config, cancel)?;
    cancel.check()?;
    Ok(instance.segment_fields(template, config))
}
