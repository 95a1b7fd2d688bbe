use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::detection::edges::rectangle_edge;
use crate::detection::markers::{BoundaryMarkerDetector, MarkerLocator, marker_centers};
use crate::error::{FormError, Result};
use crate::geometry::coords::MARKER_COUNT;
use crate::geometry::{CoordinateSystem, Point, RegionEdge};
use crate::raster::{Polarity, Raster};

/// Version written to and accepted from template files.
pub const TEMPLATE_VERSION: u32 = 1;

/// Layout of a blank form: where its markers are and where its fields are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormTemplate {
    marker_positions: [Point; MARKER_COUNT],
    marker_size: u32,
    coordinate_system: CoordinateSystem,
    width: u32,
    height: u32,
    #[serde(default)]
    polarity: Polarity,
    fields: Vec<RegionEdge>,
}

#[derive(Serialize, Deserialize)]
struct TemplateDocument {
    version: u32,
    template: FormTemplate,
}

impl FormTemplate {
    pub fn marker_positions(&self) -> &[Point; MARKER_COUNT] {
        &self.marker_positions
    }

    /// Expected side of a marker, in pixels
    pub fn marker_size(&self) -> u32 {
        self.marker_size
    }

    pub fn coordinate_system(&self) -> &CoordinateSystem {
        &self.coordinate_system
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn fields(&self) -> &[RegionEdge] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let document = TemplateDocument {
            version: TEMPLATE_VERSION,
            template: self.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json)?;
        log::info!("saved template with {} fields to {}", self.fields.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let invalid = |reason: String| FormError::TemplateFormat {
            path: path.to_path_buf(),
            reason,
        };

        let document: TemplateDocument = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
        if document.version != TEMPLATE_VERSION {
            return Err(invalid(format!(
                "unsupported version {}, expected {TEMPLATE_VERSION}",
                document.version
            )));
        }

        let template = document.template;
        template.validate().map_err(invalid)?;
        log::debug!("loaded template {} with {} fields", path.display(), template.fields.len());
        Ok(template)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("form size {}x{} must be positive", self.width, self.height));
        }
        if self.marker_size == 0 || self.marker_size > self.width.min(self.height) {
            return Err(format!(
                "marker size {} must be positive and fit the {}x{} form",
                self.marker_size, self.width, self.height
            ));
        }
        for (index, field) in self.fields.iter().enumerate() {
            let center = field.center();
            if let Some(earlier) = self.fields[..index].iter().position(|f| f.contains(center)) {
                return Err(format!("field {index} centered at {center} overlaps field {earlier}"));
            }
        }
        let cs = &self.coordinate_system;
        CoordinateSystem::new(cs.origin(), cs.x_axis(), cs.y_axis()).map_err(|e| e.to_string())?;
        if cs.x_axis().length() == 0.0 || cs.y_axis().length() == 0.0 {
            return Err("coordinate system axes must not be degenerate".to_string());
        }
        Ok(())
    }
}

/// Authors a [`FormTemplate`] field by field.
#[derive(Debug, Clone)]
pub struct FormTemplateBuilder {
    template: FormTemplate,
}

impl FormTemplateBuilder {
    pub fn new(
        coordinate_system: CoordinateSystem,
        marker_positions: [Point; MARKER_COUNT],
        marker_size: u32,
        width: u32,
        height: u32,
        polarity: Polarity,
    ) -> Self {
        Self {
            template: FormTemplate {
                marker_positions,
                marker_size,
                coordinate_system,
                width,
                height,
                polarity,
                fields: Vec::new(),
            },
        }
    }

    /// Starts a template from a blank form raster.
    ///
    /// Markers are searched near `positions` in a window of `marker_size`,
    /// falling back to boundary tracing. The detected marker centers become
    /// the template's marker positions.
    pub fn from_raster(
        image: &dyn Raster,
        positions: [Point; MARKER_COUNT],
        marker_size: u32,
        polarity: Polarity,
    ) -> Result<Self> {
        let locator = MarkerLocator::standard(
            positions,
            marker_size,
            polarity,
            BoundaryMarkerDetector::new(polarity),
        );
        let markers = locator.locate(image, &CancellationToken::new())?;
        let centers = marker_centers(&markers)?;
        let coordinate_system = CoordinateSystem::from_markers(&centers)?;
        let detected = <[Point; MARKER_COUNT]>::try_from(centers.as_slice())
            .map_err(|_| FormError::MarkerDetection("marker count changed".to_string()))?;

        log::info!("template markers at {}, {}, {}", detected[0], detected[1], detected[2]);
        Ok(Self::new(
            coordinate_system,
            detected,
            marker_size,
            image.width(),
            image.height(),
            polarity,
        ))
    }

    /// Adds a field unless its center falls inside a field already present.
    /// Returns whether the field was added.
    pub fn add_field(&mut self, edge: RegionEdge) -> bool {
        let center = edge.center();
        if let Some(existing) = self.template.fields.iter().position(|f| f.contains(center)) {
            log::debug!("field centered at {center} overlaps field {existing}, ignored");
            return false;
        }
        self.template.fields.push(edge);
        true
    }

    /// Adds the rectangular blank area around `seed` as a field.
    pub fn add_field_at(&mut self, image: &dyn Raster, seed: Point) -> Result<bool> {
        let edge = rectangle_edge(image, seed, self.template.polarity.background())?;
        Ok(self.add_field(edge))
    }

    pub fn field_count(&self) -> usize {
        self.template.fields.len()
    }

    pub fn build(self) -> FormTemplate {
        self.template
    }
}
