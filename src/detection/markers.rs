use crate::cancel::CancellationToken;
use crate::detection::edges::EdgeTracer;
use crate::detection::flood_fill::{edge_to_region, flood_fill};
use crate::error::{FormError, Result};
use crate::geometry::coords::MARKER_COUNT;
use crate::geometry::{Point, Region};
use crate::raster::{Polarity, Raster};

/// A strategy for finding the three calibration markers on a form.
pub trait MarkerDetector: Send + Sync {
    /// Human-readable name used in logs and failure reports
    fn name(&self) -> &str;

    fn detect(&self, image: &dyn Raster) -> Result<[Region; MARKER_COUNT]>;
}

fn into_markers(found: Vec<Region>, detector: &str) -> Result<[Region; MARKER_COUNT]> {
    let count = found.len();
    <[Region; MARKER_COUNT]>::try_from(found).map_err(|_| {
        FormError::MarkerDetection(format!(
            "{detector} found {count} markers, expected {MARKER_COUNT}"
        ))
    })
}

/// Finds markers near their expected positions.
#[derive(Debug, Clone)]
pub struct PositionMarkerDetector {
    pub positions: [Point; MARKER_COUNT],
    /// Side of the square searched around each position
    pub window: u32,
    pub polarity: Polarity,
}

impl PositionMarkerDetector {
    pub fn new(positions: [Point; MARKER_COUNT], window: u32, polarity: Polarity) -> Self {
        Self {
            positions,
            window,
            polarity,
        }
    }

    fn first_ink_in_window(&self, image: &dyn Raster, center: Point) -> Option<Point> {
        let half = (self.window / 2) as i64;
        let start_x = (center.x as i64 - half).max(0);
        let start_y = (center.y as i64 - half).max(0);
        let end_x = (center.x as i64 + half).min(image.width() as i64);
        let end_y = (center.y as i64 + half).min(image.height() as i64);

        (start_y..end_y)
            .flat_map(|y| (start_x..end_x).map(move |x| (x, y)))
            .find(|&(x, y)| image.at(x, y).is_some_and(|p| self.polarity.is_foreground(p)))
            .map(|(x, y)| Point::new(x as i32, y as i32))
    }
}

impl MarkerDetector for PositionMarkerDetector {
    fn name(&self) -> &str {
        "position"
    }

    fn detect(&self, image: &dyn Raster) -> Result<[Region; MARKER_COUNT]> {
        let background = self.polarity.background();
        let mut found = Vec::with_capacity(MARKER_COUNT);

        for &expected in &self.positions {
            let on_ink = image.pixel_at(expected).is_ok_and(|p| self.polarity.is_foreground(p));
            let seed = if on_ink {
                expected
            } else {
                self.first_ink_in_window(image, expected).ok_or_else(|| {
                    FormError::MarkerDetection(format!(
                        "no ink within {} px of expected marker at {expected}",
                        self.window / 2
                    ))
                })?
            };
            found.push(flood_fill(image, seed, background)?);
        }

        into_markers(found, self.name())
    }
}

/// Finds markers by tracing the boundaries of the paper area and keeping the
/// three small, marker-sized ones.
#[derive(Debug, Clone)]
pub struct BoundaryMarkerDetector {
    pub polarity: Polarity,
    /// Edges must be larger than this on at least one axis
    pub min_marker_size: i32,
    /// ... and smaller than the raster extent divided by this
    pub max_marker_fraction: i32,
    pub tracer: EdgeTracer,
}

impl Default for BoundaryMarkerDetector {
    fn default() -> Self {
        Self {
            polarity: Polarity::default(),
            min_marker_size: 10,
            max_marker_fraction: 10,
            tracer: EdgeTracer::default(),
        }
    }
}

impl BoundaryMarkerDetector {
    pub fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            ..Self::default()
        }
    }

    /// First background pixel, row-major, inside the top-left quadrant.
    fn seed(&self, image: &dyn Raster) -> Option<Point> {
        let background = self.polarity.background();
        (0..image.height() / 2)
            .flat_map(|y| (0..image.width() / 2).map(move |x| (x, y)))
            .find(|&(x, y)| image.get(x, y) == Some(background))
            .map(|(x, y)| Point::new(x as i32, y as i32))
    }
}

impl MarkerDetector for BoundaryMarkerDetector {
    fn name(&self) -> &str {
        "boundary"
    }

    fn detect(&self, image: &dyn Raster) -> Result<[Region; MARKER_COUNT]> {
        let seed = self.seed(image).ok_or_else(|| {
            FormError::MarkerDetection("no background pixel in the top-left quadrant".to_string())
        })?;

        let mut edges = self.tracer.trace(image, seed, self.polarity.background())?;
        edges.sort_by(|a, b| a.cmp_area(b));

        let fraction = self.max_marker_fraction.max(1);
        let max_height = image.height() as i32 / fraction;
        let max_width = image.width() as i32 / fraction;
        let candidates: Vec<_> = edges
            .iter()
            .filter(|edge| {
                let rect = edge.bounding_rect();
                (rect.height > self.min_marker_size && rect.height < max_height)
                    || (rect.width > self.min_marker_size && rect.width < max_width)
            })
            .collect();
        log::debug!(
            "boundary detector: {} of {} edges are marker-sized",
            candidates.len(),
            edges.len()
        );

        if candidates.len() != MARKER_COUNT {
            return Err(FormError::MarkerDetection(format!(
                "{} marker-sized edges, expected {MARKER_COUNT}",
                candidates.len()
            )));
        }

        let found = candidates
            .into_iter()
            .map(|edge| edge_to_region(image, edge))
            .collect::<Result<Vec<_>>>()?;
        into_markers(found, self.name())
    }
}

/// Tries marker detectors in order until one succeeds.
pub struct MarkerLocator {
    detectors: Vec<Box<dyn MarkerDetector>>,
}

impl MarkerLocator {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Position detector first, boundary detector as the fallback.
    pub fn standard(
        positions: [Point; MARKER_COUNT],
        window: u32,
        polarity: Polarity,
        boundary: BoundaryMarkerDetector,
    ) -> Self {
        Self::new()
            .with_detector(Box::new(PositionMarkerDetector::new(positions, window, polarity)))
            .with_detector(Box::new(boundary))
    }

    pub fn with_detector(mut self, detector: Box<dyn MarkerDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Runs each detector at most once; the first success wins.
    pub fn locate(&self, image: &dyn Raster, cancel: &CancellationToken) -> Result<[Region; MARKER_COUNT]> {
        let mut failures = Vec::new();

        for detector in &self.detectors {
            cancel.check()?;
            match detector.detect(image) {
                Ok(markers) => {
                    log::debug!("{} detector found the markers", detector.name());
                    return Ok(markers);
                }
                Err(FormError::Cancelled) => return Err(FormError::Cancelled),
                Err(e) => {
                    log::warn!("{} marker detector failed: {}", detector.name(), e);
                    failures.push(format!("{}: {}", detector.name(), e));
                }
            }
        }

        if failures.is_empty() {
            return Err(FormError::MarkerDetection("no marker detectors configured".to_string()));
        }
        Err(FormError::MarkerDetection(failures.join("; ")))
    }
}

impl Default for MarkerLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Center of each marker region.
pub fn marker_centers(markers: &[Region]) -> Result<Vec<Point>> {
    markers.iter().map(Region::centroid).collect()
}
