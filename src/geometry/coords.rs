use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Line, Point};
use crate::error::{FormError, Result};

/// Number of calibration markers printed on every form.
pub const MARKER_COUNT: usize = 3;

/// Oblique coordinate system: an origin and two axis lines starting at it.
///
/// The axes run from the origin to the two other markers and are not
/// required to be perpendicular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    origin: Point,
    x_axis: Line,
    y_axis: Line,
}

impl CoordinateSystem {
    pub fn new(origin: Point, x_axis: Line, y_axis: Line) -> Result<Self> {
        if x_axis.p1() != origin || y_axis.p1() != origin {
            return Err(FormError::UnsupportedGeometry(format!(
                "axes {x_axis} and {y_axis} must both start at origin {origin}"
            )));
        }
        Ok(Self {
            origin,
            x_axis,
            y_axis,
        })
    }

    /// Builds the frame from the three marker centers.
    ///
    /// The longest pairwise line is the diagonal; the origin is the marker
    /// opposite to it. Of the two lines from the origin, the shorter one is
    /// the X axis and the longer one the Y axis.
    pub fn from_markers(markers: &[Point]) -> Result<Self> {
        let [a, b, c] = <[Point; MARKER_COUNT]>::try_from(markers).map_err(|_| {
            FormError::UnsupportedGeometry(format!(
                "expected {MARKER_COUNT} markers, got {}",
                markers.len()
            ))
        })?;
        if a == b || a == c || b == c {
            return Err(FormError::UnsupportedGeometry(format!(
                "markers {a}, {b}, {c} are not distinct"
            )));
        }

        let mut lines = [Line::new(a, b), Line::new(a, c), Line::new(b, c)];
        lines.sort_by(|l1, l2| l1.length().total_cmp(&l2.length()));
        let shortest = lines[0];
        let diagonal = lines[2];

        let origin = if diagonal.has_endpoint(shortest.p1()) {
            shortest.p2()
        } else {
            shortest.p1()
        };

        let first = Line::new(origin, diagonal.p1());
        let second = Line::new(origin, diagonal.p2());
        let (x_axis, y_axis) = if first.length() > second.length() {
            (second, first)
        } else {
            (first, second)
        };

        log::debug!("coordinate system: origin {origin}, x {x_axis}, y {y_axis}");
        Self::new(origin, x_axis, y_axis)
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn x_axis(&self) -> Line {
        self.x_axis
    }

    pub fn y_axis(&self) -> Line {
        self.y_axis
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "origin: {}, x axis: {}, y axis: {}",
            self.origin, self.x_axis, self.y_axis
        )
    }
}
