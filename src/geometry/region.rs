use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Point, Rectangle};
use crate::error::{FormError, Result};
use crate::raster::{PixelGrid, Polarity};

/// Connected set of pixel coordinates.
///
/// Points are de-duplicated and kept in row-major order; the bounding
/// rectangle and centroid are computed once when the region is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    points: Vec<Point>,
    bounds: Rectangle,
    centroid: Option<Point>,
}

impl Region {
    pub fn new(points: impl IntoIterator<Item = Point>) -> Self {
        let mut points: Vec<Point> = points.into_iter().collect();
        points.sort_unstable_by_key(Point::raster_key);
        points.dedup();

        let bounds = bounding_rect_of(&points);
        let centroid = centroid_of(&points);
        Self {
            points,
            bounds,
            centroid,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.points
            .binary_search_by_key(&point.raster_key(), Point::raster_key)
            .is_ok()
    }

    /// Bounding rectangle; the zero rectangle for an empty region.
    pub fn bounding_rect(&self) -> Rectangle {
        self.bounds
    }

    /// Mean point, truncated to integer coordinates.
    pub fn centroid(&self) -> Result<Point> {
        self.centroid.ok_or(FormError::EmptyRegion("centroid"))
    }

    /// Renders the region into a raster the size of its bounding rectangle.
    pub fn to_grid(&self, polarity: Polarity) -> PixelGrid {
        let bounds = self.bounds;
        let mut grid = PixelGrid::new(
            bounds.width.max(0) as u32,
            bounds.height.max(0) as u32,
            polarity.background(),
        );
        for p in &self.points {
            grid.put((p.x - bounds.x) as u32, (p.y - bounds.y) as u32, polarity.foreground());
        }
        grid
    }
}

fn bounding_rect_of(points: &[Point]) -> Rectangle {
    let Some(first) = points.first() else {
        return Rectangle::default();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Rectangle::from_extents(min_x, min_y, max_x, max_y)
}

fn centroid_of(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let (sum_x, sum_y) = points
        .iter()
        .fold((0i64, 0i64), |(sx, sy), p| (sx + p.x as i64, sy + p.y as i64));
    let n = points.len() as i64;
    Some(Point::new((sum_x / n) as i32, (sum_y / n) as i32))
}

/// Exact boundary point set with its bounding rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct EdgePoints {
    points: Vec<Point>,
    bounds: Rectangle,
}

impl TryFrom<Vec<Point>> for EdgePoints {
    type Error = FormError;

    fn try_from(mut points: Vec<Point>) -> Result<Self> {
        if points.is_empty() {
            return Err(FormError::EmptyRegion("edge"));
        }
        points.sort_unstable_by_key(Point::raster_key);
        points.dedup();
        let bounds = bounding_rect_of(&points);
        Ok(Self { points, bounds })
    }
}

impl From<EdgePoints> for Vec<Point> {
    fn from(value: EdgePoints) -> Self {
        value.points
    }
}

/// Boundary of a region: either the exact traced point set, or a rectangle
/// shortcut for axis-aligned rectangular fields.
///
/// Containment is tested against the bounding rectangle, not the exact
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionEdge {
    Exact(EdgePoints),
    Rectangle(Rectangle),
}

impl RegionEdge {
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Result<Self> {
        EdgePoints::try_from(points.into_iter().collect::<Vec<_>>()).map(RegionEdge::Exact)
    }

    pub fn rectangle(rect: Rectangle) -> Self {
        RegionEdge::Rectangle(rect)
    }

    pub fn bounding_rect(&self) -> Rectangle {
        match self {
            RegionEdge::Exact(edge) => edge.bounds,
            RegionEdge::Rectangle(rect) => *rect,
        }
    }

    pub fn center(&self) -> Point {
        self.bounding_rect().center()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounding_rect().contains(point)
    }

    /// Number of boundary points (every covered pixel for a rectangle edge).
    pub fn len(&self) -> usize {
        match self {
            RegionEdge::Exact(edge) => edge.points.len(),
            RegionEdge::Rectangle(rect) => rect.area() as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> Vec<Point> {
        match self {
            RegionEdge::Exact(edge) => edge.points.clone(),
            RegionEdge::Rectangle(rect) => rect.points().collect(),
        }
    }

    pub fn area(&self) -> i64 {
        self.bounding_rect().area()
    }

    /// Orders edges by bounding-box area.
    pub fn cmp_area(&self, other: &RegionEdge) -> Ordering {
        self.area().cmp(&other.area())
    }
}
