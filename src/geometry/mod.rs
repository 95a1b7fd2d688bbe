pub mod coords;
pub mod region;

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

pub use coords::CoordinateSystem;
pub use region::{Region, RegionEdge};

/// Integer pixel coordinate. Positive x runs right, positive y runs down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }

    /// Row-major ordering key.
    pub(crate) fn raster_key(&self) -> (i32, i32) {
        (self.y, self.x)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in pixel extents: `width = max_x - min_x + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering the inclusive extents `[min_x, max_x] x [min_y, max_y]`.
    pub fn from_extents(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Every pixel coordinate inside the rectangle, row-major.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (self.y..self.bottom()).flat_map(move |y| (self.x..self.right()).map(move |x| Point::new(x, y)))
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {} {}x{}]", self.x, self.y, self.width, self.height)
    }
}

/// Segment between two points. The length is computed once at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "LineEndpoints", into = "LineEndpoints")]
pub struct Line {
    p1: Point,
    p2: Point,
    length: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct LineEndpoints {
    p1: Point,
    p2: Point,
}

impl From<LineEndpoints> for Line {
    fn from(value: LineEndpoints) -> Self {
        Line::new(value.p1, value.p2)
    }
}

impl From<Line> for LineEndpoints {
    fn from(value: Line) -> Self {
        LineEndpoints { p1: value.p1, p2: value.p2 }
    }
}

impl Line {
    pub fn new(p1: Point, p2: Point) -> Self {
        Self {
            p1,
            p2,
            length: p1.distance(&p2),
        }
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn has_endpoint(&self, point: Point) -> bool {
        self.p1 == point || self.p2 == point
    }

    /// Direction from `p1` to `p2` in `[0, 2π)`, measured in image coordinates.
    pub fn angle(&self) -> f64 {
        let dx = (self.p2.x - self.p1.x) as f64;
        let dy = (self.p2.y - self.p1.y) as f64;
        let angle = dy.atan2(dx);
        if angle < 0.0 { angle + 2.0 * PI } else { angle }
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.p1 == other.p1 && self.p2 == other.p2
    }
}

impl Eq for Line {}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.p1, self.p2)
    }
}
