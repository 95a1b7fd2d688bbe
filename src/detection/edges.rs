use std::collections::{BTreeMap, VecDeque};

use crate::detection::flood_fill::NEIGHBOURS_8;
use crate::error::{FormError, Result};
use crate::geometry::{Point, Rectangle, RegionEdge};
use crate::raster::Raster;

const NEIGHBOURS_4: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Label of pixels that lie inside the region, away from any boundary.
const INTERIOR: usize = 0;

/// Traces the boundaries that enclose a region of uniform colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTracer {
    /// Edges with fewer points are dropped as noise.
    pub min_edge_pixels: usize,
}

impl Default for EdgeTracer {
    fn default() -> Self {
        Self { min_edge_pixels: 5 }
    }
}

impl EdgeTracer {
    pub fn new(min_edge_pixels: usize) -> Self {
        Self { min_edge_pixels }
    }

    /// Walks the 4-connected `region_color` area around `seed` and returns
    /// every boundary it touches, one edge per 8-connected group.
    ///
    /// Both sides of a boundary are included: the region pixels that touch
    /// ink or the raster border, and the foreign pixels next to them.
    pub fn trace(&self, image: &dyn Raster, seed: Point, region_color: bool) -> Result<Vec<RegionEdge>> {
        if image.pixel_at(seed)? != region_color {
            return Err(FormError::InvalidArgument(format!(
                "edge tracing seed {seed} is not inside the region"
            )));
        }

        let width = image.width() as usize;
        let height = image.height() as usize;
        // `None` until discovered, then the pixel's label
        let mut labels: Vec<Option<usize>> = vec![None; width * height];
        let mut queue = VecDeque::new();
        let mut next_label = 1usize;

        let seed_label = if self.is_interior(image, seed, region_color) {
            INTERIOR
        } else {
            next_label += 1;
            next_label - 1
        };
        labels[index(seed, width)] = Some(seed_label);
        queue.push_back(seed);

        while let Some(p) = queue.pop_front() {
            if image.pixel_at(p)? != region_color {
                continue;
            }
            let current = labels[index(p, width)].unwrap_or(INTERIOR);

            for (dx, dy) in NEIGHBOURS_4 {
                let (nx, ny) = (p.x as i64 + dx as i64, p.y as i64 + dy as i64);
                if !image.in_bounds(nx, ny) {
                    continue;
                }
                let next = Point::new(nx as i32, ny as i32);
                let slot = &mut labels[index(next, width)];
                if slot.is_some() {
                    continue;
                }

                let label = if self.is_interior(image, next, region_color) {
                    INTERIOR
                } else if current == INTERIOR {
                    next_label += 1;
                    next_label - 1
                } else {
                    current
                };
                *slot = Some(label);
                queue.push_back(next);
            }
        }

        let edges = self.merge_edges(&labels, width, height, next_label);
        log::debug!(
            "traced {} edges from {seed} ({} provisional labels)",
            edges.len(),
            next_label - 1
        );
        edges
            .into_iter()
            .map(RegionEdge::from_points)
            .collect()
    }

    fn is_interior(&self, image: &dyn Raster, p: Point, region_color: bool) -> bool {
        image.pixel_at(p).is_ok_and(|v| v == region_color)
            && NEIGHBOURS_8
                .iter()
                .all(|&(dx, dy)| image.at(p.x as i64 + dx as i64, p.y as i64 + dy as i64) == Some(region_color))
    }

    /// Unions 8-adjacent edge labels and drops groups below the minimum size.
    fn merge_edges(
        &self,
        labels: &[Option<usize>],
        width: usize,
        height: usize,
        label_count: usize,
    ) -> Vec<Vec<Point>> {
        let mut parent: Vec<usize> = (0..label_count).collect();

        fn find(parent: &mut [usize], mut label: usize) -> usize {
            while parent[label] != label {
                parent[label] = parent[parent[label]];
                label = parent[label];
            }
            label
        }

        let edge_label = |x: i64, y: i64| -> Option<usize> {
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                return None;
            }
            labels[y as usize * width + x as usize].filter(|&l| l != INTERIOR)
        };

        for y in 0..height as i64 {
            for x in 0..width as i64 {
                let Some(label) = edge_label(x, y) else {
                    continue;
                };
                for (dx, dy) in NEIGHBOURS_8 {
                    if let Some(other) = edge_label(x + dx as i64, y + dy as i64) {
                        let (a, b) = (find(&mut parent, label), find(&mut parent, other));
                        if a != b {
                            parent[a.max(b)] = a.min(b);
                        }
                    }
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<Point>> = BTreeMap::new();
        for y in 0..height {
            for x in 0..width {
                if let Some(label) = edge_label(x as i64, y as i64) {
                    let root = find(&mut parent, label);
                    groups.entry(root).or_default().push(Point::new(x as i32, y as i32));
                }
            }
        }

        groups
            .into_values()
            .filter(|points| points.len() >= self.min_edge_pixels)
            .collect()
    }
}

fn index(p: Point, width: usize) -> usize {
    p.y as usize * width + p.x as usize
}

/// Grows an axis-aligned rectangle around `seed` while the pixels along the
/// seed's row and column keep matching `region_color`.
pub fn rectangle_edge(image: &dyn Raster, seed: Point, region_color: bool) -> Result<RegionEdge> {
    if image.pixel_at(seed)? != region_color {
        return Err(FormError::InvalidArgument(format!(
            "rectangle seed {seed} is not inside the region"
        )));
    }

    let matches = |x: i32, y: i32| image.at(x as i64, y as i64) == Some(region_color);
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (seed.x, seed.x, seed.y, seed.y);

    loop {
        let mut grown = false;
        if matches(min_x - 1, seed.y) {
            min_x -= 1;
            grown = true;
        }
        if matches(seed.x, min_y - 1) {
            min_y -= 1;
            grown = true;
        }
        if matches(max_x + 1, seed.y) {
            max_x += 1;
            grown = true;
        }
        if matches(seed.x, max_y + 1) {
            max_y += 1;
            grown = true;
        }
        if !grown {
            break;
        }
    }

    let rect = Rectangle::from_extents(min_x, min_y, max_x, max_y);
    log::debug!("rectangle edge from {seed}: {rect}");
    Ok(RegionEdge::rectangle(rect))
}
