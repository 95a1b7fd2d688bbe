use std::collections::VecDeque;

use crate::error::{FormError, Result};
use crate::geometry::{Point, Region, RegionEdge};
use crate::raster::Raster;

pub(crate) const NEIGHBOURS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Collects every pixel reachable from `seed` over the 8-neighbourhood
/// through pixels whose value differs from `target`.
///
/// `target` is the terminating colour: filling a black blob on white paper
/// uses `target = true`.
pub fn flood_fill(image: &dyn Raster, seed: Point, target: bool) -> Result<Region> {
    let seed_value = image.pixel_at(seed)?;
    if seed_value == target {
        return Err(FormError::InvalidArgument(format!(
            "flood fill seed {seed} already has the terminating value"
        )));
    }

    let width = image.width() as usize;
    let mut visited = vec![false; width * image.height() as usize];
    let mut queue = VecDeque::new();
    let mut points = Vec::new();

    visited[seed.y as usize * width + seed.x as usize] = true;
    queue.push_back(seed);

    while let Some(p) = queue.pop_front() {
        points.push(p);
        for (dx, dy) in NEIGHBOURS_8 {
            let (nx, ny) = (p.x as i64 + dx as i64, p.y as i64 + dy as i64);
            let Some(value) = image.at(nx, ny) else {
                continue;
            };
            let index = ny as usize * width + nx as usize;
            if value != target && !visited[index] {
                visited[index] = true;
                queue.push_back(Point::new(nx as i32, ny as i32));
            }
        }
    }

    log::debug!("flood fill from {seed} collected {} pixels", points.len());
    Ok(Region::new(points))
}

/// Fills the region enclosed by `edge`, seeding at the center of its
/// bounding rectangle.
pub fn edge_to_region(image: &dyn Raster, edge: &RegionEdge) -> Result<Region> {
    let center = edge.center();
    let value = image.pixel_at(center)?;
    flood_fill(image, center, !value)
}
