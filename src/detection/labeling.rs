use std::collections::BTreeMap;

use crate::geometry::{Point, Region};
use crate::raster::{Polarity, Raster};

/// Causal 8-neighbourhood visited by the first pass: NE, N, NW, W.
const CAUSAL_NEIGHBOURS: [(i64, i64); 4] = [(1, -1), (0, -1), (-1, -1), (-1, 0)];

/// Union-find over provisional labels, always rooted at the smallest label.
struct Equivalences {
    parent: Vec<usize>,
}

impl Equivalences {
    fn new() -> Self {
        // label 0 is never handed out
        Self { parent: vec![0] }
    }

    fn fresh(&mut self) -> usize {
        let label = self.parent.len();
        self.parent.push(label);
        label
    }

    fn find(&mut self, label: usize) -> usize {
        let mut root = label;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = label;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}

/// Labels the 8-connected foreground components of a raster.
///
/// Regions come back ordered by the x of their bounding rectangle. Ties keep
/// the raster order of each component's first pixel.
pub fn label_components(image: &dyn Raster, polarity: Polarity) -> Vec<Region> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut labels = vec![0usize; width * height];
    let mut equivalences = Equivalences::new();

    for y in 0..height {
        for x in 0..width {
            let is_ink = image.get(x as u32, y as u32).is_some_and(|p| polarity.is_foreground(p));
            if !is_ink {
                continue;
            }

            let neighbours: Vec<usize> = CAUSAL_NEIGHBOURS
                .iter()
                .filter_map(|&(dx, dy)| {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        return None;
                    }
                    let label = labels[ny as usize * width + nx as usize];
                    (label != 0).then_some(label)
                })
                .collect();

            let label = match neighbours.iter().min() {
                None => equivalences.fresh(),
                Some(&min) => {
                    for &other in &neighbours {
                        equivalences.union(min, other);
                    }
                    min
                }
            };
            labels[y * width + x] = label;
        }
    }

    // Second pass: resolve every provisional label to its class minimum.
    // BTreeMap keeps classes in order of their smallest label, which is the
    // raster order of their first pixel.
    let mut classes: BTreeMap<usize, Vec<Point>> = BTreeMap::new();
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x];
            if label == 0 {
                continue;
            }
            let root = equivalences.find(label);
            classes
                .entry(root)
                .or_default()
                .push(Point::new(x as i32, y as i32));
        }
    }

    let mut regions: Vec<Region> = classes.into_values().map(Region::new).collect();
    regions.sort_by_key(|r| r.bounding_rect().x);
    log::debug!("labeled {} components in {}x{} raster", regions.len(), width, height);
    regions
}
