mod common;
use common::*;

use formscan::detection::label_components;
use image::Luma;
use imageproc::region_labelling::{Connectivity, connected_components};
use proptest::prelude::*;
use std::collections::HashSet;

#[test]
fn single_pixel_is_one_region() {
    let grid = grid_from_ascii(&["...", ".#.", "..."]);
    let regions = label_components(&grid, Polarity::DarkOnLight);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].points(), &[Point::new(1, 1)]);
}

#[test]
fn diagonal_pixels_are_connected() {
    let grid = grid_from_ascii(&["#..", ".#.", "..#"]);
    let regions = label_components(&grid, Polarity::DarkOnLight);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].len(), 3);
}

#[test]
fn anti_diagonal_needs_north_east_neighbour() {
    let grid = grid_from_ascii(&["..#", ".#.", "#.."]);
    assert_eq!(label_components(&grid, Polarity::DarkOnLight).len(), 1);
}

#[test]
fn separated_pixels_are_two_regions() {
    let grid = grid_from_ascii(&["#.#"]);
    let regions = label_components(&grid, Polarity::DarkOnLight);
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].points(), &[Point::new(0, 0)]);
    assert_eq!(regions[1].points(), &[Point::new(2, 0)]);
}

#[test]
fn regions_sorted_by_bounding_x() {
    // the right blob starts higher, so it is found first in raster order
    let grid = grid_from_ascii(&[
        "....##", //
        "....##",
        "##....",
        "##....",
    ]);
    let regions = label_components(&grid, Polarity::DarkOnLight);
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].bounding_rect().x, 0);
    assert_eq!(regions[1].bounding_rect().x, 4);
}

#[test]
fn equal_x_keeps_raster_order() {
    let grid = grid_from_ascii(&["#.", "..", "##"]);
    let regions = label_components(&grid, Polarity::DarkOnLight);
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].len(), 1);
    assert_eq!(regions[1].len(), 2);
}

#[test]
fn empty_and_blank_inputs_give_nothing() {
    assert!(label_components(&PixelGrid::new(0, 0, PAPER), Polarity::DarkOnLight).is_empty());
    assert!(label_components(&PixelGrid::new(5, 5, PAPER), Polarity::DarkOnLight).is_empty());
}

#[test]
fn polarity_selects_foreground() {
    let grid = grid_from_ascii(&["#.#"]);
    let light = label_components(&grid, Polarity::LightOnDark);
    assert_eq!(light.len(), 1);
    assert_eq!(light[0].points(), &[Point::new(1, 0)]);
}

#[test]
fn labels_within_a_view() -> anyhow::Result<()> {
    let grid = grid_from_ascii(&[
        "#.....", //
        "..#.#.",
        "......",
    ]);
    let view = grid.subimage(1, 0, 5, 3)?;
    let regions = label_components(&view, Polarity::DarkOnLight);
    assert_eq!(regions.len(), 2);
    // coordinates are relative to the view
    assert_eq!(regions[0].points(), &[Point::new(1, 1)]);
    Ok(())
}

fn grid_from_bits(width: u32, bits: &[bool]) -> PixelGrid {
    let height = bits.len() as u32 / width;
    let mut grid = PixelGrid::new(width, height, PAPER);
    for y in 0..height {
        for x in 0..width {
            if bits[(y * width + x) as usize] {
                grid.set_pixel(x, y, INK).unwrap();
            }
        }
    }
    grid
}

proptest! {
    #[test]
    fn component_count_matches_imageproc(
        width in 1u32..16,
        bits in prop::collection::vec(any::<bool>(), 1..256),
    ) {
        let usable = (bits.len() as u32 / width) * width;
        prop_assume!(usable > 0);
        let grid = grid_from_bits(width, &bits[..usable as usize]);

        let regions = label_components(&grid, Polarity::DarkOnLight);

        // imageproc labels non-background pixels: ink is 0 in the rendering
        let inverted = image::GrayImage::from_fn(grid.width(), grid.height(), |x, y| {
            if grid.get(x, y) == Some(INK) { Luma([255u8]) } else { Luma([0u8]) }
        });
        let labels = connected_components(&inverted, Connectivity::Eight, Luma([0u8]));
        let expected: HashSet<u32> = labels.pixels().map(|p| p[0]).filter(|&l| l != 0).collect();

        prop_assert_eq!(regions.len(), expected.len());
        let total: usize = regions.iter().map(|r| r.len()).sum();
        prop_assert_eq!(total, grid.count_foreground(Polarity::DarkOnLight));
        for pair in regions.windows(2) {
            prop_assert!(pair[0].bounding_rect().x <= pair[1].bounding_rect().x);
        }
    }
}
