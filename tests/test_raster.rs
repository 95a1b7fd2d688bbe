mod common;
use common::*;

use proptest::prelude::*;

fn checkerboard(width: u32, height: u32) -> PixelGrid {
    let mut grid = PixelGrid::new(width, height, PAPER);
    for y in 0..height {
        for x in 0..width {
            if (x * 7 + y * 3) % 5 == 0 {
                grid.set_pixel(x, y, INK).unwrap();
            }
        }
    }
    grid
}

#[test]
fn get_pixel_out_of_bounds_fails() {
    let grid = PixelGrid::new(4, 3, PAPER);
    assert!(matches!(grid.get_pixel(4, 0), Err(FormError::InvalidRegion { .. })));
    assert!(matches!(grid.get_pixel(0, 3), Err(FormError::InvalidRegion { .. })));
    assert_eq!(grid.get(3, 2), Some(PAPER));
}

#[test]
fn subimage_must_fit() {
    let grid = PixelGrid::new(10, 10, PAPER);
    assert!(grid.subimage(5, 5, 5, 5).is_ok());
    assert!(matches!(grid.subimage(5, 5, 6, 5), Err(FormError::InvalidRegion { .. })));
    assert!(matches!(grid.subimage(11, 0, 0, 0), Err(FormError::InvalidRegion { .. })));
}

#[test]
fn view_of_view_rebases_on_root() -> anyhow::Result<()> {
    let grid = checkerboard(20, 20);
    let outer = grid.subimage(3, 4, 12, 12)?;
    let inner = outer.subimage(2, 1, 5, 5)?;
    assert_eq!(inner.offset(), Point::new(5, 5));
    for y in 0..5 {
        for x in 0..5 {
            assert_eq!(inner.get_pixel(x, y)?, grid.get_pixel(x + 5, y + 5)?);
        }
    }
    assert!(inner.get_pixel(5, 0).is_err());
    Ok(())
}

#[test]
fn histograms_count_foreground() {
    let grid = grid_from_ascii(&[
        "#..#", //
        "....",
        ".##.",
    ]);
    assert_eq!(grid.row_histogram(Polarity::DarkOnLight), vec![2, 0, 2]);
    assert_eq!(grid.column_histogram(Polarity::DarkOnLight), vec![1, 1, 1, 1]);
    assert_eq!(grid.row_histogram(Polarity::LightOnDark), vec![2, 4, 2]);
}

#[test]
fn crop_with_zero_threshold_is_foreground_bounds() -> anyhow::Result<()> {
    let grid = grid_from_ascii(&[
        "......", //
        "..#...",
        "...##.",
        "......",
    ]);
    let crop = grid.crop_with_threshold(0, Polarity::DarkOnLight)?;
    assert_eq!((crop.width(), crop.height()), (3, 2));
    assert_eq!(crop.offset(), Point::new(2, 1));
    assert_eq!(crop.get(0, 0), Some(INK));
    assert_eq!(crop.get(2, 1), Some(INK));
    Ok(())
}

#[test]
fn crop_without_foreground_keeps_full_view() -> anyhow::Result<()> {
    let grid = PixelGrid::new(7, 5, PAPER);
    let crop = grid.crop_with_threshold(0, Polarity::DarkOnLight)?;
    assert_eq!((crop.width(), crop.height()), (7, 5));
    Ok(())
}

#[test]
fn crop_with_threshold_skips_sparse_lines() -> anyhow::Result<()> {
    let grid = grid_from_ascii(&[
        "#.....", //
        ".####.",
        ".####.",
        "......",
    ]);
    let crop = grid.crop_with_threshold(1, Polarity::DarkOnLight)?;
    assert_eq!(crop.offset(), Point::new(1, 1));
    assert_eq!((crop.width(), crop.height()), (4, 2));
    Ok(())
}

#[test]
fn conversions_map_light_to_one() -> anyhow::Result<()> {
    let grid = grid_from_ascii(&["#.", ".#"]);
    assert_eq!(grid.to_input_vector(), vec![0.0, 1.0, 1.0, 0.0]);
    let luma = grid.to_luma();
    assert_eq!(luma.get_pixel(0, 0)[0], 0);
    assert_eq!(luma.get_pixel(1, 0)[0], 255);
    assert_eq!(PixelGrid::from_luma(&luma, 127), grid);
    assert_eq!(grid.subimage(1, 0, 1, 2)?.to_grid(), grid_from_ascii(&[".", "#"]));
    Ok(())
}

#[test]
fn ragged_rows_are_rejected() {
    let rows = vec![vec![true, false], vec![true]];
    assert!(matches!(PixelGrid::from_rows(&rows), Err(FormError::InvalidArgument(_))));
}

proptest! {
    #[test]
    fn view_reads_through_to_grid(
        width in 1u32..24,
        height in 1u32..24,
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0,
        fw in 0.0f64..1.0,
        fh in 0.0f64..1.0,
    ) {
        let grid = checkerboard(width, height);
        let x = (fx * width as f64) as u32 % width;
        let y = (fy * height as f64) as u32 % height;
        let w = ((fw * (width - x) as f64) as u32).max(1);
        let h = ((fh * (height - y) as f64) as u32).max(1);

        let view = grid.subimage(x, y, w, h).unwrap();
        prop_assert_eq!((view.width(), view.height()), (w, h));
        for j in 0..h {
            for i in 0..w {
                prop_assert_eq!(view.get_pixel(i, j).unwrap(), grid.get_pixel(x + i, y + j).unwrap());
            }
        }
        prop_assert!(view.get_pixel(w, 0).is_err());
    }
}
