//! Monochrome rasters and zero-copy views onto them.
//!
//! A pixel is `true` when it is light (white) and `false` when it is dark.
//! Which of the two counts as foreground is decided per call through
//! [`Polarity`].

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{FormError, Result};
use crate::geometry::{Point, Rectangle};

/// Foreground convention of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Dark ink on light paper: foreground pixels are `false`.
    #[default]
    DarkOnLight,
    /// Light ink on dark background: foreground pixels are `true`.
    LightOnDark,
}

impl Polarity {
    pub fn foreground(self) -> bool {
        matches!(self, Polarity::LightOnDark)
    }

    pub fn background(self) -> bool {
        !self.foreground()
    }

    pub fn is_foreground(self, pixel: bool) -> bool {
        pixel == self.foreground()
    }
}

/// Read access shared by owned grids and views.
pub trait Raster {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Pixel value, `None` outside `[0, width) x [0, height)`.
    fn get(&self, x: u32, y: u32) -> Option<bool>;

    /// Zero-copy view of the rectangle `(x, y, width, height)`.
    fn subimage(&self, x: u32, y: u32, width: u32, height: u32) -> Result<GridView<'_>>;

    fn get_pixel(&self, x: u32, y: u32) -> Result<bool> {
        self.get(x, y)
            .ok_or_else(|| FormError::pixel_out_of_bounds(x as i64, y as i64, self.width(), self.height()))
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    /// Pixel at a signed coordinate, `None` outside the raster.
    fn at(&self, x: i64, y: i64) -> Option<bool> {
        if self.in_bounds(x, y) {
            self.get(x as u32, y as u32)
        } else {
            None
        }
    }

    fn pixel_at(&self, point: Point) -> Result<bool> {
        self.at(point.x as i64, point.y as i64).ok_or_else(|| {
            FormError::pixel_out_of_bounds(point.x as i64, point.y as i64, self.width(), self.height())
        })
    }

    fn bounds(&self) -> Rectangle {
        Rectangle::new(0, 0, self.width() as i32, self.height() as i32)
    }

    /// View of a rectangle given in signed coordinates.
    fn view_of(&self, rect: Rectangle) -> Result<GridView<'_>> {
        if rect.x < 0 || rect.y < 0 || rect.width < 0 || rect.height < 0 {
            return Err(FormError::InvalidRegion {
                x: rect.x as i64,
                y: rect.y as i64,
                width: rect.width as i64,
                height: rect.height as i64,
                bound_width: self.width(),
                bound_height: self.height(),
            });
        }
        self.subimage(rect.x as u32, rect.y as u32, rect.width as u32, rect.height as u32)
    }

    fn count_foreground(&self, polarity: Polarity) -> usize {
        self.row_histogram(polarity).iter().map(|&c| c as usize).sum()
    }

    /// Vertical projection: number of foreground pixels in each row.
    fn row_histogram(&self, polarity: Polarity) -> Vec<u32> {
        let mut histogram = vec![0u32; self.height() as usize];
        for (y, count) in histogram.iter_mut().enumerate() {
            for x in 0..self.width() {
                if self.get(x, y as u32).is_some_and(|p| polarity.is_foreground(p)) {
                    *count += 1;
                }
            }
        }
        histogram
    }

    /// Horizontal projection: number of foreground pixels in each column.
    fn column_histogram(&self, polarity: Polarity) -> Vec<u32> {
        let mut histogram = vec![0u32; self.width() as usize];
        for y in 0..self.height() {
            for (x, count) in histogram.iter_mut().enumerate() {
                if self.get(x as u32, y).is_some_and(|p| polarity.is_foreground(p)) {
                    *count += 1;
                }
            }
        }
        histogram
    }

    /// Sub-view bounded by the first and last row and column whose foreground
    /// count exceeds `threshold`. With `threshold == 0` this is the exact
    /// foreground bounding box. Axes with no qualifying line keep their full
    /// extent.
    fn crop_with_threshold(&self, threshold: u32, polarity: Polarity) -> Result<GridView<'_>> {
        let rows = self.row_histogram(polarity);
        let columns = self.column_histogram(polarity);
        let (min_y, max_y) = qualifying_span(&rows, threshold).unwrap_or((0, rows.len().saturating_sub(1)));
        let (min_x, max_x) = qualifying_span(&columns, threshold).unwrap_or((0, columns.len().saturating_sub(1)));

        if rows.is_empty() || columns.is_empty() {
            return self.subimage(0, 0, self.width(), self.height());
        }
        self.subimage(
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        )
    }

    fn to_grid(&self) -> PixelGrid {
        PixelGrid::from_fn(self.width(), self.height(), |x, y| self.get(x, y).unwrap_or(false))
    }

    /// Renders `true` as 255 and `false` as 0.
    fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            if self.get(x, y).unwrap_or(false) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    /// Row-major flattening with `1.0` for `true` and `0.0` for `false`.
    fn to_input_vector(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in 0..self.height() {
            for x in 0..self.width() {
                values.push(if self.get(x, y).unwrap_or(false) { 1.0 } else { 0.0 });
            }
        }
        values
    }
}

fn qualifying_span(histogram: &[u32], threshold: u32) -> Option<(usize, usize)> {
    let first = histogram.iter().position(|&c| c > threshold)?;
    let last = histogram.iter().rposition(|&c| c > threshold)?;
    Some((first, last))
}

fn check_view(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    bound_width: u32,
    bound_height: u32,
) -> Result<()> {
    let fits = x as u64 + width as u64 <= bound_width as u64 && y as u64 + height as u64 <= bound_height as u64;
    if fits {
        Ok(())
    } else {
        Err(FormError::InvalidRegion {
            x: x as i64,
            y: y as i64,
            width: width as i64,
            height: height as i64,
            bound_width,
            bound_height,
        })
    }
}

/// Owned monochrome raster stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, fill: bool) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    /// Builds a grid from equally long rows.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        if rows.iter().any(|r| r.len() as u32 != width) {
            return Err(FormError::InvalidArgument("rows differ in length".to_string()));
        }
        Ok(Self {
            width,
            height,
            pixels: rows.iter().flatten().copied().collect(),
        })
    }

    /// Pixels brighter than `threshold` become `true`.
    pub fn from_luma(image: &GrayImage, threshold: u8) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| image.get_pixel(x, y)[0] > threshold)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: bool) -> Result<()> {
        let index = self
            .index(x, y)
            .ok_or_else(|| FormError::pixel_out_of_bounds(x as i64, y as i64, self.width, self.height))?;
        self.pixels[index] = value;
        Ok(())
    }

    /// Sets a pixel, ignoring coordinates outside the grid.
    pub(crate) fn put(&mut self, x: u32, y: u32, value: bool) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = value;
        }
    }

    /// Fills a rectangle, clipped to the grid.
    pub fn fill_rect(&mut self, rect: Rectangle, value: bool) {
        for p in rect.points() {
            if p.x >= 0 && p.y >= 0 {
                self.put(p.x as u32, p.y as u32, value);
            }
        }
    }

    pub fn as_view(&self) -> GridView<'_> {
        GridView {
            grid: self,
            x0: 0,
            y0: 0,
            width: self.width,
            height: self.height,
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }
}

impl Raster for PixelGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get(&self, x: u32, y: u32) -> Option<bool> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    fn subimage(&self, x: u32, y: u32, width: u32, height: u32) -> Result<GridView<'_>> {
        check_view(x, y, width, height, self.width, self.height)?;
        Ok(GridView {
            grid: self,
            x0: x,
            y0: y,
            width,
            height,
        })
    }
}

/// Rectangle-offset view onto a [`PixelGrid`]. Views of views re-base onto
/// the same root grid, so pixel storage is never copied.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    grid: &'a PixelGrid,
    x0: u32,
    y0: u32,
    width: u32,
    height: u32,
}

impl GridView<'_> {
    /// Offset of this view inside its root grid.
    pub fn offset(&self) -> Point {
        Point::new(self.x0 as i32, self.y0 as i32)
    }
}

impl Raster for GridView<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get(&self, x: u32, y: u32) -> Option<bool> {
        if x < self.width && y < self.height {
            self.grid.get(self.x0 + x, self.y0 + y)
        } else {
            None
        }
    }

    fn subimage(&self, x: u32, y: u32, width: u32, height: u32) -> Result<GridView<'_>> {
        check_view(x, y, width, height, self.width, self.height)?;
        Ok(GridView {
            grid: self.grid,
            x0: self.x0 + x,
            y0: self.y0 + y,
            width,
            height,
        })
    }
}
