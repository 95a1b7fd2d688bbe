use formscan::{
    CoordinateSystem, FormTemplate, FormTemplateBuilder, PixelGrid, Point, Polarity, Rectangle,
};
use formscan::Raster;
use image::DynamicImage;

/// Paper is light (`true`), ink is dark (`false`).
pub const PAPER: bool = true;
pub const INK: bool = false;

pub const FORM_WIDTH: u32 = 400;
pub const FORM_HEIGHT: u32 = 400;
pub const MARKER_SIZE: u32 = 16;

/// Marker centers of the synthetic form: origin, end of X, end of Y.
pub const MARKERS: [Point; 3] = [Point::new(40, 40), Point::new(300, 40), Point::new(40, 360)];

/// Outlines of the two field boxes printed on the synthetic form.
pub const FIELD_BOXES: [Rectangle; 2] = [
    Rectangle::new(100, 150, 121, 51),
    Rectangle::new(100, 250, 121, 51),
];

/// Builds a grid from rows where `#` is ink and anything else paper.
pub fn grid_from_ascii(rows: &[&str]) -> PixelGrid {
    let rows: Vec<Vec<bool>> = rows
        .iter()
        .map(|row| row.chars().map(|c| if c == '#' { INK } else { PAPER }).collect())
        .collect();
    PixelGrid::from_rows(&rows).expect("rows must have equal length")
}

/// Fills a `size x size` ink square centered on `center`.
pub fn draw_marker(grid: &mut PixelGrid, center: Point, size: u32) {
    let half = size as i32 / 2;
    grid.fill_rect(
        Rectangle::new(center.x - half, center.y - half, size as i32, size as i32),
        INK,
    );
}

/// Draws a one pixel ink outline along the edge of `rect`.
pub fn draw_box(grid: &mut PixelGrid, rect: Rectangle) {
    grid.fill_rect(Rectangle::new(rect.x, rect.y, rect.width, 1), INK);
    grid.fill_rect(Rectangle::new(rect.x, rect.bottom() - 1, rect.width, 1), INK);
    grid.fill_rect(Rectangle::new(rect.x, rect.y, 1, rect.height), INK);
    grid.fill_rect(Rectangle::new(rect.right() - 1, rect.y, 1, rect.height), INK);
}

/// Blank synthetic form: three markers and two empty field boxes.
pub fn blank_form() -> PixelGrid {
    let mut grid = PixelGrid::new(FORM_WIDTH, FORM_HEIGHT, PAPER);
    for marker in MARKERS {
        draw_marker(&mut grid, marker, MARKER_SIZE);
    }
    for field in FIELD_BOXES {
        draw_box(&mut grid, field);
    }
    grid
}

/// Blank form with two 5x5 blobs written into the first field.
pub fn filled_form() -> PixelGrid {
    let mut grid = blank_form();
    grid.fill_rect(Rectangle::new(130, 170, 5, 5), INK);
    grid.fill_rect(Rectangle::new(150, 170, 5, 5), INK);
    grid
}

/// Template authored from [`blank_form`] with a field inside each box.
pub fn synthetic_template() -> FormTemplate {
    let grid = blank_form();
    let mut builder = FormTemplateBuilder::from_raster(&grid, MARKERS, MARKER_SIZE, Polarity::DarkOnLight)
        .expect("markers of the blank form must be found");
    for field in FIELD_BOXES {
        let added = builder
            .add_field_at(&grid, field.center())
            .expect("field seed must be on paper");
        assert!(added);
    }
    builder.build()
}

/// Coordinate system built from the marker constants.
pub fn marker_frame() -> CoordinateSystem {
    CoordinateSystem::from_markers(&MARKERS).expect("markers are distinct")
}

/// Renders a grid as an 8-bit image the way a scanner would deliver it.
pub fn to_scan(grid: &PixelGrid) -> DynamicImage {
    DynamicImage::ImageLuma8(grid.to_luma())
}
