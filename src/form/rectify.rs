//! Maps template geometry onto a scan's coordinate system.

use std::f64::consts::PI;

use crate::config::Margins;
use crate::detection::preprocessing;
use crate::error::{FormError, Result};
use crate::geometry::{CoordinateSystem, Line, Point, Rectangle};
use crate::raster::{GridView, PixelGrid, Polarity, Raster};

/// Direction of a line in `[0, 2π)`, image coordinates.
pub fn line_angle(line: &Line) -> f64 {
    line.angle()
}

fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(2.0 * PI);
    if wrapped > PI { wrapped - 2.0 * PI } else { wrapped }
}

/// Rotation that turns the scan's Y axis onto the template's, in `(-π, π]`.
pub fn rotation_angle(template: &CoordinateSystem, scan: &CoordinateSystem) -> f64 {
    wrap_angle(line_angle(&template.y_axis()) - line_angle(&scan.y_axis()))
}

/// Rotates the whole scan about its center by `angle`.
pub fn align(image: &dyn Raster, angle: f64, polarity: Polarity) -> PixelGrid {
    log::debug!("rotating {}x{} scan by {:.4} rad", image.width(), image.height(), angle);
    preprocessing::rotate(image, angle, polarity)
}

/// Maps a template point into the scan frame: translate to the template
/// origin, rotate, scale by the axis length ratios, translate to the scan
/// origin.
pub fn map_point(point: Point, template: &CoordinateSystem, scan: &CoordinateSystem) -> (f64, f64) {
    let theta = line_angle(&scan.y_axis()) - line_angle(&template.y_axis());
    let scale_x = scan.x_axis().length() / template.x_axis().length();
    let scale_y = scan.y_axis().length() / template.y_axis().length();
    let (sin, cos) = theta.sin_cos();

    let dx = (point.x - template.origin().x) as f64;
    let dy = (point.y - template.origin().y) as f64;
    let rx = dx * cos - dy * sin;
    let ry = dx * sin + dy * cos;

    (
        rx * scale_x + scan.origin().x as f64,
        ry * scale_y + scan.origin().y as f64,
    )
}

/// Maps a template field rectangle onto the scan. Both corners are mapped;
/// the result spans them.
pub fn map_rectangle(rect: Rectangle, template: &CoordinateSystem, scan: &CoordinateSystem) -> Rectangle {
    let (x0, y0) = map_point(Point::new(rect.x, rect.y), template, scan);
    let (x1, y1) = map_point(Point::new(rect.right(), rect.bottom()), template, scan);

    let (x0, y0) = (x0.round() as i32, y0.round() as i32);
    let (x1, y1) = (x1.round() as i32, y1.round() as i32);
    Rectangle::new(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
}

/// Shrinks a mapped field rectangle by the margins.
pub fn crop_window(field: usize, mapped: Rectangle, margins: &Margins) -> Result<Rectangle> {
    let window = Rectangle::new(
        mapped.x + margins.left,
        mapped.y + margins.top,
        mapped.width - margins.left - margins.right,
        mapped.height - margins.top - margins.bottom,
    );
    if window.is_empty() {
        return Err(FormError::Cropping {
            field,
            reason: format!("window {mapped} is smaller than the margins"),
        });
    }
    Ok(window)
}

/// View of a crop window, or a cropping failure for `field` when the window
/// leaves the raster.
pub fn crop_field<'a>(image: &'a dyn Raster, field: usize, window: Rectangle) -> Result<GridView<'a>> {
    image.view_of(window).map_err(|e| FormError::Cropping {
        field,
        reason: e.to_string(),
    })
}
