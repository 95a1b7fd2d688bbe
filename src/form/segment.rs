use crate::config::SegmentFilter;
use crate::detection::labeling::label_components;
use crate::geometry::Region;
use crate::models::GlyphSegment;
use crate::raster::{Polarity, Raster};

/// Rows `(low, high)` bounding the dominant ink band of a field.
///
/// The band is found from the row histogram: it grows from the fullest row
/// until rows drop well below the peak.
pub fn ink_band(rows: &[u32], filter: &SegmentFilter) -> (usize, usize) {
    let Some(peak) = rows.iter().copied().max().filter(|&m| m > 0) else {
        return (0, rows.len());
    };
    let y_peak = rows.iter().position(|&c| c == peak).unwrap_or(0);
    let peak = peak as u64;

    let high = (y_peak..rows.len())
        .find(|&y| filter.upper_ratio as u64 * rows[y] as u64 <= peak)
        .unwrap_or(rows.len());
    let low = (1..y_peak)
        .rev()
        .find(|&y| filter.lower_ratio as u64 * rows[y] as u64 <= peak)
        .unwrap_or(0);
    (low, high)
}

struct FieldShape {
    width: i32,
    height: i32,
    band_low: i32,
    band_high: i32,
}

fn keep(region: &Region, shape: &FieldShape, filter: &SegmentFilter) -> bool {
    let bounds = region.bounding_rect();
    let fraction = filter.line_fraction.max(1);
    let tall = bounds.height > shape.height / fraction;
    let wide = bounds.width > shape.width / fraction;

    // vertical border lines
    if tall && (bounds.right() < filter.border_strip || bounds.right() >= shape.width - filter.border_strip) {
        return false;
    }
    // horizontal lines above or below the writing
    if wide && (bounds.bottom() < shape.band_low || bounds.bottom() >= shape.band_high) {
        return false;
    }

    if let Ok(center) = region.centroid()
        && center.y > shape.band_low
        && center.y < shape.band_high
        && (bounds.width < filter.min_width || bounds.height < filter.min_height)
    {
        return false;
    }

    region.len() >= filter.min_pixels
}

/// Splits a cropped field into glyph candidates, left to right.
pub fn segment_field(field: &dyn Raster, filter: &SegmentFilter, polarity: Polarity) -> Vec<GlyphSegment> {
    let (band_low, band_high) = ink_band(&field.row_histogram(polarity), filter);
    let shape = FieldShape {
        width: field.width() as i32,
        height: field.height() as i32,
        band_low: band_low as i32,
        band_high: band_high as i32,
    };

    let components = label_components(field, polarity);
    let total = components.len();
    let glyphs: Vec<GlyphSegment> = components
        .into_iter()
        .filter(|region| keep(region, &shape, filter))
        .map(|region| GlyphSegment {
            bounds: region.bounding_rect(),
            raster: region.to_grid(polarity),
        })
        .collect();

    log::debug!(
        "field {}x{}: band {}..{}, kept {} of {} components",
        shape.width,
        shape.height,
        band_low,
        band_high,
        glyphs.len(),
        total
    );
    glyphs
}
