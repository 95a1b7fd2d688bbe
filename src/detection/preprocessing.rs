use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use serde::{Deserialize, Serialize};

use crate::raster::{PixelGrid, Polarity, Raster};

/// Intensity level separating the two halves of an 8-bit rendering of a
/// binary raster.
const MID_LEVEL: u8 = 127;

/// Ways of collapsing a colour pixel to a single intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrayscaleMethod {
    /// `(r + g + b) / 3`
    Average,
    /// The `image` crate's Rec. 709 luma conversion
    #[default]
    Luminance,
    /// `0.21 r + 0.71 g + 0.07 b`
    WeightedLuminance,
    Red,
    Green,
    Blue,
    MaxDecomposition,
    MinDecomposition,
    /// `(max + min) / 2`
    Desaturation,
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage, method: GrayscaleMethod) -> GrayImage {
    let mix: fn(u8, u8, u8) -> u8 = match method {
        GrayscaleMethod::Luminance => return img.to_luma8(),
        GrayscaleMethod::Average => |r, g, b| ((r as u16 + g as u16 + b as u16) / 3) as u8,
        GrayscaleMethod::WeightedLuminance => {
            |r, g, b| (0.21 * r as f32 + 0.71 * g as f32 + 0.07 * b as f32) as u8
        }
        GrayscaleMethod::Red => |r, _, _| r,
        GrayscaleMethod::Green => |_, g, _| g,
        GrayscaleMethod::Blue => |_, _, b| b,
        GrayscaleMethod::MaxDecomposition => |r, g, b| r.max(g).max(b),
        GrayscaleMethod::MinDecomposition => |r, g, b| r.min(g).min(b),
        GrayscaleMethod::Desaturation => {
            |r, g, b| ((r.max(g).max(b) as u16 + r.min(g).min(b) as u16) / 2) as u8
        }
    };

    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([mix(r, g, b)])
    })
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// How the binarization threshold is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Threshold {
    /// Pixels brighter than the value become light
    Global(u8),
    /// Otsu's method on the grayscale histogram
    Otsu,
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Global(250)
    }
}

/// Converts a scanned page into a monochrome raster.
pub trait Binarizer: Send + Sync {
    fn to_grayscale(&self, img: &DynamicImage) -> GrayImage;

    fn to_binary(&self, gray: &GrayImage) -> PixelGrid;

    fn binarize(&self, img: &DynamicImage) -> PixelGrid {
        self.to_binary(&self.to_grayscale(img))
    }
}

/// Grayscale conversion followed by an optional blur and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdBinarizer {
    pub grayscale: GrayscaleMethod,
    pub threshold: Threshold,
    pub blur_sigma: Option<f32>,
}

impl Binarizer for ThresholdBinarizer {
    fn to_grayscale(&self, img: &DynamicImage) -> GrayImage {
        let gray = to_grayscale(img, self.grayscale);
        match self.blur_sigma {
            Some(sigma) if sigma > 0.0 => apply_blur(&gray, sigma),
            _ => gray,
        }
    }

    fn to_binary(&self, gray: &GrayImage) -> PixelGrid {
        let level = match self.threshold {
            Threshold::Global(level) => level,
            Threshold::Otsu => otsu_level(gray),
        };
        log::debug!("binarizing {}x{} at level {}", gray.width(), gray.height(), level);
        PixelGrid::from_luma(gray, level)
    }
}

fn luma_of(value: bool) -> Luma<u8> {
    if value { Luma([255u8]) } else { Luma([0u8]) }
}

/// Rotates a binary raster clockwise (in image coordinates) about its center
/// with bicubic resampling, then re-binarizes. Exposed corners take the
/// background colour.
pub fn rotate(image: &dyn Raster, theta: f64, polarity: Polarity) -> PixelGrid {
    let rotated = rotate_about_center(
        &image.to_luma(),
        theta as f32,
        Interpolation::Bicubic,
        luma_of(polarity.background()),
    );
    PixelGrid::from_luma(&rotated, MID_LEVEL)
}

/// Scales a glyph to fit a `size x size` square, keeping its aspect ratio,
/// and centers it on a background canvas.
pub fn normalize_glyph(glyph: &dyn Raster, size: u32, polarity: Polarity) -> PixelGrid {
    let background = luma_of(polarity.background());
    let mut canvas = GrayImage::from_pixel(size, size, background);

    let (width, height) = (glyph.width(), glyph.height());
    if width > 0 && height > 0 && size > 0 {
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let scaled_w = ((width as f32 * scale) as u32).clamp(1, size);
        let scaled_h = ((height as f32 * scale) as u32).clamp(1, size);

        let scaled = imageops::resize(&glyph.to_luma(), scaled_w, scaled_h, FilterType::CatmullRom);
        let offset_x = (size - scaled_w) / 2;
        let offset_y = (size - scaled_h) / 2;
        imageops::overlay(&mut canvas, &scaled, offset_x.into(), offset_y.into());
    }

    PixelGrid::from_luma(&canvas, MID_LEVEL)
}
