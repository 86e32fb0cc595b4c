//! Preview bitmaps for the gallery

use super::placement::PagePlacement;
use crate::raster::fit_pixels;
use crate::types::*;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Apply the placement's orientation steps to a rasterized page.
///
/// The input already shows the page's intrinsic `/Rotate`; the remaining
/// steps match the PDF placement matrix in the same order.
pub fn orient_bitmap(page: &RgbaImage, placement: &PagePlacement) -> RgbaImage {
    let mut image = rotate_bitmap(page.clone(), placement.orientation_fix);

    if placement.spec.flip_horizontal {
        imageops::flip_horizontal_in_place(&mut image);
    }
    if placement.spec.flip_vertical {
        imageops::flip_vertical_in_place(&mut image);
    }

    rotate_bitmap(image, placement.spec.rotation)
}

fn rotate_bitmap(image: RgbaImage, rotation: Rotation) -> RgbaImage {
    match rotation {
        Rotation::None => image,
        Rotation::Clockwise90 => imageops::rotate90(&image),
        Rotation::Clockwise180 => imageops::rotate180(&image),
        Rotation::Clockwise270 => imageops::rotate270(&image),
    }
}

/// Pixel rectangle `(x, width)` of a half on a canvas `canvas_width` wide
fn half_columns(canvas_width: u32, half: Half) -> (u32, u32) {
    let left = canvas_width / 2;
    match half {
        Half::Left => (0, left),
        Half::Right => (left, canvas_width - left),
    }
}

/// Render a sheet face: white canvas with each placed page fitted and
/// centred in its half. Blank halves stay white.
pub fn render_preview(
    sheet: Size,
    max_dimension: u32,
    slots: &[(&PagePlacement, &RgbaImage)],
) -> RgbaImage {
    let (width, height) = fit_pixels(sheet, max_dimension);
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for (placement, page) in slots {
        let oriented = orient_bitmap(page, placement);
        let (x0, half_width) = half_columns(width, placement.half);
        if half_width == 0 {
            continue;
        }

        let scale = (half_width as f32 / oriented.width() as f32)
            .min(height as f32 / oriented.height() as f32);
        let w = ((oriented.width() as f32 * scale).round() as u32).clamp(1, half_width);
        let h = ((oriented.height() as f32 * scale).round() as u32).clamp(1, height);
        let resized = imageops::resize(&oriented, w, h, FilterType::Lanczos3);

        let x = x0 + (half_width - w) / 2;
        let y = (height - h) / 2;
        imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    }

    canvas
}

/// Write a preview bitmap as JPEG
pub fn save_jpeg(image: &RgbaImage, path: &Path, quality: u8) -> Result<()> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality).encode_image(&rgb)?;
    writer.flush()?;
    Ok(())
}
