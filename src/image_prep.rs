//! Fixed image normalization applied to every upload before extraction.
//!
//! Three stages, no knobs: decode any raster input, convert to 8-bit
//! grayscale, min-max contrast stretch, re-encode as lossless PNG.

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, ImageOutputFormat};
use std::io::Cursor;

/// Normalize an uploaded image for the model: grayscale, full-range contrast,
/// PNG bytes out.
pub fn normalize(input: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(input).context("Failed to decode uploaded image")?;
    let gray = stretch_contrast(decoded.to_luma8());

    let mut out = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
        .context("Failed to re-encode normalized image as PNG")?;
    Ok(out)
}

/// Linear min-max stretch to the full 0..=255 range. Flat images (min == max)
/// pass through unchanged.
fn stretch_contrast(mut img: GrayImage) -> GrayImage {
    let (mut min, mut max) = (u8::MAX, u8::MIN);
    for p in img.pixels() {
        min = min.min(p.0[0]);
        max = max.max(p.0[0]);
    }
    if min >= max {
        return img;
    }

    let range = (max - min) as u32;
    for p in img.pixels_mut() {
        let v = (p.0[0] - min) as u32;
        p.0[0] = ((v * 255 + range / 2) / range) as u8;
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn encode(img: RgbImage, format: ImageOutputFormat) -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), format)
            .unwrap();
        out
    }

    fn gradient() -> RgbImage {
        // Mid-gray band from 80 to 160, never touching the extremes.
        RgbImage::from_fn(16, 16, |x, _| {
            let v = 80 + (x * 5) as u8;
            image::Rgb([v, v, v])
        })
    }

    #[test]
    fn test_jpeg_input_becomes_grayscale_png() {
        let jpeg = encode(gradient(), ImageOutputFormat::Jpeg(90));
        let out = normalize(&jpeg).unwrap();

        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&out).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_contrast_is_stretched_to_full_range() {
        let png = encode(gradient(), ImageOutputFormat::Png);
        let out = normalize(&png).unwrap();

        let gray = image::load_from_memory(&out).unwrap().to_luma8();
        let values: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values.iter().min(), Some(&0));
        assert_eq!(values.iter().max(), Some(&255));
    }

    #[test]
    fn test_flat_image_passes_through() {
        let flat = RgbImage::from_pixel(8, 8, image::Rgb([120, 120, 120]));
        let out = normalize(&encode(flat, ImageOutputFormat::Png)).unwrap();

        let gray = image::load_from_memory(&out).unwrap().to_luma8();
        assert!(gray.pixels().all(|p| p.0[0] == 120));
    }

    #[test]
    fn test_garbage_input_is_an_error() {
        assert!(normalize(b"not an image").is_err());
    }
}
