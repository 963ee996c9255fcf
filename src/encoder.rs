//! Barcode image generation: codec matrix to ARGB bitmap, optional logo.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::debug;

use crate::codec::{BarcodeCodec, EncodeHints, QrCodec};
use crate::error::Result;
use crate::models::{BarcodeFormat, BitMatrix};

/// Colour of dark modules
pub const FOREGROUND: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);
/// Colour of light modules and the quiet zone
pub const BACKGROUND: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

/// Default side length of generated codes
pub const DEFAULT_SIZE: u32 = 150;
/// Default side length of codes carrying a logo
pub const DEFAULT_LOGO_CODE_SIZE: u32 = 500;
/// Logos are scaled to at most 1/LOGO_FRACTION of the code's side
pub const LOGO_FRACTION: u32 = 5;

/// Render a matrix as an opaque black-on-white bitmap
pub fn matrix_to_image(matrix: &BitMatrix) -> RgbaImage {
    RgbaImage::from_fn(matrix.width() as u32, matrix.height() as u32, |x, y| {
        if matrix.get(x as usize, y as usize) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

/// Composite `logo` at the centre of `base`, scaled to at most one fifth
/// of the base's width and height.
///
/// Only the pixels under the logo change. A zero-sized base or logo leaves
/// the base untouched.
pub fn add_logo(mut base: RgbaImage, logo: &RgbaImage) -> RgbaImage {
    let (base_w, base_h) = base.dimensions();
    let (logo_w, logo_h) = logo.dimensions();
    if base_w == 0 || base_h == 0 || logo_w == 0 || logo_h == 0 {
        debug!("add_logo: skipping empty image ({base_w}x{base_h} base, {logo_w}x{logo_h} logo)");
        return base;
    }

    let scale = (base_w as f32 / LOGO_FRACTION as f32 / logo_w as f32)
        .min(base_h as f32 / LOGO_FRACTION as f32 / logo_h as f32);
    let target_w = ((logo_w as f32 * scale).floor() as u32).clamp(1, base_w);
    let target_h = ((logo_h as f32 * scale).floor() as u32).clamp(1, base_h);
    let scaled = imageops::resize(logo, target_w, target_h, FilterType::Triangle);

    let x = (base_w - target_w) / 2;
    let y = (base_h - target_h) / 2;
    imageops::overlay(&mut base, &scaled, x as i64, y as i64);
    base
}

/// Generates barcode bitmaps through a [`BarcodeCodec`]
pub struct BarcodeEncoder {
    codec: Box<dyn BarcodeCodec>,
}

impl BarcodeEncoder {
    /// Encoder backed by the bundled QR codec
    pub fn new() -> Self {
        Self {
            codec: Box::new(QrCodec),
        }
    }

    /// Encoder backed by a custom codec
    pub fn with_codec(codec: impl BarcodeCodec + 'static) -> Self {
        Self {
            codec: Box::new(codec),
        }
    }

    /// Encode `text` into a `width` x `height` matrix
    pub fn encode(
        &self,
        text: &str,
        format: BarcodeFormat,
        width: u32,
        height: u32,
        hints: &EncodeHints,
    ) -> Result<BitMatrix> {
        self.codec.encode(text, format, width, height, hints)
    }

    /// Encode `text` into a `width` x `height` bitmap
    pub fn encode_bitmap(
        &self,
        text: &str,
        format: BarcodeFormat,
        width: u32,
        height: u32,
        hints: &EncodeHints,
    ) -> Result<RgbaImage> {
        let matrix = self.encode(text, format, width, height, hints)?;
        Ok(matrix_to_image(&matrix))
    }

    /// Square QR code at EC level H with the given quiet zone
    pub fn create_qr_code(&self, text: &str, size: u32, margin: u32) -> Result<RgbaImage> {
        self.encode_bitmap(
            text,
            BarcodeFormat::QrCode,
            size,
            size,
            &EncodeHints::with_margin(margin),
        )
    }

    /// Square QR code at EC level H with `logo` composited in the centre
    pub fn create_qr_code_with_logo(
        &self,
        text: &str,
        size: u32,
        logo: &RgbaImage,
    ) -> Result<RgbaImage> {
        let code = self.create_qr_code(text, size, 1)?;
        Ok(add_logo(code, logo))
    }
}

impl Default for BarcodeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_qr_code_dimensions_and_colors() {
        let image = BarcodeEncoder::new().create_qr_code("HELLO", 150, 1).unwrap();
        assert_eq!(image.dimensions(), (150, 150));
        assert!(image.pixels().all(|p| *p == FOREGROUND || *p == BACKGROUND));
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn test_add_logo_touches_only_center() {
        let base = RgbaImage::from_pixel(100, 100, BACKGROUND);
        let logo = RgbaImage::from_pixel(50, 50, Rgba([0xFF, 0x00, 0x00, 0xFF]));
        let out = add_logo(base, &logo);
        // 100 / 5 = 20px logo at 40..60
        assert_eq!(*out.get_pixel(50, 50), Rgba([0xFF, 0x00, 0x00, 0xFF]));
        assert_eq!(*out.get_pixel(39, 50), BACKGROUND);
        assert_eq!(*out.get_pixel(60, 50), BACKGROUND);
    }

    #[test]
    fn test_add_logo_blends_transparent_pixels() {
        let base = RgbaImage::from_pixel(50, 50, FOREGROUND);
        let logo = RgbaImage::from_pixel(10, 10, Rgba([0xFF, 0xFF, 0xFF, 0x00]));
        let out = add_logo(base.clone(), &logo);
        assert_eq!(out, base);
    }

    #[test]
    fn test_add_logo_ignores_empty_inputs() {
        let base = RgbaImage::from_pixel(20, 20, BACKGROUND);
        assert_eq!(add_logo(base.clone(), &RgbaImage::new(0, 0)), base);
        let empty = RgbaImage::new(0, 0);
        assert_eq!(add_logo(empty.clone(), &base), empty);
    }

    #[test]
    fn test_logo_larger_than_code_is_scaled_down() {
        let base = RgbaImage::from_pixel(60, 60, BACKGROUND);
        let logo = RgbaImage::from_pixel(600, 300, Rgba([0x00, 0x00, 0xFF, 0xFF]));
        let out = add_logo(base, &logo);
        let blue = out
            .pixels()
            .filter(|p| **p == Rgba([0x00, 0x00, 0xFF, 0xFF]))
            .count();
        assert!(blue > 0 && blue <= 12 * 6);
    }
}
