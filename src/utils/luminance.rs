//! Pixel frames and their reduction to a greyscale luminance source.
//!
//! Luminance uses fast integer arithmetic: `Y = (76*R + 150*G + 29*B) >> 8`.
//! Frames of at least [`PARALLEL_MIN_PIXELS`] are converted row-parallel
//! with rayon.

use rayon::prelude::*;

use crate::error::{Result, ScanError};

/// Coefficients for luminance conversion
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Frames with at least this many pixels are converted in parallel
pub const PARALLEL_MIN_PIXELS: usize = 640 * 480;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Borrowed pixel storage of a [`PixelFrame`]
#[derive(Debug, Clone, Copy)]
pub enum FrameData<'a> {
    /// 3 bytes per pixel
    Rgb(&'a [u8]),
    /// 4 bytes per pixel, alpha ignored
    Rgba(&'a [u8]),
    /// One packed `0xAARRGGBB` word per pixel
    Argb(&'a [u32]),
    /// 1 byte per pixel, already greyscale
    Luma(&'a [u8]),
}

impl FrameData<'_> {
    fn samples_per_pixel(&self) -> usize {
        match self {
            FrameData::Rgb(_) => 3,
            FrameData::Rgba(_) => 4,
            FrameData::Argb(_) | FrameData::Luma(_) => 1,
        }
    }

    fn len(&self) -> usize {
        match self {
            FrameData::Rgb(d) | FrameData::Rgba(d) | FrameData::Luma(d) => d.len(),
            FrameData::Argb(d) => d.len(),
        }
    }
}

/// A width x height colour buffer whose length has been validated
#[derive(Debug, Clone, Copy)]
pub struct PixelFrame<'a> {
    width: usize,
    height: usize,
    data: FrameData<'a>,
}

impl<'a> PixelFrame<'a> {
    /// Wrap `data`, checking it holds exactly `width * height` pixels
    pub fn new(data: FrameData<'a>, width: usize, height: usize) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(data.samples_per_pixel()))
            .unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(ScanError::InvalidFrame {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Raw RGB bytes
    pub fn rgb(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(FrameData::Rgb(data), width, height)
    }

    /// Raw RGBA bytes
    pub fn rgba(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(FrameData::Rgba(data), width, height)
    }

    /// Packed ARGB words
    pub fn argb(data: &'a [u32], width: usize, height: usize) -> Result<Self> {
        Self::new(FrameData::Argb(data), width, height)
    }

    /// Greyscale bytes
    pub fn luma(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(FrameData::Luma(data), width, height)
    }

    /// Borrow an RGBA image as a frame
    pub fn from_image(image: &'a image::RgbaImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            data: FrameData::Rgba(image.as_raw()),
        }
    }

    /// Frame width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height
    pub fn height(&self) -> usize {
        self.height
    }
}

/// Greyscale view of a frame, the input to every binarizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuminanceSource {
    width: usize,
    height: usize,
    luma: Vec<u8>,
}

impl LuminanceSource {
    /// Reduce a frame to luminance
    pub fn from_frame(frame: &PixelFrame<'_>) -> Self {
        let (width, height) = (frame.width, frame.height);
        let mut luma_buf = vec![0u8; width * height];
        if width > 0 {
            let convert = |(y, row): (usize, &mut [u8])| convert_row(&frame.data, width, y, row);
            if width * height >= PARALLEL_MIN_PIXELS {
                luma_buf.par_chunks_mut(width).enumerate().for_each(convert);
            } else {
                luma_buf.chunks_mut(width).enumerate().for_each(convert);
            }
        }
        Self {
            width,
            height,
            luma: luma_buf,
        }
    }

    /// Wrap an existing greyscale buffer
    pub fn from_luma(luma: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        PixelFrame::luma(&luma, width, height)?;
        Ok(Self {
            width,
            height,
            luma,
        })
    }

    /// Source width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Source height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luminance at (x, y); callers must stay in range
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.luma[y * self.width + x]
    }

    /// One row of luminance values
    pub fn row(&self, y: usize) -> &[u8] {
        &self.luma[y * self.width..(y + 1) * self.width]
    }

    /// Whole buffer, row-major
    pub fn as_slice(&self) -> &[u8] {
        &self.luma
    }

    /// Opaque greyscale RGBA copy, used as the overlay's result snapshot
    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let v = self.get(x as usize, y as usize);
            image::Rgba([v, v, v, 0xFF])
        })
    }
}

fn convert_row(data: &FrameData<'_>, width: usize, y: usize, row: &mut [u8]) {
    let start = y * width;
    match data {
        FrameData::Rgb(rgb) => {
            for (x, out) in row.iter_mut().enumerate() {
                let idx = (start + x) * 3;
                *out = luma(rgb[idx], rgb[idx + 1], rgb[idx + 2]);
            }
        }
        FrameData::Rgba(rgba) => {
            for (x, out) in row.iter_mut().enumerate() {
                let idx = (start + x) * 4;
                *out = luma(rgba[idx], rgba[idx + 1], rgba[idx + 2]);
            }
        }
        FrameData::Argb(argb) => {
            for (x, out) in row.iter_mut().enumerate() {
                let px = argb[start + x];
                *out = luma((px >> 16) as u8, (px >> 8) as u8, px as u8);
            }
        }
        FrameData::Luma(grey) => row.copy_from_slice(&grey[start..start + width]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_luminance() {
        let white = PixelFrame::rgb(&[255, 255, 255], 1, 1).unwrap();
        assert!(LuminanceSource::from_frame(&white).get(0, 0) >= 254);

        let black = PixelFrame::rgb(&[0, 0, 0], 1, 1).unwrap();
        assert_eq!(LuminanceSource::from_frame(&black).get(0, 0), 0);

        let red = PixelFrame::rgb(&[255, 0, 0], 1, 1).unwrap();
        let v = LuminanceSource::from_frame(&red).get(0, 0);
        assert!(v > 0 && v < 255);
    }

    #[test]
    fn test_argb_matches_rgba() {
        let argb = [0xFF_40_80_C0u32, 0x00_FF_FF_FF];
        let rgba = [0x40, 0x80, 0xC0, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
        let a = LuminanceSource::from_frame(&PixelFrame::argb(&argb, 2, 1).unwrap());
        let b = LuminanceSource::from_frame(&PixelFrame::rgba(&rgba, 2, 1).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_mismatched_buffer_is_rejected() {
        let err = PixelFrame::rgb(&[0u8; 10], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            ScanError::InvalidFrame {
                expected: 12,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        let err = PixelFrame::rgb(&[0u8; 4], usize::MAX / 2, 3).unwrap_err();
        assert!(matches!(
            err,
            ScanError::InvalidFrame {
                expected: usize::MAX,
                actual: 4,
                ..
            }
        ));
        assert!(PixelFrame::argb(&[0u32; 4], usize::MAX, usize::MAX).is_err());
    }

    #[test]
    fn test_parallel_path_matches_rows() {
        let (w, h) = (800, 600);
        let rgb: Vec<u8> = (0..w * h * 3).map(|i| (i % 251) as u8).collect();
        let source = LuminanceSource::from_frame(&PixelFrame::rgb(&rgb, w, h).unwrap());
        let idx = (599 * w + 799) * 3;
        assert_eq!(source.get(799, 599), luma(rgb[idx], rgb[idx + 1], rgb[idx + 2]));
        assert_eq!(source.row(10).len(), w);
    }

    #[test]
    fn test_to_image_is_opaque_grey() {
        let source = LuminanceSource::from_luma(vec![0, 90, 200, 255], 2, 2).unwrap();
        let image = source.to_image();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 1).0, [200, 200, 200, 255]);
    }
}
