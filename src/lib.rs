//! scanview - barcode scanning viewfinder overlay and QR decode pipeline
//!
//! Two halves that share a data model:
//! - [`overlay`]: the animated viewfinder drawn over a camera preview (mask,
//!   corner brackets, scan line or pulsing laser, fading candidate points,
//!   frozen result snapshot), rendered onto any [`overlay::Canvas`].
//! - [`pipeline`]: raw pixel buffer to text, hybrid binarization first and
//!   a global-histogram retry.
//!
//! Symbol encoding and decoding come from the `qrcode` and `rqrr` crates
//! behind [`codec::BarcodeCodec`].

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Camera collaborator traits and a manually driven preview
pub mod camera;
/// Barcode codec trait and the QR implementation
pub mod codec;
/// Overlay and decode configuration
pub mod config;
/// Barcode image generation
pub mod encoder;
/// Error type and result alias
pub mod error;
/// Core data structures (Rect, ResultPoint, BitMatrix, ScanResult, etc.)
pub mod models;
/// Viewfinder overlay renderer
pub mod overlay;
/// Frame decode pipeline
pub mod pipeline;
/// Decode session wiring pipeline, overlay and callback
pub mod session;
/// Image file helpers for the CLI and benches
pub mod tools;
/// Luminance conversion and binarizers
pub mod utils;

pub use camera::{CameraError, CameraPreview, ManualPreview, PreviewStateListener};
pub use codec::{BarcodeCodec, DecodeHints, EncodeHints, QrCodec};
pub use config::{DecodeConfig, OverlayConfig, ScanIndicator};
pub use encoder::BarcodeEncoder;
pub use error::{Result, ScanError};
pub use models::{BarcodeFormat, BitMatrix, ErrorCorrection, PreviewSize, Rect, ResultPoint, ScanResult};
pub use overlay::{Canvas, OverlayHandle, OverlayRenderer, ScanState};
pub use pipeline::DecodePipeline;
pub use session::{DecodeMode, ScanCallback, ScanSession};
pub use utils::luminance::{LuminanceSource, PixelFrame};

/// Decode a QR code from an RGB image with default settings
///
/// # Arguments
/// * `image` - Raw RGB bytes (3 bytes per pixel)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// The decoded symbol, or `None` when the frame holds none. A buffer whose
/// length does not match the dimensions is an error.
pub fn decode(image: &[u8], width: usize, height: usize) -> Result<Option<ScanResult>> {
    let frame = PixelFrame::rgb(image, width, height)?;
    Ok(DecodePipeline::new().decode(&frame))
}

/// Decode a QR code from an RGBA image with default settings
pub fn decode_rgba(image: &[u8], width: usize, height: usize) -> Result<Option<ScanResult>> {
    let frame = PixelFrame::rgba(image, width, height)?;
    Ok(DecodePipeline::new().decode(&frame))
}

/// Render `text` as a `size` x `size` QR image at EC level H with a
/// one-module margin
pub fn encode(text: &str, size: u32) -> Result<image::RgbaImage> {
    BarcodeEncoder::new().create_qr_code(text, size, codec::DEFAULT_MARGIN)
}
