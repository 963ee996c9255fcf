//! End-to-end tests for the decode pipeline.
//!
//! Codes are generated with the crate's own encoder, optionally degraded,
//! and fed back through the pipeline as raw pixel buffers.

use image::{Rgba, RgbaImage};
use scanview::codec::{BarcodeCodec, DecodeHints, QrCodec};
use scanview::models::BinarizerKind;
use scanview::utils::binarization::{Binarizer, GlobalHistogramBinarizer, HybridBinarizer};
use scanview::{
    BarcodeEncoder, BarcodeFormat, DecodeConfig, DecodePipeline, LuminanceSource, PixelFrame,
};

fn qr(text: &str, size: u32) -> RgbaImage {
    BarcodeEncoder::new()
        .create_qr_code(text, size, 1)
        .expect("text fits in a QR code")
}

/// Re-shade a black/white code as dark `105 + g` on light `128 + g`, where
/// `g` is a gentle left-to-right gradient constant inside each 8x8 block
fn low_contrast_luma(code: &RgbaImage) -> Vec<u8> {
    let (w, h) = code.dimensions();
    let mut luma = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            let g = ((x / 8) / 4).min(6) as u8;
            let dark = code.get_pixel(x, y).0[0] < 128;
            luma.push(if dark { 105 + g } else { 128 + g });
        }
    }
    luma
}

#[test]
fn test_hello_level_h_150px_round_trip() {
    let image = qr("HELLO", 150);
    assert_eq!(image.dimensions(), (150, 150));

    let result = DecodePipeline::new()
        .decode_image(&image)
        .expect("HELLO should decode");
    assert_eq!(result.text, "HELLO");
    assert_eq!(result.format, BarcodeFormat::QrCode);
    assert_eq!(result.binarizer, BinarizerKind::Hybrid);
    assert!(!result.points.is_empty());
}

#[test]
fn test_various_payloads_round_trip() {
    let pipeline = DecodePipeline::new();
    for text in [
        "HELLO",
        "1234567890",
        "scanview 0.1",
        "https://github.com/zxing/zxing",
        "Grüße aus Köln",
    ] {
        let image = qr(text, 300);
        let result = pipeline.decode_image(&image);
        assert_eq!(result.map(|r| r.text).as_deref(), Some(text), "payload {text:?}");
    }
}

#[test]
fn test_low_contrast_code_needs_global_histogram() {
    let code = qr("HELLO", 150);
    let luma = low_contrast_luma(&code);
    let source = LuminanceSource::from_luma(luma.clone(), 150, 150).unwrap();

    // Every block is flat to the hybrid strategy
    let hybrid = HybridBinarizer.binarize(&source).unwrap();
    assert_eq!(hybrid.count_set(), 0);
    assert!(QrCodec.decode(&hybrid, &DecodeHints::default()).is_err());

    let global = GlobalHistogramBinarizer.binarize(&source).unwrap();
    let decoded = QrCodec
        .decode(&global, &DecodeHints::default())
        .expect("global threshold separates the shades");
    assert_eq!(decoded.text, "HELLO");

    let frame = PixelFrame::luma(&luma, 150, 150).unwrap();
    let result = DecodePipeline::new().decode(&frame).expect("fallback decodes");
    assert_eq!(result.text, "HELLO");
    assert_eq!(result.binarizer, BinarizerKind::GlobalHistogram);
}

#[test]
fn test_argb_frame_decodes() {
    let image = qr("argb frame", 200);
    let argb: Vec<u32> = image
        .pixels()
        .map(|Rgba([r, g, b, a])| {
            (*a as u32) << 24 | (*r as u32) << 16 | (*g as u32) << 8 | *b as u32
        })
        .collect();
    let frame = PixelFrame::argb(&argb, 200, 200).unwrap();
    let result = DecodePipeline::new().decode(&frame);
    assert_eq!(result.map(|r| r.text).as_deref(), Some("argb frame"));
}

#[test]
fn test_rgb_frame_with_offset_code() {
    // Code pasted off-centre onto a larger grey canvas
    let code = qr("offset", 120);
    let mut canvas = image::RgbImage::from_pixel(320, 240, image::Rgb([200, 200, 200]));
    for (x, y, px) in code.enumerate_pixels() {
        canvas.put_pixel(x + 150, y + 60, image::Rgb([px.0[0], px.0[1], px.0[2]]));
    }
    let frame = PixelFrame::rgb(canvas.as_raw(), 320, 240).unwrap();
    let result = DecodePipeline::new().decode(&frame).expect("code found");
    assert_eq!(result.text, "offset");
    for point in &result.points {
        assert!(point.x >= 140.0 && point.x <= 280.0, "x {}", point.x);
    }
}

#[test]
fn test_code_with_logo_still_decodes() {
    let logo = RgbaImage::from_pixel(100, 100, Rgba([200, 40, 40, 255]));
    let image = BarcodeEncoder::new()
        .create_qr_code_with_logo("https://example.com", 500, &logo)
        .unwrap();
    // The logo is really there
    let [r, g, _, _] = image.get_pixel(250, 250).0;
    assert!(r > 150 && g < 100);

    let result = DecodePipeline::new().decode_image(&image);
    assert_eq!(result.map(|r| r.text).as_deref(), Some("https://example.com"));
}

#[test]
fn test_blank_and_noise_frames_are_none() {
    let pipeline = DecodePipeline::new();
    let white = vec![255u8; 100 * 100];
    assert!(pipeline.decode(&PixelFrame::luma(&white, 100, 100).unwrap()).is_none());

    let mut state = 0x2545_f491u32;
    let noise: Vec<u8> = (0..100 * 100)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    assert!(pipeline.decode(&PixelFrame::luma(&noise, 100, 100).unwrap()).is_none());
}

#[test]
fn test_empty_format_allow_list_rejects_everything() {
    let config = DecodeConfig {
        formats: Vec::new(),
        ..DecodeConfig::default()
    };
    let image = qr("HELLO", 150);
    assert!(DecodePipeline::with_config(&config).decode_image(&image).is_none());
}
