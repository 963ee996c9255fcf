//! Pixel buffer to text: luminance, binarization, codec, with one fallback.
//!
//! The primary pass uses the block-adaptive [`HybridBinarizer`]. Any codec
//! failure (nothing located, checksum, malformed contents) re-binarizes
//! the same luminance source with the [`GlobalHistogramBinarizer`] and
//! tries once more. A frame without a barcode is the common case and is
//! reported as `None`, never as an error.

use log::{debug, trace};

use crate::codec::{BarcodeCodec, CodecFailure, DecodeHints, QrCodec};
use crate::config::DecodeConfig;
use crate::models::{ResultPoint, ScanResult};
use crate::utils::binarization::{Binarizer, GlobalHistogramBinarizer, HybridBinarizer};
use crate::utils::luminance::{LuminanceSource, PixelFrame};

/// Outcome of decoding one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDecode {
    /// Final result, when a symbol decoded
    pub result: Option<ScanResult>,
    /// Candidate points seen during the attempts, deduplicated by position
    pub possible_points: Vec<ResultPoint>,
}

/// Two-strategy decode pipeline
pub struct DecodePipeline {
    codec: Box<dyn BarcodeCodec>,
    primary: Box<dyn Binarizer>,
    fallback: Box<dyn Binarizer>,
    hints: DecodeHints,
}

impl DecodePipeline {
    /// QR codec, hybrid then global-histogram binarization, default hints
    pub fn new() -> Self {
        Self::with_config(&DecodeConfig::default())
    }

    /// Pipeline using the given decode configuration
    pub fn with_config(config: &DecodeConfig) -> Self {
        Self {
            codec: Box::new(QrCodec),
            primary: Box::new(HybridBinarizer),
            fallback: Box::new(GlobalHistogramBinarizer),
            hints: config.hints(),
        }
    }

    /// Replace the codec
    pub fn with_codec(mut self, codec: impl BarcodeCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Replace the primary and fallback binarizers
    pub fn with_binarizers(
        mut self,
        primary: impl Binarizer + 'static,
        fallback: impl Binarizer + 'static,
    ) -> Self {
        self.primary = Box::new(primary);
        self.fallback = Box::new(fallback);
        self
    }

    /// Hints passed to the codec
    pub fn hints(&self) -> &DecodeHints {
        &self.hints
    }

    /// Decode a frame to text
    pub fn decode(&self, frame: &PixelFrame<'_>) -> Option<ScanResult> {
        self.decode_frame(frame).result
    }

    /// Decode an RGBA image to text
    pub fn decode_image(&self, image: &image::RgbaImage) -> Option<ScanResult> {
        self.decode(&PixelFrame::from_image(image))
    }

    /// Decode a frame, also reporting candidate points
    pub fn decode_frame(&self, frame: &PixelFrame<'_>) -> FrameDecode {
        let source = LuminanceSource::from_frame(frame);
        self.decode_source(&source)
    }

    /// Decode an existing luminance source
    pub fn decode_source(&self, source: &LuminanceSource) -> FrameDecode {
        let mut outcome = FrameDecode::default();
        for binarizer in [self.primary.as_ref(), self.fallback.as_ref()] {
            match self.attempt(binarizer, source) {
                Ok(result) => {
                    debug!(
                        "decoded {} chars with {:?} binarizer",
                        result.text.len(),
                        result.binarizer
                    );
                    merge_points(&mut outcome.possible_points, &result.points);
                    outcome.result = Some(result);
                    return outcome;
                }
                Err(failure) => {
                    trace!("{:?} binarizer attempt failed: {failure:?}", binarizer.kind());
                    merge_points(&mut outcome.possible_points, failure.points());
                }
            }
        }
        trace!("no barcode in {}x{} frame", source.width(), source.height());
        outcome
    }

    fn attempt(
        &self,
        binarizer: &dyn Binarizer,
        source: &LuminanceSource,
    ) -> Result<ScanResult, CodecFailure> {
        let binary = binarizer.binarize(source).ok_or(CodecFailure::NotFound)?;
        let decoded = self.codec.decode(&binary, &self.hints)?;
        Ok(ScanResult {
            text: decoded.text,
            format: decoded.format,
            points: decoded.points,
            binarizer: binarizer.kind(),
        })
    }
}

impl Default for DecodePipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_points(into: &mut Vec<ResultPoint>, points: &[ResultPoint]) {
    for point in points {
        if !into.contains(point) {
            into.push(*point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decoded, EncodeHints};
    use crate::error::Result;
    use crate::models::{BarcodeFormat, BinarizerKind, BitMatrix};

    /// Succeeds only on matrices with a black top-left pixel
    #[derive(Default)]
    struct CornerCodec;

    impl BarcodeCodec for CornerCodec {
        fn encode(
            &self,
            _text: &str,
            _format: BarcodeFormat,
            width: u32,
            height: u32,
            _hints: &EncodeHints,
        ) -> Result<BitMatrix> {
            Ok(BitMatrix::new(width as usize, height as usize))
        }

        fn decode(
            &self,
            binary: &BitMatrix,
            _hints: &DecodeHints,
        ) -> std::result::Result<Decoded, CodecFailure> {
            if binary.get(0, 0) {
                Ok(Decoded {
                    text: "corner".to_string(),
                    format: BarcodeFormat::QrCode,
                    points: vec![ResultPoint::new(0.0, 0.0)],
                })
            } else {
                Err(CodecFailure::Checksum {
                    points: vec![ResultPoint::new(1.0, 2.0)],
                })
            }
        }
    }

    /// Paints the whole matrix one colour
    struct Fixed(bool, BinarizerKind);

    impl Binarizer for Fixed {
        fn kind(&self) -> BinarizerKind {
            self.1
        }

        fn binarize(&self, source: &LuminanceSource) -> Option<BitMatrix> {
            let black = self.0;
            Some(BitMatrix::from_fn(source.width(), source.height(), |_, _| black))
        }
    }

    fn gray_frame() -> Vec<u8> {
        vec![128u8; 4 * 4]
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let pipeline = DecodePipeline::new()
            .with_codec(CornerCodec)
            .with_binarizers(
                Fixed(true, BinarizerKind::Hybrid),
                Fixed(false, BinarizerKind::GlobalHistogram),
            );
        let luma = gray_frame();
        let result = pipeline.decode(&PixelFrame::luma(&luma, 4, 4).unwrap()).unwrap();
        assert_eq!(result.text, "corner");
        assert_eq!(result.binarizer, BinarizerKind::Hybrid);
    }

    #[test]
    fn test_fallback_used_after_primary_failure() {
        let pipeline = DecodePipeline::new()
            .with_codec(CornerCodec)
            .with_binarizers(
                Fixed(false, BinarizerKind::Hybrid),
                Fixed(true, BinarizerKind::GlobalHistogram),
            );
        let luma = gray_frame();
        let outcome = pipeline.decode_frame(&PixelFrame::luma(&luma, 4, 4).unwrap());
        let result = outcome.result.unwrap();
        assert_eq!(result.binarizer, BinarizerKind::GlobalHistogram);
        // Candidate from the failed pass plus the final corners
        assert_eq!(
            outcome.possible_points,
            vec![ResultPoint::new(1.0, 2.0), ResultPoint::new(0.0, 0.0)]
        );
    }

    #[test]
    fn test_both_failing_is_none_with_points() {
        let pipeline = DecodePipeline::new()
            .with_codec(CornerCodec)
            .with_binarizers(
                Fixed(false, BinarizerKind::Hybrid),
                Fixed(false, BinarizerKind::GlobalHistogram),
            );
        let luma = gray_frame();
        let outcome = pipeline.decode_frame(&PixelFrame::luma(&luma, 4, 4).unwrap());
        assert!(outcome.result.is_none());
        assert_eq!(outcome.possible_points, vec![ResultPoint::new(1.0, 2.0)]);
    }

    #[test]
    fn test_blank_frame_is_not_found() {
        let luma = vec![255u8; 64 * 64];
        let frame = PixelFrame::luma(&luma, 64, 64).unwrap();
        assert!(DecodePipeline::new().decode(&frame).is_none());
    }
}
