//! Boundary to the external barcode codec.
//!
//! Symbol encoding comes from the `qrcode` crate and symbol decoding from
//! `rqrr`; this module only adapts them to [`BitMatrix`] in and out and
//! maps their failures onto [`CodecFailure`].

use log::trace;

use crate::error::{Result, ScanError};
use crate::models::{BarcodeFormat, BitMatrix, ErrorCorrection, ResultPoint};

/// Default quiet-zone width in modules
pub const DEFAULT_MARGIN: u32 = 1;

/// Options controlling symbol generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeHints {
    /// Character set of the payload; only UTF-8 is supported
    pub character_set: String,
    /// Error-correction level
    pub error_correction: ErrorCorrection,
    /// Quiet zone width in modules
    pub margin: u32,
}

impl Default for EncodeHints {
    fn default() -> Self {
        Self {
            character_set: "utf-8".to_string(),
            error_correction: ErrorCorrection::H,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl EncodeHints {
    /// Hints with the given quiet-zone width
    pub fn with_margin(margin: u32) -> Self {
        Self {
            margin,
            ..Self::default()
        }
    }
}

/// Options controlling symbol recognition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeHints {
    /// Formats the caller accepts
    pub formats: Vec<BarcodeFormat>,
    /// Try every detected grid instead of stopping at the first
    pub try_harder: bool,
    /// Expected character set of the payload
    pub character_set: String,
}

impl Default for DecodeHints {
    fn default() -> Self {
        Self {
            formats: BarcodeFormat::all(),
            try_harder: true,
            character_set: "utf-8".to_string(),
        }
    }
}

/// Why a decode attempt produced no text
#[derive(Debug, Clone, PartialEq)]
pub enum CodecFailure {
    /// No symbol located
    NotFound,
    /// Symbol located but error correction failed
    Checksum {
        /// Corners of the located symbol
        points: Vec<ResultPoint>,
    },
    /// Symbol located but its contents were malformed
    Format {
        /// Corners of the located symbol
        points: Vec<ResultPoint>,
    },
}

impl CodecFailure {
    /// Candidate points gathered before the failure
    pub fn points(&self) -> &[ResultPoint] {
        match self {
            CodecFailure::NotFound => &[],
            CodecFailure::Checksum { points } | CodecFailure::Format { points } => points,
        }
    }
}

/// Text and location of a decoded symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Decoded payload
    pub text: String,
    /// Symbology
    pub format: BarcodeFormat,
    /// Symbol corners
    pub points: Vec<ResultPoint>,
}

/// External barcode codec
pub trait BarcodeCodec: Send + Sync {
    /// Render `text` as a `width` x `height` matrix, symbol centred inside
    /// the quiet zone requested by `hints`
    fn encode(
        &self,
        text: &str,
        format: BarcodeFormat,
        width: u32,
        height: u32,
        hints: &EncodeHints,
    ) -> Result<BitMatrix>;

    /// Recognise a symbol in an already binarized image
    fn decode(
        &self,
        binary: &BitMatrix,
        hints: &DecodeHints,
    ) -> std::result::Result<Decoded, CodecFailure>;
}

/// QR codec backed by `qrcode` (encode) and `rqrr` (decode)
#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodec;

impl BarcodeCodec for QrCodec {
    fn encode(
        &self,
        text: &str,
        format: BarcodeFormat,
        width: u32,
        height: u32,
        hints: &EncodeHints,
    ) -> Result<BitMatrix> {
        let encode_error = |reason: String| ScanError::Encode {
            text_len: text.len(),
            width,
            height,
            ec_level: hints.error_correction,
            reason,
        };
        if format != BarcodeFormat::QrCode {
            return Err(ScanError::UnsupportedFormat(format!("{format:?}")));
        }
        if !hints.character_set.eq_ignore_ascii_case("utf-8")
            && !hints.character_set.eq_ignore_ascii_case("utf8")
        {
            return Err(encode_error(format!(
                "unsupported character set {}",
                hints.character_set
            )));
        }
        if text.is_empty() {
            return Err(encode_error("empty contents".to_string()));
        }

        let code = qrcode::QrCode::with_error_correction_level(
            text.as_bytes(),
            hints.error_correction.into(),
        )
        .map_err(|e| encode_error(e.to_string()))?;

        let modules = code.width();
        let colors = code.to_colors();
        let quiet = hints.margin as usize * 2;
        let input_size = modules + quiet;
        let (width, height) = (width as usize, height as usize);
        let output_width = width.max(input_size);
        let output_height = height.max(input_size);
        let multiple = (output_width / input_size).min(output_height / input_size);
        let left_padding = (output_width - modules * multiple) / 2;
        let top_padding = (output_height - modules * multiple) / 2;
        trace!(
            "encode: {modules} modules, {multiple}px per module, padding {left_padding}x{top_padding}"
        );

        let mut matrix = BitMatrix::new(output_width, output_height);
        for (i, color) in colors.iter().enumerate() {
            if *color == qrcode::Color::Dark {
                let (mx, my) = (i % modules, i / modules);
                matrix.set_region(
                    left_padding + mx * multiple,
                    top_padding + my * multiple,
                    multiple,
                    multiple,
                );
            }
        }
        Ok(matrix)
    }

    fn decode(
        &self,
        binary: &BitMatrix,
        hints: &DecodeHints,
    ) -> std::result::Result<Decoded, CodecFailure> {
        if !hints.formats.contains(&BarcodeFormat::QrCode) {
            return Err(CodecFailure::NotFound);
        }
        let mut prepared =
            rqrr::PreparedImage::prepare_from_bitmap(binary.width(), binary.height(), |x, y| {
                binary.get(x, y)
            });
        let grids = prepared.detect_grids();
        trace!("decode: {} grid candidates", grids.len());

        let mut failure = CodecFailure::NotFound;
        for grid in &grids {
            let points: Vec<ResultPoint> = grid.bounds.iter().map(|&p| p.into()).collect();
            match grid.decode() {
                Ok((_, text)) => {
                    return Ok(Decoded {
                        text,
                        format: BarcodeFormat::QrCode,
                        points,
                    });
                }
                Err(err) => {
                    trace!("decode: grid rejected: {err:?}");
                    failure = match err {
                        rqrr::DeQRError::DataEcc | rqrr::DeQRError::FormatEcc => {
                            CodecFailure::Checksum { points }
                        }
                        _ => CodecFailure::Format { points },
                    };
                }
            }
            if !hints.try_harder {
                break;
            }
        }
        Err(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_fills_requested_size() {
        let matrix = QrCodec
            .encode(
                "HELLO",
                BarcodeFormat::QrCode,
                150,
                150,
                &EncodeHints::with_margin(1),
            )
            .unwrap();
        assert_eq!(matrix.width(), 150);
        assert_eq!(matrix.height(), 150);
        // Version 1 is 21 modules, 23 with the margin: 6px modules, symbol at 12..138
        assert!(!matrix.get(11, 11));
        assert!(matrix.get(12, 12));
        assert!(matrix.get(137, 12));
        assert!(!matrix.get(138, 12));
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let text = "x".repeat(4000);
        let err = QrCodec
            .encode(
                &text,
                BarcodeFormat::QrCode,
                200,
                200,
                &EncodeHints::default(),
            )
            .unwrap_err();
        match err {
            ScanError::Encode {
                text_len, ec_level, ..
            } => {
                assert_eq!(text_len, 4000);
                assert_eq!(ec_level, ErrorCorrection::H);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_encode_rejects_empty_text() {
        assert!(
            QrCodec
                .encode("", BarcodeFormat::QrCode, 100, 100, &EncodeHints::default())
                .is_err()
        );
    }

    #[test]
    fn test_decode_blank_is_not_found() {
        let blank = BitMatrix::new(100, 100);
        assert_eq!(
            QrCodec.decode(&blank, &DecodeHints::default()),
            Err(CodecFailure::NotFound)
        );
    }

    #[test]
    fn test_decode_respects_format_allow_list() {
        let matrix = QrCodec
            .encode("allow", BarcodeFormat::QrCode, 120, 120, &EncodeHints::default())
            .unwrap();
        let hints = DecodeHints {
            formats: Vec::new(),
            ..DecodeHints::default()
        };
        assert_eq!(QrCodec.decode(&matrix, &hints), Err(CodecFailure::NotFound));
        assert_eq!(
            QrCodec
                .decode(&matrix, &DecodeHints::default())
                .unwrap()
                .text,
            "allow"
        );
    }
}
