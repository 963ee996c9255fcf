//! Error type shared by the encoder, the pipeline constructors and the CLI.
//!
//! Absence of a barcode is not represented here: decoding returns `None`
//! for that case.

use thiserror::Error;

use crate::models::ErrorCorrection;

/// Errors reported by fallible scanview operations
#[derive(Debug, Error)]
pub enum ScanError {
    /// The codec could not fit `text_len` bytes into the requested symbol.
    #[error(
        "cannot encode {text_len} bytes into a {width}x{height} symbol at EC level {ec_level:?}: {reason}"
    )]
    Encode {
        /// Length of the offending payload in bytes
        text_len: usize,
        /// Requested output width
        width: u32,
        /// Requested output height
        height: u32,
        /// Requested error-correction level
        ec_level: ErrorCorrection,
        /// Codec-provided reason
        reason: String,
    },

    /// A pixel buffer does not match its declared dimensions.
    #[error("invalid frame: {width}x{height} needs {expected} samples, got {actual}")]
    InvalidFrame {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
        /// Samples implied by the dimensions and pixel layout
        expected: usize,
        /// Samples actually supplied
        actual: usize,
    },

    /// The requested barcode format is not supported by the codec.
    #[error("unsupported barcode format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Image loading or saving failed (CLI and tools only).
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Filesystem access failed (CLI and tools only).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ScanError>;
