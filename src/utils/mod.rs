//! Image processing helpers for the decode pipeline
//!
//! - Luminance conversion (RGB/RGBA/ARGB/grey frames to a luminance source)
//! - Binarization (block-adaptive hybrid and global histogram)

pub mod binarization;
pub mod luminance;
