pub mod barcode;
pub mod matrix;
pub mod point;
pub mod rect;

pub use barcode::{BarcodeFormat, BinarizerKind, ErrorCorrection, ScanResult};
pub use matrix::BitMatrix;
pub use point::ResultPoint;
pub use rect::{PreviewSize, Rect};
