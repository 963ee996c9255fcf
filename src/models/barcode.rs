use super::ResultPoint;

/// Symbologies the codec can be asked to produce or recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    /// QR Code (Model 2)
    QrCode,
}

impl BarcodeFormat {
    /// Every format the bundled codec handles
    pub fn all() -> Vec<BarcodeFormat> {
        vec![BarcodeFormat::QrCode]
    }
}

/// Error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCorrection {
    /// Low (~7% recovery capacity)
    L,
    /// Medium (~15% recovery capacity)
    M,
    /// Quartile (~25% recovery capacity)
    Q,
    /// High (~30% recovery capacity); the default, since logos cover modules
    #[default]
    H,
}

impl ErrorCorrection {
    /// Parse a single-letter level name, case-insensitively
    pub fn from_letter(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Some(Self::L),
            "M" => Some(Self::M),
            "Q" => Some(Self::Q),
            "H" => Some(Self::H),
            _ => None,
        }
    }
}

impl From<ErrorCorrection> for qrcode::EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => qrcode::EcLevel::L,
            ErrorCorrection::M => qrcode::EcLevel::M,
            ErrorCorrection::Q => qrcode::EcLevel::Q,
            ErrorCorrection::H => qrcode::EcLevel::H,
        }
    }
}

/// Which binarizer produced a successful decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarizerKind {
    /// Block-adaptive thresholding
    Hybrid,
    /// Single threshold picked from the luminance histogram
    GlobalHistogram,
}

/// A successfully decoded symbol
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    /// Decoded text
    pub text: String,
    /// Symbology
    pub format: BarcodeFormat,
    /// Symbol corners in frame coordinates
    pub points: Vec<ResultPoint>,
    /// Binarizer that produced the decodable matrix
    pub binarizer: BinarizerKind,
}
