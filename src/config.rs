//! Overlay and decode configuration.
//!
//! Defaults mirror the stock viewfinder look; every knob can be overridden
//! from `SCANVIEW_*` environment variables via `from_env`.

use image::{Rgba, RgbaImage};

use crate::codec::DecodeHints;
use crate::error::{Result, ScanError};
use crate::models::BarcodeFormat;

/// Smallest accepted corner-bracket divisor (leg = side / divisor)
pub const MIN_CORNER_DIVISOR: u32 = 2;
/// Largest accepted corner-bracket divisor
pub const MAX_CORNER_DIVISOR: u32 = 16;

fn parse_env_u32(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u32) -> u32 {
    lookup(name)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: bool) -> bool {
    lookup(name)
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Visual style of the scan indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanIndicator {
    /// Line sweeping top to bottom, fading out near the bottom edge
    #[default]
    SweepingLine,
    /// Stationary laser at the vertical midpoint whose opacity pulses
    PulsingLaser,
}

impl ScanIndicator {
    /// Parse `sweep` / `pulse` (also `line` / `laser`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sweep" | "line" => Some(Self::SweepingLine),
            "pulse" | "laser" => Some(Self::PulsingLaser),
            _ => None,
        }
    }
}

/// Look of the viewfinder overlay
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Colour of the darkened area outside the framing rectangle
    pub mask_color: Rgba<u8>,
    /// Mask colour while a result snapshot is shown
    pub result_color: Rgba<u8>,
    /// Scan line / laser colour
    pub laser_color: Rgba<u8>,
    /// Colour of possible result points; its alpha is scaled by each
    /// point's fade opacity
    pub result_point_color: Rgba<u8>,
    /// Corner bracket colour
    pub stroke_color: Rgba<u8>,
    /// Corner bracket stroke width in pixels
    pub stroke_width: u32,
    /// Bracket leg length is the framing side divided by this
    pub corner_divisor: u32,
    /// Scan indicator style
    pub indicator: ScanIndicator,
    /// Whether the scan indicator is drawn at all
    pub laser_visible: bool,
    /// Height of the solid scan line when no bitmap is set
    pub line_thickness: u32,
    /// Optional bitmap stretched across the framing width as the scan line
    pub line_bitmap: Option<RgbaImage>,
    /// Radius of a current possible result point
    pub point_radius: u32,
    /// Pin the framing rectangle's top edge to this y
    pub vertical_offset: Option<i32>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            mask_color: Rgba([0x00, 0x00, 0x00, 0x60]),
            result_color: Rgba([0x00, 0x00, 0x00, 0xB0]),
            laser_color: Rgba([0xCC, 0x00, 0x00, 0xFF]),
            result_point_color: Rgba([0xFF, 0xBD, 0x21, 0xC0]),
            stroke_color: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
            stroke_width: 4,
            corner_divisor: 8,
            indicator: ScanIndicator::SweepingLine,
            laser_visible: true,
            line_thickness: 4,
            line_bitmap: None,
            point_radius: 6,
            vertical_offset: None,
        }
    }
}

impl OverlayConfig {
    /// Defaults overridden from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Defaults overridden from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let indicator = match lookup("SCANVIEW_INDICATOR") {
            Some(name) => ScanIndicator::from_name(&name)
                .ok_or_else(|| ScanError::Config(format!("unknown indicator style {name:?}")))?,
            None => defaults.indicator,
        };
        let config = Self {
            corner_divisor: parse_env_u32(&lookup, "SCANVIEW_CORNER_DIVISOR", defaults.corner_divisor),
            stroke_width: parse_env_u32(&lookup, "SCANVIEW_STROKE_WIDTH", defaults.stroke_width),
            laser_visible: parse_env_bool_u8(&lookup, "SCANVIEW_LASER_VISIBLE", defaults.laser_visible),
            indicator,
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the corner bracket divisor
    pub fn with_corner_divisor(mut self, divisor: u32) -> Self {
        self.corner_divisor = divisor;
        self
    }

    /// Set the scan indicator style
    pub fn with_indicator(mut self, indicator: ScanIndicator) -> Self {
        self.indicator = indicator;
        self
    }

    /// Pin the framing rectangle's top edge
    pub fn with_vertical_offset(mut self, offset: Option<i32>) -> Self {
        self.vertical_offset = offset;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CORNER_DIVISOR..=MAX_CORNER_DIVISOR).contains(&self.corner_divisor) {
            return Err(ScanError::Config(format!(
                "corner divisor {} outside {MIN_CORNER_DIVISOR}..={MAX_CORNER_DIVISOR}",
                self.corner_divisor
            )));
        }
        if self.stroke_width == 0 {
            return Err(ScanError::Config("stroke width must be positive".to_string()));
        }
        if let Some(bitmap) = &self.line_bitmap {
            if bitmap.width() == 0 || bitmap.height() == 0 {
                return Err(ScanError::Config("scan line bitmap is empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Decode pipeline options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Formats passed to the codec
    pub formats: Vec<BarcodeFormat>,
    /// Try every located symbol rather than the first only
    pub try_harder: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            formats: BarcodeFormat::all(),
            try_harder: true,
        }
    }
}

impl DecodeConfig {
    /// Defaults overridden from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Defaults overridden from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            try_harder: parse_env_bool_u8(&lookup, "SCANVIEW_TRY_HARDER", defaults.try_harder),
            ..defaults
        }
    }

    /// Codec hints derived from this configuration
    pub fn hints(&self) -> DecodeHints {
        DecodeHints {
            formats: self.formats.clone(),
            try_harder: self.try_harder,
            ..DecodeHints::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_overlay_defaults_are_valid() {
        let config = OverlayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.corner_divisor, 8);
        assert_eq!(config.indicator, ScanIndicator::SweepingLine);
        assert!(config.laser_visible);
    }

    #[test]
    fn test_overlay_env_overrides() {
        let config = OverlayConfig::from_lookup(lookup(&[
            ("SCANVIEW_CORNER_DIVISOR", "4"),
            ("SCANVIEW_INDICATOR", "pulse"),
            ("SCANVIEW_LASER_VISIBLE", "0"),
        ]))
        .unwrap();
        assert_eq!(config.corner_divisor, 4);
        assert_eq!(config.indicator, ScanIndicator::PulsingLaser);
        assert!(!config.laser_visible);
    }

    #[test]
    fn test_overlay_rejects_bad_values() {
        assert!(OverlayConfig::from_lookup(lookup(&[("SCANVIEW_CORNER_DIVISOR", "40")])).is_err());
        assert!(OverlayConfig::from_lookup(lookup(&[("SCANVIEW_INDICATOR", "zigzag")])).is_err());
        assert!(OverlayConfig::default().with_corner_divisor(1).validate().is_err());
    }

    #[test]
    fn test_decode_config_hints() {
        let config = DecodeConfig::from_lookup(lookup(&[("SCANVIEW_TRY_HARDER", "0")]));
        let hints = config.hints();
        assert!(!hints.try_harder);
        assert_eq!(hints.formats, vec![BarcodeFormat::QrCode]);
    }
}
