//! Cached framing rectangle and preview size.

use crate::models::{PreviewSize, Rect};

/// Geometry needed for one paint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Framing rectangle after the vertical offset is applied
    pub frame: Rect,
    /// Preview resolution the result points are expressed in
    pub preview: PreviewSize,
}

/// Last known framing geometry.
///
/// Values reported by the camera collaborator replace the cached ones; a
/// missing value keeps the previous one, so a final paint still works after
/// the preview stops.
#[derive(Debug, Clone, Default)]
pub struct FramingState {
    raw_frame: Option<Rect>,
    preview: Option<PreviewSize>,
    vertical_offset: Option<i32>,
}

impl FramingState {
    /// Empty state; nothing is drawn until both values arrive
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the collaborator's latest values and return the adjusted
    /// geometry, or `None` when it is still unknown
    pub fn update_geometry(
        &mut self,
        preview: Option<PreviewSize>,
        raw_frame: Option<Rect>,
        vertical_offset: Option<i32>,
    ) -> Option<Geometry> {
        if preview.is_some() {
            self.preview = preview;
        }
        if raw_frame.is_some() {
            self.raw_frame = raw_frame;
        }
        self.vertical_offset = vertical_offset;
        self.geometry()
    }

    /// Cached geometry without refreshing
    pub fn geometry(&self) -> Option<Geometry> {
        let raw = self.raw_frame?;
        let preview = self.preview?;
        let frame = match self.vertical_offset {
            Some(top) => raw.offset_to(raw.left, top),
            None => raw,
        };
        Some(Geometry { frame, preview })
    }

    /// Forget everything; used when a new preview is attached
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
