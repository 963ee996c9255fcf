/// Axis-aligned rectangle on the preview pixel grid.
///
/// `left <= right` and `top <= bottom` always hold; [`Rect::new`] swaps
/// inverted edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge
    pub left: i32,
    /// Top edge
    pub top: i32,
    /// Right edge
    pub right: i32,
    /// Bottom edge
    pub bottom: i32,
}

impl Rect {
    /// Create a rectangle from its edges
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Create a rectangle from an origin and a size
    pub fn from_size(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self::new(
            left,
            top,
            left.saturating_add(width as i32),
            top.saturating_add(height as i32),
        )
    }

    /// Horizontal extent
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Vertical extent
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Vertical midpoint
    pub fn center_y(&self) -> i32 {
        self.top + self.height() / 2
    }

    /// Move the rectangle so its top-left corner lands on (`left`, `top`),
    /// keeping its size
    pub fn offset_to(&self, left: i32, top: i32) -> Self {
        Self {
            left,
            top,
            right: left + self.width(),
            bottom: top + self.height(),
        }
    }

    /// Whether (`x`, `y`) lies inside, right/bottom edges exclusive
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Camera preview resolution, as reported by the camera collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PreviewSize {
    /// Create a new preview size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Factors mapping preview coordinates into a `view_width` x `view_height` view.
    ///
    /// Returns `None` for a zero-sized preview.
    pub fn scale_to(&self, view_width: u32, view_height: u32) -> Option<(f32, f32)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some((
            view_width as f32 / self.width as f32,
            view_height as f32 / self.height as f32,
        ))
    }
}
