/// Candidate point reported by the codec, in preview-pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResultPoint {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl ResultPoint {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &ResultPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Map from preview space into view space with independent axis factors
    pub fn scaled(&self, scale_x: f32, scale_y: f32) -> Self {
        Self {
            x: self.x * scale_x,
            y: self.y * scale_y,
        }
    }
}

impl From<rqrr::Point> for ResultPoint {
    fn from(p: rqrr::Point) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = ResultPoint::new(0.0, 0.0);
        let b = ResultPoint::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_scaled_uses_independent_axes() {
        let p = ResultPoint::new(10.0, 10.0).scaled(2.0, 0.5);
        assert_eq!(p, ResultPoint::new(20.0, 5.0));
    }
}
