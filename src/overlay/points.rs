//! Double-buffered possible-result points with a one-frame fading trail.

use crate::models::ResultPoint;

/// Upper bound on points queued per frame
pub const MAX_RESULT_POINTS: usize = 20;
/// Opacity of points found since the previous paint
pub const CURRENT_POINT_OPACITY: u8 = 0xA0;

/// How a point should be drawn this paint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointStyle {
    /// Alpha to draw with
    pub opacity: u8,
    /// True for last frame's points, drawn smaller and fainter
    pub fading: bool,
}

/// Current/previous point sets behind a flipping index.
///
/// Both vectors are allocated once with room for [`MAX_RESULT_POINTS`].
#[derive(Debug, Clone)]
pub struct ResultPointBuffer {
    buffers: [Vec<ResultPoint>; 2],
    current: usize,
}

impl ResultPointBuffer {
    /// Two empty buffers
    pub fn new() -> Self {
        Self {
            buffers: [
                Vec::with_capacity(MAX_RESULT_POINTS),
                Vec::with_capacity(MAX_RESULT_POINTS),
            ],
            current: 0,
        }
    }

    /// Queue a point for the next paint; ignored once the buffer is full
    pub fn add(&mut self, point: ResultPoint) {
        let current = &mut self.buffers[self.current];
        if current.len() < MAX_RESULT_POINTS {
            current.push(point);
        }
    }

    /// Points queued since the last paint
    pub fn current(&self) -> &[ResultPoint] {
        &self.buffers[self.current]
    }

    /// Points drawn on the last paint, faded on the next
    pub fn previous(&self) -> &[ResultPoint] {
        &self.buffers[1 - self.current]
    }

    /// True when neither buffer holds points
    pub fn is_empty(&self) -> bool {
        self.buffers.iter().all(Vec::is_empty)
    }

    /// Drop every point
    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }

    /// Draw the trail then the fresh points, and rotate the buffers.
    ///
    /// Points are scaled from preview into view space with `scale`.
    pub fn swap_and_render(&mut self, scale: (f32, f32), mut draw: impl FnMut(ResultPoint, PointStyle)) {
        let previous = 1 - self.current;

        let fading = PointStyle {
            opacity: CURRENT_POINT_OPACITY / 2,
            fading: true,
        };
        for point in self.buffers[previous].drain(..) {
            draw(point.scaled(scale.0, scale.1), fading);
        }

        let fresh = PointStyle {
            opacity: CURRENT_POINT_OPACITY,
            fading: false,
        };
        for point in &self.buffers[self.current] {
            draw(point.scaled(scale.0, scale.1), fresh);
        }

        // This frame's points become next frame's trail
        self.current = previous;
        self.buffers[self.current].clear();
    }
}

impl Default for ResultPointBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(buffer: &mut ResultPointBuffer) -> Vec<(ResultPoint, PointStyle)> {
        let mut drawn = Vec::new();
        buffer.swap_and_render((1.0, 1.0), |p, s| drawn.push((p, s)));
        drawn
    }

    #[test]
    fn test_capacity_bound() {
        let mut buffer = ResultPointBuffer::new();
        for i in 0..100 {
            buffer.add(ResultPoint::new(i as f32, 0.0));
        }
        assert_eq!(buffer.current().len(), MAX_RESULT_POINTS);
        // Earliest points are kept
        assert_eq!(buffer.current()[19], ResultPoint::new(19.0, 0.0));
    }

    #[test]
    fn test_fade_trail_lags_one_frame() {
        let mut buffer = ResultPointBuffer::new();
        buffer.add(ResultPoint::new(1.0, 1.0));

        let first = collect(&mut buffer);
        assert_eq!(first.len(), 1);
        assert!(!first[0].1.fading);
        assert_eq!(first[0].1.opacity, CURRENT_POINT_OPACITY);

        buffer.add(ResultPoint::new(2.0, 2.0));
        let second = collect(&mut buffer);
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].0, ResultPoint::new(1.0, 1.0));
        assert!(second[0].1.fading);
        assert_eq!(second[0].1.opacity, CURRENT_POINT_OPACITY / 2);
        assert_eq!(second[1].0, ResultPoint::new(2.0, 2.0));
        assert!(!second[1].1.fading);
    }

    #[test]
    fn test_buffers_drain_without_new_points() {
        let mut buffer = ResultPointBuffer::new();
        for i in 0..5 {
            buffer.add(ResultPoint::new(i as f32, i as f32));
        }
        collect(&mut buffer);
        assert!(!buffer.is_empty());
        collect(&mut buffer);
        assert!(buffer.is_empty());
        assert!(collect(&mut buffer).is_empty());
    }

    #[test]
    fn test_points_are_scaled() {
        let mut buffer = ResultPointBuffer::new();
        buffer.add(ResultPoint::new(100.0, 100.0));
        let mut drawn = Vec::new();
        buffer.swap_and_render((2.0, 0.5), |p, _| drawn.push(p));
        assert_eq!(drawn, vec![ResultPoint::new(200.0, 50.0)]);
    }
}
