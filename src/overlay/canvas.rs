//! Drawing surface abstraction for the overlay.
//!
//! [`OverlayRenderer`](super::OverlayRenderer) only talks to [`Canvas`].
//! [`PixelCanvas`] rasterises into an `RgbaImage` with source-over
//! blending; [`DisplayList`] records the calls so a host can replay them
//! through its own graphics API.

use image::{Rgba, RgbaImage};

use crate::models::Rect;

/// Minimal 2D drawing surface
pub trait Canvas {
    /// Surface width in pixels
    fn width(&self) -> u32;

    /// Surface height in pixels
    fn height(&self) -> u32;

    /// Fill `rect` (right/bottom exclusive) with `color`
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>);

    /// Stroke a segment with round caps
    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), stroke_width: f32, color: Rgba<u8>);

    /// Stretch `bitmap` into `dst`, multiplying its alpha by `alpha / 255`
    fn draw_bitmap(&mut self, bitmap: &RgbaImage, dst: Rect, alpha: u8);

    /// Fill a circle
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba<u8>);
}

/// Replace the alpha channel of `color`
pub fn with_alpha(color: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    let [r, g, b, _] = color.0;
    Rgba([r, g, b, alpha])
}

/// Multiply the alpha channel of `color` by `opacity / 255`
pub fn scale_alpha(color: Rgba<u8>, opacity: u8) -> Rgba<u8> {
    with_alpha(color, mul_div_255(color.0[3] as u32, opacity as u32) as u8)
}

#[inline]
fn mul_div_255(a: u32, b: u32) -> u32 {
    (a * b + 127) / 255
}

/// Source-over blend of `src` onto `dst`
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src.0[3] as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        *dst = src;
        return;
    }
    let da = dst.0[3] as u32;
    let out_a = sa + mul_div_255(da, 255 - sa);
    if out_a == 0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = src.0[c] as u32 * sa;
        let d = mul_div_255(dst.0[c] as u32 * da, 255 - sa);
        out[c] = ((s + d + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    *dst = Rgba(out);
}

/// Software canvas drawing into an owned RGBA image
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    image: RgbaImage,
}

impl PixelCanvas {
    /// Transparent canvas of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Canvas drawing on top of an existing frame
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Borrow the pixels
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Take the pixels
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Pixel at (x, y), `None` outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.image.width() && y < self.image.height()).then(|| *self.image.get_pixel(x, y))
    }

    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let left = rect.left.max(0);
        let top = rect.top.max(0);
        let right = rect.right.min(self.image.width() as i32);
        let bottom = rect.bottom.min(self.image.height() as i32);
        (left < right && top < bottom).then_some((
            left as u32,
            top as u32,
            right as u32,
            bottom as u32,
        ))
    }

    fn blend_at(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        blend(self.image.get_pixel_mut(x, y), color);
    }
}

impl Canvas for PixelCanvas {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let Some((left, top, right, bottom)) = self.clip(rect) else {
            return;
        };
        for y in top..bottom {
            for x in left..right {
                self.blend_at(x, y, color);
            }
        }
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), stroke_width: f32, color: Rgba<u8>) {
        let half = (stroke_width / 2.0).max(0.5);
        let bounds = Rect::new(
            (from.0.min(to.0) - half).floor() as i32,
            (from.1.min(to.1) - half).floor() as i32,
            (from.0.max(to.0) + half).ceil() as i32 + 1,
            (from.1.max(to.1) + half).ceil() as i32 + 1,
        );
        let Some((left, top, right, bottom)) = self.clip(bounds) else {
            return;
        };
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len_sq = dx * dx + dy * dy;
        for y in top..bottom {
            for x in left..right {
                // Distance from the pixel centre to the segment
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let t = if len_sq == 0.0 {
                    0.0
                } else {
                    (((px - from.0) * dx + (py - from.1) * dy) / len_sq).clamp(0.0, 1.0)
                };
                let (cx, cy) = (from.0 + t * dx, from.1 + t * dy);
                if (px - cx).powi(2) + (py - cy).powi(2) <= half * half {
                    self.blend_at(x, y, color);
                }
            }
        }
    }

    fn draw_bitmap(&mut self, bitmap: &RgbaImage, dst: Rect, alpha: u8) {
        if bitmap.width() == 0 || bitmap.height() == 0 || dst.is_empty() {
            return;
        }
        let Some((left, top, right, bottom)) = self.clip(dst) else {
            return;
        };
        let (dst_w, dst_h) = (dst.width() as u64, dst.height() as u64);
        for y in top..bottom {
            let sy = ((y as i64 - dst.top as i64) as u64 * bitmap.height() as u64 / dst_h) as u32;
            for x in left..right {
                let sx = ((x as i64 - dst.left as i64) as u64 * bitmap.width() as u64 / dst_w) as u32;
                let src = *bitmap.get_pixel(sx, sy);
                let a = mul_div_255(src.0[3] as u32, alpha as u32) as u8;
                self.blend_at(x, y, with_alpha(src, a));
            }
        }
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba<u8>) {
        let bounds = Rect::new(
            (center.0 - radius).floor() as i32,
            (center.1 - radius).floor() as i32,
            (center.0 + radius).ceil() as i32 + 1,
            (center.1 + radius).ceil() as i32 + 1,
        );
        let Some((left, top, right, bottom)) = self.clip(bounds) else {
            return;
        };
        for y in top..bottom {
            for x in left..right {
                let (px, py) = (x as f32 + 0.5 - center.0, y as f32 + 0.5 - center.1);
                if px * px + py * py <= radius * radius {
                    self.blend_at(x, y, color);
                }
            }
        }
    }
}

/// One recorded canvas call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// [`Canvas::fill_rect`]
    FillRect {
        /// Target rectangle
        rect: Rect,
        /// Fill colour
        color: Rgba<u8>,
    },
    /// [`Canvas::draw_line`]
    Line {
        /// Start point
        from: (f32, f32),
        /// End point
        to: (f32, f32),
        /// Stroke width
        stroke_width: f32,
        /// Stroke colour
        color: Rgba<u8>,
    },
    /// [`Canvas::draw_bitmap`]
    Bitmap {
        /// Copy of the drawn bitmap
        bitmap: RgbaImage,
        /// Target rectangle
        dst: Rect,
        /// Global opacity
        alpha: u8,
    },
    /// [`Canvas::fill_circle`]
    Circle {
        /// Centre
        center: (f32, f32),
        /// Radius
        radius: f32,
        /// Fill colour
        color: Rgba<u8>,
    },
}

/// Canvas that records calls instead of drawing
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    /// Empty list for a surface of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Recorded calls in order
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Forget recorded calls
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Replay every recorded call onto another canvas
    pub fn replay(&self, target: &mut dyn Canvas) {
        for op in &self.ops {
            match op {
                DrawOp::FillRect { rect, color } => target.fill_rect(*rect, *color),
                DrawOp::Line {
                    from,
                    to,
                    stroke_width,
                    color,
                } => target.draw_line(*from, *to, *stroke_width, *color),
                DrawOp::Bitmap { bitmap, dst, alpha } => target.draw_bitmap(bitmap, *dst, *alpha),
                DrawOp::Circle {
                    center,
                    radius,
                    color,
                } => target.fill_circle(*center, *radius, *color),
            }
        }
    }
}

impl Canvas for DisplayList {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), stroke_width: f32, color: Rgba<u8>) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            stroke_width,
            color,
        });
    }

    fn draw_bitmap(&mut self, bitmap: &RgbaImage, dst: Rect, alpha: u8) {
        self.ops.push(DrawOp::Bitmap {
            bitmap: bitmap.clone(),
            dst,
            alpha,
        });
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba<u8>) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            color,
        });
    }
}
