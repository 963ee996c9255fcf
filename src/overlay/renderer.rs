//! Viewfinder overlay composition.

use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use log::{debug, trace};

use super::animator::{FrameScheduler, FrameToken, PULSE_DELAY, RepaintRequest, ScanIndicatorAnimator};
use super::canvas::{Canvas, scale_alpha};
use super::framing::{FramingState, Geometry};
use super::handle::OverlayHandle;
use super::points::ResultPointBuffer;
use crate::camera::{CameraError, CameraPreview, PreviewStateListener};
use crate::config::{OverlayConfig, ScanIndicator};
use crate::error::Result;
use crate::models::{PreviewSize, Rect, ResultPoint};

/// Opacity of the frozen result snapshot
pub const RESULT_BITMAP_ALPHA: u8 = 0xA0;

/// Whether the overlay is animating or showing a captured result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Corners, scan indicator and candidate points are drawn
    Scanning,
    /// The result snapshot is shown inside the framing rectangle
    Frozen,
}

/// Forwards camera state changes to the renderer as repaint requests
struct ViewfinderListener {
    handle: OverlayHandle,
}

impl PreviewStateListener for ViewfinderListener {
    fn on_preview_sized(&self, size: PreviewSize) {
        trace!("preview sized {}x{}", size.width, size.height);
        self.handle.invalidate();
    }

    fn on_preview_stopped(&self) {
        self.handle.invalidate();
    }

    fn on_camera_error(&self, error: &CameraError) {
        debug!("overlay keeps last geometry after camera error: {error}");
        self.handle.invalidate();
    }
}

/// Owns all mutable overlay state for one scanning session.
///
/// Painting happens on one thread through [`render`](Self::render); other
/// threads talk to it through an [`OverlayHandle`].
pub struct OverlayRenderer {
    config: OverlayConfig,
    preview: Option<Arc<dyn CameraPreview>>,
    listener: Arc<dyn PreviewStateListener>,
    handle: OverlayHandle,
    framing: FramingState,
    points: ResultPointBuffer,
    animator: ScanIndicatorAnimator,
    scheduler: FrameScheduler,
    result_bitmap: Option<RgbaImage>,
    vertical_offset: Option<i32>,
    visible: bool,
}

impl OverlayRenderer {
    /// Renderer with a validated configuration and no camera attached
    pub fn new(config: OverlayConfig) -> Result<Self> {
        config.validate()?;
        let handle = OverlayHandle::new();
        Ok(Self {
            listener: Arc::new(ViewfinderListener {
                handle: handle.clone(),
            }),
            handle,
            preview: None,
            framing: FramingState::new(),
            points: ResultPointBuffer::new(),
            animator: ScanIndicatorAnimator::new(config.indicator),
            scheduler: FrameScheduler::new(),
            result_bitmap: None,
            vertical_offset: config.vertical_offset,
            visible: true,
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Follow `preview`'s geometry; a previously attached preview is detached
    pub fn attach(&mut self, preview: Arc<dyn CameraPreview>) {
        self.detach();
        self.framing.reset();
        preview.add_state_listener(self.listener.clone());
        self.preview = Some(preview);
        self.handle.invalidate();
    }

    /// Stop following the current preview, keeping its last geometry
    pub fn detach(&mut self) -> Option<Arc<dyn CameraPreview>> {
        let preview = self.preview.take()?;
        preview.remove_state_listener(&self.listener);
        Some(preview)
    }

    /// Handle for decode workers
    pub fn handle(&self) -> OverlayHandle {
        self.handle.clone()
    }

    /// Pin the framing rectangle's top edge, or `None` to follow the camera
    pub fn set_vertical_offset(&mut self, offset: Option<i32>) {
        self.vertical_offset = offset;
        self.handle.invalidate();
    }

    /// Show or hide the overlay; hiding pauses the animation and drops any
    /// outstanding repaint
    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        self.visible = visible;
        if visible {
            self.animator.start(now);
            self.handle.invalidate();
        } else {
            self.animator.stop();
            self.scheduler.cancel();
        }
    }

    /// Freeze on `bitmap`, replacing any previous snapshot
    pub fn draw_result_bitmap(&mut self, bitmap: RgbaImage) {
        self.result_bitmap = Some(bitmap);
        self.animator.stop();
        self.handle.invalidate();
    }

    /// Drop the snapshot and go back to scanning
    pub fn draw_viewfinder(&mut self) {
        if self.result_bitmap.take().is_some() {
            debug!("result snapshot released");
        }
        self.handle.invalidate();
    }

    /// Current state
    pub fn state(&self) -> ScanState {
        if self.result_bitmap.is_some() {
            ScanState::Frozen
        } else {
            ScanState::Scanning
        }
    }

    /// Snapshot shown while frozen
    pub fn result_bitmap(&self) -> Option<&RgbaImage> {
        self.result_bitmap.as_ref()
    }

    /// Queue a candidate point from the render thread
    pub fn add_possible_result_point(&mut self, point: ResultPoint) {
        self.points.add(point);
    }

    /// Host timer fired for `token`; true when a repaint should happen now
    pub fn on_frame(&mut self, token: FrameToken) -> bool {
        self.scheduler.fire(token)
    }

    /// Consume a repaint request raised by the camera, a worker or a setter
    pub fn needs_repaint(&self) -> bool {
        self.handle.take_invalidation()
    }

    /// Last geometry used for painting
    pub fn geometry(&self) -> Option<Geometry> {
        self.framing.geometry()
    }

    /// Paint one overlay frame and return how the next one should be
    /// triggered, if at all.
    pub fn render(&mut self, canvas: &mut dyn Canvas, now: Instant) -> Option<RepaintRequest> {
        let (queued, snapshot) = self.handle.drain();
        for point in queued {
            self.points.add(point);
        }
        if let Some(snapshot) = snapshot {
            self.result_bitmap = Some(snapshot);
        }

        let (preview, raw) = match &self.preview {
            Some(p) => (p.preview_size(), p.framing_rect()),
            None => (None, None),
        };
        let geometry = self.framing.update_geometry(preview, raw, self.vertical_offset)?;
        let frame = geometry.frame;

        let mask = match self.result_bitmap {
            Some(_) => self.config.result_color,
            None => self.config.mask_color,
        };
        self.draw_mask(canvas, frame, mask);

        if let Some(bitmap) = &self.result_bitmap {
            canvas.draw_bitmap(bitmap, frame, RESULT_BITMAP_ALPHA);
            self.animator.stop();
            return None;
        }

        self.draw_corners(canvas, frame);
        if self.visible {
            self.animator.start(now);
        }
        let indicator = self.animator.tick(now, frame);
        if self.config.laser_visible {
            self.draw_indicator(canvas, frame, indicator.position, indicator.opacity);
        }
        self.draw_points(canvas, geometry.preview);

        if !self.visible {
            return None;
        }
        let token = self.scheduler.schedule()?;
        Some(match self.config.indicator {
            ScanIndicator::SweepingLine => RepaintRequest::Continuous { token },
            ScanIndicator::PulsingLaser => {
                let pad = self.config.point_radius as i32;
                RepaintRequest::Delayed {
                    token,
                    delay: PULSE_DELAY,
                    region: Rect::new(frame.left - pad, frame.top - pad, frame.right + pad, frame.bottom + pad),
                }
            }
        })
    }

    fn draw_mask(&self, canvas: &mut dyn Canvas, frame: Rect, color: image::Rgba<u8>) {
        let width = canvas.width() as i32;
        let height = canvas.height() as i32;
        let strips = [
            (0, 0, width, frame.top),
            (0, frame.top, frame.left, frame.bottom + 1),
            (frame.right + 1, frame.top, width, frame.bottom + 1),
            (0, frame.bottom + 1, width, height),
        ];
        for (left, top, right, bottom) in strips {
            if right > left && bottom > top {
                canvas.fill_rect(Rect::new(left, top, right, bottom), color);
            }
        }
    }

    fn draw_corners(&self, canvas: &mut dyn Canvas, frame: Rect) {
        let stroke = self.config.stroke_width as f32;
        let color = self.config.stroke_color;
        let h_leg = (frame.width() / self.config.corner_divisor as i32) as f32;
        let v_leg = (frame.height() / self.config.corner_divisor as i32) as f32;

        let left = frame.left as f32 + stroke / 2.0;
        let right = frame.right as f32 - stroke / 2.0;
        let top = frame.top as f32 + stroke / 2.0;
        let bottom = frame.bottom as f32 - stroke / 2.0;

        // (corner, horizontal direction, vertical direction)
        let corners = [
            ((left, top), 1.0, 1.0),
            ((right, top), -1.0, 1.0),
            ((left, bottom), 1.0, -1.0),
            ((right, bottom), -1.0, -1.0),
        ];
        for ((x, y), dx, dy) in corners {
            canvas.draw_line((x, y), (x, y + dy * v_leg), stroke, color);
            canvas.draw_line((x, y), (x + dx * h_leg, y), stroke, color);
        }
    }

    fn draw_indicator(&self, canvas: &mut dyn Canvas, frame: Rect, position: i32, opacity: u8) {
        match (&self.config.line_bitmap, self.config.indicator) {
            (Some(bitmap), ScanIndicator::SweepingLine) => {
                let line = Rect::new(frame.left, position, frame.right, position + bitmap.height() as i32);
                canvas.draw_bitmap(bitmap, line, opacity);
            }
            (_, ScanIndicator::SweepingLine) => {
                let line = Rect::new(
                    frame.left,
                    position,
                    frame.right,
                    position + self.config.line_thickness as i32,
                );
                canvas.fill_rect(line, scale_alpha(self.config.laser_color, opacity));
            }
            (_, ScanIndicator::PulsingLaser) => {
                let half = self.config.line_thickness as i32 / 2;
                let line = Rect::new(
                    frame.left + 2,
                    position - half,
                    frame.right - 1,
                    position - half + self.config.line_thickness as i32,
                );
                canvas.fill_rect(line, scale_alpha(self.config.laser_color, opacity));
            }
        }
    }

    fn draw_points(&mut self, canvas: &mut dyn Canvas, preview: PreviewSize) {
        let Some(scale) = preview.scale_to(canvas.width(), canvas.height()) else {
            // Nothing can be placed, but the buffers still rotate
            self.points.swap_and_render((0.0, 0.0), |_, _| {});
            return;
        };
        let color = self.config.result_point_color;
        let radius = self.config.point_radius as f32;
        self.points.swap_and_render(scale, |point, style| {
            let r = if style.fading { radius / 2.0 } else { radius };
            canvas.fill_circle((point.x, point.y), r, scale_alpha(color, style.opacity));
        });
    }
}

impl Drop for OverlayRenderer {
    fn drop(&mut self) {
        self.detach();
    }
}
