//! Camera collaborator seen by the overlay.
//!
//! The overlay never drives a camera. It reads the framing rectangle and
//! preview size from a [`CameraPreview`] and listens for state changes to
//! know when to repaint.

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use thiserror::Error;

use crate::models::{PreviewSize, Rect};

/// Failure reported by the camera collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    /// The camera could not be opened
    #[error("camera could not be opened: {0}")]
    Open(String),
    /// The camera went away while previewing
    #[error("camera disconnected")]
    Disconnected,
    /// The preview stream failed
    #[error("preview failed: {0}")]
    Preview(String),
}

/// Preview lifecycle notifications.
///
/// Callbacks may arrive in any order and any number of times.
pub trait PreviewStateListener: Send + Sync {
    /// Preview size or framing rectangle changed
    fn on_preview_sized(&self, size: PreviewSize);

    /// Frames started flowing
    fn on_preview_started(&self) {}

    /// Frames stopped flowing
    fn on_preview_stopped(&self) {}

    /// The camera reported an error
    fn on_camera_error(&self, _error: &CameraError) {}

    /// The camera was released
    fn on_camera_closed(&self) {}
}

/// Source of framing geometry
pub trait CameraPreview: Send + Sync {
    /// Framing rectangle in view coordinates, once known
    fn framing_rect(&self) -> Option<Rect>;

    /// Preview resolution, once known
    fn preview_size(&self) -> Option<PreviewSize>;

    /// Register for state notifications
    fn add_state_listener(&self, listener: Arc<dyn PreviewStateListener>);

    /// Unregister a listener previously passed to `add_state_listener`
    fn remove_state_listener(&self, listener: &Arc<dyn PreviewStateListener>);
}

/// Identity comparison for listener trait objects
pub fn same_listener(a: &Arc<dyn PreviewStateListener>, b: &Arc<dyn PreviewStateListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Framing rectangle centred in a `view`, inset by `margin_fraction` of each
/// side and squared to the shorter remaining side
pub fn centered_framing(view: PreviewSize, margin_fraction: f32) -> Rect {
    let fraction = margin_fraction.clamp(0.0, 0.5);
    let inner_w = view.width as f32 * (1.0 - 2.0 * fraction);
    let inner_h = view.height as f32 * (1.0 - 2.0 * fraction);
    let side = inner_w.min(inner_h).max(0.0).round() as i32;
    let left = (view.width as i32 - side) / 2;
    let top = (view.height as i32 - side) / 2;
    Rect::new(left, top, left + side, top + side)
}

#[derive(Default)]
struct PreviewState {
    framing: Option<Rect>,
    preview: Option<PreviewSize>,
    running: bool,
    listeners: Vec<Arc<dyn PreviewStateListener>>,
}

/// Camera collaborator driven by explicit calls.
///
/// Used by the CLI and tests, and by hosts that already own a camera and
/// only need to feed its geometry to the overlay.
#[derive(Default)]
pub struct ManualPreview {
    state: Mutex<PreviewState>,
}

impl ManualPreview {
    /// Preview with no geometry yet
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PreviewState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Listeners are called without holding the lock so they may call back in
    fn listeners(&self) -> Vec<Arc<dyn PreviewStateListener>> {
        self.state().listeners.clone()
    }

    /// Publish new geometry and notify listeners
    pub fn set_geometry(&self, preview: PreviewSize, framing: Rect) {
        {
            let mut state = self.state();
            state.preview = Some(preview);
            state.framing = Some(framing);
        }
        debug!("preview sized {}x{}, framing {:?}", preview.width, preview.height, framing);
        for listener in self.listeners() {
            listener.on_preview_sized(preview);
        }
    }

    /// Mark the preview running
    pub fn start(&self) {
        self.state().running = true;
        for listener in self.listeners() {
            listener.on_preview_started();
        }
    }

    /// Mark the preview stopped; geometry is forgotten like a paused camera
    pub fn stop(&self) {
        {
            let mut state = self.state();
            state.running = false;
            state.framing = None;
            state.preview = None;
        }
        for listener in self.listeners() {
            listener.on_preview_stopped();
        }
    }

    /// Report a camera failure
    pub fn error(&self, error: CameraError) {
        debug!("camera error: {error}");
        self.state().running = false;
        for listener in self.listeners() {
            listener.on_camera_error(&error);
        }
    }

    /// Report the camera released
    pub fn close(&self) {
        self.state().running = false;
        for listener in self.listeners() {
            listener.on_camera_closed();
        }
    }

    /// Whether `start` was called more recently than a stop, error or close
    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }
}

impl CameraPreview for ManualPreview {
    fn framing_rect(&self) -> Option<Rect> {
        self.state().framing
    }

    fn preview_size(&self) -> Option<PreviewSize> {
        self.state().preview
    }

    fn add_state_listener(&self, listener: Arc<dyn PreviewStateListener>) {
        let mut state = self.state();
        if !state.listeners.iter().any(|l| same_listener(l, &listener)) {
            state.listeners.push(listener);
        }
    }

    fn remove_state_listener(&self, listener: &Arc<dyn PreviewStateListener>) {
        self.state().listeners.retain(|l| !same_listener(l, listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        sized: AtomicUsize,
        other: AtomicUsize,
    }

    impl PreviewStateListener for Counter {
        fn on_preview_sized(&self, _size: PreviewSize) {
            self.sized.fetch_add(1, Ordering::SeqCst);
        }

        fn on_camera_error(&self, _error: &CameraError) {
            self.other.fetch_add(1, Ordering::SeqCst);
        }

        fn on_camera_closed(&self) {
            self.other.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_listeners_notified_and_removed() {
        let preview = ManualPreview::new();
        let counter = Arc::new(Counter::default());
        let listener: Arc<dyn PreviewStateListener> = counter.clone();
        preview.add_state_listener(listener.clone());
        preview.add_state_listener(listener.clone());
        assert_eq!(preview.listener_count(), 1);

        preview.set_geometry(PreviewSize::new(640, 480), Rect::new(0, 0, 10, 10));
        preview.error(CameraError::Disconnected);
        preview.close();
        assert_eq!(counter.sized.load(Ordering::SeqCst), 1);
        assert_eq!(counter.other.load(Ordering::SeqCst), 2);

        preview.remove_state_listener(&listener);
        preview.set_geometry(PreviewSize::new(640, 480), Rect::new(0, 0, 10, 10));
        assert_eq!(counter.sized.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_clears_geometry() {
        let preview = ManualPreview::new();
        preview.set_geometry(PreviewSize::new(640, 480), Rect::new(0, 0, 10, 10));
        preview.start();
        assert!(preview.is_running());
        preview.stop();
        assert!(!preview.is_running());
        assert!(preview.framing_rect().is_none());
        assert!(preview.preview_size().is_none());
    }

    #[test]
    fn test_centered_framing() {
        let rect = centered_framing(PreviewSize::new(400, 300), 0.1);
        assert_eq!(rect.width(), 240);
        assert_eq!(rect.height(), 240);
        assert_eq!(rect.left, 80);
        assert_eq!(rect.top, 30);
    }
}
