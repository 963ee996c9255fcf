//! Thread-safe entry point into a renderer for decode workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbaImage;

use super::points::MAX_RESULT_POINTS;
use crate::models::ResultPoint;

#[derive(Debug, Default)]
struct Inbox {
    points: Vec<ResultPoint>,
    snapshot: Option<RgbaImage>,
}

#[derive(Debug, Default)]
struct Shared {
    inbox: Mutex<Inbox>,
    invalidated: AtomicBool,
}

/// Cloneable handle queuing points and result snapshots for the next paint.
///
/// Nothing is drawn from the calling thread; the renderer drains the queue
/// at the start of its paint pass.
#[derive(Debug, Clone, Default)]
pub struct OverlayHandle {
    shared: Arc<Shared>,
}

impl OverlayHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn inbox(&self) -> MutexGuard<'_, Inbox> {
        self.shared
            .inbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a candidate point in preview coordinates
    pub fn add_possible_result_point(&self, point: ResultPoint) {
        let mut inbox = self.inbox();
        if inbox.points.len() < MAX_RESULT_POINTS {
            inbox.points.push(point);
        }
    }

    /// Queue several candidate points
    pub fn add_possible_result_points(&self, points: &[ResultPoint]) {
        let mut inbox = self.inbox();
        let room = MAX_RESULT_POINTS.saturating_sub(inbox.points.len());
        inbox.points.extend(points.iter().take(room).copied());
    }

    /// Ask the renderer to freeze on `snapshot`; a later call replaces it
    pub fn post_result_snapshot(&self, snapshot: RgbaImage) {
        self.inbox().snapshot = Some(snapshot);
        self.invalidate();
    }

    /// Request a repaint
    pub fn invalidate(&self) {
        self.shared.invalidated.store(true, Ordering::Release);
    }

    /// Consume a pending repaint request
    pub fn take_invalidation(&self) -> bool {
        self.shared.invalidated.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn drain(&self) -> (Vec<ResultPoint>, Option<RgbaImage>) {
        let mut inbox = self.inbox();
        (std::mem::take(&mut inbox.points), inbox.snapshot.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_points_from_many_threads_are_bounded() {
        let handle = OverlayHandle::new();
        let workers: Vec<_> = (0..4)
            .map(|t| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        handle.add_possible_result_point(ResultPoint::new(t as f32, i as f32));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let (points, snapshot) = handle.drain();
        assert_eq!(points.len(), MAX_RESULT_POINTS);
        assert!(snapshot.is_none());
        assert!(handle.drain().0.is_empty());
    }

    #[test]
    fn test_snapshot_replaces_and_invalidates() {
        let handle = OverlayHandle::new();
        assert!(!handle.take_invalidation());
        handle.post_result_snapshot(RgbaImage::new(2, 2));
        handle.post_result_snapshot(RgbaImage::new(3, 3));
        assert!(handle.take_invalidation());
        assert!(!handle.take_invalidation());

        let (_, snapshot) = handle.drain();
        assert_eq!(snapshot.map(|s| s.dimensions()), Some((3, 3)));
    }

    #[test]
    fn test_batch_respects_room() {
        let handle = OverlayHandle::new();
        let batch: Vec<_> = (0..15).map(|i| ResultPoint::new(i as f32, 0.0)).collect();
        handle.add_possible_result_points(&batch);
        handle.add_possible_result_points(&batch);
        assert_eq!(handle.drain().0.len(), MAX_RESULT_POINTS);
    }
}
