//! Scan indicator animation and the repaint scheduler driving it.

use std::time::{Duration, Instant};

use crate::config::ScanIndicator;
use crate::models::Rect;

/// One full top-to-bottom sweep
pub const SWEEP_CYCLE: Duration = Duration::from_millis(3000);
/// Laser opacity steps, one per paint
pub const PULSE_ALPHA: [u8; 8] = [0, 64, 128, 192, 255, 192, 128, 64];
/// Delay between pulsing-laser repaints
pub const PULSE_DELAY: Duration = Duration::from_millis(80);

/// Indicator placement for one paint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorFrame {
    /// Y coordinate of the line
    pub position: i32,
    /// Line opacity
    pub opacity: u8,
}

/// Opacity of a sweeping line at `position` inside `frame`.
///
/// Fully opaque until the line is within `height / 6` of the bottom edge,
/// then fades linearly to zero at the edge.
pub fn sweep_opacity(frame: Rect, position: i32) -> u8 {
    let band = frame.height() / 6;
    let distance = (frame.bottom - position).max(0);
    if band <= 0 || distance > band {
        return 255;
    }
    (distance as i64 * 255 / band as i64) as u8
}

/// Animates the sweeping line or the pulsing laser.
///
/// The sweep is driven by an accumulated phase rather than wall-clock time,
/// so stopping and starting again continues from where it left off.
#[derive(Debug, Clone)]
pub struct ScanIndicatorAnimator {
    indicator: ScanIndicator,
    phase: Duration,
    last_tick: Option<Instant>,
    pulse_step: usize,
}

impl ScanIndicatorAnimator {
    /// Stopped animator at phase zero
    pub fn new(indicator: ScanIndicator) -> Self {
        Self {
            indicator,
            phase: Duration::ZERO,
            last_tick: None,
            pulse_step: 0,
        }
    }

    /// Indicator style this animator drives
    pub fn indicator(&self) -> ScanIndicator {
        self.indicator
    }

    /// Whether the animation is running
    pub fn is_running(&self) -> bool {
        self.last_tick.is_some()
    }

    /// Start counting time from `now`; no-op when already running
    pub fn start(&mut self, now: Instant) {
        if self.last_tick.is_none() {
            self.last_tick = Some(now);
        }
    }

    /// Freeze the phase at the last tick
    pub fn stop(&mut self) {
        self.last_tick = None;
    }

    /// Move the sweep phase forward by `elapsed`
    pub fn advance(&mut self, elapsed: Duration) {
        let cycle = SWEEP_CYCLE.as_nanos();
        let phase = (self.phase.as_nanos() + elapsed.as_nanos()) % cycle;
        self.phase = Duration::from_nanos(phase as u64);
    }

    /// Current phase inside [`SWEEP_CYCLE`]
    pub fn phase(&self) -> Duration {
        self.phase
    }

    /// Produce the frame for a paint at `now` and step the animation
    pub fn tick(&mut self, now: Instant, frame: Rect) -> IndicatorFrame {
        if let Some(last) = self.last_tick {
            self.advance(now.saturating_duration_since(last));
            self.last_tick = Some(now);
        }
        let out = self.frame_at(frame);
        if self.indicator == ScanIndicator::PulsingLaser && self.is_running() {
            self.pulse_step = (self.pulse_step + 1) % PULSE_ALPHA.len();
        }
        out
    }

    /// Frame for the current state without stepping
    pub fn frame_at(&self, frame: Rect) -> IndicatorFrame {
        match self.indicator {
            ScanIndicator::SweepingLine => {
                let travelled =
                    frame.height() as i128 * self.phase.as_nanos() as i128 / SWEEP_CYCLE.as_nanos() as i128;
                let position = frame.top + travelled as i32;
                IndicatorFrame {
                    position,
                    opacity: sweep_opacity(frame, position),
                }
            }
            ScanIndicator::PulsingLaser => IndicatorFrame {
                position: frame.center_y(),
                opacity: PULSE_ALPHA[self.pulse_step],
            },
        }
    }
}

/// Identifies one scheduled repaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// What the host should do to trigger the next paint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaintRequest {
    /// Repaint the whole view on the next display frame
    Continuous {
        /// Token to hand back to [`FrameScheduler::fire`]
        token: FrameToken,
    },
    /// Repaint `region` once `delay` has elapsed
    Delayed {
        /// Token to hand back to [`FrameScheduler::fire`]
        token: FrameToken,
        /// How long to wait
        delay: Duration,
        /// Area that needs repainting
        region: Rect,
    },
}

impl RepaintRequest {
    /// Token identifying this request
    pub fn token(&self) -> FrameToken {
        match self {
            Self::Continuous { token } | Self::Delayed { token, .. } => *token,
        }
    }
}

/// Keeps at most one repaint outstanding.
///
/// Every schedule hands out a fresh token. Cancelling forgets the pending
/// one, so a host timer that fires late with it is ignored.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next: u64,
    pending: Option<FrameToken>,
}

impl FrameScheduler {
    /// Scheduler with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next repaint; `None` while one is already pending
    pub fn schedule(&mut self) -> Option<FrameToken> {
        if self.pending.is_some() {
            return None;
        }
        self.next += 1;
        let token = FrameToken(self.next);
        self.pending = Some(token);
        Some(token)
    }

    /// Host callback; true when `token` is the outstanding one
    pub fn fire(&mut self, token: FrameToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Drop the outstanding repaint
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a repaint is outstanding
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
