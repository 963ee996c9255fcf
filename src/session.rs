//! Glue between the decode pipeline, the overlay and the caller.

use log::debug;

use crate::models::{ResultPoint, ScanResult};
use crate::overlay::OverlayHandle;
use crate::pipeline::DecodePipeline;
use crate::utils::luminance::{LuminanceSource, PixelFrame};

/// Receives scan outcomes
pub trait ScanCallback: Send {
    /// A symbol decoded
    fn on_result(&mut self, result: &ScanResult);

    /// Candidate points seen while decoding a frame
    fn on_possible_result_points(&mut self, _points: &[ResultPoint]) {}
}

/// How many results a session delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Stop after the first result until [`ScanSession::resume`]
    #[default]
    Single,
    /// Deliver every decoded frame
    Continuous,
}

/// Feeds frames through the pipeline, points into the overlay and results
/// to the callback
pub struct ScanSession<C: ScanCallback> {
    pipeline: DecodePipeline,
    overlay: Option<OverlayHandle>,
    callback: C,
    mode: DecodeMode,
    freeze_on_result: bool,
    paused: bool,
}

impl<C: ScanCallback> ScanSession<C> {
    /// Single-result session without an overlay
    pub fn new(pipeline: DecodePipeline, callback: C) -> Self {
        Self {
            pipeline,
            overlay: None,
            callback,
            mode: DecodeMode::Single,
            freeze_on_result: true,
            paused: false,
        }
    }

    /// Forward points and snapshots to an overlay
    pub fn with_overlay(mut self, overlay: OverlayHandle) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Select single or continuous decoding
    pub fn with_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether a result freezes the overlay on the decoded frame
    pub fn with_freeze_on_result(mut self, freeze: bool) -> Self {
        self.freeze_on_result = freeze;
        self
    }

    /// Callback receiving outcomes
    pub fn callback(&self) -> &C {
        &self.callback
    }

    /// True after a single-mode result, until `resume`
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Accept frames again after a single-mode result
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Decode one frame. Returns the result when this frame produced one.
    pub fn process_frame(&mut self, frame: &PixelFrame<'_>) -> Option<ScanResult> {
        if self.paused {
            return None;
        }
        let source = LuminanceSource::from_frame(frame);
        let outcome = self.pipeline.decode_source(&source);

        if !outcome.possible_points.is_empty() {
            if let Some(overlay) = &self.overlay {
                overlay.add_possible_result_points(&outcome.possible_points);
            }
            self.callback.on_possible_result_points(&outcome.possible_points);
        }

        let result = outcome.result?;
        debug!("session delivered {:?} result", result.format);
        if self.freeze_on_result {
            if let Some(overlay) = &self.overlay {
                overlay.post_result_snapshot(source.to_image());
            }
        }
        self.callback.on_result(&result);
        if self.mode == DecodeMode::Single {
            self.paused = true;
        }
        Some(result)
    }
}
