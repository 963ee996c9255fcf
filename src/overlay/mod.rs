//! Viewfinder overlay drawn over a live camera preview.
//!
//! [`OverlayRenderer`] composes the darkened mask, the corner brackets, the
//! scan indicator and the fading candidate points, or the frozen result
//! snapshot, onto any [`Canvas`].

pub mod animator;
pub mod canvas;
pub mod framing;
pub mod handle;
pub mod points;
pub mod renderer;

pub use animator::{FrameScheduler, FrameToken, IndicatorFrame, RepaintRequest, ScanIndicatorAnimator};
pub use canvas::{Canvas, DisplayList, DrawOp, PixelCanvas};
pub use framing::{FramingState, Geometry};
pub use handle::OverlayHandle;
pub use points::{MAX_RESULT_POINTS, ResultPointBuffer};
pub use renderer::{OverlayRenderer, ScanState};
