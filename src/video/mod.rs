//! # Video Module
//!
//! Frame type shared between the overlay renderer and the dispatch side, and
//! the [`VideoSource`] seam the renderer pulls raw frames from.

pub mod frame;

pub use frame::{Frame, FrameBuf};

use crate::error::Result;

/// Capture session owned exclusively by the overlay renderer.
pub trait VideoSource: Send + 'static {
    /// Returns the newest decoded frame, or `None` if nothing arrived since
    /// the previous call. Must not block.
    ///
    /// # Errors
    ///
    /// - `Video`: capture failed; the renderer treats this as "no new frame"
    fn capture_frame(&mut self) -> Result<Option<Frame>>;

    /// Ends the capture session. Called once when the renderer shuts down.
    fn stop_video(&mut self);
}
