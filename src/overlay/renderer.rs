//! # Overlay Renderer
//!
//! Background job compositing the battery indicator onto video frames.
//! Driven by a [`LoopTask`](crate::task::LoopTask) at
//! `overlay.refresh_interval_ms`, independent of the video frame rate.
//!
//! Each cycle:
//!
//! 1. Pulls the newest raw frame, if any, and keeps a resized clean copy.
//! 2. Reads telemetry; a missing or stale value becomes "unknown".
//! 3. Draws the indicator onto a copy of the clean frame and publishes it.
//!
//! With no new video the overlay is redrawn onto the previous clean frame,
//! so the indicator keeps tracking telemetry while video stalls. Until the
//! first frame arrives a black frame is used.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::indicator::{self, IndicatorLayout, IndicatorState};
use crate::config::OverlayConfig;
use crate::slot::SharedSlot;
use crate::task::Periodic;
use crate::telemetry::TelemetrySource;
use crate::video::{Frame, FrameBuf, VideoSource};

/// Periodic job owning the video capture session.
pub struct OverlayRenderer<V: VideoSource, T: TelemetrySource> {
    video: V,
    telemetry: T,
    frames: SharedSlot<Frame>,
    width: u32,
    height: u32,
    staleness: Duration,
    layout: IndicatorLayout,
    /// Resized newest frame without overlay
    base: Option<FrameBuf>,
    shown: Option<IndicatorState>,
    capture_failures: u32,
    video_stopped: bool,
}

impl<V: VideoSource, T: TelemetrySource> OverlayRenderer<V, T> {
    /// Creates a renderer for the configured display surface.
    #[must_use]
    pub fn new(video: V, telemetry: T, frames: SharedSlot<Frame>, config: &OverlayConfig) -> Self {
        Self {
            video,
            telemetry,
            frames,
            width: config.width,
            height: config.height,
            staleness: Duration::from_millis(config.staleness_ms),
            layout: IndicatorLayout::for_frame(config.width, config.height, config.anchor),
            base: None,
            shown: None,
            capture_failures: 0,
            video_stopped: false,
        }
    }

    /// Indicator geometry in use.
    #[must_use]
    pub fn layout(&self) -> &IndicatorLayout {
        &self.layout
    }

    fn pull_frame(&mut self) {
        match self.video.capture_frame() {
            Ok(Some(frame)) => {
                self.capture_failures = 0;
                self.base = Some(frame.resized(self.width, self.height));
            }
            Ok(None) => {}
            Err(e) => {
                if self.capture_failures == 0 {
                    warn!("Video capture failed, reusing last frame: {}", e);
                } else {
                    debug!("Video capture failed: {}", e);
                }
                self.capture_failures = self.capture_failures.saturating_add(1);
            }
        }
    }

    fn indicator_state(&self) -> IndicatorState {
        match self.telemetry.get_telemetry() {
            Ok(value) if !value.is_stale(Instant::now(), self.staleness) => {
                IndicatorState::Level(value.percent)
            }
            Ok(_) | Err(_) => IndicatorState::Unknown,
        }
    }
}

impl<V: VideoSource, T: TelemetrySource> Periodic for OverlayRenderer<V, T> {
    fn name(&self) -> &'static str {
        "overlay renderer"
    }

    fn tick(&mut self) {
        self.pull_frame();

        let state = self.indicator_state();
        if self.shown != Some(state) {
            match state {
                IndicatorState::Unknown => debug!("Battery indicator: unknown"),
                IndicatorState::Level(percent) => debug!("Battery indicator: {}%", percent),
            }
            self.shown = Some(state);
        }

        let mut buf = match &self.base {
            Some(base) => base.clone(),
            None => FrameBuf::new(self.width, self.height),
        };
        indicator::draw(&mut buf, &self.layout, state);
        self.frames.publish(Frame::new(buf));
    }

    fn release(&mut self) {
        if !self.video_stopped {
            self.video_stopped = true;
            self.video.stop_video();
            info!("Video capture stopped");
        }
    }
}
