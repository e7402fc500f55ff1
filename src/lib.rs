//! # Drone HUD Library
//!
//! Fly a camera drone with a gamepad while watching its video with a live
//! battery overlay.
//!
//! Two background pipelines feed a dispatch loop through latest-value slots:
//!
//! - **Input normalization**: the sampler polls the gamepad, filters each
//!   axis (deadzone, expo, output scaling) and publishes a pitch/roll/yaw/
//!   throttle command, edge-detecting button presses on the way.
//! - **Telemetry overlay**: the renderer resizes the newest video frame,
//!   draws the battery indicator and publishes the composited frame.
//!
//! [`session::HudSession`] owns both, plus the telemetry poller feeding the
//! overlay.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod overlay;
pub mod session;
pub mod sim;
pub mod slot;
pub mod task;
pub mod telemetry;
pub mod video;
