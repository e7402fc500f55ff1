//! # Controller Module
//!
//! Gamepad input handling for the Input-Normalization Pipeline.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Reading analog stick and button inputs
//! - Applying deadzones and expo curves
//! - Mapping sticks to pitch/roll/yaw/throttle commands
//! - Edge-detecting button presses

pub mod calibration;
pub mod command;
pub mod edge;
pub mod gamepad;
pub mod mapper;
pub mod sampler;
