//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Validation failures are fatal and reported before any loop starts.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::controller::command::CommandAxis;
use crate::controller::mapper::AxisId;
use crate::error::{HudError, Result};
use crate::overlay::indicator::Anchor;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gamepad sampling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    #[serde(default = "default_controller_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_jitter_ms")]
    pub jitter_tolerance_ms: u64,

    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default = "default_expo_roll")]
    pub expo_roll: f32,

    #[serde(default = "default_expo_pitch")]
    pub expo_pitch: f32,

    #[serde(default = "default_expo_yaw")]
    pub expo_yaw: f32,

    #[serde(default = "default_expo_throttle")]
    pub expo_throttle: f32,

    #[serde(default = "default_axis_min")]
    pub axis_min: f32,

    #[serde(default = "default_axis_max")]
    pub axis_max: f32,

    /// Trigger range; rest is `trigger_min`.
    #[serde(default = "default_trigger_min")]
    pub trigger_min: f32,

    #[serde(default = "default_trigger_max")]
    pub trigger_max: f32,
}

/// Command vector mapping configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CommandConfig {
    #[serde(default = "default_output_min")]
    pub output_min: i32,

    #[serde(default = "default_output_max")]
    pub output_max: i32,

    #[serde(default = "default_roll_axis")]
    pub roll: AxisId,

    #[serde(default = "default_pitch_axis")]
    pub pitch: AxisId,

    #[serde(default = "default_throttle_axis")]
    pub throttle: AxisId,

    #[serde(default = "default_yaw_axis")]
    pub yaw: AxisId,

    #[serde(default = "default_reverse")]
    pub reverse: Vec<CommandAxis>,
}

/// Overlay renderer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    #[serde(default = "default_overlay_width")]
    pub width: u32,

    #[serde(default = "default_overlay_height")]
    pub height: u32,

    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    #[serde(default = "default_refresh_jitter_ms")]
    pub jitter_tolerance_ms: u64,

    #[serde(default = "default_staleness_ms")]
    pub staleness_ms: u64,

    #[serde(default)]
    pub anchor: Anchor,
}

/// Telemetry polling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_poll_ms")]
    pub poll_interval_ms: u64,
}

/// Dispatch loop configuration (binary only)
#[derive(Debug, Deserialize, Clone)]
pub struct DispatchConfig {
    #[serde(default = "default_dispatch_tick_ms")]
    pub tick_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub directory: String,
}

// Default value functions
fn default_controller_enabled() -> bool { true }
fn default_poll_interval_ms() -> u64 { 50 }
fn default_poll_jitter_ms() -> u64 { 50 }
fn default_deadzone() -> f32 { 0.15 }
fn default_expo_roll() -> f32 { 0.0 }
fn default_expo_pitch() -> f32 { 0.0 }
fn default_expo_yaw() -> f32 { 0.0 }
fn default_expo_throttle() -> f32 { 0.0 }
fn default_axis_min() -> f32 { -32768.0 }
fn default_axis_max() -> f32 { 32767.0 }
fn default_trigger_min() -> f32 { 0.0 }
fn default_trigger_max() -> f32 { 1023.0 }

fn default_output_min() -> i32 { -100 }
fn default_output_max() -> i32 { 100 }
fn default_roll_axis() -> AxisId { AxisId::RightStickX }
fn default_pitch_axis() -> AxisId { AxisId::RightStickY }
fn default_throttle_axis() -> AxisId { AxisId::LeftStickY }
fn default_yaw_axis() -> AxisId { AxisId::LeftStickX }
fn default_reverse() -> Vec<CommandAxis> { vec![CommandAxis::Pitch, CommandAxis::Throttle] }

fn default_overlay_width() -> u32 { 720 }
fn default_overlay_height() -> u32 { 480 }
fn default_refresh_interval_ms() -> u64 { 20 }
fn default_refresh_jitter_ms() -> u64 { 20 }
fn default_staleness_ms() -> u64 { 3000 }

fn default_telemetry_poll_ms() -> u64 { 1000 }

fn default_dispatch_tick_ms() -> u64 { 50 }

fn default_log_level() -> String { "info".to_string() }

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enabled: default_controller_enabled(),
            device_path: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            jitter_tolerance_ms: default_poll_jitter_ms(),
            deadzone: default_deadzone(),
            expo_roll: default_expo_roll(),
            expo_pitch: default_expo_pitch(),
            expo_yaw: default_expo_yaw(),
            expo_throttle: default_expo_throttle(),
            axis_min: default_axis_min(),
            axis_max: default_axis_max(),
            trigger_min: default_trigger_min(),
            trigger_max: default_trigger_max(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            output_min: default_output_min(),
            output_max: default_output_max(),
            roll: default_roll_axis(),
            pitch: default_pitch_axis(),
            throttle: default_throttle_axis(),
            yaw: default_yaw_axis(),
            reverse: default_reverse(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            width: default_overlay_width(),
            height: default_overlay_height(),
            refresh_interval_ms: default_refresh_interval_ms(),
            jitter_tolerance_ms: default_refresh_jitter_ms(),
            staleness_ms: default_staleness_ms(),
            anchor: Anchor::default(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_telemetry_poll_ms(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_dispatch_tick_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> HudError {
    HudError::Config(toml::de::Error::custom(message))
}

fn check_interval(name: &str, value: u64) -> Result<()> {
    if value == 0 || value > 60000 {
        return Err(invalid(format!("{} must be between 1 and 60000", name)));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use drone_hud::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// ```
    /// use drone_hud::config::Config;
    ///
    /// let config = Config::from_toml("[controller]\ndeadzone = 0.1\n")?;
    /// assert_eq!(config.controller.deadzone, 0.1);
    ///
    /// assert!(Config::from_toml("[controller]\ndeadzone = 1.0\n").is_err());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        let controller = &self.controller;

        // Deadzone must leave some usable travel
        if !(0.0..1.0).contains(&controller.deadzone) {
            return Err(invalid("deadzone must be at least 0.0 and below 1.0"));
        }

        for (name, value) in [
            ("expo_roll", controller.expo_roll),
            ("expo_pitch", controller.expo_pitch),
            ("expo_yaw", controller.expo_yaw),
            ("expo_throttle", controller.expo_throttle),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must be between 0.0 and 1.0", name)));
            }
        }

        if !controller.axis_min.is_finite()
            || !controller.axis_max.is_finite()
            || controller.axis_min >= controller.axis_max
        {
            return Err(invalid("axis_min must be less than axis_max"));
        }
        if !controller.trigger_min.is_finite()
            || !controller.trigger_max.is_finite()
            || controller.trigger_min >= controller.trigger_max
        {
            return Err(invalid("trigger_min must be less than trigger_max"));
        }

        check_interval("controller.poll_interval_ms", controller.poll_interval_ms)?;
        if controller.jitter_tolerance_ms > 60000 {
            return Err(invalid("controller.jitter_tolerance_ms must not exceed 60000"));
        }

        // Output range must straddle zero so the deadzone maps to "no motion"
        if self.command.output_min >= 0 || self.command.output_max <= 0 {
            return Err(invalid("output range must satisfy output_min < 0 < output_max"));
        }

        let overlay = &self.overlay;
        if overlay.width < 64 || overlay.height < 48 {
            return Err(invalid("overlay dimensions must be at least 64x48"));
        }
        if overlay.width > 7680 || overlay.height > 4320 {
            return Err(invalid("overlay dimensions must not exceed 7680x4320"));
        }
        check_interval("overlay.refresh_interval_ms", overlay.refresh_interval_ms)?;
        if overlay.jitter_tolerance_ms > 60000 {
            return Err(invalid("overlay.jitter_tolerance_ms must not exceed 60000"));
        }
        if overlay.staleness_ms == 0 {
            return Err(invalid("overlay.staleness_ms must be greater than 0"));
        }

        check_interval("telemetry.poll_interval_ms", self.telemetry.poll_interval_ms)?;
        check_interval("dispatch.tick_interval_ms", self.dispatch.tick_interval_ms)?;

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(invalid(format!(
                "logging.level '{}' must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        Ok(())
    }
}
