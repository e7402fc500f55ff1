//! # Error Types
//!
//! Custom error types for Drone HUD using `thiserror`.

use thiserror::Error;

/// Main error type for Drone HUD
#[derive(Debug, Error)]
pub enum HudError {
    /// Configuration errors (parse failures and validation failures)
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Controller errors while scanning or opening input devices
    #[error("Controller error: {0}")]
    Controller(String),

    /// No gamepad found on the system
    #[error("No gamepad found")]
    ControllerNotFound,

    /// Transient read failure on an open gamepad
    #[error("Input device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Transient video capture failure
    #[error("Video error: {0}")]
    Video(String),

    /// Telemetry could not be read (never fatal)
    #[error("Telemetry unavailable")]
    TelemetryUnavailable,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Drone HUD
pub type Result<T> = std::result::Result<T, HudError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn test_config_error_message() {
        let err = HudError::Config(toml::de::Error::custom("deadzone must be below 1.0"));
        assert!(err.to_string().contains("deadzone must be below 1.0"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: HudError = io.into();
        assert!(matches!(err, HudError::Io(_)));
    }
}
