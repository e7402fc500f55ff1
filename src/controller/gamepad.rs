//! # Gamepad Device Module
//!
//! Device access for the input sampler: a small trait seam
//! ([`Gamepad`] / [`GamepadConnector`]) and its evdev implementation.
//!
//! ## Detection
//!
//! With no explicit device path, `/dev/input/event*` nodes are scanned in
//! sorted order and the first device exposing gamepad buttons (`BTN_SOUTH`,
//! `BTN_START`) and a left stick (`ABS_X`, `ABS_Y`) is used. Microsoft
//! (vendor 0x045e) pads are preferred when several are connected.
//!
//! ## Reading
//!
//! State is read with the `EVIOCGABS` / `EVIOCGKEY` ioctls, which return the
//! kernel's current view of every axis and key without waiting for events.
//! A poll therefore never blocks; an unplugged pad fails the ioctl, which
//! surfaces as [`HudError::DeviceUnavailable`].

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::mapper::{AxisId, ButtonId, ButtonSource, ControllerState};
use crate::error::{HudError, Result};

/// Microsoft vendor ID (Xbox controllers)
const XBOX_VENDOR_ID: u16 = 0x045e;

/// Directory scanned for input devices
const INPUT_DIR: &str = "/dev/input";

/// An open controller handle, owned by the input sampler.
pub trait Gamepad: Send {
    /// Reads the current raw value of one axis.
    fn read_axis(&mut self, axis: AxisId) -> Result<f32>;

    /// Reads whether one button is held.
    fn read_button(&mut self, button: ButtonId) -> Result<bool>;

    /// Reads every tracked axis and button.
    ///
    /// The default issues one read per input; implementations with a bulk
    /// read override it.
    fn read_state(&mut self) -> Result<ControllerState> {
        let mut state = ControllerState::new();
        for axis in AxisId::ALL {
            state.set_axis(axis, self.read_axis(axis)?);
        }
        for button in ButtonId::ALL {
            state.set_button(button, self.read_button(button)?);
        }
        Ok(state)
    }

    /// Releases the handle.
    fn disconnect(self)
    where
        Self: Sized;
}

/// Opens controller handles. Called again after a handle fails.
pub trait GamepadConnector: Send + 'static {
    type Device: Gamepad + 'static;

    /// Opens a controller, or fails if none is available right now.
    fn connect(&mut self) -> Result<Self::Device>;
}

/// evdev-backed gamepad handle
pub struct EvdevGamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for EvdevGamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevGamepad")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl EvdevGamepad {
    /// Opens a specific event device.
    ///
    /// # Errors
    ///
    /// - `Controller`: the node cannot be opened or is not a gamepad
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path)
            .map_err(|e| HudError::Controller(format!("Failed to open {}: {}", path.display(), e)))?;

        if !is_gamepad(&device) {
            return Err(HudError::Controller(format!(
                "{} does not look like a gamepad",
                path.display()
            )));
        }

        Ok(Self::from_device(device, path))
    }

    /// Detects and opens the first available gamepad.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No gamepad found on the system
    /// - `Controller`: `/dev/input` cannot be read
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use drone_hud::controller::gamepad::EvdevGamepad;
    ///
    /// let pad = EvdevGamepad::detect()?;
    /// println!("Connected to controller at: {}", pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn detect() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(HudError::Controller(format!("{} directory not found", INPUT_DIR)));
        }

        let mut entries: Vec<PathBuf> = std::fs::read_dir(input_dir)
            .map_err(|e| HudError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .map_or(false, |name| name.to_string_lossy().starts_with("event"))
            })
            .collect();

        // Sort entries for deterministic device selection
        entries.sort();

        let mut fallback: Option<(Device, PathBuf)> = None;

        for path in entries {
            let device = match Device::open(&path) {
                Ok(device) => device,
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                    continue;
                }
            };

            let id = device.input_id();
            debug!(
                "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                path.display(),
                id.vendor(),
                id.product()
            );

            if !is_gamepad(&device) {
                continue;
            }

            if id.vendor() == XBOX_VENDOR_ID {
                return Ok(Self::from_device(device, &path));
            }

            if fallback.is_none() {
                fallback = Some((device, path));
            }
        }

        match fallback {
            Some((device, path)) => Ok(Self::from_device(device, &path)),
            None => Err(HudError::ControllerNotFound),
        }
    }

    fn from_device(device: Device, path: &Path) -> Self {
        let device_path = path.to_string_lossy().to_string();
        info!(
            "Using gamepad {} at {}",
            device.name().unwrap_or("(unnamed)"),
            device_path
        );
        Self {
            device,
            device_path,
        }
    }

    /// Get the device path of this controller
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get controller name from evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    fn unavailable(&self, e: std::io::Error) -> HudError {
        HudError::DeviceUnavailable(format!("{}: {}", self.device_path, e))
    }
}

/// Whether a device exposes the buttons and stick a gamepad must have.
fn is_gamepad(device: &Device) -> bool {
    let has_keys = device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH) && keys.contains(Key::BTN_START));
    let has_stick = device.supported_absolute_axes().map_or(false, |axes| {
        axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
    });
    has_keys && has_stick
}

impl Gamepad for EvdevGamepad {
    fn read_axis(&mut self, axis: AxisId) -> Result<f32> {
        let abs = self.device.get_abs_state().map_err(|e| self.unavailable(e))?;
        Ok(abs[axis.evdev_axis().0 as usize].value as f32)
    }

    fn read_button(&mut self, button: ButtonId) -> Result<bool> {
        let keys = self.device.get_key_state().map_err(|e| self.unavailable(e))?;
        match button.source() {
            ButtonSource::Key(key) => Ok(keys.contains(key)),
            ButtonSource::KeyOrHat(key, hat, direction) => {
                if keys.contains(key) {
                    return Ok(true);
                }
                let abs = self.device.get_abs_state().map_err(|e| self.unavailable(e))?;
                Ok(abs[hat.0 as usize].value == direction)
            }
        }
    }

    fn read_state(&mut self) -> Result<ControllerState> {
        // Two ioctls per poll instead of one per input
        let abs = self.device.get_abs_state().map_err(|e| self.unavailable(e))?;
        let keys = self.device.get_key_state().map_err(|e| self.unavailable(e))?;
        let abs_value = |axis: AbsoluteAxisType| abs[axis.0 as usize].value;

        let mut state = ControllerState::new();
        for axis in AxisId::ALL {
            state.set_axis(axis, abs_value(axis.evdev_axis()) as f32);
        }
        for button in ButtonId::ALL {
            let held = match button.source() {
                ButtonSource::Key(key) => keys.contains(key),
                ButtonSource::KeyOrHat(key, hat, direction) => {
                    keys.contains(key) || abs_value(hat) == direction
                }
            };
            state.set_button(button, held);
        }
        Ok(state)
    }

    fn disconnect(self) {
        info!("Releasing gamepad at {}", self.device_path);
        // Dropping the evdev device closes the file descriptor
        drop(self.device);
    }
}

/// Connector that opens evdev gamepads, by path or by auto-detection.
#[derive(Debug, Clone, Default)]
pub struct EvdevConnector {
    device_path: Option<PathBuf>,
}

impl EvdevConnector {
    /// Auto-detects when `device_path` is empty.
    #[must_use]
    pub fn new(device_path: &str) -> Self {
        Self {
            device_path: (!device_path.is_empty()).then(|| PathBuf::from(device_path)),
        }
    }
}

impl GamepadConnector for EvdevConnector {
    type Device = EvdevGamepad;

    fn connect(&mut self) -> Result<EvdevGamepad> {
        match &self.device_path {
            Some(path) => EvdevGamepad::open_path(path),
            None => EvdevGamepad::detect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPad {
        state: ControllerState,
    }

    impl Gamepad for ScriptedPad {
        fn read_axis(&mut self, axis: AxisId) -> Result<f32> {
            Ok(self.state.axis(axis))
        }

        fn read_button(&mut self, button: ButtonId) -> Result<bool> {
            Ok(self.state.button(button))
        }

        fn disconnect(self) {}
    }

    #[test]
    fn test_xbox_vendor_id() {
        assert_eq!(XBOX_VENDOR_ID, 0x045e, "Microsoft vendor ID should be 0x045e");
    }

    #[test]
    fn test_default_read_state_collects_every_input() {
        let mut state = ControllerState::new();
        state.set_axis(AxisId::RightStickY, -1234.0);
        state.set_button(ButtonId::Guide, true);
        let mut pad = ScriptedPad {
            state: state.clone(),
        };
        assert_eq!(pad.read_state().unwrap(), state);
    }

    #[test]
    fn test_connector_path_selection() {
        assert!(EvdevConnector::new("").device_path.is_none());
        assert_eq!(
            EvdevConnector::new("/dev/input/event3").device_path,
            Some(PathBuf::from("/dev/input/event3"))
        );
    }

    #[test]
    fn test_open_missing_path_fails() {
        let result = EvdevGamepad::open_path("/dev/input/nonexistent_event_device");
        match result {
            Err(HudError::Controller(msg)) => assert!(msg.contains("nonexistent_event_device")),
            other => panic!("Expected Controller error, got: {:?}", other),
        }
    }

    #[test]
    fn test_connector_reports_missing_device() {
        let mut connector = EvdevConnector::new("/dev/input/nonexistent_event_device");
        assert!(connector.connect().is_err());
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_detect_with_real_hardware() {
        let mut pad = EvdevGamepad::detect().expect("Controller not found");
        assert!(pad.device_path().starts_with("/dev/input/event"));
        let state = pad.read_state().expect("read failed");
        println!("Controller state: {:?}", state);
    }
}
