//! # Controller Input Mapper Module
//!
//! Identities of the tracked axes and buttons, their evdev codes on an
//! Xbox One style gamepad, and the [`ControllerState`] snapshot the sampler
//! builds each poll.
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Range | Default use |
//! |------|------------|-------|-------------|
//! | Left Stick X | ABS_X | -32768..32767 | Yaw |
//! | Left Stick Y | ABS_Y | -32768..32767 | Throttle (up/down) |
//! | Right Stick X | ABS_RX | -32768..32767 | Roll (left/right) |
//! | Right Stick Y | ABS_RY | -32768..32767 | Pitch (forward/back) |
//! | Left Trigger | ABS_Z | 0..1023 | Unused by default |
//! | Right Trigger | ABS_RZ | 0..1023 | Unused by default |
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code | Fallback |
//! |--------|------------|----------|
//! | A | BTN_SOUTH | |
//! | B | BTN_EAST | |
//! | X | BTN_WEST | |
//! | Y | BTN_NORTH | |
//! | LB / RB | BTN_TL / BTN_TR | |
//! | Left / Right thumb | BTN_THUMBL / BTN_THUMBR | |
//! | Back | BTN_SELECT | |
//! | Start | BTN_START | Takeoff / land |
//! | Guide | BTN_MODE | |
//! | D-Pad | BTN_TRIGGER_HAPPY1..4 | ABS_HAT0X / ABS_HAT0Y |

use evdev::{AbsoluteAxisType, Key};
use serde::Deserialize;

/// Analog axis identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisId {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftTrigger,
    RightTrigger,
}

impl AxisId {
    /// Number of tracked axes.
    pub const COUNT: usize = 6;

    /// All tracked axes, in index order.
    pub const ALL: [AxisId; Self::COUNT] = [
        AxisId::LeftStickX,
        AxisId::LeftStickY,
        AxisId::RightStickX,
        AxisId::RightStickY,
        AxisId::LeftTrigger,
        AxisId::RightTrigger,
    ];

    /// Stable index into per-axis arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// evdev absolute axis reporting this input.
    #[must_use]
    pub fn evdev_axis(self) -> AbsoluteAxisType {
        match self {
            AxisId::LeftStickX => AbsoluteAxisType::ABS_X,
            AxisId::LeftStickY => AbsoluteAxisType::ABS_Y,
            AxisId::RightStickX => AbsoluteAxisType::ABS_RX,
            AxisId::RightStickY => AbsoluteAxisType::ABS_RY,
            AxisId::LeftTrigger => AbsoluteAxisType::ABS_Z,
            AxisId::RightTrigger => AbsoluteAxisType::ABS_RZ,
        }
    }

    /// Returns `true` for stick axes (bipolar, centred at rest).
    #[must_use]
    pub fn is_stick(self) -> bool {
        !matches!(self, AxisId::LeftTrigger | AxisId::RightTrigger)
    }
}

/// Digital button identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonId {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    LeftThumb,
    RightThumb,
    Back,
    Start,
    Guide,
    DPadLeft,
    DPadRight,
    DPadUp,
    DPadDown,
}

/// Where a button's state comes from on the evdev device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSource {
    /// A plain key code.
    Key(Key),
    /// A key code, or one direction of a hat axis when the driver reports
    /// the d-pad as a hat (`-1` / `1`).
    KeyOrHat(Key, AbsoluteAxisType, i32),
}

impl ButtonId {
    /// Number of tracked buttons.
    pub const COUNT: usize = 15;

    /// All tracked buttons, in index order.
    pub const ALL: [ButtonId; Self::COUNT] = [
        ButtonId::A,
        ButtonId::B,
        ButtonId::X,
        ButtonId::Y,
        ButtonId::LeftBumper,
        ButtonId::RightBumper,
        ButtonId::LeftThumb,
        ButtonId::RightThumb,
        ButtonId::Back,
        ButtonId::Start,
        ButtonId::Guide,
        ButtonId::DPadLeft,
        ButtonId::DPadRight,
        ButtonId::DPadUp,
        ButtonId::DPadDown,
    ];

    /// Stable index into per-button arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// evdev source of this button.
    #[must_use]
    pub fn source(self) -> ButtonSource {
        match self {
            ButtonId::A => ButtonSource::Key(Key::BTN_SOUTH),
            ButtonId::B => ButtonSource::Key(Key::BTN_EAST),
            ButtonId::X => ButtonSource::Key(Key::BTN_WEST),
            ButtonId::Y => ButtonSource::Key(Key::BTN_NORTH),
            ButtonId::LeftBumper => ButtonSource::Key(Key::BTN_TL),
            ButtonId::RightBumper => ButtonSource::Key(Key::BTN_TR),
            ButtonId::LeftThumb => ButtonSource::Key(Key::BTN_THUMBL),
            ButtonId::RightThumb => ButtonSource::Key(Key::BTN_THUMBR),
            ButtonId::Back => ButtonSource::Key(Key::BTN_SELECT),
            ButtonId::Start => ButtonSource::Key(Key::BTN_START),
            ButtonId::Guide => ButtonSource::Key(Key::BTN_MODE),
            ButtonId::DPadLeft => {
                ButtonSource::KeyOrHat(Key::BTN_TRIGGER_HAPPY1, AbsoluteAxisType::ABS_HAT0X, -1)
            }
            ButtonId::DPadRight => {
                ButtonSource::KeyOrHat(Key::BTN_TRIGGER_HAPPY2, AbsoluteAxisType::ABS_HAT0X, 1)
            }
            ButtonId::DPadUp => {
                ButtonSource::KeyOrHat(Key::BTN_TRIGGER_HAPPY3, AbsoluteAxisType::ABS_HAT0Y, -1)
            }
            ButtonId::DPadDown => {
                ButtonSource::KeyOrHat(Key::BTN_TRIGGER_HAPPY4, AbsoluteAxisType::ABS_HAT0Y, 1)
            }
        }
    }
}

/// One poll's worth of raw controller readings.
///
/// Axis values are raw device samples; filtering happens when the
/// [`CommandMapper`](super::command::CommandMapper) builds a command.
///
/// ```
/// use drone_hud::controller::mapper::{AxisId, ButtonId, ControllerState};
///
/// let mut state = ControllerState::new();
/// state.set_axis(AxisId::RightStickX, 12000.0);
/// state.set_button(ButtonId::Start, true);
///
/// assert_eq!(state.axis(AxisId::RightStickX), 12000.0);
/// assert!(state.button(ButtonId::Start));
/// assert!(!state.button(ButtonId::A));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    axes: [f32; AxisId::COUNT],
    buttons: [bool; ButtonId::COUNT],
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            axes: [0.0; AxisId::COUNT],
            buttons: [false; ButtonId::COUNT],
        }
    }
}

impl ControllerState {
    /// Creates a state with all axes at 0 and buttons released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of an axis.
    #[must_use]
    pub fn axis(&self, axis: AxisId) -> f32 {
        self.axes[axis.index()]
    }

    /// Sets the raw value of an axis.
    pub fn set_axis(&mut self, axis: AxisId, value: f32) {
        self.axes[axis.index()] = value;
    }

    /// Whether a button is held.
    #[must_use]
    pub fn button(&self, button: ButtonId) -> bool {
        self.buttons[button.index()]
    }

    /// Sets a button's held state.
    pub fn set_button(&mut self, button: ButtonId, pressed: bool) {
        self.buttons[button.index()] = pressed;
    }
}
