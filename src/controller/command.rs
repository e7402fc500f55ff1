//! # Command Vector Mapping
//!
//! Maps a [`ControllerState`] onto the drone's four motion components.
//!
//! ## Default Assignments
//!
//! | Component | Input | Drone motion |
//! |-----------|-------|--------------|
//! | Roll | Right Stick X | Left / right |
//! | Pitch | Right Stick Y (reversed) | Forward / back |
//! | Throttle | Left Stick Y (reversed) | Up / down |
//! | Yaw | Left Stick X | Rotate |
//!
//! Stick Y axes report "up" as negative, hence the default reversal of
//! pitch and throttle so that pushing a stick forward yields a positive
//! command.
//!
//! Sticks are filtered over `axis_min..axis_max`, triggers over
//! `trigger_min..trigger_max` onto the positive half of the output.

use serde::Deserialize;

use super::calibration::{AxisFilter, AxisRange, OutputRange, ResponseCurve};
use super::mapper::{AxisId, ControllerState};
use crate::config::{CommandConfig, ControllerConfig};

/// Motion component of a [`CommandVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAxis {
    Pitch,
    Roll,
    Yaw,
    Throttle,
}

impl CommandAxis {
    /// All components, in vector order.
    pub const ALL: [CommandAxis; 4] = [
        CommandAxis::Pitch,
        CommandAxis::Roll,
        CommandAxis::Yaw,
        CommandAxis::Throttle,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Normalized motion command (pitch, roll, yaw, throttle).
///
/// Every component lies within the mapper's output range.
///
/// ```
/// use drone_hud::controller::command::CommandVector;
///
/// let hover = CommandVector::default();
/// assert!(hover.is_neutral());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandVector {
    pub pitch: i32,
    pub roll: i32,
    pub yaw: i32,
    pub throttle: i32,
}

impl CommandVector {
    /// Reads one component.
    #[must_use]
    pub fn get(&self, axis: CommandAxis) -> i32 {
        match axis {
            CommandAxis::Pitch => self.pitch,
            CommandAxis::Roll => self.roll,
            CommandAxis::Yaw => self.yaw,
            CommandAxis::Throttle => self.throttle,
        }
    }

    fn set(&mut self, axis: CommandAxis, value: i32) {
        match axis {
            CommandAxis::Pitch => self.pitch = value,
            CommandAxis::Roll => self.roll = value,
            CommandAxis::Yaw => self.yaw = value,
            CommandAxis::Throttle => self.throttle = value,
        }
    }

    /// All-zero vector, i.e. hover in place.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-component mapping: source axis, filter, reversal.
#[derive(Debug, Clone, Copy)]
struct ComponentMap {
    source: AxisId,
    filter: AxisFilter,
    reversed: bool,
}

/// Builds [`CommandVector`]s from controller snapshots.
#[derive(Debug, Clone)]
pub struct CommandMapper {
    components: [ComponentMap; 4],
    output: OutputRange,
}

impl CommandMapper {
    /// Creates a mapper from validated configuration.
    ///
    /// ```
    /// use drone_hud::config::Config;
    /// use drone_hud::controller::command::CommandMapper;
    /// use drone_hud::controller::mapper::{AxisId, ControllerState};
    ///
    /// let config = Config::default();
    /// let mapper = CommandMapper::from_config(&config.controller, &config.command);
    ///
    /// let mut state = ControllerState::new();
    /// state.set_axis(AxisId::RightStickX, 32767.0);
    /// state.set_axis(AxisId::LeftStickY, -32768.0); // stick pushed up
    ///
    /// let command = mapper.map(&state);
    /// assert_eq!(command.roll, 100);
    /// assert_eq!(command.throttle, 100);
    /// assert_eq!(command.pitch, 0);
    /// ```
    #[must_use]
    pub fn from_config(controller: &ControllerConfig, command: &CommandConfig) -> Self {
        let stick = AxisRange::new(controller.axis_min, controller.axis_max);
        let trigger = AxisRange::one_sided(controller.trigger_min, controller.trigger_max);
        let output = OutputRange::new(command.output_min, command.output_max);

        let component = |axis: CommandAxis, source: AxisId, expo: f32| ComponentMap {
            source,
            filter: AxisFilter::new(
                if source.is_stick() { stick } else { trigger },
                controller.deadzone,
                ResponseCurve::from_expo(expo),
                output,
            ),
            reversed: command.reverse.contains(&axis),
        };

        Self {
            components: [
                component(CommandAxis::Pitch, command.pitch, controller.expo_pitch),
                component(CommandAxis::Roll, command.roll, controller.expo_roll),
                component(CommandAxis::Yaw, command.yaw, controller.expo_yaw),
                component(CommandAxis::Throttle, command.throttle, controller.expo_throttle),
            ],
            output,
        }
    }

    /// Axis feeding a component.
    #[must_use]
    pub fn source(&self, axis: CommandAxis) -> AxisId {
        self.components[axis.index()].source
    }

    /// Filters every mapped axis and assembles a command.
    #[must_use]
    pub fn map(&self, state: &ControllerState) -> CommandVector {
        let mut command = CommandVector::default();
        for axis in CommandAxis::ALL {
            let component = &self.components[axis.index()];
            let value = component.filter.apply_rounded(state.axis(component.source));
            command.set(axis, self.apply_reverse(value, component.reversed));
        }
        command
    }

    /// Mirrors a value through zero, keeping it inside the output range.
    #[inline]
    fn apply_reverse(&self, value: i32, reversed: bool) -> i32 {
        if reversed {
            self.output.clamp(-value)
        } else {
            value
        }
    }
}
