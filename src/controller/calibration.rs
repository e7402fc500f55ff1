//! # Axis Filter
//!
//! Turns a raw analog sample into a clean directional command component.
//!
//! ## Pipeline
//!
//! 1. Clamp the raw sample to the device's declared range.
//! 2. Centre-normalize to -1.0..=1.0 (range midpoint is 0.0).
//! 3. Deadzone: magnitudes at or below the threshold become exactly 0.0;
//!    the rest of the travel is stretched back over 0.0..=1.0.
//! 4. Response curve: `output = (1 - expo) * input + expo * input³`.
//! 5. Scale into the output range, positive and negative halves separately.
//!
//! - `expo = 0.0`: Linear response
//! - `expo = 0.3`: Mild curve
//! - `expo = 0.7`: Strong curve
//!
//! ## Usage
//!
//! ```
//! use drone_hud::controller::calibration::{AxisFilter, AxisRange, OutputRange, ResponseCurve};
//!
//! let filter = AxisFilter::new(
//!     AxisRange::new(-1.0, 1.0),
//!     0.1,
//!     ResponseCurve::Linear,
//!     OutputRange::new(-100, 100),
//! );
//!
//! assert_eq!(filter.apply(0.05), 0.0);            // inside the deadzone
//! assert!((filter.apply(0.55) - 50.0).abs() < 0.01); // midpoint of usable travel
//! assert_eq!(filter.apply(1.0), 100.0);
//! assert_eq!(filter.apply(-1.0), -100.0);
//! ```

/// Raw device range of one axis.
///
/// Sticks are centred: the midpoint reads as zero and the ends as -1.0 and
/// 1.0. Triggers are one-sided: `min` is rest and `max` reads as 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    min: f32,
    max: f32,
    one_sided: bool,
}

impl AxisRange {
    /// Creates a centred device range. `min` must be below `max`;
    /// configuration validation guarantees this for ranges read from a file.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            one_sided: false,
        }
    }

    /// Creates a one-sided range resting at `min`.
    #[must_use]
    pub fn one_sided(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            one_sided: true,
        }
    }

    /// Raw value that normalizes to zero.
    #[must_use]
    pub fn center(&self) -> f32 {
        if self.one_sided {
            self.min
        } else {
            (self.min + self.max) / 2.0
        }
    }

    /// Clamps `raw` into the range and maps it to -1.0..=1.0 (0.0..=1.0 for
    /// a one-sided range).
    ///
    /// ```
    /// use drone_hud::controller::calibration::AxisRange;
    ///
    /// let range = AxisRange::new(-32768.0, 32767.0);
    /// assert_eq!(range.normalize(32767.0), 1.0);
    /// assert_eq!(range.normalize(-32768.0), -1.0);
    /// assert_eq!(range.normalize(99999.0), 1.0);
    ///
    /// let trigger = AxisRange::one_sided(0.0, 1023.0);
    /// assert_eq!(trigger.normalize(0.0), 0.0);
    /// assert_eq!(trigger.normalize(1023.0), 1.0);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: f32) -> f32 {
        let span = if self.one_sided {
            self.max - self.min
        } else {
            (self.max - self.min) / 2.0
        };
        if span <= 0.0 || raw.is_nan() {
            return 0.0;
        }
        let clamped = raw.clamp(self.min, self.max);
        ((clamped - self.center()) / span).clamp(-1.0, 1.0)
    }
}

/// Signed output range of a command component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRange {
    min: i32,
    max: i32,
}

impl OutputRange {
    /// Creates an output range; expected to satisfy `min < 0 < max`.
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Scales a -1.0..=1.0 value, using each half of the range for its sign.
    #[must_use]
    pub fn scale(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(-1.0, 1.0);
        if normalized >= 0.0 {
            normalized * self.max as f32
        } else {
            normalized * -(self.min as f32)
        }
    }

    /// Clamps an integer into the range.
    #[must_use]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// Shape applied after the deadzone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ResponseCurve {
    /// Output proportional to stick travel.
    #[default]
    Linear,
    /// Cubic blend; the factor is clamped to 0.0..=1.0.
    Expo(f32),
}

impl ResponseCurve {
    /// Builds a curve from a config expo factor; 0.0 means linear.
    #[must_use]
    pub fn from_expo(expo: f32) -> Self {
        if expo <= 0.0 {
            Self::Linear
        } else {
            Self::Expo(expo.min(1.0))
        }
    }

    /// Applies the curve to a magnitude in 0.0..=1.0.
    #[inline]
    fn shape(&self, input: f32) -> f32 {
        match *self {
            Self::Linear => input,
            Self::Expo(expo) => {
                let linear = (1.0 - expo) * input;
                let cubic = expo * input * input * input;
                linear + cubic
            }
        }
    }
}

/// Pure per-axis filter: clamp, deadzone, curve, scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisFilter {
    input: AxisRange,
    /// Deadzone as a fraction of half-travel (0.0 to just below 1.0).
    deadzone: f32,
    curve: ResponseCurve,
    output: OutputRange,
}

impl AxisFilter {
    /// Creates a filter. The deadzone is clamped into 0.0..1.0; ranges come
    /// from validated configuration.
    #[must_use]
    pub fn new(input: AxisRange, deadzone: f32, curve: ResponseCurve, output: OutputRange) -> Self {
        Self {
            input,
            deadzone: deadzone.clamp(0.0, 0.999),
            curve,
            output,
        }
    }

    /// Filters a raw device sample into the output range.
    ///
    /// Inside the deadzone the result is exactly `0.0`; at either end of the
    /// device range it is exactly the matching end of the output range.
    #[must_use]
    pub fn apply(&self, raw: f32) -> f32 {
        let normalized = self.input.normalize(raw);
        self.output.scale(self.shape_normalized(normalized))
    }

    /// Filters a raw sample and rounds to the nearest integer step.
    ///
    /// ```
    /// use drone_hud::controller::calibration::{AxisFilter, AxisRange, OutputRange, ResponseCurve};
    ///
    /// let filter = AxisFilter::new(
    ///     AxisRange::new(-32768.0, 32767.0),
    ///     0.15,
    ///     ResponseCurve::Linear,
    ///     OutputRange::new(-100, 100),
    /// );
    /// assert_eq!(filter.apply_rounded(0.0), 0);
    /// assert_eq!(filter.apply_rounded(32767.0), 100);
    /// ```
    #[must_use]
    pub fn apply_rounded(&self, raw: f32) -> i32 {
        self.output.clamp(self.apply(raw).round() as i32)
    }

    /// Applies deadzone and curve to a value already in -1.0..=1.0.
    fn shape_normalized(&self, normalized: f32) -> f32 {
        let sign = normalized.signum();
        let magnitude = normalized.abs().min(1.0);

        let after_deadzone = self.apply_deadzone(magnitude);
        if after_deadzone == 0.0 {
            // Avoid -0.0 leaking out of the filter
            return 0.0;
        }

        sign * self.curve.shape(after_deadzone)
    }

    /// Maps magnitudes within the deadzone to 0, and scales the remaining
    /// range to 0..1.
    #[inline]
    fn apply_deadzone(&self, magnitude: f32) -> f32 {
        if magnitude <= self.deadzone {
            0.0
        } else {
            (magnitude - self.deadzone) / (1.0 - self.deadzone)
        }
    }
}
