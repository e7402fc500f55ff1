//! # Telemetry Module
//!
//! Drone telemetry as seen by the overlay.
//!
//! This module handles:
//! - Timestamped readings ([`TelemetryValue`])
//! - The read seam the overlay renderer consumes ([`TelemetrySource`])
//! - The drone-side battery read ([`BatteryGauge`])
//! - A background poller that moves readings from the gauge into a
//!   [`SharedSlot`] ([`TelemetryPoller`])
//!
//! Timestamps are `tokio::time::Instant`, so staleness follows the paused
//! clock in tests.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{HudError, Result};
use crate::slot::SharedSlot;
use crate::task::Periodic;

/// Highest battery reading
pub const MAX_PERCENT: u8 = 100;

/// Battery percentage with the instant it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryValue {
    pub percent: u8,
    pub timestamp: Instant,
}

impl TelemetryValue {
    /// Creates a reading, clamping `percent` to 100.
    #[must_use]
    pub fn new(percent: u8, timestamp: Instant) -> Self {
        Self {
            percent: percent.min(MAX_PERCENT),
            timestamp,
        }
    }

    /// Creates a reading stamped with the current instant.
    #[must_use]
    pub fn now(percent: u8) -> Self {
        Self::new(percent, Instant::now())
    }

    /// Time elapsed since the reading, zero if it is from the future.
    #[must_use]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.timestamp)
    }

    /// Returns `true` if the reading is older than `threshold`.
    ///
    /// ```
    /// use drone_hud::telemetry::TelemetryValue;
    /// use std::time::Duration;
    /// use tokio::time::Instant;
    ///
    /// let read_at = Instant::now();
    /// let value = TelemetryValue::new(80, read_at);
    /// let limit = Duration::from_secs(3);
    ///
    /// assert!(!value.is_stale(read_at + Duration::from_secs(3), limit));
    /// assert!(value.is_stale(read_at + Duration::from_secs(4), limit));
    /// ```
    #[must_use]
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        self.age(now) > threshold
    }
}

/// Thread-safe read of the current telemetry value.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySource: Send + Sync + 'static {
    /// # Errors
    ///
    /// - `TelemetryUnavailable`: no reading exists
    fn get_telemetry(&self) -> Result<TelemetryValue>;
}

impl TelemetrySource for SharedSlot<TelemetryValue> {
    fn get_telemetry(&self) -> Result<TelemetryValue> {
        self.latest()
            .map(|value| *value)
            .ok_or(HudError::TelemetryUnavailable)
    }
}

/// Battery read on the drone session.
#[cfg_attr(test, mockall::automock)]
pub trait BatteryGauge: Send + 'static {
    /// Current charge in percent.
    ///
    /// # Errors
    ///
    /// - `TelemetryUnavailable`: the drone did not answer
    fn battery_percent(&mut self) -> Result<u8>;
}

/// Periodic job polling a [`BatteryGauge`] into a telemetry slot.
///
/// A failed read publishes nothing; the previous value ages until the
/// overlay shows it as unknown.
pub struct TelemetryPoller<G: BatteryGauge> {
    gauge: G,
    slot: SharedSlot<TelemetryValue>,
    failures: u32,
}

impl<G: BatteryGauge> TelemetryPoller<G> {
    #[must_use]
    pub fn new(gauge: G, slot: SharedSlot<TelemetryValue>) -> Self {
        Self {
            gauge,
            slot,
            failures: 0,
        }
    }
}

impl<G: BatteryGauge> Periodic for TelemetryPoller<G> {
    fn name(&self) -> &'static str {
        "telemetry poller"
    }

    fn tick(&mut self) {
        match self.gauge.battery_percent() {
            Ok(percent) => {
                self.failures = 0;
                self.slot.publish(TelemetryValue::now(percent));
            }
            Err(e) if self.failures == 0 => {
                self.failures = 1;
                warn!("Battery read failed: {}", e);
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                debug!("Battery read failed ({} in a row): {}", self.failures, e);
            }
        }
    }

    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Cadence, LoopTask};
    use mockall::Sequence;

    #[test]
    fn test_value_clamped_to_100() {
        let value = TelemetryValue::new(250, Instant::now());
        assert_eq!(value.percent, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness_follows_clock() {
        let value = TelemetryValue::now(50);
        let limit = Duration::from_millis(3000);
        assert!(!value.is_stale(Instant::now(), limit));

        tokio::time::advance(Duration::from_millis(3001)).await;
        assert!(value.is_stale(Instant::now(), limit));
        assert_eq!(value.age(Instant::now()), Duration::from_millis(3001));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let now = Instant::now();
        let value = TelemetryValue::new(10, now + Duration::from_secs(5));
        assert_eq!(value.age(now), Duration::ZERO);
    }

    #[test]
    fn test_empty_slot_is_unavailable() {
        let slot: SharedSlot<TelemetryValue> = SharedSlot::new();
        assert!(matches!(
            slot.get_telemetry(),
            Err(HudError::TelemetryUnavailable)
        ));

        slot.publish(TelemetryValue::now(64));
        assert_eq!(slot.get_telemetry().unwrap().percent, 64);
    }

    #[test]
    fn test_poller_publishes_reading() {
        let mut gauge = MockBatteryGauge::new();
        gauge.expect_battery_percent().times(1).returning(|| Ok(37));

        let slot = SharedSlot::new();
        let mut poller = TelemetryPoller::new(gauge, slot.clone());
        poller.tick();

        assert_eq!(slot.latest().unwrap().percent, 37);
    }

    #[test]
    fn test_poller_failure_keeps_old_value() {
        let mut seq = Sequence::new();
        let mut gauge = MockBatteryGauge::new();
        gauge
            .expect_battery_percent()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(90));
        gauge
            .expect_battery_percent()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|| Err(HudError::TelemetryUnavailable));

        let slot = SharedSlot::new();
        let mut poller = TelemetryPoller::new(gauge, slot.clone());
        poller.tick();
        let first = *slot.latest().unwrap();

        poller.tick();
        poller.tick();
        assert_eq!(*slot.latest().unwrap(), first);
        assert_eq!(poller.failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_runs_at_cadence() {
        let mut gauge = MockBatteryGauge::new();
        let mut level = 100u8;
        gauge.expect_battery_percent().returning(move || {
            level -= 1;
            Ok(level)
        });

        let slot = SharedSlot::new();
        let mut task = LoopTask::new(TelemetryPoller::new(gauge, slot.clone()), Cadence::from_millis(1000, 100));
        task.start();
        // Ticks at 0s, 1s and 2s
        tokio::time::sleep(Duration::from_millis(2500)).await;
        task.stop().await;

        assert_eq!(slot.latest().unwrap().percent, 97);
    }
}
