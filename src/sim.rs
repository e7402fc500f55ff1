//! # Simulated Drone
//!
//! Stand-in drone session for running the HUD without hardware:
//!
//! - [`SimVideo`]: 960x720 colour-bar test pattern with a moving scan line
//!   at ~30 fps
//! - [`SimBattery`]: charge draining slowly on the ground and faster in the
//!   air
//! - [`SimDrone`]: accepts motion commands and takeoff / land
//!
//! All three share one state, so flying drains the battery the gauge
//! reports. Time comes from `tokio::time`.

use image::Rgb;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, trace, warn};

use crate::controller::command::CommandVector;
use crate::dispatch::DroneControl;
use crate::error::{HudError, Result};
use crate::overlay::{fill_rect, Rect};
use crate::telemetry::BatteryGauge;
use crate::video::{Frame, FrameBuf, VideoSource};

/// Native camera resolution
pub const SIM_WIDTH: u32 = 960;
pub const SIM_HEIGHT: u32 = 720;

/// Time between simulated frames (~30 fps)
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Battery drain in percent per second
const IDLE_DRAIN: f32 = 0.02;
const FLYING_DRAIN: f32 = 0.2;

/// Colour bars, left to right
const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

#[derive(Debug)]
struct SimState {
    flying: bool,
    charge: f32,
    charge_at: Instant,
    last_command: CommandVector,
}

impl SimState {
    fn drain(&mut self, now: Instant) {
        let rate = if self.flying { FLYING_DRAIN } else { IDLE_DRAIN };
        let elapsed = now.saturating_duration_since(self.charge_at).as_secs_f32();
        self.charge = (self.charge - elapsed * rate).max(0.0);
        self.charge_at = now;
    }
}

type Shared = Arc<Mutex<SimState>>;

fn lock(state: &Shared) -> MutexGuard<'_, SimState> {
    // A panicking holder cannot leave the plain-data state inconsistent
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Simulated drone session.
#[derive(Debug, Clone)]
pub struct SimDrone {
    state: Shared,
}

impl Default for SimDrone {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDrone {
    /// A grounded drone with a full battery.
    #[must_use]
    pub fn new() -> Self {
        Self::with_charge(100.0)
    }

    /// A grounded drone with `charge` percent left.
    #[must_use]
    pub fn with_charge(charge: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                flying: false,
                charge: charge.clamp(0.0, 100.0),
                charge_at: Instant::now(),
                last_command: CommandVector::default(),
            })),
        }
    }

    /// Camera stream of this drone.
    #[must_use]
    pub fn video(&self) -> SimVideo {
        SimVideo::new()
    }

    /// Battery gauge of this drone.
    #[must_use]
    pub fn battery(&self) -> SimBattery {
        SimBattery {
            state: Arc::clone(&self.state),
        }
    }

    #[must_use]
    pub fn is_flying(&self) -> bool {
        lock(&self.state).flying
    }

    #[must_use]
    pub fn last_command(&self) -> CommandVector {
        lock(&self.state).last_command
    }
}

impl DroneControl for SimDrone {
    fn send_motion_command(&mut self, command: CommandVector) -> Result<()> {
        let mut state = lock(&self.state);
        state.last_command = command;
        trace!("sim motion {:?}", command);
        Ok(())
    }

    fn takeoff(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.drain(Instant::now());
        if state.charge < 1.0 {
            return Err(HudError::DeviceUnavailable("battery empty".into()));
        }
        if state.flying {
            warn!("sim drone already flying");
        }
        state.flying = true;
        info!("sim drone took off");
        Ok(())
    }

    fn land(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.drain(Instant::now());
        state.flying = false;
        info!("sim drone landed");
        Ok(())
    }
}

/// Battery gauge of a [`SimDrone`].
#[derive(Debug)]
pub struct SimBattery {
    state: Shared,
}

impl BatteryGauge for SimBattery {
    fn battery_percent(&mut self) -> Result<u8> {
        let mut state = lock(&self.state);
        state.drain(Instant::now());
        Ok(state.charge.round() as u8)
    }
}

/// Test-pattern camera stream.
#[derive(Debug)]
pub struct SimVideo {
    pattern: FrameBuf,
    frames: u64,
    last_frame: Option<Instant>,
    stopped: bool,
}

impl SimVideo {
    fn new() -> Self {
        let mut pattern = FrameBuf::new(SIM_WIDTH, SIM_HEIGHT);
        let bar_width = SIM_WIDTH / BARS.len() as u32 + 1;
        for (i, color) in BARS.iter().enumerate() {
            let rect = Rect::new(i as u32 * bar_width, 0, bar_width, SIM_HEIGHT);
            fill_rect(&mut pattern, rect, Rgb(*color));
        }
        Self {
            pattern,
            frames: 0,
            last_frame: None,
            stopped: false,
        }
    }

    /// Frames produced so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl VideoSource for SimVideo {
    fn capture_frame(&mut self) -> Result<Option<Frame>> {
        if self.stopped {
            return Err(HudError::Video("capture stopped".into()));
        }

        let now = Instant::now();
        if let Some(last) = self.last_frame {
            if now.saturating_duration_since(last) < FRAME_INTERVAL {
                return Ok(None);
            }
        }
        self.last_frame = Some(now);

        let mut buf = self.pattern.clone();
        let line_y = (self.frames as u32 * 8) % SIM_HEIGHT;
        fill_rect(&mut buf, Rect::new(0, line_y, SIM_WIDTH, 4), Rgb([255, 255, 255]));
        self.frames += 1;

        Ok(Some(Frame::new(buf)))
    }

    fn stop_video(&mut self) {
        self.stopped = true;
        info!("sim video stopped after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_battery_drains_faster_in_flight() {
        let mut drone = SimDrone::new();
        let mut battery = drone.battery();
        assert_eq!(battery.battery_percent().unwrap(), 100);

        // 100s on the ground: 2%
        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(battery.battery_percent().unwrap(), 98);

        // 100s in the air: 20%
        drone.takeoff().unwrap();
        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(battery.battery_percent().unwrap(), 78);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_battery_refuses_takeoff() {
        let mut drone = SimDrone::with_charge(0.5);
        assert!(drone.takeoff().is_err());
        assert!(!drone.is_flying());
    }

    #[test]
    fn test_motion_commands_recorded() {
        let mut drone = SimDrone::new();
        let command = CommandVector {
            pitch: 10,
            roll: -20,
            yaw: 0,
            throttle: 5,
        };
        drone.send_motion_command(command).unwrap();
        assert_eq!(drone.last_command(), command);
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_frame_rate() {
        let mut video = SimDrone::new().video();

        let first = video.capture_frame().unwrap().unwrap();
        assert_eq!(first.dimensions(), (SIM_WIDTH, SIM_HEIGHT));
        assert!(video.capture_frame().unwrap().is_none());

        tokio::time::advance(FRAME_INTERVAL).await;
        let second = video.capture_frame().unwrap().unwrap();
        assert_ne!(first, second, "scan line should move");
        assert_eq!(video.frames(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_video_errors() {
        let mut video = SimDrone::new().video();
        video.stop_video();
        assert!(matches!(video.capture_frame(), Err(HudError::Video(_))));
    }
}
