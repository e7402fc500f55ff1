//! # Input Sampler
//!
//! Background job that polls the gamepad, filters its axes into a
//! [`CommandVector`] and publishes it. Driven by a
//! [`LoopTask`](crate::task::LoopTask) at `controller.poll_interval_ms`.
//!
//! Each cycle:
//!
//! 1. Opens the device if no handle is held (first cycle, or after a failure).
//! 2. Reads every tracked axis and button.
//! 3. Feeds button levels to the edge detector.
//! 4. Maps the axes and publishes the command.
//!
//! A failed read releases the handle and skips the publish, so the slot keeps
//! the last good command. The next cycle reconnects, and its first read only
//! sets the button baseline: a button already held on reconnect is not a
//! press.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::command::{CommandMapper, CommandVector};
use super::edge::{ButtonEdges, EdgeDetector};
use super::gamepad::{Gamepad, GamepadConnector};
use crate::slot::SharedSlot;
use crate::task::Periodic;

/// Shared flag reporting whether the sampler currently holds a device.
#[derive(Debug, Clone, Default)]
pub struct ControllerLink {
    connected: Arc<AtomicBool>,
}

impl ControllerLink {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn set(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

/// Periodic job owning the controller handle.
pub struct InputSampler<C: GamepadConnector> {
    connector: C,
    device: Option<C::Device>,
    mapper: CommandMapper,
    detector: EdgeDetector,
    commands: SharedSlot<CommandVector>,
    link: ControllerLink,
    failed_connects: u32,
    /// Set when a held device was dropped; cleared by the next good read.
    resync_buttons: bool,
}

impl<C: GamepadConnector> InputSampler<C> {
    /// Creates a sampler. No device is opened until the first tick.
    #[must_use]
    pub fn new(
        connector: C,
        mapper: CommandMapper,
        commands: SharedSlot<CommandVector>,
        edges: ButtonEdges,
    ) -> Self {
        Self {
            connector,
            device: None,
            mapper,
            detector: EdgeDetector::new(edges),
            commands,
            link: ControllerLink::default(),
            failed_connects: 0,
            resync_buttons: false,
        }
    }

    /// Handle to the connection flag.
    #[must_use]
    pub fn link(&self) -> ControllerLink {
        self.link.clone()
    }

    fn ensure_connected(&mut self) -> bool {
        if self.device.is_some() {
            return true;
        }

        match self.connector.connect() {
            Ok(device) => {
                if self.failed_connects > 0 {
                    info!("Gamepad connected after {} failed attempts", self.failed_connects);
                }
                self.failed_connects = 0;
                self.device = Some(device);
                self.link.set(true);
                true
            }
            Err(e) => {
                // Warn once per outage, the loop retries every cycle
                if self.failed_connects == 0 {
                    warn!("Gamepad unavailable: {}", e);
                } else {
                    debug!("Gamepad still unavailable: {}", e);
                }
                self.failed_connects = self.failed_connects.saturating_add(1);
                false
            }
        }
    }

    fn drop_device(&mut self) {
        if let Some(device) = self.device.take() {
            device.disconnect();
            self.resync_buttons = true;
        }
        self.link.set(false);
    }
}

impl<C: GamepadConnector> Periodic for InputSampler<C> {
    fn name(&self) -> &'static str {
        "input sampler"
    }

    fn tick(&mut self) {
        if !self.ensure_connected() {
            return;
        }

        let read = match self.device.as_mut() {
            Some(device) => device.read_state(),
            None => return,
        };

        match read {
            Ok(state) => {
                if std::mem::take(&mut self.resync_buttons) {
                    self.detector.resync(&state);
                } else {
                    let presses = self.detector.observe_state(&state);
                    if presses > 0 {
                        debug!("{} button press(es) detected", presses);
                    }
                }
                self.commands.publish(self.mapper.map(&state));
            }
            Err(e) => {
                warn!("Gamepad read failed, keeping last command: {}", e);
                self.drop_device();
            }
        }
    }

    fn release(&mut self) {
        self.drop_device();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::controller::mapper::{AxisId, ButtonId, ControllerState};
    use crate::error::{HudError, Result};
    use crate::task::{Cadence, LoopTask};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted hardware shared between the fake connector, its pads and
    /// the test body.
    #[derive(Default)]
    struct FakeHardware {
        state: ControllerState,
        plugged: bool,
        fail_reads: bool,
        connects: u32,
        disconnects: u32,
    }

    #[derive(Clone, Default)]
    struct FakeConnector {
        hw: Arc<Mutex<FakeHardware>>,
    }

    struct FakePad {
        hw: Arc<Mutex<FakeHardware>>,
    }

    impl FakeConnector {
        fn plugged() -> Self {
            let connector = Self::default();
            connector.hw.lock().unwrap().plugged = true;
            connector
        }

        fn with<R>(&self, f: impl FnOnce(&mut FakeHardware) -> R) -> R {
            f(&mut self.hw.lock().unwrap())
        }
    }

    impl GamepadConnector for FakeConnector {
        type Device = FakePad;

        fn connect(&mut self) -> Result<FakePad> {
            let mut hw = self.hw.lock().unwrap();
            if !hw.plugged {
                return Err(HudError::ControllerNotFound);
            }
            hw.connects += 1;
            Ok(FakePad {
                hw: Arc::clone(&self.hw),
            })
        }
    }

    impl Gamepad for FakePad {
        fn read_axis(&mut self, axis: AxisId) -> Result<f32> {
            let hw = self.hw.lock().unwrap();
            if hw.fail_reads {
                return Err(HudError::DeviceUnavailable("unplugged".into()));
            }
            Ok(hw.state.axis(axis))
        }

        fn read_button(&mut self, button: ButtonId) -> Result<bool> {
            let hw = self.hw.lock().unwrap();
            if hw.fail_reads {
                return Err(HudError::DeviceUnavailable("unplugged".into()));
            }
            Ok(hw.state.button(button))
        }

        fn disconnect(self) {
            self.hw.lock().unwrap().disconnects += 1;
        }
    }

    fn sampler(connector: &FakeConnector) -> (InputSampler<FakeConnector>, SharedSlot<CommandVector>, ButtonEdges) {
        let config = Config::default();
        let commands = SharedSlot::new();
        let edges = ButtonEdges::new();
        let sampler = InputSampler::new(
            connector.clone(),
            CommandMapper::from_config(&config.controller, &config.command),
            commands.clone(),
            edges.clone(),
        );
        (sampler, commands, edges)
    }

    #[test]
    fn test_publishes_filtered_command() {
        let connector = FakeConnector::plugged();
        connector.with(|hw| hw.state.set_axis(AxisId::RightStickX, 32767.0));
        let (mut sampler, commands, _) = sampler(&connector);

        assert!(commands.latest().is_none());
        sampler.tick();

        let command = commands.latest().unwrap();
        assert_eq!(command.roll, 100);
        assert_eq!(command.pitch, 0);
        assert!(sampler.link().is_connected());
    }

    #[test]
    fn test_read_failure_keeps_last_command() {
        let connector = FakeConnector::plugged();
        connector.with(|hw| hw.state.set_axis(AxisId::LeftStickX, -32768.0));
        let (mut sampler, commands, _) = sampler(&connector);
        sampler.tick();
        let good = *commands.latest().unwrap();
        assert_eq!(good.yaw, -100);

        connector.with(|hw| {
            hw.fail_reads = true;
            hw.state.set_axis(AxisId::LeftStickX, 32767.0);
        });
        sampler.tick();
        sampler.tick();

        assert_eq!(*commands.latest().unwrap(), good);
        assert!(!sampler.link().is_connected());
        // Released once on the failure; the second tick reconnected and failed again
        connector.with(|hw| {
            assert_eq!(hw.connects, 2);
            assert_eq!(hw.disconnects, 2);
        });
    }

    #[test]
    fn test_reconnects_after_outage() {
        let connector = FakeConnector::default();
        let (mut sampler, commands, _) = sampler(&connector);

        for _ in 0..3 {
            sampler.tick();
        }
        assert!(commands.latest().is_none());
        assert!(!sampler.link().is_connected());

        connector.with(|hw| hw.plugged = true);
        sampler.tick();
        assert!(commands.latest().is_some());
        assert!(sampler.link().is_connected());
        connector.with(|hw| assert_eq!(hw.connects, 1));
    }

    #[test]
    fn test_held_button_yields_one_edge() {
        let connector = FakeConnector::plugged();
        connector.with(|hw| hw.state.set_button(ButtonId::Start, true));
        let (mut sampler, _, edges) = sampler(&connector);

        for _ in 0..5 {
            sampler.tick();
        }
        assert!(edges.take(ButtonId::Start));
        assert!(!edges.take(ButtonId::Start));

        connector.with(|hw| hw.state.set_button(ButtonId::Start, false));
        sampler.tick();
        connector.with(|hw| hw.state.set_button(ButtonId::Start, true));
        sampler.tick();
        assert!(edges.take(ButtonId::Start));
    }

    #[test]
    fn test_reconnect_rebases_button_levels() {
        let connector = FakeConnector::plugged();
        connector.with(|hw| hw.state.set_button(ButtonId::Start, true));
        let (mut sampler, _, edges) = sampler(&connector);
        sampler.tick();
        assert!(edges.take(ButtonId::Start));

        // Unplugged while held, replugged released: the next press counts
        connector.with(|hw| hw.fail_reads = true);
        sampler.tick();
        connector.with(|hw| {
            hw.fail_reads = false;
            hw.state.set_button(ButtonId::Start, false);
        });
        sampler.tick();
        assert!(!edges.take(ButtonId::Start));
        connector.with(|hw| hw.state.set_button(ButtonId::Start, true));
        sampler.tick();
        assert!(edges.take(ButtonId::Start));

        // Unplugged released, replugged held: no press until it is pressed again
        connector.with(|hw| {
            hw.state.set_button(ButtonId::Start, false);
            hw.fail_reads = true;
        });
        sampler.tick();
        sampler.tick();
        connector.with(|hw| {
            hw.fail_reads = false;
            hw.state.set_button(ButtonId::Start, true);
        });
        sampler.tick();
        assert!(!edges.take(ButtonId::Start));

        connector.with(|hw| hw.state.set_button(ButtonId::Start, false));
        sampler.tick();
        connector.with(|hw| hw.state.set_button(ButtonId::Start, true));
        sampler.tick();
        assert!(edges.take(ButtonId::Start));
    }

    #[test]
    fn test_release_disconnects_once() {
        let connector = FakeConnector::plugged();
        let (mut sampler, _, _) = sampler(&connector);
        sampler.tick();

        sampler.release();
        sampler.release();
        connector.with(|hw| assert_eq!(hw.disconnects, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stop_releases_handle() {
        let connector = FakeConnector::plugged();
        let (sampler, commands, _) = sampler(&connector);
        let mut task = LoopTask::new(sampler, Cadence::from_millis(50, 50));

        task.start();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(commands.latest().is_some());

        tokio::time::timeout(Duration::from_millis(50), task.stop())
            .await
            .expect("sampler did not stop within one interval");
        connector.with(|hw| {
            assert_eq!(hw.connects, 1);
            assert_eq!(hw.disconnects, 1);
        });
    }
}
