//! # Dispatch
//!
//! Per-tick glue between a [`HudSession`] and the drone: forwards the latest
//! command and turns Start presses into takeoff / land.
//!
//! After each takeoff or land the hover command (all zeros) is sent for
//! that tick instead of stick input.

use tracing::{debug, info, warn};

use crate::controller::command::CommandVector;
use crate::controller::mapper::ButtonId;
use crate::error::Result;
use crate::session::HudSession;

/// Button toggling takeoff / land
pub const FLIGHT_TOGGLE: ButtonId = ButtonId::Start;

/// Drone session operations used by the dispatch loop.
#[cfg_attr(test, mockall::automock)]
pub trait DroneControl {
    /// Sends one motion command; all zeros means hover.
    fn send_motion_command(&mut self, command: CommandVector) -> Result<()>;

    fn takeoff(&mut self) -> Result<()>;

    fn land(&mut self) -> Result<()>;
}

/// What one dispatch tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No command available yet
    Idle,
    /// Forwarded a command
    Sent(CommandVector),
    /// Took off, then sent hover
    TookOff,
    /// Landed, then sent hover
    Landed,
    /// Takeoff was refused; still grounded, sent hover
    TakeoffFailed,
    /// Land was refused; still flying, sent hover
    LandFailed,
}

/// Dispatch-side state: flight status and counters for status logging.
#[derive(Debug, Default)]
pub struct Dispatcher {
    flying: bool,
    ticks: u64,
    sent: u64,
    last_sent: Option<CommandVector>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last takeoff succeeded and no land has succeeded since.
    #[must_use]
    pub fn is_flying(&self) -> bool {
        self.flying
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Commands successfully sent.
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Runs one dispatch tick.
    pub fn tick<D: DroneControl + ?Sized>(&mut self, session: &HudSession, drone: &mut D) -> TickOutcome {
        self.ticks += 1;

        if session.on_button_edge(FLIGHT_TOGGLE) {
            let outcome = self.toggle_flight(drone);
            self.send(drone, CommandVector::default());
            return outcome;
        }

        match session.latest_command() {
            Some(command) => {
                self.send(drone, command);
                TickOutcome::Sent(command)
            }
            None => TickOutcome::Idle,
        }
    }

    fn toggle_flight<D: DroneControl + ?Sized>(&mut self, drone: &mut D) -> TickOutcome {
        if self.flying {
            info!("Landing");
            match drone.land() {
                Ok(()) => {
                    self.flying = false;
                    TickOutcome::Landed
                }
                Err(e) => {
                    // Still airborne: the next press retries the land
                    warn!("Land failed: {}", e);
                    TickOutcome::LandFailed
                }
            }
        } else {
            info!("Taking off");
            match drone.takeoff() {
                Ok(()) => {
                    self.flying = true;
                    TickOutcome::TookOff
                }
                Err(e) => {
                    warn!("Takeoff failed: {}", e);
                    TickOutcome::TakeoffFailed
                }
            }
        }
    }

    fn send<D: DroneControl + ?Sized>(&mut self, drone: &mut D, command: CommandVector) {
        match drone.send_motion_command(command) {
            Ok(()) => {
                self.sent += 1;
                if self.last_sent != Some(command) {
                    debug!("Motion command: {:?}", command);
                }
                self.last_sent = Some(command);
            }
            Err(e) => debug!("Failed to send motion command: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::HudError;
    use mockall::predicate::eq;

    fn hover() -> CommandVector {
        CommandVector::default()
    }

    #[test]
    fn test_idle_without_command() {
        let session = HudSession::new(&Config::default());
        let mut drone = MockDroneControl::new();
        drone.expect_send_motion_command().never();

        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.tick(&session, &mut drone), TickOutcome::Idle);
        assert_eq!(dispatcher.ticks(), 1);
        assert_eq!(dispatcher.sent(), 0);
    }

    #[test]
    fn test_takeoff_then_land_send_hover() {
        let mut drone = MockDroneControl::new();
        drone.expect_takeoff().times(1).returning(|| Ok(()));
        drone.expect_land().times(1).returning(|| Ok(()));
        drone
            .expect_send_motion_command()
            .with(eq(hover()))
            .times(2)
            .returning(|_| Ok(()));

        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.toggle_flight(&mut drone), TickOutcome::TookOff);
        dispatcher.send(&mut drone, hover());
        assert!(dispatcher.is_flying());

        assert_eq!(dispatcher.toggle_flight(&mut drone), TickOutcome::Landed);
        dispatcher.send(&mut drone, hover());
        assert!(!dispatcher.is_flying());
        assert_eq!(dispatcher.sent(), 2);
    }

    #[test]
    fn test_failed_takeoff_stays_grounded() {
        let mut drone = MockDroneControl::new();
        drone
            .expect_takeoff()
            .times(1)
            .returning(|| Err(HudError::DeviceUnavailable("no link".into())));

        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.toggle_flight(&mut drone), TickOutcome::TakeoffFailed);
        assert!(!dispatcher.is_flying());
    }

    #[test]
    fn test_failed_land_stays_flying_and_retries() {
        let mut drone = MockDroneControl::new();
        let mut seq = mockall::Sequence::new();
        drone
            .expect_takeoff()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        drone
            .expect_land()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(HudError::DeviceUnavailable("no link".into())));
        drone
            .expect_land()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.toggle_flight(&mut drone), TickOutcome::TookOff);
        assert_eq!(dispatcher.toggle_flight(&mut drone), TickOutcome::LandFailed);
        assert!(dispatcher.is_flying(), "a refused land must not look grounded");

        // Next press lands instead of taking off again
        assert_eq!(dispatcher.toggle_flight(&mut drone), TickOutcome::Landed);
        assert!(!dispatcher.is_flying());
    }

    #[test]
    fn test_send_failure_not_counted() {
        let mut drone = MockDroneControl::new();
        drone
            .expect_send_motion_command()
            .returning(|_| Err(HudError::DeviceUnavailable("no link".into())));

        let mut dispatcher = Dispatcher::new();
        dispatcher.send(&mut drone, hover());
        assert_eq!(dispatcher.sent(), 0);
    }
}
