//! # Background Loop Tasks
//!
//! Explicit start/stop wrapper around the fixed-cadence loops (input
//! sampler, overlay renderer, telemetry poller).
//!
//! ## Cancellation contract
//!
//! - [`LoopTask::stop`] raises a shared stop signal and waits for the loop.
//! - The loop checks the signal between cycles; a cycle in progress always
//!   runs to completion, so a slot is never left mid-write.
//! - Shutdown latency is bounded by one interval: a loop idling between
//!   ticks wakes on the signal immediately, a loop inside a tick exits as
//!   soon as that tick returns.
//! - [`Periodic::release`] runs exactly once when the loop exits, on every
//!   exit path (stop signal, dropped task handle, panic inside a tick).
//!
//! Interval timing uses `tokio::time`, so tests drive loops with a paused,
//! virtual clock.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One unit of periodic work driven by a [`LoopTask`].
pub trait Periodic: Send + 'static {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Runs one cycle. Must not block for longer than the loop interval.
    fn tick(&mut self);

    /// Releases owned handles (device, capture session). Called once.
    fn release(&mut self);
}

impl Periodic for Box<dyn Periodic> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn tick(&mut self) {
        (**self).tick();
    }

    fn release(&mut self) {
        (**self).release();
    }
}

/// Loop cadence: target interval plus how late a tick may fire before it
/// is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub interval: Duration,
    pub jitter_tolerance: Duration,
}

impl Cadence {
    /// Builds a cadence from millisecond values.
    ///
    /// ```
    /// use drone_hud::task::Cadence;
    /// use std::time::Duration;
    ///
    /// let cadence = Cadence::from_millis(50, 10);
    /// assert_eq!(cadence.interval, Duration::from_millis(50));
    /// ```
    #[must_use]
    pub fn from_millis(interval_ms: u64, jitter_tolerance_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            jitter_tolerance: Duration::from_millis(jitter_tolerance_ms),
        }
    }
}

enum State<P> {
    Idle(P),
    Running {
        stop: watch::Sender<bool>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

/// Owns a [`Periodic`] job and the tokio task running it.
///
/// `start` and `stop` are idempotent. A stopped task stays stopped: the job
/// has released its handles and is gone.
pub struct LoopTask<P: Periodic> {
    name: &'static str,
    cadence: Cadence,
    state: State<P>,
}

impl<P: Periodic> std::fmt::Debug for LoopTask<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Idle(_) => "idle",
            State::Running { .. } => "running",
            State::Stopped => "stopped",
        };
        f.debug_struct("LoopTask")
            .field("name", &self.name)
            .field("cadence", &self.cadence)
            .field("state", &state)
            .finish()
    }
}

impl<P: Periodic> LoopTask<P> {
    /// Wraps a job without starting it.
    #[must_use]
    pub fn new(job: P, cadence: Cadence) -> Self {
        Self {
            name: job.name(),
            cadence,
            state: State::Idle(job),
        }
    }

    /// Spawns the loop onto the current tokio runtime.
    ///
    /// Returns `true` if this call started the loop, `false` if it was
    /// already running or has been stopped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&mut self) -> bool {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Idle(job) => {
                let (stop, stop_rx) = watch::channel(false);
                let handle = tokio::spawn(run_loop(job, self.cadence, stop_rx));
                self.state = State::Running { stop, handle };
                true
            }
            running @ State::Running { .. } => {
                self.state = running;
                false
            }
            State::Stopped => {
                warn!("{} loop already stopped, not restarting", self.name);
                false
            }
        }
    }

    /// Signals the loop to stop and waits for it to finish its current
    /// cycle and release its handles.
    pub async fn stop(&mut self) {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Running { stop, handle } => {
                let _ = stop.send(true);
                if let Err(e) = handle.await {
                    warn!("{} loop ended abnormally: {}", self.name, e);
                }
            }
            State::Idle(mut job) => {
                // Never ran, but still owns its handles
                job.release();
            }
            State::Stopped => {}
        }
    }

    /// Returns `true` while the loop task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(&self.state, State::Running { handle, .. } if !handle.is_finished())
    }
}

impl<P: Periodic> Drop for LoopTask<P> {
    fn drop(&mut self) {
        if let State::Running { stop, .. } = &self.state {
            // The detached loop still finishes its cycle and releases
            let _ = stop.send(true);
        }
    }
}

/// Calls [`Periodic::release`] when dropped.
struct ReleaseOnExit<P: Periodic>(P);

impl<P: Periodic> Drop for ReleaseOnExit<P> {
    fn drop(&mut self) {
        self.0.release();
        debug!("{} loop released its handles", self.0.name());
    }
}

async fn run_loop<P: Periodic>(job: P, cadence: Cadence, mut stop: watch::Receiver<bool>) {
    let mut job = ReleaseOnExit(job);
    let name = job.0.name();

    let mut ticker = time::interval(cadence.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("{} loop started ({:?} interval)", name, cadence.interval);
    let mut cycles: u64 = 0;

    loop {
        if *stop.borrow() {
            break;
        }

        tokio::select! {
            biased;

            changed = stop.changed() => {
                // A dropped sender also means stop
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }

            scheduled = ticker.tick() => {
                let lateness = Instant::now().saturating_duration_since(scheduled);
                if lateness > cadence.jitter_tolerance {
                    debug!("{} cycle {} fired {:?} late", name, cycles, lateness);
                }
                job.0.tick();
                cycles += 1;
            }
        }
    }

    info!("{} loop stopping after {} cycles", name, cycles);
}
