//! # HUD Session
//!
//! Owns the shared slots and the background loops, and exposes the read
//! side to the dispatch loop.
//!
//! ```text
//! gamepad ──> InputSampler ──> commands ──┐
//!                         └──> edges   ───┤
//! video ────> OverlayRenderer ──> frames ─┼──> dispatch loop
//! battery ──> TelemetryPoller ──> telemetry ──> (renderer)
//! ```
//!
//! Collaborators are attached before [`HudSession::start`]; a session with
//! no controller attached (or with `controller.enabled = false`) never
//! publishes commands.

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::controller::command::{CommandAxis, CommandMapper, CommandVector};
use crate::controller::edge::ButtonEdges;
use crate::controller::gamepad::GamepadConnector;
use crate::controller::mapper::ButtonId;
use crate::controller::sampler::{ControllerLink, InputSampler};
use crate::overlay::renderer::OverlayRenderer;
use crate::slot::SharedSlot;
use crate::task::{Cadence, LoopTask, Periodic};
use crate::telemetry::{BatteryGauge, TelemetryPoller, TelemetryValue};
use crate::video::{Frame, VideoSource};

type BoxedTask = LoopTask<Box<dyn Periodic>>;

/// Application session: slots, edge counters and the three loops.
pub struct HudSession {
    config: Config,
    commands: SharedSlot<CommandVector>,
    frames: SharedSlot<Frame>,
    telemetry: SharedSlot<TelemetryValue>,
    edges: ButtonEdges,
    link: Option<ControllerLink>,
    sampler: Option<BoxedTask>,
    renderer: Option<BoxedTask>,
    poller: Option<BoxedTask>,
}

impl std::fmt::Debug for HudSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HudSession")
            .field("sampler", &self.sampler)
            .field("renderer", &self.renderer)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

impl HudSession {
    /// Creates a session with empty slots and no loops.
    ///
    /// `config` must already be validated.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            commands: SharedSlot::new(),
            frames: SharedSlot::new(),
            telemetry: SharedSlot::new(),
            edges: ButtonEdges::new(),
            link: None,
            sampler: None,
            renderer: None,
            poller: None,
        }
    }

    /// Attaches the gamepad. Ignored when `controller.enabled` is false.
    pub fn attach_controller<C: GamepadConnector>(&mut self, connector: C) -> &mut Self {
        if !self.config.controller.enabled {
            info!("Controller input disabled in configuration");
            return self;
        }

        let controller = &self.config.controller;
        let mapper = CommandMapper::from_config(controller, &self.config.command);
        info!(
            "Stick mapping: roll={:?} pitch={:?} yaw={:?} throttle={:?}",
            mapper.source(CommandAxis::Roll),
            mapper.source(CommandAxis::Pitch),
            mapper.source(CommandAxis::Yaw),
            mapper.source(CommandAxis::Throttle)
        );
        let sampler = InputSampler::new(connector, mapper, self.commands.clone(), self.edges.clone());
        self.link = Some(sampler.link());

        let cadence = Cadence::from_millis(controller.poll_interval_ms, controller.jitter_tolerance_ms);
        let job: Box<dyn Periodic> = Box::new(sampler);
        self.sampler = Some(LoopTask::new(job, cadence));
        self
    }

    /// Attaches the video capture session and the overlay renderer.
    pub fn attach_video<V: VideoSource>(&mut self, video: V) -> &mut Self {
        let overlay = &self.config.overlay;
        let renderer = OverlayRenderer::new(video, self.telemetry.clone(), self.frames.clone(), overlay);

        let cadence = Cadence::from_millis(overlay.refresh_interval_ms, overlay.jitter_tolerance_ms);
        let job: Box<dyn Periodic> = Box::new(renderer);
        self.renderer = Some(LoopTask::new(job, cadence));
        self
    }

    /// Attaches the battery read polled into the telemetry slot.
    pub fn attach_battery<G: BatteryGauge>(&mut self, gauge: G) -> &mut Self {
        let poller = TelemetryPoller::new(gauge, self.telemetry.clone());

        let interval = self.config.telemetry.poll_interval_ms;
        let job: Box<dyn Periodic> = Box::new(poller);
        self.poller = Some(LoopTask::new(job, Cadence::from_millis(interval, interval / 2)));
        self
    }

    /// Starts every attached loop. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&mut self) {
        let mut started = 0;
        for task in [&mut self.sampler, &mut self.renderer, &mut self.poller]
            .into_iter()
            .flatten()
        {
            if task.start() {
                started += 1;
            }
        }
        if started > 0 {
            info!("HUD session started {} loop(s)", started);
        }
    }

    /// Stops every loop and waits for them to release their handles.
    /// Idempotent; the loops stop concurrently.
    pub async fn stop(&mut self) {
        tokio::join!(
            stop_task(&mut self.sampler),
            stop_task(&mut self.renderer),
            stop_task(&mut self.poller),
        );
    }

    /// Returns `true` while any loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        [&self.sampler, &self.renderer, &self.poller]
            .into_iter()
            .flatten()
            .any(LoopTask::is_running)
    }

    /// Latest command, or `None` before the first successful poll.
    #[must_use]
    pub fn latest_command(&self) -> Option<CommandVector> {
        self.commands.latest().map(|command| *command)
    }

    /// Latest composited frame, or `None` before the first render.
    #[must_use]
    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.frames.latest()
    }

    /// Latest telemetry reading, fresh or not.
    #[must_use]
    pub fn latest_telemetry(&self) -> Option<TelemetryValue> {
        self.telemetry.latest().map(|value| *value)
    }

    /// `true` exactly once per press of `button` since the last check.
    pub fn on_button_edge(&self, button: ButtonId) -> bool {
        self.edges.take(button)
    }

    /// Whether the sampler currently holds an open gamepad.
    #[must_use]
    pub fn controller_connected(&self) -> bool {
        self.link.as_ref().map_or(false, ControllerLink::is_connected)
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

async fn stop_task(task: &mut Option<BoxedTask>) {
    if let Some(task) = task.as_mut() {
        task.stop().await;
    }
}
