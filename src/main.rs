//! # Drone HUD
//!
//! Fly a camera drone with a gamepad while watching its video with a live
//! battery overlay.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use drone_hud::config::{Config, LoggingConfig};
use drone_hud::controller::gamepad::EvdevConnector;
use drone_hud::dispatch::{Dispatcher, DroneControl};
use drone_hud::session::HudSession;
use drone_hud::sim::SimDrone;

/// Dispatch ticks between status log messages (5s at the default 50ms tick)
const STATUS_LOG_TICKS: u64 = 100;

/// File name prefix of rolling log files
const LOG_FILE_PREFIX: &str = "drone-hud.log";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "drone-hud", version, about)]
struct Args {
    /// Path to the TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Run without gamepad input
    #[arg(long)]
    no_controller: bool,
}

/// Main entry point for Drone HUD
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load and validate configuration (fatal on error)
///    - Set up logging
///    - Attach the gamepad, the drone's video and battery to a session
///    - Start the sampler, renderer and telemetry loops
///
/// 2. **Dispatch Loop**
///    - Forward the latest command to the drone every tick
///    - Toggle takeoff / land on each Start press
///    - Log status periodically
///
/// 3. **Graceful Shutdown** (Ctrl+C)
///    - Land if flying
///    - Stop all loops, releasing the gamepad and video capture
///
/// # Errors
///
/// Returns error if the configuration cannot be loaded or is invalid, or if
/// logging cannot be initialized. Hardware problems are never fatal.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&args)?;
    let _log_guard = init_logging(&config.logging)?;

    info!("Drone HUD v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut drone = SimDrone::new();
    let mut session = HudSession::new(&config);
    session
        .attach_controller(EvdevConnector::new(&config.controller.device_path))
        .attach_video(drone.video())
        .attach_battery(drone.battery());
    session.start();

    let mut dispatcher = Dispatcher::new();
    let mut ticker = interval(Duration::from_millis(config.dispatch.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Press Start to take off / land, Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                dispatcher.tick(&session, &mut drone);
                if dispatcher.ticks() % STATUS_LOG_TICKS == 0 {
                    log_status(&session, &dispatcher);
                }
            }

            _ = &mut shutdown => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    if dispatcher.is_flying() {
        if let Err(e) = drone.land() {
            tracing::warn!("Land on shutdown failed: {}", e);
        }
    }

    session.stop().await;
    info!(
        "Sent {} motion commands over {} ticks",
        dispatcher.sent(),
        dispatcher.ticks()
    );

    Ok(())
}

/// Loads the configuration file (or defaults), applies command line
/// overrides and validates the result.
fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.no_controller {
        config.controller.enabled = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Installs the tracing subscriber: stderr always, plus a daily rolling
/// file when a log directory is configured. `RUST_LOG` overrides the level.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    if config.directory.is_empty() {
        registry.try_init().context("Failed to initialize logging")?;
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&config.directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(Some(guard))
}

fn log_status(session: &HudSession, dispatcher: &Dispatcher) {
    let frame = session
        .latest_frame()
        .map(|frame| format!("{}x{}", frame.width(), frame.height()))
        .unwrap_or_else(|| "none".to_string());
    let battery = session
        .latest_telemetry()
        .map(|value| format!("{}%", value.percent))
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        "Status: controller {}, flying {}, frame {}, battery {}, command {:?}",
        if session.controller_connected() { "connected" } else { "absent" },
        dispatcher.is_flying(),
        frame,
        battery,
        session.latest_command()
    );
}
