//! # Handbrake Bridge
//!
//! Reads a spring-loaded analog handbrake lever, calibrates its range on the
//! fly and forwards the result as a gamepad axis.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Parse command line and load configuration
//!    - Set up logging with tracing subscriber
//!    - Build the lever, button and HID sink for the configured backend
//!
//! 2. **Startup**
//!    - Calibrate against the resting lever
//!    - Wait for the HID link, then send the released value
//!
//! 3. **Main Loop**
//!    - One tick every `tick_interval_ms` (100Hz by default)
//!    - Status report every `interval_ticks` ticks
//!    - Ctrl+C (or `--ticks`) for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- --config config/default.toml
//! ```
//!
//! Expected output:
//! ```text
//! INFO handbrake_bridge: Handbrake Bridge v0.1.0 starting...
//! INFO handbrake_bridge::lever::controller: Calibration reset at rest position 409 (range 409 - 509)
//! INFO handbrake_bridge::runtime: HID connected
//! INFO handbrake_bridge::runtime: Starting control loop at 100Hz
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use handbrake_bridge::config::{Config, DeviceBackend};
use handbrake_bridge::device::{
    AnalogInput, Devices, FixedButton, LoggingHidSink, ReplayLever, SimulatedLever,
};
use handbrake_bridge::diagnostics::Diagnostics;
use handbrake_bridge::lever::HandbrakeController;
use handbrake_bridge::runtime::{RunSummary, Runtime};

/// Name the HID sink advertises.
const DEVICE_NAME: &str = "Handbrake Bridge";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "handbrake-bridge", version, about)]
struct Cli {
    /// Path to a TOML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Stop after this many ticks instead of waiting for Ctrl+C
    #[arg(long)]
    ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the guard flushes the file writer on exit
    let (file_layer, _guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "handbrake-bridge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    info!("Handbrake Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    let summary = match config.device.backend {
        DeviceBackend::Simulated => {
            info!("Using simulated lever");
            let lever = SimulatedLever::for_full_scale(
                config.lever.full_scale,
                config.lever.tolerance(),
                config.device.seed,
            );
            run(lever, &config, cli.ticks).await?
        }
        DeviceBackend::Replay => {
            let lever = ReplayLever::load(&config.device.replay_path, config.lever.full_scale)
                .with_context(|| format!("failed to load replay trace {}", config.device.replay_path))?;
            run(lever, &config, cli.ticks).await?
        }
    };

    info!(
        "Total: {} ticks, {} faults, {} values sent",
        summary.ticks, summary.faults, summary.sent
    );
    Ok(())
}

/// Builds the runtime around `lever` and runs it until shutdown.
async fn run<A: AnalogInput>(lever: A, config: &Config, max_ticks: Option<u64>) -> Result<RunSummary> {
    let devices = Devices::new(
        lever,
        FixedButton::new(config.device.button_level),
        LoggingHidSink::new(
            DEVICE_NAME,
            Duration::from_millis(config.device.connect_delay_ms),
        ),
    );
    let diagnostics = Diagnostics::from_config(&config.diagnostics)?;
    let controller = HandbrakeController::from_config(config);

    let mut runtime = Runtime::new(controller, devices, diagnostics, &config.timing);
    runtime.start().await?;

    info!("Press Ctrl+C to exit");
    Ok(runtime
        .run_until(tokio::signal::ctrl_c(), max_ticks)
        .await)
}
