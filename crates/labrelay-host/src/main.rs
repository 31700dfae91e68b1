//! Labrelay host - main entry point
//!
//! Reads recognized speech, interprets it into device intents, and
//! dispatches them to the lab controller.

mod config;
mod pipeline;
mod transcript;

use anyhow::Result;
use clap::Parser;
use labrelay_dispatch::{DispatchClient, Probe};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "labrelay")]
#[command(about = "Voice-controlled lab device dispatch")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "labrelay.toml")]
    config: PathBuf,

    /// Controller IP address or hostname
    #[arg(long)]
    ip: Option<String>,

    /// Seconds to calibrate for ambient noise
    #[arg(long)]
    ambient: Option<f64>,

    /// Check controller reachability and exit
    #[arg(long)]
    probe: bool,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("labrelay v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;
    if let Some(ip) = args.ip {
        config.controller.address = ip;
    }
    if let Some(ambient) = args.ambient {
        config.audio.ambient_secs = ambient;
    }

    let registry = config.registry()?;
    let client = DispatchClient::new(registry, config.dispatch_config())?;
    info!(controller = %config.controller.address, "Dispatch client ready");

    if args.probe {
        return match client.check().await {
            Probe::Reachable => {
                info!("Controller reachable");
                Ok(())
            }
            Probe::Unreachable => anyhow::bail!(
                "Controller at {} is unreachable",
                config.controller.address
            ),
        };
    }

    // Capture-side ambient calibration window; recognition itself is
    // an external collaborator feeding text on stdin.
    if config.audio.ambient_secs > 0.0 {
        info!(
            seconds = config.audio.ambient_secs,
            "Calibrating for ambient noise"
        );
        tokio::time::sleep(Duration::from_secs_f64(config.audio.ambient_secs)).await;
    }

    let source = transcript::StdinSource::new();
    pipeline::Pipeline::new(source, client).run().await
}
