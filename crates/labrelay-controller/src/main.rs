//! Labrelay controller daemon - main entry point
//!
//! Accepts per-device action requests over HTTP and drives the relay
//! GPIO lines. Stands in for the reference firmware on the lab's
//! embedded controller.

mod bank;
mod config;
mod link;
mod routes;

use anyhow::Result;
use clap::Parser;
use labrelay_core::RecordingDriver;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "labrelayd")]
#[command(about = "Labrelay controller daemon driving relay GPIO lines")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "labrelayd.toml")]
    config: PathBuf,

    /// Bind address for the relay service
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("labrelayd v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.service.bind = bind;
    }

    let registry = config.registry()?;

    // Pins go output + off before anything can reach the service
    let mut gpio = bank::GpioBank::new(registry.clone(), Box::new(RecordingDriver::new()));
    gpio.init();
    info!(devices = gpio.registry().len(), "Device registry loaded");

    let link = link::bring_up(
        Duration::from_secs(config.link.wait_secs),
        Duration::from_millis(config.link.poll_ms),
        &config.service.bind,
    )
    .await;

    let state = routes::RouterState {
        bank: Arc::new(Mutex::new(gpio)),
        link: Arc::new(link),
    };
    let app = routes::build_router(&registry, state);

    let listener = tokio::net::TcpListener::bind(&config.service.bind).await?;
    info!(address = %config.service.bind, "Serving relay requests");
    axum::serve(listener, app).await?;

    Ok(())
}
