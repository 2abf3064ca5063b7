//! vlangwsyncd - VLAN gateway synchronization daemon
//!
//! Entry point: parses the command line, loads configuration, wires the
//! catalog client and device adapters into the sync agent, and runs it
//! until interrupted.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use vlangwsyncd::adapter::DeviceAdapter;
use vlangwsyncd::agent::SyncAgent;
use vlangwsyncd::catalog::NetworkCatalogClient;
use vlangwsyncd::catalyst::CatalystAdapter;
use vlangwsyncd::config::{Config, DeviceKind};
use vlangwsyncd::telemetry;

/// VLAN gateway synchronization daemon
#[derive(Parser, Debug)]
#[command(name = "vlangwsyncd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

/// Initializes tracing/logging subsystem.
fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = Level::from_str(level).with_context(|| format!("invalid log level '{}'", level))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

/// Sets a flag on SIGINT so the agent stops at the next cycle boundary.
fn setup_signal_handler() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
            flag.store(true, Ordering::Relaxed);
        }
    });

    shutdown
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("starting vlangwsyncd");

    let config = Config::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;

    let (telemetry, telemetry_guard) =
        telemetry::init(config.telemetry.as_ref()).context("initializing telemetry")?;

    let catalog =
        NetworkCatalogClient::new(&config.catalog.address).context("building catalog client")?;

    let mut devices: Vec<Box<dyn DeviceAdapter>> = Vec::new();
    for device in &config.devices {
        match device.kind {
            DeviceKind::Catalyst4948 => devices.push(Box::new(CatalystAdapter::new(device))),
        }
    }
    if devices.is_empty() {
        warn!("no devices configured, agent will only poll the catalog");
    }

    let agent = SyncAgent::new(
        Box::new(catalog),
        devices,
        Duration::from_secs(config.agent.interval_secs),
        telemetry.clone(),
    );

    let shutdown = setup_signal_handler();
    agent.run(shutdown).await;

    drop(agent);
    drop(telemetry);
    telemetry_guard.shutdown().await;

    info!("vlangwsyncd exiting");
    Ok(())
}
