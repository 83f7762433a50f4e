//! Species radar - notifies a webhook about uncollected species nearby
//!
//! Each invocation resolves the device location, opens a fresh game
//! session, compares the nearby species against the collection and posts
//! one webhook message per new species.
//!
//! Module structure:
//! - `domain/` - Core types (ids, sightings, species table, upstream payloads)
//! - `io/` - External interfaces (device directory, game session, webhook)
//! - `services/` - Pipeline stages and orchestration
//! - `infra/` - Infrastructure (Config, logging)

use anyhow::Context;
use clap::Parser;
use species_radar::domain::SpeciesTable;
use species_radar::infra::{logging, Config};
use species_radar::io::{
    HttpDeviceLocator, HttpSessionConnector, NotificationDispatcher, ReqwestTransport,
};
use species_radar::services::{invoke, run_every, Pipeline};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

type RadarPipeline = Pipeline<HttpDeviceLocator, HttpSessionConnector, ReqwestTransport>;

/// Species radar - uncollected species notifications
#[derive(Parser, Debug)]
#[command(name = "species-radar", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Keep running and start a new invocation every N seconds
    #[arg(long, value_name = "SECS")]
    every: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn build_pipeline(args: &Args) -> anyhow::Result<RadarPipeline> {
    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path).with_env_overrides()?;

    info!(
        config_file = %config.config_file(),
        device = %config.device_name(),
        locator_url = %config.locator_url(),
        session_url = %config.session_url(),
        provider = %config.session_provider().as_str(),
        start_location = %config.session_location(),
        "config_loaded"
    );

    let destination = config.destination().context("Invalid webhook destination")?;
    let table_path = config.species_table_path();
    let names_path = config.species_names_path();
    let species = SpeciesTable::load(&table_path, names_path.as_deref())
        .with_context(|| format!("Failed to load species table {}", table_path.display()))?;
    info!(species = species.len(), channel = %destination.channel(), "species_table_loaded");

    let locator = HttpDeviceLocator::new(config.locator_config())?;
    let connector =
        HttpSessionConnector::new(config.session_url(), Duration::from_millis(config.session_timeout_ms()))?;
    let transport = ReqwestTransport::new(Duration::from_millis(config.notify_timeout_ms()))?;
    let dispatcher = NotificationDispatcher::new(transport, destination, config.message_template());

    Ok(Pipeline::new(locator, connector, config.session_credentials(), Arc::new(species), dispatcher))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), build = env!("RADAR_BUILD"), "species-radar starting");

    let pipeline = match build_pipeline(&args) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            error!(error = %format!("{:#}", e), "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let Some(every_secs) = args.every else {
        return if invoke(pipeline).await.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    };

    // Scheduled mode: one invocation per tick, each with its own session
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    run_every(Duration::from_secs(every_secs.max(1)), shutdown_rx, || invoke(pipeline.clone())).await;

    info!("species-radar shutdown complete");
    ExitCode::SUCCESS
}
