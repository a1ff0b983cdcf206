//! hostgate server binary.
//!
//! Loads the configuration, installs logging and metrics, serves a small
//! default chain on every host and drains on SIGTERM/SIGINT.

use std::path::PathBuf;

use axum::http::StatusCode;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use hostgate::config::{load_config, ServerConfig};
use hostgate::http::middleware::{abort_on_shutdown, access_log, respond};
use hostgate::http::request::request_id;
use hostgate::lifecycle::{self, signals::shutdown_signal};
use hostgate::observability::{logging, metrics};
use hostgate::routing::WILDCARD_HOST;
use hostgate::ServerBuilder;

#[derive(Debug, Parser)]
#[command(name = "hostgate", version, about = "Host-routed HTTP(S) server")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init(&config.observability, cli.log_level.as_deref())?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hostgate starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let options = ServerBuilder::new(config)
        .register(0, [WILDCARD_HOST], request_id())
        .register(1, [WILDCARD_HOST], access_log())
        .register(2, [WILDCARD_HOST], abort_on_shutdown())
        .register(100, [WILDCARD_HOST], respond(StatusCode::OK, "hostgate\n"))
        .build()?;

    let mut server = lifecycle::start(options).await?;

    shutdown_signal().await;

    lifecycle::stop(&mut server, CancellationToken::new()).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
