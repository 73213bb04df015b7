//! Sensor Readings API Server
//!
//! Run with: cargo run --bin sensor-api
//!
//! # Configuration
//!
//! Loaded from `--config <path>` when given, otherwise from the first of
//! `~/.config/sensor-readings/config.toml`, `/etc/sensor-readings/config.toml`
//! and `./config.toml`. Environment variables override file values:
//! - `SENSOR_DATA_DIR`: Directory holding the database files
//! - `SENSOR_PROFILE`: `production` (database.db) or `testing` (test_database.db)
//! - `SENSOR_POOL_SIZE`: Number of pooled connections (default: 4)
//! - `SENSOR_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `SENSOR_API_PORT`: Port to listen on (default: 5000)
//! - `SENSOR_LOG_LEVEL`: Log level (default: info)
//! - `SENSOR_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: Full filter directive, takes precedence over the level above

use anyhow::Context;
use clap::Parser;
use sensor_readings::api::{serve, AppState};
use sensor_readings::config::{Config, LogFormat, LoggingConfig};
use sensor_readings::query::QueryExecutor;
use sensor_readings::storage::ReadingStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sensor-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP service for sensor readings and their statistics")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting sensor readings API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        profile = ?config.storage.profile,
        database = ?config.storage.database_path(),
        pool_size = config.storage.pool_size,
        "Opening reading store"
    );

    let store = Arc::new(
        ReadingStore::open(config.storage.clone())
            .await
            .context("opening reading store")?,
    );
    let executor = Arc::new(QueryExecutor::new(Arc::clone(&store)));
    let state = AppState::new(store, executor, config.api.clone());

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await.context("running API server")?;

    tracing::info!("Sensor readings API stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive()));

    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
