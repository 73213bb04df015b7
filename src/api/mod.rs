//! Sensor Readings REST API
//!
//! HTTP API layer, built with Axum.
//!
//! # Endpoints
//!
//! ## Readings
//! - `POST /devices/:device_uuid/readings/` - Store a reading
//! - `GET /devices/:device_uuid/readings/` - List readings
//!
//! ## Statistics
//! - `GET /devices/:device_uuid/readings/min/`
//! - `GET /devices/:device_uuid/readings/max/`
//! - `GET /devices/:device_uuid/readings/mean/`
//! - `GET /devices/:device_uuid/readings/median/`
//! - `GET /devices/:device_uuid/readings/mode/`
//! - `GET /devices/:device_uuid/readings/quartiles/`
//!
//! Filters (`type`, `start`, `end`) are read from a JSON body when present,
//! otherwise from the query string.
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use sensor_readings::api::{serve, ApiConfig, AppState};
//! use sensor_readings::query::QueryExecutor;
//! use sensor_readings::storage::{ReadingStore, StorageConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(ReadingStore::open(StorageConfig::default()).await?);
//!     let executor = Arc::new(QueryExecutor::new(Arc::clone(&store)));
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, executor, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let device_routes = Router::new()
        .route(
            "/:device_uuid/readings/",
            get(routes::readings::list_readings).post(routes::readings::create_reading),
        )
        .route("/:device_uuid/readings/min/", get(routes::stats::min))
        .route("/:device_uuid/readings/max/", get(routes::stats::max))
        .route("/:device_uuid/readings/mean/", get(routes::stats::mean))
        .route("/:device_uuid/readings/median/", get(routes::stats::median))
        .route("/:device_uuid/readings/mode/", get(routes::stats::mode))
        .route("/:device_uuid/readings/quartiles/", get(routes::stats::quartiles));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let body_limit = state.config.max_body_size;
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/devices", device_routes)
        .nest("/health", health_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Sensor readings API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Sensor readings API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
