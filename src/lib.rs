//! # Sensor Readings
//!
//! An HTTP service that records integer readings from temperature and
//! humidity sensors and answers statistical queries over them.
//!
//! ## Modules
//!
//! - [`storage`]: SQLite-backed reading store with pooled connections
//! - [`query`]: Filter validation and the aggregator (min, max, mean, median, mode, quartiles)
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensor_readings::query::{QueryExecutor, Statistic};
//! use sensor_readings::storage::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(ReadingStore::open(StorageConfig::new("./data")).await?);
//!
//!     store
//!         .insert(NewReading::new("device-1", SensorType::Humidity, 41))
//!         .await?;
//!
//!     let executor = QueryExecutor::new(Arc::clone(&store));
//!     let filter = ReadingFilter::device("device-1").sensor_type(SensorType::Humidity);
//!     let median = executor.compute(Statistic::Median, filter).await?;
//!
//!     println!("{:?}", median);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod query;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    NewReading, Reading, ReadingFilter, ReadingStore, SensorType, SortOrder, StorageConfig,
    StorageError, StorageResult, StoreProfile,
};

pub use query::{
    QueryError, QueryExecutor, QueryResult, Quartiles, StatOutcome, StatValue, Statistic,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{generate_default_config, Config, ConfigError, LogFormat, LoggingConfig};
