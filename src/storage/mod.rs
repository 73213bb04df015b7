//! Reading Store
//!
//! This module provides persistence for sensor readings:
//!
//! - **types**: Core data structures (Reading, NewReading, SensorType)
//! - **filter**: Structured filter clauses and sort orders
//! - **pool**: Pooled SQLite connections with scoped release
//! - **store**: The store itself, plus its configuration
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use sensor_readings::storage::{NewReading, ReadingFilter, ReadingStore, SensorType, SortOrder, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ReadingStore::open(StorageConfig::new("./data")).await?;
//!
//!     store
//!         .insert(NewReading::new("device-1", SensorType::Temperature, 22))
//!         .await?;
//!
//!     let filter = ReadingFilter::device("device-1").sensor_type(SensorType::Temperature);
//!     let readings = store.query(filter, SortOrder::Insertion).await?;
//!     println!("Found {} readings", readings.len());
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod filter;
pub mod pool;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use filter::{FilterClause, ReadingFilter, SortOrder, WhereClause};
pub use pool::{ConnectionPool, PooledConnection};
pub use store::{ReadingStore, StorageConfig, StoreProfile};
pub use types::{NewReading, Reading, SensorType, MAX_VALUE, MIN_VALUE};
