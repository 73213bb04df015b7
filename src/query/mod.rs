//! Statistic Queries
//!
//! Aggregate queries over a device's readings:
//!
//! - **aggregate**: Pure statistics over ascending value sets
//! - **executor**: Validates filters, fetches from the store, aggregates
//! - **error**: Error types
//!
//! # Statistics
//!
//! ```text
//! min, max   → the reading record holding the extreme value
//! mean       → float
//! median     → integer for odd sample sizes, float for even
//! mode       → most frequent value, ties to the smallest
//! quartiles  → (lower, upper), requires start and end
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sensor_readings::query::{QueryExecutor, Statistic, StatOutcome};
//! use sensor_readings::storage::{ReadingFilter, SensorType};
//!
//! let filter = ReadingFilter::device("device-1").sensor_type(SensorType::Temperature);
//! match executor.compute(Statistic::Median, filter).await? {
//!     StatOutcome::Value(v) => println!("median = {}", v),
//!     StatOutcome::NoResults => println!("no readings"),
//!     _ => {}
//! }
//! ```

pub mod aggregate;
pub mod error;
pub mod executor;

pub use aggregate::{Quartiles, StatValue, Statistic};
pub use error::{QueryError, QueryResult};
pub use executor::{QueryExecutor, StatOutcome};
