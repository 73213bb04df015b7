//! Reading store
//!
//! Append-only SQLite table of sensor readings behind a connection pool.
//!
//! ```text
//! Write Path:
//!   NewReading → validate → writer lock → pooled connection → INSERT
//!
//! Read Path:
//!   ReadingFilter → WHERE clause list → pooled connection → SELECT ... ORDER BY
//! ```
//!
//! SQLite calls run on the blocking thread pool; the async methods only
//! await them.

use rusqlite::{params, params_from_iter, Connection};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::filter::{ReadingFilter, SortOrder};
use crate::storage::pool::ConnectionPool;
use crate::storage::types::{NewReading, Reading, SensorType};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS readings (
        device_uuid TEXT NOT NULL,
        type TEXT NOT NULL CHECK (type IN ('temperature', 'humidity')),
        value INTEGER NOT NULL CHECK (value BETWEEN 0 AND 100),
        date_created INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_readings_device_type_time
        ON readings(device_uuid, type, date_created);
";

/// Which physical database the store opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProfile {
    #[default]
    Production,
    Testing,
}

impl StoreProfile {
    /// Database file name for this profile
    pub fn database_file(&self) -> &'static str {
        match self {
            StoreProfile::Production => "database.db",
            StoreProfile::Testing => "test_database.db",
        }
    }
}

impl FromStr for StoreProfile {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(StoreProfile::Production),
            "testing" | "test" => Ok(StoreProfile::Testing),
            other => Err(StorageError::Config(format!("unknown store profile '{}'", other))),
        }
    }
}

/// Reading store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the database files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Selects the production or test database
    #[serde(default)]
    pub profile: StoreProfile,

    /// Number of pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// How long a request waits for a free connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_ms: u64,

    /// How long SQLite retries while the database is locked
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("sensor-readings"))
        .unwrap_or_else(|| PathBuf::from("./sensor_data"))
}

fn default_pool_size() -> usize {
    4
}

fn default_acquire_timeout() -> u64 {
    5000
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            profile: StoreProfile::default(),
            pool_size: default_pool_size(),
            acquire_timeout_ms: default_acquire_timeout(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl StorageConfig {
    /// Create config rooted at a data directory
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Builder: select the database profile
    pub fn profile(mut self, profile: StoreProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Builder: set the pool size
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Full path of the database file for the configured profile
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(self.profile.database_file())
    }
}

/// Append-only store of sensor readings
pub struct ReadingStore {
    config: StorageConfig,
    pool: ConnectionPool,
    /// Serializes inserts
    writer: Arc<Mutex<()>>,
}

impl ReadingStore {
    /// Open the database selected by `config` and ensure the schema exists
    pub async fn open(config: StorageConfig) -> StorageResult<Self> {
        let path = config.database_path();
        let pool_size = config.pool_size;
        let acquire_timeout = Duration::from_millis(config.acquire_timeout_ms);
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

        let pool = tokio::task::spawn_blocking(move || -> StorageResult<ConnectionPool> {
            let pool = ConnectionPool::open(&path, pool_size, acquire_timeout, busy_timeout)?;
            pool.get()?.execute_batch(SCHEMA)?;
            Ok(pool)
        })
        .await??;

        tracing::info!(
            path = ?config.database_path(),
            profile = ?config.profile,
            pool_size = config.pool_size,
            "Reading store opened"
        );

        Ok(Self {
            config,
            pool,
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Run a closure against a pooled connection on the blocking pool
    async fn with_connection<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?
    }

    /// Validate and append a reading
    ///
    /// Returns the stored record, with `date_created` resolved. Nothing is
    /// written when validation fails.
    pub async fn insert(&self, reading: NewReading) -> StorageResult<Reading> {
        reading.validate()?;
        let reading = reading.into_reading();

        let _guard = self.writer.lock().await;

        let row = reading.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO readings (device_uuid, type, value, date_created)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    row.device_uuid,
                    row.sensor_type.as_str(),
                    row.value,
                    row.date_created
                ],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(
            device_uuid = %reading.device_uuid,
            sensor_type = %reading.sensor_type,
            value = reading.value,
            date_created = reading.date_created,
            "Reading stored"
        );

        Ok(reading)
    }

    /// All readings matching `filter`, in the requested order
    pub async fn query(
        &self,
        filter: ReadingFilter,
        order: SortOrder,
    ) -> StorageResult<Vec<Reading>> {
        let readings = self
            .with_connection(move |conn| select_readings(conn, &filter, order))
            .await?;

        tracing::debug!(count = readings.len(), ?order, "Readings queried");
        Ok(readings)
    }

    /// Values of all readings matching `filter`, sorted ascending
    pub async fn query_values(&self, filter: ReadingFilter) -> StorageResult<Vec<i64>> {
        self.with_connection(move |conn| {
            let clause = filter.where_clause();
            let sql = format!(
                "SELECT value FROM readings WHERE {} ORDER BY {}",
                clause.sql,
                SortOrder::ValueAscending.order_by()
            );

            let mut stmt = conn.prepare_cached(&sql)?;
            let values = stmt
                .query_map(params_from_iter(clause.params.iter()), |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            Ok(values)
        })
        .await
    }

    /// Total number of stored readings
    pub async fn count(&self) -> StorageResult<u64> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    /// Round-trip a trivial statement through the pool
    pub async fn ping(&self) -> StorageResult<()> {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    /// Store configuration
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

fn select_readings(
    conn: &Connection,
    filter: &ReadingFilter,
    order: SortOrder,
) -> StorageResult<Vec<Reading>> {
    let clause = filter.where_clause();
    let sql = format!(
        "SELECT device_uuid, type, value, date_created FROM readings WHERE {} ORDER BY {}",
        clause.sql,
        order.order_by()
    );

    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(clause.params.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(device_uuid, sensor_type, value, date_created)| {
            let sensor_type = SensorType::from_str(&sensor_type).map_err(|_| {
                StorageError::Corruption(format!("unknown sensor type '{}' in store", sensor_type))
            })?;
            Ok(Reading {
                device_uuid,
                sensor_type,
                value,
                date_created,
            })
        })
        .collect()
}
