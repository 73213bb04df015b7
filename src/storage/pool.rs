//! SQLite connection pool
//!
//! A fixed set of connections opened once at startup and handed out per
//! request. A `PooledConnection` returns its connection to the pool when
//! dropped, so release happens on every exit path including early `?`
//! returns and panics in the borrowing code.
//!
//! std::sync primitives are used because `rusqlite::Connection` is used
//! from blocking tasks only and is `!Sync`.

use rusqlite::{Connection, OpenFlags};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::storage::error::{StorageError, StorageResult};

struct PoolInner {
    idle: Mutex<Vec<Connection>>,
    available: Condvar,
    size: usize,
    acquire_timeout: Duration,
}

/// Shared handle to a fixed-size pool of SQLite connections
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Open `size` connections to the database at `path`
    pub fn open(
        path: &Path,
        size: usize,
        acquire_timeout: Duration,
        busy_timeout: Duration,
    ) -> StorageResult<Self> {
        if size == 0 {
            return Err(StorageError::Config(
                "connection pool size must be at least 1".to_string(),
            ));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            connections.push(Self::open_connection(path, busy_timeout)?);
        }

        tracing::debug!(path = ?path, size, "Opened connection pool");

        Ok(Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(connections),
                available: Condvar::new(),
                size,
                acquire_timeout,
            }),
        })
    }

    fn open_connection(path: &Path, busy_timeout: Duration) -> StorageResult<Connection> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        conn.busy_timeout(busy_timeout)?;

        Ok(conn)
    }

    /// Borrow a connection, blocking until one is idle or the acquire
    /// timeout elapses
    pub fn get(&self) -> StorageResult<PooledConnection> {
        let deadline = Instant::now() + self.inner.acquire_timeout;

        let mut idle = self
            .inner
            .idle
            .lock()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire pool lock: {}", e)))?;

        loop {
            if let Some(conn) = idle.pop() {
                return Ok(PooledConnection {
                    conn: Some(conn),
                    pool: Arc::clone(&self.inner),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(StorageError::PoolTimeout(
                    self.inner.acquire_timeout.as_millis() as u64,
                ));
            }

            let (guard, _) = self
                .inner
                .available
                .wait_timeout(idle, deadline - now)
                .map_err(|e| StorageError::Lock(format!("Failed to wait for pool: {}", e)))?;
            idle = guard;
        }
    }

    /// Total number of connections owned by the pool
    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Number of connections not currently borrowed
    pub fn idle_count(&self) -> usize {
        self.inner
            .idle
            .lock()
            .map(|idle| idle.len())
            .unwrap_or(0)
    }
}

/// A borrowed connection, returned to its pool on drop
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `drop` takes the connection out
        self.conn.as_ref().expect("pooled connection used after release")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("pooled connection used after release")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let mut idle = self
                .pool
                .idle
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            idle.push(conn);
            drop(idle);
            self.pool.available.notify_one();
        }
    }
}
