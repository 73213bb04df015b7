//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::query::{StatValue, Statistic};
use crate::storage::Reading;

// ============================================
// INGEST DTOs
// ============================================

/// Reading ingest request
///
/// Fields are optional at the wire level so a missing field is reported
/// as a validation error rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    /// Sensor type: temperature or humidity
    #[serde(default, rename = "type")]
    pub sensor_type: Option<String>,
    /// Integer value in 0-100
    #[serde(default)]
    pub value: Option<i64>,
    /// Optional creation time (seconds since epoch), defaults to now
    #[serde(default)]
    pub date_created: Option<i64>,
}

/// Reading ingest response
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Status: "ok"
    pub status: String,
    /// The stored reading
    pub reading: Reading,
}

// ============================================
// QUERY DTOs
// ============================================

/// Filters accepted by the list and statistic endpoints
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterParams {
    /// Sensor type (required for statistics)
    #[serde(default, rename = "type")]
    pub sensor_type: Option<String>,
    /// Inclusive lower bound on date_created
    #[serde(default)]
    pub start: Option<i64>,
    /// Inclusive upper bound on date_created
    #[serde(default)]
    pub end: Option<i64>,
}

/// Single-number statistic response
#[derive(Debug, Serialize)]
pub struct StatResponse {
    pub statistic: Statistic,
    pub value: StatValue,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or unhealthy
    pub status: String,
    /// Storage status: ok or error
    pub storage: String,
    /// Pooled connections in total
    pub pool_size: usize,
    /// Pooled connections currently idle
    pub pool_idle: usize,
    /// Stored readings, when the store is reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readings: Option<u64>,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Crate version
    pub version: String,
}

/// Parse an optional JSON body
///
/// Returns `None` for an empty (or whitespace-only) body.
pub fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<Option<T>> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(None);
    }

    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::MalformedBody(e.to_string()))
}
