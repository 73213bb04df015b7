//! Reading Routes
//!
//! Endpoints for ingesting and listing a device's readings.
//!
//! - POST /devices/:device_uuid/readings/ - Store one reading
//! - GET /devices/:device_uuid/readings/ - List readings, optionally filtered

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::api::dto::{parse_json_body, FilterParams, IngestRequest, IngestResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{NewReading, Reading, ReadingFilter, SensorType};

/// POST /devices/:device_uuid/readings/
///
/// Body: `{"type": "temperature", "value": 22, "date_created": 1700000000}`.
/// `date_created` is optional and defaults to now.
pub async fn create_reading(
    State(state): State<Arc<AppState>>,
    Path(device_uuid): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let req: IngestRequest = parse_json_body(&body)?.ok_or_else(|| {
        ApiError::Validation("missing data in the request body".to_string())
    })?;

    let reading = build_new_reading(device_uuid, req)?;
    let stored = state.store.insert(reading).await?;

    tracing::info!(
        device_uuid = %stored.device_uuid,
        sensor_type = %stored.sensor_type,
        value = stored.value,
        "Reading ingested"
    );

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            status: "ok".to_string(),
            reading: stored,
        }),
    ))
}

/// GET /devices/:device_uuid/readings/
///
/// Optional filters `type`, `start`, `end`, given as a JSON body or as
/// query string parameters.
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Path(device_uuid): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Json<Vec<Reading>>> {
    let params = resolve_filter_params(query, &body)?;
    let filter = build_filter(device_uuid, params)?;

    let readings = state.executor.list(filter).await?;
    Ok(Json(readings))
}

/// Turn an ingest request into a reading for the store
fn build_new_reading(device_uuid: String, req: IngestRequest) -> ApiResult<NewReading> {
    let sensor_type = match req.sensor_type.as_deref() {
        None | Some("") => {
            return Err(ApiError::Validation("the sensor type is required".to_string()))
        }
        Some(s) => SensorType::from_str(s)?,
    };

    let value = req
        .value
        .ok_or_else(|| ApiError::Validation("the sensor value is required".to_string()))?;

    let mut reading = NewReading::new(device_uuid, sensor_type, value);
    if let Some(ts) = req.date_created {
        reading = reading.created_at(ts);
    }

    Ok(reading)
}

/// Filters come from the JSON body when one is sent, else the query string
pub(crate) fn resolve_filter_params(
    query: Result<Query<FilterParams>, QueryRejection>,
    body: &Bytes,
) -> ApiResult<FilterParams> {
    if let Some(params) = parse_json_body::<FilterParams>(body)? {
        return Ok(params);
    }

    let Query(params) = query.map_err(|e| ApiError::MalformedBody(e.body_text()))?;
    Ok(params)
}

/// Build a store filter, rejecting unknown sensor types
pub(crate) fn build_filter(device_uuid: String, params: FilterParams) -> ApiResult<ReadingFilter> {
    let mut filter = ReadingFilter::device(device_uuid);

    if let Some(t) = params.sensor_type.as_deref().filter(|t| !t.is_empty()) {
        filter = filter.sensor_type(SensorType::from_str(t)?);
    }
    if let Some(start) = params.start {
        filter = filter.start(start);
    }
    if let Some(end) = params.end {
        filter = filter.end(end);
    }

    Ok(filter)
}
