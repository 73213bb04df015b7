//! Statistic Routes
//!
//! Aggregate queries over a device's readings. `type` is required on all
//! of them; `quartiles` also requires `start` and `end`.
//!
//! - GET /devices/:device_uuid/readings/min/ - Reading with the smallest value
//! - GET /devices/:device_uuid/readings/max/ - Reading with the largest value
//! - GET /devices/:device_uuid/readings/mean/ - Mean value
//! - GET /devices/:device_uuid/readings/median/ - Median value
//! - GET /devices/:device_uuid/readings/mode/ - Most frequent value
//! - GET /devices/:device_uuid/readings/quartiles/ - Lower and upper quartile
//!
//! A query that matches no readings answers 204 No Content.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{FilterParams, StatResponse};
use crate::api::error::ApiResult;
use crate::api::routes::readings::{build_filter, resolve_filter_params};
use crate::api::state::AppState;
use crate::query::{StatOutcome, Statistic};

async fn run_statistic(
    state: &AppState,
    statistic: Statistic,
    device_uuid: String,
    query: Result<Query<FilterParams>, QueryRejection>,
    body: &Bytes,
) -> ApiResult<Response> {
    let params = resolve_filter_params(query, body)?;
    let filter = build_filter(device_uuid, params)?;

    let response = match state.executor.compute(statistic, filter).await? {
        StatOutcome::Reading(reading) => Json(reading).into_response(),
        StatOutcome::Value(value) => Json(StatResponse { statistic, value }).into_response(),
        StatOutcome::Quartiles(quartiles) => Json(quartiles).into_response(),
        StatOutcome::NoResults => StatusCode::NO_CONTENT.into_response(),
    };

    Ok(response)
}

/// GET /devices/:device_uuid/readings/min/
pub async fn min(
    State(state): State<Arc<AppState>>,
    Path(device_uuid): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Response> {
    run_statistic(&state, Statistic::Min, device_uuid, query, &body).await
}

/// GET /devices/:device_uuid/readings/max/
pub async fn max(
    State(state): State<Arc<AppState>>,
    Path(device_uuid): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Response> {
    run_statistic(&state, Statistic::Max, device_uuid, query, &body).await
}

/// GET /devices/:device_uuid/readings/mean/
pub async fn mean(
    State(state): State<Arc<AppState>>,
    Path(device_uuid): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Response> {
    run_statistic(&state, Statistic::Mean, device_uuid, query, &body).await
}

/// GET /devices/:device_uuid/readings/median/
pub async fn median(
    State(state): State<Arc<AppState>>,
    Path(device_uuid): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Response> {
    run_statistic(&state, Statistic::Median, device_uuid, query, &body).await
}

/// GET /devices/:device_uuid/readings/mode/
pub async fn mode(
    State(state): State<Arc<AppState>>,
    Path(device_uuid): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Response> {
    run_statistic(&state, Statistic::Mode, device_uuid, query, &body).await
}

/// GET /devices/:device_uuid/readings/quartiles/
pub async fn quartiles(
    State(state): State<Arc<AppState>>,
    Path(device_uuid): Path<String>,
    query: Result<Query<FilterParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Response> {
    run_statistic(&state, Statistic::Quartiles, device_uuid, query, &body).await
}
