use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::orbit::GroundTrackPoint;
use crate::telemetry::{segment, TelemetrySnapshot};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

/// Same envelope as the push channel.
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotResponse {
    pub iss: TelemetrySnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SegmentsResponse {
    #[schema(value_type = Vec<Vec<Vec<f64>>>)]
    pub segments: Vec<Vec<GroundTrackPoint>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub subscribers: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub elements_epoch: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/api/snapshot",
    responses(
        (status = 200, description = "Latest telemetry snapshot", body = SnapshotResponse),
        (status = 404, description = "Nothing published yet", body = ErrorResponse)
    ),
    tag = "telemetry"
)]
pub async fn latest_snapshot(State(state): State<AppState>) -> ApiResult<Json<SnapshotResponse>> {
    let latest = state
        .registry
        .latest()
        .ok_or(ApiError::NotFound("no_snapshot"))?;
    Ok(Json(SnapshotResponse {
        iss: latest.snapshot.clone(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/track/segments",
    responses(
        (status = 200, description = "Latest ground track split at the antimeridian", body = SegmentsResponse),
        (status = 404, description = "Nothing published yet", body = ErrorResponse)
    ),
    tag = "telemetry"
)]
pub async fn track_segments(State(state): State<AppState>) -> ApiResult<Json<SegmentsResponse>> {
    let latest = state
        .registry
        .latest()
        .ok_or(ApiError::NotFound("no_snapshot"))?;
    Ok(Json(SegmentsResponse {
        segments: segment(&latest.snapshot.orbit_points),
    }))
}

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Relay status", body = StatusResponse)
    ),
    tag = "telemetry"
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        subscribers: state.registry.len(),
        last_update: state.registry.latest().map(|p| p.snapshot.generated_at),
        elements_epoch: state.elements.current().map(|e| e.epoch()),
    })
}
