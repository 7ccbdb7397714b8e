use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::telemetry::{SegmentsResponse, SnapshotResponse, StatusResponse};
use crate::telemetry::{Illumination, TelemetrySnapshot, Visibility};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::telemetry::latest_snapshot,
        super::api::telemetry::track_segments,
        super::api::telemetry::status,
    ),
    components(
        schemas(
            SnapshotResponse,
            SegmentsResponse,
            StatusResponse,
            TelemetrySnapshot,
            Illumination,
            Visibility,
            ErrorResponse,
        )
    ),
    info(
        title = "ISS Relay API",
        description = "Read-only view of the telemetry pushed over /ws",
        version = "0.1.0"
    ),
    tags(
        (name = "telemetry", description = "Latest published telemetry")
    )
)]
pub struct ApiDoc;
