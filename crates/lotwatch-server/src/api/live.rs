//! Live vehicle feed endpoints.
//!
//! An upstream poller pushes raw snapshots here. Each snapshot replaces the
//! previous one; malformed entries are dropped and counted rather than
//! failing the whole upload.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use lotwatch_core::{DropReport, GeoPoint, LiveSnapshot, LiveStop};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Default number of stops returned by the nearest-stops endpoint.
const DEFAULT_NEAREST_LIMIT: usize = 5;

/// Creates the live feed router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", put(update_live))
        .route("/stops", get(nearest_stops))
        .route("/shapes/{id}/stops", get(shape_stops))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Counts of accepted records per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AcceptedCounts {
    /// Accepted vehicles.
    pub vehicles: usize,
    /// Accepted routes.
    pub routes: usize,
    /// Accepted stops.
    pub stops: usize,
    /// Accepted shapes.
    pub shapes: usize,
}

impl From<&LiveSnapshot> for AcceptedCounts {
    fn from(snapshot: &LiveSnapshot) -> Self {
        Self {
            vehicles: snapshot.vehicles.len(),
            routes: snapshot.routes.len(),
            stops: snapshot.stops.len(),
            shapes: snapshot.shapes.len(),
        }
    }
}

/// Response after a snapshot upload.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "accepted": {"vehicles": 4, "routes": 3, "stops": 20, "shapes": 3},
    "dropped": {"vehicles": 1, "routes": 0, "stops": 0, "shapes": 0},
    "received_at_utc": "2025-01-15T19:40:02Z"
}))]
pub struct LiveUpdateResponse {
    /// Records kept.
    pub accepted: AcceptedCounts,

    /// Records rejected as malformed.
    pub dropped: DropReport,

    /// UTC timestamp the snapshot was accepted.
    #[schema(example = "2025-01-15T19:40:02Z")]
    pub received_at_utc: String,
}

/// A live stop, optionally with its distance from a query point.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "4011",
    "name": "Main Entrance",
    "location": {"lat": 36.9775, "lng": -122.0535},
    "distance_m": 84.2
}))]
pub struct StopResponse {
    /// Stop id.
    pub id: String,

    /// Stop name.
    pub name: String,

    /// Stop position.
    pub location: GeoPoint,

    /// Meters from the query point, when one was given.
    pub distance_m: Option<f64>,
}

impl StopResponse {
    fn new(stop: &LiveStop, distance_m: Option<f64>) -> Self {
        Self {
            id: stop.id.clone(),
            name: stop.name.clone(),
            location: stop.position,
            distance_m,
        }
    }
}

/// Query parameters for the nearest-stops endpoint.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearestStopsQuery {
    /// Latitude in degrees.
    #[param(example = 36.9914)]
    pub lat: f64,

    /// Longitude in degrees.
    #[param(example = -122.0609)]
    pub lng: f64,

    /// Maximum number of stops to return. Defaults to 5.
    #[param(example = 5, minimum = 1)]
    pub limit: Option<usize>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Replace the live snapshot.
#[utoipa::path(
    put,
    path = "/api/live",
    tag = "shuttles",
    operation_id = "updateLive",
    summary = "Upload a live vehicle snapshot",
    description = "Accepts a raw snapshot with optional `vehicles`, `routes`, \
        `stops` and `shapes` arrays. Malformed entries are dropped and \
        counted. Snapshots older than the configured maximum age are ignored \
        by the other endpoints.",
    request_body(content = serde_json::Value, description = "Raw live snapshot"),
    responses(
        (status = 200, description = "Snapshot accepted", body = LiveUpdateResponse),
        (status = 400, description = "Snapshot is not an object of arrays", body = ErrorResponse)
    )
)]
pub async fn update_live(
    State(state): State<SharedState>,
    Json(raw): Json<serde_json::Value>,
) -> ApiResult<Json<LiveUpdateResponse>> {
    let (snapshot, dropped) = LiveSnapshot::from_json(&raw)?;
    let accepted = AcceptedCounts::from(&snapshot);
    let received_at = Utc::now();

    info!(
        vehicles = accepted.vehicles,
        routes = accepted.routes,
        dropped = dropped.total(),
        "Accepted live snapshot"
    );

    state.write().await.set_live(received_at, snapshot, dropped);

    Ok(Json(LiveUpdateResponse {
        accepted,
        dropped,
        received_at_utc: received_at.to_rfc3339(),
    }))
}

/// List the stops nearest a point.
#[utoipa::path(
    get,
    path = "/api/live/stops",
    tag = "shuttles",
    operation_id = "getNearestStops",
    summary = "Find the nearest stops",
    description = "Returns live stops ordered by distance from the given point. \
        Empty when no fresh snapshot is available.",
    params(NearestStopsQuery),
    responses(
        (status = 200, description = "Nearest stops", body = Vec<StopResponse>),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse)
    )
)]
pub async fn nearest_stops(
    State(state): State<SharedState>,
    Query(query): Query<NearestStopsQuery>,
) -> ApiResult<Json<Vec<StopResponse>>> {
    let origin = GeoPoint::new(query.lat, query.lng)?;
    let limit = query.limit.unwrap_or(DEFAULT_NEAREST_LIMIT);
    let state_guard = state.read().await;

    let stops = state_guard
        .live_snapshot(Utc::now())
        .map(|snapshot| {
            snapshot
                .nearest_stops(origin, limit)
                .into_iter()
                .map(|(stop, distance)| StopResponse::new(stop, Some(distance)))
                .collect()
        })
        .unwrap_or_default();

    Ok(Json(stops))
}

/// List the stops served by a shape.
#[utoipa::path(
    get,
    path = "/api/live/shapes/{id}/stops",
    tag = "shuttles",
    operation_id = "getShapeStops",
    summary = "List the stops along a route shape",
    description = "Returns live stops lying within the configured match radius \
        of the shape's polyline.",
    params(("id" = String, Path, description = "Shape id", example = "loop-cw")),
    responses(
        (status = 200, description = "Stops on the shape", body = Vec<StopResponse>),
        (status = 404, description = "No fresh snapshot contains this shape", body = ErrorResponse)
    )
)]
pub async fn shape_stops(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<StopResponse>>> {
    let state_guard = state.read().await;
    let radius = state_guard.config.live.stop_match_radius_m;

    let snapshot = state_guard
        .live_snapshot(Utc::now())
        .filter(|snapshot| snapshot.shape(&id).is_some())
        .ok_or_else(|| ApiError::NotFound {
            error_code: "shape_not_found".to_string(),
            message: format!("Shape not found in live snapshot: '{id}'"),
        })?;

    let stops = snapshot
        .stops_on_shape(&id, radius)
        .into_iter()
        .map(|stop| StopResponse::new(stop, None))
        .collect();

    Ok(Json(stops))
}
