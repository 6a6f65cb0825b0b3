//! Parking lot status endpoints.
//!
//! Statuses are recomputed from the catalog on every request. When both `lat`
//! and `lng` are supplied the lots are ordered nearest first and carry their
//! distance from that point.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use lotwatch_core::{GeoPoint, LotReport, Period, TimeDescriptor, UserLocation};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::api::resolve_instant;
use crate::state::SharedState;

/// Creates the lots router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(get_lots))
        .route("/{id}", get(get_lot))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for lot endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LotsQuery {
    /// User latitude in degrees. Requires `lng`.
    #[param(example = 36.9914)]
    pub lat: Option<f64>,

    /// User longitude in degrees. Requires `lat`.
    #[param(example = -122.0609)]
    pub lng: Option<f64>,

    /// Evaluate at this RFC 3339 instant instead of now.
    #[param(example = "2025-01-15T19:40:00Z")]
    pub at: Option<String>,
}

impl LotsQuery {
    /// The user location implied by the coordinates.
    fn location(&self) -> ApiResult<UserLocation> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Ok(UserLocation::Resolved(GeoPoint::new(lat, lng)?)),
            (None, None) => Ok(UserLocation::Unavailable),
            _ => Err(ApiError::BadRequest {
                error_code: "incomplete_location".to_string(),
                message: "Both lat and lng are required for proximity sorting".to_string(),
            }),
        }
    }
}

/// Status of every lot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LotsResponse {
    /// Resolved local time.
    pub time: TimeDescriptor,

    /// Current period.
    pub period: Period,

    /// Lot statuses, nearest first when a location was given.
    pub lots: Vec<LotReport>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the status of every lot.
#[utoipa::path(
    get,
    path = "/api/lots",
    tag = "parking",
    operation_id = "getLots",
    summary = "Get the status of every lot",
    description = "Evaluates every lot in the catalog at the current campus \
        time. Supply both `lat` and `lng` to sort lots nearest first and \
        include distances in meters.",
    params(LotsQuery),
    responses(
        (status = 200, description = "Lot statuses", body = LotsResponse),
        (status = 400, description = "Invalid coordinates or timestamp", body = ErrorResponse)
    )
)]
pub async fn get_lots(
    State(state): State<SharedState>,
    Query(query): Query<LotsQuery>,
) -> ApiResult<Json<LotsResponse>> {
    let now = resolve_instant(query.at.as_deref())?;
    let location = query.location()?;
    let state_guard = state.read().await;

    let (time, period, _) = state_guard.evaluator.period_at(&now);
    let lots = state_guard
        .evaluator
        .lot_reports(&state_guard.catalog, &time, &location);

    Ok(Json(LotsResponse { time, period, lots }))
}

/// Get the status of one lot.
#[utoipa::path(
    get,
    path = "/api/lots/{id}",
    tag = "parking",
    operation_id = "getLot",
    summary = "Get the status of one lot",
    description = "Evaluates a single lot at the current campus time.",
    params(
        ("id" = String, Path, description = "Lot id", example = "P101"),
        LotsQuery
    ),
    responses(
        (status = 200, description = "Lot status", body = LotReport),
        (status = 400, description = "Invalid coordinates or timestamp", body = ErrorResponse),
        (status = 404, description = "Unknown lot id", body = ErrorResponse)
    )
)]
pub async fn get_lot(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<LotsQuery>,
) -> ApiResult<Json<LotReport>> {
    let now = resolve_instant(query.at.as_deref())?;
    let location = query.location()?;
    let state_guard = state.read().await;

    let report = state_guard
        .evaluator
        .lot_status(&now, &state_guard.catalog, &id, &location)?;

    Ok(Json(report))
}
