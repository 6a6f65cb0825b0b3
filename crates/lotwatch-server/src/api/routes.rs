//! Shuttle route status endpoint.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use lotwatch_core::{RouteStatus, TimeDescriptor};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::{ApiResult, ErrorResponse};
use crate::api::resolve_instant;
use crate::state::SharedState;

/// Creates the routes router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(get_routes))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the routes endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoutesQuery {
    /// Evaluate at this RFC 3339 instant instead of now.
    #[param(example = "2025-01-15T19:40:00Z")]
    pub at: Option<String>,
}

/// Status of every scheduled route.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoutesResponse {
    /// Resolved local time.
    pub time: TimeDescriptor,

    /// Route statuses in catalog order.
    pub routes: Vec<RouteStatus>,

    /// Age of the live snapshot used, in seconds. Absent when no fresh snapshot exists.
    #[schema(example = 14)]
    pub live_age_secs: Option<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the status of every shuttle route.
#[utoipa::path(
    get,
    path = "/api/routes",
    tag = "shuttles",
    operation_id = "getRoutes",
    summary = "Get shuttle route status",
    description = "Resolves each route's timetables at the current campus \
        time. A route is visible when it is running on schedule or when live \
        vehicles report it.",
    params(RoutesQuery),
    responses(
        (status = 200, description = "Route statuses", body = RoutesResponse),
        (status = 400, description = "Invalid timestamp", body = ErrorResponse)
    )
)]
pub async fn get_routes(
    State(state): State<SharedState>,
    Query(query): Query<RoutesQuery>,
) -> ApiResult<Json<RoutesResponse>> {
    let now = resolve_instant(query.at.as_deref())?;
    let state_guard = state.read().await;

    let wall_clock = Utc::now();
    let feed = state_guard.live_feed(wall_clock);
    let time = state_guard.evaluator.resolver().resolve(&now);
    let routes = state_guard.evaluator.route_reports(
        &state_guard.catalog.routes,
        &time,
        feed.map(|f| &f.snapshot),
    );

    Ok(Json(RoutesResponse {
        time,
        routes,
        live_age_secs: feed.map(|f| wall_clock.signed_duration_since(f.received_at).num_seconds()),
    }))
}
