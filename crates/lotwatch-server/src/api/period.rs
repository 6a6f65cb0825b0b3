//! Current parking period endpoint.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use lotwatch_core::{Period, TimeDescriptor, Transition};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::ApiResult;
use crate::api::resolve_instant;
use crate::state::SharedState;

/// Creates the period router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(get_period))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the period endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Evaluate at this RFC 3339 instant instead of now.
    #[param(example = "2025-01-15T10:05:00Z")]
    pub at: Option<String>,
}

/// Current period and the next boundary.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "timezone": "America/Los_Angeles",
    "time": {"minutes_since_midnight": 125, "day_of_week": 3, "display": "2:05 AM"},
    "period": "overnight",
    "next_transition": {
        "period": "business",
        "label": "Business hours begin",
        "starts_at": "7:00 AM",
        "minutes_until": 295
    }
}))]
pub struct PeriodResponse {
    /// Campus timezone.
    #[schema(example = "America/Los_Angeles")]
    pub timezone: String,

    /// Resolved local time.
    pub time: TimeDescriptor,

    /// Current period.
    pub period: Period,

    /// Next period boundary.
    pub next_transition: Transition,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the current parking period.
#[utoipa::path(
    get,
    path = "/api/period",
    tag = "parking",
    operation_id = "getPeriod",
    summary = "Get the current parking period",
    description = "Resolves the current campus-local time and returns the \
        parking period in effect plus a countdown to the next boundary.",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Period resolved", body = PeriodResponse),
        (status = 400, description = "Invalid timestamp", body = crate::api::error::ErrorResponse)
    )
)]
pub async fn get_period(
    State(state): State<SharedState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<PeriodResponse>> {
    let now = resolve_instant(query.at.as_deref())?;
    let state_guard = state.read().await;

    let (time, period, next_transition) = state_guard.evaluator.period_at(&now);

    Ok(Json(PeriodResponse {
        timezone: state_guard.config.campus.timezone.name().to_string(),
        time,
        period,
        next_transition,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_query_deserialization() {
        let query: PeriodQuery =
            serde_json::from_str(r#"{"at": "2025-01-15T10:05:00Z"}"#).unwrap();
        assert_eq!(query.at.as_deref(), Some("2025-01-15T10:05:00Z"));
    }
}
