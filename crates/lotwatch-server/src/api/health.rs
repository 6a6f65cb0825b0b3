//! Health check API endpoint.
//!
//! Provides a simple health check endpoint for monitoring and load balancers.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::SharedState;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "ok",
    "version": "0.1.0",
    "campus": "Hilltop",
    "timezone": "America/Los_Angeles",
    "lots": 12,
    "routes": 3,
    "live_feed": true
}))]
pub struct HealthResponse {
    /// Service status.
    #[schema(example = "ok")]
    pub status: String,

    /// Service version from Cargo.toml.
    #[schema(example = "0.1.0")]
    pub version: String,

    /// Campus display name.
    #[schema(example = "Hilltop")]
    pub campus: String,

    /// Campus timezone.
    #[schema(example = "America/Los_Angeles")]
    pub timezone: String,

    /// Lots in the catalog.
    #[schema(example = 12)]
    pub lots: usize,

    /// Routes in the catalog.
    #[schema(example = 3)]
    pub routes: usize,

    /// Whether a fresh live snapshot is available.
    #[schema(example = true)]
    pub live_feed: bool,
}

/// Creates the health router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(health_check))
}

/// Health check endpoint.
///
/// Returns basic service status and the size of the loaded catalog.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    operation_id = "healthCheck",
    summary = "Check service health",
    description = "Returns basic service status information. Use this endpoint \
        for load balancer health checks and monitoring.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let state_guard = state.read().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        campus: state_guard.config.campus.name.clone(),
        timezone: state_guard.config.campus.timezone.name().to_string(),
        lots: state_guard.catalog.lots.len(),
        routes: state_guard.catalog.routes.len(),
        live_feed: state_guard.live_feed(Utc::now()).is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            campus: "Campus".to_string(),
            timezone: "America/Los_Angeles".to_string(),
            lots: 2,
            routes: 1,
            live_feed: false,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"live_feed\":false"));
    }
}
