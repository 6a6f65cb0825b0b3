//! HTTP API routes and handlers.
//!
//! This module contains all HTTP endpoint implementations organized by domain:
//! - `health` - Service health checks
//! - `period` - Current parking period
//! - `lots` - Parking lot status
//! - `routes` - Shuttle route status
//! - `live` - Live vehicle snapshot upload and stop lookups
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub mod error;
pub mod health;
pub mod live;
pub mod lots;
pub mod openapi;
pub mod period;
pub mod routes;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorResponse};

// Re-export OpenAPI utilities for the gen-openapi binary
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                       - Health check
/// /api
/// ├── /period                   - Current parking period
/// ├── /lots                     - All lot statuses
/// ├── /lots/{id}                - One lot's status
/// ├── /routes                   - Shuttle route statuses
/// ├── /live                     - Live snapshot upload (PUT)
/// ├── /live/stops               - Nearest live stops
/// ├── /live/shapes/{id}/stops   - Stops along a shape
/// └── /openapi.json             - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                .nest("/period", period::router())
                .nest("/lots", lots::router())
                .nest("/routes", routes::router())
                .nest("/live", live::router())
                // OpenAPI spec at /api/openapi.json
                .route("/openapi.json", get(openapi::get_openapi_spec)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Parse an optional RFC 3339 `at` parameter, defaulting to now.
pub(crate) fn resolve_instant(at: Option<&str>) -> ApiResult<DateTime<Utc>> {
    at.map_or_else(
        || Ok(Utc::now()),
        |raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|instant| instant.with_timezone(&Utc))
                .map_err(|e| ApiError::BadRequest {
                    error_code: "invalid_timestamp".to_string(),
                    message: format!("'{raw}' is not an RFC 3339 timestamp: {e}"),
                })
        },
    )
}
