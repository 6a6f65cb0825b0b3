//! OpenAPI specification generation for lotwatch API.
//!
//! The generated document is served at `/api/openapi.json` and written to
//! `openapi.json` by the `gen-openapi` binary for client generation.

use axum::Json;
use lotwatch_core::{
    DropReport, GeoPoint, LotCategory, LotReport, LotStatus, Period, RouteStatus, StatusColor,
    TimeDescriptor, Transition,
};
use utoipa::OpenApi;

use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::live::{AcceptedCounts, LiveUpdateResponse, StopResponse};
use super::lots::LotsResponse;
use super::period::PeriodResponse;
use super::routes::RoutesResponse;

/// Serve the OpenAPI specification as JSON.
///
/// This endpoint is available at `/api/openapi.json` and returns the complete
/// OpenAPI 3.0 specification for the lotwatch API.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as a pretty-printed string.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> serde_json::Result<String> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for lotwatch.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "lotwatch API",
        version = "0.1.0",
        description = r#"
# lotwatch API

Campus parking lot status and shuttle schedules.

## Overview

1. **Periods**: the day is split into overnight, business and open parking periods
2. **Lots**: each lot gets a traffic-light status (green, yellow, orange, red) with a reason
3. **Shuttles**: route timetables resolve to running state and next departure, merged with live vehicle reports

All times are evaluated in the campus timezone. Every read endpoint accepts an
optional `at` RFC 3339 timestamp to evaluate a different instant.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local lotwatch server")
    ),
    tags(
        (
            name = "system",
            description = "Health checks and service status"
        ),
        (
            name = "parking",
            description = "Parking periods and per-lot status"
        ),
        (
            name = "shuttles",
            description = "Shuttle timetables, live vehicles and stops"
        )
    ),
    paths(
        // Health endpoints
        super::health::health_check,
        // Parking endpoints
        super::period::get_period,
        super::lots::get_lots,
        super::lots::get_lot,
        // Shuttle endpoints
        super::routes::get_routes,
        super::live::update_live,
        super::live::nearest_stops,
        super::live::shape_stops,
    ),
    components(
        schemas(
            // Error types
            ErrorResponse,
            // Health types
            HealthResponse,
            // Parking types
            PeriodResponse,
            LotsResponse,
            TimeDescriptor,
            Period,
            Transition,
            LotReport,
            LotStatus,
            StatusColor,
            LotCategory,
            GeoPoint,
            // Shuttle types
            RoutesResponse,
            RouteStatus,
            LiveUpdateResponse,
            AcceptedCounts,
            DropReport,
            StopResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "lotwatch API");
        assert!(spec.paths.paths.contains_key("/api/lots/{id}"));
        assert!(spec.paths.paths.contains_key("/api/live"));
    }

    #[test]
    fn test_openapi_json_serialization() {
        let json = get_openapi_json().unwrap();
        assert!(json.contains("\"openapi\":"));
        assert!(json.contains("\"lotwatch API\""));
    }
}
