//! API error types and response handling.
//!
//! This module provides a unified error type for all API handlers
//! with automatic conversion to appropriate HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lotwatch_core::LotwatchError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type.
///
/// Each variant maps to a specific HTTP status code and produces a
/// consistent JSON error response.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 400 Bad Request - Invalid input from client.
    BadRequest {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 404 Not Found - Resource does not exist.
    NotFound {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 500 Internal Server Error - Unexpected server-side error.
    InternalError {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Optional details (not exposed to client in production).
        details: Option<String>,
    },
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "lot_not_found",
    "message": "Lot not found: 'P999'",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "invalid_coordinate").
    #[schema(example = "lot_not_found")]
    pub error: String,

    /// Human-readable error message.
    #[schema(example = "Lot not found: 'P999'")]
    pub message: String,

    /// Optional additional details for debugging.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::BadRequest { error_code, message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                },
            ),

            Self::NotFound { error_code, message } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                },
            ),

            Self::InternalError {
                error_code,
                message,
                details,
            } => {
                tracing::error!(
                    error_code = %error_code,
                    message = %message,
                    details = ?details,
                    "Internal server error"
                );

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: error_code,
                        message,
                        details: details.map(|d| serde_json::json!(d)),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest { message, .. } => write!(f, "Bad Request: {message}"),
            Self::NotFound { message, .. } => write!(f, "Not Found: {message}"),
            Self::InternalError { message, .. } => {
                write!(f, "Internal Error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Convert from `lotwatch_core` errors.
///
/// Client input problems become 400s and unknown lots 404s. Catalog and
/// configuration problems surfacing at request time are server faults.
impl From<LotwatchError> for ApiError {
    fn from(err: LotwatchError) -> Self {
        let error_code = err.error_code().to_ascii_lowercase();
        match err.http_status_code() {
            400 => Self::BadRequest {
                error_code,
                message: err.to_string(),
            },
            404 => Self::NotFound {
                error_code,
                message: err.to_string(),
            },
            _ => Self::InternalError {
                error_code,
                message: err.to_string(),
                details: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_error() {
        let err = ApiError::BadRequest {
            error_code: "test_error".to_string(),
            message: "Test message".to_string(),
        };
        assert!(err.to_string().contains("Bad Request"));
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse {
            error: "test_error".to_string(),
            message: "Test message".to_string(),
            details: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test_error"));
    }

    #[test]
    fn test_from_core_errors() {
        let err = ApiError::from(LotwatchError::LotNotFound("P999".into()));
        assert!(matches!(
            err,
            ApiError::NotFound { ref error_code, .. } if error_code == "lot_not_found"
        ));

        let err = ApiError::from(LotwatchError::InvalidCoordinate { lat: 91.0, lng: 0.0 });
        assert!(matches!(err, ApiError::BadRequest { .. }));

        let err = ApiError::from(LotwatchError::CatalogValidationError("dup".into()));
        assert!(matches!(err, ApiError::InternalError { .. }));
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::NotFound {
            error_code: "lot_not_found".into(),
            message: "missing".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
