//! Unified error types for the lotwatch core library.
//!
//! This module provides a unified error type [`LotwatchError`] that covers all failure
//! modes across the core. Modules that load or decode external data also have their
//! own specific error types (`ConfigError`, `CatalogError`, `ScheduleError`,
//! `ShapeError`) which convert into [`LotwatchError`].
//!
//! The pure evaluation functions (period classification, lot status, schedule
//! resolution, distances) are total over their documented domains and never return
//! errors. Errors only arise where values enter that domain: building a time
//! descriptor, parsing departure strings, decoding shapes, loading configuration.
//!
//! # Example
//!
//! ```rust
//! use lotwatch_core::error::{LotwatchError, Result};
//!
//! fn checked_minute(minute: u16) -> Result<u16> {
//!     if minute >= 1440 {
//!         return Err(LotwatchError::MinuteOutOfRange(minute));
//!     }
//!     Ok(minute)
//! }
//!
//! assert!(checked_minute(1500).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The unified error type for all lotwatch operations.
#[derive(Debug, Error)]
pub enum LotwatchError {
    // =========================================================================
    // TIME DOMAIN ERRORS
    // =========================================================================
    /// A minute-of-day value fell outside `0..1440`.
    #[error("Minute of day {0} is out of range; expected 0..1440")]
    MinuteOutOfRange(u16),

    /// A day-of-week value fell outside `0..=6` (Sunday = 0).
    #[error("Day of week {0} is out of range; expected 0 (Sunday) through 6 (Saturday)")]
    DayOutOfRange(u8),

    /// A departure time string could not be parsed as a 12-hour clock time.
    #[error("Invalid time of day: '{0}'. Expected 12-hour format like '7:05 AM'.")]
    InvalidTimeOfDay(String),

    /// Period boundaries are not strictly increasing within a day.
    #[error("Invalid period boundaries: {0}")]
    InvalidBoundaries(String),

    // =========================================================================
    // GEOSPATIAL & LIVE DATA ERRORS
    // =========================================================================
    /// A coordinate was non-finite or outside the valid latitude/longitude range.
    #[error("Invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lng: f64,
    },

    /// An encoded shape string contained an unusable point.
    #[error("Malformed shape: {0}")]
    MalformedShape(String),

    /// A live snapshot did not have the expected top-level structure.
    #[error("Malformed live snapshot: {0}")]
    MalformedSnapshot(String),

    // =========================================================================
    // REFERENCE DATA ERRORS
    // =========================================================================
    /// The reference data catalog could not be parsed.
    #[error("Failed to parse catalog: {0}")]
    CatalogParseError(String),

    /// The catalog parsed but contains invalid entries.
    #[error("Catalog validation failed: {0}")]
    CatalogValidationError(String),

    /// A lot id was requested that the catalog does not contain.
    #[error("Lot not found: '{0}'")]
    LotNotFound(String),

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file exists but could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // I/O ERRORS
    // =========================================================================
    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for lotwatch operations.
pub type Result<T> = std::result::Result<T, LotwatchError>;

impl LotwatchError {
    /// Returns `true` if the error rejects a value outside a documented input domain.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::MinuteOutOfRange(_)
                | Self::DayOutOfRange(_)
                | Self::InvalidTimeOfDay(_)
                | Self::InvalidBoundaries(_)
                | Self::InvalidCoordinate { .. }
                | Self::MalformedShape(_)
                | Self::MalformedSnapshot(_)
        )
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ConfigParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns `true` if this error is related to the reference data catalog.
    #[inline]
    #[must_use]
    pub const fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            Self::CatalogParseError(_) | Self::CatalogValidationError(_) | Self::LotNotFound(_)
        )
    }

    /// Returns `true` if this error is related to I/O.
    #[inline]
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::IoError(_))
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::MinuteOutOfRange(_)
            | Self::DayOutOfRange(_)
            | Self::InvalidTimeOfDay(_)
            | Self::InvalidCoordinate { .. }
            | Self::MalformedShape(_)
            | Self::MalformedSnapshot(_) => 400,

            // 404 Not Found
            Self::LotNotFound(_) | Self::ConfigNotFound(_) => 404,

            // 422 Unprocessable Entity - semantic errors
            Self::InvalidBoundaries(_)
            | Self::CatalogParseError(_)
            | Self::CatalogValidationError(_)
            | Self::ConfigParseError(_)
            | Self::ConfigValidationError(_) => 422,

            // 500 Internal Server Error
            Self::IoError(_) => 500,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MinuteOutOfRange(_) => "MINUTE_OUT_OF_RANGE",
            Self::DayOutOfRange(_) => "DAY_OUT_OF_RANGE",
            Self::InvalidTimeOfDay(_) => "INVALID_TIME_OF_DAY",
            Self::InvalidBoundaries(_) => "INVALID_BOUNDARIES",
            Self::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            Self::MalformedShape(_) => "MALFORMED_SHAPE",
            Self::MalformedSnapshot(_) => "MALFORMED_SNAPSHOT",
            Self::CatalogParseError(_) => "CATALOG_PARSE_ERROR",
            Self::CatalogValidationError(_) => "CATALOG_VALIDATION_ERROR",
            Self::LotNotFound(_) => "LOT_NOT_FOUND",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<crate::config::ConfigError> for LotwatchError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            ConfigError::Load(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::ValidationError { field, message } => {
                Self::ConfigValidationError(format!("{field}: {message}"))
            }
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
                Self::ConfigValidationError(messages.join("; "))
            }
        }
    }
}

impl From<crate::catalog::CatalogError> for LotwatchError {
    fn from(err: crate::catalog::CatalogError) -> Self {
        use crate::catalog::CatalogError;
        match err {
            CatalogError::ReadError { source, .. } => Self::IoError(source),
            CatalogError::ParseError(e) => Self::CatalogParseError(e.to_string()),
            other => Self::CatalogValidationError(other.to_string()),
        }
    }
}

impl From<crate::schedule::ScheduleError> for LotwatchError {
    fn from(err: crate::schedule::ScheduleError) -> Self {
        use crate::schedule::ScheduleError;
        match err {
            ScheduleError::InvalidTimeOfDay { input } => Self::InvalidTimeOfDay(input),
        }
    }
}

impl From<crate::live::ShapeError> for LotwatchError {
    fn from(err: crate::live::ShapeError) -> Self {
        Self::MalformedShape(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoErr, ErrorKind};

    #[test]
    fn test_validation_error_classification() {
        assert!(LotwatchError::MinuteOutOfRange(1440).is_validation_error());
        assert!(LotwatchError::DayOutOfRange(7).is_validation_error());
        assert!(LotwatchError::InvalidTimeOfDay("25:00".into()).is_validation_error());
        assert!(LotwatchError::InvalidCoordinate {
            lat: f64::NAN,
            lng: 0.0
        }
        .is_validation_error());

        assert!(!LotwatchError::LotNotFound("A".into()).is_validation_error());
    }

    #[test]
    fn test_config_error_classification() {
        assert!(LotwatchError::ConfigNotFound(PathBuf::from("/test")).is_config_error());
        assert!(LotwatchError::ConfigParseError("syntax error".into()).is_config_error());
        assert!(LotwatchError::ConfigValidationError("bad".into()).is_config_error());

        assert!(!LotwatchError::CatalogParseError("bad".into()).is_config_error());
    }

    #[test]
    fn test_catalog_error_classification() {
        assert!(LotwatchError::CatalogParseError("x".into()).is_catalog_error());
        assert!(LotwatchError::LotNotFound("P1".into()).is_catalog_error());
        assert!(!LotwatchError::MinuteOutOfRange(2000).is_catalog_error());
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LotwatchError::DayOutOfRange(9).http_status_code(), 400);
        assert_eq!(LotwatchError::LotNotFound("P1".into()).http_status_code(), 404);
        assert_eq!(
            LotwatchError::CatalogValidationError("dup".into()).http_status_code(),
            422
        );
        assert_eq!(
            LotwatchError::IoError(IoErr::new(ErrorKind::Other, "disk")).http_status_code(),
            500
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LotwatchError::InvalidTimeOfDay("noon".into()).error_code(),
            "INVALID_TIME_OF_DAY"
        );
        assert_eq!(
            LotwatchError::LotNotFound("P1".into()).error_code(),
            "LOT_NOT_FOUND"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoErr::new(ErrorKind::NotFound, "file not found");
        let err: LotwatchError = io_err.into();
        assert!(matches!(err, LotwatchError::IoError(_)));
        assert!(err.is_io_error());
    }

    #[test]
    fn test_from_schedule_error() {
        let err: LotwatchError = crate::schedule::ScheduleError::InvalidTimeOfDay {
            input: "13:00 PM".into(),
        }
        .into();
        assert!(format!("{err}").contains("13:00 PM"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<LotwatchError>();
        assert_sync::<LotwatchError>();
    }
}
