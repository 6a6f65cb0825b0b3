//! # lotwatch-core
//!
//! Core logic for campus parking lot status and shuttle schedule resolution.
//!
//! This crate provides:
//! - Time-of-day resolution in the campus timezone
//! - Parking period classification (overnight, business, open)
//! - The per-lot status decision table
//! - Shuttle timetable resolution (running, next departure)
//! - Geospatial distances and encoded-points shape decoding
//! - Configuration and reference data loading
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`time`] - Instant to local minute-of-day and weekday
//! - [`period`] - Period boundaries and classification
//! - [`lots`] - Lot categories and the status decision table
//! - [`schedule`] - Route timetables, departures and running state
//! - [`geo`] - Point, segment and polyline distances
//! - [`live`] - Live vehicle snapshots and shape decoding
//! - [`catalog`] - Lot table and route timetables loaded from TOML
//! - [`config`] - Application configuration loading and validation
//! - [`evaluate`] - One evaluation tick over the whole campus
//! - [`error`] - Unified error types for the crate
//!
//! Every evaluation function is pure: the same instant, catalog and live
//! snapshot always produce the same result.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod geo;
pub mod live;
pub mod lots;
pub mod period;
pub mod schedule;
pub mod time;

// Re-export primary types for convenience
pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use config::{
    default_config_dir, default_config_path, is_valid_timezone, CampusConfig, Config, ConfigError,
    ConfigResult, DataConfig, LiveConfig, ServerConfig,
};
pub use error::{LotwatchError, Result};
pub use evaluate::{CampusEvaluation, Evaluator, LotReport};
pub use geo::{point_distance, polyline_distance, segment_distance, GeoPoint};
pub use live::{
    decode_encoded_points, DropReport, LiveRoute, LiveSnapshot, LiveStop, Shape, ShapeError,
    UserLocation, Vehicle,
};
pub use lots::{LotCategory, LotStatus, LotStatusEngine, ParkingLot, StatusColor};
pub use period::{Period, PeriodBoundaries, PeriodClassifier, Transition};
pub use schedule::{parse_time_of_day, RouteSchedule, RouteStatus, SubSchedule, TimeOfDay};
pub use time::{TimeDescriptor, TimeResolver};
