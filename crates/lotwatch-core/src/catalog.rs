//! Static campus reference data: the lot table and route timetables.
//!
//! The catalog is a TOML document:
//!
//! ```toml
//! [[lots]]
//! id = "P101"
//! name = "East Remote"
//! category = "student"
//! overnight_exempt = false
//! location = { lat = 36.9912, lng = -122.0531 }
//! boundary = [
//!     { lat = 36.9915, lng = -122.0535 },
//!     { lat = 36.9915, lng = -122.0527 },
//!     { lat = 36.9909, lng = -122.0527 },
//! ]
//!
//! [[routes]]
//! name = "Loop"
//! color = "#1f77b4"
//!
//! [[routes.sub_schedules]]
//! label = "Daytime"
//! days_of_week = [1, 2, 3, 4, 5]
//! stops = [{ name = "Depot", offset_minutes = 0 }, { name = "Library", offset_minutes = 12 }]
//! departures = ["7:00 AM", "7:30 AM", "8:00 AM"]
//! ```
//!
//! Everything is validated on load; a catalog that loads is safe to evaluate.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::lots::ParkingLot;
use crate::schedule::{RouteSchedule, TimeOfDay};

/// Minimum number of points in a lot boundary ring.
pub const MIN_BOUNDARY_POINTS: usize = 3;

/// Errors that can occur while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("Failed to read catalog {}: {source}", .path.display())]
    ReadError {
        /// Catalog path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not valid TOML or does not match the schema.
    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Two lots share an id.
    #[error("Duplicate lot id '{0}'")]
    DuplicateLotId(String),

    /// A lot has an empty id or name.
    #[error("Lot #{index} has an empty id or name")]
    UnnamedLot {
        /// Zero-based position in the lot table.
        index: usize,
    },

    /// A lot boundary has too few points to enclose an area.
    #[error("Lot '{lot_id}' boundary has {points} points, expected at least {min}", min = MIN_BOUNDARY_POINTS)]
    InvalidBoundary {
        /// Lot id.
        lot_id: String,
        /// Number of points found.
        points: usize,
    },

    /// A route has an empty name or two routes share a name.
    #[error("Route name '{0}' is empty or duplicated")]
    InvalidRouteName(String),

    /// A timetable lists a day outside `0..=6`.
    #[error("Route '{route}' schedule '{schedule}' lists day {day}, expected 0 (Sunday) through 6")]
    InvalidDay {
        /// Route name.
        route: String,
        /// Timetable label.
        schedule: String,
        /// Offending day.
        day: u8,
    },

    /// A timetable has no days.
    #[error("Route '{route}' schedule '{schedule}' runs on no days")]
    NoDays {
        /// Route name.
        route: String,
        /// Timetable label.
        schedule: String,
    },

    /// Stop offsets decrease along the trip.
    #[error("Route '{route}' schedule '{schedule}' stop '{stop}' is earlier than the stop before it")]
    DecreasingStopOffset {
        /// Route name.
        route: String,
        /// Timetable label.
        schedule: String,
        /// Offending stop.
        stop: String,
    },

    /// Departures go backwards other than by a single wrap past midnight.
    #[error("Route '{route}' schedule '{schedule}' departure {departure} is out of order")]
    UnorderedDepartures {
        /// Route name.
        route: String,
        /// Timetable label.
        schedule: String,
        /// First departure that breaks the order.
        departure: String,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// The lot table and route timetables for one campus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Parking lots, in display order.
    #[serde(default)]
    pub lots: Vec<ParkingLot>,

    /// Shuttle routes, in display order.
    #[serde(default)]
    pub routes: Vec<RouteSchedule>,
}

impl Catalog {
    /// Load and validate a catalog file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            lots = catalog.lots.len(),
            routes = catalog.routes.len(),
            "Loaded campus catalog"
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the text cannot be parsed or validated.
    pub fn from_toml_str(content: &str) -> CatalogResult<Self> {
        let catalog: Self = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check cross-entry invariants that the schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> CatalogResult<()> {
        let mut lot_ids = HashSet::new();
        for (index, lot) in self.lots.iter().enumerate() {
            if lot.id.trim().is_empty() || lot.name.trim().is_empty() {
                return Err(CatalogError::UnnamedLot { index });
            }
            if !lot_ids.insert(lot.id.as_str()) {
                return Err(CatalogError::DuplicateLotId(lot.id.clone()));
            }
            if lot.boundary.len() < MIN_BOUNDARY_POINTS {
                return Err(CatalogError::InvalidBoundary {
                    lot_id: lot.id.clone(),
                    points: lot.boundary.len(),
                });
            }
        }

        let mut route_names = HashSet::new();
        for route in &self.routes {
            let key = route.name.trim().to_lowercase();
            if key.is_empty() || !route_names.insert(key) {
                return Err(CatalogError::InvalidRouteName(route.name.clone()));
            }
            for sub in &route.sub_schedules {
                if sub.days_of_week.is_empty() {
                    return Err(CatalogError::NoDays {
                        route: route.name.clone(),
                        schedule: sub.label.clone(),
                    });
                }
                if let Some(&day) = sub.days_of_week.iter().find(|&&d| d > 6) {
                    return Err(CatalogError::InvalidDay {
                        route: route.name.clone(),
                        schedule: sub.label.clone(),
                        day,
                    });
                }
                if let Some(pair) = sub
                    .stops
                    .windows(2)
                    .find(|pair| pair[1].offset_minutes < pair[0].offset_minutes)
                {
                    return Err(CatalogError::DecreasingStopOffset {
                        route: route.name.clone(),
                        schedule: sub.label.clone(),
                        stop: pair[1].name.clone(),
                    });
                }
                if let Some(departure) = unordered_departure(&sub.departures) {
                    return Err(CatalogError::UnorderedDepartures {
                        route: route.name.clone(),
                        schedule: sub.label.clone(),
                        departure: departure.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up a lot by id.
    #[must_use]
    pub fn lot(&self, id: &str) -> Option<&ParkingLot> {
        self.lots.iter().find(|lot| lot.id == id)
    }

    /// Look up a route by name, case-insensitively.
    #[must_use]
    pub fn route(&self, name: &str) -> Option<&RouteSchedule> {
        self.routes.iter().find(|route| route.matches_name(name))
    }
}

/// First departure that breaks a strictly increasing list with at most one
/// midnight wrap. After the wrap every departure must stay before the first.
fn unordered_departure(departures: &[TimeOfDay]) -> Option<TimeOfDay> {
    let first = *departures.first()?;
    let mut wrapped = false;
    for pair in departures.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next > prev {
            if wrapped && next >= first {
                return Some(next);
            }
            continue;
        }
        if next == prev || wrapped || next >= first {
            return Some(next);
        }
        wrapped = true;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use crate::lots::LotCategory;

    const SAMPLE: &str = r##"
        [[lots]]
        id = "P101"
        name = "East Remote"
        category = "student"
        location = { lat = 36.9912, lng = -122.0531 }
        boundary = [
            { lat = 36.9915, lng = -122.0535 },
            { lat = 36.9915, lng = -122.0527 },
            { lat = 36.9909, lng = -122.0527 },
        ]

        [[lots]]
        id = "P102"
        name = "Core West"
        category = "employee"
        overnight_exempt = true
        location = { lat = 36.9990, lng = -122.0630 }
        boundary = [
            { lat = 36.9992, lng = -122.0633 },
            { lat = 36.9992, lng = -122.0627 },
            { lat = 36.9988, lng = -122.0627 },
        ]

        [[routes]]
        name = "Loop"
        color = "#1f77b4"

        [[routes.sub_schedules]]
        label = "Daytime"
        days_of_week = [1, 2, 3, 4, 5]
        stops = [{ name = "Depot", offset_minutes = 0 }, { name = "Library", offset_minutes = 12 }]
        departures = ["7:00 AM", "7:30 AM", "8:00 AM"]
    "##;

    #[test]
    fn test_parse_sample_catalog() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        assert_eq!(catalog.lots.len(), 2);
        assert_eq!(catalog.lot("P102").unwrap().category, LotCategory::Employee);
        assert!(catalog.lot("P102").unwrap().overnight_exempt);
        assert!(!catalog.lot("P101").unwrap().overnight_exempt);
        assert_eq!(catalog.route("loop").unwrap().sub_schedules.len(), 1);
        assert!(catalog.lot("P999").is_none());
    }

    #[test]
    fn test_malformed_departure_is_rejected() {
        let text = SAMPLE.replace("\"8:00 AM\"", "\"8 o'clock\"");
        let err = Catalog::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, CatalogError::ParseError(_)));
        assert!(err.to_string().contains("8 o'clock"));
    }

    #[test]
    fn test_invalid_coordinate_is_rejected() {
        let text = SAMPLE.replace("lat = 36.9912", "lat = 136.9912");
        assert!(matches!(
            Catalog::from_toml_str(&text),
            Err(CatalogError::ParseError(_))
        ));
    }

    #[test]
    fn test_duplicate_lot_id() {
        let text = SAMPLE.replace("id = \"P102\"", "id = \"P101\"");
        assert!(matches!(
            Catalog::from_toml_str(&text),
            Err(CatalogError::DuplicateLotId(id)) if id == "P101"
        ));
    }

    #[test]
    fn test_short_boundary() {
        let mut catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        catalog.lots[0].boundary.truncate(2);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidBoundary { points: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_day() {
        let text = SAMPLE.replace("[1, 2, 3, 4, 5]", "[1, 7]");
        assert!(matches!(
            Catalog::from_toml_str(&text),
            Err(CatalogError::InvalidDay { day: 7, .. })
        ));
    }

    #[test]
    fn test_decreasing_stop_offsets() {
        let text = SAMPLE.replace("offset_minutes = 12", "offset_minutes = 0 }, { name = \"Gym\", offset_minutes = 0 }, { name = \"Pool\", offset_minutes = 0");
        assert!(Catalog::from_toml_str(&text).is_ok());

        let mut catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        catalog.routes[0].sub_schedules[0].stops[0].offset_minutes = 20;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DecreasingStopOffset { stop, .. }) if stop == "Library"
        ));
    }

    fn with_departures(departures: &str) -> CatalogResult<Catalog> {
        Catalog::from_toml_str(&SAMPLE.replace(
            "departures = [\"7:00 AM\", \"7:30 AM\", \"8:00 AM\"]",
            &format!("departures = [{departures}]"),
        ))
    }

    #[test]
    fn test_out_of_order_departures_are_rejected() {
        let err = with_departures(r#""8:00 AM", "7:00 AM", "9:00 AM""#).unwrap_err();
        assert!(matches!(
            &err,
            CatalogError::UnorderedDepartures { departure, .. } if departure == "9:00 AM"
        ));
        assert!(err.to_string().contains("Loop"));
    }

    #[test]
    fn test_two_descents_are_rejected() {
        assert!(matches!(
            with_departures(r#""10:00 PM", "11:00 PM", "12:30 AM", "11:30 PM", "12:45 AM""#),
            Err(CatalogError::UnorderedDepartures { departure, .. }) if departure == "11:30 PM"
        ));
    }

    #[test]
    fn test_repeated_departure_is_rejected() {
        assert!(matches!(
            with_departures(r#""7:00 AM", "7:00 AM""#),
            Err(CatalogError::UnorderedDepartures { departure, .. }) if departure == "7:00 AM"
        ));
    }

    #[test]
    fn test_single_midnight_wrap_is_accepted() {
        let catalog = with_departures(r#""8:00 PM", "11:00 PM", "12:15 AM", "1:00 AM""#).unwrap();
        assert!(catalog.routes[0].sub_schedules[0].wraps_midnight());
        assert!(with_departures(r#""9:00 AM""#).is_ok());
    }

    #[test]
    fn test_departure_wrapping_back_past_first_is_rejected() {
        assert!(matches!(
            with_departures(r#""8:00 PM", "11:00 PM", "9:00 PM""#),
            Err(CatalogError::UnorderedDepartures { departure, .. }) if departure == "9:00 PM"
        ));
        assert!(matches!(
            with_departures(r#""8:00 PM", "11:00 PM", "12:30 AM", "8:30 PM""#),
            Err(CatalogError::UnorderedDepartures { departure, .. }) if departure == "8:30 PM"
        ));
    }

    #[test]
    fn test_empty_departures_are_valid() {
        let text = SAMPLE.replace(
            "departures = [\"7:00 AM\", \"7:30 AM\", \"8:00 AM\"]",
            "departures = []",
        );
        let catalog = Catalog::from_toml_str(&text).unwrap();
        assert!(catalog.routes[0].sub_schedules[0].departures.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.routes.len(), 1);
    }

    #[test]
    fn test_demo_catalog_is_valid() {
        let catalog = Catalog::from_toml_str(include_str!("../../../demos/catalog.toml")).unwrap();
        assert_eq!(catalog.lots.len(), 5);
        assert!(catalog.route("night owl").unwrap().sub_schedules[0].wraps_midnight());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Catalog::load("/definitely/not/here.toml"),
            Err(CatalogError::ReadError { .. })
        ));
    }
}
