//! Live transit snapshot boundary.
//!
//! The host polls an external vehicle-tracking service and hands the raw JSON
//! over as-is. Everything is validated here and converted into typed records;
//! malformed entries are dropped and counted, never passed on with `NaN`
//! coordinates or empty identifiers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::error::{LotwatchError, Result};
use crate::geo::{point_distance, polyline_distance, GeoPoint};
use crate::schedule::RouteSchedule;

/// Default distance within which a stop counts as lying on a route shape.
pub const DEFAULT_STOP_MATCH_RADIUS_M: f64 = 30.0;

/// Errors from decoding an encoded shape string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// A segment was not a `lat,lng` pair of numbers.
    #[error("segment {index} ('{segment}') is not a 'lat,lng' pair of numbers")]
    MalformedPair {
        /// Zero-based segment index.
        index: usize,
        /// The offending segment.
        segment: String,
    },

    /// A pair parsed but is not a valid coordinate.
    #[error("segment {index} ('{segment}') is not a valid coordinate")]
    InvalidCoordinate {
        /// Zero-based segment index.
        index: usize,
        /// The offending segment.
        segment: String,
    },
}

/// Decode a `;`-delimited list of `lat,lng` pairs.
///
/// A single trailing `;` is allowed.
///
/// # Errors
///
/// Returns a [`ShapeError`] naming the first unusable segment.
pub fn decode_encoded_points(encoded: &str) -> std::result::Result<Vec<GeoPoint>, ShapeError> {
    let mut segments: Vec<&str> = encoded.split(';').collect();
    if segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }

    segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| {
            let malformed = || ShapeError::MalformedPair {
                index,
                segment: segment.to_string(),
            };
            let mut parts = segment.split(',');
            let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(malformed());
            };
            let lat: f64 = lat.trim().parse().map_err(|_| malformed())?;
            let lng: f64 = lng.trim().parse().map_err(|_| malformed())?;
            GeoPoint::new(lat, lng).map_err(|_| ShapeError::InvalidCoordinate {
                index,
                segment: segment.to_string(),
            })
        })
        .collect()
}

/// A vehicle position report.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Vehicle identifier.
    pub id: String,
    /// Route the vehicle reports serving.
    pub route_id: String,
    /// Current position.
    pub position: GeoPoint,
    /// Speed as reported, if any.
    pub speed: Option<f64>,
    /// Heading in degrees, if reported.
    pub heading: Option<f64>,
}

/// A route as described by the live service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRoute {
    /// Route identifier.
    pub id: String,
    /// Display color, if any.
    pub color: Option<String>,
    /// Names the service uses for this route.
    pub names: Vec<String>,
}

/// A stop as described by the live service.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStop {
    /// Stop identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Stop position.
    pub position: GeoPoint,
}

/// A decoded route shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Shape identifier.
    pub id: String,
    /// Polyline points.
    pub points: Vec<GeoPoint>,
}

/// How many raw entries were rejected per record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DropReport {
    /// Rejected vehicles.
    pub vehicles: usize,
    /// Rejected routes.
    pub routes: usize,
    /// Rejected stops.
    pub stops: usize,
    /// Rejected shapes.
    pub shapes: usize,
}

impl DropReport {
    /// Total rejected entries.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.vehicles + self.routes + self.stops + self.shapes
    }
}

/// A validated live snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveSnapshot {
    /// Vehicle reports.
    pub vehicles: Vec<Vehicle>,
    /// Routes.
    pub routes: Vec<LiveRoute>,
    /// Stops.
    pub stops: Vec<LiveStop>,
    /// Route shapes.
    pub shapes: Vec<Shape>,
}

impl LiveSnapshot {
    /// Validate a raw snapshot `{vehicles, routes, stops, shapes}`.
    ///
    /// Missing collections are treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`LotwatchError::MalformedSnapshot`] if the snapshot or one of its
    /// collections has the wrong JSON type. Individual bad entries are dropped, not
    /// reported as errors.
    pub fn from_json(raw: &Value) -> Result<(Self, DropReport)> {
        let obj = raw
            .as_object()
            .ok_or_else(|| LotwatchError::MalformedSnapshot("expected a JSON object".into()))?;

        let (vehicles, dropped_vehicles) = convert(obj, "vehicles", parse_vehicle)?;
        let (routes, dropped_routes) = convert(obj, "routes", parse_route)?;
        let (stops, dropped_stops) = convert(obj, "stops", parse_stop)?;
        let (shapes, dropped_shapes) = convert(obj, "shapes", parse_shape)?;

        let report = DropReport {
            vehicles: dropped_vehicles,
            routes: dropped_routes,
            stops: dropped_stops,
            shapes: dropped_shapes,
        };
        debug!(
            vehicles = vehicles.len(),
            routes = routes.len(),
            stops = stops.len(),
            shapes = shapes.len(),
            dropped = report.total(),
            "Validated live snapshot"
        );

        Ok((
            Self {
                vehicles,
                routes,
                stops,
                shapes,
            },
            report,
        ))
    }

    /// Vehicles reporting `route_id`.
    pub fn vehicles_on_route<'a>(&'a self, route_id: &'a str) -> impl Iterator<Item = &'a Vehicle> {
        self.vehicles.iter().filter(move |v| v.route_id == route_id)
    }

    /// Number of live vehicles serving a scheduled route, matched by route name.
    #[must_use]
    pub fn live_vehicle_count(&self, route: &RouteSchedule) -> usize {
        self.routes
            .iter()
            .filter(|r| r.names.iter().any(|name| route.matches_name(name)))
            .map(|r| self.vehicles_on_route(&r.id).count())
            .sum()
    }

    /// Look up a shape by id.
    #[must_use]
    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Stops lying within `radius_m` meters of a shape's polyline.
    ///
    /// Unknown shapes and shapes with fewer than two points match nothing.
    #[must_use]
    pub fn stops_on_shape(&self, shape_id: &str, radius_m: f64) -> Vec<&LiveStop> {
        let Some(shape) = self.shape(shape_id).filter(|s| s.points.len() >= 2) else {
            return Vec::new();
        };
        self.stops
            .iter()
            .filter(|stop| polyline_distance(stop.position, &shape.points) <= radius_m)
            .collect()
    }

    /// Up to `limit` stops nearest to `origin`, with distances in meters.
    #[must_use]
    pub fn nearest_stops(&self, origin: GeoPoint, limit: usize) -> Vec<(&LiveStop, f64)> {
        let mut stops: Vec<(&LiveStop, f64)> = self
            .stops
            .iter()
            .map(|stop| (stop, point_distance(origin, stop.position) * 1000.0))
            .collect();
        stops.sort_by(|a, b| a.1.total_cmp(&b.1));
        stops.truncate(limit);
        stops
    }
}

/// Where the user is, as reported by the host's location sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UserLocation {
    /// No location source.
    #[default]
    Unavailable,
    /// A location request is in flight.
    Pending,
    /// A resolved position.
    Resolved(GeoPoint),
    /// The user refused location access.
    Denied,
}

impl UserLocation {
    /// The resolved position, if any.
    #[must_use]
    pub const fn position(&self) -> Option<GeoPoint> {
        match self {
            Self::Resolved(point) => Some(*point),
            _ => None,
        }
    }

    /// Whether proximity features can run.
    #[must_use]
    pub const fn proximity_enabled(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

// =============================================================================
// RAW RECORD CONVERSION
// =============================================================================

fn convert<T>(
    obj: &Map<String, Value>,
    key: &str,
    parse: fn(&Map<String, Value>) -> std::result::Result<T, String>,
) -> Result<(Vec<T>, usize)> {
    let entries = match obj.get(key) {
        None | Some(Value::Null) => return Ok((Vec::new(), 0)),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(LotwatchError::MalformedSnapshot(format!(
                "'{key}' must be an array"
            )))
        }
    };

    let mut parsed = Vec::with_capacity(entries.len());
    let mut dropped = 0;
    for (index, entry) in entries.iter().enumerate() {
        let result = entry
            .as_object()
            .ok_or_else(|| "not an object".to_string())
            .and_then(parse);
        match result {
            Ok(record) => parsed.push(record),
            Err(reason) => {
                warn!(collection = key, index, %reason, "Dropping malformed live record");
                dropped += 1;
            }
        }
    }
    Ok((parsed, dropped))
}

fn id_field(obj: &Map<String, Value>, keys: &[&str]) -> std::result::Result<String, String> {
    let value = keys
        .iter()
        .find_map(|k| obj.get(*k))
        .ok_or_else(|| format!("missing '{}'", keys[0]))?;
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(format!("'{}' must be a string or number", keys[0])),
    };
    if id.is_empty() {
        return Err(format!("'{}' is empty", keys[0]));
    }
    Ok(id)
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v: &f64| v.is_finite())
}

fn position_fields(obj: &Map<String, Value>) -> std::result::Result<GeoPoint, String> {
    let lat = number_field(obj, "lat").ok_or("missing or non-numeric 'lat'")?;
    let lng = number_field(obj, "lng").ok_or("missing or non-numeric 'lng'")?;
    GeoPoint::new(lat, lng).map_err(|e| e.to_string())
}

fn parse_vehicle(obj: &Map<String, Value>) -> std::result::Result<Vehicle, String> {
    Ok(Vehicle {
        id: id_field(obj, &["id"])?,
        route_id: id_field(obj, &["routeID", "route_id"])?,
        position: position_fields(obj)?,
        speed: number_field(obj, "speed"),
        heading: number_field(obj, "heading"),
    })
}

fn parse_route(obj: &Map<String, Value>) -> std::result::Result<LiveRoute, String> {
    let mut names: Vec<String> = match obj.get("names") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    if let Some(name) = obj.get("name").and_then(Value::as_str) {
        if !name.trim().is_empty() {
            names.push(name.trim().to_string());
        }
    }

    Ok(LiveRoute {
        id: id_field(obj, &["id"])?,
        color: obj
            .get("color")
            .and_then(Value::as_str)
            .map(str::to_string),
        names,
    })
}

fn parse_stop(obj: &Map<String, Value>) -> std::result::Result<LiveStop, String> {
    Ok(LiveStop {
        id: id_field(obj, &["id"])?,
        name: obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        position: position_fields(obj)?,
    })
}

fn parse_shape(obj: &Map<String, Value>) -> std::result::Result<Shape, String> {
    let encoded = obj
        .get("encodedPoints")
        .or_else(|| obj.get("encoded_points"))
        .and_then(Value::as_str)
        .ok_or("missing 'encodedPoints'")?;
    Ok(Shape {
        id: id_field(obj, &["id"])?,
        points: decode_encoded_points(encoded).map_err(|e| e.to_string())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_decode_encoded_points() {
        let points = decode_encoded_points("36.99,-122.06;37.0,-122.05;").unwrap();
        assert_eq!(points, vec![pt(36.99, -122.06), pt(37.0, -122.05)]);
        assert!(decode_encoded_points("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_non_numeric_pair() {
        let err = decode_encoded_points("36.99,-122.06;abc,-122.05").unwrap_err();
        assert_eq!(
            err,
            ShapeError::MalformedPair {
                index: 1,
                segment: "abc,-122.05".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_nan_and_bad_arity() {
        assert!(matches!(
            decode_encoded_points("NaN,1.0"),
            Err(ShapeError::InvalidCoordinate { index: 0, .. })
        ));
        assert!(matches!(
            decode_encoded_points("1.0,2.0,3.0"),
            Err(ShapeError::MalformedPair { index: 0, .. })
        ));
        assert!(matches!(
            decode_encoded_points("1.0,2.0;;3.0,4.0"),
            Err(ShapeError::MalformedPair { index: 1, .. })
        ));
    }

    fn sample_snapshot() -> Value {
        json!({
            "vehicles": [
                {"id": 7, "routeID": "R1", "lat": 36.99, "lng": -122.06, "speed": 12.5},
                {"id": "8", "routeID": "R1", "lat": "36.995", "lng": "-122.055"},
                {"id": "9", "routeID": "R2", "lat": "north", "lng": -122.0},
                {"routeID": "R2", "lat": 36.9, "lng": -122.0}
            ],
            "routes": [
                {"id": "R1", "color": "#ff0000", "names": ["Loop", "Campus Loop"]},
                {"id": "R2", "names": ["Upper Campus"]},
                {"color": "#00ff00"}
            ],
            "stops": [
                {"id": "S1", "name": "Depot", "lat": 36.99, "lng": -122.06},
                {"id": "S2", "name": "Library", "lat": 36.9905, "lng": -122.0595},
                {"id": "S3", "name": "Far Away", "lat": 37.2, "lng": -122.3}
            ],
            "shapes": [
                {"id": "SH1", "encodedPoints": "36.99,-122.06;36.991,-122.059;"},
                {"id": "SH2", "encodedPoints": "36.99,x"}
            ]
        })
    }

    #[test]
    fn test_snapshot_drops_malformed_entries() {
        let (snapshot, report) = LiveSnapshot::from_json(&sample_snapshot()).unwrap();
        assert_eq!(snapshot.vehicles.len(), 2);
        assert_eq!(snapshot.vehicles[0].id, "7");
        assert_eq!(snapshot.vehicles[0].speed, Some(12.5));
        assert_eq!(snapshot.routes.len(), 2);
        assert_eq!(snapshot.stops.len(), 3);
        assert_eq!(snapshot.shapes.len(), 1);
        assert_eq!(
            report,
            DropReport {
                vehicles: 2,
                routes: 1,
                stops: 0,
                shapes: 1
            }
        );
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn test_snapshot_rejects_wrong_types() {
        assert!(matches!(
            LiveSnapshot::from_json(&json!([1, 2])),
            Err(LotwatchError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            LiveSnapshot::from_json(&json!({"vehicles": "none"})),
            Err(LotwatchError::MalformedSnapshot(_))
        ));
        let (empty, report) = LiveSnapshot::from_json(&json!({})).unwrap();
        assert_eq!(empty, LiveSnapshot::default());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_live_vehicle_count_matches_route_names() {
        let (snapshot, _) = LiveSnapshot::from_json(&sample_snapshot()).unwrap();
        let route = RouteSchedule {
            name: "campus loop".to_string(),
            color: String::new(),
            sub_schedules: Vec::new(),
        };
        assert_eq!(snapshot.live_vehicle_count(&route), 2);
        assert_eq!(snapshot.vehicles_on_route("R2").count(), 0);
    }

    #[test]
    fn test_stops_on_shape() {
        let (snapshot, _) = LiveSnapshot::from_json(&sample_snapshot()).unwrap();
        let ids: Vec<&str> = snapshot
            .stops_on_shape("SH1", DEFAULT_STOP_MATCH_RADIUS_M)
            .into_iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["S1", "S2"]);
        assert!(snapshot.stops_on_shape("missing", 30.0).is_empty());
    }

    #[test]
    fn test_nearest_stops() {
        let (snapshot, _) = LiveSnapshot::from_json(&sample_snapshot()).unwrap();
        let nearest = snapshot.nearest_stops(pt(36.9906, -122.0594), 2);
        assert_eq!(nearest.len(), 2);
        assert_eq!(nearest[0].0.id, "S2");
        assert_eq!(nearest[1].0.id, "S1");
    }

    #[test]
    fn test_user_location_states() {
        assert!(!UserLocation::Unavailable.proximity_enabled());
        assert!(!UserLocation::Pending.proximity_enabled());
        assert!(!UserLocation::Denied.proximity_enabled());
        let resolved = UserLocation::Resolved(pt(36.99, -122.06));
        assert!(resolved.proximity_enabled());
        assert_eq!(resolved.position(), Some(pt(36.99, -122.06)));
    }

    #[test]
    fn test_user_location_serde() {
        let loc: UserLocation =
            serde_json::from_value(json!({"state": "resolved", "lat": 36.99, "lng": -122.06}))
                .unwrap();
        assert_eq!(loc.position(), Some(pt(36.99, -122.06)));
        let denied: UserLocation = serde_json::from_value(json!({"state": "denied"})).unwrap();
        assert_eq!(denied, UserLocation::Denied);
    }
}
