//! Geospatial distance primitives.
//!
//! Point-to-point distances use the haversine formula on a spherical Earth.
//! Point-to-segment distances use a local equirectangular projection, which is
//! accurate to well under a meter at campus scale (a few kilometers).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{LotwatchError, Result};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const METERS_PER_KM: f64 = 1000.0;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "RawPoint")]
#[schema(example = json!({"lat": 36.9914, "lng": -122.0609}))]
pub struct GeoPoint {
    /// Latitude in degrees, `-90..=90`.
    #[schema(example = 36.9914)]
    pub lat: f64,

    /// Longitude in degrees, `-180..=180`.
    #[schema(example = -122.0609)]
    pub lng: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = LotwatchError;

    fn try_from(raw: RawPoint) -> Result<Self> {
        Self::new(raw.lat, raw.lng)
    }
}

impl GeoPoint {
    /// Create a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`LotwatchError::InvalidCoordinate`] for non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng)
        {
            Ok(Self { lat, lng })
        } else {
            Err(LotwatchError::InvalidCoordinate { lat, lng })
        }
    }
}

/// Great-circle distance between two points, in kilometers.
#[must_use]
pub fn point_distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let dlat = (p2.lat - p1.lat).to_radians();
    let dlng = (p2.lng - p1.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Distance from `point` to the segment `[a, b]`, in meters.
#[must_use]
pub fn segment_distance(point: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return point_distance(point, a) * METERS_PER_KM;
    }

    let meters_per_degree = EARTH_RADIUS_KM * METERS_PER_KM * std::f64::consts::PI / 180.0;
    let lng_scale = point.lat.to_radians().cos();
    let project = |p: GeoPoint| {
        (
            (p.lng - a.lng) * lng_scale * meters_per_degree,
            (p.lat - a.lat) * meters_per_degree,
        )
    };

    let (bx, by) = project(b);
    let (px, py) = project(point);
    let length_sq = bx.mul_add(bx, by * by);
    if length_sq == 0.0 {
        return point_distance(point, a) * METERS_PER_KM;
    }

    let t = (px.mul_add(bx, py * by) / length_sq).clamp(0.0, 1.0);
    let dx = t.mul_add(-bx, px);
    let dy = t.mul_add(-by, py);
    dx.hypot(dy)
}

/// Minimum distance from `point` to any segment of `polyline`, in meters.
///
/// Returns `f64::INFINITY` for polylines with fewer than two points; callers
/// that care must check the length first.
#[must_use]
pub fn polyline_distance(point: GeoPoint, polyline: &[GeoPoint]) -> f64 {
    polyline
        .windows(2)
        .map(|pair| segment_distance(point, pair[0], pair[1]))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_rejects_invalid_coordinates() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat": 37.0, "lng": -122.0}"#).unwrap();
        assert_eq!(ok, pt(37.0, -122.0));
        assert!(serde_json::from_str::<GeoPoint>(r#"{"lat": 137.0, "lng": 0.0}"#).is_err());
    }

    #[test]
    fn test_point_distance_identity() {
        let p = pt(36.9914, -122.0609);
        assert!(point_distance(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn test_point_distance_one_degree_latitude() {
        let d = point_distance(pt(0.0, 0.0), pt(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_point_distance_is_symmetric() {
        let a = pt(36.99, -122.06);
        let b = pt(37.00, -122.05);
        assert!((point_distance(a, b) - point_distance(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_polyline_distance_identity() {
        let p = pt(36.9914, -122.0609);
        assert!(polyline_distance(p, &[p, p]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_polyline_needs_two_points() {
        let p = pt(36.99, -122.06);
        assert!(polyline_distance(p, &[]).is_infinite());
        assert!(polyline_distance(p, &[p]).is_infinite());
    }

    #[test]
    fn test_segment_distance_perpendicular() {
        // Segment along the equator; point 0.001 degrees north of its middle.
        let d = segment_distance(pt(0.001, 0.0005), pt(0.0, 0.0), pt(0.0, 0.001));
        assert!((d - 111.195).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_segment_distance_clamps_to_endpoint() {
        let a = pt(0.0, 0.0);
        let b = pt(0.0, 0.001);
        let beyond = pt(0.0, 0.002);
        let d = segment_distance(beyond, a, b);
        let to_b = point_distance(beyond, b) * 1000.0;
        assert!((d - to_b).abs() < 0.1, "got {d}, expected {to_b}");
    }

    #[test]
    fn test_polyline_distance_takes_minimum() {
        let line = [pt(0.0, 0.0), pt(0.0, 0.01), pt(0.01, 0.01)];
        let near_second_leg = pt(0.005, 0.0101);
        let d = polyline_distance(near_second_leg, &line);
        assert!(d < 15.0, "got {d}");
    }
}
