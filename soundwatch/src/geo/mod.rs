//! Great-circle geometry on a spherical Earth.
//!
//! Provides the two measurements the tracker needs between geographic
//! coordinates: haversine distance and initial bearing. Inputs are degrees
//! and are not range-checked; out-of-range values produce a numeric result
//! rather than an error.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance between two points in meters (haversine).
#[inline]
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing from `a` towards `b` in degrees.
///
/// Returns a value in `[0, 360)`, where 0 = North and 90 = East. Coincident
/// points are not special-cased and yield the formula's result (0).
#[inline]
pub fn bearing(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Fold an angle in degrees into `[0, 360)`.
fn normalize_degrees(deg: f64) -> f64 {
    let normalized = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = GeoPoint::new(50.45, 30.52);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn test_distance_one_degree_longitude_at_equator() {
        let d = distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        // 2πR / 360
        assert!((d - 111_194.93).abs() < 1.0, "got {} m", d);
    }

    #[test]
    fn test_distance_kyiv_to_lviv() {
        // Kyiv (50.4501, 30.5234) to Lviv (49.8397, 24.0297): ~467.5 km
        let d = distance(
            GeoPoint::new(50.4501, 30.5234),
            GeoPoint::new(49.8397, 24.0297),
        );
        assert!((d - 467_530.0).abs() < 1_000.0, "got {} m", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(48.0, 11.0);
        let b = GeoPoint::new(52.5, 13.4);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!((bearing(origin, GeoPoint::new(1.0, 0.0)) - 0.0).abs() < 0.1);
        assert!((bearing(origin, GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 0.1);
        assert!((bearing(origin, GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 0.1);
        assert!((bearing(origin, GeoPoint::new(0.0, -1.0)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn test_bearing_coincident_points() {
        let p = GeoPoint::new(10.0, 10.0);
        assert_eq!(bearing(p, p), 0.0);
    }

    #[test]
    fn test_out_of_range_input_is_numeric() {
        let d = distance(GeoPoint::new(200.0, 0.0), GeoPoint::new(0.0, 0.0));
        assert!(d.is_finite());
        let b = bearing(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 400.0));
        assert!((0.0..360.0).contains(&b));
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(45.0), 45.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_bearing_in_range(
                lat1 in -90.0..90.0_f64,
                lon1 in -180.0..180.0_f64,
                lat2 in -90.0..90.0_f64,
                lon2 in -180.0..180.0_f64,
            ) {
                let b = bearing(GeoPoint::new(lat1, lon1), GeoPoint::new(lat2, lon2));
                prop_assert!((0.0..360.0).contains(&b), "bearing {} out of range", b);
            }

            #[test]
            fn test_distance_bounded_by_half_circumference(
                lat1 in -90.0..90.0_f64,
                lon1 in -180.0..180.0_f64,
                lat2 in -90.0..90.0_f64,
                lon2 in -180.0..180.0_f64,
            ) {
                let d = distance(GeoPoint::new(lat1, lon1), GeoPoint::new(lat2, lon2));
                prop_assert!(d >= 0.0);
                prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1.0);
            }
        }
    }
}
