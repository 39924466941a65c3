use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance between two coordinates in meters.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for (anti)podal pairs.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Sum of the distances between consecutive points of a route.
pub fn route_distance(route: &[Coordinate]) -> f64 {
    route
        .windows(2)
        .map(|pair| distance_meters(pair[0], pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_are_zero() {
        let a = Coordinate::new(40.4168, -3.7038);
        let d = distance_meters(a, a);
        assert_eq!(d, 0.0);
        assert!(!d.is_nan());
    }

    #[test]
    fn test_distance_is_symmetric() {
        let madrid = Coordinate::new(40.4168, -3.7038);
        let paris = Coordinate::new(48.8566, 2.3522);
        let there = distance_meters(madrid, paris);
        let back = distance_meters(paris, madrid);
        assert!((there - back).abs() < 1e-6);
        // roughly 1053 km
        assert!((there - 1_053_000.0).abs() < 5_000.0);
    }

    #[test]
    fn test_near_identical_points_are_stable() {
        let a = Coordinate::new(10.0, 10.0);
        let b = Coordinate::new(10.0 + 1e-12, 10.0);
        let d = distance_meters(a, b);
        assert!(d.is_finite());
        assert!(d < 1e-3);
    }

    #[test]
    fn test_antipodal_points() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = distance_meters(a, b);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn test_route_distance_sums_segments() {
        let route = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.001, 0.0),
            Coordinate::new(0.002, 0.0),
        ];
        let expected = distance_meters(route[0], route[1]) + distance_meters(route[1], route[2]);
        assert!((route_distance(&route) - expected).abs() < 1e-9);
        assert_eq!(route_distance(&route[..1]), 0.0);
        assert_eq!(route_distance(&[]), 0.0);
    }
}
