//! Geographic coordinates and great-circle distance

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius used by [`distance`], in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// `|latitude| <= 90` and `|longitude| <= 180`; NaN and infinities are invalid
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    /// Reject out-of-range coordinates with [`Error::InvalidCoordinates`]
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::InvalidCoordinates(format!(
                "latitude must be between -90 and 90, longitude between -180 and 180 (got {}, {})",
                self.latitude, self.longitude
            )))
        }
    }

    /// Great-circle distance to `other` in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance(*self, *other)
    }
}

/// Haversine distance between two coordinates in meters
///
/// Inputs are expected to be validated by the caller. The result is
/// symmetric and zero for identical points.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let half_dlat = (b.latitude - a.latitude).to_radians() / 2.0;
    let half_dlon = (b.longitude - a.longitude).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
    // Rounding can push h marginally past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn samples() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.05),
            Coordinate::new(51.5074, -0.1278),
            Coordinate::new(48.8566, 2.3522),
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(90.0, 180.0),
            Coordinate::new(-90.0, -180.0),
            Coordinate::new(1.3521, 103.8198),
        ]
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        for c in samples() {
            assert!(distance(c, c).abs() < TOLERANCE, "distance({:?}, itself) != 0", c);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let points = samples();
        for a in &points {
            for b in &points {
                let ab = distance(*a, *b);
                let ba = distance(*b, *a);
                assert!((ab - ba).abs() < TOLERANCE, "{:?} <-> {:?}: {} vs {}", a, b, ab, ba);
            }
        }
    }

    #[test]
    fn test_small_equatorial_offset() {
        // 0.05 degrees of longitude on the equator
        let d = distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.05));
        assert!((d - 5559.49).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_london_to_paris() {
        let london = Coordinate::new(51.5074, -0.1278);
        let paris = Coordinate::new(48.8566, 2.3522);
        let km = london.distance_to(&paris) / 1000.0;
        assert!((km - 343.5).abs() < 1.0, "got {} km", km);
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        let d = distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.0001, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_validate_returns_typed_error() {
        let err = Coordinate::new(100.0, 0.0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinates(_)));
        assert!(Coordinate::new(10.0, 10.0).validate().is_ok());
    }
}
