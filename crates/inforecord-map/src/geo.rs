//! Geographic and screen coordinates.

use inforecord_core::MapError;
use serde::Serialize;

/// Mean earth radius in meters (IUGG)
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A validated latitude/longitude pair.
///
/// `PartialEq` is exact value identity. Whether two clicks hit "the same
/// spot" is answered by [`GeoPoint::is_near`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Build a point, rejecting NaN/infinite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, MapError> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);

        if valid {
            Ok(Self { lat, lng })
        } else {
            Err(MapError::InvalidPoint { lat, lng })
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// True when `other` is within `epsilon_m` meters of this point.
    pub fn is_near(&self, other: &GeoPoint, epsilon_m: f64) -> bool {
        self.distance_m(other) <= epsilon_m
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Pixel position inside the map viewport, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nan_and_out_of_range() {
        assert!(matches!(
            GeoPoint::new(f64::NAN, 126.0),
            Err(MapError::InvalidPoint { .. })
        ));
        assert!(GeoPoint::new(37.0, f64::INFINITY).is_err());
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn distance_is_zero_for_same_point() {
        let p = GeoPoint::new(37.30, 126.84).unwrap();
        assert_eq!(p.distance_m(&p), 0.0);
        assert!(p.is_near(&p, 0.0));
    }

    #[test]
    fn one_thousandth_degree_latitude_is_about_111m() {
        let a = GeoPoint::new(37.300, 126.84).unwrap();
        let b = GeoPoint::new(37.301, 126.84).unwrap();
        let d = a.distance_m(&b);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn is_near_respects_epsilon() {
        let a = GeoPoint::new(33.450701, 126.570667).unwrap();
        let b = GeoPoint::new(33.450741, 126.570667).unwrap(); // ~4.4m north
        assert!(a.is_near(&b, 10.0));
        assert!(b.is_near(&a, 10.0));
        assert!(!a.is_near(&b, 1.0));
    }
}
