//! Geographic coordinates and great-circle distance.

use std::fmt;

use serde::Serialize;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Error returned when a latitude/longitude pair is not a usable position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoordinate {
    reason: &'static str,
}

/// A WGS84 position in decimal degrees.
///
/// Both components are finite and inside the valid latitude/longitude range.
///
/// # Examples
///
/// ```
/// use bike_feed::domain::Coordinate;
///
/// let station = Coordinate::new(24.15, 120.68).unwrap();
/// assert_eq!(station.distance_km(&station), 0.0);
///
/// assert!(Coordinate::new(f64::NAN, 120.68).is_err());
/// assert!(Coordinate::new(91.0, 120.68).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(InvalidCoordinate {
                reason: "latitude and longitude must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinate {
                reason: "latitude must be within -90..=90",
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinate {
                reason: "longitude must be within -180..=180",
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to another coordinate in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self, other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Haversine distance between two coordinates, in kilometres.
///
/// The result is symmetric bit-for-bit and exactly zero for identical points.
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    // Absolute deltas keep d(a, b) and d(b, a) on identical float paths.
    let d_lat = (b.latitude - a.latitude).abs().to_radians();
    let d_lng = (b.longitude - a.longitude).abs().to_radians();

    let half_lat = (d_lat / 2.0).sin();
    let half_lng = (d_lng / 2.0).sin();

    let h = half_lat * half_lat
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * half_lng * half_lng;
    // Rounding can push h just past 1 for near-antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Inclusive bounding box a station position must fall inside.
///
/// Upstream feeds occasionally publish `0,0` or swapped coordinates; a
/// record outside the envelope of its city is treated as having no position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl GeoBounds {
    /// Taichung City, including the mountain districts to the east.
    pub const TAICHUNG: GeoBounds = GeoBounds {
        min_latitude: 23.8,
        max_latitude: 24.6,
        min_longitude: 120.3,
        max_longitude: 121.5,
    };

    /// No envelope beyond the valid coordinate range.
    pub const WORLD: GeoBounds = GeoBounds {
        min_latitude: -90.0,
        max_latitude: 90.0,
        min_longitude: -180.0,
        max_longitude: 180.0,
    };

    /// Build a coordinate from raw components if it lies inside the envelope.
    pub fn locate(&self, latitude: f64, longitude: f64) -> Option<Coordinate> {
        let coordinate = Coordinate::new(latitude, longitude).ok()?;
        self.contains(&coordinate).then_some(coordinate)
    }

    /// Whether the coordinate lies inside the envelope (edges included).
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&coordinate.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&coordinate.longitude)
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::TAICHUNG
    }
}
