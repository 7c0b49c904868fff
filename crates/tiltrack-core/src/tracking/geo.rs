//! Great-circle math on a spherical Earth

use libm::{asin, atan2, cos, sin, sqrt};

/// Mean Earth radius used by the haversine distance
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A single location report from the platform
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocationFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Platform timestamp in milliseconds, when provided
    pub timestamp_ms: Option<u64>,
    /// Horizontal accuracy radius in meters, when provided
    pub accuracy_m: Option<f32>,
}

impl LocationFix {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms: None,
            accuracy_m: None,
        }
    }

    pub const fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub const fn with_accuracy(mut self, accuracy_m: f32) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Finite coordinates within latitude [-90, 90] and longitude [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Haversine distance between two fixes in meters.
pub fn distance_m(from: &LocationFix, to: &LocationFix) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let half_lat = sin(d_lat / 2.0);
    let half_lon = sin(d_lon / 2.0);
    let a = half_lat * half_lat + cos(lat1) * cos(lat2) * half_lon * half_lon;

    // Rounding can push `a` a hair above 1 for antipodal points
    let c = 2.0 * asin(sqrt(a.clamp(0.0, 1.0)));

    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `from` towards `to`, in degrees [0, 360).
pub fn bearing_deg(from: &LocationFix, to: &LocationFix) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let y = sin(d_lon) * cos(lat2);
    let x = cos(lat1) * sin(lat2) - sin(lat1) * cos(lat2) * cos(d_lon);

    let bearing = atan2(y, x).to_degrees();
    (bearing + 360.0) % 360.0
}
