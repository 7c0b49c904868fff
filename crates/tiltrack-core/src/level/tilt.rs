//! Tilt angle computation and level detection
//!
//! Each axis is measured independently against the gravity vector. This is
//! not a full Euler decomposition; a bubble level only needs the per-axis
//! angle.

use libm::{atan2, fabsf, sqrt};

/// Both axes must be strictly inside this many degrees for the device to be level.
pub const LEVEL_THRESHOLD_DEG: f32 = 1.0;

/// A raw 3-axis acceleration reading in device frame.
///
/// Any consistent unit works (m/s², g, raw counts); only the ratios matter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Acceleration {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Tilt of the X and Y axes in degrees, each in (-90, 90).
pub fn tilt_angles(accel: Acceleration) -> (f32, f32) {
    let x = accel.x as f64;
    let y = accel.y as f64;
    let z = accel.z as f64;

    let x_tilt = atan2(x, sqrt(y * y + z * z)).to_degrees();
    let y_tilt = atan2(y, sqrt(x * x + z * z)).to_degrees();

    (x_tilt as f32, y_tilt as f32)
}

/// Authoritative level check used for the `is_level` flag and feedback.
pub fn is_level(x_tilt_deg: f32, y_tilt_deg: f32) -> bool {
    fabsf(x_tilt_deg) < LEVEL_THRESHOLD_DEG && fabsf(y_tilt_deg) < LEVEL_THRESHOLD_DEG
}

/// One processed accelerometer reading.
///
/// Replaced wholesale on every reading; nothing keeps older samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltSample {
    pub x_tilt_deg: f32,
    pub y_tilt_deg: f32,
    pub is_level: bool,
    pub sensor_available: bool,
}

impl TiltSample {
    pub fn from_acceleration(accel: Acceleration) -> Self {
        let (x_tilt_deg, y_tilt_deg) = tilt_angles(accel);
        Self {
            x_tilt_deg,
            y_tilt_deg,
            is_level: is_level(x_tilt_deg, y_tilt_deg),
            sensor_available: true,
        }
    }

    /// Sentinel emitted once when the device has no accelerometer.
    pub const fn unavailable() -> Self {
        Self {
            x_tilt_deg: 0.0,
            y_tilt_deg: 0.0,
            is_level: false,
            sensor_available: false,
        }
    }
}
