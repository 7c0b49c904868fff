//! Presentation grading for the bubble level
//!
//! The "nearly level" threshold only drives colors, pulses and the status
//! line. It never changes the authoritative `is_level` flag and never fires
//! feedback.

use libm::fabsf;

use super::tilt::{LEVEL_THRESHOLD_DEG, TiltSample};

/// Default "almost there" threshold in degrees
pub const NEARLY_LEVEL_THRESHOLD_DEG: f32 = 3.0;

/// Tilt in degrees that moves the bubble all the way to the rim
pub const DEFAULT_BUBBLE_SCALE_DEG: f32 = 10.0;

/// How close the device is to level, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelZone {
    /// The authoritative level flag is set
    Level,
    /// Both axes are within the nearly-level threshold
    NearlyLevel,
    /// Anything else
    Tilted,
}

impl LevelZone {
    /// Grade a whole sample for the status line.
    pub fn assess(sample: &TiltSample, nearly_level_deg: f32) -> Self {
        if sample.is_level {
            Self::Level
        } else if fabsf(sample.x_tilt_deg) < nearly_level_deg
            && fabsf(sample.y_tilt_deg) < nearly_level_deg
        {
            Self::NearlyLevel
        } else {
            Self::Tilted
        }
    }

    /// Grade a single axis, used for per-axis readout colors.
    pub fn for_axis(tilt_deg: f32, nearly_level_deg: f32) -> Self {
        let magnitude = fabsf(tilt_deg);
        if magnitude < LEVEL_THRESHOLD_DEG {
            Self::Level
        } else if magnitude < nearly_level_deg {
            Self::NearlyLevel
        } else {
            Self::Tilted
        }
    }

    /// Status line shown under the readout
    pub const fn label(self) -> &'static str {
        match self {
            Self::Level => "Perfect level!",
            Self::NearlyLevel => "Almost level...",
            Self::Tilted => "Adjust device to level the surface",
        }
    }
}

/// Which axis the single-axis bubble shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayAxis {
    X,
    Y,
}

impl DisplayAxis {
    /// Horizontal mode shows the X axis, vertical mode the Y axis.
    pub const fn for_mode(horizontal_mode: bool) -> Self {
        if horizontal_mode { Self::X } else { Self::Y }
    }

    pub const fn tilt_of(self, sample: &TiltSample) -> f32 {
        match self {
            Self::X => sample.x_tilt_deg,
            Self::Y => sample.y_tilt_deg,
        }
    }
}

/// Normalized bubble displacement in [-1, 1] for a tilt angle.
///
/// A non-positive scale pins the bubble to the center.
pub fn bubble_offset(tilt_deg: f32, scale_deg: f32) -> f32 {
    if scale_deg <= 0.0 || !tilt_deg.is_finite() {
        return 0.0;
    }
    (tilt_deg / scale_deg).clamp(-1.0, 1.0)
}
