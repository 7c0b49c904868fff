//! Bubble-level domain logic

pub mod tilt;
pub mod zone;

pub use tilt::{Acceleration, LEVEL_THRESHOLD_DEG, TiltSample, is_level, tilt_angles};
pub use zone::{
    DEFAULT_BUBBLE_SCALE_DEG, DisplayAxis, LevelZone, NEARLY_LEVEL_THRESHOLD_DEG, bubble_offset,
};
