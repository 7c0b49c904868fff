//! Tunable parameters for both screens
//!
//! The platform layer owns the configuration and hands it over as a postcard
//! blob; everything has a sensible [`Default`].

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::feedback::FeedbackTrigger;
use crate::feedback::trigger::{SOUND_RATE_LIMIT, VIBRATION_RATE_LIMIT};
use crate::level::{DEFAULT_BUBBLE_SCALE_DEG, LEVEL_THRESHOLD_DEG, NEARLY_LEVEL_THRESHOLD_DEG};
use crate::sensors::LocationRequest;

/// Length of the level-reached vibration
pub const DEFAULT_HAPTIC_PULSE_MS: u64 = 100;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to encode config")]
    Encode,
    #[error("Failed to decode config")]
    Decode,
    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct CoreConfig {
    pub level: LevelConfig,
    pub tracking: TrackingConfig,
}

impl CoreConfig {
    /// Serialize into `buf`, returning the used prefix.
    pub fn to_bytes<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Encode)
    }

    /// Deserialize and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Decode)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level.validate()?;
        self.tracking.validate()
    }
}

/// Bubble level parameters.
///
/// The authoritative level threshold is fixed at
/// [`LEVEL_THRESHOLD_DEG`](crate::level::LEVEL_THRESHOLD_DEG) and is not part
/// of the configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LevelConfig {
    /// Presentation-only "almost level" threshold in degrees
    pub nearly_level_deg: f32,
    /// Tilt that moves the bubble to the rim
    pub bubble_scale_deg: f32,
    pub haptic_pulse_ms: u64,
    pub vibration_rate_limit_ms: u64,
    pub sound_rate_limit_ms: u64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            nearly_level_deg: NEARLY_LEVEL_THRESHOLD_DEG,
            bubble_scale_deg: DEFAULT_BUBBLE_SCALE_DEG,
            haptic_pulse_ms: DEFAULT_HAPTIC_PULSE_MS,
            vibration_rate_limit_ms: VIBRATION_RATE_LIMIT.as_millis(),
            sound_rate_limit_ms: SOUND_RATE_LIMIT.as_millis(),
        }
    }
}

impl LevelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.nearly_level_deg.is_finite() || self.nearly_level_deg < LEVEL_THRESHOLD_DEG {
            return Err(ConfigError::Invalid(
                "nearly-level threshold below level threshold",
            ));
        }
        if !self.bubble_scale_deg.is_finite() || self.bubble_scale_deg <= 0.0 {
            return Err(ConfigError::Invalid("bubble scale must be positive"));
        }
        if self.haptic_pulse_ms == 0 {
            return Err(ConfigError::Invalid("haptic pulse must be non-zero"));
        }
        Ok(())
    }

    pub fn haptic_pulse(&self) -> Duration {
        Duration::from_millis(self.haptic_pulse_ms)
    }

    /// Fresh trigger with this configuration's rate limits
    pub fn feedback_trigger(&self) -> FeedbackTrigger {
        FeedbackTrigger::new(
            Duration::from_millis(self.vibration_rate_limit_ms),
            Duration::from_millis(self.sound_rate_limit_ms),
        )
    }
}

/// Distance tracker parameters
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingConfig {
    pub location_request: LocationRequest,
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location_request.interval_ms == 0 {
            return Err(ConfigError::Invalid("location interval must be non-zero"));
        }
        Ok(())
    }
}
