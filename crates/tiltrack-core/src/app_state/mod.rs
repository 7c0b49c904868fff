//! Presentation state for the level and tracking screens
//!
//! Each screen has one state holder that owns its state record, drains one
//! [`SensorFeed`](crate::sensors::SensorFeed) and exposes the user-facing
//! entry points. Holders take `&mut self` for every transition, so one holder
//! never interleaves two updates. When a holder must be reached from more than
//! one task, wrap it in the [`SharedLevelHolder`] / [`SharedTrackingHolder`]
//! aliases.

mod level_state;
mod tracking_state;

pub use level_state::*;
pub use tracking_state::*;

use core::cell::RefCell;
use core::fmt::Write;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;
use thiserror_no_std::Error;

use crate::feedback::FeedbackError;
use crate::sensors::SourceError;

/// Monotonic time source for rate limiting.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Everything that can go wrong in a feature.
///
/// None of these reach the renderer as errors: they either become a state
/// field (`sensor_available`, `permission_granted`, `error_message`) or a log
/// record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("Sensor not available")]
    SensorUnavailable,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Feedback failed: {0}")]
    FeedbackActionFailure(FeedbackError),
    #[error("{0}")]
    UpstreamStreamError(SourceError),
}

impl From<FeedbackError> for Fault {
    fn from(error: FeedbackError) -> Self {
        Self::FeedbackActionFailure(error)
    }
}

impl From<SourceError> for Fault {
    fn from(error: SourceError) -> Self {
        Self::UpstreamStreamError(error)
    }
}

impl Fault {
    /// Message for the state's `error_message` field, truncated to fit.
    pub fn message(&self) -> heapless::String<64> {
        let mut message = TruncatingString::default();
        let _ = write!(message, "{}", self);
        message.0
    }
}

/// Build a bounded string from a longer value, dropping what does not fit.
pub trait FromTruncated<T> {
    fn from_truncated(value: T) -> Self;
}

impl<'a, const N: usize> FromTruncated<&'a str> for heapless::String<N> {
    fn from_truncated(value: &'a str) -> Self {
        let mut out = TruncatingString::<N>::default();
        let _ = out.write_str(value);
        out.0
    }
}

#[derive(Default)]
struct TruncatingString<const N: usize>(heapless::String<N>);

impl<const N: usize> Write for TruncatingString<N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Level holder shared between tasks
pub type SharedLevelHolder<'a, S, H, A, K> =
    Mutex<CriticalSectionRawMutex, RefCell<LevelStateHolder<'a, S, H, A, K>>>;

/// Tracking holder shared between tasks
pub type SharedTrackingHolder<'a, P, G> =
    Mutex<CriticalSectionRawMutex, RefCell<TrackingStateHolder<'a, P, G>>>;
