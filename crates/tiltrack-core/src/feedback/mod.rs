//! Level-reached feedback: device traits and the edge-triggered firing logic
//!
//! The devices are fire-and-forget. Their failures come back as
//! [`FeedbackError`] and are logged by the caller; they never reach the UI and
//! never change tilt or level state.

pub mod trigger;

pub use trigger::{ChannelDecision, ChannelState, FeedbackChannel, FeedbackPlan, FeedbackTrigger};

use embassy_time::Duration;
use thiserror_no_std::Error;

/// Errors from the haptic or audio devices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    /// The device has no such actuator
    #[error("Feedback device not present")]
    DeviceMissing,
    /// The audio cue was never loaded or has been released
    #[error("Audio cue not loaded")]
    NotLoaded,
    /// The platform reported a failure
    #[error("Feedback device failed: {0}")]
    Device(heapless::String<64>),
}

/// Vibration motor
pub trait HapticActuator {
    /// Vibrate once for `duration`.
    fn pulse(&mut self, duration: Duration) -> Result<(), FeedbackError>;
}

/// Short audio cue played when the device becomes level.
///
/// The cue is a scoped resource: [`load`](Self::load) once when the level
/// holder is created, [`release`](Self::release) exactly once at teardown.
pub trait AudioCuePlayer {
    fn load(&mut self) -> Result<(), FeedbackError>;

    fn play(&mut self) -> Result<(), FeedbackError>;

    fn release(&mut self);
}
