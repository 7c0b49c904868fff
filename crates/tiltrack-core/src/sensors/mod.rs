//! Sensor adapters and the platform sensor traits
//!
//! Each feature consumes exactly one [`SensorFeed`]. The platform pushes raw
//! readings into the feed through an adapter ([`AccelerometerAdapter`],
//! [`LocationAdapter`]) and the state holder drains it. A feed holds at most
//! one pending event: a new reading overwrites any reading the holder has not
//! consumed yet, so late values are superseded instead of queued.

mod accelerometer;
mod location;

pub use accelerometer::*;
pub use location::*;

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, warn};
use thiserror_no_std::Error;

/// Errors reported by a platform sensor or location source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The sensor stream reported a failure after registration
    #[error("Sensor stream failed: {0}")]
    Stream(heapless::String<64>),
    /// Registering for updates with the platform failed
    #[error("Sensor registration failed: {0}")]
    Registration(heapless::String<64>),
}

/// An event delivered through a [`SensorFeed`]
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent<T> {
    /// A fresh reading
    Reading(T),
    /// The source does not exist on this device; sent at most once
    Unavailable,
    /// The source reported an error; the feed keeps running
    Failed(SourceError),
}

/// Single-slot conflating feed between a platform sensor and a state holder.
///
/// Backed by an embassy [`Signal`], so publishing never blocks and never
/// queues: the holder only ever sees the most recent event.
pub struct SensorFeed<T> {
    slot: Signal<CriticalSectionRawMutex, SourceEvent<T>>,
    closed: AtomicBool,
}

impl<T> Default for SensorFeed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SensorFeed<T> {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Publish a reading, replacing any reading not yet consumed.
    ///
    /// Readings published after [`mark_unavailable`](Self::mark_unavailable)
    /// are dropped.
    pub fn publish(&self, reading: T) {
        if self.is_closed() {
            debug!("Dropping reading from unavailable source");
            return;
        }
        self.slot.signal(SourceEvent::Reading(reading));
    }

    /// Report a stream error to the consuming holder.
    pub fn fail(&self, error: SourceError) {
        if self.is_closed() {
            return;
        }
        warn!("Sensor source reported an error: {}", error);
        self.slot.signal(SourceEvent::Failed(error));
    }

    /// Signal that the source does not exist. Only the first call has an
    /// effect; the feed is closed for readings afterwards.
    pub fn mark_unavailable(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        warn!("Sensor source unavailable");
        self.slot.signal(SourceEvent::Unavailable);
    }

    /// Close the feed without delivering anything. Used when the consumer
    /// already knows the source is missing.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.slot.reset();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether an event is waiting to be consumed
    pub fn has_pending(&self) -> bool {
        self.slot.signaled()
    }

    /// Take the pending event, if any, without waiting.
    pub fn try_next(&self) -> Option<SourceEvent<T>> {
        self.slot.try_take()
    }

    /// Wait for the next event.
    pub async fn next(&self) -> SourceEvent<T> {
        self.slot.wait().await
    }
}

/// Platform accelerometer registration.
///
/// The readings themselves are pushed through an [`AccelerometerAdapter`];
/// this trait only controls whether the platform delivers them.
pub trait MotionSensor {
    /// Whether the device has an accelerometer at all
    fn is_available(&self) -> bool;

    /// Register for accelerometer updates at the platform's UI rate
    fn start_listening(&mut self) -> Result<(), SourceError>;

    /// Unregister from accelerometer updates
    fn stop_listening(&mut self);
}

/// Platform location updates.
pub trait LocationProvider {
    /// Begin delivering fixes according to `request`
    fn request_updates(&mut self, request: &LocationRequest) -> Result<(), SourceError>;

    /// Stop delivering fixes
    fn remove_updates(&mut self);
}

/// Location permissions a platform may grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPermission {
    Fine,
    Coarse,
}

/// Synchronous permission check. The core never runs the request flow itself;
/// it only asks whether a permission is currently held.
pub trait LocationPermissions {
    fn has(&self, permission: LocationPermission) -> bool;

    /// Tracking requires both fine and coarse location.
    fn location_granted(&self) -> bool {
        self.has(LocationPermission::Fine) && self.has(LocationPermission::Coarse)
    }
}
