use log::warn;
use serde::{Deserialize, Serialize};

use super::{SensorFeed, SourceError};
use crate::tracking::LocationFix;

/// Default interval between location fixes while tracking
pub const DEFAULT_LOCATION_INTERVAL_MS: u32 = 5000;

/// Feed carrying location fixes to the tracking holder
pub type LocationFeed = SensorFeed<LocationFix>;

/// Accuracy/power trade-off requested from the platform
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationPriority {
    #[default]
    HighAccuracy,
    Balanced,
    LowPower,
}

/// How the platform should deliver location fixes
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    /// Desired interval between fixes in milliseconds
    pub interval_ms: u32,
    pub priority: LocationPriority,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_LOCATION_INTERVAL_MS,
            priority: LocationPriority::HighAccuracy,
        }
    }
}

/// Producer side of the location feed.
pub struct LocationAdapter<'a> {
    feed: &'a LocationFeed,
}

impl<'a> LocationAdapter<'a> {
    pub const fn new(feed: &'a LocationFeed) -> Self {
        Self { feed }
    }

    /// Publish a fix from the platform. Fixes with non-finite or out-of-range
    /// coordinates are logged and dropped.
    pub fn on_location(&self, fix: LocationFix) {
        if !fix.is_valid() {
            warn!(
                "Dropping invalid location fix lat={} lon={}",
                fix.latitude, fix.longitude
            );
            return;
        }
        self.feed.publish(fix);
    }

    pub fn on_error(&self, error: SourceError) {
        self.feed.fail(error);
    }
}
