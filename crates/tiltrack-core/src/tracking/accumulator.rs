use log::debug;

use super::geo::{LocationFix, distance_m};

/// Running path length over a sequence of location fixes.
///
/// Only the previous fix is kept; each new fix adds the great-circle distance
/// from it. The first fix after construction or [`reset`](Self::reset) is the
/// baseline and contributes nothing.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    previous: Option<LocationFix>,
    total_m: f64,
}

impl DistanceAccumulator {
    pub const fn new() -> Self {
        Self {
            previous: None,
            total_m: 0.0,
        }
    }

    /// Consume a fix and return the distance it added in meters.
    pub fn on_fix(&mut self, fix: LocationFix) -> f64 {
        let delta = match self.previous {
            Some(previous) => distance_m(&previous, &fix),
            None => {
                debug!("Baseline fix {}, {}", fix.latitude, fix.longitude);
                0.0
            }
        };

        self.total_m += delta;
        self.previous = Some(fix);
        delta
    }

    /// Drop the baseline and zero the total together.
    pub fn reset(&mut self) {
        self.previous = None;
        self.total_m = 0.0;
    }

    pub fn total_m(&self) -> f64 {
        self.total_m
    }

    pub fn previous(&self) -> Option<&LocationFix> {
        self.previous.as_ref()
    }
}
