use log::debug;

use super::{SensorFeed, SourceError};
use crate::level::{Acceleration, TiltSample};

/// Feed carrying tilt samples from the accelerometer to the level holder
pub type TiltFeed = SensorFeed<TiltSample>;

/// Producer side of the accelerometer feed.
///
/// The platform sensor callback owns one of these and calls
/// [`on_acceleration`](Self::on_acceleration) for every raw reading. The tilt
/// angles are computed here so the holder only ever sees finished samples.
pub struct AccelerometerAdapter<'a> {
    feed: &'a TiltFeed,
}

impl<'a> AccelerometerAdapter<'a> {
    pub const fn new(feed: &'a TiltFeed) -> Self {
        Self { feed }
    }

    /// Convert a raw acceleration vector and publish the resulting sample.
    pub fn on_acceleration(&self, accel: Acceleration) {
        let sample = TiltSample::from_acceleration(accel);
        debug!(
            "Tilt x={:.2} y={:.2} level={}",
            sample.x_tilt_deg, sample.y_tilt_deg, sample.is_level
        );
        self.feed.publish(sample);
    }

    /// The platform has no accelerometer.
    pub fn on_unavailable(&self) {
        self.feed.mark_unavailable();
    }

    pub fn on_error(&self, error: SourceError) {
        self.feed.fail(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SourceEvent;

    #[test]
    fn test_adapter_publishes_computed_sample() {
        let feed = TiltFeed::new();
        let adapter = AccelerometerAdapter::new(&feed);

        adapter.on_acceleration(Acceleration::new(0.0, 0.0, 9.8));

        match feed.try_next() {
            Some(SourceEvent::Reading(sample)) => {
                assert!(sample.is_level);
                assert!(sample.sensor_available);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_adapter_drops_readings_after_unavailable() {
        let feed = TiltFeed::new();
        let adapter = AccelerometerAdapter::new(&feed);

        adapter.on_unavailable();
        adapter.on_acceleration(Acceleration::new(0.0, 0.0, 9.8));

        assert_eq!(feed.try_next(), Some(SourceEvent::Unavailable));
        assert_eq!(feed.try_next(), None);
    }
}
