//! Distance tracker screen state

use log::{debug, info, warn};

use super::Fault;
use crate::config::TrackingConfig;
use crate::sensors::{LocationFeed, LocationPermissions, LocationProvider, SourceEvent};
use crate::tracking::{DistanceAccumulator, LocationFix};

/// Everything the tracker screen renders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackingState {
    pub latitude: f64,
    pub longitude: f64,
    pub total_distance_m: f64,
    pub is_tracking: bool,
    pub permission_granted: bool,
    pub error_message: Option<heapless::String<64>>,
}

impl TrackingState {
    pub fn distance_km(&self) -> f64 {
        self.total_distance_m / 1000.0
    }
}

/// User intents forwarded by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingCommand {
    Start,
    Stop,
    Reset,
}

/// Owns the tracker state, the distance accumulator and the location
/// subscription.
///
/// `start`/`stop` only gate whether fixes from the feed are consumed; the
/// accumulator keeps its baseline across a stop, so resuming measures from
/// the last fix seen before stopping.
pub struct TrackingStateHolder<'a, P, G>
where
    P: LocationProvider,
    G: LocationPermissions,
{
    state: TrackingState,
    feed: &'a LocationFeed,
    provider: P,
    permissions: G,
    accumulator: DistanceAccumulator,
    config: TrackingConfig,
    updates_requested: bool,
    torn_down: bool,
}

impl<'a, P, G> TrackingStateHolder<'a, P, G>
where
    P: LocationProvider,
    G: LocationPermissions,
{
    pub fn new(feed: &'a LocationFeed, provider: P, permissions: G, config: TrackingConfig) -> Self {
        let state = TrackingState {
            permission_granted: permissions.location_granted(),
            ..TrackingState::default()
        };

        Self {
            state,
            feed,
            provider,
            permissions,
            accumulator: DistanceAccumulator::new(),
            config,
            updates_requested: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Fix the next delta will be measured from
    pub fn baseline(&self) -> Option<&LocationFix> {
        self.accumulator.previous()
    }

    /// Begin consuming fixes. Requires location permission; without it the
    /// state reports `permission_granted = false` and nothing else changes
    /// besides the coordinates going back to the origin.
    pub fn start(&mut self) {
        if self.torn_down {
            warn!("Ignoring start on a torn down tracker");
            return;
        }
        if self.state.is_tracking {
            return;
        }

        if !self.permissions.location_granted() {
            self.state.permission_granted = false;
            self.state.latitude = 0.0;
            self.state.longitude = 0.0;
            self.report(Fault::PermissionDenied);
            return;
        }
        self.state.permission_granted = true;

        match self.provider.request_updates(&self.config.location_request) {
            Ok(()) => {
                info!(
                    "Location updates started every {}ms",
                    self.config.location_request.interval_ms
                );
                self.updates_requested = true;
                self.state.is_tracking = true;
                self.state.error_message = None;
            }
            Err(e) => self.report(Fault::from(e)),
        }
    }

    /// Stop consuming fixes. Distance and baseline are kept.
    pub fn stop(&mut self) {
        self.release_updates();
        if self.state.is_tracking {
            info!("Tracking stopped at {:.1}m", self.state.total_distance_m);
        }
        self.state.is_tracking = false;
    }

    /// Zero the distance and forget the baseline together.
    ///
    /// The tracking gate is left as it is: while tracking, the next fix
    /// becomes the new baseline.
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.state.total_distance_m = 0.0;
        self.state.latitude = 0.0;
        self.state.longitude = 0.0;
        self.state.error_message = None;
        self.state.permission_granted = self.permissions.location_granted();
        debug!("Distance reset");
    }

    pub fn dispatch(&mut self, command: TrackingCommand) {
        match command {
            TrackingCommand::Start => self.start(),
            TrackingCommand::Stop => self.stop(),
            TrackingCommand::Reset => self.reset(),
        }
    }

    /// Apply the pending feed event, if any. Returns whether an event was
    /// consumed. Does nothing once the holder is torn down.
    pub fn poll(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        match self.feed.try_next() {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Wait for the next feed event and apply it. Returns `false` without
    /// waiting once the holder is torn down.
    pub async fn process_next(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let event = self.feed.next().await;
        self.handle_event(event);
        true
    }

    /// Stop location updates. Later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.release_updates();
        self.state.is_tracking = false;
        info!("Tracking screen torn down");
    }

    fn handle_event(&mut self, event: SourceEvent<LocationFix>) {
        match event {
            SourceEvent::Reading(fix) => self.on_fix(fix),
            SourceEvent::Unavailable => self.report(Fault::SensorUnavailable),
            SourceEvent::Failed(e) => self.report(Fault::from(e)),
        }
    }

    fn on_fix(&mut self, fix: LocationFix) {
        if self.torn_down || !self.state.is_tracking {
            debug!("Ignoring fix while not tracking");
            return;
        }

        if !self.permissions.location_granted() {
            self.release_updates();
            self.state.is_tracking = false;
            self.state.permission_granted = false;
            self.report(Fault::PermissionDenied);
            return;
        }

        let delta = self.accumulator.on_fix(fix);
        self.state.latitude = fix.latitude;
        self.state.longitude = fix.longitude;
        self.state.total_distance_m = self.accumulator.total_m();
        self.state.error_message = None;
        debug!(
            "Fix {:.6}, {:.6} (+{:.1}m, total {:.1}m)",
            fix.latitude, fix.longitude, delta, self.state.total_distance_m
        );
    }

    fn release_updates(&mut self) {
        if self.updates_requested {
            self.provider.remove_updates();
            self.updates_requested = false;
        }
    }

    fn report(&mut self, fault: Fault) {
        match &fault {
            Fault::PermissionDenied => warn!("Location permission not granted"),
            Fault::SensorUnavailable => warn!("Location source not available"),
            Fault::UpstreamStreamError(e) => {
                warn!("Location stream error: {}", e);
                self.state.error_message = Some(fault.message());
            }
            Fault::FeedbackActionFailure(_) => {}
        }
    }
}

impl<P, G> Drop for TrackingStateHolder<'_, P, G>
where
    P: LocationProvider,
    G: LocationPermissions,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use libm::fabs;

    use super::*;
    use crate::app_state::FromTruncated;
    use crate::sensors::{LocationAdapter, LocationPermission, LocationRequest, SourceError};
    use crate::tracking::distance_m;

    #[derive(Default)]
    struct Platform {
        requests: Cell<u32>,
        removals: Cell<u32>,
        last_interval_ms: Cell<u32>,
        fine: Cell<bool>,
        coarse: Cell<bool>,
        fail_request: Cell<bool>,
    }

    impl Platform {
        fn granted() -> Self {
            let p = Self::default();
            p.fine.set(true);
            p.coarse.set(true);
            p
        }
    }

    struct Provider<'p>(&'p Platform);
    impl LocationProvider for Provider<'_> {
        fn request_updates(&mut self, request: &LocationRequest) -> Result<(), SourceError> {
            if self.0.fail_request.get() {
                return Err(SourceError::Registration(heapless::String::from_truncated(
                    "provider disabled",
                )));
            }
            self.0.requests.set(self.0.requests.get() + 1);
            self.0.last_interval_ms.set(request.interval_ms);
            Ok(())
        }
        fn remove_updates(&mut self) {
            self.0.removals.set(self.0.removals.get() + 1);
        }
    }

    struct Grants<'p>(&'p Platform);
    impl LocationPermissions for Grants<'_> {
        fn has(&self, permission: LocationPermission) -> bool {
            match permission {
                LocationPermission::Fine => self.0.fine.get(),
                LocationPermission::Coarse => self.0.coarse.get(),
            }
        }
    }

    type Holder<'a> = TrackingStateHolder<'a, Provider<'a>, Grants<'a>>;

    fn holder<'a>(feed: &'a LocationFeed, p: &'a Platform) -> Holder<'a> {
        TrackingStateHolder::new(feed, Provider(p), Grants(p), TrackingConfig::default())
    }

    const A: LocationFix = LocationFix::new(40.7128, -74.0060);
    const B: LocationFix = LocationFix::new(40.7138, -74.0050);
    const C: LocationFix = LocationFix::new(40.7158, -74.0020);

    fn deliver<P: LocationProvider>(h: &mut TrackingStateHolder<'_, P, Grants<'_>>, feed: &LocationFeed, fix: LocationFix) {
        LocationAdapter::new(feed).on_location(fix);
        assert!(h.poll());
    }

    #[test]
    fn test_initial_state() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let h = holder(&feed, &p);

        assert_eq!(h.state().latitude, 0.0);
        assert_eq!(h.state().total_distance_m, 0.0);
        assert!(!h.state().is_tracking);
        assert!(h.state().permission_granted);
        assert_eq!(p.requests.get(), 0);
    }

    #[test]
    fn test_start_requests_updates_at_configured_interval() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let mut h = holder(&feed, &p);

        h.start();
        h.start();
        assert!(h.state().is_tracking);
        assert_eq!(p.requests.get(), 1);
        assert_eq!(p.last_interval_ms.get(), 5000);
    }

    #[test]
    fn test_distance_accumulates_over_path() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let mut h = holder(&feed, &p);
        h.start();

        deliver(&mut h, &feed, A);
        assert_eq!(h.state().total_distance_m, 0.0);
        deliver(&mut h, &feed, B);
        deliver(&mut h, &feed, C);

        let expected = distance_m(&A, &B) + distance_m(&B, &C);
        assert!(fabs(h.state().total_distance_m - expected) < 1e-9);
        assert_eq!(h.state().latitude, C.latitude);
        assert_eq!(h.state().longitude, C.longitude);
        assert!(fabs(h.state().distance_km() - expected / 1000.0) < 1e-12);
    }

    #[test]
    fn test_start_without_permission() {
        let feed = LocationFeed::new();
        let p = Platform::default();
        p.fine.set(true);
        let mut h = holder(&feed, &p);

        h.start();
        assert!(!h.state().is_tracking);
        assert!(!h.state().permission_granted);
        assert_eq!((h.state().latitude, h.state().longitude), (0.0, 0.0));
        assert_eq!(p.requests.get(), 0);

        // Fixes are not consumed
        deliver(&mut h, &feed, A);
        assert_eq!(h.state().latitude, 0.0);
        assert!(h.baseline().is_none());

        // Granting and starting again recovers
        p.coarse.set(true);
        h.start();
        assert!(h.state().is_tracking);
        assert!(h.state().permission_granted);
    }

    #[test]
    fn test_denied_start_keeps_distance() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let mut h = holder(&feed, &p);
        h.start();
        deliver(&mut h, &feed, A);
        deliver(&mut h, &feed, B);
        h.stop();

        let travelled = h.state().total_distance_m;
        assert!(fabs(travelled - distance_m(&A, &B)) < 1e-9);

        p.coarse.set(false);
        h.start();

        assert!(!h.state().is_tracking);
        assert!(!h.state().permission_granted);
        assert_eq!((h.state().latitude, h.state().longitude), (0.0, 0.0));
        assert_eq!(h.state().total_distance_m, travelled);
        assert_eq!(h.baseline(), Some(&B));
        assert_eq!(p.requests.get(), 1);
    }

    #[test]
    fn test_stop_and_resume_keeps_baseline() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let mut h = holder(&feed, &p);
        h.start();
        deliver(&mut h, &feed, A);
        deliver(&mut h, &feed, B);

        h.stop();
        h.stop();
        assert!(!h.state().is_tracking);
        assert_eq!(p.removals.get(), 1);

        // Ignored while stopped
        deliver(&mut h, &feed, A);
        assert_eq!(h.baseline(), Some(&B));

        h.start();
        deliver(&mut h, &feed, C);
        let expected = distance_m(&A, &B) + distance_m(&B, &C);
        assert!(fabs(h.state().total_distance_m - expected) < 1e-9);
    }

    #[test]
    fn test_reset_clears_distance_and_baseline() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let mut h = holder(&feed, &p);
        h.start();
        deliver(&mut h, &feed, A);
        deliver(&mut h, &feed, B);

        h.dispatch(TrackingCommand::Reset);
        h.dispatch(TrackingCommand::Reset);
        assert_eq!(h.state().total_distance_m, 0.0);
        assert_eq!((h.state().latitude, h.state().longitude), (0.0, 0.0));
        assert!(h.baseline().is_none());
        assert!(h.state().is_tracking);

        deliver(&mut h, &feed, B);
        assert_eq!(h.state().total_distance_m, 0.0);
        deliver(&mut h, &feed, C);
        assert!(fabs(h.state().total_distance_m - distance_m(&B, &C)) < 1e-9);
    }

    #[test]
    fn test_permission_revoked_while_tracking() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let mut h = holder(&feed, &p);
        h.start();
        deliver(&mut h, &feed, A);

        p.fine.set(false);
        deliver(&mut h, &feed, B);

        assert!(!h.state().is_tracking);
        assert!(!h.state().permission_granted);
        assert_eq!(h.state().latitude, A.latitude);
        assert_eq!(p.removals.get(), 1);
    }

    #[test]
    fn test_registration_failure_is_recorded() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        p.fail_request.set(true);
        let mut h = holder(&feed, &p);

        h.start();
        assert!(!h.state().is_tracking);
        assert_eq!(
            h.state().error_message.as_deref(),
            Some("Sensor registration failed: provider disabled")
        );

        p.fail_request.set(false);
        h.start();
        assert!(h.state().is_tracking);
        assert!(h.state().error_message.is_none());
    }

    #[test]
    fn test_stream_error_keeps_tracking() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let mut h = holder(&feed, &p);
        h.start();

        LocationAdapter::new(&feed)
            .on_error(SourceError::Stream(heapless::String::from_truncated("gps lost")));
        h.poll();
        assert!(h.state().is_tracking);
        assert!(h.state().error_message.is_some());

        deliver(&mut h, &feed, A);
        assert!(h.state().error_message.is_none());
    }

    #[test]
    fn test_teardown_removes_updates_once() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        {
            let mut h = holder(&feed, &p);
            h.start();
            h.teardown();
            h.teardown();
        }
        assert_eq!(p.removals.get(), 1);
    }

    #[test]
    fn test_process_next_applies_fix() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let mut h = holder(&feed, &p);
        h.start();

        LocationAdapter::new(&feed).on_location(A);
        assert!(embassy_futures::block_on(h.process_next()));
        assert_eq!(h.baseline(), Some(&A));
    }

    #[derive(Default)]
    struct Subscriptions {
        active: Cell<i32>,
    }

    struct CountingProvider<'s>(&'s Subscriptions);
    impl LocationProvider for CountingProvider<'_> {
        fn request_updates(&mut self, _request: &LocationRequest) -> Result<(), SourceError> {
            self.0.active.set(self.0.active.get() + 1);
            Ok(())
        }
        fn remove_updates(&mut self) {
            self.0.active.set(self.0.active.get() - 1);
        }
    }

    #[test]
    fn test_start_after_teardown_leaves_no_subscription() {
        let feed = LocationFeed::new();
        let p = Platform::granted();
        let subs = Subscriptions::default();
        {
            let mut h = TrackingStateHolder::new(
                &feed,
                CountingProvider(&subs),
                Grants(&p),
                TrackingConfig::default(),
            );
            h.start();
            deliver(&mut h, &feed, A);
            h.teardown();
            assert_eq!(subs.active.get(), 0);

            h.start();
            assert!(!h.state().is_tracking);
            assert_eq!(subs.active.get(), 0);

            // Fixes published after teardown are left alone
            LocationAdapter::new(&feed).on_location(B);
            assert!(!h.poll());
            assert!(!embassy_futures::block_on(h.process_next()));
            assert_eq!(h.baseline(), Some(&A));
        }
        assert_eq!(subs.active.get(), 0);
    }
}
