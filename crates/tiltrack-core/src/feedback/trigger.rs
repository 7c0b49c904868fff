//! Debounced level-entry trigger
//!
//! Each feedback channel is a two-state machine driven by the stream of level
//! flags:
//!
//! ```text
//!            level = true (fire unless rate-limited or disabled)
//!   Armed  ----------------------------------------------------->  Fired
//!     ^                                                              |
//!     +--------------------------- level = false -------------------+
//! ```
//!
//! A channel fires at most once per level period. The rate limit is measured
//! from the last time the action actually ran, so a suppressed or failed
//! attempt does not push the window forward.

use embassy_time::{Duration, Instant};

/// Minimum spacing between two vibrations
pub const VIBRATION_RATE_LIMIT: Duration = Duration::from_millis(500);

/// Minimum spacing between two level sounds
pub const SOUND_RATE_LIMIT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Waiting for the next level entry
    Armed,
    /// Already handled this level period
    Fired,
}

/// What a channel wants done for the current sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDecision {
    /// Nothing to do
    Idle,
    /// Run the action now, then report success via `record_fired`
    Fire,
    /// Level entry inside the rate-limit window; treated as handled
    RateLimited,
    /// Level entry while the channel is switched off; treated as handled
    Disabled,
}

/// One feedback channel (vibration or sound).
#[derive(Debug, Clone)]
pub struct FeedbackChannel {
    state: ChannelState,
    last_fired: Option<Instant>,
    rate_limit: Duration,
}

impl FeedbackChannel {
    pub const fn new(rate_limit: Duration) -> Self {
        Self {
            state: ChannelState::Armed,
            last_fired: None,
            rate_limit,
        }
    }

    /// Feed one level flag through the channel.
    ///
    /// `enabled` gates the action only; a disabled channel still moves to
    /// [`ChannelState::Fired`] so re-enabling mid-period does not produce a
    /// late cue.
    pub fn on_level(&mut self, is_level: bool, enabled: bool, now: Instant) -> ChannelDecision {
        if !is_level {
            self.state = ChannelState::Armed;
            return ChannelDecision::Idle;
        }

        if self.state == ChannelState::Fired {
            return ChannelDecision::Idle;
        }
        self.state = ChannelState::Fired;

        if !enabled {
            return ChannelDecision::Disabled;
        }

        if let Some(last) = self.last_fired {
            if now.saturating_duration_since(last) < self.rate_limit {
                return ChannelDecision::RateLimited;
            }
        }

        ChannelDecision::Fire
    }

    /// The action ran successfully at `at`.
    pub fn record_fired(&mut self, at: Instant) {
        self.last_fired = Some(at);
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }
}

/// Decisions for both channels for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackPlan {
    pub vibrate: ChannelDecision,
    pub sound: ChannelDecision,
}

/// Vibration and sound channels driven by the same level stream.
///
/// Pure bookkeeping: the caller performs the actions and reports back which
/// ones succeeded.
#[derive(Debug, Clone)]
pub struct FeedbackTrigger {
    vibration: FeedbackChannel,
    sound: FeedbackChannel,
}

impl Default for FeedbackTrigger {
    fn default() -> Self {
        Self::new(VIBRATION_RATE_LIMIT, SOUND_RATE_LIMIT)
    }
}

impl FeedbackTrigger {
    pub const fn new(vibration_rate_limit: Duration, sound_rate_limit: Duration) -> Self {
        Self {
            vibration: FeedbackChannel::new(vibration_rate_limit),
            sound: FeedbackChannel::new(sound_rate_limit),
        }
    }

    pub fn update(&mut self, is_level: bool, sound_enabled: bool, now: Instant) -> FeedbackPlan {
        FeedbackPlan {
            vibrate: self.vibration.on_level(is_level, true, now),
            sound: self.sound.on_level(is_level, sound_enabled, now),
        }
    }

    pub fn record_vibration(&mut self, at: Instant) {
        self.vibration.record_fired(at);
    }

    pub fn record_sound(&mut self, at: Instant) {
        self.sound.record_fired(at);
    }

    pub fn vibration(&self) -> &FeedbackChannel {
        &self.vibration
    }

    pub fn sound(&self) -> &FeedbackChannel {
        &self.sound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    /// Drive the trigger like the holder does, pretending every action succeeds.
    /// Returns (vibrations, sounds).
    fn run(trigger: &mut FeedbackTrigger, steps: &[(bool, u64)], sound_enabled: bool) -> (u32, u32) {
        let mut vibrations = 0;
        let mut sounds = 0;
        for &(level, ms) in steps {
            let plan = trigger.update(level, sound_enabled, at(ms));
            if plan.vibrate == ChannelDecision::Fire {
                trigger.record_vibration(at(ms));
                vibrations += 1;
            }
            if plan.sound == ChannelDecision::Fire {
                trigger.record_sound(at(ms));
                sounds += 1;
            }
        }
        (vibrations, sounds)
    }

    #[test]
    fn test_fires_once_per_level_period() {
        let mut trigger = FeedbackTrigger::default();
        let steps = [
            (true, 0),
            (true, 100),
            (true, 200),
            (false, 300),
            (true, 1500),
        ];

        let (vibrations, sounds) = run(&mut trigger, &steps, true);
        assert_eq!(vibrations, 2);
        assert_eq!(sounds, 2);
    }

    #[test]
    fn test_consecutive_level_samples_do_not_repeat() {
        let mut trigger = FeedbackTrigger::default();
        assert_eq!(trigger.update(true, true, at(0)).vibrate, ChannelDecision::Fire);
        trigger.record_vibration(at(0));

        for ms in [10, 600, 5000] {
            let plan = trigger.update(true, true, at(ms));
            assert_eq!(plan.vibrate, ChannelDecision::Idle);
        }
        assert_eq!(trigger.vibration().state(), ChannelState::Fired);
    }

    #[test]
    fn test_vibration_rate_limit() {
        // Re-entry 300ms after the first vibration is swallowed
        let mut trigger = FeedbackTrigger::default();
        let (vibrations, _) = run(&mut trigger, &[(true, 0), (false, 100), (true, 300)], true);
        assert_eq!(vibrations, 1);
        assert_eq!(trigger.vibration().state(), ChannelState::Fired);

        // Exactly 500ms apart both fire
        let mut trigger = FeedbackTrigger::default();
        let (vibrations, _) = run(&mut trigger, &[(true, 0), (false, 100), (true, 500)], true);
        assert_eq!(vibrations, 2);
    }

    #[test]
    fn test_sound_has_longer_window() {
        let mut trigger = FeedbackTrigger::default();
        let (vibrations, sounds) =
            run(&mut trigger, &[(true, 0), (false, 200), (true, 700)], true);
        assert_eq!(vibrations, 2);
        assert_eq!(sounds, 1);
    }

    #[test]
    fn test_rate_limited_entry_still_latches() {
        let mut trigger = FeedbackTrigger::default();
        run(&mut trigger, &[(true, 0), (false, 100)], true);

        assert_eq!(trigger.update(true, true, at(200)).vibrate, ChannelDecision::RateLimited);
        // Staying level after the window expires does not produce a late vibration
        assert_eq!(trigger.update(true, true, at(900)).vibrate, ChannelDecision::Idle);
    }

    #[test]
    fn test_disabled_sound_latches_without_catch_up() {
        let mut trigger = FeedbackTrigger::default();
        let plan = trigger.update(true, false, at(0));
        assert_eq!(plan.sound, ChannelDecision::Disabled);
        assert_eq!(plan.vibrate, ChannelDecision::Fire);

        // Sound re-enabled while still level: nothing until the next level period
        assert_eq!(trigger.update(true, true, at(100)).sound, ChannelDecision::Idle);
        assert_eq!(trigger.update(false, true, at(200)).sound, ChannelDecision::Idle);
        assert_eq!(trigger.update(true, true, at(300)).sound, ChannelDecision::Fire);
    }

    #[test]
    fn test_failed_action_does_not_consume_window() {
        let mut trigger = FeedbackTrigger::default();
        // First attempt fails: no record_vibration
        assert_eq!(trigger.update(true, true, at(0)).vibrate, ChannelDecision::Fire);
        trigger.update(false, true, at(50));
        assert_eq!(trigger.update(true, true, at(100)).vibrate, ChannelDecision::Fire);
        assert!(trigger.vibration().last_fired().is_none());
    }

    #[test]
    fn test_not_level_rearms_both_channels() {
        let mut trigger = FeedbackTrigger::default();
        trigger.update(true, true, at(0));
        assert_eq!(trigger.sound().state(), ChannelState::Fired);

        trigger.update(false, true, at(10));
        assert_eq!(trigger.vibration().state(), ChannelState::Armed);
        assert_eq!(trigger.sound().state(), ChannelState::Armed);
    }
}
