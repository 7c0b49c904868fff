//! Bubble level screen state

use libm::fabsf;
use log::{debug, error, info, warn};

use super::{Clock, Fault};
use crate::config::LevelConfig;
use crate::feedback::{
    AudioCuePlayer, ChannelDecision, FeedbackError, FeedbackTrigger, HapticActuator,
};
use crate::level::{DisplayAxis, LEVEL_THRESHOLD_DEG, LevelZone, TiltSample, bubble_offset};
use crate::sensors::{MotionSensor, SourceEvent, TiltFeed};

/// Everything the level screen renders
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUiState {
    pub x_tilt_deg: f32,
    pub y_tilt_deg: f32,
    pub is_level: bool,
    pub sensor_available: bool,
    /// Horizontal shows the X axis, vertical the Y axis
    pub horizontal_mode: bool,
    pub sound_enabled: bool,
    pub error_message: Option<heapless::String<64>>,
}

impl Default for LevelUiState {
    fn default() -> Self {
        Self {
            x_tilt_deg: 0.0,
            y_tilt_deg: 0.0,
            is_level: false,
            sensor_available: true,
            horizontal_mode: true,
            sound_enabled: true,
            error_message: None,
        }
    }
}

impl LevelUiState {
    pub fn display_axis(&self) -> DisplayAxis {
        DisplayAxis::for_mode(self.horizontal_mode)
    }

    /// Tilt of the axis the single-axis bubble shows
    pub fn displayed_tilt(&self) -> f32 {
        match self.display_axis() {
            DisplayAxis::X => self.x_tilt_deg,
            DisplayAxis::Y => self.y_tilt_deg,
        }
    }

    /// Level flag as seen by the single-axis bubble
    pub fn axis_is_level(&self) -> bool {
        self.is_level && fabsf(self.displayed_tilt()) < LEVEL_THRESHOLD_DEG
    }

    pub fn zone(&self, nearly_level_deg: f32) -> LevelZone {
        LevelZone::assess(&self.sample(), nearly_level_deg)
    }

    /// Bubble displacement for the displayed axis in [-1, 1]
    pub fn bubble_offset(&self, scale_deg: f32) -> f32 {
        bubble_offset(self.displayed_tilt(), scale_deg)
    }

    fn sample(&self) -> TiltSample {
        TiltSample {
            x_tilt_deg: self.x_tilt_deg,
            y_tilt_deg: self.y_tilt_deg,
            is_level: self.is_level,
            sensor_available: self.sensor_available,
        }
    }
}

/// User intents forwarded by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelCommand {
    ToggleMode,
    ToggleSound,
}

/// Owns the level screen state and its accelerometer subscription.
///
/// Registration with the sensor and loading the audio cue happen in
/// [`new`](Self::new); both are undone exactly once by
/// [`teardown`](Self::teardown) or on drop.
pub struct LevelStateHolder<'a, S, H, A, K>
where
    S: MotionSensor,
    H: HapticActuator,
    A: AudioCuePlayer,
    K: Clock,
{
    state: LevelUiState,
    feed: &'a TiltFeed,
    sensor: S,
    haptics: H,
    audio: A,
    clock: K,
    trigger: FeedbackTrigger,
    config: LevelConfig,
    listening: bool,
    audio_loaded: bool,
    torn_down: bool,
}

impl<'a, S, H, A, K> LevelStateHolder<'a, S, H, A, K>
where
    S: MotionSensor,
    H: HapticActuator,
    A: AudioCuePlayer,
    K: Clock,
{
    pub fn new(
        feed: &'a TiltFeed,
        sensor: S,
        haptics: H,
        audio: A,
        clock: K,
        config: LevelConfig,
    ) -> Self {
        let mut holder = Self {
            state: LevelUiState::default(),
            feed,
            sensor,
            haptics,
            audio,
            clock,
            trigger: config.feedback_trigger(),
            config,
            listening: false,
            audio_loaded: false,
            torn_down: false,
        };

        if holder.sensor.is_available() {
            match holder.sensor.start_listening() {
                Ok(()) => {
                    info!("Accelerometer registered");
                    holder.listening = true;
                }
                Err(e) => holder.report(Fault::from(e)),
            }
        } else {
            // The sentinel is applied here; nothing is queued behind it
            feed.close();
            holder.apply_sample(TiltSample::unavailable());
            holder.report(Fault::SensorUnavailable);
        }

        match holder.audio.load() {
            Ok(()) => holder.audio_loaded = true,
            Err(e) => error!("Failed to load level sound: {}", e),
        }

        holder
    }

    pub fn state(&self) -> &LevelUiState {
        &self.state
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn trigger(&self) -> &FeedbackTrigger {
        &self.trigger
    }

    /// Apply the pending feed event, if any. Returns whether the state changed.
    ///
    /// Does nothing once the holder is torn down.
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

    pub fn toggle_mode(&mut self) {
        self.state.horizontal_mode = !self.state.horizontal_mode;
        debug!("Horizontal mode: {}", self.state.horizontal_mode);
    }

    pub fn toggle_sound(&mut self) {
        self.state.sound_enabled = !self.state.sound_enabled;
        debug!("Sound enabled: {}", self.state.sound_enabled);
    }

    pub fn dispatch(&mut self, command: LevelCommand) {
        match command {
            LevelCommand::ToggleMode => self.toggle_mode(),
            LevelCommand::ToggleSound => self.toggle_sound(),
        }
    }

    /// Unregister from the sensor and release the audio cue. Later calls do
    /// nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if self.listening {
            self.sensor.stop_listening();
            self.listening = false;
        }
        if self.audio_loaded {
            self.audio.release();
            self.audio_loaded = false;
        }
        info!("Level screen torn down");
    }

    fn handle_event(&mut self, event: SourceEvent<TiltSample>) {
        match event {
            SourceEvent::Reading(sample) => {
                self.state.error_message = None;
                self.apply_sample(sample);
                self.fire_feedback();
            }
            SourceEvent::Unavailable => {
                self.apply_sample(TiltSample::unavailable());
                self.report(Fault::SensorUnavailable);
            }
            SourceEvent::Failed(e) => self.report(Fault::from(e)),
        }
    }

    fn apply_sample(&mut self, sample: TiltSample) {
        self.state.x_tilt_deg = sample.x_tilt_deg;
        self.state.y_tilt_deg = sample.y_tilt_deg;
        self.state.is_level = sample.is_level;
        self.state.sensor_available = sample.sensor_available;
    }

    fn fire_feedback(&mut self) {
        let now = self.clock.now();
        let plan = self
            .trigger
            .update(self.state.is_level, self.state.sound_enabled, now);

        if plan.vibrate == ChannelDecision::Fire {
            match self.haptics.pulse(self.config.haptic_pulse()) {
                Ok(()) => self.trigger.record_vibration(now),
                Err(e) => self.report(Fault::from(e)),
            }
        }

        if plan.sound == ChannelDecision::Fire {
            let played = if self.audio_loaded {
                self.audio.play()
            } else {
                Err(FeedbackError::NotLoaded)
            };
            match played {
                Ok(()) => self.trigger.record_sound(now),
                Err(e) => self.report(Fault::from(e)),
            }
        }
    }

    fn report(&mut self, fault: Fault) {
        match &fault {
            Fault::SensorUnavailable => warn!("Accelerometer not available on this device"),
            Fault::FeedbackActionFailure(e) => error!("Level feedback failed: {}", e),
            Fault::UpstreamStreamError(e) => {
                warn!("Accelerometer stream error: {}", e);
                self.state.error_message = Some(fault.message());
            }
            Fault::PermissionDenied => {}
        }
    }
}

impl<S, H, A, K> Drop for LevelStateHolder<'_, S, H, A, K>
where
    S: MotionSensor,
    H: HapticActuator,
    A: AudioCuePlayer,
    K: Clock,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
