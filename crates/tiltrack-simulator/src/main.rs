//! Desktop simulator for the tiltrack core.
//!
//! Drives the level and tracking state holders with synthetic accelerometer
//! and GPS data so both screens can be exercised without a phone. Every state
//! change is logged; run with `RUST_LOG=debug` to also see per-sample flow.
//!
//! # Usage
//!
//! ```text
//! tiltrack-simulator [SECONDS]
//! ```
//!
//! Runs for `SECONDS` of wall time (default 30). A scripted sequence of user
//! commands is replayed along the way:
//!
//! | Time | Command                   |
//! |------|---------------------------|
//! | 0s   | Start tracking            |
//! | 10s  | Toggle level axis         |
//! | 15s  | Mute level sound          |
//! | 20s  | Reset distance            |
//! | 25s  | Stop tracking             |

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use tiltrack_core::app_state::{
    Clock, LevelCommand, LevelStateHolder, LevelUiState, TrackingCommand, TrackingState,
    TrackingStateHolder,
};
use tiltrack_core::config::CoreConfig;
use tiltrack_core::feedback::{AudioCuePlayer, FeedbackError, HapticActuator};
use tiltrack_core::level::Acceleration;
use tiltrack_core::sensors::{
    AccelerometerAdapter, LocationAdapter, LocationFeed, LocationPermission, LocationPermissions,
    LocationProvider, LocationRequest, MotionSensor, SourceError, TiltFeed,
};
use tiltrack_core::tracking::LocationFix;

// ---------------------------------------------------------------------------
// Timing constants
// ---------------------------------------------------------------------------

/// Accelerometer rate (~30 Hz, a UI-rate sensor delay)
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Default run time when no argument is given
const DEFAULT_RUN_SECS: u64 = 30;

/// Standard gravity in m/s²
const GRAVITY: f64 = 9.81;

/// Walking speed of the simulated user in m/s
const WALK_SPEED_MPS: f64 = 1.4;

/// Radius of the simulated walk around the start point in meters
const WALK_RADIUS_M: f64 = 150.0;

/// Start of the simulated walk (Golden Gate Park)
const WALK_CENTER: (f64, f64) = (37.7694, -122.4862);

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Generates a device slowly rocking around level.
struct MockTiltGenerator {
    elapsed_secs: f64,
}

impl MockTiltGenerator {
    fn new() -> Self {
        Self { elapsed_secs: 0.0 }
    }

    /// Advance the internal clock and return a raw acceleration vector.
    fn next_sample(&mut self, dt_secs: f64) -> Acceleration {
        self.elapsed_secs += dt_secs;
        let t = self.elapsed_secs;

        // X: ±4° with a slow period so the device passes through level
        let x_deg = 4.0 * (t / 3.0).sin() + 0.2 * (t * 7.0).sin();
        // Y: smaller wobble, out of phase
        let y_deg = 1.5 * (t / 4.5).cos() + 0.1 * (t * 5.0).cos();

        let x = x_deg.to_radians();
        let y = y_deg.to_radians();

        Acceleration::new(
            (GRAVITY * x.sin()) as f32,
            (GRAVITY * y.sin()) as f32,
            (GRAVITY * x.cos() * y.cos()) as f32,
        )
    }
}

/// Generates GPS fixes along a circle around [`WALK_CENTER`].
struct MockGpsGenerator {
    elapsed_secs: f64,
}

impl MockGpsGenerator {
    fn new() -> Self {
        Self { elapsed_secs: 0.0 }
    }

    fn next_fix(&mut self, dt_secs: f64) -> LocationFix {
        self.elapsed_secs += dt_secs;

        let angle = self.elapsed_secs * WALK_SPEED_MPS / WALK_RADIUS_M;
        let meters_per_deg_lat = 111_320.0;
        let meters_per_deg_lon = meters_per_deg_lat * WALK_CENTER.0.to_radians().cos();

        let latitude = WALK_CENTER.0 + WALK_RADIUS_M * angle.sin() / meters_per_deg_lat;
        let longitude = WALK_CENTER.1 + WALK_RADIUS_M * (1.0 - angle.cos()) / meters_per_deg_lon;

        LocationFix::new(latitude, longitude)
            .with_timestamp((self.elapsed_secs * 1000.0) as u64)
            .with_accuracy(4.0)
    }
}

// ---------------------------------------------------------------------------
// Simulated platform
// ---------------------------------------------------------------------------

struct SimAccelerometer;

impl MotionSensor for SimAccelerometer {
    fn is_available(&self) -> bool {
        true
    }

    fn start_listening(&mut self) -> Result<(), SourceError> {
        info!("[platform] accelerometer listener registered");
        Ok(())
    }

    fn stop_listening(&mut self) {
        info!("[platform] accelerometer listener unregistered");
    }
}

struct LogHaptics;

impl HapticActuator for LogHaptics {
    fn pulse(&mut self, duration: embassy_time::Duration) -> Result<(), FeedbackError> {
        info!("[platform] *bzz* ({}ms)", duration.as_millis());
        Ok(())
    }
}

struct LogSpeaker {
    loaded: bool,
}

impl AudioCuePlayer for LogSpeaker {
    fn load(&mut self) -> Result<(), FeedbackError> {
        self.loaded = true;
        info!("[platform] level sound loaded");
        Ok(())
    }

    fn play(&mut self) -> Result<(), FeedbackError> {
        if !self.loaded {
            return Err(FeedbackError::NotLoaded);
        }
        info!("[platform] *ding*");
        Ok(())
    }

    fn release(&mut self) {
        self.loaded = false;
        info!("[platform] level sound released");
    }
}

struct SimGps;

impl LocationProvider for SimGps {
    fn request_updates(&mut self, request: &LocationRequest) -> Result<(), SourceError> {
        info!(
            "[platform] location updates requested: {}ms, {:?}",
            request.interval_ms, request.priority
        );
        Ok(())
    }

    fn remove_updates(&mut self) {
        info!("[platform] location updates removed");
    }
}

struct GrantedPermissions;

impl LocationPermissions for GrantedPermissions {
    fn has(&self, _permission: LocationPermission) -> bool {
        true
    }
}

/// Monotonic clock anchored at simulator start
struct StdClock {
    start: Instant,
}

impl Clock for StdClock {
    fn now(&self) -> embassy_time::Instant {
        embassy_time::Instant::from_micros(self.start.elapsed().as_micros() as u64)
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

fn log_level_state(state: &LevelUiState, config: &CoreConfig) {
    let zone = state.zone(config.level.nearly_level_deg);
    info!(
        "Level: x={:+.2}° y={:+.2}° bubble={:+.2} axis={:?} sound={} → {}",
        state.x_tilt_deg,
        state.y_tilt_deg,
        state.bubble_offset(config.level.bubble_scale_deg),
        state.display_axis(),
        state.sound_enabled,
        zone.label()
    );
    if let Some(message) = &state.error_message {
        warn!("Level error: {}", message);
    }
}

fn log_tracking_state(state: &TrackingState) {
    info!(
        "Tracking: {:.6}, {:.6} distance={:.3}km tracking={} permission={}",
        state.latitude,
        state.longitude,
        state.distance_km(),
        state.is_tracking,
        state.permission_granted
    );
    if let Some(message) = &state.error_message {
        error!("Tracking error: {}", message);
    }
}

/// Scripted user commands, by seconds since start
fn scripted_commands(second: u64) -> (Option<LevelCommand>, Option<TrackingCommand>) {
    match second {
        0 => (None, Some(TrackingCommand::Start)),
        10 => (Some(LevelCommand::ToggleMode), None),
        15 => (Some(LevelCommand::ToggleSound), None),
        20 => (None, Some(TrackingCommand::Reset)),
        25 => (None, Some(TrackingCommand::Stop)),
        _ => (None, None),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let run_secs = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RUN_SECS);
    let run_for = Duration::from_secs(run_secs);

    info!("Starting tiltrack simulator for {}s", run_secs);

    let config = CoreConfig::default();
    let start = Instant::now();

    let tilt_feed = TiltFeed::new();
    let location_feed = LocationFeed::new();

    let mut level = LevelStateHolder::new(
        &tilt_feed,
        SimAccelerometer,
        LogHaptics,
        LogSpeaker { loaded: false },
        StdClock { start },
        config.level,
    );
    let mut tracking = TrackingStateHolder::new(
        &location_feed,
        SimGps,
        GrantedPermissions,
        config.tracking,
    );

    let accelerometer = AccelerometerAdapter::new(&tilt_feed);
    let gps = LocationAdapter::new(&location_feed);

    let mut tilt_gen = MockTiltGenerator::new();
    let mut gps_gen = MockGpsGenerator::new();

    let gps_interval = Duration::from_millis(config.tracking.location_request.interval_ms as u64);
    let mut last_fix = start;
    let mut last_report = start;
    let mut next_command_second = 0;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    while start.elapsed() < run_for {
        let frame_start = Instant::now();

        // --- Scripted commands --------------------------------------------
        let second = start.elapsed().as_secs();
        while next_command_second <= second {
            let (level_cmd, tracking_cmd) = scripted_commands(next_command_second);
            if let Some(cmd) = level_cmd {
                info!("User → {:?}", cmd);
                level.dispatch(cmd);
            }
            if let Some(cmd) = tracking_cmd {
                info!("User → {:?}", cmd);
                tracking.dispatch(cmd);
                log_tracking_state(tracking.state());
            }
            next_command_second += 1;
        }

        // --- Platform callbacks -------------------------------------------
        accelerometer.on_acceleration(tilt_gen.next_sample(FRAME_DURATION.as_secs_f64()));

        if last_fix.elapsed() >= gps_interval {
            let dt = last_fix.elapsed().as_secs_f64();
            gps.on_location(gps_gen.next_fix(dt));
            last_fix = Instant::now();
        }

        // --- Holders ------------------------------------------------------
        let level_changed = level.poll();

        if tracking.poll() {
            log_tracking_state(tracking.state());
        }

        // Level readings arrive every frame; summarize once a second
        if level_changed && last_report.elapsed() >= Duration::from_secs(1) {
            log_level_state(level.state(), &config);
            last_report = Instant::now();
        }

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    level.teardown();
    tracking.teardown();

    info!(
        "Simulator exiting after {:.1} laps",
        gps_gen.elapsed_secs * WALK_SPEED_MPS / (2.0 * PI * WALK_RADIUS_M)
    );
}
