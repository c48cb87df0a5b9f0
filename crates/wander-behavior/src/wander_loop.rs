//! [`WanderLoop`] – the reactive obstacle-avoidance state machine.
//!
//! States: `Starting → Driving ⇄ Avoiding → ShuttingDown` (terminal).
//! Each driving cycle reads one distance measurement and either keeps
//! driving or runs the scripted avoidance sequence. The loop is strictly
//! sequential: no command overlaps another, and within one cycle the
//! publish order is exactly the order the code issues them.
//!
//! The driving loop has exactly two exits, both named at the `loop`
//! construct itself: the operator shutdown flag (normal) and a fatal
//! error propagated with `?` (a sensor timeout is fatal – the robot must
//! not drive blind). Every exit, including panic-free error paths, runs
//! the shared cleanup that stops the motors.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};
use wander_bus::MessageBus;
use wander_types::WanderError;

use crate::actions::{ActionSequencer, SettleTiming};
use crate::sonar::{DEFAULT_READ_BUDGET, SonarReader};

/// Announced once when the behavior starts.
pub const START_PHRASE: &str = "here we go!";

/// Spoken during every avoidance sequence.
pub const WARNING_PHRASE: &str = "Can't go that way!";

/// Indicator flashed while the warning is spoken.
const WARNING_LED: &str = "red";

/// Pause at the end of each driving cycle.
const CYCLE_PAUSE: Duration = Duration::from_millis(10);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tunables for the wander behavior.
#[derive(Debug, Clone, Copy)]
pub struct WanderConfig {
    /// Obstacle distance threshold. Strictly-less-than comparison, no
    /// hysteresis: a measurement oscillating exactly at the threshold can
    /// flap between states. Known limitation, kept as-is.
    pub distance_threshold: f64,
    /// Forward drive speed.
    pub drive_speed: f32,
    /// Speed of the scripted avoidance turn.
    pub turn_speed: f32,
    /// Wall-clock budget for one sonar read.
    pub read_budget: Duration,
    /// Settle delays for the timed primitives.
    pub timing: SettleTiming,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 40.0,
            drive_speed: 1.0,
            turn_speed: 1.0,
            read_budget: DEFAULT_READ_BUDGET,
            timing: SettleTiming::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State machine
// ─────────────────────────────────────────────────────────────────────────────

/// Observable state of the wander loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WanderState {
    Starting,
    Driving,
    Avoiding,
    ShuttingDown,
}

/// The top-level control loop.
///
/// Owns the sonar subscription and the action sequencer. Construct with
/// [`WanderLoop::new`] and call [`run`][WanderLoop::run] once; the loop
/// runs until the shutdown flag is raised or a fatal error occurs, and
/// always leaves the motors stopped.
pub struct WanderLoop {
    reader: SonarReader,
    actions: ActionSequencer,
    config: WanderConfig,
    state: WanderState,
    /// Raised by the Ctrl-C handler (or a test); polled once per cycle.
    shutdown: Arc<AtomicBool>,
}

impl WanderLoop {
    /// Wire the loop onto `bus`.
    ///
    /// The sonar subscription is created here, before any motion command
    /// can possibly be published, so the first measurement after motion
    /// starts cannot be missed.
    pub fn new(bus: MessageBus, config: WanderConfig, shutdown: Arc<AtomicBool>) -> Self {
        let reader = SonarReader::attach(&bus);
        let actions = ActionSequencer::with_timing(bus, config.timing);
        Self {
            reader,
            actions,
            config,
            state: WanderState::Starting,
            shutdown,
        }
    }

    /// Current state, for supervisors and tests.
    pub fn state(&self) -> WanderState {
        self.state
    }

    /// Run the behavior to completion.
    ///
    /// Returns `Ok(())` when the shutdown flag ended the run, or the
    /// fatal error that aborted it. Either way the motors are stopped
    /// and the sonar subscription is released before this returns.
    pub async fn run(&mut self) -> Result<(), WanderError> {
        let result = self.drive_until_exit().await;
        if let Err(e) = &result {
            error!(error = %e, "wander behavior aborted");
        }
        self.state = WanderState::ShuttingDown;
        self.cleanup().await;
        result
    }

    /// Starting state plus the driving loop.
    async fn drive_until_exit(&mut self) -> Result<(), WanderError> {
        info!("starting wander behavior");
        self.actions.speak(START_PHRASE).await?;
        self.actions.drive(self.config.drive_speed).await?;
        self.state = WanderState::Driving;

        loop {
            // Exit 1: operator shutdown.
            if self.shutdown.load(Ordering::SeqCst) {
                info!("shutdown requested");
                return Ok(());
            }

            // Exit 2: a fatal error (sensor timeout, payload, bus).
            let distance = self.reader.read_distance(self.config.read_budget).await?;
            debug!(distance, "driving cycle");

            if distance < self.config.distance_threshold {
                debug!(distance, "too close to an obstacle, turning away");
                self.avoid().await?;
            }

            tokio::time::sleep(CYCLE_PAUSE).await;
        }
    }

    /// The scripted avoidance sequence, run once per detected obstacle:
    /// stop, flash the warning indicator around the spoken warning, turn
    /// away, resume driving.
    async fn avoid(&mut self) -> Result<(), WanderError> {
        self.state = WanderState::Avoiding;
        self.actions.stop_motors().await?;
        self.actions.led_on(WARNING_LED).await?;
        self.actions.speak(WARNING_PHRASE).await?;
        self.actions.led_off(WARNING_LED).await?;
        self.actions.turn_left(self.config.turn_speed).await?;
        self.actions.drive(self.config.drive_speed).await?;
        self.state = WanderState::Driving;
        Ok(())
    }

    /// Shared cleanup for every exit path.
    ///
    /// Must leave the robot stationary even when the run is already
    /// failing, so a publish failure here is logged rather than allowed
    /// to mask the original error.
    async fn cleanup(&mut self) {
        info!("cleaning up");
        if let Err(e) = self.actions.stop_motors().await {
            warn!(error = %e, "failed to publish stop during cleanup");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
