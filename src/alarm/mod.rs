//! Alarm sequencer — lifecycle of one in-flight SOS run.
//!
//! The start and stop buttons fire from interrupt context, but ISRs only
//! push requests into the lock-free event queue; the sequencer itself
//! runs exclusively in the main-loop context and owns the single
//! [`AlarmRun`] slot outright.  No run handle ever crosses an execution
//! context, so the cancel path cannot race the reclaim path.
//!
//! ```text
//!          start                      stop
//!  Idle ──────────▶ Running ──────────────────▶ Cancelling
//!   ▲                  │ (pattern repeats)          │ next tick: outputs
//!   └──────────────────┴────────────────────────────┘ forced off, run dropped
//! ```
//!
//! Cancellation is observed on the next sequencer tick.  The control
//! loop ticks at least as fast as the shortest pattern step, so the
//! latency from a stop request to all-outputs-off is bounded by one
//! step duration and the actuator is never left mid-pulse.

pub mod pattern;

use log::debug;

use crate::config::SystemConfig;
use crate::error::CapacityError;
use pattern::{build_sos_pattern, Pattern, Step};

// ───────────────────────────────────────────────────────────────
// Outputs
// ───────────────────────────────────────────────────────────────

/// Desired level for all four alarm outputs, applied in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmOutputs {
    pub buzzer: bool,
    pub led_blue: bool,
    pub led_red: bool,
    pub led_green: bool,
}

impl AlarmOutputs {
    pub const OFF: Self = Self::all(false);

    /// All four outputs at the same level — the SOS pattern drives the
    /// buzzer and every LED together.
    pub const fn all(on: bool) -> Self {
        Self {
            buzzer: on,
            led_blue: on,
            led_red: on,
            led_green: on,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Run
// ───────────────────────────────────────────────────────────────

/// One in-progress alarm execution.  Created on start, destroyed on
/// cancellation; owned exclusively by the sequencer while it exists.
#[derive(Debug)]
pub struct AlarmRun {
    pattern: Pattern,
    cursor: usize,
    elapsed_in_step_ms: u32,
    cancel_requested: bool,
}

impl AlarmRun {
    fn new(config: &SystemConfig) -> Result<Self, CapacityError> {
        let pattern = build_sos_pattern(config)?;
        debug_assert!(!pattern.is_empty());
        Ok(Self {
            pattern,
            cursor: 0,
            elapsed_in_step_ms: 0,
            cancel_requested: false,
        })
    }

    fn current_step(&self) -> Step {
        self.pattern[self.cursor]
    }

    /// Advance the run by `delta_ms`, wrapping to the start of the
    /// pattern when the final rest step completes.
    fn advance(&mut self, delta_ms: u32) {
        self.elapsed_in_step_ms += delta_ms;
        while self.elapsed_in_step_ms >= self.current_step().duration_ms {
            self.elapsed_in_step_ms -= self.current_step().duration_ms;
            self.cursor = (self.cursor + 1) % self.pattern.len();
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Sequencer
// ───────────────────────────────────────────────────────────────

/// Sequencer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqState {
    Idle,
    Running,
    Cancelling,
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new run was created.
    Started,
    /// A run is already active; the request was ignored (bounce guard).
    AlreadyRunning,
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The active run will be torn down on the next tick.
    Cancelled,
    /// No active run — the request was a no-op.
    NoRun,
}

/// Owns the single alarm run slot and advances it tick by tick.
pub struct AlarmSequencer {
    state: SeqState,
    run: Option<AlarmRun>,
    config: SystemConfig,
}

impl AlarmSequencer {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: SeqState::Idle,
            run: None,
            config: config.clone(),
        }
    }

    pub fn state(&self) -> SeqState {
        self.state
    }

    /// Begin a new alarm run.
    ///
    /// Ignored while a run is active (a bouncing start button must not
    /// restart or duplicate the pattern).  Fails with a capacity error
    /// if the pattern does not fit its slot, leaving the state Idle.
    pub fn start(&mut self) -> Result<StartOutcome, CapacityError> {
        match self.state {
            SeqState::Idle => {
                self.run = Some(AlarmRun::new(&self.config)?);
                self.state = SeqState::Running;
                Ok(StartOutcome::Started)
            }
            SeqState::Running | SeqState::Cancelling => {
                debug!("Alarm: start ignored, run already active");
                Ok(StartOutcome::AlreadyRunning)
            }
        }
    }

    /// Request cancellation of the active run.  Safe to call at any
    /// time; with no active run this is a no-op.
    pub fn cancel(&mut self) -> CancelOutcome {
        match self.state {
            SeqState::Running => {
                if let Some(run) = self.run.as_mut() {
                    run.cancel_requested = true;
                }
                self.state = SeqState::Cancelling;
                CancelOutcome::Cancelled
            }
            SeqState::Idle | SeqState::Cancelling => CancelOutcome::NoRun,
        }
    }

    /// Advance the sequencer by `delta_ms` and return the output levels
    /// to apply.  A cancellation requested since the last tick takes
    /// effect here: the run is dropped and all outputs return off.
    pub fn tick(&mut self, delta_ms: u32) -> AlarmOutputs {
        match self.state {
            SeqState::Idle => AlarmOutputs::OFF,

            SeqState::Cancelling => {
                // Reclaim the run and force the all-off state before
                // reporting Idle — no partial pulses survive a cancel.
                self.run = None;
                self.state = SeqState::Idle;
                AlarmOutputs::OFF
            }

            SeqState::Running => {
                let Some(run) = self.run.as_mut() else {
                    debug_assert!(false, "running with no run slot");
                    self.state = SeqState::Idle;
                    return AlarmOutputs::OFF;
                };
                run.advance(delta_ms);
                AlarmOutputs::all(run.current_step().on)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer() -> AlarmSequencer {
        AlarmSequencer::new(&SystemConfig::default())
    }

    #[test]
    fn stop_without_run_is_noop() {
        let mut seq = sequencer();
        assert_eq!(seq.cancel(), CancelOutcome::NoRun);
        assert_eq!(seq.state(), SeqState::Idle);
        assert_eq!(seq.tick(50), AlarmOutputs::OFF);
    }

    #[test]
    fn start_creates_one_run_and_drives_outputs() {
        let mut seq = sequencer();
        assert_eq!(seq.start(), Ok(StartOutcome::Started));
        assert_eq!(seq.state(), SeqState::Running);
        // First short pulse: outputs on for the first 100ms.
        assert_eq!(seq.tick(50), AlarmOutputs::all(true));
    }

    #[test]
    fn double_start_is_ignored() {
        let mut seq = sequencer();
        assert_eq!(seq.start(), Ok(StartOutcome::Started));
        assert_eq!(seq.start(), Ok(StartOutcome::AlreadyRunning));
        // The original run is not interrupted: still inside the first pulse.
        assert_eq!(seq.tick(50), AlarmOutputs::all(true));
    }

    #[test]
    fn pattern_steps_alternate_at_boundaries() {
        let mut seq = sequencer();
        seq.start().unwrap();
        assert_eq!(seq.tick(50), AlarmOutputs::all(true)); // 50ms into on-step
        assert_eq!(seq.tick(50), AlarmOutputs::all(false)); // crossed into off-step
        assert_eq!(seq.tick(100), AlarmOutputs::all(true)); // second short pulse
    }

    #[test]
    fn cancel_mid_pulse_forces_all_off_within_one_step() {
        let mut seq = sequencer();
        seq.start().unwrap();
        assert_eq!(seq.tick(50), AlarmOutputs::all(true));

        // Stop fires 50ms into the first 100ms pulse.
        assert_eq!(seq.cancel(), CancelOutcome::Cancelled);
        assert_eq!(seq.state(), SeqState::Cancelling);

        let outputs = seq.tick(50);
        assert_eq!(outputs, AlarmOutputs::OFF);
        assert_eq!(seq.state(), SeqState::Idle);
    }

    #[test]
    fn pattern_repeats_after_the_rest_step() {
        let mut seq = sequencer();
        seq.start().unwrap();
        let c = SystemConfig::default();
        let full_cycle = 12 * c.alarm_short_ms + 6 * c.alarm_long_ms + c.alarm_rest_ms;
        // One full cycle later the run is back at the first on-step.
        assert_eq!(seq.tick(full_cycle + 10), AlarmOutputs::all(true));
        assert_eq!(seq.state(), SeqState::Running);
    }

    #[test]
    fn restart_after_cancel_begins_a_fresh_run() {
        let mut seq = sequencer();
        seq.start().unwrap();
        seq.tick(150); // partway into the pattern
        seq.cancel();
        seq.tick(50); // reclaim

        assert_eq!(seq.start(), Ok(StartOutcome::Started));
        // Fresh run starts from the first on-step, not the old cursor.
        assert_eq!(seq.tick(10), AlarmOutputs::all(true));
    }

    #[test]
    fn cancel_while_cancelling_is_noop() {
        let mut seq = sequencer();
        seq.start().unwrap();
        seq.cancel();
        assert_eq!(seq.cancel(), CancelOutcome::NoRun);
        seq.tick(50);
        assert_eq!(seq.state(), SeqState::Idle);
    }
}
