//! SOS alarm pattern construction.
//!
//! The pattern is an ordered sequence of (output-level, duration) steps
//! built into a fixed-capacity buffer at start time.  Three short pulses,
//! three long, three short, then a rest before the sequence repeats —
//! the whole thing loops for as long as the run is active.

use crate::config::SystemConfig;
use crate::error::CapacityError;

/// One entry in an alarm pattern: all outputs on (or off) for `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub on: bool,
    pub duration_ms: u32,
}

/// Upper bound on pattern length.  The SOS pattern needs 19 steps; the
/// headroom absorbs config-driven variants without reallocating.
pub const MAX_PATTERN_STEPS: usize = 24;

/// Fixed-capacity pattern buffer — the single-slot "arena" an
/// [`AlarmRun`](super::AlarmRun) owns.
pub type Pattern = heapless::Vec<Step, MAX_PATTERN_STEPS>;

/// Build the SOS pattern from the configured timings.
///
/// Errors with [`CapacityError::AlarmPattern`] if the pattern does not
/// fit [`MAX_PATTERN_STEPS`] — the run is not created in that case.
pub fn build_sos_pattern(config: &SystemConfig) -> Result<Pattern, CapacityError> {
    let mut pattern = Pattern::new();

    push_pulses(&mut pattern, 3, config.alarm_short_ms)?;
    push_pulses(&mut pattern, 3, config.alarm_long_ms)?;
    push_pulses(&mut pattern, 3, config.alarm_short_ms)?;

    // Rest before the pattern wraps around.
    pattern
        .push(Step {
            on: false,
            duration_ms: config.alarm_rest_ms,
        })
        .map_err(|_| CapacityError::AlarmPattern)?;

    Ok(pattern)
}

fn push_pulses(pattern: &mut Pattern, count: usize, duration_ms: u32) -> Result<(), CapacityError> {
    for _ in 0..count {
        pattern
            .push(Step {
                on: true,
                duration_ms,
            })
            .map_err(|_| CapacityError::AlarmPattern)?;
        pattern
            .push(Step {
                on: false,
                duration_ms,
            })
            .map_err(|_| CapacityError::AlarmPattern)?;
    }
    Ok(())
}
