//! Two-phase signal controller.
//!
//! The controller holds which approach has green and flips it with a fixed
//! probability per tick. Each call to [`PhaseController::maybe_transition`]
//! consumes exactly one draw, whether or not the phase changes, so the
//! number of draws per tick never depends on the outcome.
//!
//! An optional minimum green time holds the current phase until it has run
//! for `min_green_ticks` ticks. With the default of 0 every draw below the
//! threshold flips the phase.

use crossflow_types::Phase;

use crate::config::ControllerConfig;
use crate::sampling::{self, SampleError, UniformSource};

/// Default per-tick probability of a phase change.
pub const DEFAULT_TRANSITION_PROBABILITY: f64 = 0.10;

/// Probabilistic two-state signal controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseController {
    /// Currently active phase.
    phase: Phase,
    /// Ticks since the last phase change.
    phase_duration: u64,
    /// A draw strictly below this value flips the phase.
    transition_probability: f64,
    /// Ticks a phase must be held before it may flip.
    min_green_ticks: u64,
}

impl PhaseController {
    /// Create a controller in [`Phase::A`] with the given parameters.
    pub const fn new(transition_probability: f64, min_green_ticks: u64) -> Self {
        Self {
            phase: Phase::A,
            phase_duration: 0,
            transition_probability,
            min_green_ticks,
        }
    }

    /// Create a controller from configuration.
    pub const fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.transition_probability, config.min_green_ticks)
    }

    /// Return the active phase.
    pub const fn current_phase(&self) -> Phase {
        self.phase
    }

    /// Return the number of ticks since the last phase change.
    pub const fn phase_duration(&self) -> u64 {
        self.phase_duration
    }

    /// Return the configured transition probability.
    pub const fn transition_probability(&self) -> f64 {
        self.transition_probability
    }

    /// Return the configured minimum green time in ticks.
    pub const fn min_green_ticks(&self) -> u64 {
        self.min_green_ticks
    }

    /// Return to [`Phase::A`] with a zero duration, keeping parameters.
    pub const fn reset(&mut self) {
        self.phase = Phase::A;
        self.phase_duration = 0;
    }

    /// Draw one sample and flip the phase if it falls below the threshold.
    ///
    /// Returns `true` if the phase changed.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError`] if the source yields a value outside
    /// `[0, 1)`. The controller is left unchanged in that case.
    pub fn maybe_transition(&mut self, source: &mut dyn UniformSource) -> Result<bool, SampleError> {
        let sample = sampling::checked_draw(source)?;
        Ok(self.apply_sample(sample))
    }

    /// Apply an already-validated draw. Returns `true` if the phase changed.
    pub fn apply_sample(&mut self, sample: f64) -> bool {
        let held_long_enough = self.phase_duration >= self.min_green_ticks;
        if held_long_enough && sample < self.transition_probability {
            self.phase = self.phase.other();
            self.phase_duration = 0;
            true
        } else {
            self.phase_duration = self.phase_duration.saturating_add(1);
            false
        }
    }
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION_PROBABILITY, 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sampling::FixedSource;

    #[test]
    fn starts_in_phase_a() {
        let controller = PhaseController::default();
        assert_eq!(controller.current_phase(), Phase::A);
        assert_eq!(controller.phase_duration(), 0);
    }

    #[test]
    fn low_draw_flips_phase() {
        let mut controller = PhaseController::default();
        assert!(controller.maybe_transition(&mut FixedSource(0.05)).unwrap());
        assert_eq!(controller.current_phase(), Phase::B);
        assert!(controller.maybe_transition(&mut FixedSource(0.05)).unwrap());
        assert_eq!(controller.current_phase(), Phase::A);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut controller = PhaseController::default();
        assert!(!controller.maybe_transition(&mut FixedSource(0.10)).unwrap());
        assert_eq!(controller.current_phase(), Phase::A);
    }

    #[test]
    fn high_draw_holds_phase_and_counts_duration() {
        let mut controller = PhaseController::default();
        for _ in 0..5 {
            assert!(!controller.maybe_transition(&mut FixedSource(0.5)).unwrap());
        }
        assert_eq!(controller.current_phase(), Phase::A);
        assert_eq!(controller.phase_duration(), 5);
    }

    #[test]
    fn transition_resets_duration() {
        let mut controller = PhaseController::default();
        controller.apply_sample(0.9);
        controller.apply_sample(0.9);
        assert_eq!(controller.phase_duration(), 2);
        assert!(controller.apply_sample(0.0));
        assert_eq!(controller.phase_duration(), 0);
    }

    #[test]
    fn min_green_holds_phase() {
        let mut controller = PhaseController::new(DEFAULT_TRANSITION_PROBABILITY, 3);
        let flips: Vec<bool> = (0..8).map(|_| controller.apply_sample(0.05)).collect();
        assert_eq!(
            flips,
            vec![false, false, false, true, false, false, false, true]
        );
    }

    #[test]
    fn reset_returns_to_phase_a() {
        let mut controller = PhaseController::new(0.5, 2);
        controller.apply_sample(0.9);
        controller.apply_sample(0.9);
        controller.apply_sample(0.0);
        assert_eq!(controller.current_phase(), Phase::B);
        controller.reset();
        assert_eq!(controller.current_phase(), Phase::A);
        assert_eq!(controller.phase_duration(), 0);
        assert_eq!(controller.min_green_ticks(), 2);
    }

    #[test]
    fn out_of_range_draw_leaves_controller_untouched() {
        let mut controller = PhaseController::default();
        let before = controller.clone();
        assert!(controller.maybe_transition(&mut FixedSource(1.2)).is_err());
        assert_eq!(controller, before);
    }
}
