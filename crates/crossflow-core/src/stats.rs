//! Rolling statistics folded from every tick.
//!
//! - **Smoothed wait time** -- exponential moving average of the per-tick
//!   wait-time samples, `new = (1 - alpha) * old + alpha * sample`. With the
//!   default `alpha = 0.1` the filter has a time constant of roughly ten
//!   ticks and settles within 1% of a constant input after 44 ticks.
//! - **Cumulative throughput** -- one departure counted per tick with
//!   probability `throughput_probability`, independent of queue length.
//! - **Phase-change count** -- incremented once per transition.
//!
//! The state starts at all zeros and is only reset when the engine is.

use crossflow_types::StatsState;

use crate::config::StatsConfig;
use crate::sampling::{self, SampleError, UniformSource};

/// Running statistics accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsAggregator {
    state: StatsState,
    /// Weight of the newest sample in the moving average.
    ema_alpha: f64,
    /// Probability a vehicle departure is counted on a given tick.
    throughput_probability: f64,
}

impl StatsAggregator {
    /// Create an aggregator with all statistics at zero.
    pub fn new(ema_alpha: f64, throughput_probability: f64) -> Self {
        Self {
            state: StatsState::default(),
            ema_alpha,
            throughput_probability,
        }
    }

    /// Create an aggregator from configuration.
    pub fn from_config(config: &StatsConfig) -> Self {
        Self::new(config.ema_alpha, config.throughput_probability)
    }

    /// Return the current statistics.
    pub const fn state(&self) -> StatsState {
        self.state
    }

    /// Zero every statistic, keeping parameters.
    pub fn reset(&mut self) {
        self.state = StatsState::default();
    }

    /// Fold one tick into the statistics and return the updated state.
    ///
    /// Consumes one draw for the throughput decision.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError`] if the draw is outside `[0, 1)`. The
    /// statistics are left unchanged in that case.
    pub fn update(
        &mut self,
        wait_time_sample: f64,
        transitioned: bool,
        source: &mut dyn UniformSource,
    ) -> Result<StatsState, SampleError> {
        let throughput_draw = sampling::checked_draw(source)?;

        let previous = self.state.smoothed_wait_time;
        self.state.smoothed_wait_time =
            (1.0 - self.ema_alpha).mul_add(previous, self.ema_alpha * wait_time_sample);

        if throughput_draw < self.throughput_probability {
            self.state.cumulative_throughput = self.state.cumulative_throughput.saturating_add(1);
        }
        if transitioned {
            self.state.phase_change_count = self.state.phase_change_count.saturating_add(1);
        }

        Ok(self.state)
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(0.1, 0.5)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sampling::FixedSource;

    #[test]
    fn first_sample_moves_average_by_alpha() {
        let mut stats = StatsAggregator::default();
        let state = stats.update(20.0, false, &mut FixedSource(0.6)).unwrap();
        assert!((state.smoothed_wait_time - 2.0).abs() < 1e-12);
        assert_eq!(state.cumulative_throughput, 0);
        assert_eq!(state.phase_change_count, 0);
    }

    #[test]
    fn low_draw_counts_a_departure() {
        let mut stats = StatsAggregator::default();
        let state = stats.update(15.0, false, &mut FixedSource(0.49)).unwrap();
        assert_eq!(state.cumulative_throughput, 1);
    }

    #[test]
    fn transitions_are_counted() {
        let mut stats = StatsAggregator::default();
        let _ = stats.update(15.0, true, &mut FixedSource(0.9)).unwrap();
        let _ = stats.update(15.0, false, &mut FixedSource(0.9)).unwrap();
        let state = stats.update(15.0, true, &mut FixedSource(0.9)).unwrap();
        assert_eq!(state.phase_change_count, 2);
        assert_eq!(stats.state(), state);
    }

    #[test]
    fn constant_input_converges_within_one_percent() {
        let mut stats = StatsAggregator::default();
        let target = 25.0;
        for _ in 0..50 {
            let _ = stats.update(target, false, &mut FixedSource(0.9)).unwrap();
        }
        let error = (stats.state().smoothed_wait_time - target).abs() / target;
        assert!(error < 0.01, "relative error {error} after 50 ticks");
    }

    #[test]
    fn average_stays_within_sample_range() {
        let mut stats = StatsAggregator::default();
        for i in 0..200_u32 {
            let sample = if i % 2 == 0 { 10.0 } else { 30.0 };
            let state = stats.update(sample, false, &mut FixedSource(0.9)).unwrap();
            assert!(state.smoothed_wait_time >= 0.0);
            assert!(state.smoothed_wait_time < 30.0);
        }
    }

    #[test]
    fn rejected_draw_leaves_state_unchanged() {
        let mut stats = StatsAggregator::default();
        let _ = stats.update(20.0, true, &mut FixedSource(0.1)).unwrap();
        let before = stats.state();
        assert!(stats.update(20.0, true, &mut FixedSource(-0.5)).is_err());
        assert_eq!(stats.state(), before);
    }
}
