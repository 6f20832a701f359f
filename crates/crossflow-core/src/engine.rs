//! Simulation engine: one tick of the signal simulation.
//!
//! Each call to [`SimulationEngine::tick`] runs these steps in order,
//! drawing five samples from the injected [`UniformSource`]:
//!
//! 1. **Read** the current queue state.
//! 2. **Phase** -- the controller may flip the phase (draw 1).
//! 3. **Queues** -- arrivals and departures under the possibly-updated
//!    phase (draws 2 and 3, north-south then east-west).
//! 4. **Wait time** -- one observation from the [`WaitTimeModel`] (draw 4).
//! 5. **Stats** -- fold the observation and transition into the running
//!    statistics (draw 5 decides throughput).
//! 6. **Snapshot** -- build the immutable per-tick record.
//! 7. **History** -- append it to the display window.
//! 8. **Return** the snapshot.
//!
//! Steps 2 to 5 work on copies. If any draw is outside `[0, 1)`, or the
//! wait-time model returns something other than a positive finite number,
//! the tick is rejected and the engine is left exactly as it was. A
//! misbehaving source or model never leaves half a tick behind.
//!
//! The engine has no notion of wall-clock time. Given the same initial
//! state and the same draws it produces bit-identical snapshots.

use crossflow_types::{EngineState, Phase, QueueState, Snapshot, StatsState};
use tracing::debug;

use crate::clock::{ClockError, TickClock};
use crate::config::SignalConfig;
use crate::history::HistoryBuffer;
use crate::phase::PhaseController;
use crate::queue::QueueDynamicsModel;
use crate::sampling::{self, SampleError, UniformSource, UniformWaitTime, WaitTimeModel};
use crate::stats::StatsAggregator;

/// Errors that reject a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The random source broke its `[0, 1)` contract.
    #[error("rejected draw: {source}")]
    Sample {
        /// The underlying sampling error.
        #[from]
        source: SampleError,
    },

    /// The wait-time model produced a sample that is not a positive,
    /// finite number of seconds.
    #[error("wait-time model yielded {value}, expected a positive finite value")]
    InvalidWaitTime {
        /// The offending sample.
        value: f64,
    },

    /// The tick counter cannot advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Owner of all mutable simulation state.
///
/// Constructed in a documented initial state: tick 0, [`Phase::A`], both
/// queues empty, all statistics zero, empty history.
#[derive(Debug)]
pub struct SimulationEngine {
    clock: TickClock,
    controller: PhaseController,
    queue_model: QueueDynamicsModel,
    queues: QueueState,
    stats: StatsAggregator,
    history: HistoryBuffer,
    wait_model: Box<dyn WaitTimeModel>,
}

impl SimulationEngine {
    /// Create an engine with the reference parameters.
    pub fn new() -> Self {
        Self::from_config(&SignalConfig::default())
    }

    /// Create an engine from configuration.
    ///
    /// The configuration is assumed to be validated already (see
    /// [`SignalConfig::validate`]).
    pub fn from_config(config: &SignalConfig) -> Self {
        Self {
            clock: TickClock::new(),
            controller: PhaseController::from_config(&config.controller),
            queue_model: QueueDynamicsModel::from_config(&config.queues),
            queues: QueueState::EMPTY,
            stats: StatsAggregator::from_config(&config.stats),
            history: HistoryBuffer::new(config.history.capacity),
            wait_model: Box::new(UniformWaitTime {
                min: config.stats.wait_time_min,
                max: config.stats.wait_time_max,
            }),
        }
    }

    /// Replace the wait-time distribution.
    #[must_use]
    pub fn with_wait_time_model(mut self, model: Box<dyn WaitTimeModel>) -> Self {
        self.wait_model = model;
        self
    }

    /// Advance the simulation by one tick and return its snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Sample`] if the source yields a value outside
    /// `[0, 1)`, [`TickError::InvalidWaitTime`] if the wait-time model
    /// returns a non-positive or non-finite sample, or [`TickError::Clock`]
    /// if the tick counter is exhausted. In every case no state is
    /// modified.
    pub fn tick(&mut self, source: &mut dyn UniformSource) -> Result<Snapshot, TickError> {
        let tick = self.clock.next_tick()?;
        let previous = self.queues;

        let mut controller = self.controller.clone();
        let transitioned = controller.maybe_transition(source)?;
        let phase = controller.current_phase();

        let queues = self.queue_model.update(phase, previous, source)?;

        let wait_draw = sampling::checked_draw(source)?;
        let wait_time_sample = self.wait_model.sample(wait_draw);
        if !(wait_time_sample.is_finite() && wait_time_sample > 0.0) {
            return Err(TickError::InvalidWaitTime {
                value: wait_time_sample,
            });
        }

        let mut stats = self.stats.clone();
        let stats_state = stats.update(wait_time_sample, transitioned, source)?;

        // Every draw has been accepted; commit.
        self.clock.advance()?;
        self.controller = controller;
        self.queues = queues;
        self.stats = stats;

        let snapshot = Snapshot {
            tick,
            phase,
            queues,
            wait_time_sample,
        };
        self.history.append(snapshot);

        debug!(
            tick,
            phase = ?phase,
            transitioned,
            ns_length = queues.ns_length,
            ew_length = queues.ew_length,
            wait_time_sample,
            smoothed_wait_time = stats_state.smoothed_wait_time,
            "Tick complete"
        );

        Ok(snapshot)
    }

    /// Copy of the current phase, queues and statistics.
    pub const fn current_state(&self) -> EngineState {
        EngineState {
            tick: self.clock.tick(),
            phase: self.controller.current_phase(),
            phase_duration: self.controller.phase_duration(),
            queues: self.queues,
            stats: self.stats.state(),
        }
    }

    /// Recent snapshots, oldest first, at most the history capacity.
    pub fn history(&self) -> &[Snapshot] {
        self.history.as_slice()
    }

    /// The history window itself.
    pub const fn history_buffer(&self) -> &HistoryBuffer {
        &self.history
    }

    /// The snapshot emitted by the most recent tick.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.history.latest()
    }

    /// Last completed tick number (0 before the first tick).
    pub const fn tick_count(&self) -> u64 {
        self.clock.tick()
    }

    /// Currently active phase.
    pub const fn phase(&self) -> Phase {
        self.controller.current_phase()
    }

    /// Current running statistics.
    pub const fn stats(&self) -> StatsState {
        self.stats.state()
    }

    /// Return to the initial state, keeping all parameters.
    pub fn reset(&mut self) {
        self.clock = TickClock::new();
        self.controller.reset();
        self.queues = QueueState::EMPTY;
        self.stats.reset();
        self.history.clear();
        debug!("Engine reset to initial state");
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sampling::{FixedSource, RecordingSource, ScriptedSource, SeededSource};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Wait-time model that ignores the draw.
    #[derive(Debug)]
    struct ConstantWait(f64);

    impl WaitTimeModel for ConstantWait {
        fn sample(&self, _draw: f64) -> f64 {
            self.0
        }
    }

    #[test]
    fn initial_state_is_documented_state() {
        let engine = SimulationEngine::new();
        let state = engine.current_state();
        assert_eq!(state.tick, 0);
        assert_eq!(state.phase, Phase::A);
        assert_eq!(state.queues, QueueState::EMPTY);
        assert_eq!(state.stats, StatsState::default());
        assert!(engine.history().is_empty());
        assert!(engine.latest().is_none());
    }

    #[test]
    fn first_tick_scenario() {
        let mut engine = SimulationEngine::new();
        // transition no, ns arrival 1.0, ew arrival 1.0, wait 20.0, throughput no
        let mut source = ScriptedSource::new([0.5, 0.5, 0.5, 0.5, 0.6], 0.5);
        let snapshot = engine.tick(&mut source).unwrap();

        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.phase, Phase::A);
        assert!(close(snapshot.queues.ns_length, 0.0));
        assert!(close(snapshot.queues.ew_length, 1.0));
        assert!(close(snapshot.wait_time_sample, 20.0));

        let stats = engine.stats();
        assert!(close(stats.smoothed_wait_time, 2.0));
        assert_eq!(stats.cumulative_throughput, 0);
        assert_eq!(stats.phase_change_count, 0);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn low_fixed_draw_alternates_every_tick() {
        let mut engine = SimulationEngine::new();
        let mut source = FixedSource(0.05);
        let mut expected = Phase::A;
        for t in 1..=12_u64 {
            let snapshot = engine.tick(&mut source).unwrap();
            expected = expected.other();
            assert_eq!(snapshot.phase, expected, "tick {t}");
            assert_eq!(engine.stats().phase_change_count, t);
            assert_eq!(snapshot.tick, t);
        }
    }

    #[test]
    fn high_fixed_draw_never_transitions() {
        let mut engine = SimulationEngine::new();
        let mut source = FixedSource(0.5);
        for _ in 0..30 {
            let snapshot = engine.tick(&mut source).unwrap();
            assert_eq!(snapshot.phase, Phase::A);
        }
        assert_eq!(engine.stats().phase_change_count, 0);
        assert_eq!(engine.current_state().phase_duration, 30);
    }

    #[test]
    fn queues_never_negative() {
        let mut engine = SimulationEngine::new();
        let mut source = SeededSource::new(2024);
        for _ in 0..2_000 {
            let snapshot = engine.tick(&mut source).unwrap();
            assert!(snapshot.queues.ns_length >= 0.0);
            assert!(snapshot.queues.ew_length >= 0.0);
            assert!(snapshot.wait_time_sample >= 10.0);
            assert!(snapshot.wait_time_sample < 30.0);
        }
    }

    #[test]
    fn history_holds_twenty_most_recent() {
        let mut engine = SimulationEngine::new();
        let mut source = SeededSource::new(5);
        let mut emitted = Vec::new();
        for t in 1..=45_usize {
            emitted.push(engine.tick(&mut source).unwrap());
            assert!(engine.history().len() <= 20);
            assert_eq!(engine.history().len(), t.min(20));
        }
        let tail = emitted.get(25..).unwrap();
        assert_eq!(engine.history(), tail);
        assert_eq!(engine.latest(), emitted.last());
    }

    #[test]
    fn smoothed_wait_converges_to_constant_input() {
        let mut engine = SimulationEngine::new().with_wait_time_model(Box::new(ConstantWait(18.0)));
        let mut source = SeededSource::new(11);
        for _ in 0..50 {
            let snapshot = engine.tick(&mut source).unwrap();
            assert!(close(snapshot.wait_time_sample, 18.0));
        }
        let error = (engine.stats().smoothed_wait_time - 18.0).abs() / 18.0;
        assert!(error < 0.01);
    }

    #[test]
    fn replaying_draws_reproduces_snapshots() {
        let mut first = SimulationEngine::new();
        let mut recorder = RecordingSource::new(SeededSource::new(77));
        let original: Vec<Snapshot> = (0..100)
            .map(|_| first.tick(&mut recorder).unwrap())
            .collect();

        let mut second = SimulationEngine::new();
        let mut replay = ScriptedSource::new(recorder.into_recorded(), 0.0);
        let replayed: Vec<Snapshot> = (0..100)
            .map(|_| second.tick(&mut replay).unwrap())
            .collect();

        assert_eq!(replay.remaining(), 0);
        for (a, b) in original.iter().zip(&replayed) {
            assert_eq!(a.tick, b.tick);
            assert_eq!(a.phase, b.phase);
            assert_eq!(a.queues.ns_length.to_bits(), b.queues.ns_length.to_bits());
            assert_eq!(a.queues.ew_length.to_bits(), b.queues.ew_length.to_bits());
            assert_eq!(a.wait_time_sample.to_bits(), b.wait_time_sample.to_bits());
        }
        assert_eq!(first.current_state(), second.current_state());
    }

    #[test]
    fn rejected_draw_leaves_engine_untouched() {
        let mut engine = SimulationEngine::new();
        let _ = engine.tick(&mut FixedSource(0.3)).unwrap();
        let before = engine.current_state();
        let history_before = engine.history().to_vec();

        // Fourth draw (wait time) is out of range.
        let mut source = ScriptedSource::new([0.05, 0.5, 0.5, 1.0, 0.1], 0.5);
        let result = engine.tick(&mut source);
        assert!(matches!(result, Err(TickError::Sample { .. })));

        assert_eq!(engine.current_state(), before);
        assert_eq!(engine.history(), history_before.as_slice());

        // The next valid tick carries the next number.
        let snapshot = engine.tick(&mut FixedSource(0.3)).unwrap();
        assert_eq!(snapshot.tick, 2);
    }

    #[test]
    fn invalid_wait_time_sample_rejects_tick() {
        for bad in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let mut engine = SimulationEngine::new();
            let _ = engine.tick(&mut FixedSource(0.5)).unwrap();
            let before = engine.current_state();

            let mut engine = engine.with_wait_time_model(Box::new(ConstantWait(bad)));
            let result = engine.tick(&mut FixedSource(0.05));
            assert!(
                matches!(result, Err(TickError::InvalidWaitTime { .. })),
                "sample {bad} accepted"
            );
            assert_eq!(engine.current_state(), before);
            assert_eq!(engine.history().len(), 1);
        }
    }

    #[test]
    fn min_green_spaces_out_transitions() {
        let mut config = SignalConfig::default();
        config.controller.min_green_ticks = 3;
        let mut engine = SimulationEngine::from_config(&config);
        let mut source = FixedSource(0.05);
        let mut change_ticks = Vec::new();
        let mut last = Phase::A;
        for _ in 0..12 {
            let snapshot = engine.tick(&mut source).unwrap();
            if snapshot.phase != last {
                change_ticks.push(snapshot.tick);
                last = snapshot.phase;
            }
        }
        assert_eq!(change_ticks, vec![4, 8, 12]);
        assert_eq!(engine.stats().phase_change_count, 3);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut engine = SimulationEngine::new();
        let mut source = SeededSource::new(3);
        for _ in 0..25 {
            let _ = engine.tick(&mut source).unwrap();
        }
        engine.reset();
        assert_eq!(engine.current_state(), EngineState::default());
        assert!(engine.history().is_empty());
        let snapshot = engine.tick(&mut source).unwrap();
        assert_eq!(snapshot.tick, 1);
    }

    #[test]
    fn configured_history_capacity_is_used() {
        let mut config = SignalConfig::default();
        config.history.capacity = 5;
        let mut engine = SimulationEngine::from_config(&config);
        let mut source = FixedSource(0.5);
        for _ in 0..9 {
            let _ = engine.tick(&mut source).unwrap();
        }
        assert_eq!(engine.history().len(), 5);
        assert_eq!(engine.history().first().map(|s| s.tick), Some(5));
    }
}
