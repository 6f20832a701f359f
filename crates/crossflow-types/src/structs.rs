//! Core record types: queue state, per-tick snapshots, running statistics.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Direction, Phase};

// ---------------------------------------------------------------------------
// Queue state
// ---------------------------------------------------------------------------

/// Queue lengths on both approaches, in vehicles.
///
/// Lengths are real-valued because arrivals are modelled as a continuous
/// noisy quantity. Both fields are kept `>= 0` by the queue model, which
/// clamps after every update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueState {
    /// Vehicles waiting on the north-south approach.
    pub ns_length: f64,
    /// Vehicles waiting on the east-west approach.
    pub ew_length: f64,
}

impl QueueState {
    /// Both queues empty.
    pub const EMPTY: Self = Self {
        ns_length: 0.0,
        ew_length: 0.0,
    };

    /// Create a queue state from explicit lengths.
    pub const fn new(ns_length: f64, ew_length: f64) -> Self {
        Self {
            ns_length,
            ew_length,
        }
    }

    /// Queue length for a single direction.
    pub const fn length(&self, direction: Direction) -> f64 {
        match direction {
            Direction::NorthSouth => self.ns_length,
            Direction::EastWest => self.ew_length,
        }
    }

    /// Copy with the queue for `direction` replaced by `length`.
    #[must_use]
    pub const fn with_length(self, direction: Direction, length: f64) -> Self {
        match direction {
            Direction::NorthSouth => Self {
                ns_length: length,
                ..self
            },
            Direction::EastWest => Self {
                ew_length: length,
                ..self
            },
        }
    }

    /// Combined length of both queues.
    pub fn total(&self) -> f64 {
        self.ns_length + self.ew_length
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable record of the intersection at the end of one tick.
///
/// Produced exactly once per tick by the engine. Consumers receive clones
/// and never see a snapshot change after it was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Tick number, starting at 1 and increasing by one per tick.
    pub tick: u64,
    /// Phase in effect when the tick completed.
    pub phase: Phase,
    /// Queue lengths after this tick's arrivals and departures.
    pub queues: QueueState,
    /// Wait time observed this tick, in seconds.
    pub wait_time_sample: f64,
}

// ---------------------------------------------------------------------------
// Running statistics
// ---------------------------------------------------------------------------

/// Rolling and cumulative metrics folded from every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatsState {
    /// Exponential moving average of the wait-time samples, in seconds.
    pub smoothed_wait_time: f64,
    /// Vehicles that have departed since the engine was initialised.
    pub cumulative_throughput: u64,
    /// Number of phase changes since the engine was initialised.
    pub phase_change_count: u64,
}

// ---------------------------------------------------------------------------
// Engine state projection
// ---------------------------------------------------------------------------

/// Read-only view of the engine's current state.
///
/// This is what a renderer polls between snapshots. It is a copy; changing
/// it has no effect on the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EngineState {
    /// Last completed tick (0 before the first tick).
    pub tick: u64,
    /// Currently active phase.
    pub phase: Phase,
    /// Ticks elapsed since the phase last changed.
    pub phase_duration: u64,
    /// Current queue lengths.
    pub queues: QueueState,
    /// Current running statistics.
    pub stats: StatsState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queues_total_zero() {
        let q = QueueState::EMPTY;
        assert!(q.total().abs() < f64::EPSILON);
        assert_eq!(q, QueueState::default());
    }

    #[test]
    fn with_length_replaces_one_direction() {
        let q = QueueState::new(3.5, 1.25).with_length(Direction::EastWest, 4.0);
        assert!((q.ns_length - 3.5).abs() < f64::EPSILON);
        assert!((q.length(Direction::EastWest) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn length_by_direction() {
        let q = QueueState::new(3.5, 1.25);
        assert!((q.length(Direction::NorthSouth) - 3.5).abs() < f64::EPSILON);
        assert!((q.length(Direction::EastWest) - 1.25).abs() < f64::EPSILON);
        assert!((q.total() - 4.75).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_json_field_names() {
        let snap = Snapshot {
            tick: 7,
            phase: Phase::B,
            queues: QueueState::new(1.0, 2.0),
            wait_time_sample: 12.5,
        };
        let value = serde_json::to_value(snap).unwrap_or_default();
        assert_eq!(value["tick"], 7);
        assert_eq!(value["phase"], "B");
        assert_eq!(value["queues"]["ns_length"], 1.0);
        assert_eq!(value["queues"]["ew_length"], 2.0);
        assert_eq!(value["wait_time_sample"], 12.5);
    }

    #[test]
    fn default_engine_state_is_initial_state() {
        let state = EngineState::default();
        assert_eq!(state.tick, 0);
        assert_eq!(state.phase, Phase::A);
        assert_eq!(state.phase_duration, 0);
        assert_eq!(state.queues, QueueState::EMPTY);
        assert_eq!(state.stats, StatsState::default());
    }
}
