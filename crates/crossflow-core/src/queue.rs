//! Queue dynamics on the two approaches.
//!
//! Each tick, every approach receives a noisy number of arrivals uniform in
//! `[0, arrival_max)`. The approach with green also discharges
//! `drain_per_green` vehicles. The result is clamped at zero, so a queue
//! that would go negative simply empties.
//!
//! Arrivals happen on both approaches every tick but departures only on
//! the green one, which is why queues grow on red and shrink on green.
//! Draws are taken north-south first, then east-west.

use crossflow_types::{Direction, Phase, QueueState};

use crate::config::QueueConfig;
use crate::sampling::{self, SampleError, UniformSource};

/// Per-tick queue update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueDynamicsModel {
    /// Exclusive upper bound of arrivals per approach per tick.
    arrival_max: f64,
    /// Vehicles discharged per tick on the green approach.
    drain_per_green: f64,
}

impl QueueDynamicsModel {
    /// Create a model with explicit parameters.
    pub const fn new(arrival_max: f64, drain_per_green: f64) -> Self {
        Self {
            arrival_max,
            drain_per_green,
        }
    }

    /// Create a model from configuration.
    pub const fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.arrival_max, config.drain_per_green)
    }

    /// Compute the queue state after one tick under `phase`.
    ///
    /// Consumes two draws: north-south arrivals, then east-west arrivals.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError`] if either draw is outside `[0, 1)`.
    pub fn update(
        &self,
        phase: Phase,
        previous: QueueState,
        source: &mut dyn UniformSource,
    ) -> Result<QueueState, SampleError> {
        let mut next = previous;
        for direction in Direction::ALL {
            let draw = sampling::checked_draw(source)?;
            let length = self.step(phase, direction, previous.length(direction), draw);
            next = next.with_length(direction, length);
        }
        Ok(next)
    }

    /// Advance one approach given its arrival draw.
    fn step(&self, phase: Phase, direction: Direction, previous: f64, draw: f64) -> f64 {
        let arrivals = self.arrival_max * draw;
        let drain = if phase.is_green(direction) {
            self.drain_per_green
        } else {
            0.0
        };
        (previous + arrivals - drain).max(0.0)
    }
}

impl Default for QueueDynamicsModel {
    fn default() -> Self {
        Self::new(2.0, 1.0)
    }
}
