//! Tick clock for the Crossflow simulation.
//!
//! The clock is the single source of truth for simulated time. It counts
//! completed ticks; everything else that depends on time (snapshot numbers,
//! phase duration) is derived from that counter.
//!
//! The clock does not sleep or schedule anything. The runner decides when a
//! tick happens; the clock only records that it did.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Counter of completed simulation ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickClock {
    /// Number of completed ticks (0 before the first tick).
    tick: u64,
}

impl TickClock {
    /// Create a clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// Create a clock that has already completed `tick` ticks.
    pub const fn from_tick(tick: u64) -> Self {
        Self { tick }
    }

    /// Return the last completed tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the number the next tick will carry, without advancing.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter is at `u64::MAX`.
    pub const fn next_tick(&self) -> Result<u64, ClockError> {
        match self.tick.checked_add(1) {
            Some(next) => Ok(next),
            None => Err(ClockError::TickOverflow),
        }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.next_tick()?;
        Ok(self.tick)
    }
}
