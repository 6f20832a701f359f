//! Random sources and stochastic sub-models.
//!
//! Every stochastic decision in a tick consumes one uniform draw in
//! `[0, 1)` from a [`UniformSource`]. The engine never owns a random
//! generator itself; callers inject one, which makes every tick
//! reproducible from its draws:
//!
//! - [`SeededSource`] -- a seeded `rand` generator for real runs
//! - [`FixedSource`] -- always yields the same value
//! - [`ScriptedSource`] -- replays a recorded sequence, then a fallback
//!
//! Values outside `[0, 1)` are a contract violation by the source. They
//! are caught by [`checked_draw`] and reported as [`SampleError`] rather
//! than clamped.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Errors raised when a random source breaks its contract.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SampleError {
    /// The source returned a value outside `[0, 1)` (or NaN).
    #[error("random source yielded {value}, expected a value in [0, 1)")]
    OutOfRange {
        /// The offending value.
        value: f64,
    },
}

/// A source of uniform samples in `[0, 1)`.
///
/// Implementations must be synchronous and cheap; the engine draws five
/// samples per tick.
pub trait UniformSource {
    /// Return the next sample. Should lie in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Draw one sample and reject it if it is outside `[0, 1)`.
///
/// # Errors
///
/// Returns [`SampleError::OutOfRange`] for values below 0, at or above 1,
/// or NaN.
pub fn checked_draw(source: &mut dyn UniformSource) -> Result<f64, SampleError> {
    let value = source.next_unit();
    if (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SampleError::OutOfRange { value })
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Seeded pseudo-random source. The same seed yields the same sequence.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: StdRng,
    seed: u64,
}

impl SeededSource {
    /// Create a source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Return the seed this source was created with.
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl UniformSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Source that returns the same value forever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSource(pub f64);

impl UniformSource for FixedSource {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Source that replays a recorded sequence of draws.
///
/// Once the script is exhausted it returns `fallback` forever.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedSource {
    script: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedSource {
    /// Replay `draws` in order, then yield `fallback`.
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            script: draws.into_iter().collect(),
            fallback,
        }
    }

    /// Number of scripted draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl UniformSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

/// Records every draw made through it, for replaying a run later.
#[derive(Debug)]
pub struct RecordingSource<S> {
    inner: S,
    recorded: Vec<f64>,
}

impl<S: UniformSource> RecordingSource<S> {
    /// Wrap `inner`, recording its output.
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            recorded: Vec::new(),
        }
    }

    /// Draws made so far, in order.
    pub fn recorded(&self) -> &[f64] {
        &self.recorded
    }

    /// Consume the recorder and return the draws.
    pub fn into_recorded(self) -> Vec<f64> {
        self.recorded
    }
}

impl<S: UniformSource> UniformSource for RecordingSource<S> {
    fn next_unit(&mut self) -> f64 {
        let value = self.inner.next_unit();
        self.recorded.push(value);
        value
    }
}

// ---------------------------------------------------------------------------
// Wait-time model
// ---------------------------------------------------------------------------

/// Maps one uniform draw to a per-tick wait-time observation in seconds.
///
/// The reference behaviour is a placeholder for real telemetry, so the
/// engine takes the distribution as a trait object.
pub trait WaitTimeModel: core::fmt::Debug + Send {
    /// Turn a draw in `[0, 1)` into a positive wait time.
    fn sample(&self, draw: f64) -> f64;
}

/// Wait time uniform in `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformWaitTime {
    /// Inclusive lower bound, seconds. Must be positive.
    pub min: f64,
    /// Exclusive upper bound, seconds.
    pub max: f64,
}

impl Default for UniformWaitTime {
    fn default() -> Self {
        Self {
            min: 10.0,
            max: 30.0,
        }
    }
}

impl WaitTimeModel for UniformWaitTime {
    fn sample(&self, draw: f64) -> f64 {
        (self.max - self.min).mul_add(draw, self.min)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn checked_draw_accepts_unit_interval() {
        assert!(checked_draw(&mut FixedSource(0.0)).is_ok());
        assert!(checked_draw(&mut FixedSource(0.999_999)).is_ok());
    }

    #[test]
    fn checked_draw_rejects_one_negative_and_nan() {
        assert_eq!(
            checked_draw(&mut FixedSource(1.0)),
            Err(SampleError::OutOfRange { value: 1.0 })
        );
        assert!(checked_draw(&mut FixedSource(-0.1)).is_err());
        assert!(checked_draw(&mut FixedSource(f64::NAN)).is_err());
    }

    #[test]
    fn seeded_sources_agree() {
        let mut a = SeededSource::new(9);
        let mut b = SeededSource::new(9);
        for _ in 0..100 {
            let x = a.next_unit();
            assert!((0.0..1.0).contains(&x));
            assert!(x.to_bits() == b.next_unit().to_bits());
        }
        assert_eq!(a.seed(), 9);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededSource::new(1);
        let mut b = SeededSource::new(2);
        let same = (0..50)
            .filter(|_| a.next_unit().to_bits() == b.next_unit().to_bits())
            .count();
        assert!(same < 50);
    }

    #[test]
    fn scripted_source_replays_then_falls_back() {
        let mut source = ScriptedSource::new([0.1, 0.2], 0.9);
        assert_eq!(source.remaining(), 2);
        assert!((source.next_unit() - 0.1).abs() < f64::EPSILON);
        assert!((source.next_unit() - 0.2).abs() < f64::EPSILON);
        assert_eq!(source.remaining(), 0);
        assert!((source.next_unit() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn recording_source_captures_draws() {
        let mut source = RecordingSource::new(ScriptedSource::new([0.3, 0.4], 0.5));
        let _ = source.next_unit();
        let _ = source.next_unit();
        let _ = source.next_unit();
        assert_eq!(source.recorded().len(), 3);
        let draws = source.into_recorded();
        assert!((draws[2] - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn uniform_wait_time_maps_range() {
        let model = UniformWaitTime::default();
        assert!((model.sample(0.0) - 10.0).abs() < 1e-12);
        assert!((model.sample(0.5) - 20.0).abs() < 1e-12);
        assert!(model.sample(0.999_999) < 30.0);
    }
}
