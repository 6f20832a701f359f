//! Signal controller, queue model, statistics and tick loop for the
//! Crossflow two-phase intersection simulation.
//!
//! The engine in this crate is pure and deterministic: randomness comes in
//! through a [`UniformSource`] and nothing reads the wall clock. The
//! real-time loop and operator controls sit on top of it.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic tick counter.
//! - [`config`] -- Configuration loading from `crossflow-config.yaml` into
//!   strongly-typed structs.
//! - [`sampling`] -- [`UniformSource`] trait, seeded and scripted sources,
//!   and the pluggable wait-time distribution.
//! - [`phase`] -- Probabilistic two-state [`PhaseController`].
//! - [`queue`] -- [`QueueDynamicsModel`] for arrivals and green-phase
//!   departures.
//! - [`stats`] -- [`StatsAggregator`] for the smoothed wait time,
//!   throughput and phase-change count.
//! - [`history`] -- Bounded [`HistoryBuffer`] of recent snapshots.
//! - [`engine`] -- [`SimulationEngine`] and the per-tick orchestration.
//! - [`operator`] -- Pause, resume, speed and stop controls.
//! - [`runner`] -- The real-time tick loop.
//!
//! [`UniformSource`]: sampling::UniformSource
//! [`PhaseController`]: phase::PhaseController
//! [`QueueDynamicsModel`]: queue::QueueDynamicsModel
//! [`StatsAggregator`]: stats::StatsAggregator
//! [`HistoryBuffer`]: history::HistoryBuffer
//! [`SimulationEngine`]: engine::SimulationEngine

pub mod clock;
pub mod config;
pub mod engine;
pub mod history;
pub mod operator;
pub mod phase;
pub mod queue;
pub mod runner;
pub mod sampling;
pub mod stats;
