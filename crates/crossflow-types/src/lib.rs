//! Shared type definitions for the Crossflow signal simulation.
//!
//! Types defined here are used by the engine, the observer API and the
//! binary. They flow downstream to `TypeScript` via `ts-rs` for the
//! dashboard renderer.
//!
//! # Modules
//!
//! - [`enums`] -- Signal [`Phase`] and approach [`Direction`]
//! - [`structs`] -- Queue state, per-tick snapshots, running statistics
//! - [`ids`] -- [`RunId`] for distinguishing engine runs

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{Direction, Phase};
pub use ids::RunId;
pub use structs::{EngineState, QueueState, Snapshot, StatsState};
