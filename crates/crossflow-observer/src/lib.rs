//! Observer API server for the Crossflow signal simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/snapshots`) streaming one JSON
//!   snapshot per tick via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the current engine state, the recent history
//!   window and liveness
//! - **Operator REST endpoints** for runtime control (pause, resume,
//!   speed, status, stop)
//! - **Minimal HTML status page** (`GET /`) with the current phase, queue
//!   lengths and statistics
//!
//! # Architecture
//!
//! The observer reads from its own copy of the engine state
//! ([`ObservedState`]) that the tick callback refreshes after every tick.
//! Handlers never touch the engine, so nothing a client does can mutate
//! simulation state or stall the tick loop.
//!
//! [`ObservedState`]: state::ObservedState

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, ObservedState, SnapshotBroadcast};
