//! Tick callback that updates the Observer API state.
//!
//! After each tick, this callback refreshes the observer's copy of the
//! engine state and broadcasts a [`SnapshotBroadcast`] to all connected
//! `WebSocket` clients. The copy is refreshed on every tick, including the
//! last one before a stop or pause.

use std::sync::Arc;

use chrono::Utc;
use crossflow_core::engine::SimulationEngine;
use crossflow_core::runner::TickCallback;
use crossflow_observer::state::{AppState, SnapshotBroadcast};
use crossflow_types::Snapshot;
use tracing::debug;

/// Callback that bridges the tick loop to the Observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a new observer callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl TickCallback for ObserverCallback {
    fn on_tick(&mut self, snapshot: &Snapshot, engine: &SimulationEngine) {
        // REST readers see the tick before WebSocket clients hear of it.
        self.state
            .record(*snapshot, engine.current_state(), engine.history_buffer());

        let message = SnapshotBroadcast {
            run_id: self.state.run_id,
            snapshot: *snapshot,
            stats: engine.stats(),
            emitted_at: Utc::now(),
        };
        let receivers = self.state.broadcast(&message);
        debug!(tick = snapshot.tick, receivers, "Snapshot broadcast sent");
    }
}
