//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for per-tick snapshots and the
//! observer's own copy of the engine state that the REST endpoints serve.
//! All state is in memory and starts empty on every run.
//!
//! The copy lives in a [`watch`] channel. Readers only borrow it for a
//! synchronous copy, so the tick loop's update never waits on a client
//! and is never skipped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use crossflow_core::history::HistoryBuffer;
use crossflow_core::operator::OperatorState;
use crossflow_types::{EngineState, RunId, Snapshot, StatsState};
use tokio::sync::{broadcast, watch};

/// Capacity of the broadcast channel for snapshots.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// JSON message pushed over the `WebSocket` once per tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotBroadcast {
    /// The run that produced the snapshot.
    pub run_id: RunId,
    /// The snapshot emitted by the tick.
    pub snapshot: Snapshot,
    /// Running statistics after the tick.
    pub stats: StatsState,
    /// Wall-clock time the observer published the message.
    pub emitted_at: DateTime<Utc>,
}

/// The observer's copy of the engine state served by REST endpoints.
///
/// Replaced wholesale each tick by the engine callback. Handlers only ever
/// read it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedState {
    /// Engine state after the latest tick.
    pub engine_state: EngineState,
    /// The latest snapshot, `None` before the first tick.
    pub latest: Option<Snapshot>,
    /// Recent snapshots, oldest first.
    pub history: HistoryBuffer,
}

impl ObservedState {
    /// Replace the observed copy with the engine's post-tick view.
    pub fn record(
        &mut self,
        snapshot: Snapshot,
        engine_state: EngineState,
        history: &HistoryBuffer,
    ) {
        self.engine_state = engine_state;
        self.latest = Some(snapshot);
        self.history.clone_from(history);
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for per-tick snapshot messages.
    pub tx: broadcast::Sender<SnapshotBroadcast>,
    /// The observer's copy of the engine state (updated each tick).
    ///
    /// Borrows must not be held across an `.await`.
    pub observed: Arc<watch::Sender<ObservedState>>,
    /// Shared operator control state (present when the simulation is running).
    pub operator_state: Option<Arc<OperatorState>>,
    /// Identifier of this engine run.
    pub run_id: RunId,
    /// Wall-clock time the observer state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new application state with an empty observed state.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a new application state with operator control state attached.
    pub fn with_operator(operator: Arc<OperatorState>) -> Self {
        Self::build(Some(operator))
    }

    fn build(operator_state: Option<Arc<OperatorState>>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (observed, _) = watch::channel(ObservedState::default());
        Self {
            tx,
            observed: Arc::new(observed),
            operator_state,
            run_id: RunId::new(),
            started_at: Utc::now(),
        }
    }

    /// Subscribe to the snapshot broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotBroadcast> {
        self.tx.subscribe()
    }

    /// Replace the observed copy with the engine's post-tick view.
    ///
    /// Works with or without watchers and wakes any that are waiting.
    pub fn record(&self, snapshot: Snapshot, engine_state: EngineState, history: &HistoryBuffer) {
        self.observed
            .send_modify(|observed| observed.record(snapshot, engine_state, history));
    }

    /// Watch the observed copy for changes.
    pub fn watch_observed(&self) -> watch::Receiver<ObservedState> {
        self.observed.subscribe()
    }

    /// Publish a snapshot to all connected clients.
    ///
    /// Returns the number of receivers that got the message, 0 when no
    /// client is connected.
    pub fn broadcast(&self, message: &SnapshotBroadcast) -> usize {
        // send only fails when there are zero receivers.
        self.tx.send(message.clone()).unwrap_or(0)
    }

    /// Seconds since this state was created.
    pub fn uptime_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossflow_types::{Phase, QueueState};

    use super::*;

    fn snap(tick: u64) -> Snapshot {
        Snapshot {
            tick,
            phase: Phase::A,
            queues: QueueState::EMPTY,
            wait_time_sample: 20.0,
        }
    }

    fn window(ticks: impl IntoIterator<Item = u64>) -> HistoryBuffer {
        let mut history = HistoryBuffer::default();
        for tick in ticks {
            history.append(snap(tick));
        }
        history
    }

    #[test]
    fn record_replaces_history() {
        let state = AppState::new();
        state.record(snap(1), EngineState::default(), &window([1]));
        state.record(snap(2), EngineState::default(), &window([1, 2]));

        let observed = state.observed.borrow();
        assert_eq!(observed.history.len(), 2);
        assert_eq!(observed.latest.map(|s| s.tick), Some(2));
        assert_eq!(observed.history.recent(1).first().map(|s| s.tick), Some(2));
    }

    #[test]
    fn record_wakes_watchers() {
        let state = AppState::new();
        let mut rx = state.watch_observed();
        assert!(!rx.has_changed().unwrap());

        state.record(snap(1), EngineState::default(), &window([1]));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().latest.map(|s| s.tick), Some(1));
    }

    #[test]
    fn broadcast_without_subscribers_is_not_an_error() {
        let state = AppState::new();
        let message = SnapshotBroadcast {
            run_id: state.run_id,
            snapshot: snap(1),
            stats: StatsState::default(),
            emitted_at: Utc::now(),
        };
        assert_eq!(state.broadcast(&message), 0);

        let mut rx = state.subscribe();
        assert_eq!(state.broadcast(&message), 1);
        assert_eq!(rx.try_recv().unwrap(), message);
    }
}
