//! Simulation loop runner with operator controls.
//!
//! [`run_simulation`] is the real-time driver around the pure
//! [`SimulationEngine::tick`]. It adds:
//!
//! - **Bounded runs**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: the operator can halt and continue the loop
//! - **Variable tick period**: adjustable at runtime
//! - **Operator stop**: clean stop via the REST API or Ctrl-C
//!
//! One tick runs per period. Ticks never overlap because the next sleep
//! only starts once the previous tick and its callback have returned.

use std::sync::Arc;

use crossflow_types::{EngineState, Snapshot};
use tokio::time::Duration;
use tracing::{info, warn};

use crate::engine::{SimulationEngine, TickError};
use crate::operator::{OperatorState, SimulationEndReason};
use crate::sampling::UniformSource;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick was rejected.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last snapshot, if any tick completed.
    pub final_snapshot: Option<Snapshot>,
    /// Engine state when the loop stopped.
    pub final_state: EngineState,
    /// Total number of ticks executed by this run.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
///
/// Observers use this to publish the snapshot. It runs on the tick loop,
/// so implementations must not block.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, snapshot: &Snapshot, engine: &SimulationEngine);
}

/// A no-op tick callback for headless runs and tests.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _snapshot: &Snapshot, _engine: &SimulationEngine) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick is rejected. The engine keeps the
/// state from before the rejected tick.
pub async fn run_simulation(
    engine: &mut SimulationEngine,
    source: &mut dyn UniformSource,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_snapshot: Option<Snapshot> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Simulation starting"
    );

    let end_reason = loop {
        if operator.is_paused() {
            info!(tick = engine.tick_count(), "Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        if operator.is_stop_requested() {
            info!("Operator stop requested");
            break SimulationEndReason::OperatorStop;
        }

        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            break SimulationEndReason::MaxRealTimeReached;
        }

        let snapshot = match engine.tick(source) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(tick = engine.tick_count(), %error, "Tick rejected");
                return Err(error.into());
            }
        };
        total_ticks = total_ticks.saturating_add(1);
        last_snapshot = Some(snapshot);

        callback.on_tick(&snapshot, engine);

        // The engine numbers ticks from 1, so `max_ticks = 5` stops right
        // after tick 5.
        if operator.tick_limit_reached(snapshot.tick) {
            info!(
                tick = snapshot.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            break SimulationEndReason::MaxTicksReached;
        }

        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    };

    operator.set_end_reason(end_reason).await;
    Ok(SimulationResult {
        end_reason,
        final_snapshot: last_snapshot,
        final_state: engine.current_state(),
        total_ticks,
    })
}

/// Log the simulation end sequence.
///
/// When the observer is enabled, the HTTP server keeps serving the final
/// state after this returns, until the process is interrupted.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_snapshot.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if result.final_snapshot.is_some() {
        let state = &result.final_state;
        info!(
            tick = state.tick,
            phase = %state.phase,
            ns_length = state.queues.ns_length,
            ew_length = state.queues.ew_length,
            smoothed_wait_time = state.stats.smoothed_wait_time,
            cumulative_throughput = state.stats.cumulative_throughput,
            phase_change_count = state.stats.phase_change_count,
            "Final engine state"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SimulationBoundsConfig;
    use crate::sampling::{FixedSource, ScriptedSource, SeededSource};

    fn operator(max_ticks: u64) -> Arc<OperatorState> {
        let bounds = SimulationBoundsConfig {
            max_ticks,
            max_real_time_seconds: 0,
        };
        Arc::new(OperatorState::new(0, &bounds))
    }

    struct CountingCallback {
        ticks: Vec<u64>,
    }

    impl TickCallback for CountingCallback {
        fn on_tick(&mut self, snapshot: &Snapshot, engine: &SimulationEngine) {
            assert_eq!(engine.tick_count(), snapshot.tick);
            self.ticks.push(snapshot.tick);
        }
    }

    #[tokio::test]
    async fn stops_at_tick_limit() {
        let mut engine = SimulationEngine::new();
        let mut source = SeededSource::new(7);
        let operator = operator(5);

        let result = run_simulation(&mut engine, &mut source, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(result.final_snapshot.map(|s| s.tick), Some(5));
        assert_eq!(result.final_state.tick, 5);
        assert_eq!(
            operator.end_reason().await,
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn callback_sees_every_tick_in_order() {
        let mut engine = SimulationEngine::new();
        let mut source = FixedSource(0.5);
        let operator = operator(4);
        let mut callback = CountingCallback { ticks: Vec::new() };

        let _ = run_simulation(&mut engine, &mut source, &operator, &mut callback)
            .await
            .unwrap();

        assert_eq!(callback.ticks, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn stop_before_first_tick_runs_nothing() {
        let mut engine = SimulationEngine::new();
        let mut source = FixedSource(0.5);
        let operator = operator(0);
        operator.request_stop();

        let result = run_simulation(&mut engine, &mut source, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_snapshot.is_none());
        assert_eq!(engine.tick_count(), 0);
    }

    #[tokio::test]
    async fn paused_run_resumes_and_finishes() {
        let mut engine = SimulationEngine::new();
        let mut source = FixedSource(0.5);
        let operator = operator(3);
        operator.pause();

        let controls = Arc::clone(&operator);
        let mut callback = NoOpCallback;
        let (result, ()) = tokio::join!(
            run_simulation(&mut engine, &mut source, &operator, &mut callback),
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                controls.resume();
            }
        );

        let result = result.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 3);
    }

    #[tokio::test]
    async fn rejected_tick_ends_run_with_error() {
        let mut engine = SimulationEngine::new();
        // Two clean ticks (five draws each), then an out-of-range draw.
        let mut draws = vec![0.5; 10];
        draws.push(1.5);
        let mut source = ScriptedSource::new(draws, 0.5);
        let operator = operator(0);

        let result =
            run_simulation(&mut engine, &mut source, &operator, &mut NoOpCallback).await;

        assert!(matches!(
            result,
            Err(RunnerError::Tick {
                source: TickError::Sample { .. }
            })
        ));
        assert_eq!(engine.tick_count(), 2);
        assert_eq!(engine.history().len(), 2);
    }
}
