//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read from the observer's [`ObservedState`] copy via the
//! shared [`AppState`]. Responses are serialized copies; nothing here can
//! reach the engine.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/state` | Current engine state and latest snapshot |
//! | `GET` | `/api/history` | Recent snapshots (`?limit=N`) |
//! | `GET` | `/api/health` | Liveness, run id and uptime |
//!
//! [`ObservedState`]: crate::state::ObservedState

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use crossflow_types::Snapshot;

use crate::error::ObserverError;
use crate::state::AppState;

/// Query parameters for the `GET /api/history` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of snapshots to return (default: the whole window).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the intersection state and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let current = state.observed.borrow().engine_state;
    let tick = current.tick;
    let phase = current.phase;
    let ns = format!("{:.1}", current.queues.ns_length);
    let ew = format!("{:.1}", current.queues.ew_length);
    let wait = format!("{:.1}", current.stats.smoothed_wait_time);
    let throughput = current.stats.cumulative_throughput;
    let changes = current.stats.phase_change_count;
    let run_id = state.run_id;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Crossflow Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Crossflow Observer</h1>
    <p class="subtitle">Two-phase intersection -- run {run_id}</p>

    <div>
        <div class="metric">
            <div class="label">Tick</div>
            <div class="value">{tick}</div>
        </div>
        <div class="metric">
            <div class="label">Phase</div>
            <div class="value">{phase}</div>
        </div>
        <div class="metric">
            <div class="label">NS queue</div>
            <div class="value">{ns}</div>
        </div>
        <div class="metric">
            <div class="label">EW queue</div>
            <div class="value">{ew}</div>
        </div>
        <div class="metric">
            <div class="label">Avg wait (s)</div>
            <div class="value">{wait}</div>
        </div>
        <div class="metric">
            <div class="label">Throughput</div>
            <div class="value">{throughput}</div>
        </div>
        <div class="metric">
            <div class="label">Phase changes</div>
            <div class="value">{changes}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/state">/api/state</a> -- Current engine state</li>
        <li>GET <a href="/api/history">/api/history</a> -- Recent snapshots (?limit=N)</li>
        <li>GET <a href="/api/health">/api/health</a> -- Liveness</li>
        <li>GET <a href="/api/operator/status">/api/operator/status</a> -- Run controls</li>
        <li><code>ws://host:port/ws/snapshots</code> -- Live snapshot stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/state
// ---------------------------------------------------------------------------

/// Return the current engine state and the latest snapshot.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let (engine_state, latest) = {
        let observed = state.observed.borrow();
        (observed.engine_state, observed.latest)
    };

    let body = serde_json::json!({
        "run_id": state.run_id,
        "state": serde_json::to_value(engine_state)?,
        "latest": serde_json::to_value(latest)?,
    });
    Ok(Json(body))
}

// ---------------------------------------------------------------------------
// GET /api/history
// ---------------------------------------------------------------------------

/// Return recent snapshots in chronological order.
///
/// # Query Parameters
///
/// - `limit`: return at most this many of the newest snapshots
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    if params.limit == Some(0) {
        return Err(ObserverError::InvalidRequest(
            "limit must be at least 1".to_owned(),
        ));
    }

    let snapshots: Vec<Snapshot> = {
        let observed = state.observed.borrow();
        match params.limit {
            Some(limit) => observed.history.recent(limit).to_vec(),
            None => observed.history.to_vec(),
        }
    };

    Ok(Json(serde_json::json!({
        "count": snapshots.len(),
        "snapshots": serde_json::to_value(snapshots)?,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Liveness probe with the run id, uptime and last tick.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tick = state.observed.borrow().engine_state.tick;

    Json(serde_json::json!({
        "status": "ok",
        "run_id": state.run_id,
        "uptime_seconds": state.uptime_seconds(),
        "tick": tick,
    }))
}
