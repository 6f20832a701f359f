//! Engine binary for the Crossflow signal simulation.
//!
//! This is the main entry point that wires together the simulation engine,
//! the seeded random source, operator controls and the observer API. It
//! loads configuration, initializes all subsystems, and runs the tick loop
//! until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `crossflow-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine and the seeded random source
//! 4. Create operator state from the simulation bounds
//! 5. Start the Observer API server (if enabled)
//! 6. Install the Ctrl-C handler
//! 7. Run the tick loop
//! 8. Log the result
//! 9. Keep serving the final state until Ctrl-C (when the observer runs)

mod error;
mod observer_callback;

use std::path::Path;
use std::sync::Arc;

use crossflow_core::config::{LoggingConfig, SignalConfig};
use crossflow_core::engine::SimulationEngine;
use crossflow_core::operator::OperatorState;
use crossflow_core::runner::{self, NoOpCallback, TickCallback};
use crossflow_core::sampling::SeededSource;
use crossflow_observer::server::ServerConfig;
use crossflow_observer::state::AppState;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer_callback::ObserverCallback;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "crossflow-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the observer cannot bind,
/// or the tick loop stops on a rejected tick.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember whether
    //    the file was found and report it below.
    let (config, found) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);

    info!("crossflow-engine starting");
    if !found {
        warn!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        transition_probability = config.controller.transition_probability,
        min_green_ticks = config.controller.min_green_ticks,
        history_capacity = config.history.capacity,
        "Configuration loaded"
    );

    // 3. Build the engine and its random source.
    let mut engine = SimulationEngine::from_config(&config);
    let mut source = SeededSource::new(config.world.seed);

    // 4. Create operator state.
    let operator = Arc::new(OperatorState::new(
        config.world.tick_interval_ms,
        &config.simulation,
    ));
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );

    // 5. Start the Observer API server.
    let mut observer_handle = None;
    let mut callback: Box<dyn TickCallback> = if config.observer.enabled {
        let app_state = Arc::new(AppState::with_operator(Arc::clone(&operator)));
        let server_config = ServerConfig::from(&config.observer);
        observer_handle = Some(
            crossflow_observer::startup::spawn_observer(&server_config, Arc::clone(&app_state))
                .await
                .map_err(EngineError::from)?,
        );
        info!(
            run_id = %app_state.run_id,
            host = server_config.host,
            port = server_config.port,
            "Observer API server started"
        );
        Box::new(ObserverCallback::new(app_state))
    } else {
        info!("Observer disabled, running headless");
        Box::new(NoOpCallback)
    };

    // 6. Ctrl-C requests a clean stop after the current tick and marks
    //    the process as interrupted.
    let (interrupted_tx, mut interrupted) = watch::channel(false);
    let signal_operator = Arc::clone(&operator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping simulation");
            signal_operator.request_stop();
            interrupted_tx.send_replace(true);
        }
    });

    // 7. Run the simulation.
    let result =
        runner::run_simulation(&mut engine, &mut source, &operator, callback.as_mut())
            .await
            .map_err(EngineError::from)?;

    // 8. Log results.
    runner::log_simulation_end(&result);

    // 9. The observer keeps answering with the final state until the
    //    process is interrupted.
    if let Some(handle) = observer_handle {
        if !*interrupted.borrow() {
            info!("Simulation finished, observer still serving; press Ctrl-C to exit");
            // An error means the signal task is gone, so nothing can wake us.
            let _ = interrupted.wait_for(|flag| *flag).await;
        }
        handle.abort();
    }

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "crossflow-engine shutdown complete"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.is_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the simulation configuration from `crossflow-config.yaml`.
///
/// Looks for the file relative to the current working directory. Returns
/// the configuration and whether the file existed. A missing file yields
/// the defaults, still subject to environment overrides.
fn load_config() -> Result<(SignalConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((SignalConfig::from_file(config_path)?, true))
    } else {
        Ok((SignalConfig::parse("")?, false))
    }
}
