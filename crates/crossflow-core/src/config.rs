//! Configuration loading and typed config structures for the Crossflow
//! simulation.
//!
//! The canonical configuration lives in `crossflow-config.yaml` at the
//! project root. Every section and field is optional; missing values fall
//! back to the defaults below, which reproduce the reference dashboard
//! (10% transition chance, arrivals in `[0, 2)`, wait times in `[10, 30)`,
//! a 20-entry history window, one tick per second).

use std::path::Path;

use serde::Deserialize;

/// Environment variable that overrides `observer.port`.
pub const OBSERVER_PORT_ENV: &str = "CROSSFLOW_OBSERVER_PORT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `crossflow-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SignalConfig {
    /// Run-level settings (name, seed, tick period).
    #[serde(default)]
    pub world: WorldConfig,

    /// Phase controller parameters.
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Queue dynamics parameters.
    #[serde(default)]
    pub queues: QueueConfig,

    /// Statistics and wait-time sampling parameters.
    #[serde(default)]
    pub stats: StatsConfig,

    /// Display history window.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Observer API server settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SignalConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `CROSSFLOW_OBSERVER_PORT` overrides `observer.port` when set to a
    /// valid port number. The result is validated before it is returned.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Applies environment overrides and validates the result.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.observer.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter is inside its meaningful range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability(
            "controller.transition_probability",
            self.controller.transition_probability,
        )?;
        check_probability(
            "stats.throughput_probability",
            self.stats.throughput_probability,
        )?;

        if !(self.stats.ema_alpha > 0.0 && self.stats.ema_alpha <= 1.0) {
            return Err(invalid(format!(
                "stats.ema_alpha must be in (0, 1], got {}",
                self.stats.ema_alpha
            )));
        }
        if !(self.queues.arrival_max.is_finite() && self.queues.arrival_max >= 0.0) {
            return Err(invalid(format!(
                "queues.arrival_max must be finite and >= 0, got {}",
                self.queues.arrival_max
            )));
        }
        if !(self.queues.drain_per_green.is_finite() && self.queues.drain_per_green >= 0.0) {
            return Err(invalid(format!(
                "queues.drain_per_green must be finite and >= 0, got {}",
                self.queues.drain_per_green
            )));
        }
        if !(self.stats.wait_time_min.is_finite() && self.stats.wait_time_min > 0.0) {
            return Err(invalid(format!(
                "stats.wait_time_min must be finite and > 0, got {}",
                self.stats.wait_time_min
            )));
        }
        if !(self.stats.wait_time_max.is_finite()
            && self.stats.wait_time_max > self.stats.wait_time_min)
        {
            return Err(invalid(format!(
                "stats.wait_time_max ({}) must be greater than stats.wait_time_min ({})",
                self.stats.wait_time_max, self.stats.wait_time_min
            )));
        }
        if self.history.capacity == 0 {
            return Err(invalid("history.capacity must be at least 1".to_owned()));
        }
        if self.world.tick_interval_ms == 0 {
            return Err(invalid("world.tick_interval_ms must be at least 1".to_owned()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

fn check_probability(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be in [0, 1], got {value}")))
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable name of the intersection being simulated.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Phase controller configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControllerConfig {
    /// Probability per tick that the phase flips.
    #[serde(default = "default_transition_probability")]
    pub transition_probability: f64,

    /// Minimum ticks a phase stays green before it may flip (0 = no minimum).
    #[serde(default)]
    pub min_green_ticks: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            transition_probability: default_transition_probability(),
            min_green_ticks: 0,
        }
    }
}

/// Queue dynamics configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueueConfig {
    /// Upper bound (exclusive) of per-tick arrivals on each approach.
    #[serde(default = "default_arrival_max")]
    pub arrival_max: f64,

    /// Vehicles discharged per tick from the approach that has green.
    #[serde(default = "default_drain_per_green")]
    pub drain_per_green: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            arrival_max: default_arrival_max(),
            drain_per_green: default_drain_per_green(),
        }
    }
}

/// Statistics and wait-time sampling configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsConfig {
    /// Weight of the newest sample in the wait-time moving average.
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f64,

    /// Probability per tick that one vehicle departs.
    #[serde(default = "default_throughput_probability")]
    pub throughput_probability: f64,

    /// Lower bound (inclusive) of the per-tick wait-time sample, seconds.
    #[serde(default = "default_wait_time_min")]
    pub wait_time_min: f64,

    /// Upper bound (exclusive) of the per-tick wait-time sample, seconds.
    #[serde(default = "default_wait_time_max")]
    pub wait_time_max: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            ema_alpha: default_ema_alpha(),
            throughput_probability: default_throughput_probability(),
            wait_time_min: default_wait_time_min(),
            wait_time_max: default_wait_time_max(),
        }
    }
}

/// History window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Number of most recent snapshots kept for display.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Simulation boundary configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// Observer API server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether the observer server is started.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind to.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl ObserverConfig {
    fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var(OBSERVER_PORT_ENV)
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
        {
            self.port = port;
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingConfig {
    /// Whether structured JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Main & First".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_transition_probability() -> f64 {
    0.10
}

const fn default_arrival_max() -> f64 {
    2.0
}

const fn default_drain_per_green() -> f64 {
    1.0
}

const fn default_ema_alpha() -> f64 {
    0.1
}

const fn default_throughput_probability() -> f64 {
    0.5
}

const fn default_wait_time_min() -> f64 {
    10.0
}

const fn default_wait_time_max() -> f64 {
    30.0
}

const fn default_history_capacity() -> usize {
    20
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}

const fn default_true() -> bool {
    true
}
