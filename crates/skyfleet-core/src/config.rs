//! Configuration loading and typed config structures for the allocator.
//!
//! The canonical configuration lives in `skyfleet-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a
//! loader that reads and validates the file. Every key is optional:
//!
//! ```yaml
//! scheduler:
//!   refuel_threshold: 10.0
//!   station: { x: 0.0, y: 0.0 }
//!   safety_margin_pct: 0.0
//!   priority_formula: value_urgency_distance   # or value_distance
//!   depletion_policy: clamp                    # or reject
//!   current_time: 0.0
//! logging:
//!   level: info
//!   format: pretty                             # or json
//! ```

use std::path::Path;

use serde::Deserialize;
use skyfleet_types::{DepletionPolicy, Position, PriorityFormula};

/// Environment variable that overrides `logging.level`.
pub const LOG_LEVEL_ENV: &str = "SKYFLEET_LOG_LEVEL";

/// Errors that can occur when loading or validating configuration.
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

    /// A value is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending key.
        field: &'static str,
        /// The constraint that was violated.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SkyfleetConfig {
    /// Allocation engine parameters.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Raw `generator` section, interpreted by the driver binary.
    #[serde(default)]
    pub generator: Option<serde_yml::Value>,
}

impl SkyfleetConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// [`LOG_LEVEL_ENV`] overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML and
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML and
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.scheduler.validate()?;
        Ok(config)
    }
}

/// Allocation engine parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchedulerConfig {
    /// UAVs stop taking tasks once energy is at or below this value, and
    /// the refuel pass refuels UAVs strictly below it (default: 10).
    #[serde(default = "default_refuel_threshold")]
    pub refuel_threshold: f64,

    /// The refuel station (default: origin).
    #[serde(default)]
    pub station: Position,

    /// Percentage of energy capacity kept in reserve when checking whether
    /// a UAV can reach a task and return (default: 0, off).
    #[serde(default)]
    pub safety_margin_pct: f64,

    /// Task ranking formula.
    #[serde(default)]
    pub priority_formula: PriorityFormula,

    /// What happens when a debit exceeds remaining energy.
    #[serde(default)]
    pub depletion_policy: DepletionPolicy,

    /// The instant at which task values are evaluated. Fixed for a pass.
    #[serde(default)]
    pub current_time: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refuel_threshold: default_refuel_threshold(),
            station: Position::ORIGIN,
            safety_margin_pct: 0.0,
            priority_formula: PriorityFormula::default(),
            depletion_policy: DepletionPolicy::default(),
            current_time: 0.0,
        }
    }
}

impl SchedulerConfig {
    /// Create a config with the given threshold and station and defaults
    /// for everything else.
    pub fn new(refuel_threshold: f64, station: Position) -> Self {
        Self {
            refuel_threshold,
            station,
            ..Self::default()
        }
    }

    /// Check every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.refuel_threshold.is_finite() && self.refuel_threshold > 0.0) {
            return Err(ConfigError::Invalid {
                field: "scheduler.refuel_threshold",
                reason: format!("must be positive, got {}", self.refuel_threshold),
            });
        }
        if !self.station.is_finite() {
            return Err(ConfigError::Invalid {
                field: "scheduler.station",
                reason: format!("coordinates must be finite, got {}", self.station),
            });
        }
        if !(0.0..100.0).contains(&self.safety_margin_pct) {
            return Err(ConfigError::Invalid {
                field: "scheduler.safety_margin_pct",
                reason: format!(
                    "must be in [0, 100), got {}",
                    self.safety_margin_pct
                ),
            });
        }
        if !(self.current_time.is_finite() && self.current_time >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "scheduler.current_time",
                reason: format!("must be non-negative, got {}", self.current_time),
            });
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Override the level with [`LOG_LEVEL_ENV`] when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(LOG_LEVEL_ENV) {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

const fn default_refuel_threshold() -> f64 {
    10.0
}

fn default_log_level() -> String {
    String::from("info")
}
