//! Scenario loading and generation.
//!
//! A scenario is the fleet and task set for one run. It is either read
//! from a YAML file:
//!
//! ```yaml
//! uavs:
//!   - { id: 1, weight_capacity: 10, energy_capacity: 100, position: { x: 0, y: 0 } }
//! tasks:
//!   - { id: 1, position: { x: 10, y: 0 }, deadline: 100, initial_value: 50, decay_rate: 0.1, weight: 1 }
//! ```
//!
//! or generated from a seed using the `generator` section of
//! `skyfleet-config.yaml`. The same seed always yields the same scenario.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use skyfleet_core::AllocationEngine;
use skyfleet_fleet::{Task, TaskSpec, Uav, UavSpec};
use skyfleet_types::{Position, TaskId, UavId};
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Settings for random scenario generation, loaded from the `generator`
/// section of `skyfleet-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorConfig {
    /// RNG seed.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of UAVs to create.
    #[serde(default = "default_uav_count")]
    pub uav_count: u64,

    /// Number of tasks to create.
    #[serde(default = "default_task_count")]
    pub task_count: u64,

    /// Tasks are placed within this distance of the station on each axis.
    /// Must be positive and at most [`MAX_EXTENT`].
    #[serde(default = "default_extent")]
    pub extent: f64,
}

/// Largest accepted [`GeneratorConfig::extent`].
pub const MAX_EXTENT: f64 = 1.0e9;

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            uav_count: default_uav_count(),
            task_count: default_task_count(),
            extent: default_extent(),
        }
    }
}

impl GeneratorConfig {
    /// Interpret the raw `generator` section of the config file. A missing
    /// section yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] if the section does not
    /// deserialize or fails [`GeneratorConfig::validate`].
    pub fn from_section(section: Option<serde_yml::Value>) -> Result<Self, EngineError> {
        let Some(section) = section else {
            return Ok(Self::default());
        };
        let config: Self = serde_yml::from_value(section).map_err(|e| EngineError::Scenario {
            message: format!("failed to parse generator config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] for an extent that is not a
    /// positive finite number up to [`MAX_EXTENT`].
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.extent.is_finite() || self.extent <= 0.0 || self.extent > MAX_EXTENT {
            return Err(EngineError::Scenario {
                message: format!(
                    "generator extent must be in (0, {MAX_EXTENT}], got {}",
                    self.extent
                ),
            });
        }
        Ok(())
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_uav_count() -> u64 {
    3
}

const fn default_task_count() -> u64 {
    10
}

const fn default_extent() -> f64 {
    50.0
}

// -----------------------------------------------------------------------
// Scenario
// -----------------------------------------------------------------------

/// The UAVs and tasks for one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Scenario {
    /// UAV definitions.
    #[serde(default)]
    pub uavs: Vec<UavSpec>,
    /// Task definitions.
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl Scenario {
    /// Parse a scenario from YAML.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        serde_yml::from_str(yaml).map_err(|e| EngineError::Scenario {
            message: format!("failed to parse scenario YAML: {e}"),
        })
    }

    /// Read and parse a scenario file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Scenario {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&contents)
    }

    /// Build a random scenario around `station`.
    ///
    /// UAVs start at the station. Every generated value is inside the
    /// range the fleet accepts, so the result always validates.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] if `config` fails
    /// [`GeneratorConfig::validate`].
    pub fn generate(config: &GeneratorConfig, station: Position) -> Result<Self, EngineError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let extent = config.extent;

        let uavs = (1..=config.uav_count)
            .map(|id| UavSpec {
                id: UavId::new(id),
                weight_capacity: rng.random_range(5.0..20.0),
                energy_capacity: rng.random_range(extent..extent * 4.0),
                position: station,
            })
            .collect();

        let tasks = (1..=config.task_count)
            .map(|id| TaskSpec {
                id: TaskId::new(id),
                position: Position::new(
                    station.x + rng.random_range(-extent..extent),
                    station.y + rng.random_range(-extent..extent),
                ),
                deadline: rng.random_range(1.0..100.0),
                initial_value: rng.random_range(10.0..100.0),
                decay_rate: rng.random_range(0.0..1.0),
                weight: rng.random_range(0.0..10.0),
            })
            .collect();

        Ok(Self { uavs, tasks })
    }

    /// Validate every entry and register it with `engine`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Fleet`] for the first invalid or duplicate
    /// entry. Entries before it stay registered.
    pub fn populate(self, engine: &mut AllocationEngine) -> Result<(), EngineError> {
        let uav_count = self.uavs.len();
        let task_count = self.tasks.len();
        for spec in self.uavs {
            engine.add_uav(Uav::new(spec)?)?;
        }
        for spec in self.tasks {
            engine.add_task(Task::new(spec)?)?;
        }
        info!(uavs = uav_count, tasks = task_count, "Scenario loaded");
        Ok(())
    }
}
