//! Driver binary for the Skyfleet UAV task allocator.
//!
//! Loads configuration, builds a fleet and task set, runs one allocation
//! pass followed by one refuel pass, audits the event log and prints a
//! status report.
//!
//! # Usage
//!
//! ```text
//! skyfleet-engine [SCENARIO.yaml]
//! ```
//!
//! Without an argument the scenario is generated from the `generator`
//! section of `skyfleet-config.yaml`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `skyfleet-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the allocation engine
//! 4. Load or generate the scenario and register it
//! 5. Run the allocation pass
//! 6. Run the refuel pass
//! 7. Audit the event log and print the report

mod error;
mod report;
mod scenario;

use std::path::{Path, PathBuf};

use skyfleet_core::{
    AllocationEngine, LogFormat, LoggingConfig, NoOpObserver, SkyfleetConfig, verify_events,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::StatusReport;
use crate::scenario::{GeneratorConfig, Scenario};

/// Config file looked up in the working directory.
const CONFIG_FILE: &str = "skyfleet-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, scenario loading or the allocation
/// pass fails, or if the event log fails its audit.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("skyfleet-engine starting");
    info!(
        refuel_threshold = config.scheduler.refuel_threshold,
        station = %config.scheduler.station,
        formula = ?config.scheduler.priority_formula,
        policy = ?config.scheduler.depletion_policy,
        safety_margin_pct = config.scheduler.safety_margin_pct,
        "Configuration loaded"
    );

    // 3. Create the engine.
    let station = config.scheduler.station;
    let mut engine = AllocationEngine::new(config.scheduler)?;

    // 4. Load or generate the scenario.
    let scenario = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!(path = %path.display(), "Reading scenario file");
            Scenario::from_file(&path)?
        }
        None => {
            let generator = GeneratorConfig::from_section(config.generator)?;
            info!(
                seed = generator.seed,
                uav_count = generator.uav_count,
                task_count = generator.task_count,
                "Generating scenario"
            );
            Scenario::generate(&generator, station)?
        }
    };
    scenario.populate(&mut engine)?;

    // 5. Allocate.
    let allocation = engine
        .allocate(&mut NoOpObserver)
        .map_err(EngineError::from)?;

    // 6. Refuel.
    let refuel = engine.refuel_pass(&mut NoOpObserver);
    info!(
        refueled = refuel.refueled.len(),
        stranded = refuel.stranded.len(),
        "Refuel pass complete"
    );

    // 7. Audit and report.
    let audit = verify_events(engine.events(), engine.fleet());
    for violation in audit.violations() {
        warn!(%violation, "Event log audit violation");
    }

    let report = StatusReport {
        engine: &engine,
        allocation: &allocation,
        refuel: &refuel,
        audit: &audit,
    };
    println!("{report}");

    if !audit.is_clean() {
        return Err(EngineError::Audit {
            violations: audit.violations().len(),
        }
        .into());
    }

    info!(
        tasks_assigned = allocation.tasks_assigned,
        open_tasks = engine.open_tasks(),
        "skyfleet-engine shutdown complete"
    );
    Ok(())
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Load the main configuration from `skyfleet-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<SkyfleetConfig, EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        let config = SkyfleetConfig::from_file(config_path)?;
        Ok(config)
    } else {
        let mut config = SkyfleetConfig::default();
        config.logging.apply_env_overrides();
        Ok(config)
    }
}
