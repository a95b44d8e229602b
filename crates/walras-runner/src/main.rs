//! Batch runner for the Walras equilibrium solver.
//!
//! Reads a scenario file, solves every economy in it and writes one JSON
//! [`ScenarioReport`](walras_types::ScenarioReport) per line to stdout.
//! Logs go to stderr so the report stream stays machine-readable.
//!
//! # Startup
//!
//! ```text
//! load config --> init logging --> for each scenario:
//!     build economy --> solve --> verify clearing --> print report
//! ```
//!
//! A scenario that fails to build or solve is reported with status
//! `failed` and the run continues. Only configuration and output errors
//! end the process with a non-zero exit code.

mod error;
mod report;

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;

use walras_core::WalrasConfig;
use walras_core::config::{LogFormat, LoggingConfig};
use walras_types::ScenarioStatus;

use crate::error::RunnerError;

/// Environment variable naming the scenario file.
const CONFIG_PATH_ENV: &str = "WALRAS_CONFIG";

/// Scenario file used when `WALRAS_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "walras-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or a report
/// cannot be written.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path();
    let (config, found) = load_config(&config_path)?;
    init_logging(&config.logging);

    info!("walras-runner starting");
    if found {
        info!(path = %config_path.display(), "configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        scenarios = config.scenarios.len(),
        nonsatiation_threshold = config.solver.nonsatiation_threshold,
        wealth_tolerance = config.solver.wealth_tolerance,
        clearing_tolerance = config.solver.clearing_tolerance,
        "solver configured"
    );

    let (solved, failed) = run(&config)?;
    info!(solved, failed, "walras-runner finished");
    Ok(())
}

/// Solve every scenario and stream the reports to stdout.
///
/// Returns the number of solved and failed scenarios.
fn run(config: &WalrasConfig) -> Result<(usize, usize), RunnerError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut solved = 0;
    let mut failed = 0;

    for scenario in &config.scenarios {
        let report = report::run_scenario(scenario, &config.solver);
        match report.status {
            ScenarioStatus::Solved => solved += 1,
            ScenarioStatus::Failed => failed += 1,
        }
        serde_json::to_writer(&mut out, &report)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok((solved, failed))
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the scenario file, falling back to defaults when it does not exist.
///
/// The flag is `false` when defaults were used. Environment overrides apply
/// either way.
fn load_config(path: &Path) -> Result<(WalrasConfig, bool), RunnerError> {
    if path.exists() {
        Ok((WalrasConfig::from_file(path)?, true))
    } else {
        let mut config = WalrasConfig::default();
        config.apply_env_overrides()?;
        Ok((config, false))
    }
}

/// Initialize the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
