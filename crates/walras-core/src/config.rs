//! Configuration loading and typed config structures for scenario runs.
//!
//! A scenario file (`walras-config.yaml` by default) holds solver settings,
//! logging settings and a list of named economies. This module defines
//! strongly-typed structs that mirror the YAML structure, and provides a
//! loader that reads the file and applies environment overrides.

use std::path::Path;

use serde::Deserialize;

use walras_types::EconomySpec;

use crate::clearing::DEFAULT_CLEARING_TOLERANCE;
use crate::economy::{DEFAULT_NONSATIATION_THRESHOLD, DEFAULT_WEALTH_TOLERANCE, Economy};
use crate::error::EquilibriumError;

/// Environment variable overriding `solver.nonsatiation_threshold`.
pub const THRESHOLD_ENV: &str = "WALRAS_NONSATIATION_THRESHOLD";

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "WALRAS_LOG_LEVEL";

/// Why a scenario file could not be turned into a [`WalrasConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The scenario file exists but could not be read.
    #[error("cannot read scenario file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The scenario file is not valid YAML or does not match the schema.
    #[error("malformed scenario file: {source}")]
    Yaml {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// A `WALRAS_*` override is not a number.
    #[error("invalid value {value:?} for {variable}: {source}")]
    InvalidOverride {
        /// The environment variable name.
        variable: &'static str,
        /// The rejected value.
        value: String,
        /// The underlying parse error.
        source: std::num::ParseFloatError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scenario-run configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WalrasConfig {
    /// Solver validation and integrity-check settings.
    #[serde(default)]
    pub solver: SolverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Economies to solve, in order.
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

impl WalrasConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `WALRAS_NONSATIATION_THRESHOLD` overrides `solver.nonsatiation_threshold`
    /// - `WALRAS_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] for an unparseable override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string, without env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for an unparseable threshold.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for an unparseable threshold.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup(THRESHOLD_ENV) {
            self.solver.nonsatiation_threshold =
                val.trim().parse().map_err(|source| ConfigError::InvalidOverride {
                    variable: THRESHOLD_ENV,
                    value: val.clone(),
                    source,
                })?;
        }
        if let Some(val) = lookup(LOG_LEVEL_ENV) {
            self.logging.level = val;
        }
        Ok(())
    }
}

/// Solver settings shared by every scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolverConfig {
    /// Margin by which bliss points must dominate `Π e_i`.
    #[serde(default = "default_nonsatiation_threshold")]
    pub nonsatiation_threshold: f64,

    /// Absolute tolerance on `Σ W_i`.
    #[serde(default = "default_wealth_tolerance")]
    pub wealth_tolerance: f64,

    /// Absolute tolerance for the post-solve clearing and budget checks.
    #[serde(default = "default_clearing_tolerance")]
    pub clearing_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            nonsatiation_threshold: default_nonsatiation_threshold(),
            wealth_tolerance: default_wealth_tolerance(),
            clearing_tolerance: default_clearing_tolerance(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// One named economy to solve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario name, echoed in the report.
    pub name: String,

    /// Per-scenario override of the non-satiation threshold.
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Preferences and consumers.
    #[serde(flatten)]
    pub economy: EconomySpec,
}

impl ScenarioConfig {
    /// The threshold in force for this scenario.
    pub fn effective_threshold(&self, solver: &SolverConfig) -> f64 {
        self.threshold.unwrap_or(solver.nonsatiation_threshold)
    }

    /// Build the scenario's economy under the given solver settings.
    ///
    /// # Errors
    ///
    /// Any construction error from [`Economy::from_spec`].
    pub fn build(&self, solver: &SolverConfig) -> Result<Economy, EquilibriumError> {
        Economy::from_spec(
            &self.economy,
            self.effective_threshold(solver),
            solver.wealth_tolerance,
        )
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_nonsatiation_threshold() -> f64 {
    DEFAULT_NONSATIATION_THRESHOLD
}

const fn default_wealth_tolerance() -> f64 {
    DEFAULT_WEALTH_TOLERANCE
}

const fn default_clearing_tolerance() -> f64 {
    DEFAULT_CLEARING_TOLERANCE
}

fn default_log_level() -> String {
    "info".to_owned()
}
