//! Error types for the scenario runner binary.
//!
//! [`RunnerError`] wraps the failure modes that abort a whole run. A
//! scenario whose economy is invalid or infeasible is not an error here:
//! it becomes a `failed` report and the run continues.

/// Top-level error for the runner binary.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: walras_core::ConfigError,
    },

    /// A report could not be serialized.
    #[error("report serialization failed: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Writing a report to stdout failed.
    #[error("failed to write report: {source}")]
    Output {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
