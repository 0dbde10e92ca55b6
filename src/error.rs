//! Error types for job lifecycle operations.

use thiserror::Error;

/// Errors raised by the job lifecycle layer.
///
/// Single-target operations (start, status, kill) surface these directly.
/// Batch operations record them per target instead of returning them.
#[derive(Debug, Error)]
pub enum JobError {
    /// A required external tool or the supervisor itself is missing.
    #[error("{0}")]
    Environment(String),

    /// The supervisor does not know the referenced unit.
    #[error("unit '{0}' not found")]
    NotFound(String),

    /// The requested action does not fit the unit's current state.
    #[error("unit '{unit}' is not running (state: {state})")]
    State { unit: String, state: String },

    /// The supervisor produced no output at all for a query.
    #[error("failed to query systemctl: {0}")]
    SupervisorUnavailable(String),

    /// Opaque supervisor failure with its raw diagnostic.
    #[error("{context}: {diagnostic}")]
    Supervisor { context: String, diagnostic: String },

    #[error("systemd-run failed for {unit}: {diagnostic}")]
    Launch { unit: String, diagnostic: String },

    #[error("failed to stop {unit}: {diagnostic}")]
    Stop { unit: String, diagnostic: String },

    #[error("failed to clean {unit}: {diagnostic}")]
    Clean { unit: String, diagnostic: String },

    #[error("no command specified")]
    EmptyCommand,

    #[error("failed to execute {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JobError>;
