//! Typed error kinds that map onto the CLI's distinct exit codes. Adapter
//! and CLI glue code otherwise uses `anyhow` freely; these variants exist
//! only where a caller needs to distinguish *kind* of failure, not just
//! report a message.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SolverError {
    /// Malformed input: bad `.hgr` syntax, out-of-range vertex ids, an
    /// edge-count mismatch, or an empty edge. Exit code 64.
    #[error("input error: {0}")]
    Input(String),

    /// A configuration value is self-contradictory or inconsistent with the
    /// instance (e.g. a negative time limit, or an `initial_hitting_set`
    /// that does not actually hit every edge). Detected at solver
    /// construction, before any search runs. Exit code 64.
    #[error("configuration error: {0}")]
    Config(String),

    /// An internal invariant was violated (undo imbalance, a degree-count
    /// mismatch, a negative counter). Should only trip under `debug_assert!`
    /// in test builds. Exit code 70.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SolverError {
    /// The exit code this error should surface as on the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Input(_) | Self::Config(_) => 64,
            Self::Internal(_) => 70,
        }
    }
}
