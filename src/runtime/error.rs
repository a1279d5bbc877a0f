//! Runner error types

use thiserror::Error;

/// Errors raised by the runner itself.
///
/// Failures of submitted units are never wrapped here: they are handed back
/// to the caller of the `submit` that ran them, unchanged.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Concurrency limit below one
    #[error("concurrency limit must be at least 1, got {0}")]
    InvalidLimit(i64),

    /// A unit spawned by `run_all` panicked or was aborted
    #[error("task join failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;
