//! Error types for the watcher
//!
//! Every variant is fatal to the process. They are kept distinct so callers
//! and tests can tell a bad executor name from a broken executor binary.

use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that end the watch loop
#[derive(Debug, Error)]
pub enum WatchError {
    /// The configured executor name has no backend.
    #[error("container executor '{0}' is not supported (expected one of: docker, podman)")]
    UnsupportedExecutor(String),

    /// The executor binary could not be started.
    #[error("failed to execute ps with {executor}: {source}")]
    Invocation {
        executor: String,
        #[source]
        source: std::io::Error,
    },

    /// The executor ran but exited unsuccessfully.
    #[error("{executor} ps exited with {status}: {stderr}")]
    ExecutorFailed {
        executor: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The executor output could not be turned into container records.
    #[error("{executor} sent invalid output: {reason}")]
    Decode { executor: String, reason: String },

    /// The metrics listener could not be bound.
    #[error("failed to bind metrics server on {addr}: {source}")]
    MetricsBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The metrics server failed while serving.
    #[error("metrics server error: {0}")]
    MetricsServer(#[source] std::io::Error),

    /// The metrics server task ended on its own.
    #[error("metrics server stopped unexpectedly")]
    MetricsServerExited,

    /// A metric instrument could not be created or registered.
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Broad classification of a [`WatchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Invocation,
    Decode,
    Transport,
}

impl WatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WatchError::UnsupportedExecutor(_) | WatchError::Metrics(_) => {
                ErrorCategory::Configuration
            }
            WatchError::Invocation { .. } | WatchError::ExecutorFailed { .. } => {
                ErrorCategory::Invocation
            }
            WatchError::Decode { .. } => ErrorCategory::Decode,
            WatchError::MetricsBind { .. }
            | WatchError::MetricsServer(_)
            | WatchError::MetricsServerExited => ErrorCategory::Transport,
        }
    }

    pub(crate) fn decode(executor: &str, reason: impl Into<String>) -> Self {
        WatchError::Decode {
            executor: executor.to_string(),
            reason: reason.into(),
        }
    }
}
