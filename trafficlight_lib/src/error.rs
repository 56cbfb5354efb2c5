//! Errors raised by the controller and its configuration.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// An error from starting, stopping, or waiting on a [`PhaseController`](crate::controller::PhaseController).
#[derive(Debug, Error)]
pub enum PhaseError {
    /// `start` was called while a cycling task was still running.
    #[error("the cycling task is already running")]
    AlreadyStarted,

    /// The OS refused to create the cycling thread.
    #[error("failed to spawn the cycling thread: {0}")]
    Spawn(#[from] io::Error),

    /// A bounded wait ran out before the awaited phase arrived.
    #[error("timed out after {0:?} waiting for a phase change")]
    Timeout(Duration),

    /// The cycling thread panicked before it could be joined.
    #[error("the cycling task panicked")]
    TaskPanicked,
}

/// An invalid [`ControllerConfig`](crate::config::ControllerConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The dwell range contains no values.
    #[error("dwell range is empty: minimum {min:?} is not below maximum {max:?}")]
    EmptyDwellRange {
        /// The configured lower bound.
        min: Duration,
        /// The configured upper bound.
        max: Duration,
    },

    /// A phase must be held for some time.
    #[error("minimum dwell must be greater than zero")]
    ZeroDwell,

    /// The dwell range extends past the longest supported dwell.
    #[error("maximum dwell {0:?} exceeds the supported limit")]
    DwellTooLarge(Duration),

    /// Thread names cannot contain NUL bytes.
    #[error("thread name {0:?} contains a NUL byte")]
    InvalidThreadName(String),
}
