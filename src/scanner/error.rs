//! Scanner error and warning types.

use std::time::Duration;

use thiserror::Error;

/// Errors that end the scanner task.
///
/// A single closed or unreachable port is never an error; only failures
/// that prevent a cycle from running at all end up here.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scanner could not allocate the resources needed for a cycle.
    #[error("scheduler failure: {0}")]
    SchedulerFatal(String),

    /// A probe worker panicked or was cancelled unexpectedly.
    #[error("probe worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// A cycle took longer than the scan interval.
///
/// Non-fatal: the scanner logs it and skips the ticks it missed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scan cycle {cycle} took {elapsed:?} (interval {interval:?}), skipping {skipped} tick(s)")]
pub struct ScanCycleOverrun {
    pub cycle: u64,
    pub elapsed: Duration,
    pub interval: Duration,
    pub skipped: u64,
}
