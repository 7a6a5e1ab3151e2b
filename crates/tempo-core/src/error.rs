//! Error types for the tempo scheduler

use thiserror::Error;

/// Scheduler errors
///
/// The synchronous surface is defensive: misuse degrades to a logged no-op
/// rather than an error. Only the genuinely fallible edges surface here.
#[derive(Error, Debug)]
pub enum TempoError {
    /// An awaitable delay was cancelled before its time elapsed
    #[error("wait cancelled before the delay elapsed")]
    WaitCancelled,

    /// The frame driver was dropped while a ticker still referenced it
    #[error("frame driver detached: {0}")]
    DriverDetached(String),
}

/// Result type for tempo operations
pub type TempoResult<T> = Result<T, TempoError>;
