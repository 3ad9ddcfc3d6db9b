//! Platform error types

use thiserror::Error;

/// Frame driver errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// One or more frame callbacks failed during a tick
    ///
    /// The remaining callbacks of the tick still ran; `first` is the first
    /// failure.
    #[error("{failures} frame callback(s) failed: {first:#}")]
    Callback {
        failures: usize,
        first: anyhow::Error,
    },

    /// A tick was started from inside a running tick
    #[error("frame executed re-entrantly from inside a frame callback")]
    Reentrant,

    /// The host supplied a NaN or infinite timestamp
    #[error("invalid frame timestamp: {0}")]
    InvalidTimestamp(f64),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
