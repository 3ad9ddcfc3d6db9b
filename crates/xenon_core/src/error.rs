//! Error types for surfaces and frame flushing

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors raised while producing a frame (layout, paint, composite)
#[derive(Error, Debug)]
pub enum FlushError {
    /// Layout computation failed
    #[error("layout failed: {0}")]
    Layout(String),

    /// Recording draw commands failed
    #[error("paint failed: {0}")]
    Paint(String),

    /// Rasterizing the display list into the target failed
    #[error("composite failed: {0}")]
    Composite(String),

    /// The target buffer does not match the viewport the tree was laid out for
    #[error("target buffer {actual_width}x{actual_height} does not match viewport {expected_width}x{expected_height}")]
    TargetMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Errors raised while allocating pixel storage
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Requested dimensions are zero or not representable
    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    /// Backing storage could not be reserved
    #[error("failed to allocate {bytes} bytes of pixel storage")]
    Allocation {
        bytes: usize,
        #[source]
        source: TryReserveError,
    },
}
