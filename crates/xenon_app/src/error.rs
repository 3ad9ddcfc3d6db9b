//! Error types for xenon_app

use thiserror::Error;
use xenon_core::{FlushError, SurfaceError};
use xenon_gpu::GpuError;
use xenon_layout::LayoutError;
use xenon_platform::PlatformError;

/// Errors that can occur while hosting a Xenon root
#[derive(Error, Debug)]
pub enum XenonError {
    /// Off-screen surface could not be created or resized
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// Layout, paint or composite failed during a flush
    #[error("Frame flush failed: {0}")]
    Flush(#[from] FlushError),

    /// Building the UI tree failed
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Texture upload failed
    #[error("Texture error: {0}")]
    Gpu(#[from] GpuError),

    /// Frame driver reported a failure
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for `XenonConfig`
    #[error("Config parse failed: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config parsed but holds unusable values
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The operation needs a mounted root
    #[error("No UI root is mounted")]
    NotMounted,

    /// PNG encoding of a frame failed
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Snapshot serialization failed
    #[error("Snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for XenonError {
    fn from(err: anyhow::Error) -> Self {
        XenonError::Other(format!("{err:#}"))
    }
}

/// Result type for xenon_app operations
pub type Result<T> = std::result::Result<T, XenonError>;
