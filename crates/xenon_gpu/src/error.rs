//! Texture bridge error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpuError {
    /// Frame and texture sizes disagree; resize the target first
    #[error("frame dimensions {frame_width}x{frame_height} don't match texture {texture_width}x{texture_height}")]
    DimensionMismatch {
        frame_width: u32,
        frame_height: u32,
        texture_width: u32,
        texture_height: u32,
    },

    /// Byte length does not match `width * height * 4`
    #[error("frame data is {actual} bytes, expected {expected}")]
    InvalidFrameData { expected: usize, actual: usize },

    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

pub type Result<T> = std::result::Result<T, GpuError>;
