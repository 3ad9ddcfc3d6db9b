//! Off-screen canvas host

use xenon_core::{PixelBuffer, Size, SurfaceError, Viewport};

use crate::error::Result;

/// Pixel surface a UI root paints into
///
/// The UI lays out in logical pixels; the buffer holds
/// `round(width * dpr) x round(height * dpr)` physical pixels.
#[derive(Debug)]
pub struct OffscreenSurface {
    viewport: Viewport,
    buffer: PixelBuffer,
}

impl OffscreenSurface {
    pub fn new(width: u32, height: u32, dpr: f32) -> Result<Self> {
        let viewport = checked_viewport(width, height, dpr)?;
        let (w, h) = viewport.physical_size();
        let buffer = PixelBuffer::new(w, h)?;
        tracing::debug!(width, height, dpr, physical_width = w, physical_height = h, "surface created");
        Ok(Self { viewport, buffer })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Logical size in UI pixels
    pub fn size(&self) -> Size {
        self.viewport.size()
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    /// Change logical size and pixel ratio
    ///
    /// Returns false when nothing changed. The buffer is reallocated only
    /// when its physical size changes.
    pub fn resize(&mut self, width: u32, height: u32, dpr: f32) -> Result<bool> {
        let viewport = checked_viewport(width, height, dpr)?;
        if viewport == self.viewport {
            return Ok(false);
        }
        let (w, h) = viewport.physical_size();
        self.buffer.resize(w, h)?;
        self.viewport = viewport;
        tracing::debug!(width, height, dpr, "surface resized");
        Ok(true)
    }
}

fn checked_viewport(width: u32, height: u32, dpr: f32) -> std::result::Result<Viewport, SurfaceError> {
    let viewport = Viewport::new(width as f32, height as f32, dpr);
    let (w, h) = viewport.physical_size();
    if width == 0 || height == 0 || !dpr.is_finite() || dpr <= 0.0 || w == 0 || h == 0 {
        return Err(SurfaceError::InvalidSize { width, height });
    }
    Ok(viewport)
}
