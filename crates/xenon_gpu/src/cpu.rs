//! Software texture target
//!
//! Mirrors what a GPU texture would hold after an upload, so hosts without
//! a device (and tests) can sample the displayed image.

use xenon_core::{Rgba8, Vec2};

use crate::bridge::{FrameView, TextureUploader};
use crate::error::Result;

/// In-memory RGBA8 texture
///
/// Resizes itself to whatever frame it receives. Texture row 0 is sampled
/// at `v = 0`, as on a GPU.
#[derive(Clone, Debug, Default)]
pub struct CpuTexture {
    width: u32,
    height: u32,
    data: Vec<u8>,
    uploads: u64,
}

impl CpuTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Nearest texel at texture coordinates `uv`, `None` before the first upload
    pub fn texel_at_uv(&self, uv: Vec2) -> Option<Rgba8> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let x = ((uv.x * self.width as f32).floor() as i64).clamp(0, self.width as i64 - 1) as usize;
        let y = ((uv.y * self.height as f32).floor() as i64).clamp(0, self.height as i64 - 1) as usize;
        let pixels: &[Rgba8] = bytemuck::cast_slice(&self.data);
        pixels.get(y * self.width as usize + x).copied()
    }
}

impl TextureUploader for CpuTexture {
    fn upload(&mut self, frame: FrameView<'_>) -> Result<()> {
        frame.validate()?;
        self.width = frame.width;
        self.height = frame.height;
        self.data.clear();
        self.data.extend_from_slice(&frame.data);
        self.uploads += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GpuError;
    use std::borrow::Cow;

    #[test]
    fn test_rejects_short_data() {
        let mut texture = CpuTexture::new();
        let frame = FrameView {
            width: 2,
            height: 2,
            data: Cow::Owned(vec![0; 8]),
        };
        assert!(matches!(
            texture.upload(frame),
            Err(GpuError::InvalidFrameData { expected: 16, actual: 8 })
        ));
        assert_eq!(texture.texel_at_uv(Vec2::ZERO), None);
    }

    #[test]
    fn test_samples_rows_from_v_zero() {
        let mut texture = CpuTexture::new();
        let mut data = vec![0u8; 8];
        data[4..8].copy_from_slice(&[9, 9, 9, 255]);
        texture
            .upload(FrameView {
                width: 1,
                height: 2,
                data: Cow::Owned(data),
            })
            .unwrap();

        assert_eq!(texture.texel_at_uv(Vec2::new(0.5, 0.25)), Some(Rgba8::TRANSPARENT));
        assert_eq!(texture.texel_at_uv(Vec2::new(0.5, 0.75)), Some(Rgba8::new(9, 9, 9, 255)));
        // Out-of-range coordinates clamp to the edge
        assert_eq!(texture.texel_at_uv(Vec2::new(0.5, 1.0)), Some(Rgba8::new(9, 9, 9, 255)));
    }
}
