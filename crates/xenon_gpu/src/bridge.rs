//! Frame-to-texture hand-off
//!
//! The UI side marks the texture stale once per completed frame; the 3D
//! renderer's own render call consumes the mark and uploads the buffer as
//! it is at that moment. Several completed frames between two renders
//! collapse into one upload of the newest pixels.

use std::borrow::Cow;

use xenon_core::{PixelBuffer, UvConvention};

use crate::error::{GpuError, Result};

/// Tightly packed RGBA8 rows in texture memory order
#[derive(Debug)]
pub struct FrameView<'a> {
    pub width: u32,
    pub height: u32,
    pub data: Cow<'a, [u8]>,
}

impl<'a> FrameView<'a> {
    /// View `frame` with rows ordered for `convention`
    pub fn new(frame: &'a PixelBuffer, convention: UvConvention) -> Self {
        let data = if convention.flips_rows() {
            Cow::Owned(frame.flipped_rows())
        } else {
            Cow::Borrowed(frame.as_bytes())
        };
        Self {
            width: frame.width(),
            height: frame.height(),
            data,
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(GpuError::InvalidFrameData {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Destination of a texture upload
pub trait TextureUploader {
    fn upload(&mut self, frame: FrameView<'_>) -> Result<()>;
}

/// Tracks whether the displayed texture is behind the UI buffer
#[derive(Debug)]
pub struct TextureBridge {
    convention: UvConvention,
    needs_update: bool,
    uploads: u64,
}

impl TextureBridge {
    pub fn new(convention: UvConvention) -> Self {
        Self {
            convention,
            needs_update: false,
            uploads: 0,
        }
    }

    pub fn convention(&self) -> UvConvention {
        self.convention
    }

    /// Change the orientation; forces the next render to re-upload
    pub fn set_convention(&mut self, convention: UvConvention) {
        if self.convention != convention {
            self.convention = convention;
            self.needs_update = true;
        }
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Called once per completed UI frame
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    /// Uploads performed so far
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Upload `frame` if a newer one completed since the last call
    ///
    /// Returns whether an upload happened. The mark is consumed even when
    /// the upload fails.
    pub fn render(&mut self, frame: &PixelBuffer, uploader: &mut dyn TextureUploader) -> Result<bool> {
        if !std::mem::replace(&mut self.needs_update, false) {
            return Ok(false);
        }

        uploader.upload(FrameView::new(frame, self.convention))?;
        self.uploads += 1;
        tracing::trace!(
            uploads = self.uploads,
            width = frame.width(),
            height = frame.height(),
            "texture uploaded"
        );
        Ok(true)
    }
}

impl Default for TextureBridge {
    fn default() -> Self {
        Self::new(UvConvention::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuTexture;
    use xenon_core::{Color, Vec2};

    #[test]
    fn test_uploads_at_most_once_per_mark() {
        let frame = PixelBuffer::new(4, 4).unwrap();
        let mut texture = CpuTexture::new();
        let mut bridge = TextureBridge::default();

        assert!(!bridge.render(&frame, &mut texture).unwrap());

        bridge.mark_needs_update();
        bridge.mark_needs_update();
        assert!(bridge.render(&frame, &mut texture).unwrap());
        assert!(!bridge.render(&frame, &mut texture).unwrap());
        assert_eq!(texture.uploads(), 1);
        assert_eq!(bridge.uploads(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut frame = PixelBuffer::new(2, 2).unwrap();
        let mut texture = CpuTexture::new();
        let mut bridge = TextureBridge::new(UvConvention::TopLeft);

        frame.blend_rect(0, 0, 2, 2, Color::RED);
        bridge.mark_needs_update();
        frame.blend_rect(0, 0, 2, 2, Color::BLUE);
        bridge.mark_needs_update();

        bridge.render(&frame, &mut texture).unwrap();
        assert_eq!(
            texture.texel_at_uv(Vec2::new(0.5, 0.5)).map(|t| (t.r, t.b)),
            Some((0, 255))
        );
    }

    #[test]
    fn test_bottom_left_flips_rows() {
        let mut frame = PixelBuffer::new(1, 2).unwrap();
        // UI top row red
        frame.blend_rect(0, 0, 1, 1, Color::RED);

        let flipped = FrameView::new(&frame, UvConvention::BottomLeft);
        assert_eq!(&flipped.data[4..8], &[255, 0, 0, 255]);
        let straight = FrameView::new(&frame, UvConvention::TopLeft);
        assert_eq!(&straight.data[0..4], &[255, 0, 0, 255]);
        assert!(matches!(straight.data, Cow::Borrowed(_)));
    }

    #[test]
    fn test_convention_change_forces_upload() {
        let mut bridge = TextureBridge::new(UvConvention::BottomLeft);
        bridge.set_convention(UvConvention::BottomLeft);
        assert!(!bridge.needs_update());
        bridge.set_convention(UvConvention::TopLeft);
        assert!(bridge.needs_update());
    }
}
