//! Pixel storage for off-screen rendering

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;
use crate::geometry::{Color, Size};

/// RGBA pixel, 8 bits per channel, straight (non-premultiplied) alpha
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8 {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Source-over blend of `color` onto this pixel
    pub fn blend(&mut self, color: Color) {
        let sa = color.a.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let [sr, sg, sb, _] = color.to_rgba8();
        if sa >= 1.0 {
            *self = Rgba8::new(sr, sg, sb, 255);
            return;
        }

        let da = self.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let mix = |s: u8, d: u8| {
            let s = s as f32 / 255.0;
            let d = d as f32 / 255.0;
            let c = (s * sa + d * da * (1.0 - sa)) / out_a;
            (c * 255.0).round() as u8
        };
        *self = Rgba8::new(
            mix(sr, self.r),
            mix(sg, self.g),
            mix(sb, self.b),
            (out_a * 255.0).round() as u8,
        );
    }
}

impl From<Color> for Rgba8 {
    fn from(color: Color) -> Self {
        let [r, g, b, a] = color.to_rgba8();
        Rgba8::new(r, g, b, a)
    }
}

/// Logical viewport a UI tree lays out against
///
/// `width`/`height` are logical pixels; the backing buffer is `dpr` times
/// larger in each dimension.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self { width, height, dpr }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Physical buffer dimensions for this viewport
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.dpr).round().max(0.0) as u32,
            (self.height * self.dpr).round().max(0.0) as u32,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024.0, 1024.0, 2.0)
    }
}

/// Tightly packed RGBA8 pixel buffer, top-left origin, rows top to bottom
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a transparent buffer
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let data = Self::allocate(width, height)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn allocate(width: u32, height: u32) -> Result<Vec<u8>, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidSize { width, height });
        }
        let bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(SurfaceError::InvalidSize { width, height })?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|source| SurfaceError::Allocation { bytes, source })?;
        data.resize(bytes, 0);
        Ok(data)
    }

    /// Reallocate to new dimensions
    ///
    /// The previous storage is released; contents are reset to transparent.
    /// Returns `false` when the dimensions were unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, SurfaceError> {
        if width == self.width && height == self.height {
            return Ok(false);
        }
        self.data = Self::allocate(width, height)?;
        self.width = width;
        self.height = height;
        Ok(true)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixels(&self) -> &[Rgba8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba8] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Pixel at `(x, y)`, `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels().get(index).copied()
    }

    /// One row of raw bytes, `None` when `y` is out of bounds
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.stride();
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    /// Fill every pixel with one value
    pub fn clear(&mut self, value: Rgba8) {
        self.pixels_mut().fill(value);
    }

    /// Blend `color` over the half-open pixel span `[x0, x1) × [y0, y1)`
    ///
    /// Coordinates are clamped to the buffer.
    pub fn blend_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
        let w = self.width as i64;
        let h = self.height as i64;
        let (x0, x1) = (x0.clamp(0, w), x1.clamp(0, w));
        let (y0, y1) = (y0.clamp(0, h), y1.clamp(0, h));
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let width = self.width as usize;
        let pixels = self.pixels_mut();
        for y in y0 as usize..y1 as usize {
            let row = &mut pixels[y * width + x0 as usize..y * width + x1 as usize];
            for px in row {
                px.blend(color);
            }
        }
    }

    /// True when every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.pixels().iter().all(|p| p.a == 0)
    }

    /// Copy of the data with rows in bottom-to-top order
    pub fn flipped_rows(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(self.stride()).rev() {
            out.extend_from_slice(row);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_size() {
        assert!(matches!(
            PixelBuffer::new(0, 10),
            Err(SurfaceError::InvalidSize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_blend_rect_clamps() {
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        assert!(buf.is_blank());
        buf.blend_rect(-5, 2, 2, 100, Color::RED);
        assert_eq!(buf.pixel(0, 3), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(buf.pixel(2, 3), Some(Rgba8::TRANSPARENT));
        assert_eq!(buf.pixel(0, 1), Some(Rgba8::TRANSPARENT));
    }

    #[test]
    fn test_translucent_blend_over_transparent_keeps_color() {
        let mut px = Rgba8::TRANSPARENT;
        px.blend(Color::rgba(1.0, 0.0, 0.0, 0.5));
        assert_eq!(px, Rgba8::new(255, 0, 0, 128));
    }

    #[test]
    fn test_flipped_rows() {
        let mut buf = PixelBuffer::new(1, 2).unwrap();
        buf.blend_rect(0, 0, 1, 1, Color::WHITE);
        let flipped = buf.flipped_rows();
        assert_eq!(&flipped[0..4], &[0, 0, 0, 0]);
        assert_eq!(&flipped[4..8], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_out_of_range_access_is_none() {
        let mut buf = PixelBuffer::new(3, 2).unwrap();
        buf.blend_rect(0, 1, 3, 2, Color::WHITE);
        assert_eq!(buf.row(1), Some(&[255u8; 12][..]));
        assert_eq!(buf.row(0).map(<[u8]>::len), Some(12));
        assert!(buf.row(2).is_none());
        assert!(buf.row(u32::MAX).is_none());
        assert_eq!(buf.pixel(2, 1), Some(Rgba8::new(255, 255, 255, 255)));
        assert!(buf.pixel(3, 0).is_none());
        assert!(buf.pixel(u32::MAX, u32::MAX).is_none());
    }

    #[test]
    fn test_resize_reports_change() {
        let mut buf = PixelBuffer::new(2, 2).unwrap();
        assert!(!buf.resize(2, 2).unwrap());
        assert!(buf.resize(3, 1).unwrap());
        assert_eq!(buf.as_bytes().len(), 12);
    }

    #[test]
    fn test_viewport_physical_size() {
        assert_eq!(Viewport::new(512.0, 256.0, 2.0).physical_size(), (1024, 512));
        assert_eq!(Viewport::new(100.0, 100.0, 1.5).physical_size(), (150, 150));
    }
}
