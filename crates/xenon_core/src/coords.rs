//! Texture coordinate ↔ UI pixel mapping
//!
//! The off-screen buffer has a top-left origin with rows stored top to
//! bottom. Textured quads in the 3D layer report ray hits as normalized
//! `(u, v)`. Whichever orientation is chosen here must be used both when
//! uploading the texture and when mapping hits back to pixels, otherwise
//! rendering and hit testing disagree about where a point is.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size, Vec2};

/// Orientation of the displayed texture relative to the pixel buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvConvention {
    /// `v = 0` is the bottom edge of the displayed image.
    ///
    /// Rows are flipped on upload; `y = (1 - v) * H`.
    #[default]
    BottomLeft,
    /// `v = 0` is the top edge of the displayed image.
    ///
    /// Rows are uploaded as-is and the quad is mirrored on Y; `y = v * H`.
    TopLeft,
}

impl UvConvention {
    /// Map a normalized hit coordinate to a position in a `size` pixel space
    pub fn uv_to_pixel(self, uv: Vec2, size: Size) -> Point {
        let y = match self {
            UvConvention::BottomLeft => (1.0 - uv.y) * size.height,
            UvConvention::TopLeft => uv.y * size.height,
        };
        Point::new(uv.x * size.width, y)
    }

    /// Exact inverse of [`uv_to_pixel`](Self::uv_to_pixel)
    pub fn pixel_to_uv(self, point: Point, size: Size) -> Vec2 {
        let u = if size.width > 0.0 {
            point.x / size.width
        } else {
            0.0
        };
        let t = if size.height > 0.0 {
            point.y / size.height
        } else {
            0.0
        };
        let v = match self {
            UvConvention::BottomLeft => 1.0 - t,
            UvConvention::TopLeft => t,
        };
        Vec2::new(u, v)
    }

    /// Whether buffer rows must be reversed when uploading to the texture
    pub fn flips_rows(self) -> bool {
        matches!(self, UvConvention::BottomLeft)
    }

    /// Scale to apply to the displayed quad
    pub fn quad_scale(self) -> Vec2 {
        match self {
            UvConvention::BottomLeft => Vec2::ONE,
            UvConvention::TopLeft => Vec2::new(1.0, -1.0),
        }
    }
}

/// Map a client-space position over a displayed image to native pixels
///
/// `display` is the image's on-screen rect; `native` is the UI's logical
/// size. Returns `None` for a degenerate display rect.
pub fn client_to_pixel(client: Point, display: Rect, native: Size) -> Option<Point> {
    if display.size.is_empty() {
        return None;
    }
    Some(Point::new(
        (client.x - display.x()) / display.width() * native.width,
        (client.y - display.y()) / display.height() * native.height,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_bottom_left_flips_v() {
        let size = Size::new(1000.0, 500.0);
        let p = UvConvention::BottomLeft.uv_to_pixel(Vec2::new(0.25, 0.0), size);
        assert_eq!(p, Point::new(250.0, 500.0));
        let p = UvConvention::BottomLeft.uv_to_pixel(Vec2::new(0.25, 1.0), size);
        assert_eq!(p, Point::new(250.0, 0.0));
    }

    #[test]
    fn test_top_left_keeps_v() {
        let size = Size::new(1000.0, 500.0);
        let p = UvConvention::TopLeft.uv_to_pixel(Vec2::new(0.5, 0.1), size);
        assert!(approx(p.x, 500.0) && approx(p.y, 50.0));
        assert_eq!(UvConvention::TopLeft.quad_scale(), Vec2::new(1.0, -1.0));
        assert!(!UvConvention::TopLeft.flips_rows());
    }

    #[test]
    fn test_inverse_for_grid() {
        let size = Size::new(640.0, 480.0);
        for convention in [UvConvention::BottomLeft, UvConvention::TopLeft] {
            for i in 0..=10 {
                for j in 0..=10 {
                    let uv = Vec2::new(i as f32 / 10.0, j as f32 / 10.0);
                    let back = convention.pixel_to_uv(convention.uv_to_pixel(uv, size), size);
                    assert!(approx(back.x, uv.x) && approx(back.y, uv.y), "{convention:?} {uv:?}");
                }
            }
        }
    }

    #[test]
    fn test_client_to_pixel_scales_by_display_ratio() {
        let display = Rect::new(100.0, 50.0, 256.0, 256.0);
        let p = client_to_pixel(Point::new(228.0, 114.0), display, Size::new(512.0, 512.0));
        assert_eq!(p, Some(Point::new(256.0, 128.0)));
        assert_eq!(
            client_to_pixel(Point::ZERO, Rect::ZERO, Size::new(1.0, 1.0)),
            None
        );
    }

    #[test]
    fn test_convention_serde_names() {
        let json = serde_json::to_string(&UvConvention::TopLeft).unwrap();
        assert_eq!(json, "\"top_left\"");
    }
}
