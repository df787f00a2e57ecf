//! Coordinate spaces and rectangle math.
//!
//! Three spaces are in play:
//!
//! - **Normalized page space**: the unit square, origin bottom-left. All
//!   persisted region geometry lives here so it is independent of zoom,
//!   device resolution, and view size.
//! - **View space**: on-screen coordinates, origin top-left, arbitrary units.
//!   Gestures arrive in this space.
//! - **Raster space**: pixel coordinates of a rendered page image, origin
//!   top-left. Recognition results arrive in this space.
//!
//! This module is pure math with no UI or I/O dependency; the placement
//! controller and extraction adapter call through it for every conversion.

/// A rectangle in normalized page space.
///
/// `(x, y)` is the bottom-left corner; all of `x`, `y`, `x + width`,
/// `y + height` are expected to lie in `[0, 1]` (enforce with [`clamped`]).
///
/// [`clamped`]: NormalizedRect::clamped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full unit square (an entire page).
    pub fn full_page() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Grows the rect by `dx` on the left and right and `dy` on the top and
    /// bottom. Negative values shrink; the result is not clamped.
    pub fn expanded(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x - dx,
            y: self.y - dy,
            width: self.width + 2.0 * dx,
            height: self.height + 2.0 * dy,
        }
    }

    /// Clamps the rect into the unit square, shrinking width/height as
    /// needed so `x + width <= 1` and `y + height <= 1`.
    pub fn clamped(&self) -> Self {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        let width = (self.max_x().clamp(0.0, 1.0) - x).max(0.0);
        let height = (self.max_y().clamp(0.0, 1.0) - y).max(0.0);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rect lies entirely within the unit square.
    pub fn is_in_unit_square(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.max_x() <= 1.0 + f32::EPSILON
            && self.max_y() <= 1.0 + f32::EPSILON
    }
}

/// A point in view space (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPoint {
    pub x: f32,
    pub y: f32,
}

impl ViewPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The size of the on-screen view a page is displayed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSize {
    pub width: f32,
    pub height: f32,
}

impl ViewSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in view space. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the axis-aligned rect spanning two corner points, in any
    /// order. Used for drag gestures.
    pub fn from_corners(a: ViewPoint, b: ViewPoint) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn contains(&self, point: ViewPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// A rectangle in raster-pixel space. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RasterRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Converts a view-space rect to normalized page space.
///
/// The vertical flip accounts for the view's top-left origin versus the
/// normalized space's bottom-left origin.
pub fn view_to_normalized(rect: ViewRect, view: ViewSize) -> NormalizedRect {
    NormalizedRect {
        x: rect.x / view.width,
        y: 1.0 - (rect.y + rect.height) / view.height,
        width: rect.width / view.width,
        height: rect.height / view.height,
    }
}

/// Converts a normalized page-space rect to view space. Inverse of
/// [`view_to_normalized`].
pub fn normalized_to_view(rect: NormalizedRect, view: ViewSize) -> ViewRect {
    ViewRect {
        x: rect.x * view.width,
        y: (1.0 - rect.y - rect.height) * view.height,
        width: rect.width * view.width,
        height: rect.height * view.height,
    }
}

/// Converts a raster-pixel rect to normalized page space for an image of
/// `img_width` x `img_height` pixels.
pub fn raster_to_normalized(rect: RasterRect, img_width: u32, img_height: u32) -> NormalizedRect {
    let w = img_width as f32;
    let h = img_height as f32;
    NormalizedRect {
        x: rect.x / w,
        y: 1.0 - (rect.y + rect.height) / h,
        width: rect.width / w,
        height: rect.height / h,
    }
}

/// Converts a normalized page-space rect to raster pixels. Inverse of
/// [`raster_to_normalized`].
pub fn normalized_to_raster(rect: NormalizedRect, img_width: u32, img_height: u32) -> RasterRect {
    let w = img_width as f32;
    let h = img_height as f32;
    RasterRect {
        x: rect.x * w,
        y: (1.0 - rect.y - rect.height) * h,
        width: rect.width * w,
        height: rect.height * h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_view_to_normalized_flips_vertically() {
        // A rect at the top of the view maps to the top of the page, which
        // in bottom-left-origin space means y near 1.
        let view = ViewSize::new(200.0, 400.0);
        let rect = ViewRect::new(0.0, 0.0, 200.0, 40.0);
        let norm = view_to_normalized(rect, view);
        assert!(approx_eq(norm.y, 0.9));
        assert!(approx_eq(norm.height, 0.1));
    }

    #[test]
    fn test_round_trip_view_conversion() {
        let view = ViewSize::new(375.0, 667.0);
        let rect = ViewRect::new(30.0, 120.0, 90.0, 18.0);
        let back = normalized_to_view(view_to_normalized(rect, view), view);
        assert!(approx_eq(back.x, rect.x));
        assert!(approx_eq(back.y, rect.y));
        assert!(approx_eq(back.width, rect.width));
        assert!(approx_eq(back.height, rect.height));
    }

    #[test]
    fn test_clamped_shrinks_overflow() {
        let rect = NormalizedRect::new(0.9, -0.1, 0.3, 0.3).clamped();
        assert!(rect.is_in_unit_square());
        assert!(approx_eq(rect.x, 0.9));
        assert!(approx_eq(rect.width, 0.1));
        assert!(approx_eq(rect.y, 0.0));
        assert!(approx_eq(rect.height, 0.2));
    }

    #[test]
    fn test_expanded() {
        let rect = NormalizedRect::new(0.4, 0.4, 0.2, 0.2).expanded(0.1, 0.05);
        assert!(approx_eq(rect.x, 0.3));
        assert!(approx_eq(rect.width, 0.4));
        assert!(approx_eq(rect.y, 0.35));
        assert!(approx_eq(rect.height, 0.3));
    }

    #[test]
    fn test_from_corners_order_independent() {
        let a = ViewPoint::new(50.0, 80.0);
        let b = ViewPoint::new(10.0, 20.0);
        assert_eq!(
            ViewRect::from_corners(a, b),
            ViewRect::from_corners(b, a)
        );
        let rect = ViewRect::from_corners(a, b);
        assert_eq!(rect.x, 10.0);
        assert_eq!(rect.y, 20.0);
        assert_eq!(rect.width, 40.0);
        assert_eq!(rect.height, 60.0);
    }

    #[test]
    fn test_raster_round_trip() {
        let rect = RasterRect::new(120.0, 40.0, 300.0, 24.0);
        let back = normalized_to_raster(raster_to_normalized(rect, 800, 600), 800, 600);
        assert!(approx_eq(back.x, rect.x));
        assert!(approx_eq(back.y, rect.y));
        assert!(approx_eq(back.width, rect.width));
        assert!(approx_eq(back.height, rect.height));
    }
}
