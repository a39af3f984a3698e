//! Shared geometry primitives for overlay placement.

/// Axis-aligned rectangle in viewport coordinates (CSS pixels).
///
/// Measured rects come back from the host page as floats; placements are
/// rounded to whole pixels just before they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// True when either dimension measures under `min` pixels.
    ///
    /// A rect can transiently collapse mid-reflow; callers treat that as
    /// noise rather than a real target.
    pub fn smaller_than(&self, min: f64) -> bool {
        self.width < min || self.height < min
    }

    /// True when both dimensions strictly exceed the given minimums.
    pub fn exceeds(&self, min_width: f64, min_height: f64) -> bool {
        self.width > min_width && self.height > min_height
    }

    /// Round every component to the nearest whole pixel.
    pub fn rounded(&self) -> PixelRect {
        PixelRect {
            left: self.left.round() as i32,
            top: self.top.round() as i32,
            width: self.width.round().max(0.0) as u32,
            height: self.height.round().max(0.0) as u32,
        }
    }
}

/// A rect snapped to whole pixels, as applied to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}
