//! Rectangle Utilities
//!
//! Axis-aligned integer rectangles as they appear on the wire
//! (`drm_clip_rect`): two corners, exclusive on the far edge.

use bytemuck::{Pod, Zeroable};

/// An axis-aligned rectangle `[x1, x2) x [y1, y2)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct ClipRect {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl ClipRect {
    /// Create a rectangle from its corners.
    #[inline]
    pub const fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle anchored at the origin covering `w` x `h`.
    #[inline]
    pub const fn full(w: u16, h: u16) -> Self {
        Self::new(0, 0, w, h)
    }

    /// Both spans are non-empty.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Horizontal span, zero for a degenerate rectangle.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.x2.saturating_sub(self.x1)
    }

    /// Vertical span, zero for a degenerate rectangle.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.y2.saturating_sub(self.y1)
    }

    /// True when `other` lies entirely within this rectangle.
    #[inline]
    pub const fn contains(&self, other: &Self) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }
}

impl core::fmt::Display for ClipRect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{})({},{})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// True when the rectangles overlap with positive area.
///
/// Rectangles that only share an edge do not intersect.
pub fn rects_intersect(r1: &ClipRect, r2: &ClipRect) -> bool {
    r1.x1 < r2.x2 && r1.x2 > r2.x1 && r1.y1 < r2.y2 && r1.y2 > r2.y1
}
