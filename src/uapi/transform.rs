//! Buffer Transforms and Blend Modes

use bitflags::bitflags;

bitflags! {
    /// Transform applied to a buffer on its way to the display.
    ///
    /// Rotations are compositions of the primitive bits, so only six
    /// combinations are meaningful; see `Transform::is_defined`.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Transform: u32 {
        const FLIP_H = 1 << 0;
        const FLIP_V = 1 << 1;
        const ROT_90 = 1 << 2;
        const ROT_180 = Self::FLIP_H.bits() | Self::FLIP_V.bits();
        const ROT_270 = Self::ROT_180.bits() | Self::ROT_90.bits();
    }
}

impl Transform {
    /// No transform.
    pub const NONE: Self = Self::empty();

    /// True for exactly none, flip-h, flip-v, rot-90, rot-180 and rot-270.
    pub const fn is_defined(raw: u32) -> bool {
        const NONE: u32 = Transform::NONE.bits();
        const FLIP_H: u32 = Transform::FLIP_H.bits();
        const FLIP_V: u32 = Transform::FLIP_V.bits();
        const ROT_90: u32 = Transform::ROT_90.bits();
        const ROT_180: u32 = Transform::ROT_180.bits();
        const ROT_270: u32 = Transform::ROT_270.bits();
        matches!(raw, NONE | FLIP_H | FLIP_V | ROT_90 | ROT_180 | ROT_270)
    }

    /// Parse a raw wire value, rejecting undefined combinations.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        if Self::is_defined(raw) {
            Some(Self::from_bits_retain(raw))
        } else {
            None
        }
    }
}

/// How a buffer's pixels are combined with what lies beneath.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum BlendType {
    /// Opaque, alpha ignored.
    None = 0,
    /// Color channels already multiplied by alpha.
    Premultiplied = 1,
    /// Color channels not multiplied by alpha.
    Coverage = 2,
}

impl BlendType {
    /// Parse a raw wire value.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Premultiplied),
            2 => Some(Self::Coverage),
            _ => None,
        }
    }

    /// Raw wire value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }
}
