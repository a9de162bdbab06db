//! Caller-Visible Record Layouts
//!
//! Byte-exact layouts of everything the validation control operation
//! reads out of caller memory, plus the control codes themselves.
//!
//! # Request Layout
//! ```text
//! ValidateConfigExt (32 bytes, packed)
//! ┌──────────────┬────────────┬────────┬────────┬──────────┐
//! │ n_interfaces │ interfaces │ n_bufs │  bufs  │ post_ext │
//! │     u32      │    ptr     │  u32   │  ptr   │   ptr    │
//! └──────────────┴────────────┴────────┴────────┴──────────┘
//!
//! post_ext payload
//! ┌──────────────┬──────────────────────────────────────────┐
//! │ PostExtHeader│ BufferConfigExt x n_bufs                 │
//! └──────────────┴──────────────────────────────────────────┘
//! ```

mod transform;

pub use transform::{BlendType, Transform};

use core::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::geometry::ClipRect;

/// Maximum memory planes per buffer.
pub const MAX_PLANES: usize = 4;

/// Maximum buffers in one request (one page of buffer configs).
pub const MAX_BUFFERS: usize = 4096 / size_of::<BufferConfig>();

/// Maximum interfaces in one request (one page of IDs).
pub const MAX_INTERFACES: usize = 4096 / size_of::<u32>();

/// Plane alpha for a fully opaque plane.
pub const PLANE_ALPHA_OPAQUE: u8 = 0xff;

/// Canonical validation request.
///
/// Pointer fields are caller addresses, never dereferenced directly.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C, packed)]
pub struct ValidateConfigExt {
    pub n_interfaces: u32,
    /// `u32` interface IDs.
    pub interfaces: u64,
    pub n_bufs: u32,
    /// `BufferConfig` records.
    pub bufs: u64,
    /// `PostExtHeader` followed by one `BufferConfigExt` per buffer.
    pub post_ext: u64,
}

const _: () = assert!(
    size_of::<ValidateConfigExt>() == 32,
    "ValidateConfigExt has unexpected size"
);

/// Validation request as laid out by 32-bit callers.
#[cfg(feature = "compat")]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C, packed)]
pub struct ValidateConfigExt32 {
    pub n_interfaces: u32,
    pub interfaces: u32,
    pub n_bufs: u32,
    pub bufs: u32,
    pub post_ext: u32,
}

#[cfg(feature = "compat")]
const _: () = assert!(
    size_of::<ValidateConfigExt32>() == 20,
    "ValidateConfigExt32 has unexpected size"
);

#[cfg(feature = "compat")]
impl ValidateConfigExt32 {
    /// Map onto the canonical layout.
    ///
    /// Pointers are zero-extended, counts are copied unchanged.
    pub const fn widen(self) -> ValidateConfigExt {
        ValidateConfigExt {
            n_interfaces: self.n_interfaces,
            interfaces: compat_ptr(self.interfaces),
            n_bufs: self.n_bufs,
            bufs: compat_ptr(self.bufs),
            post_ext: compat_ptr(self.post_ext),
        }
    }
}

/// Widen a 32-bit caller pointer.
#[inline]
pub const fn compat_ptr(ptr: u32) -> u64 {
    ptr as u64
}

/// One caller-supplied buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct BufferConfig {
    /// Overlay engine ID.
    pub overlay_engine: u32,
    pub w: u32,
    pub h: u32,
    /// Fourcc pixel format.
    pub format: u32,
    /// External memory handle per plane.
    pub fd: [i32; MAX_PLANES],
    pub offset: [u32; MAX_PLANES],
    pub pitch: [u32; MAX_PLANES],
    pub n_planes: u8,
    pub _pad: [u8; 3],
    /// Ignored by validation.
    pub acquire_fence: i32,
}

const _: () = assert!(size_of::<BufferConfig>() == 72);

/// Header of the extended post payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct PostExtHeader {
    pub post_id: u32,
}

/// Extended per-buffer attributes, positionally matched to the buffers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct BufferConfigExt {
    /// Source sub-region.
    pub crop: ClipRect,
    /// Destination sub-region.
    pub display: ClipRect,
    /// Raw `Transform` bits.
    pub transform: u32,
    /// Raw `BlendType` value.
    pub blend_type: u32,
    pub plane_alpha: u8,
    pub reserved: [u8; 3],
}

const _: () = assert!(size_of::<PostExtHeader>() == 4);
const _: () = assert!(size_of::<BufferConfigExt>() == 28);

/// Size of the extended payload for `n_bufs` buffers.
#[inline]
pub const fn post_ext_size(n_bufs: usize) -> usize {
    size_of::<PostExtHeader>() + n_bufs * size_of::<BufferConfigExt>()
}

/// Control codes, using the Linux `_IOW` encoding.
pub mod ioctl {
    use core::mem::size_of;

    const IOC_NRBITS: u32 = 8;
    const IOC_TYPEBITS: u32 = 8;
    const IOC_SIZEBITS: u32 = 14;
    const IOC_NRSHIFT: u32 = 0;
    const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
    const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
    const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;
    const IOC_WRITE: u32 = 1;

    /// Control-code type shared by the display framework.
    pub const IOCTL_TYPE: u8 = b'D';
    /// First driver-private control number.
    pub const NR_CUSTOM: u8 = 128;
    /// Number of the validation operation.
    pub const NR_VALIDATE: u8 = NR_CUSTOM;

    /// Encode a caller-to-device control code.
    pub const fn iow(ty: u8, nr: u8, size: usize) -> u32 {
        (IOC_WRITE << IOC_DIRSHIFT)
            | ((size as u32) << IOC_SIZESHIFT)
            | ((ty as u32) << IOC_TYPESHIFT)
            | ((nr as u32) << IOC_NRSHIFT)
    }

    /// Validate a post described by a `ValidateConfigExt`.
    pub const VALIDATE_CONFIG_EXT: u32 =
        iow(IOCTL_TYPE, NR_VALIDATE, size_of::<super::ValidateConfigExt>());

    /// Validate a post described by a `ValidateConfigExt32`.
    #[cfg(feature = "compat")]
    pub const VALIDATE_CONFIG_EXT32: u32 =
        iow(IOCTL_TYPE, NR_VALIDATE, size_of::<super::ValidateConfigExt32>());
}
