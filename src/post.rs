//! Post Configuration
//!
//! A post is the unit of validation: the buffers to scan out, and an
//! opaque driver payload. For posts built by the validation control
//! operation the payload is a `PostExtHeader` followed by one
//! `BufferConfigExt` per buffer.

use core::mem::size_of;

use crate::device::OverlayId;
use crate::dmabuf::DmaBuf;
use crate::uapi::{BufferConfigExt, PostExtHeader, MAX_PLANES};

/// One source buffer of a post.
#[derive(Debug, Default)]
pub struct Buffer {
    /// Overlay engine the buffer is routed through.
    pub overlay_engine: Option<OverlayId>,
    pub w: u32,
    pub h: u32,
    /// Fourcc pixel format.
    pub format: u32,
    /// Imported memory per plane; released on drop.
    pub dma_bufs: [Option<DmaBuf>; MAX_PLANES],
    pub offset: [u32; MAX_PLANES],
    pub pitch: [u32; MAX_PLANES],
    pub n_planes: u8,
}

impl Buffer {
    /// Number of planes actually in use, clamped to `MAX_PLANES`.
    #[inline]
    pub fn planes(&self) -> usize {
        usize::from(self.n_planes).min(MAX_PLANES)
    }

    /// Number of imported memory handles held.
    pub fn imported(&self) -> usize {
        self.dma_bufs.iter().filter(|b| b.is_some()).count()
    }

    /// Release every imported memory handle, keeping the description.
    pub fn put_dma_bufs(&mut self) {
        for dma_buf in &mut self.dma_bufs {
            drop(dma_buf.take());
        }
    }
}

/// A frame composition request.
#[derive(Debug, Clone, Copy)]
pub struct Post<'a> {
    /// Driver payload; its size is `custom_data.len()`.
    pub custom_data: &'a [u8],
    pub bufs: &'a [Buffer],
}

impl<'a> Post<'a> {
    pub const fn new(custom_data: &'a [u8], bufs: &'a [Buffer]) -> Self {
        Self { custom_data, bufs }
    }

    /// Number of buffers.
    #[inline]
    pub fn n_bufs(&self) -> usize {
        self.bufs.len()
    }

    /// The payload header, if the payload is large enough to hold one.
    pub fn post_ext_header(&self) -> Option<PostExtHeader> {
        self.custom_data
            .get(..size_of::<PostExtHeader>())
            .map(bytemuck::pod_read_unaligned)
    }

    /// Extended attributes of buffer `index`, if the payload covers it.
    pub fn buffer_ext(&self, index: usize) -> Option<BufferConfigExt> {
        let start = size_of::<BufferConfigExt>()
            .checked_mul(index)?
            .checked_add(size_of::<PostExtHeader>())?;
        let end = start.checked_add(size_of::<BufferConfigExt>())?;
        self.custom_data
            .get(start..end)
            .map(bytemuck::pod_read_unaligned)
    }
}
