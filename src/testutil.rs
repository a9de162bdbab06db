//! Test fixtures: a recording driver, a counting memory-handle table and
//! builders for caller request memory.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::device::{AttachmentList, DeviceCore, DeviceOps};
use crate::dmabuf::{DmaBuf, DmaBufObject, DmaBufTable};
use crate::error::{Error, Result};
use crate::geometry::ClipRect;
use crate::post::Post;
use crate::uapi::{BlendType, BufferConfig, BufferConfigExt, PostExtHeader, PLANE_ALPHA_OPAQUE};

/// `XR24`
pub const XRGB8888: u32 = u32::from_le_bytes(*b"XR24");
/// `AR24`
pub const ARGB8888: u32 = u32::from_le_bytes(*b"AR24");
/// `NV12`
pub const NV12: u32 = u32::from_le_bytes(*b"NV12");

/// Token minted by `RecordingDriver`.
#[derive(Debug)]
pub struct Token(pub usize);

/// Driver that accepts or rejects everything and counts calls.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    reject: Option<i32>,
    mint_token: bool,
    validated: AtomicUsize,
    freed: AtomicUsize,
    posted: AtomicUsize,
    last_n_bufs: AtomicUsize,
    last_imported: AtomicUsize,
}

impl RecordingDriver {
    pub fn accept() -> Self {
        Self {
            mint_token: true,
            ..Default::default()
        }
    }

    pub fn accept_without_token() -> Self {
        Self::default()
    }

    pub fn reject(code: i32) -> Self {
        Self {
            reject: Some(code),
            ..Default::default()
        }
    }

    pub fn validated(&self) -> usize {
        self.validated.load(Ordering::SeqCst)
    }

    pub fn freed(&self) -> usize {
        self.freed.load(Ordering::SeqCst)
    }

    pub fn posted(&self) -> usize {
        self.posted.load(Ordering::SeqCst)
    }

    /// Buffer count of the last validated post.
    pub fn last_n_bufs(&self) -> usize {
        self.last_n_bufs.load(Ordering::SeqCst)
    }

    /// Imported handles held by the last validated post.
    pub fn last_imported(&self) -> usize {
        self.last_imported.load(Ordering::SeqCst)
    }
}

impl DeviceOps for RecordingDriver {
    type State = Token;

    fn validate(
        &self,
        _dev: &DeviceCore,
        _attached: &AttachmentList,
        post: &Post<'_>,
    ) -> Result<Option<Token>> {
        let n = self.validated.fetch_add(1, Ordering::SeqCst);
        self.last_n_bufs.store(post.n_bufs(), Ordering::SeqCst);
        self.last_imported.store(
            post.bufs.iter().map(|b| b.imported()).sum(),
            Ordering::SeqCst,
        );
        if let Some(code) = self.reject {
            return Err(Error::DriverRejected(code));
        }
        Ok(self.mint_token.then_some(Token(n)))
    }

    fn state_free(&self, _dev: &DeviceCore, _state: Token) {
        self.freed.fetch_add(1, Ordering::SeqCst);
    }

    fn post(&self, _dev: &DeviceCore, _post: &Post<'_>, _state: Option<Token>) {
        self.posted.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct Counters {
    imported: AtomicUsize,
    released: AtomicUsize,
}

struct PoolObject {
    size: usize,
    counters: Arc<Counters>,
}

impl DmaBufObject for PoolObject {
    fn size(&self) -> usize {
        self.size
    }

    fn release(&self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Memory-handle table; file descriptor `FIRST_FD + i` names object `i`.
pub struct DmaBufPool {
    objects: Vec<Arc<PoolObject>>,
    counters: Arc<Counters>,
}

impl DmaBufPool {
    pub const FIRST_FD: i32 = 3;

    pub fn new(sizes: &[usize]) -> Self {
        let counters = Arc::new(Counters::default());
        let objects = sizes
            .iter()
            .map(|&size| {
                Arc::new(PoolObject {
                    size,
                    counters: Arc::clone(&counters),
                })
            })
            .collect();
        Self { objects, counters }
    }

    /// File descriptor of object `index`.
    pub fn fd(index: usize) -> i32 {
        Self::FIRST_FD + index as i32
    }

    pub fn imported(&self) -> usize {
        self.counters.imported.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Imports not yet released.
    pub fn outstanding(&self) -> usize {
        self.imported() - self.released()
    }
}

impl DmaBufTable for DmaBufPool {
    fn dma_buf_get(&self, fd: i32) -> Result<DmaBuf> {
        let index = fd
            .checked_sub(Self::FIRST_FD)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or(Error::BadHandle)?;
        let object = self.objects.get(index).ok_or(Error::BadHandle)?;
        self.counters.imported.fetch_add(1, Ordering::SeqCst);
        Ok(DmaBuf::new(Arc::clone(object) as Arc<dyn DmaBufObject>))
    }
}

/// Builds an extended post payload.
#[derive(Debug, Default)]
pub struct PostExtBuilder {
    bytes: Vec<u8>,
}

impl PostExtBuilder {
    pub fn new(post_id: u32) -> Self {
        Self {
            bytes: bytemuck::bytes_of(&PostExtHeader { post_id }).to_vec(),
        }
    }

    pub fn push(mut self, ext: BufferConfigExt) -> Self {
        self.bytes.extend_from_slice(bytemuck::bytes_of(&ext));
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Extended attributes for an untransformed, opaque full-screen buffer.
pub fn full_screen_ext(w: u16, h: u16) -> BufferConfigExt {
    BufferConfigExt {
        crop: ClipRect::full(w, h),
        display: ClipRect::full(w, h),
        transform: 0,
        blend_type: BlendType::None.raw(),
        plane_alpha: PLANE_ALPHA_OPAQUE,
        reserved: [0; 3],
    }
}

/// A single-plane buffer config.
pub fn buffer_config(overlay: u32, w: u32, h: u32, format: u32, fd: i32) -> BufferConfig {
    BufferConfig {
        overlay_engine: overlay,
        w,
        h,
        format,
        fd: [fd, -1, -1, -1],
        offset: [0; 4],
        pitch: [w * 4, 0, 0, 0],
        n_planes: 1,
        _pad: [0; 3],
        acquire_fence: -1,
    }
}

/// Lays out caller memory: sections are appended at increasing addresses
/// and their addresses handed back for use in request records.
#[derive(Debug)]
pub struct UserImage {
    base: u64,
    bytes: Vec<u8>,
}

impl UserImage {
    pub const BASE: u64 = 0x4000_0000;

    pub fn new() -> Self {
        Self {
            base: Self::BASE,
            // Keep address BASE itself unused so no section lands at it.
            bytes: alloc::vec![0; 16],
        }
    }

    /// Append raw bytes, 8-byte aligned; returns their address.
    pub fn push_bytes(&mut self, data: &[u8]) -> u64 {
        while self.bytes.len() % 8 != 0 {
            self.bytes.push(0);
        }
        let addr = self.base + self.bytes.len() as u64;
        self.bytes.extend_from_slice(data);
        addr
    }

    pub fn push_pod<T: bytemuck::Pod>(&mut self, value: &T) -> u64 {
        self.push_bytes(bytemuck::bytes_of(value))
    }

    pub fn push_slice<T: bytemuck::Pod>(&mut self, values: &[T]) -> u64 {
        self.push_bytes(bytemuck::cast_slice(values))
    }

    pub fn space(&self) -> crate::uaccess::UserSpace<'_> {
        crate::uaccess::UserSpace::new(self.base, &self.bytes)
    }
}
