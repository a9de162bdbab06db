//! External Memory Handles
//!
//! A buffer plane's memory is imported from the caller by file-descriptor
//! reference. Each successful import holds one reference on the exporter's
//! object until the `DmaBuf` is dropped, so a handle can never be leaked or
//! released twice no matter where validation stops.

use alloc::sync::Arc;
use core::fmt;

use crate::error::Result;

/// An exported memory object.
pub trait DmaBufObject: Send + Sync {
    /// Size in bytes.
    fn size(&self) -> usize;

    /// Drop one imported reference.
    fn release(&self);
}

/// One imported reference to a memory object.
pub struct DmaBuf {
    object: Arc<dyn DmaBufObject>,
}

impl DmaBuf {
    /// Wrap a reference the exporter has already taken on our behalf.
    pub fn new(object: Arc<dyn DmaBufObject>) -> Self {
        Self { object }
    }

    pub fn size(&self) -> usize {
        self.object.size()
    }
}

impl Drop for DmaBuf {
    fn drop(&mut self) {
        self.object.release();
    }
}

impl fmt::Debug for DmaBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DmaBuf").field("size", &self.size()).finish()
    }
}

/// Resolves caller file descriptors to memory objects.
pub trait DmaBufTable {
    /// Import the object behind `fd`.
    ///
    /// Fails with `Error::BadHandle` when `fd` does not name a memory
    /// object, or with whatever status the exporter reports.
    fn dma_buf_get(&self, fd: i32) -> Result<DmaBuf>;
}
