//! Caller Memory Access
//!
//! Everything the control operation reads from its caller goes through
//! `UserMemory`, so that no caller address is ever dereferenced directly.
//!
//! # Security Principles
//! - Validate every range before the copy
//! - Fail-secure: an unreadable range is a fault, never a partial read
//! - Prevent common vulnerabilities:
//!   - Buffer overflows (checked address arithmetic)
//!   - TOCTOU races (copy into owned memory before use)
//!   - Null pointer dereference (explicit checks)

use alloc::vec::Vec;
use core::mem::size_of;

use bytemuck::Pod;

use crate::error::{Error, Result};

/// An address in the caller's address space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(transparent)]
pub struct UserPtr(u64);

impl UserPtr {
    /// The null address.
    pub const NULL: Self = Self(0);

    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn addr(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Offset by `bytes`, faulting on overflow.
    #[inline]
    pub fn byte_add(self, bytes: usize) -> Result<Self> {
        let bytes = u64::try_from(bytes).map_err(|_| Error::Fault)?;
        self.0.checked_add(bytes).map(Self).ok_or(Error::Fault)
    }

    /// Address of element `index` in an array of `T` starting here.
    #[inline]
    pub fn element<T>(self, index: usize) -> Result<Self> {
        let offset = index.checked_mul(size_of::<T>()).ok_or(Error::Fault)?;
        self.byte_add(offset)
    }
}

impl From<u64> for UserPtr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

/// Readable caller memory.
pub trait UserMemory {
    /// True when `len` bytes starting at `ptr` may be read.
    fn access_ok(&self, ptr: UserPtr, len: usize) -> bool;

    /// Copy `dst.len()` bytes from `src` into `dst`.
    ///
    /// Returns `Error::Fault` if any byte of the range is inaccessible;
    /// `dst` is unspecified in that case.
    fn copy_from_user(&self, dst: &mut [u8], src: UserPtr) -> Result<()>;

    /// Copy one plain-old-data record.
    fn read_pod<T: Pod>(&self, src: UserPtr) -> Result<T> {
        let mut value = T::zeroed();
        self.copy_from_user(bytemuck::bytes_of_mut(&mut value), src)?;
        Ok(value)
    }

    /// Copy one `u32`.
    fn get_user_u32(&self, src: UserPtr) -> Result<u32> {
        self.read_pod(src)
    }

    /// Copy `len` bytes into a fresh allocation.
    fn read_vec(&self, src: UserPtr, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)?;
        buf.resize(len, 0);
        self.copy_from_user(&mut buf, src)?;
        Ok(buf)
    }
}

/// A window of caller memory backed by a byte slice.
///
/// Covers the addresses `base .. base + bytes.len()`; everything outside
/// it, and the null page, faults.
#[derive(Debug, Clone, Copy)]
pub struct UserSpace<'a> {
    base: u64,
    bytes: &'a [u8],
}

impl<'a> UserSpace<'a> {
    /// Map `bytes` at caller address `base`.
    pub const fn new(base: u64, bytes: &'a [u8]) -> Self {
        Self { base, bytes }
    }

    /// First address of the window.
    #[inline]
    pub const fn base(&self) -> UserPtr {
        UserPtr(self.base)
    }

    /// Validate a read of `len` bytes at `ptr`.
    ///
    /// # Returns
    /// * `Ok(slice)` - the bytes backing the range
    /// * `Err(Error::Fault)` - validation failed
    ///
    /// # Security Checks
    /// 1. Pointer is not null
    /// 2. Pointer + length doesn't overflow
    /// 3. Start and end are within the window
    pub fn validate_read(&self, ptr: UserPtr, len: usize) -> Result<&'a [u8]> {
        // Zero-length reads are valid
        if len == 0 {
            return Ok(&[]);
        }

        if ptr.is_null() {
            return Err(Error::Fault);
        }

        let end = ptr.byte_add(len)?;
        let window_end = UserPtr(self.base).byte_add(self.bytes.len())?;
        if ptr.addr() < self.base || end > window_end {
            return Err(Error::Fault);
        }

        let start = usize::try_from(ptr.addr() - self.base).map_err(|_| Error::Fault)?;
        self.bytes.get(start..start + len).ok_or(Error::Fault)
    }
}

impl UserMemory for UserSpace<'_> {
    fn access_ok(&self, ptr: UserPtr, len: usize) -> bool {
        self.validate_read(ptr, len).is_ok()
    }

    fn copy_from_user(&self, dst: &mut [u8], src: UserPtr) -> Result<()> {
        let bytes = self.validate_read(src, dst.len())?;
        dst.copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u64 = 0x4000_0000;

    #[test]
    fn test_zero_length() {
        // Zero-length should always succeed
        let mem = [0u8; 16];
        let space = UserSpace::new(BASE, &mem);
        assert!(space.access_ok(UserPtr::NULL, 0));
        assert!(space.access_ok(UserPtr::new(0x1000), 0));
    }

    #[test]
    fn test_null_pointer() {
        let mem = [0u8; 16];
        let space = UserSpace::new(0, &mem);
        assert!(!space.access_ok(UserPtr::NULL, 4));
    }

    #[test]
    fn test_overflow() {
        let mem = [0u8; 16];
        let space = UserSpace::new(BASE, &mem);
        assert!(!space.access_ok(UserPtr::new(u64::MAX - 10), 100));
        assert_eq!(UserPtr::new(u64::MAX).byte_add(1), Err(Error::Fault));
    }

    #[test]
    fn test_window_bounds() {
        let mem = [0u8; 16];
        let space = UserSpace::new(BASE, &mem);
        assert!(space.access_ok(UserPtr::new(BASE), 16));
        assert!(space.access_ok(UserPtr::new(BASE + 8), 8));
        assert!(!space.access_ok(UserPtr::new(BASE + 8), 9));
        assert!(!space.access_ok(UserPtr::new(BASE - 1), 2));
    }

    #[test]
    fn test_read_pod_and_u32() {
        let mut mem = [0u8; 16];
        mem[4..8].copy_from_slice(&0xdead_beef_u32.to_ne_bytes());
        let space = UserSpace::new(BASE, &mem);
        assert_eq!(space.get_user_u32(UserPtr::new(BASE + 4)), Ok(0xdead_beef));
        assert_eq!(space.get_user_u32(UserPtr::new(BASE + 14)), Err(Error::Fault));
    }

    #[test]
    fn test_read_vec_copies() {
        let mem: Vec<u8> = (0..32).collect();
        let space = UserSpace::new(BASE, &mem);
        let copy = space.read_vec(UserPtr::new(BASE + 30), 2).unwrap();
        assert_eq!(copy, [30, 31]);
        assert_eq!(space.read_vec(UserPtr::new(BASE + 31), 2), Err(Error::Fault));
    }

    #[test]
    fn test_element_address() {
        let base = UserPtr::new(0x1000);
        assert_eq!(base.element::<u32>(3), Ok(UserPtr::new(0x100c)));
        assert_eq!(base.element::<u64>(usize::MAX), Err(Error::Fault));
    }
}
