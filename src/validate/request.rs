//! Validation Control Operation
//!
//! Marshals a caller-supplied request into a post and runs it through the
//! driver's `validate` capability without ever committing it.
//!
//! # Security Considerations
//! - Every count is checked against its limit before anything is copied
//! - Whole arrays are access-checked before the first element is read
//! - Caller data is copied into owned memory, then only the copy is used
//! - Imported memory handles live in `Buffer`s, so every exit path,
//!   early or late, releases exactly the handles that were imported

use alloc::vec::Vec;
use core::mem::size_of;

use crate::device::{Device, DeviceCore, DeviceOps, InterfaceId};
use crate::dmabuf::DmaBufTable;
use crate::error::{Error, Result};
use crate::post::{Buffer, Post};
use crate::uaccess::{UserMemory, UserPtr};
use crate::uapi::{
    ioctl as codes, post_ext_size, BufferConfig, ValidateConfigExt, MAX_BUFFERS, MAX_INTERFACES,
    MAX_PLANES,
};

#[cfg(feature = "compat")]
use crate::uapi::{compat_ptr, ValidateConfigExt32};

/// Dispatch a control code.
///
/// # Returns
/// 0 on success, a negative errno on failure. Unknown codes yield
/// `-ENOTTY`.
pub fn ioctl<D, M, T>(dev: &Device<D>, mem: &M, dmabufs: &T, cmd: u32, arg: u64) -> i64
where
    D: DeviceOps,
    M: UserMemory + ?Sized,
    T: DmaBufTable + ?Sized,
{
    let result = match cmd {
        codes::VALIDATE_CONFIG_EXT => ioctl_validate(dev, mem, dmabufs, UserPtr::new(arg)),
        #[cfg(feature = "compat")]
        codes::VALIDATE_CONFIG_EXT32 => {
            // A 32-bit caller's argument only has 32 significant bits.
            let arg = compat_ptr(arg as u32);
            ioctl_validate_compat(dev, mem, dmabufs, UserPtr::new(arg))
        }
        _ => {
            log::warn!("{}: unknown control code {:#x}", dev.core().name(), cmd);
            Err(Error::NotTty)
        }
    };

    match result {
        Ok(()) => 0,
        Err(err) => err.errno(),
    }
}

/// Validate a post described by the `ValidateConfigExt` at `arg`.
pub fn ioctl_validate<D, M, T>(dev: &Device<D>, mem: &M, dmabufs: &T, arg: UserPtr) -> Result<()>
where
    D: DeviceOps,
    M: UserMemory + ?Sized,
    T: DmaBufTable + ?Sized,
{
    if !mem.access_ok(arg, size_of::<ValidateConfigExt>()) {
        return Err(Error::Fault);
    }
    let data: ValidateConfigExt = mem.read_pod(arg)?;
    handle_validate_request(dev, mem, dmabufs, &data)
}

/// Validate a post described by the 32-bit `ValidateConfigExt32` at `arg`.
///
/// The request is widened and then takes exactly the same path as
/// `ioctl_validate`.
#[cfg(feature = "compat")]
pub fn ioctl_validate_compat<D, M, T>(
    dev: &Device<D>,
    mem: &M,
    dmabufs: &T,
    arg: UserPtr,
) -> Result<()>
where
    D: DeviceOps,
    M: UserMemory + ?Sized,
    T: DmaBufTable + ?Sized,
{
    if !mem.access_ok(arg, size_of::<ValidateConfigExt32>()) {
        return Err(Error::Fault);
    }
    let data: ValidateConfigExt32 = mem.read_pod(arg)?;
    handle_validate_request(dev, mem, dmabufs, &data.widen())
}

/// Run a copied request header through the device's `validate`.
///
/// Any state the driver produces is released straight away: this path
/// never commits.
pub fn handle_validate_request<D, M, T>(
    dev: &Device<D>,
    mem: &M,
    dmabufs: &T,
    data: &ValidateConfigExt,
) -> Result<()>
where
    D: DeviceOps,
    M: UserMemory + ?Sized,
    T: DmaBufTable + ?Sized,
{
    let core = dev.core();
    let n_interfaces = data.n_interfaces as usize;
    let n_bufs = data.n_bufs as usize;

    if n_interfaces > MAX_INTERFACES {
        val_dbg!(core.name(), "{} interfaces exceeds {}", n_interfaces, MAX_INTERFACES);
        return Err(Error::InvalidArgument);
    }

    if n_bufs > MAX_BUFFERS {
        val_dbg!(core.name(), "{} buffers exceeds {}", n_bufs, MAX_BUFFERS);
        return Err(Error::InvalidArgument);
    }

    let bufs_ptr = UserPtr::new(data.bufs);
    if !mem.access_ok(bufs_ptr, n_bufs * size_of::<BufferConfig>()) {
        return Err(Error::Fault);
    }

    let post_ext_ptr = UserPtr::new(data.post_ext);
    let post_ext_size = post_ext_size(n_bufs);
    if !mem.access_ok(post_ext_ptr, post_ext_size) {
        return Err(Error::Fault);
    }
    let post_ext = mem.read_vec(post_ext_ptr, post_ext_size)?;

    let intfs = resolve_interfaces(core, mem, UserPtr::new(data.interfaces), n_interfaces)?;
    let mut bufs = import_buffers(core, mem, dmabufs, bufs_ptr, n_bufs)?;

    // Validation does not need the memory mapped, so it never is.
    let post = Post::new(&post_ext, &bufs);
    let result = dev.validate(&post).map(|state| {
        if let Some(state) = state {
            dev.state_free(state);
        }
    });

    // Handles first, then the copies, then the buffer storage.
    for buf in &mut bufs {
        buf.put_dma_bufs();
    }
    drop(post_ext);
    drop(intfs);
    drop(bufs);
    result
}

fn resolve_interfaces<M>(
    core: &DeviceCore,
    mem: &M,
    ptr: UserPtr,
    n_interfaces: usize,
) -> Result<Vec<InterfaceId>>
where
    M: UserMemory + ?Sized,
{
    let mut intfs = Vec::new();
    if n_interfaces == 0 {
        return Ok(intfs);
    }

    if !mem.access_ok(ptr, n_interfaces * size_of::<u32>()) {
        return Err(Error::Fault);
    }
    intfs.try_reserve_exact(n_interfaces)?;

    for i in 0..n_interfaces {
        let raw = mem.get_user_u32(ptr.element::<u32>(i)?)?;
        let Some((id, _)) = core.interfaces().lookup(raw) else {
            val_dbg!(core.name(), "Unknown interface {:#x}", raw);
            return Err(Error::InvalidArgument);
        };
        intfs.push(id);
    }

    Ok(intfs)
}

fn import_buffers<M, T>(
    core: &DeviceCore,
    mem: &M,
    dmabufs: &T,
    ptr: UserPtr,
    n_bufs: usize,
) -> Result<Vec<Buffer>>
where
    M: UserMemory + ?Sized,
    T: DmaBufTable + ?Sized,
{
    let mut bufs = Vec::new();
    bufs.try_reserve_exact(n_bufs)?;

    // On failure `bufs` drops here, releasing the handles of prior buffers.
    for i in 0..n_bufs {
        let config: BufferConfig = mem.read_pod(ptr.element::<BufferConfig>(i)?)?;
        bufs.push(import_buffer(core, dmabufs, &config)?);
    }

    Ok(bufs)
}

fn import_buffer<T>(core: &DeviceCore, dmabufs: &T, config: &BufferConfig) -> Result<Buffer>
where
    T: DmaBufTable + ?Sized,
{
    let n_planes = usize::from(config.n_planes);
    if n_planes > MAX_PLANES {
        val_dbg!(core.name(), "{} planes exceeds {}", n_planes, MAX_PLANES);
        return Err(Error::InvalidArgument);
    }

    let Some((overlay, _)) = core.overlays().lookup(config.overlay_engine) else {
        val_dbg!(core.name(), "Unknown overlay engine {:#x}", config.overlay_engine);
        return Err(Error::NotFound);
    };

    let mut buf = Buffer {
        overlay_engine: Some(overlay),
        w: config.w,
        h: config.h,
        format: config.format,
        ..Default::default()
    };

    // On failure `buf` drops here, releasing the planes imported so far.
    for plane in 0..n_planes {
        buf.dma_bufs[plane] = Some(dmabufs.dma_buf_get(config.fd[plane])?);
        buf.offset[plane] = config.offset[plane];
        buf.pitch[plane] = config.pitch[plane];
    }
    buf.n_planes = config.n_planes;

    Ok(buf)
}
