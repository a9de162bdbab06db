//! Single-Buffer Post Policy
//!
//! For display hardware that can only scan one buffer straight out to one
//! interface: no scaling, no transform, no blending beyond opaque or
//! premultiplied, and a buffer that exactly matches the current mode.

use crate::device::{AttachmentList, DeviceCore, DeviceOps};
use crate::error::{Error, Result};
use crate::geometry::ClipRect;
use crate::post::Post;
use crate::uapi::{post_ext_size, BlendType, Transform, PLANE_ALPHA_OPAQUE};

/// Validate `post` against the single-buffer policy.
///
/// A post without buffers is a null flip and always passes. Every
/// rejection is `Error::InvalidArgument`; the reason is only reported
/// through the `debug-validate` diagnostics.
///
/// The caller must hold the client lock; `attached` is the locked list.
pub fn validate_simple_post(
    dev: &DeviceCore,
    attached: &AttachmentList,
    post: &Post<'_>,
) -> Result<()> {
    let name = dev.name();
    let n_bufs = post.n_bufs();

    // Null flip
    if n_bufs == 0 {
        return Ok(());
    }

    let expected_size = post_ext_size(n_bufs);
    if post.custom_data.len() != expected_size {
        val_dbg!(
            name,
            "Custom data size {} not expected size {}",
            post.custom_data.len(),
            expected_size
        );
        return Err(Error::InvalidArgument);
    }

    if n_bufs != 1 {
        val_dbg!(name, "Got {} buffers in post. Should be 1.", n_bufs);
        return Err(Error::InvalidArgument);
    }

    let buffer = &post.bufs[0];
    let Some((overlay_id, overlay)) = buffer
        .overlay_engine
        .and_then(|id| dev.overlay(id).map(|ovl| (id, ovl)))
    else {
        log::error!("{name}: Buffer without an overlay engine.");
        return Err(Error::InvalidArgument);
    };

    if !overlay.supports(buffer.format) {
        val_dbg!(name, "Unsupported buffer format {:#010x}.", buffer.format);
        return Err(Error::InvalidArgument);
    }

    let Some(interface) = attached
        .interface_for_overlay(overlay_id)
        .and_then(|id| dev.interface(id))
    else {
        log::error!("{name}: No interface attached to overlay {}", overlay.name);
        return Err(Error::InvalidArgument);
    };

    let mode = interface.current_mode;

    if buffer.w != u32::from(mode.hdisplay) {
        val_dbg!(name, "Buffer width {} is not expected {}.", buffer.w, mode.hdisplay);
        return Err(Error::InvalidArgument);
    }

    if buffer.h != u32::from(mode.vdisplay) {
        val_dbg!(name, "Buffer height {} is not expected {}.", buffer.h, mode.vdisplay);
        return Err(Error::InvalidArgument);
    }

    if buffer.n_planes != 1 {
        val_dbg!(name, "Buffer n_planes {} is not 1.", buffer.n_planes);
        return Err(Error::InvalidArgument);
    }

    if buffer.offset[0] != 0 {
        val_dbg!(name, "Buffer offset {} is not 0.", buffer.offset[0]);
        return Err(Error::InvalidArgument);
    }

    let buf_ext = post.buffer_ext(0).ok_or(Error::InvalidArgument)?;
    let full = ClipRect::full(mode.hdisplay, mode.vdisplay);

    for (what, rect) in [("crop", buf_ext.crop), ("display", buf_ext.display)] {
        if rect != full {
            val_dbg!(name, "Buffer {} {} not expected {}.", what, rect, full);

            // Smaller is fine: userspace may be emulating a lower resolution.
            if rect.x2 > mode.hdisplay || rect.y2 > mode.vdisplay {
                return Err(Error::InvalidArgument);
            }
        }
    }

    if buf_ext.transform != Transform::NONE.bits() {
        val_dbg!(
            name,
            "Buffer transform {:#x} not expected transform {:#x}.",
            buf_ext.transform,
            Transform::NONE.bits()
        );
        return Err(Error::InvalidArgument);
    }

    match BlendType::from_raw(buf_ext.blend_type) {
        Some(BlendType::None | BlendType::Premultiplied) => {}
        _ => {
            val_dbg!(name, "Buffer blend type {} not supported.", buf_ext.blend_type);
            return Err(Error::InvalidArgument);
        }
    }

    if buf_ext.plane_alpha != PLANE_ALPHA_OPAQUE {
        val_dbg!(
            name,
            "Buffer plane alpha {} not expected plane alpha {}.",
            buf_ext.plane_alpha,
            PLANE_ALPHA_OPAQUE
        );
        return Err(Error::InvalidArgument);
    }

    Ok(())
}

/// Driver capabilities for single-buffer hardware.
///
/// Validation never produces a state.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleDriver;

impl DeviceOps for SimpleDriver {
    type State = ();

    fn validate(
        &self,
        dev: &DeviceCore,
        attached: &AttachmentList,
        post: &Post<'_>,
    ) -> Result<Option<()>> {
        validate_simple_post(dev, attached, post).map(|()| None)
    }
}
