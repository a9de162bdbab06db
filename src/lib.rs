//! adf-postcheck - Display Post Validation
//!
//! Decides whether a proposed display post (one or more buffers routed
//! through overlay engines onto display interfaces) is well-formed and
//! within the capabilities of the hardware, before anything is committed.
//!
//! # Entry Points
//! - `validate::ioctl` - the privileged control operation. Copies an
//!   untrusted request out of caller memory, resolves IDs, imports
//!   external memory handles and drives the driver's `validate` hook.
//! - `Device::commit` - the internal commit path, which validates every
//!   post before handing it to the driver.
//! - `validate::validate_simple_post` - a ready-made policy for hardware
//!   that can only scan out one full-screen buffer.
//!
//! # Security Model
//! - Caller memory is only touched through `uaccess::UserMemory`
//! - Every count is bounds-checked before anything is allocated
//! - Imported memory handles are released on drop, on every exit path

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod device;
pub mod dmabuf;
pub mod error;
pub mod geometry;
pub mod post;
pub mod uaccess;
pub mod uapi;
pub mod validate;

#[cfg(test)]
mod testutil;

pub use device::{Device, DeviceOps, DisplayMode, Interface, InterfaceId, OverlayEngine, OverlayId};
pub use error::{Error, Result};
pub use geometry::{rects_intersect, ClipRect};
pub use post::{Buffer, Post};
