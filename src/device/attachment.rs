//! Overlay-to-Interface Attachments

use alloc::vec::Vec;

use super::{InterfaceId, OverlayId};
use crate::error::Result;

/// A directed link: `overlay` feeds `interface`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Attachment {
    pub overlay: OverlayId,
    pub interface: InterfaceId,
}

/// The device's attachment list, in registration order.
///
/// Lives behind the device's client lock; holding a `&AttachmentList`
/// obtained from that lock is the proof that the caller owns it.
#[derive(Debug, Default)]
pub struct AttachmentList {
    entries: Vec<Attachment>,
}

impl AttachmentList {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record that `overlay` feeds `interface`.
    ///
    /// Attaching the same pair twice is a no-op.
    pub fn attach(&mut self, overlay: OverlayId, interface: InterfaceId) -> Result<()> {
        let attachment = Attachment { overlay, interface };
        if self.entries.contains(&attachment) {
            return Ok(());
        }
        self.entries.try_reserve(1)?;
        self.entries.push(attachment);
        Ok(())
    }

    /// Remove a link; returns whether it existed.
    pub fn detach(&mut self, overlay: OverlayId, interface: InterfaceId) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|a| !(a.overlay == overlay && a.interface == interface));
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Interface fed by `overlay`.
    ///
    /// If several interfaces are attached to the overlay this returns the
    /// most recently attached one.
    pub fn interface_for_overlay(&self, overlay: OverlayId) -> Option<InterfaceId> {
        self.entries
            .iter()
            .rev()
            .find(|a| a.overlay == overlay)
            .map(|a| a.interface)
    }
}
