//! Display Device Model
//!
//! The objects validation reads but never owns: interfaces, overlay
//! engines, the attachments between them, and the driver capabilities.
//!
//! # Structure
//! ```text
//! Device<D>
//! ├── DeviceCore
//! │   ├── interfaces: Registry<Interface>      (ID -> display sink)
//! │   ├── overlays:   Registry<OverlayEngine>  (ID -> composition unit)
//! │   └── client:     Mutex<AttachmentList>    (the client lock)
//! └── ops: D: DeviceOps                        (validate / state_free / post)
//! ```
//!
//! # Locking
//! Anything that walks the attachment list takes a `&AttachmentList`
//! parameter. The only way to get one is through `DeviceCore::client`,
//! so the lock is always held by the caller, never by the routine.

mod attachment;
mod registry;

pub use attachment::{Attachment, AttachmentList};
pub use registry::{Id, Registry, RegistryError, REGISTRY_SIZE};

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use spin::{Mutex, MutexGuard};

use crate::error::Result;
use crate::post::Post;

/// ID of an interface in its device's registry.
pub type InterfaceId = Id<Interface>;

/// ID of an overlay engine in its device's registry.
pub type OverlayId = Id<OverlayEngine>;

/// Active display timing, reduced to what validation needs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DisplayMode {
    pub hdisplay: u16,
    pub vdisplay: u16,
}

impl DisplayMode {
    pub const fn new(hdisplay: u16, vdisplay: u16) -> Self {
        Self { hdisplay, vdisplay }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.hdisplay, self.vdisplay)
    }
}

/// A display output sink.
#[derive(Clone, Debug)]
pub struct Interface {
    pub name: String,
    pub current_mode: DisplayMode,
}

impl Interface {
    pub fn new(name: &str, current_mode: DisplayMode) -> Self {
        Self {
            name: String::from(name),
            current_mode,
        }
    }
}

/// A hardware composition unit.
#[derive(Clone, Debug)]
pub struct OverlayEngine {
    pub name: String,
    /// Fourcc formats the engine can scan out.
    pub supported_formats: Vec<u32>,
}

impl OverlayEngine {
    pub fn new(name: &str, supported_formats: &[u32]) -> Self {
        Self {
            name: String::from(name),
            supported_formats: Vec::from(supported_formats),
        }
    }

    /// True if `format` is in the supported list.
    pub fn supports(&self, format: u32) -> bool {
        self.supported_formats.iter().any(|&f| f == format)
    }
}

/// Driver capabilities consumed by validation and commit.
pub trait DeviceOps {
    /// Opaque result of a successful `validate`.
    type State;

    /// Decide whether the hardware can display `post`.
    ///
    /// Called with the client lock held; `attached` is the locked list.
    fn validate(
        &self,
        dev: &DeviceCore,
        attached: &AttachmentList,
        post: &Post<'_>,
    ) -> Result<Option<Self::State>>;

    /// Release a state the caller is not going to commit.
    fn state_free(&self, dev: &DeviceCore, state: Self::State) {
        let _ = dev;
        drop(state);
    }

    /// Program a validated post. Drivers that drive real hardware
    /// override this; the default just releases the state.
    fn post(&self, dev: &DeviceCore, post: &Post<'_>, state: Option<Self::State>) {
        let _ = post;
        if let Some(state) = state {
            self.state_free(dev, state);
        }
    }
}

/// Everything about a device except its driver.
pub struct DeviceCore {
    name: String,
    interfaces: Registry<Interface>,
    overlays: Registry<OverlayEngine>,
    client: Mutex<AttachmentList>,
}

impl DeviceCore {
    /// Device name, used as the log prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interfaces(&self) -> &Registry<Interface> {
        &self.interfaces
    }

    pub fn overlays(&self) -> &Registry<OverlayEngine> {
        &self.overlays
    }

    pub fn interface(&self, id: InterfaceId) -> Option<&Interface> {
        self.interfaces.get(id).ok()
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&OverlayEngine> {
        self.overlays.get(id).ok()
    }

    /// Take the client lock.
    pub fn client(&self) -> MutexGuard<'_, AttachmentList> {
        self.client.lock()
    }
}

impl fmt::Debug for DeviceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCore")
            .field("name", &self.name)
            .field("interfaces", &self.interfaces.len())
            .field("overlays", &self.overlays.len())
            .finish()
    }
}

/// A display device: its objects plus the driver that validates posts.
#[derive(Debug)]
pub struct Device<D> {
    core: DeviceCore,
    ops: D,
}

impl<D: DeviceOps> Device<D> {
    pub fn new(name: &str, ops: D) -> Self {
        Self {
            core: DeviceCore {
                name: String::from(name),
                interfaces: Registry::new(),
                overlays: Registry::new(),
                client: Mutex::new(AttachmentList::new()),
            },
            ops,
        }
    }

    pub fn core(&self) -> &DeviceCore {
        &self.core
    }

    pub fn ops(&self) -> &D {
        &self.ops
    }

    /// Register an interface.
    pub fn add_interface(&mut self, interface: Interface) -> Result<InterfaceId> {
        Ok(self.core.interfaces.insert(interface)?)
    }

    /// Register an overlay engine.
    pub fn add_overlay(&mut self, overlay: OverlayEngine) -> Result<OverlayId> {
        Ok(self.core.overlays.insert(overlay)?)
    }

    /// Unregister an interface, dropping its attachments.
    pub fn remove_interface(&mut self, id: InterfaceId) -> Result<Interface> {
        let interface = self.core.interfaces.remove(id)?;
        let mut attached = self.core.client();
        let stale: Vec<Attachment> = attached
            .iter()
            .filter(|a| a.interface == id)
            .copied()
            .collect();
        for a in stale {
            attached.detach(a.overlay, a.interface);
        }
        Ok(interface)
    }

    /// Switch an interface to a new mode.
    pub fn set_mode(&mut self, id: InterfaceId, mode: DisplayMode) -> Result<()> {
        self.core.interfaces.get_mut(id)?.current_mode = mode;
        Ok(())
    }

    /// Attach `overlay` to `interface`, taking the client lock.
    pub fn attach(&self, overlay: OverlayId, interface: InterfaceId) -> Result<()> {
        self.core.overlays.get(overlay)?;
        self.core.interfaces.get(interface)?;
        self.core.client().attach(overlay, interface)
    }

    /// Detach `overlay` from `interface`, taking the client lock.
    pub fn detach(&self, overlay: OverlayId, interface: InterfaceId) -> bool {
        self.core.client().detach(overlay, interface)
    }

    /// Run the driver's `validate` under the client lock.
    pub fn validate(&self, post: &Post<'_>) -> Result<Option<D::State>> {
        let attached = self.core.client();
        self.ops.validate(&self.core, &attached, post)
    }

    /// Release a state obtained from `validate`.
    pub fn state_free(&self, state: D::State) {
        self.ops.state_free(&self.core, state);
    }

    /// Commit path: validate `post` and hand it to the driver.
    ///
    /// Nothing reaches the driver's `post` hook unless `validate` accepted it.
    pub fn commit(&self, post: &Post<'_>) -> Result<()> {
        let attached = self.core.client();
        let state = self.ops.validate(&self.core, &attached, post).map_err(|err| {
            log::warn!("{}: post rejected: {}", self.core.name, err);
            err
        })?;
        drop(attached);
        self.ops.post(&self.core, post, state);
        Ok(())
    }
}
