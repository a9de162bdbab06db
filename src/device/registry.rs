//! Object Registry
//!
//! Holds the interfaces and overlay engines of a device and hands out
//! stable numeric IDs for them.
//!
//! # Design
//! - Slots are append-only; removed slots are recycled
//! - Every slot carries a generation, bumped on removal
//! - An ID is `(generation << 16) | index`, so a stale ID never resolves
//!   to whatever object later reuses its slot
//! - A slot whose generation is exhausted is retired, never reused

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::error::{Error, Result};

/// Number of slots a registry can address.
pub const REGISTRY_SIZE: usize = 1 << INDEX_BITS;

const INDEX_BITS: u32 = 16;
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = 0xFFFF;

/// A typed, generation-checked ID into a `Registry<T>`.
pub struct Id<T> {
    index: u32,
    generation: u32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _phantom: PhantomData,
        }
    }

    /// Decode a caller-supplied numeric ID.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self::new(raw & INDEX_MASK, raw >> INDEX_BITS)
    }

    /// Numeric ID as seen by callers.
    #[inline]
    pub const fn to_raw(self) -> u32 {
        (self.generation << INDEX_BITS) | self.index
    }

    /// Slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation the ID was minted with.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Id<T> {}

impl<T> core::hash::Hash for Id<T> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.to_raw().hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({}#{})", self.index, self.generation)
    }
}

/// Error type for registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Every addressable slot is in use or retired.
    #[error("registry full")]
    Full,
    /// The slot storage could not grow.
    #[error("out of memory")]
    OutOfMemory,
    /// The ID is out of range, removed, or from an older generation.
    #[error("stale or unknown id")]
    Stale,
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Full | RegistryError::OutOfMemory => Error::OutOfMemory,
            RegistryError::Stale => Error::NotFound,
        }
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena of objects addressed by `Id<T>`.
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    /// Slots whose generation ran out.
    retired: usize,
}

impl<T> Registry<T> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            retired: 0,
        }
    }

    /// Insert an object, returning its ID.
    pub fn insert(&mut self, value: T) -> Result<Id<T>, RegistryError> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Ok(Id::new(index, slot.generation));
        }

        if self.slots.len() >= REGISTRY_SIZE {
            return Err(RegistryError::Full);
        }
        self.slots
            .try_reserve(1)
            .map_err(|_| RegistryError::OutOfMemory)?;
        // Reserve room now so that `remove` never has to allocate.
        self.free
            .try_reserve(self.slots.len() + 1 - self.free.len())
            .map_err(|_| RegistryError::OutOfMemory)?;

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Ok(Id::new(index, 0))
    }

    /// Look up a live object.
    pub fn get(&self, id: Id<T>) -> Result<&T, RegistryError> {
        let slot = self.slots.get(id.index()).ok_or(RegistryError::Stale)?;
        if slot.generation != id.generation {
            return Err(RegistryError::Stale);
        }
        slot.value.as_ref().ok_or(RegistryError::Stale)
    }

    /// Mutable lookup of a live object.
    pub fn get_mut(&mut self, id: Id<T>) -> Result<&mut T, RegistryError> {
        let slot = self.slots.get_mut(id.index()).ok_or(RegistryError::Stale)?;
        if slot.generation != id.generation {
            return Err(RegistryError::Stale);
        }
        slot.value.as_mut().ok_or(RegistryError::Stale)
    }

    /// Resolve a caller-supplied numeric ID.
    pub fn lookup(&self, raw: u32) -> Option<(Id<T>, &T)> {
        let id = Id::from_raw(raw);
        self.get(id).ok().map(|value| (id, value))
    }

    /// Remove an object; its ID and every copy of it go stale.
    pub fn remove(&mut self, id: Id<T>) -> Result<T, RegistryError> {
        self.get(id)?;
        let slot = &mut self.slots[id.index()];
        let value = slot.value.take().ok_or(RegistryError::Stale)?;
        // Wrapping the generation would revive IDs minted in this slot.
        if slot.generation == GENERATION_MASK {
            self.retired += 1;
        } else {
            slot.generation += 1;
            self.free.push(id.index);
        }
        Ok(value)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len() - self.retired
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Id::new(index as u32, slot.generation), value))
        })
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
