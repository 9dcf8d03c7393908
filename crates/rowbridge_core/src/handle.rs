//! Generation-checked handles to native resources.
//!
//! The host never holds a native object directly. It holds a [`Handle`]
//! into a [`HandleTable`]; releasing the handle frees the slot and bumps its
//! generation, so a stale handle is detected instead of dereferenced.

use crate::error::{BridgeError, BridgeResult};
use crate::registry::Kind;
use parking_lot::Mutex;
use rowbridge_client::{NativeSession, Row};
use std::fmt;
use std::sync::Arc;

/// A shared native session.
pub type SharedSession = Arc<Mutex<Box<dyn NativeSession>>>;

/// Host-side reference to a native resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    kind: Kind,
    slot: u32,
    generation: u32,
}

impl Handle {
    /// Returns the kind of resource this handle refers to.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}.{}", self.kind, self.slot, self.generation)
    }
}

/// A native resource owned by the table.
pub enum Resource {
    /// An open session.
    Session(SharedSession),
    /// A materialized row.
    Row(Arc<Row>),
}

impl Resource {
    /// Returns the resource's kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Resource::Session(_) => Kind::Session,
            Resource::Row(_) => Kind::Row,
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Session(_) => f.write_str("Resource::Session(..)"),
            Resource::Row(row) => f.debug_tuple("Resource::Row").field(row).finish(),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    resource: Option<Resource>,
}

/// Slot arena holding every live native resource.
#[derive(Debug, Default)]
pub struct HandleTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl HandleTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a resource and returns its handle.
    pub fn insert(&mut self, resource: Resource) -> Handle {
        let kind = resource.kind();
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                // More than u32::MAX live handles is not a supported load.
                u32::try_from(self.slots.len() - 1).unwrap_or(u32::MAX)
            }
        };
        let entry = &mut self.slots[slot as usize];
        entry.resource = Some(resource);
        self.live += 1;
        Handle {
            kind,
            slot,
            generation: entry.generation,
        }
    }

    fn lookup(&self, handle: Handle, operation: &'static str, expected: Kind) -> BridgeResult<&Resource> {
        if handle.kind != expected {
            return Err(BridgeError::type_mismatch(operation, expected, handle.kind));
        }
        self.slots
            .get(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.resource.as_ref())
            .ok_or(BridgeError::Released { kind: handle.kind })
    }

    /// Returns the session behind a handle.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TypeMismatch`] if the handle is not a session
    /// and [`BridgeError::Released`] if it has been released.
    pub fn session(&self, handle: Handle, operation: &'static str) -> BridgeResult<SharedSession> {
        match self.lookup(handle, operation, Kind::Session)? {
            Resource::Session(session) => Ok(Arc::clone(session)),
            Resource::Row(_) => Err(BridgeError::type_mismatch(operation, Kind::Session, Kind::Row)),
        }
    }

    /// Returns the row behind a handle.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TypeMismatch`] if the handle is not a row and
    /// [`BridgeError::Released`] if it has been released.
    pub fn row(&self, handle: Handle, operation: &'static str) -> BridgeResult<Arc<Row>> {
        match self.lookup(handle, operation, Kind::Row)? {
            Resource::Row(row) => Ok(Arc::clone(row)),
            Resource::Session(_) => Err(BridgeError::type_mismatch(operation, Kind::Row, Kind::Session)),
        }
    }

    /// Returns true if the handle still refers to a live resource.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.slots
            .get(handle.slot as usize)
            .is_some_and(|slot| slot.generation == handle.generation && slot.resource.is_some())
    }

    /// Removes a resource and invalidates its handle.
    ///
    /// Returns `None` if the handle was already released. The caller owns
    /// the returned resource and decides how to dispose of it.
    pub fn release(&mut self, handle: Handle) -> Option<Resource> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let resource = slot.resource.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.slot);
        self.live -= 1;
        Some(resource)
    }

    /// Returns the number of live resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no resources are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
