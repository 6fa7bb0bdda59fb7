//! Memory regions of a running program.
//!
//! - **Stack**: owned by one context, frames addressed from its start.
//! - **Global**: shared by every context of a program (`SharedGlobals`).
//! - **Data**: the program's read-only constant bytes.
//!
//! All access is bounds checked; an address outside its region is a fault,
//! never undefined behavior.

// Arc is the implementation - all usage goes through the newtype
#![allow(
    clippy::disallowed_types,
    reason = "Arc is the implementation of SharedGlobals"
)]

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-wide global storage shared across contexts.
///
/// The lock keeps each individual load and store memory safe. It does not
/// order accesses from different contexts: two contexts writing the same
/// global race at the language level, and serializing them is up to the
/// embedder.
pub struct SharedGlobals(Arc<RwLock<Vec<u8>>>);

impl SharedGlobals {
    /// Zero-initialized storage of `size` bytes.
    pub fn new(size: u32) -> Self {
        SharedGlobals(Arc::new(RwLock::new(vec![0; size as usize])))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.0.write()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Whether both handles share one storage.
    pub fn same(&self, other: &SharedGlobals) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Clone for SharedGlobals {
    fn clone(&self) -> Self {
        SharedGlobals(Arc::clone(&self.0))
    }
}

impl fmt::Debug for SharedGlobals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedGlobals({} bytes)", self.len())
    }
}

/// `len` bytes at `offset`, if entirely inside `bytes`.
///
/// A zero-length range is valid at any offset up to and including the end.
pub(crate) fn range(bytes: &[u8], offset: u32, len: u32) -> Option<&[u8]> {
    let start = offset as usize;
    let end = start.checked_add(len as usize)?;
    bytes.get(start..end)
}

pub(crate) fn range_mut(bytes: &mut [u8], offset: u32, len: u32) -> Option<&mut [u8]> {
    let start = offset as usize;
    let end = start.checked_add(len as usize)?;
    bytes.get_mut(start..end)
}

/// The NUL-terminated string at `offset`, without its terminator.
pub(crate) fn cstr(bytes: &[u8], offset: u32) -> Option<&[u8]> {
    let rest = bytes.get(offset as usize..)?;
    let len = rest.iter().position(|&b| b == 0)?;
    Some(&rest[..len])
}
