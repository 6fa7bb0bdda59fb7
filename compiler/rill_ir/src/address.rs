//! Addresses into context-owned memory.
//!
//! Nodes never hold host pointers. An `Address` names a region and a byte
//! offset inside it; the execution context resolves it and reports invalid
//! ones through the fault protocol.
//!
//! # Encoding
//!
//! ```text
//! bits 63..40  zero
//! bits 39..32  region tag
//! bits 31..0   byte offset
//! ```
//!
//! The all-zero value is the null address.

use std::fmt;

/// Memory region an address points into.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Region {
    /// No storage. Every non-empty access through it is invalid.
    Null = 0,
    /// The current context's stack segment.
    Stack = 1,
    /// Process-wide global storage.
    Global = 2,
    /// The program's read-only constant data (string literals).
    Data = 3,
}

impl Region {
    const fn from_tag(tag: u8) -> Option<Region> {
        match tag {
            0 => Some(Region::Null),
            1 => Some(Region::Stack),
            2 => Some(Region::Global),
            3 => Some(Region::Data),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Region::Null => "null",
            Region::Stack => "stack",
            Region::Global => "global",
            Region::Data => "data",
        }
    }
}

/// A region-relative byte address.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    region: Region,
    offset: u32,
}

impl Address {
    pub const NULL: Address = Address {
        region: Region::Null,
        offset: 0,
    };

    #[inline]
    pub const fn new(region: Region, offset: u32) -> Self {
        Address { region, offset }
    }

    #[inline]
    pub const fn stack(offset: u32) -> Self {
        Address::new(Region::Stack, offset)
    }

    #[inline]
    pub const fn global(offset: u32) -> Self {
        Address::new(Region::Global, offset)
    }

    #[inline]
    pub const fn data(offset: u32) -> Self {
        Address::new(Region::Data, offset)
    }

    #[inline]
    pub const fn region(self) -> Region {
        self.region
    }

    #[inline]
    pub const fn offset(self) -> u32 {
        self.offset
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        matches!(self.region, Region::Null)
    }

    /// Advance by `delta` bytes. `None` on offset overflow.
    #[inline]
    pub fn add(self, delta: u32) -> Option<Address> {
        let offset = self.offset.checked_add(delta)?;
        Some(Address { offset, ..self })
    }

    #[inline]
    pub const fn to_raw(self) -> u64 {
        ((self.region as u64) << 32) | self.offset as u64
    }

    /// Decode raw pointer bits.
    ///
    /// Returns `None` for unknown region tags, set high bits, or a null tag
    /// with a non-zero offset. Such bits can only come from a nonsensical
    /// cast and are treated as invalid addresses by the caller.
    pub fn from_raw(raw: u64) -> Option<Address> {
        if raw >> 40 != 0 {
            return None;
        }
        let tag = u8::try_from(raw >> 32).ok()?;
        let region = Region::from_tag(tag)?;
        let offset = u32::try_from(raw & u64::from(u32::MAX)).ok()?;
        if matches!(region, Region::Null) && offset != 0 {
            return None;
        }
        Some(Address { region, offset })
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:#x}", self.region.name(), self.offset)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            fmt::Debug::fmt(self, f)
        }
    }
}
