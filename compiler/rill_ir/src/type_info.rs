//! Runtime type descriptors.
//!
//! A `TypeInfo` describes the byte layout of a value for operations that do
//! not know the type statically: descriptor-driven hashing, polymorphic
//! (any-typed) values, and aggregate copies.
//!
//! # Identity
//!
//! Descriptors are created once, when a type is first referenced, and live
//! for the whole program. They are compared by identity (`SharedType`
//! equality is pointer equality). `TypeTable` interns by shape, so two
//! requests for the same shape return the same descriptor; callers must not
//! depend on that merging.

// Arc is the implementation of SharedType - descriptors are shared
// read-only across every context evaluating the program.
#![allow(
    clippy::disallowed_types,
    reason = "Arc is the implementation of SharedType"
)]

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{LaneKind, ScalarType};

bitflags! {
    /// Layout properties derived once at descriptor creation.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// The byte image alone determines the value.
        const RAW_HASHABLE = 1 << 0;
        /// A string pointer appears somewhere in the layout.
        const HAS_STRING = 1 << 1;
        /// Struct or array.
        const AGGREGATE = 1 << 2;
    }
}

/// One field of a struct descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub offset: u32,
    pub ty: SharedType,
}

/// Shape of a described value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A non-vector scalar (`bool`, integers, floats, pointers).
    Scalar(ScalarType),
    /// An opaque block of `size` bytes.
    Block { size: u32 },
    /// A pointer to a NUL-terminated byte string.
    String,
    /// A fixed-size vector of 32-bit lanes.
    Vector { element: LaneKind, lanes: u8 },
    /// A `from..to` pair of 32-bit lanes.
    Range { element: LaneKind },
    /// A struct of `size` bytes with the given fields.
    Struct { size: u32, fields: Vec<FieldInfo> },
    /// `count` consecutive elements.
    Array { element: SharedType, count: u32 },
}

/// Immutable runtime type descriptor.
#[derive(Debug, PartialEq, Eq)]
pub struct TypeInfo {
    kind: TypeKind,
    size: u32,
    element_size: u32,
    flags: TypeFlags,
}

impl TypeInfo {
    fn from_kind(kind: TypeKind) -> TypeInfo {
        let (size, element_size, flags) = match &kind {
            TypeKind::Scalar(ty) => (ty.size(), ty.size(), TypeFlags::RAW_HASHABLE),
            TypeKind::Block { size } => (*size, 1, TypeFlags::RAW_HASHABLE),
            TypeKind::String => (ScalarType::String.size(), 1, TypeFlags::HAS_STRING),
            TypeKind::Vector { lanes, .. } => (4 * u32::from(*lanes), 4, TypeFlags::RAW_HASHABLE),
            TypeKind::Range { .. } => (8, 4, TypeFlags::RAW_HASHABLE),
            TypeKind::Struct { size, fields } => {
                let mut flags = TypeFlags::AGGREGATE | TypeFlags::RAW_HASHABLE;
                for field in fields {
                    if field.ty.flags.contains(TypeFlags::HAS_STRING) {
                        flags.insert(TypeFlags::HAS_STRING);
                        flags.remove(TypeFlags::RAW_HASHABLE);
                    }
                }
                (*size, *size, flags)
            }
            TypeKind::Array { element, count } => {
                let mut flags = TypeFlags::AGGREGATE;
                flags.insert(element.flags & (TypeFlags::RAW_HASHABLE | TypeFlags::HAS_STRING));
                (element.size.saturating_mul(*count), element.size, flags)
            }
        };
        TypeInfo {
            kind,
            size,
            element_size,
            flags,
        }
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Total size of the value's memory image in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Size of one element for aggregates, vectors and ranges.
    #[inline]
    pub fn element_size(&self) -> u32 {
        self.element_size
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Whether hashing the raw `size` bytes hashes the value.
    #[inline]
    pub fn is_raw_hashable(&self) -> bool {
        self.flags.contains(TypeFlags::RAW_HASHABLE)
    }

    /// Human-readable shape, for diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            TypeKind::Scalar(ty) => ty.name().to_string(),
            TypeKind::Block { size } => format!("block<{size}>"),
            TypeKind::String => "string".to_string(),
            TypeKind::Vector { element, lanes } => format!("{element:?}x{lanes}"),
            TypeKind::Range { element } => format!("range<{element:?}>"),
            TypeKind::Struct { size, fields } => format!("struct<{size}; {} fields>", fields.len()),
            TypeKind::Array { element, count } => format!("{}[{count}]", element.describe()),
        }
    }
}

/// Shared handle to an interned descriptor. Equality is identity.
#[derive(Clone)]
pub struct SharedType(Arc<TypeInfo>);

impl SharedType {
    /// Whether both handles name the same descriptor.
    #[inline]
    pub fn same(&self, other: &SharedType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for SharedType {
    type Target = TypeInfo;

    #[inline]
    fn deref(&self) -> &TypeInfo {
        &self.0
    }
}

impl PartialEq for SharedType {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for SharedType {}

impl Hash for SharedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for SharedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedType({})", self.0.describe())
    }
}

/// Error when building a descriptor from an inconsistent layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeError {
    /// A struct field extends past the struct's size.
    FieldOutOfBounds { offset: u32, size: u32, struct_size: u32 },
    /// A vector descriptor outside the 2..=4 lane range.
    InvalidLaneCount(u8),
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::FieldOutOfBounds {
                offset,
                size,
                struct_size,
            } => write!(
                f,
                "field at offset {offset} with size {size} exceeds struct size {struct_size}"
            ),
            TypeError::InvalidLaneCount(lanes) => {
                write!(f, "vector must have 2 to 4 lanes, got {lanes}")
            }
        }
    }
}

impl std::error::Error for TypeError {}

/// Interning table for type descriptors.
///
/// # Thread Safety
/// Uses a `RwLock` so descriptors can be requested while other threads read
/// existing ones. Lookups of already-interned shapes only take the read lock.
#[derive(Default)]
pub struct TypeTable {
    types: RwLock<FxHashMap<TypeKind, SharedType>>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a descriptor for `kind`, creating it on first reference.
    pub fn intern(&self, kind: TypeKind) -> SharedType {
        // Fast path: already interned
        if let Some(existing) = self.types.read().get(&kind) {
            return existing.clone();
        }

        let mut guard = self.types.write();
        // Double-check after acquiring the write lock
        if let Some(existing) = guard.get(&kind) {
            return existing.clone();
        }
        let shared = SharedType(Arc::new(TypeInfo::from_kind(kind.clone())));
        guard.insert(kind, shared.clone());
        shared
    }

    /// Descriptor for a register-held type.
    ///
    /// Vectors, ranges and strings map to their dedicated kinds.
    pub fn scalar(&self, ty: ScalarType) -> SharedType {
        let kind = match (ty, ty.lane_kind()) {
            (ScalarType::String, _) => TypeKind::String,
            (ScalarType::Range | ScalarType::URange, Some(element)) => TypeKind::Range { element },
            (_, Some(element)) => TypeKind::Vector {
                element,
                #[allow(clippy::cast_possible_truncation, reason = "lanes() is at most 4")]
                lanes: ty.lanes() as u8,
            },
            (_, None) => TypeKind::Scalar(ty),
        };
        self.intern(kind)
    }

    pub fn block(&self, size: u32) -> SharedType {
        self.intern(TypeKind::Block { size })
    }

    pub fn string(&self) -> SharedType {
        self.intern(TypeKind::String)
    }

    pub fn vector(&self, element: LaneKind, lanes: u8) -> Result<SharedType, TypeError> {
        if !(2..=4).contains(&lanes) {
            return Err(TypeError::InvalidLaneCount(lanes));
        }
        Ok(self.intern(TypeKind::Vector { element, lanes }))
    }

    pub fn array(&self, element: SharedType, count: u32) -> SharedType {
        self.intern(TypeKind::Array { element, count })
    }

    /// Struct descriptor; every field must lie within `size`.
    pub fn structure(&self, size: u32, fields: Vec<FieldInfo>) -> Result<SharedType, TypeError> {
        for field in &fields {
            let end = field.offset.checked_add(field.ty.size());
            if end.map_or(true, |end| end > size) {
                return Err(TypeError::FieldOutOfBounds {
                    offset: field.offset,
                    size: field.ty.size(),
                    struct_size: size,
                });
            }
        }
        Ok(self.intern(TypeKind::Struct { size, fields }))
    }

    /// Number of distinct descriptors.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTable").field("len", &self.len()).finish()
    }
}
