//! Rill IR - shared value and type vocabulary of the execution core.
//!
//! This crate contains the data every other layer agrees on:
//! - `Register`: the untagged 128-bit value container passed between nodes
//! - `ScalarType`: the closed set of register-held value types
//! - `TypeInfo` / `TypeTable`: runtime type descriptors for generic operations
//! - `Address` / `Region`: safe addresses into context-owned memory
//! - `Span`: source locations attached to every node
//! - `UnaryOp` / `BinaryOp`: operator identities (also the fusion catalog keys)
//!
//! # Design Philosophy
//!
//! Nothing here has behavior beyond reinterpretation and bookkeeping. The
//! producer and consumer of a `Register` agree on its type because the tree
//! was type-checked upstream; the register never re-checks.

/// Compile-time assertion that a type has a specific size.
///
/// Used to pin the layout of the register and address types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod address;
mod operators;
mod register;
mod scalar;
mod span;
mod type_info;

pub use address::{Address, Region};
pub use operators::{BinaryOp, UnaryOp};
pub use register::Register;
pub use scalar::{LaneKind, ScalarType};
pub use span::Span;
pub use type_info::{
    FieldInfo, SharedType, TypeError, TypeFlags, TypeInfo, TypeKind, TypeTable,
};

static_assert_size!(Register, 16);
static_assert_size!(Address, 8);
static_assert_size!(Span, 8);
