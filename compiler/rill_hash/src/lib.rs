//! Rill Hash - canonical hashing of runtime values.
//!
//! Every hash produced here is meant to key open-addressing containers,
//! which reserve two codes:
//!
//! - [`HASH_EMPTY`] (`0`): slot never used
//! - [`HASH_KILLED`] (`1`): slot tombstoned
//!
//! A natural hash landing on either is replaced by [`HASH_REMAP`], so no
//! public function here can return a sentinel.
//!
//! # Layers
//!
//! - [`hash_block`] / [`hash_cstr`]: byte-wise CRC32C over raw bytes
//! - [`hash_value`]: per-type hash of a Rust scalar (`HashScalar`)
//! - [`hash_scalar`]: dispatch by [`ScalarType`](rill_ir::ScalarType) for a
//!   `Register`
//! - [`hash_typed`]: descriptor-driven hash of a value in memory

mod crc;
mod memory;
mod scalar;
mod typed;

pub use crc::{hash_block, hash_cstr, Crc32};
pub use memory::MemoryRead;
pub use scalar::{hash_scalar, hash_value, HashScalar};
pub use typed::{hash_ref, hash_typed};

#[cfg(test)]
mod test_memory;

/// Reserved code for an empty container slot.
pub const HASH_EMPTY: u32 = 0;

/// Reserved code for a tombstoned container slot.
pub const HASH_KILLED: u32 = 1;

/// Replacement for a natural hash that collides with a sentinel.
pub const HASH_REMAP: u32 = 16_777_619;

/// Replace sentinel codes with [`HASH_REMAP`].
#[inline]
pub const fn avoid_sentinels(hash: u32) -> u32 {
    if hash <= HASH_KILLED {
        HASH_REMAP
    } else {
        hash
    }
}
