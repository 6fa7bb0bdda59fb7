//! Per-type hashing of register-held values.

use std::hash::{Hash, Hasher};

use rill_ir::{Register, ScalarType};
use rustc_hash::FxHasher;

use crate::{avoid_sentinels, hash_block, MemoryRead};

/// A Rust value with a canonical 32-bit hash.
///
/// Scalars go through `FxHasher` (floats by bit pattern, so `-0.0` and
/// `0.0` differ and every NaN payload is distinct). Lane arrays hash their
/// little-endian byte image with [`hash_block`].
pub trait HashScalar: Copy {
    /// Natural hash, before sentinel avoidance.
    fn natural_hash(self) -> u32;
}

fn fx_hash<T: Hash>(value: T) -> u32 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    #[allow(clippy::cast_possible_truncation, reason = "hashes are truncated to 32 bits")]
    let hash = hasher.finish() as u32;
    hash
}

macro_rules! impl_hash_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HashScalar for $ty {
                #[inline]
                fn natural_hash(self) -> u32 {
                    fx_hash(self)
                }
            }
        )*
    };
}

impl_hash_scalar!(bool, i8, u8, i16, u16, i32, u32, i64, u64);

impl HashScalar for f32 {
    #[inline]
    fn natural_hash(self) -> u32 {
        fx_hash(self.to_bits())
    }
}

impl HashScalar for f64 {
    #[inline]
    fn natural_hash(self) -> u32 {
        fx_hash(self.to_bits())
    }
}

macro_rules! impl_hash_lanes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<const N: usize> HashScalar for [$ty; N] {
                fn natural_hash(self) -> u32 {
                    let mut image = [0u8; 16];
                    for (chunk, lane) in image.chunks_exact_mut(4).zip(self) {
                        chunk.copy_from_slice(&lane.to_le_bytes());
                    }
                    hash_block(&image[..4 * N.min(4)])
                }
            }
        )*
    };
}

impl_hash_lanes!(f32, i32, u32);

/// Hash a Rust value.
#[inline]
pub fn hash_value<T: HashScalar>(value: T) -> u32 {
    avoid_sentinels(value.natural_hash())
}

/// Hash a register interpreted as `ty`.
///
/// The register is reinterpreted without checking; a value written under
/// another type still hashes deterministically. Only `String` touches
/// memory: the null address hashes as the empty string, and `None` means
/// the string was not readable.
pub fn hash_scalar(ty: ScalarType, value: Register, memory: &dyn MemoryRead) -> Option<u32> {
    let hash = match ty {
        ScalarType::Bool => hash_value(value.as_bool()),
        ScalarType::Int8 => hash_value(value.as_i8()),
        ScalarType::UInt8 => hash_value(value.as_u8()),
        ScalarType::Int16 => hash_value(value.as_i16()),
        ScalarType::UInt16 => hash_value(value.as_u16()),
        ScalarType::Int32 => hash_value(value.as_i32()),
        ScalarType::UInt32 => hash_value(value.as_u32()),
        ScalarType::Int64 => hash_value(value.as_i64()),
        ScalarType::UInt64 => hash_value(value.as_u64()),
        ScalarType::Float => hash_value(value.as_f32()),
        ScalarType::Double => hash_value(value.as_f64()),
        ScalarType::Ptr => hash_value(value.as_ptr()),
        ScalarType::String => return hash_string(value, memory),
        ScalarType::Float2 => hash_value(value.as_f32_lanes::<2>()),
        ScalarType::Float3 => hash_value(value.as_f32_lanes::<3>()),
        ScalarType::Float4 => hash_value(value.as_f32_lanes::<4>()),
        ScalarType::Int2 | ScalarType::Range => hash_value(value.as_i32_lanes::<2>()),
        ScalarType::Int3 => hash_value(value.as_i32_lanes::<3>()),
        ScalarType::Int4 => hash_value(value.as_i32_lanes::<4>()),
        ScalarType::UInt2 | ScalarType::URange => hash_value(value.as_u32_lanes::<2>()),
        ScalarType::UInt3 => hash_value(value.as_u32_lanes::<3>()),
        ScalarType::UInt4 => hash_value(value.as_u32_lanes::<4>()),
    };
    Some(hash)
}

pub(crate) fn hash_string(value: Register, memory: &dyn MemoryRead) -> Option<u32> {
    let address = value.as_address()?;
    if address.is_null() {
        return Some(hash_block(&[]));
    }
    let mut crc = crate::Crc32::new();
    let readable = memory.visit_cstr(address, &mut |piece| crc.update(piece));
    readable.then(|| crc.finish())
}

#[cfg(test)]
mod tests;
