//! Descriptor-driven hashing of values in memory.

use rill_ir::{Address, Register, TypeInfo, TypeKind};

use crate::scalar::hash_string;
use crate::{Crc32, MemoryRead};

/// Hash the value of type `ty` stored at `address`.
///
/// Raw-hashable layouts hash their `size` bytes. A string field is
/// dereferenced and hashed by content, so aggregates holding strings hash
/// each field (or element) separately and fold the 4-byte little-endian
/// images of those hashes into one CRC.
///
/// Returns `None` when any part of the value is unreadable. The null
/// address is never readable, even for zero-sized types.
pub fn hash_typed(memory: &dyn MemoryRead, address: Address, ty: &TypeInfo) -> Option<u32> {
    if address.is_null() {
        return None;
    }
    match ty.kind() {
        TypeKind::String => {
            let pointer = memory.read_u64(address)?;
            hash_string(Register::from_ptr(pointer), memory)
        }
        TypeKind::Struct { fields, .. } if !ty.is_raw_hashable() => {
            let mut crc = Crc32::new();
            for field in fields {
                let field_address = address.add(field.offset)?;
                crc.update_u32(hash_typed(memory, field_address, &field.ty)?);
            }
            Some(crc.finish())
        }
        TypeKind::Array { element, count } if !ty.is_raw_hashable() => {
            let mut crc = Crc32::new();
            for index in 0..*count {
                let element_address = address.add(index.checked_mul(element.size())?)?;
                crc.update_u32(hash_typed(memory, element_address, element)?);
            }
            Some(crc.finish())
        }
        TypeKind::Scalar(_)
        | TypeKind::Block { .. }
        | TypeKind::Vector { .. }
        | TypeKind::Range { .. }
        | TypeKind::Struct { .. }
        | TypeKind::Array { .. } => hash_ref(memory, address, ty.size()),
    }
}

/// Hash exactly `size` bytes at `address`.
///
/// `size == 0` over a readable address is the empty-block hash.
pub fn hash_ref(memory: &dyn MemoryRead, address: Address, size: u32) -> Option<u32> {
    if address.is_null() {
        return None;
    }
    let mut crc = Crc32::new();
    let readable = memory.visit_bytes(address, size, &mut |piece| crc.update(piece));
    readable.then(|| crc.finish())
}
