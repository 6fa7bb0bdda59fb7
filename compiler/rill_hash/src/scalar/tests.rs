use super::*;
use crate::test_memory::FlatMemory;
use crate::{HASH_EMPTY, HASH_KILLED};
use rill_ir::Address;

fn hash(ty: ScalarType, value: Register) -> u32 {
    match hash_scalar(ty, value, &FlatMemory::default()) {
        Some(hash) => hash,
        None => panic!("{ty} should hash without memory"),
    }
}

#[test]
fn test_scalar_dispatch_matches_direct_hash() {
    assert_eq!(hash(ScalarType::Int32, Register::from_i32(-5)), hash_value(-5i32));
    assert_eq!(hash(ScalarType::UInt8, Register::from_u8(200)), hash_value(200u8));
    assert_eq!(hash(ScalarType::Int64, Register::from_i64(1 << 40)), hash_value(1i64 << 40));
    assert_eq!(hash(ScalarType::Double, Register::from_f64(2.5)), hash_value(2.5f64));
    assert_eq!(hash(ScalarType::Bool, Register::from_bool(true)), hash_value(true));
    assert_eq!(
        hash(ScalarType::Float3, Register::from_f32_lanes([1.0, 2.0, 3.0])),
        hash_value([1.0f32, 2.0, 3.0])
    );
}

#[test]
fn test_floats_hash_by_bits() {
    assert_ne!(hash_value(0.0f32), hash_value(-0.0f32));
    let nan = f64::NAN;
    assert_eq!(hash_value(nan), hash_value(nan));
}

#[test]
fn test_vectors_hash_their_byte_image() {
    let mut image = Vec::new();
    for lane in [7i32, -1, 40] {
        image.extend_from_slice(&lane.to_le_bytes());
    }
    assert_eq!(hash_value([7i32, -1, 40]), hash_block(&image));
}

#[test]
fn test_range_hashes_like_two_lanes() {
    let reg = Register::from_range(3, 10);
    assert_eq!(hash(ScalarType::Range, reg), hash_value([3i32, 10]));
    assert_eq!(hash(ScalarType::Range, reg), hash(ScalarType::Int2, reg));
}

#[test]
fn test_reinterpreting_cast_is_deterministic() {
    // A float register read as an int still hashes, and the same way twice.
    let reg = Register::from_f32(1.0);
    let first = hash(ScalarType::Int32, reg);
    assert_eq!(first, hash(ScalarType::Int32, reg));
    assert_eq!(first, hash_value(1.0f32.to_bits().cast_signed()));
}

#[test]
fn test_no_scalar_type_produces_sentinel() {
    for ty in ScalarType::ALL {
        if ty == ScalarType::String {
            continue;
        }
        for bits in [0u128, 1, u128::MAX, 0xFFFF_FFFF] {
            let h = hash(ty, Register::from_bits(bits));
            assert_ne!(h, HASH_EMPTY, "{ty}");
            assert_ne!(h, HASH_KILLED, "{ty}");
        }
    }
}

#[test]
fn test_string_hashes_content() {
    let mut memory = FlatMemory::default();
    let first = memory.push(b"hello\0");
    let second = memory.push(b"hello\0");
    let a = hash_scalar(ScalarType::String, Register::from_address(first), &memory);
    let b = hash_scalar(ScalarType::String, Register::from_address(second), &memory);
    assert_eq!(a, Some(hash_block(b"hello")));
    assert_eq!(a, b);
}

#[test]
fn test_null_string_is_empty() {
    let memory = FlatMemory::default();
    assert_eq!(
        hash_scalar(ScalarType::String, Register::ZERO, &memory),
        Some(hash_block(&[]))
    );
}

#[test]
fn test_unreadable_string() {
    let memory = FlatMemory::new(b"no terminator".to_vec());
    let reg = Register::from_address(Address::data(0));
    assert_eq!(hash_scalar(ScalarType::String, reg, &memory), None);
    let stack = Register::from_address(Address::stack(0));
    assert_eq!(hash_scalar(ScalarType::String, stack, &memory), None);
    let garbage = Register::from_u64(u64::MAX);
    assert_eq!(hash_scalar(ScalarType::String, garbage, &memory), None);
}
