//! The universal value register.
//!
//! A `Register` is 128 bits of untyped storage. Every node produces one and
//! every consumer reinterprets it under the type it statically expects.
//!
//! # Layout
//!
//! - Scalars live in the low bits; constructors zero everything above.
//! - 32-bit vector lanes: lane `i` occupies bits `32*i .. 32*i + 32`.
//! - Range pairs are two 32-bit lanes (`from`, `to`).
//! - `to_bytes` is the little-endian image, so the first `size` bytes of a
//!   value's image are exactly what a typed store writes to memory.
//!
//! # Interpretation Agreement
//!
//! The register does not know what it holds. Reading it under a type wider
//! than, or laid out differently from, the type it was written under is
//! deterministic (the bits are reinterpreted) but meaningless. Correct
//! programs never do it; the type checker upstream guarantees agreement.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    reason = "reinterpreting bit patterns is the purpose of this type"
)]

use std::fmt;

use crate::Address;

/// Untagged 128-bit value container.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Register(u128);

impl Register {
    /// All-zero register. Also the result of a faulted evaluation.
    pub const ZERO: Register = Register(0);

    /// Maximum number of 32-bit lanes a register holds.
    pub const LANES: usize = 4;

    #[inline]
    pub const fn from_bits(bits: u128) -> Self {
        Register(bits)
    }

    #[inline]
    pub const fn bits(self) -> u128 {
        self.0
    }

    /// Little-endian byte image.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Register(u128::from_le_bytes(bytes))
    }

    /// Build a register from the first `bytes.len()` bytes of an image.
    ///
    /// Missing high bytes are zero. Slices longer than 16 bytes are cut.
    pub fn from_prefix(bytes: &[u8]) -> Self {
        let mut image = [0u8; 16];
        let len = bytes.len().min(16);
        image[..len].copy_from_slice(&bytes[..len]);
        Register::from_bytes(image)
    }

    // Scalars

    #[inline]
    pub const fn from_bool(value: bool) -> Self {
        Register(value as u128)
    }

    /// Any non-zero low byte is `true`.
    #[inline]
    pub const fn as_bool(self) -> bool {
        (self.0 as u8) != 0
    }

    #[inline]
    pub const fn from_i8(value: i8) -> Self {
        Register(value as u8 as u128)
    }

    #[inline]
    pub const fn as_i8(self) -> i8 {
        self.0 as u8 as i8
    }

    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Register(value as u128)
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn from_i16(value: i16) -> Self {
        Register(value as u16 as u128)
    }

    #[inline]
    pub const fn as_i16(self) -> i16 {
        self.0 as u16 as i16
    }

    #[inline]
    pub const fn from_u16(value: u16) -> Self {
        Register(value as u128)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0 as u16
    }

    #[inline]
    pub const fn from_i32(value: i32) -> Self {
        Register(value as u32 as u128)
    }

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0 as u32 as i32
    }

    #[inline]
    pub const fn from_u32(value: u32) -> Self {
        Register(value as u128)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub const fn from_i64(value: i64) -> Self {
        Register(value as u64 as u128)
    }

    #[inline]
    pub const fn as_i64(self) -> i64 {
        self.0 as u64 as i64
    }

    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        Register(value as u128)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }

    #[inline]
    pub fn from_f32(value: f32) -> Self {
        Register(value.to_bits() as u128)
    }

    #[inline]
    pub fn as_f32(self) -> f32 {
        f32::from_bits(self.0 as u32)
    }

    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Register(value.to_bits() as u128)
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from_bits(self.0 as u64)
    }

    // Addresses

    /// Raw pointer bits (an encoded `Address`).
    #[inline]
    pub const fn from_ptr(raw: u64) -> Self {
        Register(raw as u128)
    }

    #[inline]
    pub const fn as_ptr(self) -> u64 {
        self.0 as u64
    }

    #[inline]
    pub const fn from_address(address: Address) -> Self {
        Register::from_ptr(address.to_raw())
    }

    /// Decode the pointer bits. `None` when they do not name a region.
    #[inline]
    pub fn as_address(self) -> Option<Address> {
        Address::from_raw(self.as_ptr())
    }

    // Lanes

    /// Read 32-bit lane `index`.
    #[inline]
    pub const fn lane(self, index: usize) -> u32 {
        debug_assert!(index < Self::LANES);
        (self.0 >> (32 * index)) as u32
    }

    /// Pack up to four 32-bit lanes; unused lanes are zero.
    pub fn from_u32_lanes<const N: usize>(lanes: [u32; N]) -> Self {
        debug_assert!(N <= Self::LANES);
        let mut bits = 0u128;
        for (i, lane) in lanes.iter().enumerate() {
            bits |= u128::from(*lane) << (32 * i);
        }
        Register(bits)
    }

    pub fn as_u32_lanes<const N: usize>(self) -> [u32; N] {
        debug_assert!(N <= Self::LANES);
        std::array::from_fn(|i| self.lane(i))
    }

    pub fn from_i32_lanes<const N: usize>(lanes: [i32; N]) -> Self {
        Register::from_u32_lanes(lanes.map(|v| v as u32))
    }

    pub fn as_i32_lanes<const N: usize>(self) -> [i32; N] {
        self.as_u32_lanes::<N>().map(|v| v as i32)
    }

    pub fn from_f32_lanes<const N: usize>(lanes: [f32; N]) -> Self {
        Register::from_u32_lanes(lanes.map(f32::to_bits))
    }

    pub fn as_f32_lanes<const N: usize>(self) -> [f32; N] {
        self.as_u32_lanes::<N>().map(f32::from_bits)
    }

    /// Signed range pair `from..to`.
    #[inline]
    pub fn from_range(from: i32, to: i32) -> Self {
        Register::from_i32_lanes([from, to])
    }

    #[inline]
    pub fn as_range(self) -> (i32, i32) {
        let [from, to] = self.as_i32_lanes::<2>();
        (from, to)
    }

    /// Unsigned range pair `from..to`.
    #[inline]
    pub fn from_urange(from: u32, to: u32) -> Self {
        Register::from_u32_lanes([from, to])
    }

    #[inline]
    pub fn as_urange(self) -> (u32, u32) {
        let [from, to] = self.as_u32_lanes::<2>();
        (from, to)
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Register({:#034x})", self.0)
    }
}
