//! CRC32C block hashing.
//!
//! Castagnoli CRC, reflected polynomial `0x82F63B78`, one byte per step. The
//! state starts at `0xFFFF_FFFF` and is never inverted at the end, which is
//! exactly what chaining the SSE4.2 `crc32` byte instruction computes.

use crate::avoid_sentinels;

const POLYNOMIAL: u32 = 0x82F6_3B78;
const SEED: u32 = 0xFFFF_FFFF;

static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        #[allow(clippy::cast_possible_truncation, reason = "i < 256")]
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 0 {
                crc >> 1
            } else {
                (crc >> 1) ^ POLYNOMIAL
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

#[inline]
fn step(crc: u32, byte: u8) -> u32 {
    TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8)
}

/// Incremental CRC32C state for inputs that arrive in pieces.
///
/// Feeding the pieces of a byte sequence in order gives the same result as
/// hashing the concatenation with [`hash_block`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Crc32 {
    state: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Crc32 { state: SEED }
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        self.state = bytes.iter().fold(self.state, |crc, &b| step(crc, b));
    }

    /// Fold a nested hash in as its 4-byte little-endian image.
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.update(&value.to_le_bytes());
    }

    /// Raw CRC state, sentinels included.
    #[inline]
    pub fn raw(&self) -> u32 {
        self.state
    }

    /// Finished hash with sentinels remapped.
    #[inline]
    pub fn finish(&self) -> u32 {
        avoid_sentinels(self.state)
    }
}

/// Hash a byte block.
pub fn hash_block(bytes: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(bytes);
    crc.finish()
}

/// Hash a NUL-terminated byte string.
///
/// Stops at the first NUL, or at the end of the slice if there is none.
pub fn hash_cstr(bytes: &[u8]) -> u32 {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    hash_block(&bytes[..len])
}
