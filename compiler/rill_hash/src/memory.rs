//! Read access to runtime memory.

use rill_ir::{Address, Register};

/// Bounds-checked view of the memory an address can point into.
///
/// Implementors resolve an [`Address`] to bytes and hand them to `sink`.
/// A region may deliver a range in several pieces (the sink sees them in
/// order). Both visitors return `false`, without calling `sink`, when the
/// requested range is not entirely readable.
pub trait MemoryRead {
    /// Visit `len` bytes starting at `address`.
    fn visit_bytes(&self, address: Address, len: u32, sink: &mut dyn FnMut(&[u8])) -> bool;

    /// Visit the bytes of the NUL-terminated string at `address`, without
    /// the terminator. Fails if no terminator is found inside the region.
    fn visit_cstr(&self, address: Address, sink: &mut dyn FnMut(&[u8])) -> bool;

    /// Load up to 16 bytes as the low bytes of a register.
    fn read_register(&self, address: Address, len: u32) -> Option<Register> {
        let mut image = [0u8; 16];
        let mut filled = 0usize;
        let ok = self.visit_bytes(address, len.min(16), &mut |piece| {
            let end = (filled + piece.len()).min(image.len());
            image[filled..end].copy_from_slice(&piece[..end - filled]);
            filled = end;
        });
        ok.then(|| Register::from_bytes(image))
    }

    /// Load a raw little-endian `u64` (pointer-sized field).
    fn read_u64(&self, address: Address) -> Option<u64> {
        self.read_register(address, 8).map(Register::as_u64)
    }
}

impl<M: MemoryRead + ?Sized> MemoryRead for &M {
    fn visit_bytes(&self, address: Address, len: u32, sink: &mut dyn FnMut(&[u8])) -> bool {
        (**self).visit_bytes(address, len, sink)
    }

    fn visit_cstr(&self, address: Address, sink: &mut dyn FnMut(&[u8])) -> bool {
        (**self).visit_cstr(address, sink)
    }
}
