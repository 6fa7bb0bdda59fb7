//! Flat byte memory for unit tests: only the data region is backed.

use rill_ir::{Address, Region};

use crate::MemoryRead;

#[derive(Default)]
pub(crate) struct FlatMemory {
    pub data: Vec<u8>,
}

impl FlatMemory {
    pub fn new(data: Vec<u8>) -> Self {
        FlatMemory { data }
    }

    /// Append bytes and return their address.
    pub fn push(&mut self, bytes: &[u8]) -> Address {
        let offset = u32::try_from(self.data.len()).unwrap_or(u32::MAX);
        self.data.extend_from_slice(bytes);
        Address::data(offset)
    }

    fn slice_from(&self, address: Address) -> Option<&[u8]> {
        if address.region() != Region::Data {
            return None;
        }
        self.data.get(address.offset() as usize..)
    }
}

impl MemoryRead for FlatMemory {
    fn visit_bytes(&self, address: Address, len: u32, sink: &mut dyn FnMut(&[u8])) -> bool {
        match self.slice_from(address).and_then(|rest| rest.get(..len as usize)) {
            Some(bytes) => {
                sink(bytes);
                true
            }
            None => false,
        }
    }

    fn visit_cstr(&self, address: Address, sink: &mut dyn FnMut(&[u8])) -> bool {
        let Some(rest) = self.slice_from(address) else {
            return false;
        };
        match rest.iter().position(|&b| b == 0) {
            Some(len) => {
                sink(&rest[..len]);
                true
            }
            None => false,
        }
    }
}
