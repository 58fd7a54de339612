//! Slot derivation for dynamically-sized storage arrays

use alloy_primitives::U256;
use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);
    hash
}

/// First data slot of the dynamic array whose length lives at `base_slot`
///
/// `keccak256(base_slot as 32-byte big-endian)` read back as a big-endian integer.
pub fn array_data_slot(base_slot: U256) -> U256 {
    U256::from_be_bytes(keccak256(&base_slot.to_be_bytes::<32>()))
}

/// Slot of element `offset` given the array's first data slot
pub fn element_slot(data_slot: U256, offset: u64) -> U256 {
    data_slot.wrapping_add(U256::from(offset))
}

/// Resolved slot layout of one dynamic array
///
/// The data slot is hashed once on construction and reused for every element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArraySlots {
    base_slot: U256,
    data_slot: U256,
}

impl ArraySlots {
    pub fn new(base_slot: U256) -> Self {
        Self {
            base_slot,
            data_slot: array_data_slot(base_slot),
        }
    }

    /// Slot holding the array length
    pub fn length_slot(&self) -> U256 {
        self.base_slot
    }

    /// First element slot (`keccak256(base_slot)`)
    pub fn data_slot(&self) -> U256 {
        self.data_slot
    }

    pub fn element(&self, offset: u64) -> U256 {
        element_slot(self.data_slot, offset)
    }

    /// Element slots for offsets `0..len`, in index order
    pub fn elements(&self, len: u64) -> impl Iterator<Item = U256> + '_ {
        (0..len).map(move |offset| self.element(offset))
    }
}
