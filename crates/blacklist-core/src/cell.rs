//! Decoding of raw 32-byte storage cells

use alloy_primitives::{Address, B256, U256};

use crate::constants::ADDRESS_OFFSET;
use crate::{Error, Result};

/// Decode an array length cell (big-endian unsigned integer)
pub fn decode_length(cell: B256) -> Result<u64> {
    let length = U256::from_be_bytes(cell.0);
    u64::try_from(length)
        .map_err(|_| Error::Decode(format!("array length {length} does not fit in u64")))
}

/// Whether the upper 96 bits of an address cell are set
///
/// Solidity left-pads addresses with zeroes, so a set high byte usually means
/// the slot arithmetic points at something that is not an address.
pub fn has_dirty_high_bits(cell: &B256) -> bool {
    cell.0[..ADDRESS_OFFSET].iter().any(|b| *b != 0)
}

/// Decode an element cell into an address (low 160 bits of the cell)
///
/// Any 20 bytes form a valid address, and its EIP-55 form is produced at
/// render time, so this cannot fail.
pub fn decode_address(cell: B256) -> Address {
    Address::from_slice(&cell.0[ADDRESS_OFFSET..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    fn cell(value: U256) -> B256 {
        B256::from(value.to_be_bytes::<32>())
    }

    #[test]
    fn test_decode_length() {
        assert_eq!(decode_length(B256::ZERO).unwrap(), 0);
        assert_eq!(decode_length(cell(U256::from(3))).unwrap(), 3);
        assert_eq!(
            decode_length(cell(U256::from(u64::MAX))).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_decode_length_overflow() {
        let overflow = cell(U256::from(u64::MAX) + U256::from(1));
        assert!(matches!(decode_length(overflow), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_address_low_bits() {
        let cell = b256!("000000000000000000000000d6e6dbf4f7ea0ac412fd8b65ed297e64bb7a06e1");
        let decoded = decode_address(cell);
        assert_eq!(decoded, address!("d6e6dbf4f7ea0ac412fd8b65ed297e64bb7a06e1"));
        assert_eq!(
            decoded.to_checksum(None),
            "0xd6E6dBf4F7EA0ac412fD8b65ED297e64BB7a06E1"
        );
        assert!(!has_dirty_high_bits(&cell));
    }

    #[test]
    fn test_decode_address_ignores_high_bits() {
        let cell = b256!("ffffffffffffffffffffffffd6e6dbf4f7ea0ac412fd8b65ed297e64bb7a06e1");
        assert!(has_dirty_high_bits(&cell));
        assert_eq!(
            decode_address(cell),
            address!("d6e6dbf4f7ea0ac412fd8b65ed297e64bb7a06e1")
        );
    }

    #[test]
    fn test_decode_zero_cell() {
        assert_eq!(decode_address(B256::ZERO), Address::ZERO);
    }
}
