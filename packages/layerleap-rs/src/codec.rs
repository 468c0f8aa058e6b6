//! Recipient address encoding
//!
//! Every supported protocol takes the destination account as 32 bytes: the
//! 20-byte EVM address left-padded with 12 zero bytes (`bytes32` for the
//! bridge and Hyperlane, raw `bytes` for the LayerZero endpoint).

use alloy::primitives::{Address, B256};

use crate::error::BridgeError;

/// Parse a 0x-prefixed (or bare) 20-byte hex address
///
/// Also accepts a 32-byte padded address whose first 12 bytes are zero.
pub fn parse_address(addr: &str) -> Result<Address, BridgeError> {
    let trimmed = addr.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(hex_part)
        .map_err(|e| BridgeError::InvalidAddress(format!("{}: {}", addr, e)))?;

    match bytes.len() {
        20 => Ok(Address::from_slice(&bytes)),
        32 => {
            if bytes[..12].iter().any(|&b| b != 0) {
                return Err(BridgeError::InvalidAddress(format!(
                    "{}: 32-byte address has non-zero padding",
                    addr
                )));
            }
            Ok(Address::from_slice(&bytes[12..]))
        }
        len => Err(BridgeError::InvalidAddress(format!(
            "{}: expected 20 or 32 bytes, got {}",
            addr, len
        ))),
    }
}

/// Left-pad an address to 32 bytes
pub fn address_to_bytes32(addr: Address) -> B256 {
    let mut result = [0u8; 32];
    result[12..].copy_from_slice(addr.as_slice());
    B256::from(result)
}

/// Extract the address from the low-order 20 bytes of a bytes32
pub fn bytes32_to_address(bytes: B256) -> Address {
    Address::from_slice(&bytes[12..])
}

/// Left-padded address as `0x` + 64 hex characters
pub fn pad_address_hex(addr: Address) -> String {
    format!("0x{}", hex::encode(address_to_bytes32(addr)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_parse_address_with_and_without_prefix() {
        let a = parse_address(ADDR).unwrap();
        let b = parse_address(&ADDR[2..]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_slice()[0], 0xf3);
    }

    #[test]
    fn test_parse_padded_address() {
        let padded = "0x000000000000000000000000f39fd6e51aad88f6f4ce6ab8827279cfffb92266";
        assert_eq!(parse_address(padded).unwrap(), parse_address(ADDR).unwrap());
    }

    #[test]
    fn test_parse_address_rejects_dirty_padding() {
        let dirty = "0x010000000000000000000000f39fd6e51aad88f6f4ce6ab8827279cfffb92266";
        assert!(matches!(
            parse_address(dirty),
            Err(BridgeError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_address_invalid() {
        assert!(parse_address("0xdead").is_err());
        assert!(parse_address("not-an-address").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_pad_address_hex_layout() {
        let addr = parse_address(ADDR).unwrap();
        let padded = pad_address_hex(addr);

        assert!(padded.starts_with("0x"));
        assert_eq!(padded.len(), 66);
        assert_eq!(&padded[2..26], "000000000000000000000000");
        assert_eq!(&padded[26..], ADDR[2..].to_lowercase());
    }

    #[test]
    fn test_pad_address_low_bytes_for_many_addresses() {
        for seed in 0u8..=255 {
            let raw: [u8; 20] = std::array::from_fn(|i| seed.wrapping_mul(31).wrapping_add(i as u8));
            let addr = Address::from(raw);
            let padded = address_to_bytes32(addr);

            assert_eq!(&padded[..12], &[0u8; 12]);
            assert_eq!(&padded[12..], &raw);
            assert_eq!(bytes32_to_address(padded), addr);
            assert_eq!(pad_address_hex(addr).len(), 66);
        }
    }
}
