//! LayerZero adapter parameters and message payloads
//!
//! Adapter parameters tell the destination-side relayer how much gas it may
//! spend delivering the message:
//!
//! ```text
//! v1: | version = 1 (uint16) | gasLimit (uint256) |                                   34 bytes
//! v2: | version = 2 (uint16) | gasLimit (uint256) | nativeForDst (uint256) | addr (20) 86 bytes
//! ```
//!
//! Both are `abi.encodePacked`, big-endian.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolValue;

use crate::codec::address_to_bytes32;

/// Gas granted to the destination-side receiver when none is configured
pub const DEFAULT_DST_GAS_LIMIT: u64 = 200_000;

/// Destination gas settings for a LayerZero message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterParams {
    /// Version 1: destination gas limit only
    V1 { gas_limit: u64 },
    /// Version 2: gas limit plus an airdrop of native gas on the destination
    V2 {
        gas_limit: u64,
        native_for_dst: U256,
        address_on_dst: Address,
    },
}

impl Default for AdapterParams {
    fn default() -> Self {
        AdapterParams::V1 {
            gas_limit: DEFAULT_DST_GAS_LIMIT,
        }
    }
}

impl AdapterParams {
    pub fn version(&self) -> u16 {
        match self {
            AdapterParams::V1 { .. } => 1,
            AdapterParams::V2 { .. } => 2,
        }
    }

    pub fn gas_limit(&self) -> u64 {
        match self {
            AdapterParams::V1 { gas_limit } | AdapterParams::V2 { gas_limit, .. } => *gas_limit,
        }
    }

    /// Packed encoding expected by the LayerZero relayer
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::with_capacity(86);
        out.extend_from_slice(&self.version().to_be_bytes());
        out.extend_from_slice(&U256::from(self.gas_limit()).to_be_bytes::<32>());
        if let AdapterParams::V2 {
            native_for_dst,
            address_on_dst,
            ..
        } = self
        {
            out.extend_from_slice(&native_for_dst.to_be_bytes::<32>());
            out.extend_from_slice(address_on_dst.as_slice());
        }
        Bytes::from(out)
    }
}

/// Message body carried to the destination chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw UTF-8 text
    Text(String),
    /// ABI-encoded `uint256` amount
    Amount(U256),
    /// Hyperlane warp-route token message: `bytes32 recipient ++ uint256 amount`
    WarpTransfer { recipient: Address, amount: U256 },
}

impl Payload {
    pub fn encode(&self) -> Bytes {
        match self {
            Payload::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
            Payload::Amount(amount) => Bytes::from(amount.abi_encode()),
            Payload::WarpTransfer { recipient, amount } => {
                let mut out = Vec::with_capacity(64);
                out.extend_from_slice(address_to_bytes32(*recipient).as_slice());
                out.extend_from_slice(&amount.to_be_bytes::<32>());
                Bytes::from(out)
            }
        }
    }
}
