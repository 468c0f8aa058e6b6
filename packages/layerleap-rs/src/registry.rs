//! Chain and token registry
//!
//! One immutable table mapping EVM chain IDs to the identifiers each bridge
//! protocol uses for the same chain. Build it once (usually with
//! [`ChainRegistry::mainnet`]) and share it behind an `Arc`.

use std::collections::BTreeMap;

use crate::error::BridgeError;
use crate::types::Protocol;

/// Optimism mainnet, the chain every bridge request starts from
pub const SOURCE_CHAIN_ID: u64 = 10;

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// `None` for the chain's native token
    pub address: Option<String>,
}

impl TokenInfo {
    pub fn ether() -> Self {
        Self {
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            address: None,
        }
    }

    fn native(symbol: &str, name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals: 18,
            address: None,
        }
    }
}

/// A chain as known to the bridge front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDescriptor {
    pub evm_chain_id: u64,
    /// Short lowercase key ("arbitrum")
    pub key: String,
    pub display_name: String,
    /// LayerZero v1 chain ID
    pub layerzero_id: Option<u16>,
    /// Hyperlane domain
    pub hyperlane_domain: Option<u32>,
    /// Stargate chain ID
    pub stargate_id: Option<u16>,
    pub native_token: TokenInfo,
    pub logo: String,
    /// Public RPC used when asking a wallet to add the chain
    pub rpc_url: String,
    pub explorer_url: String,
}

impl ChainDescriptor {
    /// The protocol-specific identifier for this chain, if the protocol
    /// supports it
    pub fn protocol_id(&self, protocol: Protocol) -> Option<u32> {
        match protocol {
            Protocol::LayerZeroBridge | Protocol::LayerZeroEndpoint => {
                self.layerzero_id.map(u32::from)
            }
            Protocol::Hyperlane => self.hyperlane_domain,
            Protocol::Stargate => self.stargate_id.map(u32::from),
        }
    }

    /// Explorer link for a transaction hash
    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }
}

/// Immutable chain registry keyed by EVM chain ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainDescriptor>,
}

impl ChainRegistry {
    pub fn new(chains: impl IntoIterator<Item = ChainDescriptor>) -> Self {
        Self {
            chains: chains.into_iter().map(|c| (c.evm_chain_id, c)).collect(),
        }
    }

    /// Registry of the mainnet chains LayerLeap bridges between
    pub fn mainnet() -> Self {
        #[allow(clippy::too_many_arguments)]
        fn chain(
            evm_chain_id: u64,
            key: &str,
            display_name: &str,
            layerzero_id: Option<u16>,
            stargate_id: Option<u16>,
            native_token: TokenInfo,
            rpc_url: &str,
            explorer_url: &str,
        ) -> ChainDescriptor {
            ChainDescriptor {
                evm_chain_id,
                key: key.to_string(),
                display_name: display_name.to_string(),
                layerzero_id,
                // Hyperlane domains equal EVM chain IDs on these networks
                hyperlane_domain: Some(evm_chain_id as u32),
                stargate_id,
                native_token,
                logo: format!("/logos/{}.svg", key),
                rpc_url: rpc_url.to_string(),
                explorer_url: explorer_url.to_string(),
            }
        }

        Self::new([
            chain(
                1,
                "ethereum",
                "Ethereum",
                Some(101),
                Some(101),
                TokenInfo::ether(),
                "https://eth.llamarpc.com",
                "https://etherscan.io",
            ),
            chain(
                10,
                "optimism",
                "Optimism",
                Some(111),
                Some(111),
                TokenInfo::ether(),
                "https://mainnet.optimism.io",
                "https://optimistic.etherscan.io",
            ),
            chain(
                56,
                "bsc",
                "BNB Chain",
                Some(102),
                Some(102),
                TokenInfo::native("BNB", "BNB"),
                "https://bsc-dataseed.binance.org",
                "https://bscscan.com",
            ),
            chain(
                137,
                "polygon",
                "Polygon",
                Some(109),
                Some(109),
                TokenInfo::native("POL", "Polygon Ecosystem Token"),
                "https://polygon-rpc.com",
                "https://polygonscan.com",
            ),
            chain(
                324,
                "zksync",
                "zkSync Era",
                Some(165),
                None,
                TokenInfo::ether(),
                "https://mainnet.era.zksync.io",
                "https://explorer.zksync.io",
            ),
            chain(
                8453,
                "base",
                "Base",
                Some(184),
                Some(184),
                TokenInfo::ether(),
                "https://mainnet.base.org",
                "https://basescan.org",
            ),
            chain(
                42161,
                "arbitrum",
                "Arbitrum One",
                Some(110),
                Some(110),
                TokenInfo::ether(),
                "https://arb1.arbitrum.io/rpc",
                "https://arbiscan.io",
            ),
            chain(
                43114,
                "avalanche",
                "Avalanche C-Chain",
                Some(106),
                Some(106),
                TokenInfo::native("AVAX", "Avalanche"),
                "https://api.avax.network/ext/bc/C/rpc",
                "https://snowtrace.io",
            ),
            chain(
                59144,
                "linea",
                "Linea",
                Some(183),
                Some(183),
                TokenInfo::ether(),
                "https://rpc.linea.build",
                "https://lineascan.build",
            ),
            chain(
                534352,
                "scroll",
                "Scroll",
                Some(214),
                None,
                TokenInfo::ether(),
                "https://rpc.scroll.io",
                "https://scrollscan.com",
            ),
        ])
    }

    pub fn get(&self, evm_chain_id: u64) -> Option<&ChainDescriptor> {
        self.chains.get(&evm_chain_id)
    }

    /// Look a chain up by key ("base") or decimal chain ID ("8453")
    pub fn find(&self, name_or_id: &str) -> Option<&ChainDescriptor> {
        let needle = name_or_id.trim().to_lowercase();
        if let Ok(id) = needle.parse::<u64>() {
            return self.get(id);
        }
        self.chains
            .values()
            .find(|c| c.key == needle || c.display_name.to_lowercase() == needle)
    }

    /// Like [`Self::get`] but an absent chain is an `UnsupportedChain` error
    pub fn require(&self, evm_chain_id: u64) -> Result<&ChainDescriptor, BridgeError> {
        self.get(evm_chain_id)
            .ok_or(BridgeError::UnsupportedChain {
                chain_id: evm_chain_id,
            })
    }

    /// Protocol identifier for a chain; `UnsupportedChain` if the chain is
    /// unknown or the protocol does not serve it
    pub fn protocol_id(&self, protocol: Protocol, evm_chain_id: u64) -> Result<u32, BridgeError> {
        self.require(evm_chain_id)?
            .protocol_id(protocol)
            .ok_or(BridgeError::UnsupportedChain {
                chain_id: evm_chain_id,
            })
    }

    /// Chains reachable from `source` through `protocol`
    pub fn destinations(&self, source: u64, protocol: Protocol) -> Vec<&ChainDescriptor> {
        self.chains
            .values()
            .filter(|c| c.evm_chain_id != source && c.protocol_id(protocol).is_some())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.values()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::mainnet()
    }
}
