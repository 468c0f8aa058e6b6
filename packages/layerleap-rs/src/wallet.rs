//! Wallet provider interface
//!
//! [`WalletClient`] is the typed replacement for an injected EIP-1193
//! provider: one method per JSON-RPC call the bridge pipeline makes. The
//! pipeline only ever talks to the chain through this trait, so any signer
//! (a local key, a remote wallet, a test double) can drive it.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::WalletError;
use crate::registry::ChainDescriptor;

/// A contract call or value transfer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: Option<u64>,
}

impl CallRequest {
    /// Read-only call with no value attached
    pub fn view(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            ..Default::default()
        }
    }
}

/// Native currency block of `wallet_addEthereumChain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters of `wallet_addEthereumChain` (EIP-3085)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    /// Hex chain ID, e.g. "0xa"
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl AddChainParams {
    pub fn numeric_chain_id(&self) -> Option<u64> {
        u64::from_str_radix(self.chain_id.trim_start_matches("0x"), 16).ok()
    }
}

impl From<&ChainDescriptor> for AddChainParams {
    fn from(chain: &ChainDescriptor) -> Self {
        Self {
            chain_id: format!("{:#x}", chain.evm_chain_id),
            chain_name: chain.display_name.clone(),
            native_currency: NativeCurrency {
                name: chain.native_token.name.clone(),
                symbol: chain.native_token.symbol.clone(),
                decimals: chain.native_token.decimals,
            },
            rpc_urls: vec![chain.rpc_url.clone()],
            block_explorer_urls: vec![chain.explorer_url.clone()],
        }
    }
}

/// Provider events (`accountsChanged`, `chainChanged`)
///
/// [`crate::BridgeService::bridge`] watches these between quoting and
/// sending and aborts if either changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Authorized accounts changed; a local-key wallet never sends this
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Typed wallet provider
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// `eth_accounts`: accounts already authorized, possibly empty
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// `eth_requestAccounts`: ask the user to authorize accounts
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// `net_version`
    async fn net_version(&self) -> Result<u64, WalletError>;

    /// `wallet_switchEthereumChain`; fails with
    /// [`WalletError::ChainNotAdded`] for chains the wallet does not know
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// `wallet_addEthereumChain`
    async fn add_chain(&self, params: &AddChainParams) -> Result<(), WalletError>;

    /// `eth_getBalance` at the latest block
    async fn balance(&self, address: Address) -> Result<U256, WalletError>;

    /// `eth_call`
    async fn call(&self, request: &CallRequest) -> Result<Bytes, WalletError>;

    /// `eth_estimateGas`
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, WalletError>;

    /// `eth_sendTransaction`; resolves once the wallet has broadcast the
    /// transaction, not when it is mined
    async fn send_transaction(&self, request: &CallRequest) -> Result<TxHash, WalletError>;

    /// `eth_getTransactionReceipt` reduced to its status: `None` while the
    /// transaction is unknown or unmined
    async fn transaction_status(&self, hash: TxHash) -> Result<Option<bool>, WalletError>;

    /// Subscribe to provider events
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
