//! LayerLeap-RS: ETH bridge pipeline for LayerZero, Hyperlane and Stargate
//!
//! Bridges native ETH from the source chain (Optimism) to other EVM chains:
//!
//! - **Network Guard** - Keep the wallet on the source chain, adding it if needed
//! - **Registry** - Chain metadata and per-protocol chain identifiers
//! - **Fees** - Protocol fee quotes with a safety buffer
//! - **Builder** - Recipient padding, adapter parameters and calldata per protocol
//! - **Submitter** - Balance check, dry run, gas policy and submission with retry
//! - **History** - Transaction log persisted in a key-value store
//! - **Pipeline** - [`BridgeService`], the above wired together
//! - **EVM Module** - Local private-key wallet over JSON-RPC
//!
//! All chain access goes through the [`WalletClient`] trait.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! layerleap-rs = { path = "../layerleap-rs" }
//! ```
//!
//! ## Feature Flags
//!
//! - `evm` - Enable the alloy-backed [`evm::EvmWallet`] (default)

pub mod adapter;
pub mod builder;
pub mod codec;
pub mod contracts;
pub mod error;
pub mod fees;
pub mod history;
pub mod network;
pub mod pipeline;
pub mod redact;
pub mod registry;
pub mod retry;
pub mod settings;
pub mod stargate;
pub mod submitter;
pub mod types;
pub mod wallet;

#[cfg(feature = "evm")]
pub mod evm;

#[cfg(test)]
mod testing;

pub use adapter::{AdapterParams, Payload, DEFAULT_DST_GAS_LIMIT};
pub use builder::{ContractAddresses, PreparedCall, RequestBuilder};
pub use codec::{address_to_bytes32, bytes32_to_address, pad_address_hex, parse_address};
pub use error::{BridgeError, DebugInfo, WalletError};
pub use fees::{apply_buffer, FeeEstimator, FeeSettings, DEFAULT_FEE_BUFFER_BPS};
pub use history::{FileStore, KeyValueStore, MemoryStore, TransactionHistory, HISTORY_KEY};
pub use network::NetworkGuard;
pub use pipeline::{BridgeOutcome, BridgeRoute, BridgeService, SyncReport};
pub use registry::{ChainDescriptor, ChainRegistry, TokenInfo, SOURCE_CHAIN_ID};
pub use retry::{classify_error, ErrorClass, RetryPolicy};
pub use settings::BridgeSettings;
pub use stargate::stargate_transfer_url;
pub use submitter::{GasPolicy, SubmitOptions, TransactionSubmitter};
pub use types::{
    format_eth, parse_eth_amount, BridgeRequest, BridgeTransactionRecord, FeeQuote, Protocol,
    QuoteSource, SubmittedTransaction, TxStatus,
};
pub use wallet::{AddChainParams, CallRequest, WalletClient, WalletEvent};
