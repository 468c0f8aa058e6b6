//! Bridge error taxonomy
//!
//! Every failure the pipeline can report is a [`BridgeError`] variant. Wallet
//! level failures keep their EIP-1193 code in [`WalletError`] and are mapped
//! into the bridge taxonomy by [`BridgeError::from_wallet`].

use alloy::primitives::Address;
use serde::Serialize;
use thiserror::Error;

/// EIP-1193: the user rejected the request
pub const CODE_USER_REJECTED: i64 = 4001;

/// EIP-1193: the requested method or account has not been authorized
pub const CODE_UNAUTHORIZED: i64 = 4100;

/// MetaMask: the chain has not been added to the wallet
pub const CODE_CHAIN_NOT_ADDED: i64 = 4902;

/// Errors reported by a [`crate::wallet::WalletClient`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet provider not available: {0}")]
    Unavailable(String),

    #[error("User rejected the request")]
    UserRejected,

    #[error("Wallet has not authorized this account or method")]
    Unauthorized,

    #[error("Chain {chain_id} has not been added to the wallet")]
    ChainNotAdded { chain_id: u64 },

    #[error("RPC error{}: {message}", .code.map(|c| format!(" {}", c)).unwrap_or_default())]
    Rpc { code: Option<i64>, message: String },
}

impl WalletError {
    /// Build an error from a raw JSON-RPC error code and message
    pub fn from_code(code: i64, message: impl Into<String>, chain_id: Option<u64>) -> Self {
        match code {
            CODE_USER_REJECTED => WalletError::UserRejected,
            CODE_UNAUTHORIZED => WalletError::Unauthorized,
            CODE_CHAIN_NOT_ADDED => WalletError::ChainNotAdded {
                chain_id: chain_id.unwrap_or_default(),
            },
            _ => WalletError::Rpc {
                code: Some(code),
                message: message.into(),
            },
        }
    }

    /// The EIP-1193 / JSON-RPC code, when one is known
    pub fn code(&self) -> Option<i64> {
        match self {
            WalletError::Unavailable(_) => None,
            WalletError::UserRejected => Some(CODE_USER_REJECTED),
            WalletError::Unauthorized => Some(CODE_UNAUTHORIZED),
            WalletError::ChainNotAdded { .. } => Some(CODE_CHAIN_NOT_ADDED),
            WalletError::Rpc { code, .. } => *code,
        }
    }
}

/// Context captured when a submission step fails
///
/// Holds the raw wallet error and the (truncated) call parameters so a front
/// end can show what was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub raw_error: String,
    pub code: Option<i64>,
    pub to: String,
    pub value: String,
    pub data: String,
}

impl DebugInfo {
    /// Calldata longer than this many hex characters is truncated
    pub const MAX_DATA_HEX: usize = 74;

    pub fn new(error: &WalletError, to: &str, value: &str, data: &[u8]) -> Self {
        let mut data_hex = format!("0x{}", hex::encode(data));
        if data_hex.len() > Self::MAX_DATA_HEX {
            data_hex.truncate(Self::MAX_DATA_HEX);
            data_hex.push_str("...");
        }
        Self {
            raw_error: error.to_string(),
            code: error.code(),
            to: to.to_string(),
            value: value.to_string(),
            data: data_hex,
        }
    }
}

/// Pipeline error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Wallet provider not available: {0}")]
    ProviderUnavailable(String),

    #[error("Wrong network: expected chain {expected}, wallet is on {actual:?}")]
    WrongNetwork { expected: u64, actual: Option<u64> },

    #[error("Unsupported destination chain: {chain_id}")]
    UnsupportedChain { chain_id: u64 },

    #[error("Fee estimation failed: {0}")]
    FeeEstimation(String),

    #[error("Gas estimation failed: {message}")]
    GasEstimation {
        message: String,
        debug: Box<DebugInfo>,
    },

    #[error("Transaction would revert: {reason}")]
    DryRunReverted {
        reason: String,
        debug: Box<DebugInfo>,
    },

    #[error("Transaction rejected by user")]
    UserRejected,

    #[error("No wallet account available")]
    NoAccount,

    #[error("Wallet account changed from {expected} during the request")]
    AccountChanged { expected: Address },

    #[error("Insufficient balance: need {required} wei, have {available} wei")]
    InsufficientBalance { required: String, available: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Transaction failed: {message}")]
    Transaction {
        message: String,
        debug: Box<DebugInfo>,
    },

    #[error("Wallet error: {0}")]
    Wallet(WalletError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Map a wallet error into the bridge taxonomy
    pub fn from_wallet(err: WalletError) -> Self {
        match err {
            WalletError::Unavailable(msg) => BridgeError::ProviderUnavailable(msg),
            WalletError::UserRejected => BridgeError::UserRejected,
            WalletError::Unauthorized => BridgeError::NoAccount,
            other => BridgeError::Wallet(other),
        }
    }

    /// Debug context attached to submission failures
    pub fn debug_info(&self) -> Option<&DebugInfo> {
        match self {
            BridgeError::GasEstimation { debug, .. }
            | BridgeError::DryRunReverted { debug, .. }
            | BridgeError::Transaction { debug, .. } => Some(debug),
            _ => None,
        }
    }

    /// Whether the retry policy may attempt the failed operation again
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::FeeEstimation(msg) => crate::retry::classify_error(msg).is_retryable(),
            BridgeError::Transaction { message, .. } => {
                crate::retry::classify_error(message).is_retryable()
            }
            BridgeError::Wallet(WalletError::Rpc { message, .. }) => {
                crate::retry::classify_error(message).is_retryable()
            }
            _ => false,
        }
    }
}

impl From<WalletError> for BridgeError {
    fn from(err: WalletError) -> Self {
        BridgeError::from_wallet(err)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Storage(err.to_string())
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
