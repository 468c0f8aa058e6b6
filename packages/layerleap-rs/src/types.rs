//! Common types for bridge requests, fee quotes and transaction records

use alloy::primitives::{
    utils::{format_ether, parse_ether},
    Address, TxHash, U256,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Cross-chain protocol used to carry a bridge request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// LayerLeap native bridge contract on top of LayerZero (`bridgeNative`)
    #[serde(rename = "layerzero")]
    LayerZeroBridge,
    /// LayerZero v1 endpoint, called directly (`send`)
    #[serde(rename = "layerzero-endpoint")]
    LayerZeroEndpoint,
    /// Hyperlane mailbox (`dispatch`)
    #[serde(rename = "hyperlane")]
    Hyperlane,
    /// Delegated to the Stargate web app, no transaction is submitted
    #[serde(rename = "stargate")]
    Stargate,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::LayerZeroBridge => "layerzero",
            Protocol::LayerZeroEndpoint => "layerzero-endpoint",
            Protocol::Hyperlane => "hyperlane",
            Protocol::Stargate => "stargate",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "layerzero" | "lz" => Ok(Protocol::LayerZeroBridge),
            "layerzero-endpoint" | "lz-endpoint" => Ok(Protocol::LayerZeroEndpoint),
            "hyperlane" => Ok(Protocol::Hyperlane),
            "stargate" => Ok(Protocol::Stargate),
            other => Err(format!("unknown protocol: {}", other)),
        }
    }
}

/// Lifecycle of a recorded bridge transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
        }
    }

    /// Only `pending -> completed` and `pending -> failed` are allowed
    pub fn can_transition_to(&self, next: TxStatus) -> bool {
        matches!(
            (self, next),
            (TxStatus::Pending, TxStatus::Completed) | (TxStatus::Pending, TxStatus::Failed)
        )
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a decimal ether amount ("0.05") into wei
pub fn parse_eth_amount(amount: &str) -> Result<U256, BridgeError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(BridgeError::InvalidAmount(amount.to_string()));
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.len() > 18 {
            return Err(BridgeError::InvalidAmount(format!(
                "{}: more than 18 decimal places",
                amount
            )));
        }
    }
    parse_ether(trimmed).map_err(|e| BridgeError::InvalidAmount(format!("{}: {}", amount, e)))
}

/// Format wei as a decimal ether string without trailing zeros ("0.05")
pub fn format_eth(wei: U256) -> String {
    let formatted = format_ether(wei);
    if formatted.contains('.') {
        let stripped = formatted.trim_end_matches('0').trim_end_matches('.');
        stripped.to_string()
    } else {
        formatted
    }
}

/// A single bridge submission, built from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    pub destination_chain_id: u64,
    pub recipient: Address,
    /// Amount in wei
    pub amount: U256,
}

impl BridgeRequest {
    pub fn new(destination_chain_id: u64, recipient: Address, amount: U256) -> Self {
        Self {
            destination_chain_id,
            recipient,
            amount,
        }
    }

    /// Build from form-style input: chain ID, hex recipient and ether amount
    pub fn from_input(
        destination_chain_id: u64,
        recipient: &str,
        amount_eth: &str,
    ) -> Result<Self, BridgeError> {
        let recipient = crate::codec::parse_address(recipient)?;
        let amount = parse_eth_amount(amount_eth)?;
        if amount.is_zero() {
            return Err(BridgeError::InvalidAmount("amount must be positive".into()));
        }
        Ok(Self::new(destination_chain_id, recipient, amount))
    }
}

/// Where a fee quote came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Returned by the protocol's fee function
    Quoted,
    /// The configured default, used after estimation failed
    Fallback,
}

/// Protocol fee with the safety buffer applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    /// Fee as quoted, in wei
    pub fee: U256,
    /// Fee after the buffer, in wei
    pub buffered_fee: U256,
    /// Buffer in basis points
    pub buffer_bps: u32,
    pub source: QuoteSource,
}

impl FeeQuote {
    pub fn fee_in_ether(&self) -> String {
        format_eth(self.fee)
    }

    pub fn buffered_fee_in_ether(&self) -> String {
        format_eth(self.buffered_fee)
    }

    /// Total value the submission carries: amount plus buffered fee
    pub fn total_value(&self, amount: U256) -> U256 {
        amount.saturating_add(self.buffered_fee)
    }
}

/// Persisted record of a submitted bridge transaction
///
/// Serialized in camelCase with ether-denominated amounts so the stored
/// array stays readable by other front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeTransactionRecord {
    pub hash: String,
    pub from: String,
    pub destination_chain_id: u64,
    /// Amount in ether
    pub amount: String,
    /// Buffered fee in ether
    pub fee: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub status: TxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

impl BridgeTransactionRecord {
    /// New pending record stamped with the current time
    pub fn pending(
        hash: TxHash,
        from: Address,
        request: &BridgeRequest,
        quote: &FeeQuote,
        protocol: Protocol,
    ) -> Self {
        Self {
            hash: format!("{:#x}", hash),
            from: from.to_checksum(None),
            destination_chain_id: request.destination_chain_id,
            amount: format_eth(request.amount),
            fee: quote.buffered_fee_in_ether(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            status: TxStatus::Pending,
            protocol: Some(protocol),
        }
    }

    /// Parsed transaction hash, if the stored string is well formed
    pub fn tx_hash(&self) -> Option<TxHash> {
        self.hash.parse().ok()
    }
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub hash: TxHash,
    pub from: Address,
    /// Value sent with the transaction (amount + buffered fee), in wei
    pub value: U256,
    pub gas_limit: u64,
}
