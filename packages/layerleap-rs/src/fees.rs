//! Fee estimation
//!
//! Quotes the protocol fee through the bridge contract's read-only fee
//! function and applies a multiplicative safety buffer so the submission
//! still covers the fee if it moves between quote and inclusion.

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::builder::RequestBuilder;
use crate::error::BridgeError;
use crate::retry::RetryPolicy;
use crate::types::{BridgeRequest, FeeQuote, Protocol, QuoteSource};
use crate::wallet::WalletClient;

/// Default buffer on quoted fees: 10%
pub const DEFAULT_FEE_BUFFER_BPS: u32 = 1_000;

/// Default fee used when a quote cannot be obtained: 0.0003 ETH
pub const DEFAULT_FALLBACK_FEE_WEI: u128 = 300_000_000_000_000;

const BPS_DENOMINATOR: u32 = 10_000;

/// `fee * (1 + buffer_bps / 10_000)`, exact in wei (rounded down)
pub fn apply_buffer(fee: U256, buffer_bps: u32) -> U256 {
    let factor = U256::from(BPS_DENOMINATOR) + U256::from(buffer_bps);
    fee.saturating_mul(factor) / U256::from(BPS_DENOMINATOR)
}

/// Fee estimator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSettings {
    pub buffer_bps: u32,
    /// Fee assumed by [`FeeEstimator::quote_or_default`] when quoting fails
    pub fallback_fee: Option<U256>,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            buffer_bps: DEFAULT_FEE_BUFFER_BPS,
            fallback_fee: Some(U256::from(DEFAULT_FALLBACK_FEE_WEI)),
        }
    }
}

/// Quotes bridge fees through a wallet
pub struct FeeEstimator {
    wallet: Arc<dyn WalletClient>,
    builder: Arc<RequestBuilder>,
    settings: FeeSettings,
    retry: RetryPolicy,
}

impl FeeEstimator {
    pub fn new(
        wallet: Arc<dyn WalletClient>,
        builder: Arc<RequestBuilder>,
        settings: FeeSettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            wallet,
            builder,
            settings,
            retry,
        }
    }

    pub fn settings(&self) -> &FeeSettings {
        &self.settings
    }

    /// Buffer a raw fee with this estimator's settings
    pub fn buffered(&self, fee: U256, source: QuoteSource) -> FeeQuote {
        FeeQuote {
            fee,
            buffered_fee: apply_buffer(fee, self.settings.buffer_bps),
            buffer_bps: self.settings.buffer_bps,
            source,
        }
    }

    /// Ask the protocol contract for its fee and apply the buffer
    pub async fn estimate(
        &self,
        protocol: Protocol,
        request: &BridgeRequest,
        sender: Address,
    ) -> Result<FeeQuote, BridgeError> {
        let call = self.builder.quote_call(protocol, request, sender)?;

        let fee = self
            .retry
            .run("estimate_fee", || async {
                let data = self
                    .wallet
                    .call(&call)
                    .await
                    .map_err(|e| BridgeError::FeeEstimation(e.to_string()))?;
                RequestBuilder::decode_quote(protocol, &data)
            })
            .await?;

        let quote = self.buffered(fee, QuoteSource::Quoted);
        debug!(
            protocol = %protocol,
            dst_chain = request.destination_chain_id,
            fee = %quote.fee,
            buffered_fee = %quote.buffered_fee,
            "Fee quoted"
        );
        Ok(quote)
    }

    /// Like [`Self::estimate`], but falls back to the configured default fee
    /// when quoting fails. Unsupported destinations and configuration errors
    /// are still returned as errors.
    pub async fn quote_or_default(
        &self,
        protocol: Protocol,
        request: &BridgeRequest,
        sender: Address,
    ) -> Result<FeeQuote, BridgeError> {
        match self.estimate(protocol, request, sender).await {
            Ok(quote) => Ok(quote),
            Err(BridgeError::FeeEstimation(reason)) => match self.settings.fallback_fee {
                Some(fallback) => {
                    warn!(
                        protocol = %protocol,
                        dst_chain = request.destination_chain_id,
                        error = %reason,
                        fallback_fee = %fallback,
                        "Fee estimation failed, using default fee"
                    );
                    Ok(self.buffered(fallback, QuoteSource::Fallback))
                }
                None => Err(BridgeError::FeeEstimation(reason)),
            },
            Err(e) => Err(e),
        }
    }
}
