//! Stargate redirect
//!
//! Stargate transfers are not submitted from here; the user is sent to the
//! Stargate transfer page with the route prefilled.

use alloy::primitives::U256;
use url::Url;

use crate::error::BridgeError;
use crate::registry::ChainRegistry;
use crate::types::{format_eth, Protocol};

pub const STARGATE_TRANSFER_URL: &str = "https://stargate.finance/transfer";

/// Prefilled Stargate transfer URL for an ETH route
pub fn stargate_transfer_url(
    registry: &ChainRegistry,
    source_chain_id: u64,
    destination_chain_id: u64,
    amount: U256,
) -> Result<Url, BridgeError> {
    let src = registry.protocol_id(Protocol::Stargate, source_chain_id)?;
    let dst = registry.protocol_id(Protocol::Stargate, destination_chain_id)?;

    let mut url = Url::parse(STARGATE_TRANSFER_URL)
        .map_err(|e| BridgeError::Config(format!("stargate url: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("srcChainId", &src.to_string())
        .append_pair("dstChainId", &dst.to_string())
        .append_pair("srcToken", "ETH")
        .append_pair("dstToken", "ETH")
        .append_pair("amount", &format_eth(amount));
    Ok(url)
}
