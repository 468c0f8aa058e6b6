//! Bridge request builder
//!
//! Turns a [`BridgeRequest`] into contract calldata for the chosen protocol:
//! the fee-quote call used by the estimator and the value-bearing call used
//! by the submitter. Both are built from the same message so the quote
//! matches what is sent.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;

use crate::adapter::{AdapterParams, Payload};
use crate::codec::address_to_bytes32;
use crate::contracts::{ILayerLeapBridge, ILayerZeroEndpoint, IMailbox};
use crate::error::{BridgeError, WalletError};
use crate::registry::ChainRegistry;
use crate::types::{BridgeRequest, FeeQuote, Protocol};
use crate::wallet::CallRequest;

fn read_error(message: String) -> BridgeError {
    BridgeError::Wallet(WalletError::Rpc {
        code: None,
        message,
    })
}

/// Deployed contract addresses on the source chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAddresses {
    /// LayerLeap native bridge
    pub bridge: Option<Address>,
    /// LayerZero v1 endpoint
    pub layerzero_endpoint: Option<Address>,
    /// Hyperlane mailbox
    pub hyperlane_mailbox: Option<Address>,
}

impl ContractAddresses {
    /// Contract a protocol's calls go to
    pub fn for_protocol(&self, protocol: Protocol) -> Result<Address, BridgeError> {
        let address = match protocol {
            Protocol::LayerZeroBridge => self.bridge,
            Protocol::LayerZeroEndpoint => self.layerzero_endpoint,
            Protocol::Hyperlane => self.hyperlane_mailbox,
            Protocol::Stargate => {
                return Err(BridgeError::Config(
                    "stargate transfers are completed in the Stargate app".to_string(),
                ))
            }
        };
        address.ok_or_else(|| {
            BridgeError::Config(format!("no contract address configured for {}", protocol))
        })
    }
}

/// A fully encoded value-bearing call, ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub protocol: Protocol,
    pub to: Address,
    pub data: Bytes,
    /// amount + buffered fee
    pub value: U256,
}

impl PreparedCall {
    pub fn to_call_request(&self, from: Address, gas_limit: Option<u64>) -> CallRequest {
        CallRequest {
            from: Some(from),
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            gas_limit,
        }
    }
}

/// Encodes quote and send calls per protocol
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    registry: Arc<ChainRegistry>,
    contracts: ContractAddresses,
    adapter_params: AdapterParams,
}

impl RequestBuilder {
    pub fn new(
        registry: Arc<ChainRegistry>,
        contracts: ContractAddresses,
        adapter_params: AdapterParams,
    ) -> Self {
        Self {
            registry,
            contracts,
            adapter_params,
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn adapter_params(&self) -> AdapterParams {
        self.adapter_params
    }

    /// Message body carried by protocols that take one
    pub fn payload(protocol: Protocol, request: &BridgeRequest) -> Payload {
        match protocol {
            Protocol::Hyperlane => Payload::WarpTransfer {
                recipient: request.recipient,
                amount: request.amount,
            },
            _ => Payload::Amount(request.amount),
        }
    }

    /// Protocol chain ID for LayerZero calls, which take a `uint16`
    fn layerzero_id(&self, protocol: Protocol, chain_id: u64) -> Result<u16, BridgeError> {
        let id = self.registry.protocol_id(protocol, chain_id)?;
        u16::try_from(id).map_err(|_| BridgeError::UnsupportedChain { chain_id })
    }

    /// Read-only fee quote call
    pub fn quote_call(
        &self,
        protocol: Protocol,
        request: &BridgeRequest,
        sender: Address,
    ) -> Result<CallRequest, BridgeError> {
        let to = self.contracts.for_protocol(protocol)?;
        let recipient = address_to_bytes32(request.recipient);
        let adapter = self.adapter_params.encode();

        let data = match protocol {
            Protocol::LayerZeroBridge => ILayerLeapBridge::estimateFeeCall {
                dstChainId: self.layerzero_id(protocol, request.destination_chain_id)?,
                toAddress: recipient,
                amount: request.amount,
                adapterParams: adapter,
            }
            .abi_encode(),
            Protocol::LayerZeroEndpoint => ILayerZeroEndpoint::estimateFeesCall {
                _dstChainId: self.layerzero_id(protocol, request.destination_chain_id)?,
                _userApplication: sender,
                _payload: Self::payload(protocol, request).encode(),
                _payInZRO: false,
                _adapterParam: adapter,
            }
            .abi_encode(),
            Protocol::Hyperlane => IMailbox::quoteDispatchCall {
                destinationDomain: self
                    .registry
                    .protocol_id(protocol, request.destination_chain_id)?,
                recipientAddress: recipient,
                messageBody: Self::payload(protocol, request).encode(),
            }
            .abi_encode(),
            Protocol::Stargate => {
                return Err(BridgeError::Config(
                    "stargate transfers are completed in the Stargate app".to_string(),
                ))
            }
        };

        Ok(CallRequest {
            from: Some(sender),
            ..CallRequest::view(to, Bytes::from(data))
        })
    }

    /// Decode the native fee from a quote call's return data
    pub fn decode_quote(protocol: Protocol, data: &[u8]) -> Result<U256, BridgeError> {
        let decode_err = |e: alloy::sol_types::Error| {
            BridgeError::FeeEstimation(format!("could not decode {} fee quote: {}", protocol, e))
        };
        match protocol {
            Protocol::LayerZeroBridge => {
                ILayerLeapBridge::estimateFeeCall::abi_decode_returns(data, true)
                    .map(|r| r.nativeFee)
                    .map_err(decode_err)
            }
            Protocol::LayerZeroEndpoint => {
                ILayerZeroEndpoint::estimateFeesCall::abi_decode_returns(data, true)
                    .map(|r| r.nativeFee)
                    .map_err(decode_err)
            }
            Protocol::Hyperlane => IMailbox::quoteDispatchCall::abi_decode_returns(data, true)
                .map(|r| r.fee)
                .map_err(decode_err),
            Protocol::Stargate => Err(BridgeError::FeeEstimation(
                "stargate fees are quoted by the Stargate app".to_string(),
            )),
        }
    }

    /// `isChainSupported(chainId)` on the LayerLeap bridge
    pub fn support_call(&self, chain_id: u64) -> Result<CallRequest, BridgeError> {
        let to = self.contracts.for_protocol(Protocol::LayerZeroBridge)?;
        let data = ILayerLeapBridge::isChainSupportedCall {
            chainId: U256::from(chain_id),
        }
        .abi_encode();
        Ok(CallRequest::view(to, Bytes::from(data)))
    }

    pub fn decode_support(data: &[u8]) -> Result<bool, BridgeError> {
        ILayerLeapBridge::isChainSupportedCall::abi_decode_returns(data, true)
            .map(|r| r._0)
            .map_err(|e| read_error(format!("could not decode isChainSupported result: {}", e)))
    }

    /// `getSupportedChains()` on the LayerLeap bridge
    pub fn supported_chains_call(&self) -> Result<CallRequest, BridgeError> {
        let to = self.contracts.for_protocol(Protocol::LayerZeroBridge)?;
        let data = ILayerLeapBridge::getSupportedChainsCall {}.abi_encode();
        Ok(CallRequest::view(to, Bytes::from(data)))
    }

    pub fn decode_supported_chains(data: &[u8]) -> Result<Vec<u64>, BridgeError> {
        let chains = ILayerLeapBridge::getSupportedChainsCall::abi_decode_returns(data, true)
            .map_err(|e| read_error(format!("could not decode getSupportedChains result: {}", e)))?
            ._0;
        chains
            .into_iter()
            .map(|id| {
                u64::try_from(id).map_err(|_| read_error(format!("chain ID {} out of range", id)))
            })
            .collect()
    }

    /// `chainToLzId(chainId)` on the LayerLeap bridge
    pub fn lz_id_call(&self, chain_id: u64) -> Result<CallRequest, BridgeError> {
        let to = self.contracts.for_protocol(Protocol::LayerZeroBridge)?;
        let data = ILayerLeapBridge::chainToLzIdCall {
            chainId: U256::from(chain_id),
        }
        .abi_encode();
        Ok(CallRequest::view(to, Bytes::from(data)))
    }

    pub fn decode_lz_id(data: &[u8]) -> Result<u16, BridgeError> {
        ILayerLeapBridge::chainToLzIdCall::abi_decode_returns(data, true)
            .map(|r| r._0)
            .map_err(|e| read_error(format!("could not decode chainToLzId result: {}", e)))
    }

    /// Value-bearing bridge call with `value = amount + buffered fee`
    pub fn build(
        &self,
        protocol: Protocol,
        request: &BridgeRequest,
        sender: Address,
        quote: &FeeQuote,
    ) -> Result<PreparedCall, BridgeError> {
        let to = self.contracts.for_protocol(protocol)?;
        let recipient = address_to_bytes32(request.recipient);
        let adapter = self.adapter_params.encode();

        let data = match protocol {
            Protocol::LayerZeroBridge => ILayerLeapBridge::bridgeNativeCall {
                dstChainId: self.layerzero_id(protocol, request.destination_chain_id)?,
                toAddress: recipient,
                adapterParams: adapter,
            }
            .abi_encode(),
            Protocol::LayerZeroEndpoint => ILayerZeroEndpoint::sendCall {
                _dstChainId: self.layerzero_id(protocol, request.destination_chain_id)?,
                _destination: Bytes::copy_from_slice(recipient.as_slice()),
                _payload: Self::payload(protocol, request).encode(),
                _refundAddress: sender,
                _zroPaymentAddress: Address::ZERO,
                _adapterParams: adapter,
            }
            .abi_encode(),
            Protocol::Hyperlane => IMailbox::dispatchCall {
                destinationDomain: self
                    .registry
                    .protocol_id(protocol, request.destination_chain_id)?,
                recipientAddress: recipient,
                messageBody: Self::payload(protocol, request).encode(),
            }
            .abi_encode(),
            Protocol::Stargate => {
                return Err(BridgeError::Config(
                    "stargate transfers are completed in the Stargate app".to_string(),
                ))
            }
        };

        Ok(PreparedCall {
            protocol,
            to,
            data: Bytes::from(data),
            value: quote.total_value(request.amount),
        })
    }
}
