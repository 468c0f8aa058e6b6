//! Local-key wallet over JSON-RPC
//!
//! Signs with a `PrivateKeySigner` and talks to one RPC endpoint per chain.
//! Switching chains swaps the active endpoint; chains are known once an
//! endpoint has been registered through [`WalletClient::add_chain`] (or the
//! one given to [`EvmWallet::connect`]).

use alloy::{
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{
        fillers::{FillProvider, JoinFill, WalletFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::{
        http::{Client, Http},
        TransportError,
    },
};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::error::WalletError;
use crate::redact::redact_rpc_url;
use crate::wallet::{AddChainParams, CallRequest, WalletClient, WalletEvent};

type SignerProvider = FillProvider<
    JoinFill<Identity, WalletFiller<EthereumWallet>>,
    RootProvider<Http<Client>>,
    Http<Client>,
    Ethereum,
>;

struct ActiveNetwork {
    chain_id: u64,
    provider: SignerProvider,
}

pub struct EvmWallet {
    address: Address,
    wallet: EthereumWallet,
    networks: RwLock<HashMap<u64, String>>,
    active: RwLock<ActiveNetwork>,
    events: broadcast::Sender<WalletEvent>,
}

impl fmt::Debug for EvmWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmWallet")
            .field("address", &self.address)
            .field("signer", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn build_provider(wallet: &EthereumWallet, rpc_url: &str) -> Result<SignerProvider, WalletError> {
    let url = rpc_url
        .parse()
        .map_err(|e| WalletError::Unavailable(format!("invalid RPC URL: {}", e)))?;
    Ok(ProviderBuilder::new().wallet(wallet.clone()).on_http(url))
}

/// Map a transport error, keeping the JSON-RPC code when the node sent one
fn rpc_error(err: TransportError, chain_id: Option<u64>) -> WalletError {
    match err.as_error_resp() {
        Some(resp) => WalletError::from_code(resp.code, resp.message.to_string(), chain_id),
        None => WalletError::Rpc {
            code: None,
            message: err.to_string(),
        },
    }
}

impl EvmWallet {
    /// Connect to `rpc_url` and sign with `private_key`
    pub async fn connect(rpc_url: &str, private_key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| eyre!("Invalid private key: {}", e))?;
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let provider = build_provider(&wallet, rpc_url)?;
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| eyre!("Failed to query chain ID from {}: {}", redact_rpc_url(rpc_url), e))?;

        info!(
            rpc_url = %redact_rpc_url(rpc_url),
            chain_id,
            address = %address,
            "Connected EVM wallet"
        );

        let (events, _) = broadcast::channel(16);
        Ok(Self {
            address,
            wallet,
            networks: RwLock::new(HashMap::from([(chain_id, rpc_url.to_string())])),
            active: RwLock::new(ActiveNetwork { chain_id, provider }),
            events,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Chain the wallet currently sends to
    pub async fn active_chain_id(&self) -> u64 {
        self.active.read().await.chain_id
    }

    fn transaction(&self, request: &CallRequest) -> TransactionRequest {
        let mut tx = TransactionRequest::default()
            .with_from(request.from.unwrap_or(self.address))
            .with_to(request.to)
            .with_value(request.value)
            .with_input(request.data.clone());
        if let Some(gas_limit) = request.gas_limit {
            tx = tx.with_gas_limit(gas_limit);
        }
        tx
    }
}

#[async_trait]
impl WalletClient for EvmWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.address])
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.address])
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let active = self.active.read().await;
        active
            .provider
            .get_chain_id()
            .await
            .map_err(|e| rpc_error(e, None))
    }

    async fn net_version(&self) -> Result<u64, WalletError> {
        let active = self.active.read().await;
        active
            .provider
            .get_net_version()
            .await
            .map_err(|e| rpc_error(e, None))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        if self.active.read().await.chain_id == chain_id {
            return Ok(());
        }

        let rpc_url = self
            .networks
            .read()
            .await
            .get(&chain_id)
            .cloned()
            .ok_or(WalletError::ChainNotAdded { chain_id })?;

        let provider = build_provider(&self.wallet, &rpc_url)?;
        let reported = provider
            .get_chain_id()
            .await
            .map_err(|e| rpc_error(e, Some(chain_id)))?;
        if reported != chain_id {
            return Err(WalletError::Rpc {
                code: None,
                message: format!(
                    "RPC endpoint for chain {} reports chain {}",
                    chain_id, reported
                ),
            });
        }

        *self.active.write().await = ActiveNetwork { chain_id, provider };
        info!(chain_id, rpc_url = %redact_rpc_url(&rpc_url), "Switched network");
        let _ = self.events.send(WalletEvent::ChainChanged(chain_id));
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), WalletError> {
        let chain_id = params.numeric_chain_id().ok_or_else(|| WalletError::Rpc {
            code: Some(-32602),
            message: format!("invalid chain ID {}", params.chain_id),
        })?;
        let rpc_url = params.rpc_urls.first().ok_or_else(|| WalletError::Rpc {
            code: Some(-32602),
            message: format!("no RPC URL for chain {}", chain_id),
        })?;

        debug!(chain_id, chain_name = %params.chain_name, "Registering network");
        self.networks
            .write()
            .await
            .insert(chain_id, rpc_url.clone());
        Ok(())
    }

    async fn balance(&self, address: Address) -> Result<U256, WalletError> {
        let active = self.active.read().await;
        active
            .provider
            .get_balance(address)
            .await
            .map_err(|e| rpc_error(e, Some(active.chain_id)))
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, WalletError> {
        let tx = self.transaction(request);
        let active = self.active.read().await;
        active
            .provider
            .call(&tx)
            .await
            .map_err(|e| rpc_error(e, Some(active.chain_id)))
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, WalletError> {
        let tx = self.transaction(request);
        let active = self.active.read().await;
        active
            .provider
            .estimate_gas(&tx)
            .await
            .map_err(|e| rpc_error(e, Some(active.chain_id)))
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<TxHash, WalletError> {
        let active = self.active.read().await;
        let chain_id = active.chain_id;
        let provider = &active.provider;

        let nonce = provider
            .get_transaction_count(self.address)
            .await
            .map_err(|e| rpc_error(e, Some(chain_id)))?;
        let gas_price = provider
            .get_gas_price()
            .await
            .map_err(|e| rpc_error(e, Some(chain_id)))?;

        let mut tx = self
            .transaction(request)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_chain_id(chain_id);
        if request.gas_limit.is_none() {
            let gas = provider
                .estimate_gas(&tx)
                .await
                .map_err(|e| rpc_error(e, Some(chain_id)))?;
            tx = tx.with_gas_limit(gas);
        }

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| rpc_error(e, Some(chain_id)))?;
        let hash = *pending.tx_hash();
        debug!(tx_hash = %hash, nonce, gas_price = %gas_price, "Transaction broadcast");
        Ok(hash)
    }

    async fn transaction_status(&self, hash: TxHash) -> Result<Option<bool>, WalletError> {
        let active = self.active.read().await;
        let receipt = active
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| rpc_error(e, Some(active.chain_id)))?;
        Ok(receipt.map(|r| r.status()))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::transports::TransportErrorKind;

    #[test]
    fn test_rpc_error_keeps_eip1193_codes() {
        let err = TransportError::ErrorResp(ErrorPayload {
            code: 4001,
            message: "User rejected the request.".into(),
            data: None,
        });
        assert_eq!(rpc_error(err, None), WalletError::UserRejected);

        let err = TransportError::ErrorResp(ErrorPayload {
            code: 4902,
            message: "Unrecognized chain ID".into(),
            data: None,
        });
        assert_eq!(
            rpc_error(err, Some(10)),
            WalletError::ChainNotAdded { chain_id: 10 }
        );
    }

    #[test]
    fn test_rpc_error_revert_message() {
        let err = TransportError::ErrorResp(ErrorPayload {
            code: 3,
            message: "execution reverted: paused".into(),
            data: None,
        });
        let mapped = rpc_error(err, Some(10));
        assert_eq!(mapped.code(), Some(3));
        assert!(mapped.to_string().contains("execution reverted: paused"));
    }

    #[test]
    fn test_transport_failure_has_no_code() {
        let err = TransportErrorKind::custom_str("connection refused");
        let mapped = rpc_error(err, None);
        assert_eq!(mapped.code(), None);
        assert!(mapped.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_private_key() {
        let err = EvmWallet::connect("http://localhost:8545", "not-a-key")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_build_provider_rejects_bad_url() {
        let signer = PrivateKeySigner::random();
        let wallet = EthereumWallet::from(signer);
        assert!(matches!(
            build_provider(&wallet, "::not a url::"),
            Err(WalletError::Unavailable(_))
        ));
    }
}
