//! Transaction submitter
//!
//! Takes a quoted [`BridgeRequest`] through the pre-flight checks and hands
//! the value-bearing call to the wallet:
//!
//! 1. destination must be routable for the protocol (no wallet request otherwise)
//! 2. for the LayerLeap bridge, the deployed contract must still route there
//! 3. `amount + buffered fee` must not exceed the sender's balance
//! 4. optional `eth_call` dry run
//! 5. gas limit, fixed or estimated plus a buffer
//! 6. `eth_sendTransaction` under the retry policy
//!
//! A retried send is a new transaction: nothing deduplicates it, so only
//! errors raised before the wallet accepted the transaction are retryable.

use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::builder::{PreparedCall, RequestBuilder};
use crate::error::{BridgeError, DebugInfo, WalletError};
use crate::retry::RetryPolicy;
use crate::types::{BridgeRequest, FeeQuote, Protocol, SubmittedTransaction};
use crate::wallet::{CallRequest, WalletClient};

/// Default buffer on estimated gas: 20%
pub const DEFAULT_GAS_BUFFER_BPS: u32 = 2_000;

/// How the transaction gas limit is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPolicy {
    Fixed(u64),
    /// `eth_estimateGas` plus `buffer_bps`
    Estimated { buffer_bps: u32 },
}

impl Default for GasPolicy {
    fn default() -> Self {
        GasPolicy::Estimated {
            buffer_bps: DEFAULT_GAS_BUFFER_BPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    pub gas: GasPolicy,
    /// Simulate with `eth_call` before sending
    pub dry_run: bool,
    /// Refuse to send when `amount + buffered fee` exceeds the balance
    pub enforce_balance_check: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            gas: GasPolicy::default(),
            dry_run: false,
            enforce_balance_check: true,
        }
    }
}

fn buffered_gas(estimate: u64, buffer_bps: u32) -> u64 {
    let buffered = estimate as u128 * (10_000 + buffer_bps as u128) / 10_000;
    u64::try_from(buffered).unwrap_or(u64::MAX)
}

fn debug_info(err: &WalletError, call: &CallRequest) -> Box<DebugInfo> {
    Box::new(DebugInfo::new(
        err,
        &call.to.to_string(),
        &call.value.to_string(),
        &call.data,
    ))
}

pub struct TransactionSubmitter {
    wallet: Arc<dyn WalletClient>,
    builder: Arc<RequestBuilder>,
    options: SubmitOptions,
    retry: RetryPolicy,
}

impl TransactionSubmitter {
    pub fn new(
        wallet: Arc<dyn WalletClient>,
        builder: Arc<RequestBuilder>,
        options: SubmitOptions,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            wallet,
            builder,
            options,
            retry,
        }
    }

    pub fn options(&self) -> &SubmitOptions {
        &self.options
    }

    /// First authorized account, asking the wallet for access if none is
    pub async fn resolve_sender(&self) -> Result<Address, BridgeError> {
        let accounts = self.wallet.accounts().await?;
        if let Some(account) = accounts.first() {
            return Ok(*account);
        }

        debug!("No authorized account, requesting access");
        let accounts = self.wallet.request_accounts().await?;
        accounts.first().copied().ok_or(BridgeError::NoAccount)
    }

    /// Submit a quoted bridge request from `sender`
    pub async fn submit(
        &self,
        protocol: Protocol,
        request: &BridgeRequest,
        sender: Address,
        quote: &FeeQuote,
    ) -> Result<SubmittedTransaction, BridgeError> {
        self.builder
            .registry()
            .protocol_id(protocol, request.destination_chain_id)?;

        let prepared = self.builder.build(protocol, request, sender, quote)?;

        if protocol == Protocol::LayerZeroBridge {
            self.check_bridge_route(request.destination_chain_id).await?;
        }

        if self.options.enforce_balance_check {
            self.check_balance(sender, prepared.value).await?;
        }

        let mut call = prepared.to_call_request(sender, None);

        if self.options.dry_run {
            self.dry_run(&call).await?;
        }

        let gas_limit = self.gas_limit(&call).await?;
        call.gas_limit = Some(gas_limit);

        let hash = self.send(&prepared, &call).await?;

        info!(
            tx_hash = %hash,
            protocol = %protocol,
            dst_chain = request.destination_chain_id,
            value = %prepared.value,
            gas_limit,
            "Bridge transaction submitted"
        );

        Ok(SubmittedTransaction {
            hash,
            from: sender,
            value: prepared.value,
            gas_limit,
        })
    }

    /// Ask the bridge contract whether it routes to `chain_id`. Only an
    /// explicit `false` blocks the submission; a failed read is logged and
    /// the dry run or send reports any real problem.
    async fn check_bridge_route(&self, chain_id: u64) -> Result<(), BridgeError> {
        let call = self.builder.support_call(chain_id)?;
        let supported = self
            .retry
            .run("is_chain_supported", || async {
                let data = self.wallet.call(&call).await?;
                RequestBuilder::decode_support(&data)
            })
            .await;

        match supported {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(dst_chain = chain_id, "Bridge contract does not route to destination");
                Err(BridgeError::UnsupportedChain { chain_id })
            }
            Err(e @ BridgeError::ProviderUnavailable(_)) => Err(e),
            Err(e) => {
                warn!(dst_chain = chain_id, error = %e, "Could not check bridge route, continuing");
                Ok(())
            }
        }
    }

    async fn check_balance(&self, sender: Address, required: U256) -> Result<(), BridgeError> {
        let available = self.wallet.balance(sender).await?;
        if available < required {
            warn!(
                sender = %sender,
                required = %required,
                available = %available,
                "Insufficient balance for bridge transaction"
            );
            return Err(BridgeError::InsufficientBalance {
                required: required.to_string(),
                available: available.to_string(),
            });
        }
        Ok(())
    }

    async fn dry_run(&self, call: &CallRequest) -> Result<(), BridgeError> {
        match self.wallet.call(call).await {
            Ok(_) => {
                debug!(to = %call.to, "Dry run succeeded");
                Ok(())
            }
            Err(WalletError::Unavailable(msg)) => Err(BridgeError::ProviderUnavailable(msg)),
            Err(e) => Err(BridgeError::DryRunReverted {
                reason: e.to_string(),
                debug: debug_info(&e, call),
            }),
        }
    }

    async fn gas_limit(&self, call: &CallRequest) -> Result<u64, BridgeError> {
        match self.options.gas {
            GasPolicy::Fixed(limit) => Ok(limit),
            GasPolicy::Estimated { buffer_bps } => match self.wallet.estimate_gas(call).await {
                Ok(estimate) => {
                    let limit = buffered_gas(estimate, buffer_bps);
                    debug!(estimate, gas_limit = limit, "Gas estimated");
                    Ok(limit)
                }
                Err(WalletError::Unavailable(msg)) => Err(BridgeError::ProviderUnavailable(msg)),
                Err(e) => Err(BridgeError::GasEstimation {
                    message: e.to_string(),
                    debug: debug_info(&e, call),
                }),
            },
        }
    }

    async fn send(
        &self,
        prepared: &PreparedCall,
        call: &CallRequest,
    ) -> Result<TxHash, BridgeError> {
        self.retry
            .run("send_transaction", || async {
                self.wallet
                    .send_transaction(call)
                    .await
                    .map_err(|e| match e {
                        WalletError::UserRejected => BridgeError::UserRejected,
                        WalletError::Unavailable(msg) => BridgeError::ProviderUnavailable(msg),
                        other => BridgeError::Transaction {
                            message: other.to_string(),
                            debug: debug_info(&other, call),
                        },
                    })
            })
            .await
            .inspect_err(|e| {
                warn!(protocol = %prepared.protocol, to = %prepared.to, error = %e, "Bridge transaction failed")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterParams;
    use crate::builder::ContractAddresses;
    use crate::contracts::ILayerLeapBridge;
    use crate::registry::ChainRegistry;
    use crate::testing::{MockWallet, WalletRequest, TEST_ACCOUNT};
    use crate::types::QuoteSource;
    use alloy::sol_types::SolCall;
    use std::time::Duration;

    fn submitter(wallet: Arc<MockWallet>, options: SubmitOptions) -> TransactionSubmitter {
        let builder = RequestBuilder::new(
            Arc::new(ChainRegistry::mainnet()),
            ContractAddresses {
                bridge: Some(Address::repeat_byte(0xb1)),
                layerzero_endpoint: Some(Address::repeat_byte(0xe1)),
                hyperlane_mailbox: Some(Address::repeat_byte(0xa1)),
            },
            AdapterParams::default(),
        );
        let retry = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
        };
        TransactionSubmitter::new(wallet, Arc::new(builder), options, retry)
    }

    fn request(chain_id: u64) -> BridgeRequest {
        BridgeRequest::new(chain_id, Address::repeat_byte(0x42), U256::from(1_000_000u64))
    }

    fn quote() -> FeeQuote {
        FeeQuote {
            fee: U256::from(1_000u64),
            buffered_fee: U256::from(1_100u64),
            buffer_bps: 1_000,
            source: QuoteSource::Quoted,
        }
    }

    fn sends(wallet: &MockWallet) -> Vec<CallRequest> {
        wallet
            .requests()
            .into_iter()
            .filter_map(|r| match r {
                WalletRequest::SendTransaction(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_buffered_gas() {
        assert_eq!(buffered_gas(100_000, 2_000), 120_000);
        assert_eq!(buffered_gas(100_000, 0), 100_000);
        assert_eq!(buffered_gas(u64::MAX, 2_000), u64::MAX);
    }

    #[tokio::test]
    async fn test_submit_sends_amount_plus_buffered_fee() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        let tx = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await
            .unwrap();

        assert_eq!(tx.hash, MockWallet::sent_hash(1));
        assert_eq!(tx.value, U256::from(1_001_100u64));
        assert_eq!(tx.gas_limit, 120_000);

        let sent = sends(&wallet);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, Some(TEST_ACCOUNT));
        assert_eq!(sent[0].to, Address::repeat_byte(0xb1));
        assert_eq!(sent[0].value, tx.value);
        assert_eq!(sent[0].gas_limit, Some(120_000));
        assert_eq!(sent[0].data[..4], ILayerLeapBridge::bridgeNativeCall::SELECTOR);
    }

    #[tokio::test]
    async fn test_unsupported_chain_requests_nothing_from_wallet() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        let err = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(999_999), TEST_ACCOUNT, &quote())
            .await
            .unwrap_err();

        assert_eq!(err, BridgeError::UnsupportedChain { chain_id: 999_999 });
        assert!(wallet.requests().is_empty());
    }

    #[tokio::test]
    async fn test_chain_without_protocol_id_is_unsupported() {
        let mainnet = ChainRegistry::mainnet();
        let mut base = mainnet.get(8453).unwrap().clone();
        base.layerzero_id = None;
        let registry = ChainRegistry::new([mainnet.get(10).unwrap().clone(), base]);

        let wallet = Arc::new(MockWallet::on_chain(10));
        let builder = RequestBuilder::new(
            Arc::new(registry),
            ContractAddresses {
                bridge: Some(Address::repeat_byte(0xb1)),
                ..Default::default()
            },
            AdapterParams::default(),
        );
        let submitter = TransactionSubmitter::new(
            wallet.clone(),
            Arc::new(builder),
            SubmitOptions::default(),
            RetryPolicy::no_retry(),
        );

        let err = submitter
            .submit(Protocol::LayerZeroBridge, &request(8453), TEST_ACCOUNT, &quote())
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::UnsupportedChain { chain_id: 8453 });
        assert!(wallet.requests().is_empty());
    }

    #[tokio::test]
    async fn test_bridge_contract_route_is_checked() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await
            .unwrap();

        let checks: Vec<CallRequest> = wallet
            .requests()
            .into_iter()
            .filter_map(|r| match r {
                WalletRequest::Call(call)
                    if call.data[..4] == ILayerLeapBridge::isChainSupportedCall::SELECTOR =>
                {
                    Some(call)
                }
                _ => None,
            })
            .collect();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].to, Address::repeat_byte(0xb1));
        let decoded =
            ILayerLeapBridge::isChainSupportedCall::abi_decode(&checks[0].data, true).unwrap();
        assert_eq!(decoded.chainId, U256::from(42161u64));
    }

    #[tokio::test]
    async fn test_route_disabled_on_contract_sends_nothing() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.set_route_supported(false);

        let err = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await
            .unwrap_err();

        assert_eq!(err, BridgeError::UnsupportedChain { chain_id: 42161 });
        assert_eq!(wallet.count(|r| matches!(r, WalletRequest::Balance(_))), 0);
        assert!(sends(&wallet).is_empty());
    }

    #[tokio::test]
    async fn test_failed_route_read_does_not_block() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.revert_selector(
            ILayerLeapBridge::isChainSupportedCall::SELECTOR,
            WalletError::Rpc {
                code: Some(3),
                message: "execution reverted".into(),
            },
        );

        let result = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await;
        assert!(result.is_ok());
        assert_eq!(sends(&wallet).len(), 1);
    }

    #[tokio::test]
    async fn test_other_protocols_skip_route_read() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.set_route_supported(false);

        submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::Hyperlane, &request(8453), TEST_ACCOUNT, &quote())
            .await
            .unwrap();
        assert_eq!(wallet.count(|r| matches!(r, WalletRequest::Call(_))), 0);
    }

    #[tokio::test]
    async fn test_insufficient_balance_blocks_submission() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.set_balance(U256::from(1_001_099u64));

        let err = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BridgeError::InsufficientBalance {
                required: "1001100".into(),
                available: "1001099".into(),
            }
        );
        assert!(sends(&wallet).is_empty());
    }

    #[tokio::test]
    async fn test_exact_balance_is_enough() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.set_balance(U256::from(1_001_100u64));

        let result = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_balance_check_can_be_disabled() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.set_balance(U256::ZERO);
        let options = SubmitOptions {
            enforce_balance_check: false,
            ..Default::default()
        };

        let result = submitter(wallet.clone(), options)
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await;
        assert!(result.is_ok());
        assert_eq!(wallet.count(|r| matches!(r, WalletRequest::Balance(_))), 0);
    }

    #[tokio::test]
    async fn test_dry_run_revert_carries_debug_info() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.revert_selector(
            ILayerLeapBridge::bridgeNativeCall::SELECTOR,
            WalletError::Rpc {
                code: Some(3),
                message: "execution reverted: chain paused".into(),
            },
        );
        let options = SubmitOptions {
            dry_run: true,
            ..Default::default()
        };

        let err = submitter(wallet.clone(), options)
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await
            .unwrap_err();

        match &err {
            BridgeError::DryRunReverted { reason, debug } => {
                assert!(reason.contains("chain paused"));
                assert_eq!(debug.code, Some(3));
                assert_eq!(debug.value, "1001100");
                assert!(debug.data.ends_with("..."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.debug_info().is_some());
        assert!(sends(&wallet).is_empty());
    }

    #[tokio::test]
    async fn test_gas_estimation_failure() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.set_gas(Err(WalletError::Rpc {
            code: Some(-32000),
            message: "gas required exceeds allowance".into(),
        }));

        let err = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::Hyperlane, &request(8453), TEST_ACCOUNT, &quote())
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::GasEstimation { .. }));
        assert_eq!(err.debug_info().unwrap().to, Address::repeat_byte(0xa1).to_string());
        assert!(sends(&wallet).is_empty());
    }

    #[tokio::test]
    async fn test_fixed_gas_skips_estimation() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        let options = SubmitOptions {
            gas: GasPolicy::Fixed(500_000),
            ..Default::default()
        };

        let tx = submitter(wallet.clone(), options)
            .submit(Protocol::LayerZeroEndpoint, &request(1), TEST_ACCOUNT, &quote())
            .await
            .unwrap();

        assert_eq!(tx.gas_limit, 500_000);
        assert_eq!(wallet.count(|r| matches!(r, WalletRequest::EstimateGas(_))), 0);
    }

    #[tokio::test]
    async fn test_user_rejection_is_not_retried() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.fail_sends(5, WalletError::UserRejected);

        let err = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await
            .unwrap_err();

        assert_eq!(err, BridgeError::UserRejected);
        assert_eq!(sends(&wallet).len(), 1);
    }

    #[tokio::test]
    async fn test_transient_send_failure_is_retried() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.fail_sends(
            1,
            WalletError::Rpc {
                code: None,
                message: "connection reset by peer".into(),
            },
        );

        let tx = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await
            .unwrap();

        assert_eq!(sends(&wallet).len(), 2);
        assert_eq!(tx.hash, MockWallet::sent_hash(1));
    }

    #[tokio::test]
    async fn test_permanent_send_failure_carries_debug_info() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.fail_sends(
            3,
            WalletError::Rpc {
                code: Some(-32000),
                message: "insufficient funds for gas * price + value".into(),
            },
        );

        let err = submitter(wallet.clone(), SubmitOptions::default())
            .submit(Protocol::LayerZeroBridge, &request(42161), TEST_ACCOUNT, &quote())
            .await
            .unwrap_err();

        match &err {
            BridgeError::Transaction { message, debug } => {
                assert!(message.contains("insufficient funds"));
                assert_eq!(debug.code, Some(-32000));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(sends(&wallet).len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_sender_prefers_authorized_account() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        let sender = submitter(wallet.clone(), SubmitOptions::default())
            .resolve_sender()
            .await
            .unwrap();

        assert_eq!(sender, TEST_ACCOUNT);
        assert_eq!(wallet.count(|r| matches!(r, WalletRequest::RequestAccounts)), 0);
    }

    #[tokio::test]
    async fn test_resolve_sender_requests_access() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.set_accounts(vec![]);
        wallet.set_requestable_accounts(Ok(vec![Address::repeat_byte(0x05)]));

        let sender = submitter(wallet.clone(), SubmitOptions::default())
            .resolve_sender()
            .await
            .unwrap();
        assert_eq!(sender, Address::repeat_byte(0x05));
    }

    #[tokio::test]
    async fn test_resolve_sender_without_accounts() {
        let wallet = Arc::new(MockWallet::on_chain(10));
        wallet.set_accounts(vec![]);
        wallet.set_requestable_accounts(Ok(vec![]));
        let s = submitter(wallet.clone(), SubmitOptions::default());
        assert_eq!(s.resolve_sender().await, Err(BridgeError::NoAccount));

        wallet.set_requestable_accounts(Err(WalletError::UserRejected));
        assert_eq!(s.resolve_sender().await, Err(BridgeError::UserRejected));
    }
}
