//! Bridge pipeline
//!
//! [`BridgeService`] wires the network guard, fee estimator, request builder,
//! submitter and history store around one wallet and one registry.

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};
use url::Url;

use crate::builder::RequestBuilder;
use crate::error::BridgeError;
use crate::fees::FeeEstimator;
use crate::history::TransactionHistory;
use crate::network::NetworkGuard;
use crate::registry::ChainRegistry;
use crate::settings::BridgeSettings;
use crate::stargate::stargate_transfer_url;
use crate::submitter::TransactionSubmitter;
use crate::types::{
    BridgeRequest, BridgeTransactionRecord, FeeQuote, Protocol, SubmittedTransaction, TxStatus,
};
use crate::wallet::{WalletClient, WalletEvent};

/// A submitted bridge transaction and what was recorded for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOutcome {
    pub transaction: SubmittedTransaction,
    pub quote: FeeQuote,
    pub record: BridgeTransactionRecord,
}

/// A destination the deployed LayerLeap bridge routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeRoute {
    pub chain_id: u64,
    /// LayerZero ID the contract maps the chain to
    pub layerzero_id: u16,
}

/// Result of [`BridgeService::sync_pending`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub checked: usize,
    pub completed: usize,
    pub failed: usize,
    pub still_pending: usize,
    /// Records whose status could not be fetched
    pub errors: usize,
}

pub struct BridgeService {
    wallet: Arc<dyn WalletClient>,
    registry: Arc<ChainRegistry>,
    builder: Arc<RequestBuilder>,
    history: TransactionHistory,
    guard: NetworkGuard,
    fees: FeeEstimator,
    submitter: TransactionSubmitter,
    source_chain_id: u64,
}

impl BridgeService {
    pub fn new(
        wallet: Arc<dyn WalletClient>,
        registry: Arc<ChainRegistry>,
        history: TransactionHistory,
        settings: BridgeSettings,
    ) -> Self {
        let builder = Arc::new(RequestBuilder::new(
            registry.clone(),
            settings.contracts,
            settings.adapter_params,
        ));
        let guard = NetworkGuard::new(wallet.clone(), registry.clone(), settings.source_chain_id);
        let fees = FeeEstimator::new(
            wallet.clone(),
            builder.clone(),
            settings.fees,
            settings.retry.clone(),
        );
        let submitter = TransactionSubmitter::new(
            wallet.clone(),
            builder.clone(),
            settings.submit,
            settings.retry,
        );

        Self {
            wallet,
            registry,
            builder,
            history,
            guard,
            fees,
            submitter,
            source_chain_id: settings.source_chain_id,
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn history(&self) -> &TransactionHistory {
        &self.history
    }

    pub fn network(&self) -> &NetworkGuard {
        &self.guard
    }

    pub fn fees(&self) -> &FeeEstimator {
        &self.fees
    }

    pub fn submitter(&self) -> &TransactionSubmitter {
        &self.submitter
    }

    fn check_route(&self, protocol: Protocol, request: &BridgeRequest) -> Result<(), BridgeError> {
        if protocol == Protocol::Stargate {
            return Err(BridgeError::Config(
                "stargate transfers are completed in the Stargate app, use the transfer URL"
                    .to_string(),
            ));
        }
        self.registry
            .protocol_id(protocol, request.destination_chain_id)
            .map(|_| ())
    }

    /// Buffered fee for a request, falling back to the default fee
    pub async fn quote(
        &self,
        protocol: Protocol,
        request: &BridgeRequest,
    ) -> Result<FeeQuote, BridgeError> {
        self.check_route(protocol, request)?;
        self.guard.ensure_source_chain().await?;
        let sender = self.submitter.resolve_sender().await?;
        self.fees.quote_or_default(protocol, request, sender).await
    }

    /// Quote, submit and record a bridge transaction
    pub async fn bridge(
        &self,
        protocol: Protocol,
        request: &BridgeRequest,
    ) -> Result<BridgeOutcome, BridgeError> {
        self.check_route(protocol, request)?;
        self.guard.ensure_source_chain().await?;

        let sender = self.submitter.resolve_sender().await?;
        let mut events = self.wallet.subscribe();
        let quote = self.fees.quote_or_default(protocol, request, sender).await?;
        self.check_wallet_unchanged(&mut events, sender)?;
        let transaction = self
            .submitter
            .submit(protocol, request, sender, &quote)
            .await?;

        let record =
            BridgeTransactionRecord::pending(transaction.hash, sender, request, &quote, protocol);
        // The transaction is already broadcast, so a history failure is not fatal
        if let Err(e) = self.history.save_transaction(record.clone()) {
            warn!(tx_hash = %transaction.hash, error = %e, "Failed to record bridge transaction");
        }

        Ok(BridgeOutcome {
            transaction,
            quote,
            record,
        })
    }

    /// Fail if the wallet moved off `sender` or the source chain since
    /// `events` was opened
    fn check_wallet_unchanged(
        &self,
        events: &mut broadcast::Receiver<WalletEvent>,
        sender: Address,
    ) -> Result<(), BridgeError> {
        let mut account = Some(sender);
        let mut chain = self.source_chain_id;
        loop {
            match events.try_recv() {
                Ok(WalletEvent::AccountsChanged(accounts)) => account = accounts.first().copied(),
                Ok(WalletEvent::ChainChanged(chain_id)) => chain = chain_id,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed wallet events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        if chain != self.source_chain_id {
            return Err(BridgeError::WrongNetwork {
                expected: self.source_chain_id,
                actual: Some(chain),
            });
        }
        if account != Some(sender) {
            warn!(sender = %sender, current = ?account, "Wallet account changed before submission");
            return Err(BridgeError::AccountChanged { expected: sender });
        }
        Ok(())
    }

    /// Stargate transfer page for a route from the source chain
    pub fn stargate_url(&self, destination_chain_id: u64, amount: U256) -> Result<Url, BridgeError> {
        stargate_transfer_url(
            &self.registry,
            self.source_chain_id,
            destination_chain_id,
            amount,
        )
    }

    /// Routes configured on the deployed LayerLeap bridge, as reported by
    /// `getSupportedChains` and `chainToLzId`
    pub async fn bridge_routes(&self) -> Result<Vec<BridgeRoute>, BridgeError> {
        let data = self
            .wallet
            .call(&self.builder.supported_chains_call()?)
            .await?;
        let chains = RequestBuilder::decode_supported_chains(&data)?;

        let mut routes = Vec::with_capacity(chains.len());
        for chain_id in chains {
            let data = self.wallet.call(&self.builder.lz_id_call(chain_id)?).await?;
            routes.push(BridgeRoute {
                chain_id,
                layerzero_id: RequestBuilder::decode_lz_id(&data)?,
            });
        }
        Ok(routes)
    }

    /// Check receipts of pending records and settle those that are mined
    pub async fn sync_pending(&self) -> Result<SyncReport, BridgeError> {
        let mut report = SyncReport::default();

        for record in self.history.pending() {
            report.checked += 1;
            let Some(hash) = record.tx_hash() else {
                warn!(tx_hash = %record.hash, "Skipping record with malformed hash");
                report.errors += 1;
                continue;
            };

            let status = match self.wallet.transaction_status(hash).await {
                Ok(Some(true)) => TxStatus::Completed,
                Ok(Some(false)) => TxStatus::Failed,
                Ok(None) => {
                    report.still_pending += 1;
                    continue;
                }
                Err(e) => {
                    warn!(tx_hash = %record.hash, error = %e, "Could not fetch receipt");
                    report.errors += 1;
                    continue;
                }
            };

            if self.history.update_transaction_status(&record.hash, status)? {
                info!(tx_hash = %record.hash, status = %status, "Bridge transaction settled");
                match status {
                    TxStatus::Completed => report.completed += 1,
                    _ => report.failed += 1,
                }
            }
        }

        Ok(report)
    }
}
