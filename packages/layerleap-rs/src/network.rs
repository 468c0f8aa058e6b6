//! Network guard
//!
//! Keeps the wallet on the source chain before anything is quoted or sent.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, WalletError};
use crate::registry::ChainRegistry;
use crate::wallet::{AddChainParams, WalletClient};

pub struct NetworkGuard {
    wallet: Arc<dyn WalletClient>,
    registry: Arc<ChainRegistry>,
    source_chain_id: u64,
}

impl NetworkGuard {
    pub fn new(
        wallet: Arc<dyn WalletClient>,
        registry: Arc<ChainRegistry>,
        source_chain_id: u64,
    ) -> Self {
        Self {
            wallet,
            registry,
            source_chain_id,
        }
    }

    pub fn source_chain_id(&self) -> u64 {
        self.source_chain_id
    }

    /// Chain the wallet reports, or `None` if it cannot tell
    ///
    /// `eth_chainId` wins over `net_version` when both answer and disagree.
    pub async fn current_chain(&self) -> Option<u64> {
        let chain_id = self.wallet.chain_id().await;
        let net_version = self.wallet.net_version().await;

        match (chain_id, net_version) {
            (Ok(chain_id), Ok(net_version)) => {
                if chain_id != net_version {
                    warn!(chain_id, net_version, "eth_chainId and net_version disagree");
                }
                Some(chain_id)
            }
            (Ok(chain_id), Err(_)) => Some(chain_id),
            (Err(e), Ok(net_version)) => {
                debug!(error = %e, net_version, "eth_chainId failed, using net_version");
                Some(net_version)
            }
            (Err(e), Err(_)) => {
                warn!(error = %e, "Could not determine wallet chain");
                None
            }
        }
    }

    pub async fn is_connected_to_source_chain(&self) -> bool {
        self.current_chain().await == Some(self.source_chain_id)
    }

    /// Move the wallet to the source chain, adding the network first if
    /// the wallet does not know it. Failures are logged and reported as
    /// `false`.
    pub async fn switch_to_source_chain(&self) -> bool {
        if self.is_connected_to_source_chain().await {
            return true;
        }

        let target = self.source_chain_id;
        info!(chain_id = target, "Requesting network switch");

        match self.wallet.switch_chain(target).await {
            Ok(()) => true,
            Err(WalletError::ChainNotAdded { .. }) => self.add_and_switch().await,
            Err(e) => {
                warn!(chain_id = target, error = %e, "Network switch failed");
                false
            }
        }
    }

    async fn add_and_switch(&self) -> bool {
        let target = self.source_chain_id;
        let Some(chain) = self.registry.get(target) else {
            warn!(chain_id = target, "Source chain missing from registry, cannot add it");
            return false;
        };

        let params = AddChainParams::from(chain);
        info!(chain_id = target, chain_name = %params.chain_name, "Adding network to wallet");
        if let Err(e) = self.wallet.add_chain(&params).await {
            warn!(chain_id = target, error = %e, "Adding network failed");
            return false;
        }

        match self.wallet.switch_chain(target).await {
            Ok(()) => true,
            Err(e) => {
                warn!(chain_id = target, error = %e, "Network switch failed after adding network");
                false
            }
        }
    }

    /// Switch if needed, or fail with [`BridgeError::WrongNetwork`]
    pub async fn ensure_source_chain(&self) -> Result<(), BridgeError> {
        if self.switch_to_source_chain().await {
            return Ok(());
        }
        Err(BridgeError::WrongNetwork {
            expected: self.source_chain_id,
            actual: self.current_chain().await,
        })
    }
}
