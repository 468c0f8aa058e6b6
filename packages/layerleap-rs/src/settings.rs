//! Pipeline settings

use crate::adapter::AdapterParams;
use crate::builder::ContractAddresses;
use crate::fees::FeeSettings;
use crate::registry::SOURCE_CHAIN_ID;
use crate::retry::RetryPolicy;
use crate::submitter::SubmitOptions;

/// Everything [`crate::pipeline::BridgeService`] needs besides the wallet,
/// the registry and the history store
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeSettings {
    /// Chain bridge transactions are sent from
    pub source_chain_id: u64,
    pub contracts: ContractAddresses,
    pub adapter_params: AdapterParams,
    pub fees: FeeSettings,
    pub submit: SubmitOptions,
    pub retry: RetryPolicy,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            source_chain_id: SOURCE_CHAIN_ID,
            contracts: ContractAddresses::default(),
            adapter_params: AdapterParams::default(),
            fees: FeeSettings::default(),
            submit: SubmitOptions::default(),
            retry: RetryPolicy::default(),
        }
    }
}
