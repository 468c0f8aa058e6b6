//! CLI configuration
//!
//! Read from `.env` and the environment; command-line flags override the
//! result in `main`.

use alloy::primitives::{Address, U256};
use eyre::{eyre, Result, WrapErr};
use layerleap_rs::{
    parse_address, parse_eth_amount, AdapterParams, BridgeSettings, ContractAddresses,
    FeeSettings, GasPolicy, RetryPolicy, SubmitOptions, DEFAULT_DST_GAS_LIMIT,
    DEFAULT_FEE_BUFFER_BPS, SOURCE_CHAIN_ID,
};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use layerleap_rs::fees::DEFAULT_FALLBACK_FEE_WEI;
use layerleap_rs::redact::{redact_rpc_url, Redacted};
use layerleap_rs::submitter::DEFAULT_GAS_BUFFER_BPS;

const DEFAULT_HISTORY_DIR: &str = ".layerleap";

#[derive(Clone)]
pub struct Config {
    /// JSON-RPC endpoint of the source chain
    pub rpc_url: Option<String>,
    pub private_key: Option<String>,
    pub source_chain_id: u64,

    pub bridge_address: Option<Address>,
    pub lz_endpoint_address: Option<Address>,
    pub hyperlane_mailbox: Option<Address>,

    pub fee_buffer_bps: u32,
    /// Fee assumed when quoting fails
    pub default_fee: U256,

    /// Fixed gas limit; estimated when unset
    pub gas_limit: Option<u64>,
    pub gas_buffer_bps: u32,
    /// Gas granted on the destination chain
    pub dst_gas_limit: u64,
    pub dry_run: bool,
    pub enforce_balance_check: bool,

    pub retry_max_attempts: u32,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,

    pub history_dir: PathBuf,
}

/// Custom Debug that redacts the private key and RPC credentials
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url.as_deref().map(redact_rpc_url))
            .field("private_key", &self.private_key.as_ref().map(Redacted))
            .field("source_chain_id", &self.source_chain_id)
            .field("bridge_address", &self.bridge_address)
            .field("lz_endpoint_address", &self.lz_endpoint_address)
            .field("hyperlane_mailbox", &self.hyperlane_mailbox)
            .field("fee_buffer_bps", &self.fee_buffer_bps)
            .field("default_fee", &self.default_fee)
            .field("gas_limit", &self.gas_limit)
            .field("gas_buffer_bps", &self.gas_buffer_bps)
            .field("dst_gas_limit", &self.dst_gas_limit)
            .field("dry_run", &self.dry_run)
            .field("enforce_balance_check", &self.enforce_balance_check)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_initial_backoff_ms", &self.retry_initial_backoff_ms)
            .field("retry_max_backoff_ms", &self.retry_max_backoff_ms)
            .field("history_dir", &self.history_dir)
            .finish()
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|e| eyre!("Invalid {}: {}", key, e)),
        _ => Ok(default),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(eyre!("Invalid {}: expected true or false, got {}", key, v)),
        },
    }
}

fn parse_address_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Address>> {
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => parse_address(&v)
            .map(Some)
            .wrap_err_with(|| format!("Invalid {}", key)),
        _ => Ok(None),
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from `.env` and the environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_fee = match non_empty(&lookup, "DEFAULT_FEE_ETH") {
            Some(v) => parse_eth_amount(&v).wrap_err("Invalid DEFAULT_FEE_ETH")?,
            None => U256::from(DEFAULT_FALLBACK_FEE_WEI),
        };

        let config = Self {
            rpc_url: non_empty(&lookup, "LAYERLEAP_RPC_URL"),
            private_key: non_empty(&lookup, "LAYERLEAP_PRIVATE_KEY"),
            source_chain_id: parse_or(&lookup, "LAYERLEAP_SOURCE_CHAIN_ID", SOURCE_CHAIN_ID)?,

            bridge_address: parse_address_var(&lookup, "LAYERLEAP_BRIDGE_ADDRESS")?,
            lz_endpoint_address: parse_address_var(&lookup, "LAYERLEAP_LZ_ENDPOINT_ADDRESS")?,
            hyperlane_mailbox: parse_address_var(&lookup, "LAYERLEAP_HYPERLANE_MAILBOX")?,

            fee_buffer_bps: parse_or(&lookup, "FEE_BUFFER_BPS", DEFAULT_FEE_BUFFER_BPS)?,
            default_fee,

            gas_limit: match non_empty(&lookup, "GAS_LIMIT") {
                Some(v) => Some(v.trim().parse().map_err(|_| eyre!("Invalid GAS_LIMIT"))?),
                None => None,
            },
            gas_buffer_bps: parse_or(&lookup, "GAS_BUFFER_BPS", DEFAULT_GAS_BUFFER_BPS)?,
            dst_gas_limit: parse_or(&lookup, "DST_GAS_LIMIT", DEFAULT_DST_GAS_LIMIT)?,
            dry_run: parse_bool(&lookup, "DRY_RUN", false)?,
            enforce_balance_check: parse_bool(&lookup, "ENFORCE_BALANCE_CHECK", true)?,

            retry_max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", 3)?,
            retry_initial_backoff_ms: parse_or(&lookup, "RETRY_INITIAL_BACKOFF_MS", 1000)?,
            retry_max_backoff_ms: parse_or(&lookup, "RETRY_MAX_BACKOFF_MS", 30_000)?,

            history_dir: non_empty(&lookup, "HISTORY_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_DIR)),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry_max_attempts == 0 {
            return Err(eyre!("RETRY_MAX_ATTEMPTS must be at least 1"));
        }
        if self.retry_initial_backoff_ms > self.retry_max_backoff_ms {
            return Err(eyre!(
                "RETRY_INITIAL_BACKOFF_MS cannot exceed RETRY_MAX_BACKOFF_MS"
            ));
        }
        if self.fee_buffer_bps > 100_000 {
            return Err(eyre!("FEE_BUFFER_BPS cannot exceed 100000 (1000%)"));
        }
        if self.gas_limit == Some(0) {
            return Err(eyre!("GAS_LIMIT must be positive"));
        }
        if self.dst_gas_limit == 0 {
            return Err(eyre!("DST_GAS_LIMIT must be positive"));
        }
        if let Some(url) = &self.rpc_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(eyre!("LAYERLEAP_RPC_URL must be an http(s) URL"));
            }
        }
        Ok(())
    }

    /// RPC URL and private key, required by commands that talk to a wallet
    pub fn wallet_credentials(&self) -> Result<(&str, &str)> {
        let rpc_url = self
            .rpc_url
            .as_deref()
            .ok_or_else(|| eyre!("LAYERLEAP_RPC_URL required"))?;
        let private_key = self
            .private_key
            .as_deref()
            .ok_or_else(|| eyre!("LAYERLEAP_PRIVATE_KEY required"))?;
        Ok((rpc_url, private_key))
    }

    pub fn bridge_settings(&self) -> BridgeSettings {
        let gas = match self.gas_limit {
            Some(limit) => GasPolicy::Fixed(limit),
            None => GasPolicy::Estimated {
                buffer_bps: self.gas_buffer_bps,
            },
        };

        BridgeSettings {
            source_chain_id: self.source_chain_id,
            contracts: ContractAddresses {
                bridge: self.bridge_address,
                layerzero_endpoint: self.lz_endpoint_address,
                hyperlane_mailbox: self.hyperlane_mailbox,
            },
            adapter_params: AdapterParams::V1 {
                gas_limit: self.dst_gas_limit,
            },
            fees: FeeSettings {
                buffer_bps: self.fee_buffer_bps,
                fallback_fee: Some(self.default_fee),
            },
            submit: SubmitOptions {
                gas,
                dry_run: self.dry_run,
                enforce_balance_check: self.enforce_balance_check,
            },
            retry: RetryPolicy {
                max_attempts: self.retry_max_attempts,
                initial_backoff: Duration::from_millis(self.retry_initial_backoff_ms),
                max_backoff: Duration::from_millis(self.retry_max_backoff_ms),
                ..Default::default()
            },
        }
    }
}
