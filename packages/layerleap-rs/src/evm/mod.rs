//! EVM JSON-RPC wallet
//!
//! ## Submodules
//!
//! - `wallet` - [`EvmWallet`], a local private-key [`crate::WalletClient`]

pub mod wallet;

pub use wallet::EvmWallet;
