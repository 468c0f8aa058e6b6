//! LayerLeap bridge CLI
//!
//! Bridges native ETH from Optimism over LayerZero or Hyperlane, prints
//! Stargate transfer links and keeps a local history of submitted
//! transactions.
//!
//! Configuration comes from the environment (and `.env`); see
//! [`config::Config`]. Logs go to stderr so `--json` output stays clean.

mod commands;
mod config;

use clap::{Args, Parser, Subcommand};
use commands::TransferArgs;
use config::Config;
use layerleap_rs::{ChainRegistry, Protocol};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "layerleap")]
#[command(about = "Bridge ETH from Optimism with LayerZero, Hyperlane or Stargate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC endpoint of the source chain (overrides LAYERLEAP_RPC_URL)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Directory holding the transaction history
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,

    /// Simulate every bridge transaction before sending it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct Transfer {
    /// Destination chain, by key, name or chain ID
    #[arg(short, long)]
    to: String,

    /// Amount of ETH to bridge
    #[arg(short, long)]
    amount: String,

    /// Recipient on the destination chain (defaults to the sender)
    #[arg(short, long)]
    recipient: Option<String>,

    /// layerzero, layerzero-endpoint or hyperlane
    #[arg(short, long, default_value = "layerzero")]
    protocol: Protocol,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

impl Transfer {
    fn split(self) -> (TransferArgs, bool) {
        (
            TransferArgs {
                to: self.to,
                amount: self.amount,
                recipient: self.recipient,
                protocol: self.protocol,
            },
            self.json,
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List supported chains and their protocol identifiers
    Chains {
        /// Only chains reachable from the source chain with this protocol
        #[arg(short, long)]
        protocol: Option<Protocol>,

        /// Read the routes configured on the deployed bridge contract
        #[arg(long, conflicts_with = "protocol")]
        live: bool,
    },

    /// Show the wallet network, optionally switching to the source chain
    Network {
        #[arg(long)]
        switch: bool,
    },

    /// Quote the protocol fee for a transfer
    Quote(Transfer),

    /// Submit a bridge transaction
    Bridge(Transfer),

    /// Print the Stargate transfer link for a destination and amount
    StargateUrl {
        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Show recorded bridge transactions, newest first
    History {
        #[arg(long)]
        json: bool,

        /// Only pending transactions
        #[arg(long)]
        pending: bool,
    },

    /// Refresh the status of pending transactions from their receipts
    Sync,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> eyre::Result<()> {
    let mut config = Config::load()?;
    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = Some(rpc_url);
    }
    if let Some(dir) = cli.history_dir {
        config.history_dir = dir;
    }
    if cli.dry_run {
        config.dry_run = true;
    }
    config.validate()?;
    debug!(config = ?config, "Configuration loaded");

    let registry = Arc::new(ChainRegistry::mainnet());

    match cli.command {
        Commands::Chains { live: true, .. } => commands::bridge_routes(&config, registry).await,
        Commands::Chains { protocol, .. } => {
            commands::chains(&registry, protocol, config.source_chain_id);
            Ok(())
        }
        Commands::Network { switch } => commands::network(&config, registry, switch).await,
        Commands::Quote(transfer) => {
            let (args, json) = transfer.split();
            commands::quote(&config, registry, args, json).await
        }
        Commands::Bridge(transfer) => {
            let (args, json) = transfer.split();
            commands::bridge(&config, registry, args, json).await
        }
        Commands::StargateUrl { to, amount } => {
            commands::stargate_url(&config, registry, &to, &amount)
        }
        Commands::History { json, pending } => {
            commands::history(&config, &registry, json, pending)
        }
        Commands::Sync => commands::sync(&config, registry).await,
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose {
        "debug"
    } else {
        "info,layerleap=debug,layerleap_rs=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
