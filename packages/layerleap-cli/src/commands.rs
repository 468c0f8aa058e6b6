//! Subcommand handlers

use chrono::{TimeZone, Utc};
use eyre::{eyre, Result};
use layerleap_rs::evm::EvmWallet;
use layerleap_rs::{
    format_eth, parse_eth_amount, stargate_transfer_url, BridgeError, BridgeRequest, BridgeService,
    BridgeTransactionRecord, ChainDescriptor, ChainRegistry, FileStore, Protocol, QuoteSource,
    TransactionHistory,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

pub fn open_history(config: &Config) -> TransactionHistory {
    TransactionHistory::new(Arc::new(FileStore::new(&config.history_dir)))
}

fn resolve_chain<'a>(registry: &'a ChainRegistry, name_or_id: &str) -> Result<&'a ChainDescriptor> {
    registry
        .find(name_or_id)
        .ok_or_else(|| eyre!("Unknown chain: {}", name_or_id))
}

async fn connect(config: &Config, registry: Arc<ChainRegistry>) -> Result<(Arc<EvmWallet>, BridgeService)> {
    let (rpc_url, private_key) = config.wallet_credentials()?;
    let wallet = Arc::new(EvmWallet::connect(rpc_url, private_key).await?);
    let service = BridgeService::new(
        wallet.clone(),
        registry,
        open_history(config),
        config.bridge_settings(),
    );
    Ok((wallet, service))
}

/// Turn a bridge error into a report, printing debug context when present
fn report(err: BridgeError) -> eyre::Report {
    if let Some(debug) = err.debug_info() {
        if let Ok(json) = serde_json::to_string_pretty(debug) {
            eprintln!("Debug info:\n{}", json);
        }
    }
    eyre::Report::new(err)
}

pub fn chains(registry: &ChainRegistry, protocol: Option<Protocol>, source_chain_id: u64) {
    let chains: Vec<&ChainDescriptor> = match protocol {
        Some(p) => registry.destinations(source_chain_id, p),
        None => registry.iter().collect(),
    };

    println!(
        "{:<8} {:<12} {:<16} {:>6} {:>10} {:>8}",
        "CHAIN", "KEY", "NAME", "LZ", "HYPERLANE", "STARGATE"
    );
    for chain in chains {
        let id = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<12} {:<16} {:>6} {:>10} {:>8}",
            chain.evm_chain_id,
            chain.key,
            chain.display_name,
            id(chain.layerzero_id.map(u32::from)),
            id(chain.hyperlane_domain),
            id(chain.stargate_id.map(u32::from)),
        );
    }
}

pub async fn bridge_routes(config: &Config, registry: Arc<ChainRegistry>) -> Result<()> {
    let (_, service) = connect(config, registry.clone()).await?;
    let routes = service.bridge_routes().await.map_err(report)?;

    println!("{:<8} {:<16} {:>6} {:>9}", "CHAIN", "NAME", "LZ", "REGISTRY");
    for route in routes {
        let chain = registry.get(route.chain_id);
        let name = chain.map(|c| c.display_name.as_str()).unwrap_or("unknown");
        let listed = match chain.and_then(|c| c.layerzero_id) {
            Some(id) if id == route.layerzero_id => "ok",
            Some(_) => "mismatch",
            None => "missing",
        };
        println!(
            "{:<8} {:<16} {:>6} {:>9}",
            route.chain_id, name, route.layerzero_id, listed
        );
    }
    Ok(())
}

pub async fn network(config: &Config, registry: Arc<ChainRegistry>, switch: bool) -> Result<()> {
    let (wallet, service) = connect(config, registry).await?;
    let guard = service.network();

    let current = guard.current_chain().await;
    println!("Account:      {}", wallet.address());
    println!(
        "Wallet chain: {}",
        current.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string())
    );
    println!("Source chain: {}", guard.source_chain_id());

    if guard.is_connected_to_source_chain().await {
        println!("Connected to the source chain");
    } else if switch {
        if guard.switch_to_source_chain().await {
            println!("Switched to the source chain");
        } else {
            return Err(eyre!("Could not switch to chain {}", guard.source_chain_id()));
        }
    } else {
        println!("Not on the source chain (use --switch)");
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteOutput {
    protocol: Protocol,
    destination_chain_id: u64,
    amount: String,
    fee: String,
    buffered_fee: String,
    buffer_bps: u32,
    total: String,
    fallback: bool,
}

pub struct TransferArgs {
    pub to: String,
    pub amount: String,
    pub recipient: Option<String>,
    pub protocol: Protocol,
}

fn build_request(
    wallet: &EvmWallet,
    registry: &ChainRegistry,
    args: &TransferArgs,
) -> Result<BridgeRequest> {
    let chain = resolve_chain(registry, &args.to)?;
    let recipient = match &args.recipient {
        Some(r) => r.clone(),
        None => wallet.address().to_string(),
    };
    Ok(BridgeRequest::from_input(chain.evm_chain_id, &recipient, &args.amount)?)
}

pub async fn quote(
    config: &Config,
    registry: Arc<ChainRegistry>,
    args: TransferArgs,
    json: bool,
) -> Result<()> {
    let (wallet, service) = connect(config, registry.clone()).await?;
    let request = build_request(&wallet, &registry, &args)?;
    let quote = service
        .quote(args.protocol, &request)
        .await
        .map_err(report)?;

    let output = QuoteOutput {
        protocol: args.protocol,
        destination_chain_id: request.destination_chain_id,
        amount: format_eth(request.amount),
        fee: quote.fee_in_ether(),
        buffered_fee: quote.buffered_fee_in_ether(),
        buffer_bps: quote.buffer_bps,
        total: format_eth(quote.total_value(request.amount)),
        fallback: quote.source == QuoteSource::Fallback,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Protocol:     {}", output.protocol);
        println!("Destination:  {}", output.destination_chain_id);
        println!("Amount:       {} ETH", output.amount);
        println!(
            "Fee:          {} ETH ({} ETH with {} bps buffer{})",
            output.fee,
            output.buffered_fee,
            output.buffer_bps,
            if output.fallback { ", default fee" } else { "" }
        );
        println!("Total value:  {} ETH", output.total);
    }
    Ok(())
}

pub async fn bridge(
    config: &Config,
    registry: Arc<ChainRegistry>,
    args: TransferArgs,
    json: bool,
) -> Result<()> {
    let (wallet, service) = connect(config, registry.clone()).await?;
    let request = build_request(&wallet, &registry, &args)?;

    info!(
        protocol = %args.protocol,
        dst_chain = request.destination_chain_id,
        recipient = %request.recipient,
        amount = %format_eth(request.amount),
        "Submitting bridge transaction"
    );

    let outcome = service
        .bridge(args.protocol, &request)
        .await
        .map_err(report)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.record)?);
        return Ok(());
    }

    println!("Transaction:  {:#x}", outcome.transaction.hash);
    println!("From:         {}", outcome.transaction.from);
    println!("Value:        {} ETH", format_eth(outcome.transaction.value));
    println!("Gas limit:    {}", outcome.transaction.gas_limit);
    if let Some(source) = registry.get(config.source_chain_id) {
        println!(
            "Explorer:     {}",
            source.tx_url(&format!("{:#x}", outcome.transaction.hash))
        );
    }
    Ok(())
}

pub fn stargate_url(
    config: &Config,
    registry: Arc<ChainRegistry>,
    to: &str,
    amount: &str,
) -> Result<()> {
    let chain = resolve_chain(&registry, to)?;
    let amount = parse_eth_amount(amount)?;
    let url = stargate_transfer_url(
        &registry,
        config.source_chain_id,
        chain.evm_chain_id,
        amount,
    )?;
    println!("{}", url);
    Ok(())
}

fn print_records(registry: &ChainRegistry, records: &[BridgeTransactionRecord]) {
    if records.is_empty() {
        println!("No bridge transactions recorded");
        return;
    }
    for r in records {
        let destination = registry
            .get(r.destination_chain_id)
            .map(|c| c.display_name.as_str())
            .unwrap_or("unknown");
        let time = Utc
            .timestamp_millis_opt(r.timestamp)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} {:<9} {} ETH -> {} (fee {} ETH) {}",
            time, r.status, r.amount, destination, r.fee, r.hash
        );
    }
}

pub fn history(config: &Config, registry: &ChainRegistry, json: bool, pending_only: bool) -> Result<()> {
    let history = open_history(config);
    let records = if pending_only {
        history.pending()
    } else {
        history.get_transaction_history()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_records(registry, &records);
    }
    Ok(())
}

pub async fn sync(config: &Config, registry: Arc<ChainRegistry>) -> Result<()> {
    let (_, service) = connect(config, registry).await?;
    let summary = service.sync_pending().await.map_err(report)?;

    println!(
        "Checked {}: {} completed, {} failed, {} still pending, {} errors",
        summary.checked, summary.completed, summary.failed, summary.still_pending, summary.errors
    );
    Ok(())
}
