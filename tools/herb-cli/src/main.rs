//! Herb-Trace: command line client for the HerbTraceability contract.
//!
//! ## Usage
//!
//! ```bash
//! # Read a batch from Sepolia
//! herb-trace batch ASH123456
//!
//! # Record a drying step through a local node
//! herb-trace --network localhost add-event ASH123456 --event-type Drying
//!
//! # Explore without a node
//! herb-trace --demo trail ASH123456
//! ```

mod commands;
mod demo;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use herb_ledger::{
    Address, HerbTraceService, JsonRpcProvider, LedgerConfig, LedgerProvider,
    LedgerSession, Network,
};
use herb_telemetry::{init_telemetry, TelemetryConfig};

use commands::Command;
use output::Output;

/// Herb-Trace ledger client
#[derive(Parser, Debug)]
#[command(name = "herb-trace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON-RPC endpoint URL (defaults to the network's endpoint)
    #[arg(long, global = true, env = "HERB_RPC_URL")]
    endpoint: Option<String>,

    /// Contract address
    #[arg(long, global = true, env = "HERB_CONTRACT_ADDRESS")]
    contract: Option<Address>,

    /// Network the contract is deployed on (sepolia, localhost)
    #[arg(long, global = true, env = "HERB_NETWORK")]
    network: Option<Network>,

    /// Wallet account to sign with (defaults to the first account)
    #[arg(long, global = true)]
    account: Option<Address>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Run against an in-memory ledger seeded with sample data
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let mut config = LedgerConfig::from_env()?;
    if let Some(network) = cli.network {
        config.network = network;
        config.rpc_url = network.rpc_url().to_string();
    }
    if let Some(endpoint) = cli.endpoint {
        config.rpc_url = endpoint;
    }
    if let Some(contract) = cli.contract {
        config.contract = contract;
    }
    debug!(rpc_url = %config.rpc_url, contract = %config.contract, "Configuration loaded");

    let output = Output::new(cli.json);

    if cli.demo {
        let ledger = Arc::new(demo::ledger(&config));
        let service = connect(ledger, &config, cli.account, true).await?;
        demo::seed(&service).await.context("seeding demo ledger")?;
        return commands::run(&service, cli.command, &output).await;
    }

    let provider = Arc::new(
        JsonRpcProvider::from_config(&config)
            .with_context(|| format!("creating provider for {}", config.rpc_url))?,
    );
    let wants_wallet = cli.command.is_write();
    let service = connect(provider, &config, cli.account, wants_wallet).await?;
    commands::run(&service, cli.command, &output).await
}

/// Open a session; reads do not need a wallet account.
async fn connect<P: LedgerProvider>(
    provider: Arc<P>,
    config: &LedgerConfig,
    account: Option<Address>,
    wants_wallet: bool,
) -> Result<HerbTraceService<P>> {
    let session = match (wants_wallet, account) {
        (false, _) => LedgerSession::read_only(provider, config.contract),
        (true, Some(account)) => LedgerSession::connect_as(provider, config, account)
            .await
            .context("connecting wallet")?,
        (true, None) => LedgerSession::connect(provider, config)
            .await
            .context("connecting wallet")?,
    };
    Ok(HerbTraceService::with_config(session, config))
}
