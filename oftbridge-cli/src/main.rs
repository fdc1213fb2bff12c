//! Command-line operator for the EVM <-> Solana OFT bridge.
//!
//! # Usage
//!
//! ```bash
//! # Show what the send control would say for a transfer
//! oftbridge status --from 40161 --to 40168 --amount 1.5
//!
//! # Quote the messaging fee
//! oftbridge quote --from 40168 --to 40161 --amount 1.5
//!
//! # Send
//! oftbridge send --from 40161 --to 40168 --amount 1.5
//!
//! # Explorer links for a submitted transaction
//! oftbridge links --from 40168 5Ug...sig
//!
//! # Addresses of the configured keys
//! oftbridge address
//!
//! # Solana address of a BIP-39 phrase (no config needed)
//! SOLANA_MNEMONIC="pill tomorrow ..." oftbridge address
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `RUST_LOG` - Log level filter (default: `info`)
//! - `SOLANA_MNEMONIC` - Phrase for `address --mnemonic`

use alloy_primitives::B256;
use clap::{Args, Parser, Subcommand};
use oftbridge::DispatchOutcome;
use oftbridge::address::{UniversalAddress, bytes32_hex};
use oftbridge::amount::parse_amount;
use oftbridge::endpoint::{BridgePair, ChainKind, EndpointId};
use oftbridge::links::TransferLinks;
use oftbridge::route::{Direction, RouteSelector};
use oftbridge::wallet::{ChainAdapter, connect_eagerly, connect_explicitly};
use oftbridge_svm::{solana_address_from_mnemonic, solana_address_from_secret_key};
use tracing_subscriber::EnvFilter;

use oftbridge_cli::config::{BridgeConfig, resolved};
use oftbridge_cli::setup::{self, BridgeDispatcher};

#[derive(Debug, Parser)]
#[command(name = "oftbridge", version, about = "Move OFT tokens between EVM and Solana")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate whether a transfer may be sent and print the control label.
    Status(TransferArgs),
    /// Quote the LayerZero messaging fee of a transfer.
    Quote(TransferArgs),
    /// Send a transfer and print its explorer links.
    Send(TransferArgs),
    /// Print explorer and LayerZero Scan links for a transaction.
    Links {
        /// Endpoint the transaction was submitted on.
        #[arg(long)]
        from: EndpointId,
        /// Transaction hash or signature.
        hash: String,
    },
    /// Print the addresses of the configured keys.
    Address {
        /// Derive the Solana address of this BIP-39 phrase instead.
        #[arg(long, env = "SOLANA_MNEMONIC", hide_env_values = true)]
        mnemonic: Option<String>,
    },
}

#[derive(Debug, Args)]
struct TransferArgs {
    /// Source endpoint ID. The destination flips to the other chain.
    #[arg(long)]
    from: Option<EndpointId>,
    /// Destination endpoint ID. The source flips to the other chain.
    #[arg(long)]
    to: Option<EndpointId>,
    /// Amount in whole tokens, e.g. `1,234.5`.
    #[arg(long, default_value = "")]
    amount: String,
}

impl TransferArgs {
    fn direction(
        &self,
        pair: &BridgePair,
    ) -> Result<Option<Direction>, Box<dyn std::error::Error>> {
        let mut selector = RouteSelector::new(pair.clone());
        if let Some(from) = self.from {
            selector.select_source(from)?;
        }
        if let Some(to) = self.to {
            let before = selector.direction();
            let after = selector.select_destination(to)?;
            if before.is_some_and(|d| d != after) {
                tracing::warn!(%to, "Destination equals the selected source; source flipped");
            }
        }
        Ok(selector.direction())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env loaded: {e}");
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("oftbridge failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::Address {
        mnemonic: Some(phrase),
    } = &cli.command
    {
        report(&format!("Solana: {}", solana_address_from_mnemonic(phrase)?));
        return Ok(());
    }

    let config = BridgeConfig::load()?;
    tracing::debug!(network = ?config.network, "Loaded configuration");

    match cli.command {
        Command::Status(args) => status(&config, &args).await,
        Command::Quote(args) => quote(&config, &args).await,
        Command::Send(args) => send(&config, &args).await,
        Command::Links { from, hash } => {
            let pair = config.pair();
            let endpoint = pair.endpoint(from)?;
            print_links(&TransferLinks::for_endpoint(endpoint, &hash));
            Ok(())
        }
        Command::Address { .. } => address(&config),
    }
}

async fn status(
    config: &BridgeConfig,
    args: &TransferArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = setup::dispatcher(config)?;
    let direction = args.direction(dispatcher.pair())?;
    connect_eagerly(dispatcher.evm()).await;
    connect_eagerly(dispatcher.solana()).await;

    let evm = dispatcher.evm().state();
    let solana = dispatcher.solana().state();
    let status = dispatcher.status(direction, &args.amount);
    report(&format!(
        "{}: {} (enabled: {})\nEVM balance: {}\nSolana balance: {}",
        describe(dispatcher.pair(), direction),
        status.label,
        status.enabled,
        evm.token_balance,
        solana.token_balance,
    ));
    Ok(())
}

async fn quote(
    config: &BridgeConfig,
    args: &TransferArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = setup::dispatcher(config)?;
    let direction = args
        .direction(dispatcher.pair())?
        .ok_or("select a route with --from or --to")?;
    let amount = parse_amount(&args.amount)?;
    connect_all(&dispatcher).await?;

    let fee = match direction {
        Direction::EvmToSolana => {
            let to = dispatcher.solana().pubkey().to_bytes32();
            dispatcher.evm().quote(to, amount).await?
        }
        Direction::SolanaToEvm => {
            let to: B256 = dispatcher.evm().signer().to_bytes32();
            dispatcher.solana().quote(to, amount).await?
        }
    };
    report(&format!(
        "{}: native fee {} ({}), lz token fee {}",
        describe(dispatcher.pair(), Some(direction)),
        fee.native_fee,
        match direction.source() {
            ChainKind::Evm => "wei",
            ChainKind::Solana => "lamports",
        },
        fee.lz_token_fee,
    ));
    Ok(())
}

async fn send(
    config: &BridgeConfig,
    args: &TransferArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = setup::dispatcher(config)?;
    let direction = args.direction(dispatcher.pair())?;
    connect_all(&dispatcher).await?;

    match dispatcher.dispatch(direction, &args.amount).await? {
        DispatchOutcome::Submitted { request, tx_hash } => {
            report(&format!(
                "Sent {} from {} to {} (recipient {})\nTransaction: {tx_hash}",
                request.amount,
                request.source.name,
                request.destination.name,
                bytes32_hex(request.recipient),
            ));
            print_links(&TransferLinks::for_endpoint(&request.source, &tx_hash));
            Ok(())
        }
        DispatchOutcome::Blocked(status) => {
            Err(format!("send not permitted: {}", status.label).into())
        }
        DispatchOutcome::Skipped => Err("inconsistent endpoint pair".into()),
    }
}

fn address(config: &BridgeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let evm = setup::evm_signer(config)?.address();
    let solana = solana_address_from_secret_key(resolved(
        "solana.secret_key",
        &config.solana.secret_key,
    )?)?;
    report(&format!("EVM: {evm}\nSolana: {solana}"));
    Ok(())
}

async fn connect_all(dispatcher: &BridgeDispatcher) -> Result<(), Box<dyn std::error::Error>> {
    let evm = connect_explicitly(dispatcher.evm()).await;
    let solana = connect_explicitly(dispatcher.solana()).await;
    if evm && solana {
        Ok(())
    } else {
        Err("wallet connection failed".into())
    }
}

fn describe(pair: &BridgePair, direction: Option<Direction>) -> String {
    direction.map_or_else(
        || "no route".to_owned(),
        |d| {
            format!(
                "{} -> {}",
                pair.by_kind(d.source()).name,
                pair.by_kind(d.destination()).name
            )
        },
    )
}

fn print_links(links: &TransferLinks) {
    report(&format!(
        "Explorer: {}\nLayerZero Scan: {}",
        links.explorer, links.tracker
    ));
}

#[allow(clippy::print_stdout)]
fn report(message: &str) {
    println!("{message}");
}
