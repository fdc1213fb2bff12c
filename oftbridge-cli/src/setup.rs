//! Builds chain adapters and the dispatcher from configuration.

use std::sync::Arc;

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use oftbridge::Dispatcher;
use oftbridge::endpoint::BridgePair;
use oftbridge_evm::{EvmOftAdapter, EvmOftConfig, chain_id_for_eid};
use oftbridge_svm::{
    OftProgram, StaticEndpointAccounts, SvmOftAdapter, SvmOftConfig, keypair_from_base58,
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_keypair::Keypair;
use url::Url;

use crate::config::{BridgeConfig, ConfigError, parse_pubkey, resolved};

/// EVM adapter over a type-erased alloy provider.
pub type EvmAdapter = EvmOftAdapter<DynProvider>;

/// Solana adapter over the nonblocking RPC client.
pub type SolanaAdapter = SvmOftAdapter<RpcClient, Keypair>;

/// Dispatcher over both configured adapters.
pub type BridgeDispatcher = Dispatcher<EvmAdapter, SolanaAdapter>;

/// Parses the configured EVM private key.
///
/// # Errors
///
/// Returns [`ConfigError`] if the key is unset or malformed.
pub fn evm_signer(config: &BridgeConfig) -> Result<PrivateKeySigner, ConfigError> {
    resolved("evm.private_key", &config.evm.private_key)?
        .parse()
        .map_err(|e| ConfigError::Invalid {
            field: "evm.private_key",
            reason: format!("{e}"),
        })
}

/// Parses the configured Solana secret key.
///
/// # Errors
///
/// Returns [`ConfigError`] if the key is unset or malformed.
pub fn solana_keypair(config: &BridgeConfig) -> Result<Keypair, ConfigError> {
    keypair_from_base58(resolved("solana.secret_key", &config.solana.secret_key)?).map_err(|e| {
        ConfigError::Invalid {
            field: "solana.secret_key",
            reason: e.to_string(),
        }
    })
}

/// Builds the EVM adapter for the EVM endpoint of `pair`.
///
/// # Errors
///
/// Returns [`ConfigError`] if any EVM setting is missing or malformed.
pub fn evm_adapter(config: &BridgeConfig, pair: &BridgePair) -> Result<EvmAdapter, ConfigError> {
    let evm = &config.evm;
    let signer = evm_signer(config)?;
    let signer_address = signer.address();

    let rpc_url: Url = resolved("evm.rpc_url", &evm.rpc_url)?
        .parse()
        .map_err(|e| ConfigError::Invalid {
            field: "evm.rpc_url",
            reason: format!("{e}"),
        })?;
    let oft: Address = resolved("evm.oft", &evm.oft)?
        .parse()
        .map_err(|e| ConfigError::Invalid {
            field: "evm.oft",
            reason: format!("{e}"),
        })?;
    let chain_id = evm
        .chain_id
        .or_else(|| chain_id_for_eid(pair.evm().eid))
        .ok_or_else(|| ConfigError::Invalid {
            field: "evm.chain_id",
            reason: format!("no known chain ID for endpoint {}", pair.evm().eid),
        })?;

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(rpc_url)
        .erased();

    let oft_config = EvmOftConfig {
        oft,
        chain_id,
        token_decimals: evm.token_decimals,
        options: config.executor_options(),
        slippage: config.slippage(),
    };
    tracing::debug!(%oft, chain_id, signer = %signer_address, "Configured EVM adapter");
    Ok(EvmOftAdapter::new(pair, provider, signer_address, oft_config))
}

/// Builds the Solana adapter for the Solana endpoint of `pair`.
///
/// # Errors
///
/// Returns [`ConfigError`] if any Solana setting is missing or malformed.
pub fn solana_adapter(
    config: &BridgeConfig,
    pair: &BridgePair,
) -> Result<SolanaAdapter, ConfigError> {
    let solana = &config.solana;
    let keypair = solana_keypair(config)?;
    let rpc_url = resolved("solana.rpc_url", &solana.rpc_url)?.to_owned();

    let mut program = OftProgram::new(
        parse_pubkey("solana.program_id", &solana.program_id)?,
        parse_pubkey("solana.mint", &solana.mint)?,
        parse_pubkey("solana.escrow", &solana.escrow)?,
    );
    if let Some(token_program) = &solana.token_program {
        program = program.with_token_program(parse_pubkey("solana.token_program", token_program)?);
    }

    let mut svm_config = SvmOftConfig::new(program);
    svm_config.lookup_table = solana
        .lookup_table
        .as_deref()
        .map(|table| parse_pubkey("solana.lookup_table", table))
        .transpose()?;
    svm_config.compute_unit_limit = solana.compute_unit_limit;
    svm_config.options = config.executor_options();
    svm_config.slippage = config.slippage();

    let accounts =
        StaticEndpointAccounts::new(solana.send_account_metas()?, solana.quote_account_metas()?);
    let rpc = RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed());
    tracing::debug!(program = %program.program_id, mint = %program.mint, "Configured Solana adapter");
    Ok(SvmOftAdapter::new(pair, rpc, keypair, accounts, svm_config))
}

/// Builds both adapters and the dispatcher over them.
///
/// # Errors
///
/// Returns [`ConfigError`] if either adapter cannot be configured.
pub fn dispatcher(config: &BridgeConfig) -> Result<BridgeDispatcher, ConfigError> {
    let pair = config.pair();
    let evm = Arc::new(evm_adapter(config, &pair)?);
    let solana = Arc::new(solana_adapter(config, &pair)?);
    Ok(Dispatcher::new(pair, evm, solana))
}
