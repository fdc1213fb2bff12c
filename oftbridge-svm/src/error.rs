//! Errors raised by the Solana adapter.

use oftbridge::EndpointId;
use oftbridge::address::AddressError;
use oftbridge::amount::AmountError;
use solana_client::client_error::ClientError;
use solana_pubkey::Pubkey;
use solana_signer::SignerError;

/// Errors that can occur while connecting, quoting or sending on Solana.
#[derive(Debug, thiserror::Error)]
pub enum SvmError {
    /// RPC request failed.
    #[error("RPC error: {0}")]
    Rpc(#[from] ClientError),
    /// The secret key could not be decoded.
    #[error("invalid keypair: {0}")]
    InvalidKeypair(String),
    /// An address could not be decoded.
    #[error(transparent)]
    Address(#[from] AddressError),
    /// The amount cannot be expressed in the mint's decimals.
    #[error(transparent)]
    Amount(#[from] AmountError),
    /// No address lookup table is known for the endpoint.
    #[error("no address lookup table configured for endpoint {0}")]
    MissingLookupTable(EndpointId),
    /// The lookup table account does not exist or has an invalid layout.
    #[error("invalid address lookup table {0}")]
    InvalidLookupTable(Pubkey),
    /// The sender's associated token account does not exist.
    #[error("token account {0} does not exist")]
    MissingTokenAccount(Pubkey),
    /// The mint account is missing or not an SPL mint.
    #[error("invalid mint {0}")]
    InvalidMint(Pubkey),
    /// Simulation reported a program error.
    #[error("simulation failed: {0}")]
    Simulation(String),
    /// Simulation returned no or malformed return data.
    #[error("invalid return data: {0}")]
    ReturnData(String),
    /// Instruction arguments could not be encoded.
    #[error("failed to encode instruction arguments: {0}")]
    Encode(#[from] std::io::Error),
    /// Message compilation failed.
    #[error("failed to compile message: {0}")]
    Compile(String),
    /// Transaction signing failed.
    #[error(transparent)]
    Signing(#[from] SignerError),
}
