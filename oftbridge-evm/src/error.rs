//! Errors raised by the EVM adapter.

use alloy_primitives::TxHash;
use alloy_provider::PendingTransactionError;
use alloy_transport::TransportError;
use oftbridge::amount::AmountError;

/// Errors that can occur while connecting or sending on an EVM chain.
#[derive(Debug, thiserror::Error)]
pub enum EvmError {
    /// RPC transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Contract call or encoding error.
    #[error(transparent)]
    Contract(#[from] alloy_contract::Error),
    /// Pending transaction error (timeout, dropped).
    #[error(transparent)]
    PendingTransaction(#[from] PendingTransactionError),
    /// The provider is connected to a different chain than configured.
    #[error("provider is on chain {actual}, expected {expected}")]
    WrongNetwork {
        /// Configured chain ID.
        expected: u64,
        /// Chain ID reported by the provider.
        actual: u64,
    },
    /// The amount cannot be expressed in the token's decimals.
    #[error(transparent)]
    Amount(#[from] AmountError),
    /// The send transaction was mined but reverted.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
}
