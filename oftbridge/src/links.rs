//! Explorer and cross-chain tracking links for submitted transactions.

use crate::endpoint::{ChainEndpoint, ChainKind};

/// LayerZero Scan link for tracking the cross-chain message.
#[must_use]
pub fn layerzero_scan_link(hash: &str, testnet: bool) -> String {
    if testnet {
        format!("https://testnet.layerzeroscan.com/tx/{hash}")
    } else {
        format!("https://layerzeroscan.com/tx/{hash}")
    }
}

/// Solana Explorer link for a transaction signature.
#[must_use]
pub fn solana_explorer_tx_link(hash: &str, testnet: bool) -> String {
    let cluster = if testnet { "devnet" } else { "mainnet-beta" };
    format!("https://explorer.solana.com/tx/{hash}?cluster={cluster}")
}

/// Etherscan link for a transaction hash (Sepolia on testnet).
#[must_use]
pub fn etherscan_tx_link(hash: &str, testnet: bool) -> String {
    if testnet {
        format!("https://sepolia.etherscan.io/tx/{hash}")
    } else {
        format!("https://etherscan.io/tx/{hash}")
    }
}

/// Block explorer link for the given chain family.
#[must_use]
pub fn explorer_tx_link(kind: ChainKind, hash: &str, testnet: bool) -> String {
    match kind {
        ChainKind::Evm => etherscan_tx_link(hash, testnet),
        ChainKind::Solana => solana_explorer_tx_link(hash, testnet),
    }
}

/// Both links for a transaction submitted on `endpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLinks {
    /// Source chain block explorer.
    pub explorer: String,
    /// LayerZero Scan.
    pub tracker: String,
}

impl TransferLinks {
    /// Builds links for a transaction sent from `endpoint`.
    #[must_use]
    pub fn for_endpoint(endpoint: &ChainEndpoint, hash: &str) -> Self {
        Self {
            explorer: explorer_tx_link(endpoint.kind, hash, endpoint.testnet),
            tracker: layerzero_scan_link(hash, endpoint.testnet),
        }
    }
}
