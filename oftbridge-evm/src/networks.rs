//! Known EVM chain IDs for the bridge's LayerZero endpoints.

use oftbridge::EndpointId;
use oftbridge::endpoint::{ETHEREUM_V2_MAINNET, SEPOLIA_V2_TESTNET};

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: u64 = 1;

/// Sepolia (testnet) chain ID.
pub const SEPOLIA: u64 = 11_155_111;

/// EIP-155 chain ID of a known EVM endpoint.
#[must_use]
pub fn chain_id_for_eid(eid: EndpointId) -> Option<u64> {
    match eid {
        ETHEREUM_V2_MAINNET => Some(ETHEREUM_MAINNET),
        SEPOLIA_V2_TESTNET => Some(SEPOLIA),
        _ => None,
    }
}
