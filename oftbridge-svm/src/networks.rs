//! Well-known Solana deployments used by the bridge.

use oftbridge::EndpointId;
use oftbridge::endpoint::{SOLANA_V2_MAINNET, SOLANA_V2_TESTNET};
use solana_pubkey::{Pubkey, pubkey};

/// LayerZero address lookup table on Solana mainnet.
pub const MAINNET_LOOKUP_TABLE: Pubkey = pubkey!("AokBxha6VMLLgf97B5VYHEtqztamWmYERBmmFvjuTzJB");

/// LayerZero address lookup table on Solana devnet.
pub const DEVNET_LOOKUP_TABLE: Pubkey = pubkey!("9thqPdbR27A1yLWw2spwJLySemiGMXxPnEvfmXVk4KuK");

/// Public devnet RPC endpoint.
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

/// Lookup table for a Solana endpoint, if one is known.
#[must_use]
pub fn lookup_table_for_eid(eid: EndpointId) -> Option<Pubkey> {
    match eid {
        SOLANA_V2_MAINNET => Some(MAINNET_LOOKUP_TABLE),
        SOLANA_V2_TESTNET => Some(DEVNET_LOOKUP_TABLE),
        _ => None,
    }
}

/// Addresses of one OFT deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OftDeployment {
    /// OFT program.
    pub program_id: Pubkey,
    /// Token mint.
    pub mint: Pubkey,
    /// Token escrow owned by the OFT store.
    pub escrow: Pubkey,
}

/// Test deployment on Solana devnet.
pub const DEVNET_OFT: OftDeployment = OftDeployment {
    program_id: pubkey!("8cnHHjBEwraSwzYvJZApU4AoKRsMSQqbCtpyDLr4Z72w"),
    mint: pubkey!("8pfHJ12DNZP4fHpbUDPoSNUSBTk2Cmxr94YaSo96dWLS"),
    escrow: pubkey!("8UbVZKH1Wxhmq9wEMfoPKTgKvp94TmgY44oYhPUCKQnR"),
};
