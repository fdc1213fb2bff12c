#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana side of the OFT bridge.
//!
//! [`SvmOftAdapter`] implements [`oftbridge::ChainAdapter`] against the
//! LayerZero OFT program. Sends are v0 transactions that reference the
//! endpoint's address lookup table, since the endpoint CPI accounts do not
//! fit a legacy transaction.
//!
//! # Modules
//!
//! - [`program`] - OFT program PDAs and instruction builders
//! - [`rpc`] - RPC client abstraction
//! - [`lookup_table`] - Address lookup table decoding
//! - [`adapter`] - The chain adapter
//! - [`keypair`] - Secret key and mnemonic parsing
//! - [`networks`] - Well-known lookup tables and devnet deployment
//! - [`error`] - Error type

pub mod adapter;
pub mod error;
pub mod keypair;
pub mod lookup_table;
pub mod networks;
pub mod program;
pub mod rpc;

pub use adapter::{SvmOftAdapter, SvmOftConfig};
pub use error::SvmError;
pub use keypair::{
    keypair_from_base58, keypair_from_mnemonic, solana_address_from_mnemonic,
    solana_address_from_secret_key,
};
pub use program::{EndpointAccounts, OftProgram, StaticEndpointAccounts};
pub use rpc::RpcClientLike;
