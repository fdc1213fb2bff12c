#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM side of the OFT bridge.
//!
//! [`EvmOftAdapter`] implements [`oftbridge::ChainAdapter`] on top of any
//! alloy [`Provider`](alloy_provider::Provider) whose wallet holds the
//! sending key. Sends go through the OFT contract's `quoteSend` and `send`
//! entry points; the native messaging fee is attached as call value.
//!
//! # Modules
//!
//! - [`contract`] - Solidity interfaces for the OFT and its underlying ERC-20
//! - [`adapter`] - The chain adapter
//! - [`error`] - Error type
//! - [`networks`] - Known chain IDs per LayerZero endpoint

pub mod adapter;
pub mod contract;
pub mod error;
pub mod networks;

pub use adapter::{EvmOftAdapter, EvmOftConfig};
pub use error::EvmError;
pub use networks::*;
