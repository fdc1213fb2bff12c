#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the EVM <-> Solana OFT bridge.
//!
//! This crate holds the chain-agnostic part of the bridge: which two endpoints
//! exist, which direction a transfer goes, how a user-entered amount becomes a
//! fixed-point value, how recipients are encoded for the LayerZero OFT
//! standard, and the dispatcher that decides whether a send is permitted and
//! which chain adapter performs it.
//!
//! Chain-specific adapters live in separate crates:
//!
//! - `oftbridge-evm` sends through an OFT contract with an alloy provider
//! - `oftbridge-svm` sends through the Solana OFT program
//!
//! # Modules
//!
//! - [`endpoint`] - Endpoint identifiers and the two-endpoint [`BridgePair`](endpoint::BridgePair)
//! - [`route`] - Transfer direction and the auto-flipping selector
//! - [`amount`] - 6-decimal fixed-point amounts
//! - [`address`] - Universal 32-byte recipient encoding
//! - [`wallet`] - Wallet state snapshots, state channel and the adapter trait
//! - [`dispatcher`] - Send validation and dispatch
//! - [`oft`] - OFT send parameters, executor options and the minimum-received guard
//! - [`links`] - Block explorer and LayerZero Scan links

pub mod address;
pub mod amount;
pub mod dispatcher;
pub mod endpoint;
pub mod links;
pub mod oft;
pub mod route;
pub mod wallet;

pub use amount::Amount;
pub use dispatcher::{DispatchOutcome, Dispatcher, SendLabel, SendStatus};
pub use endpoint::{BridgePair, ChainEndpoint, ChainKind, EndpointId};
pub use route::{Direction, RouteSelector};
pub use wallet::{ChainAdapter, ConnectMode, WalletState, WalletStateCell};
