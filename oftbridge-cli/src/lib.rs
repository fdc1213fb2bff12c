//! Operator tooling for the EVM <-> Solana OFT bridge.
//!
//! The `oftbridge` binary reads a TOML configuration, builds one adapter per
//! chain and drives transfers through the [`oftbridge::Dispatcher`].

pub mod config;
pub mod setup;
