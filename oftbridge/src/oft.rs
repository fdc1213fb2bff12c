//! OFT send parameters shared by both chain adapters.
//!
//! A send is quoted twice: once with a preview `minAmountLd` of 1 to learn
//! the native messaging fee, and once with the real minimum-received bound,
//! which is the one submitted.

use alloy_primitives::{B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::amount::{Amount, AmountError};
use crate::endpoint::EndpointId;

/// Default gas granted to `lzReceive` on the destination chain.
pub const DEFAULT_LZ_RECEIVE_GAS: u128 = 100_000;

/// Default minimum-received bound in basis points (90 %).
pub const DEFAULT_MIN_RECEIVED_BPS: u16 = 9_000;

const TYPE_3: u16 = 3;
const EXECUTOR_WORKER_ID: u8 = 1;
const OPTION_TYPE_LZRECEIVE: u8 = 1;

/// LayerZero type-3 executor options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutorOptions {
    lz_receive: Vec<(u128, u128)>,
}

impl ExecutorOptions {
    /// Empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an `lzReceive` option with the given gas and native value.
    #[must_use]
    pub fn lz_receive(mut self, gas: u128, value: u128) -> Self {
        self.lz_receive.push((gas, value));
        self
    }

    /// Encodes to the on-chain byte layout.
    ///
    /// `u16 type=3`, then for each option: `u8 worker`, `u16 size`,
    /// `u8 option type`, `u128 gas`, and `u128 value` when non-zero.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::with_capacity(2 + self.lz_receive.len() * 36);
        out.extend_from_slice(&TYPE_3.to_be_bytes());
        for &(gas, value) in &self.lz_receive {
            let mut option = Vec::with_capacity(32);
            option.extend_from_slice(&gas.to_be_bytes());
            if value != 0 {
                option.extend_from_slice(&value.to_be_bytes());
            }
            // size covers the option type byte plus the payload
            #[allow(clippy::cast_possible_truncation)]
            let size = (option.len() + 1) as u16;
            out.push(EXECUTOR_WORKER_ID);
            out.extend_from_slice(&size.to_be_bytes());
            out.push(OPTION_TYPE_LZRECEIVE);
            out.extend_from_slice(&option);
        }
        out.into()
    }
}

/// Lower bound on the amount received, as a fraction of the amount sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageGuard {
    /// Minimum received, in basis points of the sent amount.
    pub min_received_bps: u16,
}

impl Default for SlippageGuard {
    fn default() -> Self {
        Self {
            min_received_bps: DEFAULT_MIN_RECEIVED_BPS,
        }
    }
}

impl SlippageGuard {
    /// Creates a guard; values above 10 000 bps are clamped.
    #[must_use]
    pub fn new(min_received_bps: u16) -> Self {
        Self {
            min_received_bps: min_received_bps.min(10_000),
        }
    }

    /// Minimum acceptable received amount for `amount`, rounded down.
    #[must_use]
    pub fn min_amount(&self, amount: U256) -> U256 {
        let bps = U256::from(self.min_received_bps);
        amount.checked_mul(bps).map_or_else(
            || amount / U256::from(10_000u64) * bps,
            |scaled| scaled / U256::from(10_000u64),
        )
    }
}

/// Parameters of one OFT send in local token units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OftSendParams {
    /// Destination endpoint.
    pub dst_eid: EndpointId,
    /// Recipient, `bytes32`-encoded.
    pub to: B256,
    /// Amount in local decimals.
    pub amount_ld: U256,
    /// Minimum amount received, in local decimals.
    pub min_amount_ld: U256,
    /// Encoded executor options.
    pub extra_options: Bytes,
    /// Optional compose message.
    pub compose_msg: Option<Bytes>,
}

impl OftSendParams {
    /// Builds send parameters with the guard applied.
    #[must_use]
    pub fn for_transfer(
        dst_eid: EndpointId,
        to: B256,
        amount_ld: U256,
        options: &ExecutorOptions,
        guard: SlippageGuard,
    ) -> Self {
        Self {
            dst_eid,
            to,
            amount_ld,
            min_amount_ld: guard.min_amount(amount_ld),
            extra_options: options.encode(),
            compose_msg: None,
        }
    }

    /// Copy with `min_amount_ld = 1`, used only to discover the fee.
    #[must_use]
    pub fn preview(&self) -> Self {
        Self {
            min_amount_ld: U256::from(1u64),
            ..self.clone()
        }
    }

    /// Builds send parameters for an [`Amount`] on a token with `decimals`.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if the amount cannot be expressed in the
    /// token's local decimals.
    pub fn for_amount(
        dst_eid: EndpointId,
        to: B256,
        amount: Amount,
        decimals: u8,
        options: &ExecutorOptions,
        guard: SlippageGuard,
    ) -> Result<Self, AmountError> {
        let amount_ld = amount.to_local_units(decimals)?;
        Ok(Self::for_transfer(dst_eid, to, amount_ld, options, guard))
    }
}

/// Messaging fee quoted by the OFT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingFee {
    /// Fee in the source chain's native token.
    pub native_fee: u128,
    /// Fee in LZ token; always zero here, the bridge pays in native.
    pub lz_token_fee: u128,
}
