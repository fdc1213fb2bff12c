//! Universal 32-byte recipient encoding.
//!
//! OFT transfers address the recipient as a `bytes32` regardless of the
//! destination chain. EVM addresses are left-padded with zeros; Solana public
//! keys already occupy 32 bytes.

use alloy_primitives::{Address, B256};
use solana_pubkey::Pubkey;

/// Errors produced while decoding recipient addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The 12 high-order bytes of an EVM recipient are not zero.
    #[error("bytes32 {0} does not hold a left-padded EVM address")]
    NotEvmPadded(B256),
    /// The input is not valid base58.
    #[error("invalid base58 address {0:?}")]
    InvalidBase58(String),
    /// The decoded key does not have 32 bytes.
    #[error("expected a 32-byte public key, got {0} bytes")]
    InvalidLength(usize),
}

/// An address that can be expressed as a LayerZero `bytes32` recipient.
pub trait UniversalAddress {
    /// Encodes this address as a 32-byte big-endian value.
    fn to_bytes32(&self) -> B256;
}

impl UniversalAddress for Address {
    fn to_bytes32(&self) -> B256 {
        self.into_word()
    }
}

impl UniversalAddress for Pubkey {
    fn to_bytes32(&self) -> B256 {
        B256::from(self.to_bytes())
    }
}

impl UniversalAddress for B256 {
    fn to_bytes32(&self) -> B256 {
        *self
    }
}

/// Recovers an EVM address from a left-padded `bytes32`.
///
/// # Errors
///
/// Returns [`AddressError::NotEvmPadded`] if the padding bytes are not zero.
pub fn evm_address_from_bytes32(word: B256) -> Result<Address, AddressError> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AddressError::NotEvmPadded(word));
    }
    Ok(Address::from_word(word))
}

/// Interprets a `bytes32` as a Solana public key.
#[must_use]
pub fn solana_pubkey_from_bytes32(word: B256) -> Pubkey {
    Pubkey::new_from_array(word.0)
}

/// Parses a base58-encoded Solana address.
///
/// # Errors
///
/// Returns [`AddressError`] if the string is not base58 or not 32 bytes long.
pub fn solana_pubkey_from_base58(s: &str) -> Result<Pubkey, AddressError> {
    let bytes = bs58::decode(s.trim())
        .into_vec()
        .map_err(|_| AddressError::InvalidBase58(s.to_owned()))?;
    let array: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
    Ok(Pubkey::new_from_array(array))
}

/// Renders a `bytes32` as `0x`-prefixed lowercase hex.
#[must_use]
pub fn bytes32_hex(word: B256) -> String {
    format!("{word:#x}")
}
