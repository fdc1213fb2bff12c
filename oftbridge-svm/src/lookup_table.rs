//! Address lookup table decoding.
//!
//! A table account is a 56-byte header followed by a packed array of
//! 32-byte addresses. The header starts with a little-endian `u32` state
//! discriminator that is `1` for an initialized table.

use solana_message::AddressLookupTableAccount;
use solana_pubkey::{Pubkey, pubkey};

use crate::error::SvmError;
use crate::rpc::RpcClientLike;

/// Address lookup table program.
pub const ADDRESS_LOOKUP_TABLE_PROGRAM: Pubkey =
    pubkey!("AddressLookupTab1e1111111111111111111111111");

/// Size of the table header preceding the addresses.
pub const LOOKUP_TABLE_META_SIZE: usize = 56;

const LOOKUP_TABLE_DISCRIMINATOR: u32 = 1;

/// Decodes the raw data of a lookup table account.
///
/// # Errors
///
/// Returns [`SvmError::InvalidLookupTable`] if the data is not an
/// initialized table.
pub fn decode_lookup_table(
    key: Pubkey,
    data: &[u8],
) -> Result<AddressLookupTableAccount, SvmError> {
    let invalid = || SvmError::InvalidLookupTable(key);
    if data.len() < LOOKUP_TABLE_META_SIZE {
        return Err(invalid());
    }
    let (meta, addresses) = data.split_at(LOOKUP_TABLE_META_SIZE);
    let discriminator = u32::from_le_bytes([meta[0], meta[1], meta[2], meta[3]]);
    if discriminator != LOOKUP_TABLE_DISCRIMINATOR || addresses.len() % 32 != 0 {
        return Err(invalid());
    }
    let addresses = addresses
        .chunks_exact(32)
        .map(|chunk| {
            let mut array = [0u8; 32];
            array.copy_from_slice(chunk);
            Pubkey::new_from_array(array)
        })
        .collect();
    Ok(AddressLookupTableAccount { key, addresses })
}

/// Fetches and decodes a lookup table.
///
/// # Errors
///
/// Returns [`SvmError::InvalidLookupTable`] if the account is missing, not
/// owned by the lookup table program, or malformed.
pub async fn fetch_lookup_table<R: RpcClientLike>(
    rpc: &R,
    key: Pubkey,
) -> Result<AddressLookupTableAccount, SvmError> {
    let account = rpc
        .get_account(&key)
        .await?
        .ok_or(SvmError::InvalidLookupTable(key))?;
    if account.owner != ADDRESS_LOOKUP_TABLE_PROGRAM {
        return Err(SvmError::InvalidLookupTable(key));
    }
    let table = decode_lookup_table(key, &account.data)?;
    tracing::debug!(table = %key, addresses = table.addresses.len(), "Loaded lookup table");
    Ok(table)
}
