//! Secret key and mnemonic parsing.

use bip39::Mnemonic;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer;

use crate::error::SvmError;

/// Parses a base58-encoded 64-byte secret key.
///
/// # Errors
///
/// Returns [`SvmError::InvalidKeypair`] if the string is not base58 or does
/// not hold a valid ed25519 keypair.
pub fn keypair_from_base58(secret: &str) -> Result<Keypair, SvmError> {
    let bytes = bs58::decode(secret.trim())
        .into_vec()
        .map_err(|e| SvmError::InvalidKeypair(e.to_string()))?;
    Keypair::try_from(bytes.as_slice()).map_err(|e| SvmError::InvalidKeypair(e.to_string()))
}

/// Derives the Solana address of a base58-encoded secret key.
///
/// # Errors
///
/// Returns [`SvmError::InvalidKeypair`] if the key cannot be decoded.
pub fn solana_address_from_secret_key(secret: &str) -> Result<Pubkey, SvmError> {
    keypair_from_base58(secret).map(|keypair| keypair.pubkey())
}

/// Derives a keypair from a BIP-39 phrase with an empty passphrase.
///
/// The first 32 bytes of the BIP-39 seed are used directly as the ed25519
/// secret, without a derivation path.
///
/// # Errors
///
/// Returns [`SvmError::InvalidKeypair`] if the phrase is not a valid
/// mnemonic.
pub fn keypair_from_mnemonic(phrase: &str) -> Result<Keypair, SvmError> {
    let mnemonic =
        Mnemonic::parse(phrase.trim()).map_err(|e| SvmError::InvalidKeypair(e.to_string()))?;
    let seed = mnemonic.to_seed("");
    let mut secret = [0u8; 32];
    secret.copy_from_slice(&seed[..32]);
    Ok(Keypair::new_from_array(secret))
}

/// Derives the Solana address of a BIP-39 phrase.
///
/// # Errors
///
/// Returns [`SvmError::InvalidKeypair`] if the phrase is not a valid
/// mnemonic.
pub fn solana_address_from_mnemonic(phrase: &str) -> Result<Pubkey, SvmError> {
    keypair_from_mnemonic(phrase).map(|keypair| keypair.pubkey())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let keypair = Keypair::new();
        let secret = bs58::encode(keypair.to_bytes()).into_string();
        assert_eq!(
            solana_address_from_secret_key(&secret).unwrap(),
            keypair.pubkey()
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            solana_address_from_secret_key("not base58 0OIl"),
            Err(SvmError::InvalidKeypair(_))
        ));
        assert!(matches!(
            solana_address_from_secret_key("3yZe7d"),
            Err(SvmError::InvalidKeypair(_))
        ));
    }

    #[test]
    fn test_address_from_mnemonic() {
        let phrase = "pill tomorrow foster begin walnut borrow virtual kick shift mutual shoe scatter";
        assert_eq!(
            solana_address_from_mnemonic(phrase).unwrap().to_string(),
            "5ZWj7a1f8tWkjBESHKgrLmXshuXxqeY9SYcfbshpAqPG"
        );
        assert_eq!(
            solana_address_from_mnemonic(&format!("  {phrase}\n")).unwrap(),
            keypair_from_mnemonic(phrase).unwrap().pubkey()
        );
    }

    #[test]
    fn test_rejects_bad_mnemonic() {
        assert!(matches!(
            solana_address_from_mnemonic("pill tomorrow foster"),
            Err(SvmError::InvalidKeypair(_))
        ));
        assert!(matches!(
            solana_address_from_mnemonic(&["abandon"; 12].join(" ")),
            Err(SvmError::InvalidKeypair(_))
        ));
    }
}
