//! Bridge operator configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! network = "testnet"
//! min_received_bps = 9000
//! lz_receive_gas = 100000
//!
//! [evm]
//! rpc_url = "$EVM_RPC_URL"
//! private_key = "$EVM_PRIVATE_KEY"
//! oft = "0x..."
//!
//! [solana]
//! rpc_url = "https://api.devnet.solana.com"
//! secret_key = "$SOLANA_SECRET_KEY"
//! program_id = "8cnHHjBEwraSwzYvJZApU4AoKRsMSQqbCtpyDLr4Z72w"
//! mint = "8pfHJ12DNZP4fHpbUDPoSNUSBTk2Cmxr94YaSo96dWLS"
//! escrow = "8UbVZKH1Wxhmq9wEMfoPKTgKvp94TmgY44oYhPUCKQnR"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `BRIDGE_NETWORK` - Override `network` (`mainnet` or `testnet`)
//! - Keys and RPC URLs referenced by `$VAR` in the config file

use std::path::Path;

use oftbridge::address::solana_pubkey_from_base58;
use oftbridge::endpoint::BridgePair;
use oftbridge::oft::{
    DEFAULT_LZ_RECEIVE_GAS, DEFAULT_MIN_RECEIVED_BPS, ExecutorOptions, SlippageGuard,
};
use serde::{Deserialize, Serialize};
use solana_instruction::AccountMeta;
use solana_pubkey::Pubkey;

/// Errors produced while loading or interpreting the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Configuration file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`BridgeConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A required value is empty or still references an unset variable.
    #[error("{0} is not set (missing environment variable?)")]
    Unresolved(&'static str),
    /// A value could not be interpreted.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Configuration key.
        field: &'static str,
        /// What went wrong.
        reason: String,
    },
}

/// Which bridge deployment to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet and Solana mainnet-beta.
    Mainnet,
    /// Sepolia and Solana devnet.
    #[default]
    Testnet,
}

impl Network {
    /// Endpoint pair of this deployment.
    #[must_use]
    pub fn pair(self) -> BridgePair {
        match self {
            Self::Mainnet => BridgePair::mainnet(),
            Self::Testnet => BridgePair::testnet(),
        }
    }
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Deployment (default: `testnet`).
    #[serde(default)]
    pub network: Network,

    /// Minimum received, in basis points of the sent amount (default: `9000`).
    #[serde(default = "default_min_received_bps")]
    pub min_received_bps: u16,

    /// Gas granted to `lzReceive` on the destination (default: `100000`).
    #[serde(default = "default_lz_receive_gas")]
    pub lz_receive_gas: u64,

    /// EVM side.
    pub evm: EvmConfig,

    /// Solana side.
    pub solana: SolanaConfig,
}

/// EVM chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmConfig {
    /// HTTP RPC endpoint URL.
    pub rpc_url: String,

    /// Private key of the sending wallet (hex, with or without `0x` prefix).
    pub private_key: String,

    /// OFT contract address.
    pub oft: String,

    /// Chain ID override. Derived from the endpoint when absent.
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Token decimals override. Read from the token when absent.
    #[serde(default)]
    pub token_decimals: Option<u8>,
}

/// Solana configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    /// HTTP RPC endpoint URL.
    pub rpc_url: String,

    /// Base58-encoded 64-byte secret key of the sending wallet.
    pub secret_key: String,

    /// OFT program ID.
    pub program_id: String,

    /// Token mint.
    pub mint: String,

    /// Token escrow.
    pub escrow: String,

    /// Token program override (defaults to SPL Token).
    #[serde(default)]
    pub token_program: Option<String>,

    /// Lookup table override. Defaults to the endpoint's well-known table.
    #[serde(default)]
    pub lookup_table: Option<String>,

    /// Compute unit limit of send transactions (default: `500000`).
    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,

    /// LayerZero endpoint accounts appended to `send`.
    #[serde(default)]
    pub send_accounts: Vec<AccountEntry>,

    /// LayerZero endpoint accounts appended to `quote_send`.
    #[serde(default)]
    pub quote_accounts: Vec<AccountEntry>,
}

/// One instruction account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEntry {
    /// Base58 address.
    pub pubkey: String,
    /// Whether the account is writable.
    #[serde(default)]
    pub writable: bool,
}

const fn default_min_received_bps() -> u16 {
    DEFAULT_MIN_RECEIVED_BPS
}

#[allow(clippy::cast_possible_truncation)]
const fn default_lz_receive_gas() -> u64 {
    DEFAULT_LZ_RECEIVE_GAS as u64
}

const fn default_compute_unit_limit() -> u32 {
    oftbridge_svm::adapter::DEFAULT_COMPUTE_UNIT_LIMIT
}

impl BridgeConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// `BRIDGE_NETWORK` overrides the file's `network`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            tracing::warn!(path, "Configuration file not found");
            String::new()
        };

        let mut config = Self::from_toml_str(&content)?;

        if let Ok(network) = std::env::var("BRIDGE_NETWORK") {
            match network.to_ascii_lowercase().as_str() {
                "mainnet" => config.network = Network::Mainnet,
                "testnet" => config.network = Network::Testnet,
                other => tracing::warn!(network = other, "Ignoring unknown BRIDGE_NETWORK"),
            }
        }

        Ok(config)
    }

    /// Parses configuration text after expanding environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        Ok(toml::from_str(&expanded)?)
    }

    /// Endpoint pair of the configured deployment.
    #[must_use]
    pub fn pair(&self) -> BridgePair {
        self.network.pair()
    }

    /// Minimum-received guard.
    #[must_use]
    pub fn slippage(&self) -> SlippageGuard {
        SlippageGuard::new(self.min_received_bps)
    }

    /// Executor options attached to every send.
    #[must_use]
    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions::new().lz_receive(u128::from(self.lz_receive_gas), 0)
    }
}

impl SolanaConfig {
    /// Endpoint accounts appended to `send`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an address is not base58.
    pub fn send_account_metas(&self) -> Result<Vec<AccountMeta>, ConfigError> {
        account_metas("solana.send_accounts", &self.send_accounts)
    }

    /// Endpoint accounts appended to `quote_send`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an address is not base58.
    pub fn quote_account_metas(&self) -> Result<Vec<AccountMeta>, ConfigError> {
        account_metas("solana.quote_accounts", &self.quote_accounts)
    }
}

fn account_metas(
    field: &'static str,
    entries: &[AccountEntry],
) -> Result<Vec<AccountMeta>, ConfigError> {
    entries
        .iter()
        .map(|entry| {
            let pubkey = parse_pubkey(field, &entry.pubkey)?;
            Ok(if entry.writable {
                AccountMeta::new(pubkey, false)
            } else {
                AccountMeta::new_readonly(pubkey, false)
            })
        })
        .collect()
}

/// Returns the trimmed value, or an error if it is empty or an unexpanded
/// `$VAR` reference.
///
/// # Errors
///
/// Returns [`ConfigError::Unresolved`].
pub fn resolved<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('$') {
        Err(ConfigError::Unresolved(field))
    } else {
        Ok(value)
    }
}

/// Parses a base58 Solana address from a configuration value.
///
/// # Errors
///
/// Returns [`ConfigError`] if the value is unresolved or not a valid address.
pub fn parse_pubkey(field: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    solana_pubkey_from_base58(resolved(field, value)?).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match std::env::var(&var_name) {
            Ok(value) if !var_name.is_empty() => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced && !var_name.is_empty() {
                    result.push('}');
                }
            }
        }
    }

    result
}
