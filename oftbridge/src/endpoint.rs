//! LayerZero endpoint identifiers and the bridge's endpoint pair.
//!
//! A bridge deployment connects exactly two endpoints: one EVM chain and one
//! Solana-family chain. [`BridgePair`] makes that an invariant of the type
//! instead of something every caller has to remember.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ethereum mainnet endpoint ID.
pub const ETHEREUM_V2_MAINNET: EndpointId = EndpointId(30101);

/// Sepolia testnet endpoint ID.
pub const SEPOLIA_V2_TESTNET: EndpointId = EndpointId(40161);

/// Solana mainnet endpoint ID.
pub const SOLANA_V2_MAINNET: EndpointId = EndpointId(30168);

/// Solana devnet endpoint ID.
pub const SOLANA_V2_TESTNET: EndpointId = EndpointId(40168);

/// Opaque numeric identifier of a chain in the LayerZero endpoint registry.
///
/// Serialized as a bare number: `30168`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(u32);

impl EndpointId {
    /// Creates an endpoint ID from its raw value.
    #[must_use]
    pub const fn new(eid: u32) -> Self {
        Self(eid)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EndpointId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for EndpointId {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| EndpointError::InvalidId(s.to_owned()))
    }
}

/// Chain family of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    /// An EIP-155 chain reached through an OFT contract.
    Evm,
    /// A Solana-family chain reached through the OFT program.
    Solana,
}

impl ChainKind {
    /// Returns the other chain kind.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Evm => Self::Solana,
            Self::Solana => Self::Evm,
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evm => f.write_str("EVM"),
            Self::Solana => f.write_str("Solana"),
        }
    }
}

/// One side of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoint {
    /// LayerZero endpoint ID.
    pub eid: EndpointId,
    /// Human-readable chain name (e.g., "Ethereum", "Solana").
    pub name: String,
    /// Chain family, which also fixes the native address format.
    pub kind: ChainKind,
    /// Whether this endpoint is a testnet deployment.
    pub testnet: bool,
}

impl ChainEndpoint {
    /// Creates a new endpoint description.
    pub fn new(eid: EndpointId, name: impl Into<String>, kind: ChainKind, testnet: bool) -> Self {
        Self {
            eid,
            name: name.into(),
            kind,
            testnet,
        }
    }
}

/// Errors raised while resolving endpoints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// The string is not a decimal endpoint ID.
    #[error("invalid endpoint id {0:?}")]
    InvalidId(String),
    /// The EID does not belong to this bridge.
    #[error("endpoint {0} is not part of this bridge")]
    Unknown(EndpointId),
    /// The EID pair is not one of the two legal directions.
    #[error("endpoints {from} -> {to} do not form a bridge direction")]
    InconsistentPair {
        /// Requested source.
        from: EndpointId,
        /// Requested destination.
        to: EndpointId,
    },
    /// An endpoint was configured with the wrong chain family.
    #[error("endpoint {eid} must be a {expected} chain")]
    WrongKind {
        /// Offending endpoint.
        eid: EndpointId,
        /// Kind required at that position.
        expected: ChainKind,
    },
    /// Both endpoints share the same EID.
    #[error("bridge endpoints must be distinct, both are {0}")]
    Duplicate(EndpointId),
}

/// The two endpoints of a bridge deployment.
///
/// Holds exactly one EVM endpoint and one Solana endpoint with distinct EIDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgePair {
    evm: ChainEndpoint,
    solana: ChainEndpoint,
}

impl BridgePair {
    /// Creates a pair after checking kinds and distinctness.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::WrongKind`] if either endpoint has the wrong
    /// chain family, or [`EndpointError::Duplicate`] if the EIDs collide.
    pub fn new(evm: ChainEndpoint, solana: ChainEndpoint) -> Result<Self, EndpointError> {
        if evm.kind != ChainKind::Evm {
            return Err(EndpointError::WrongKind {
                eid: evm.eid,
                expected: ChainKind::Evm,
            });
        }
        if solana.kind != ChainKind::Solana {
            return Err(EndpointError::WrongKind {
                eid: solana.eid,
                expected: ChainKind::Solana,
            });
        }
        if evm.eid == solana.eid {
            return Err(EndpointError::Duplicate(evm.eid));
        }
        Ok(Self { evm, solana })
    }

    /// Ethereum mainnet <-> Solana mainnet.
    #[must_use]
    pub fn mainnet() -> Self {
        Self {
            evm: ChainEndpoint::new(ETHEREUM_V2_MAINNET, "Ethereum", ChainKind::Evm, false),
            solana: ChainEndpoint::new(SOLANA_V2_MAINNET, "Solana", ChainKind::Solana, false),
        }
    }

    /// Sepolia <-> Solana devnet.
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            evm: ChainEndpoint::new(SEPOLIA_V2_TESTNET, "Sepolia", ChainKind::Evm, true),
            solana: ChainEndpoint::new(SOLANA_V2_TESTNET, "Solana Devnet", ChainKind::Solana, true),
        }
    }

    /// The EVM endpoint.
    #[must_use]
    pub const fn evm(&self) -> &ChainEndpoint {
        &self.evm
    }

    /// The Solana endpoint.
    #[must_use]
    pub const fn solana(&self) -> &ChainEndpoint {
        &self.solana
    }

    /// Returns the endpoint of the given kind.
    #[must_use]
    pub const fn by_kind(&self, kind: ChainKind) -> &ChainEndpoint {
        match kind {
            ChainKind::Evm => &self.evm,
            ChainKind::Solana => &self.solana,
        }
    }

    /// Resolves an EID to its chain kind within this pair.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Unknown`] if the EID is not part of the pair.
    pub fn kind_of(&self, eid: EndpointId) -> Result<ChainKind, EndpointError> {
        if eid == self.evm.eid {
            Ok(ChainKind::Evm)
        } else if eid == self.solana.eid {
            Ok(ChainKind::Solana)
        } else {
            Err(EndpointError::Unknown(eid))
        }
    }

    /// Resolves an EID to its endpoint within this pair.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Unknown`] if the EID is not part of the pair.
    pub fn endpoint(&self, eid: EndpointId) -> Result<&ChainEndpoint, EndpointError> {
        self.kind_of(eid).map(|kind| self.by_kind(kind))
    }

    /// Both endpoints, EVM first.
    #[must_use]
    pub fn endpoints(&self) -> [&ChainEndpoint; 2] {
        [&self.evm, &self.solana]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eid_parse_and_display() {
        let eid: EndpointId = "30168".parse().unwrap();
        assert_eq!(eid, SOLANA_V2_MAINNET);
        assert_eq!(eid.to_string(), "30168");
        assert!("solana".parse::<EndpointId>().is_err());
    }

    #[test]
    fn test_eid_serializes_as_number() {
        let json = serde_json::to_string(&SEPOLIA_V2_TESTNET).unwrap();
        assert_eq!(json, "40161");
    }

    #[test]
    fn test_pair_rejects_wrong_kind() {
        let a = ChainEndpoint::new(EndpointId::new(1), "A", ChainKind::Solana, false);
        let b = ChainEndpoint::new(EndpointId::new(2), "B", ChainKind::Solana, false);
        assert_eq!(
            BridgePair::new(a, b),
            Err(EndpointError::WrongKind {
                eid: EndpointId::new(1),
                expected: ChainKind::Evm
            })
        );
    }

    #[test]
    fn test_pair_rejects_duplicate_eid() {
        let a = ChainEndpoint::new(EndpointId::new(7), "A", ChainKind::Evm, false);
        let b = ChainEndpoint::new(EndpointId::new(7), "B", ChainKind::Solana, false);
        assert_eq!(
            BridgePair::new(a, b),
            Err(EndpointError::Duplicate(EndpointId::new(7)))
        );
    }

    #[test]
    fn test_pair_lookup() {
        let pair = BridgePair::testnet();
        assert_eq!(pair.kind_of(SOLANA_V2_TESTNET), Ok(ChainKind::Solana));
        assert_eq!(pair.kind_of(SEPOLIA_V2_TESTNET), Ok(ChainKind::Evm));
        assert_eq!(
            pair.kind_of(SOLANA_V2_MAINNET),
            Err(EndpointError::Unknown(SOLANA_V2_MAINNET))
        );
        assert!(pair.endpoint(SEPOLIA_V2_TESTNET).unwrap().testnet);
    }
}
