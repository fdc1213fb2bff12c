//! Transfer direction and source/destination selection.
//!
//! With exactly two endpoints there are exactly two legal directions, so a
//! selection is stored as an `Option<Direction>` rather than two independent
//! endpoint fields. Choosing one side always fixes the other.

use crate::endpoint::{BridgePair, ChainEndpoint, ChainKind, EndpointError, EndpointId};

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Lock/burn on the EVM chain, deliver on Solana.
    EvmToSolana,
    /// Lock/burn on Solana, deliver on the EVM chain.
    SolanaToEvm,
}

impl Direction {
    /// Direction whose source is `kind`.
    #[must_use]
    pub const fn from_source(kind: ChainKind) -> Self {
        match kind {
            ChainKind::Evm => Self::EvmToSolana,
            ChainKind::Solana => Self::SolanaToEvm,
        }
    }

    /// Direction whose destination is `kind`.
    #[must_use]
    pub const fn from_destination(kind: ChainKind) -> Self {
        Self::from_source(kind.other())
    }

    /// Maps a raw source/destination EID pair to a direction.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InconsistentPair`] unless `from` and `to` are
    /// the two endpoints of `pair` in some order.
    pub fn from_eids(
        pair: &BridgePair,
        from: EndpointId,
        to: EndpointId,
    ) -> Result<Self, EndpointError> {
        match (pair.kind_of(from), pair.kind_of(to)) {
            (Ok(source), Ok(destination)) if source != destination => {
                Ok(Self::from_source(source))
            }
            _ => Err(EndpointError::InconsistentPair { from, to }),
        }
    }

    /// Chain kind the tokens leave from.
    #[must_use]
    pub const fn source(self) -> ChainKind {
        match self {
            Self::EvmToSolana => ChainKind::Evm,
            Self::SolanaToEvm => ChainKind::Solana,
        }
    }

    /// Chain kind the tokens arrive on.
    #[must_use]
    pub const fn destination(self) -> ChainKind {
        self.source().other()
    }

    /// The opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::EvmToSolana => Self::SolanaToEvm,
            Self::SolanaToEvm => Self::EvmToSolana,
        }
    }
}

/// Source/destination selector that keeps both sides opposite.
#[derive(Debug, Clone)]
pub struct RouteSelector {
    pair: BridgePair,
    direction: Option<Direction>,
}

impl RouteSelector {
    /// Creates a selector with nothing selected.
    #[must_use]
    pub const fn new(pair: BridgePair) -> Self {
        Self {
            pair,
            direction: None,
        }
    }

    /// Creates a selector with an initial direction.
    #[must_use]
    pub const fn with_direction(pair: BridgePair, direction: Direction) -> Self {
        Self {
            pair,
            direction: Some(direction),
        }
    }

    /// The endpoint pair this selector chooses from.
    #[must_use]
    pub const fn pair(&self) -> &BridgePair {
        &self.pair
    }

    /// Current direction, if any side has been selected.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Selects the source endpoint; the destination flips to the other one.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Unknown`] if `eid` is not part of the pair.
    pub fn select_source(&mut self, eid: EndpointId) -> Result<Direction, EndpointError> {
        let direction = Direction::from_source(self.pair.kind_of(eid)?);
        self.direction = Some(direction);
        Ok(direction)
    }

    /// Selects the destination endpoint; the source flips to the other one.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Unknown`] if `eid` is not part of the pair.
    pub fn select_destination(&mut self, eid: EndpointId) -> Result<Direction, EndpointError> {
        let direction = Direction::from_destination(self.pair.kind_of(eid)?);
        self.direction = Some(direction);
        Ok(direction)
    }

    /// Swaps source and destination. No-op when nothing is selected.
    pub fn swap(&mut self) {
        self.direction = self.direction.map(Direction::reversed);
    }

    /// Currently selected source endpoint.
    #[must_use]
    pub fn source(&self) -> Option<&ChainEndpoint> {
        self.direction.map(|d| self.pair.by_kind(d.source()))
    }

    /// Currently selected destination endpoint.
    #[must_use]
    pub fn destination(&self) -> Option<&ChainEndpoint> {
        self.direction.map(|d| self.pair.by_kind(d.destination()))
    }

    /// EID of the selected source.
    #[must_use]
    pub fn source_eid(&self) -> Option<EndpointId> {
        self.source().map(|e| e.eid)
    }

    /// EID of the selected destination.
    #[must_use]
    pub fn destination_eid(&self) -> Option<EndpointId> {
        self.destination().map(|e| e.eid)
    }
}
