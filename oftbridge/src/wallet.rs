//! Wallet state and the chain adapter contract.
//!
//! Each chain adapter owns a [`WalletStateCell`] and publishes every change to
//! it through a `tokio::sync::watch` channel. Readers (the dispatcher, a UI)
//! take snapshots or subscribe; they never mutate wallet state themselves.
//!
//! Adapters receive their provider handles at construction time. Nothing in
//! this crate looks a wallet up from ambient global state.

use alloy_primitives::B256;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use crate::address::UniversalAddress;
use crate::amount::Amount;
use crate::endpoint::ChainEndpoint;

/// Snapshot of one wallet's connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletState<A> {
    /// Connected address, or `None` when disconnected.
    pub address: Option<A>,
    /// Bridgeable token balance.
    pub token_balance: Amount,
    /// Whether a send is currently in flight.
    pub is_pending: bool,
    /// Hash of the most recent successful send.
    pub last_tx_hash: Option<String>,
}

impl<A> Default for WalletState<A> {
    fn default() -> Self {
        Self {
            address: None,
            token_balance: Amount::ZERO,
            is_pending: false,
            last_tx_hash: None,
        }
    }
}

impl<A> WalletState<A> {
    /// Whether an address is connected.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

/// Publisher side of a wallet's state channel.
#[derive(Debug)]
pub struct WalletStateCell<A> {
    tx: watch::Sender<WalletState<A>>,
}

impl<A: Clone> Default for WalletStateCell<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone> WalletStateCell<A> {
    /// Creates a cell holding the disconnected state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WalletState::default());
        Self { tx }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> WalletState<A> {
        self.tx.borrow().clone()
    }

    /// Subscribes to state changes. Dropping the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WalletState<A>> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Applies `f` to the state and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut WalletState<A>)) {
        self.tx.send_modify(f);
    }

    /// Records a connected address and its balance.
    pub fn set_connected(&self, address: A, token_balance: Amount) {
        self.update(|state| {
            state.address = Some(address);
            state.token_balance = token_balance;
        });
    }

    /// Updates only the balance.
    pub fn set_balance(&self, token_balance: Amount) {
        self.update(|state| state.token_balance = token_balance);
    }

    /// Clears the address and balance. Send history is kept.
    pub fn set_disconnected(&self) {
        self.update(|state| {
            state.address = None;
            state.token_balance = Amount::ZERO;
        });
    }

    /// Runs a send future with the pending flag raised.
    ///
    /// On success the returned hash becomes `last_tx_hash`. On failure the
    /// previous hash is left untouched.
    ///
    /// # Errors
    ///
    /// Returns whatever error `send` produces.
    pub async fn track_send<F, E>(&self, send: F) -> Result<String, E>
    where
        F: Future<Output = Result<String, E>>,
    {
        self.update(|state| state.is_pending = true);
        let result = send.await;
        self.update(|state| {
            state.is_pending = false;
            if let Ok(hash) = &result {
                state.last_tx_hash = Some(hash.clone());
            }
        });
        result
    }
}

/// How a connection attempt should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    /// Connect only if the wallet is already trusted; never prompt.
    OnlyIfTrusted,
    /// User-initiated connect.
    Explicit,
}

/// One side of the bridge as seen by the dispatcher.
pub trait ChainAdapter: Send + Sync {
    /// Native address type of this chain.
    type Address: UniversalAddress + Clone + Debug + Send + Sync + 'static;
    /// Error type for connect and send operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Endpoint this adapter sends from.
    fn endpoint(&self) -> &ChainEndpoint;

    /// Current wallet state.
    fn state(&self) -> WalletState<Self::Address>;

    /// Subscribes to wallet state changes.
    fn subscribe(&self) -> watch::Receiver<WalletState<Self::Address>>;

    /// Connects the wallet and loads its balance.
    fn connect(&self, mode: ConnectMode) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Disconnects the wallet.
    fn disconnect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Sends `amount` to `to` on the other chain and returns the transaction hash.
    fn send_to_other_chain(
        &self,
        to: B256,
        amount: Amount,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

impl<T: ChainAdapter> ChainAdapter for Arc<T> {
    type Address = T::Address;
    type Error = T::Error;

    fn endpoint(&self) -> &ChainEndpoint {
        (**self).endpoint()
    }

    fn state(&self) -> WalletState<Self::Address> {
        (**self).state()
    }

    fn subscribe(&self) -> watch::Receiver<WalletState<Self::Address>> {
        (**self).subscribe()
    }

    fn connect(&self, mode: ConnectMode) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).connect(mode)
    }

    fn disconnect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).disconnect()
    }

    fn send_to_other_chain(
        &self,
        to: B256,
        amount: Amount,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send {
        (**self).send_to_other_chain(to, amount)
    }
}

/// Attempts a silent connection to an already-trusted wallet.
///
/// Failures are swallowed; they are only visible at `debug` level. Returns
/// whether the wallet ended up connected.
pub async fn connect_eagerly<A: ChainAdapter>(adapter: &A) -> bool {
    match adapter.connect(ConnectMode::OnlyIfTrusted).await {
        Ok(()) => adapter.state().is_connected(),
        Err(e) => {
            tracing::debug!(chain = %adapter.endpoint().name, error = %e, "Eager connect skipped");
            false
        }
    }
}

/// User-initiated connect. Failures are reported as `warn` diagnostics only.
pub async fn connect_explicitly<A: ChainAdapter>(adapter: &A) -> bool {
    match adapter.connect(ConnectMode::Explicit).await {
        Ok(()) => {
            tracing::info!(chain = %adapter.endpoint().name, address = ?adapter.state().address, "Wallet connected");
            adapter.state().is_connected()
        }
        Err(e) => {
            tracing::warn!(chain = %adapter.endpoint().name, error = %e, "Wallet connect failed");
            false
        }
    }
}

/// User-initiated disconnect. Failures are reported as `warn` diagnostics only.
pub async fn disconnect_explicitly<A: ChainAdapter>(adapter: &A) {
    if let Err(e) = adapter.disconnect().await {
        tracing::warn!(chain = %adapter.endpoint().name, error = %e, "Wallet disconnect failed");
    }
}
