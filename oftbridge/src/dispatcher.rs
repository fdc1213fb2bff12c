//! Send validation and dispatch.
//!
//! The dispatcher answers two questions for the current selection and amount:
//! may the user send right now, and what should the send control say. When a
//! send is permitted it hands the transfer to exactly one chain adapter.
//!
//! # Validation order
//!
//! Rules are checked in this order and the first match wins:
//!
//! 1. nothing selected: "select chains"
//! 2. neither wallet connected: "connect wallets"
//! 3. EVM wallet missing: "connect EVM wallet"
//! 4. Solana wallet missing: "connect Solana wallet"
//! 5. amount is zero (or unparseable): "enter an amount"
//! 6. EVM source and amount above the EVM balance: "insufficient funds"
//! 7. Solana source and amount above the Solana balance: "insufficient funds"
//! 8. otherwise: "send"
//!
//! Validation failures are never errors. They only disable the control.

use alloy_primitives::B256;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::address::{UniversalAddress, bytes32_hex};
use crate::amount::{Amount, parse_amount};
use crate::endpoint::{BridgePair, ChainEndpoint, EndpointId};
use crate::route::Direction;
use crate::wallet::{ChainAdapter, WalletState};

/// User-facing label of the send control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendLabel {
    /// No direction selected.
    SelectChains,
    /// Neither wallet connected.
    ConnectWallets,
    /// Only the EVM wallet is missing.
    ConnectEvmWallet,
    /// Only the Solana wallet is missing.
    ConnectSolanaWallet,
    /// Amount is zero.
    EnterAmount,
    /// Amount exceeds the source wallet's balance.
    InsufficientFunds,
    /// Ready to send.
    Send,
}

impl SendLabel {
    /// Label text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SelectChains => "select chains",
            Self::ConnectWallets => "connect wallets",
            Self::ConnectEvmWallet => "connect EVM wallet",
            Self::ConnectSolanaWallet => "connect Solana wallet",
            Self::EnterAmount => "enter an amount",
            Self::InsufficientFunds => "insufficient funds",
            Self::Send => "send",
        }
    }
}

impl fmt::Display for SendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether sending is permitted and what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendStatus {
    /// Whether the send control is enabled.
    pub enabled: bool,
    /// Label for the send control.
    pub label: SendLabel,
    /// Whether either wallet has a send in flight. Advisory only.
    pub in_flight: bool,
}

impl SendStatus {
    const fn blocked(label: SendLabel) -> Self {
        Self {
            enabled: false,
            label,
            in_flight: false,
        }
    }
}

/// Applies the validation rules to a set of inputs.
#[must_use]
pub fn evaluate_send<E, S>(
    direction: Option<Direction>,
    amount: Amount,
    evm: &WalletState<E>,
    solana: &WalletState<S>,
) -> SendStatus {
    let in_flight = evm.is_pending || solana.is_pending;
    let label = match direction {
        None => SendLabel::SelectChains,
        Some(_) if !evm.is_connected() && !solana.is_connected() => SendLabel::ConnectWallets,
        Some(_) if !evm.is_connected() => SendLabel::ConnectEvmWallet,
        Some(_) if !solana.is_connected() => SendLabel::ConnectSolanaWallet,
        Some(_) if amount.is_zero() => SendLabel::EnterAmount,
        Some(Direction::EvmToSolana) if amount > evm.token_balance => SendLabel::InsufficientFunds,
        Some(Direction::SolanaToEvm) if amount > solana.token_balance => {
            SendLabel::InsufficientFunds
        }
        Some(_) => {
            return SendStatus {
                enabled: true,
                label: SendLabel::Send,
                in_flight,
            };
        }
    };
    SendStatus {
        in_flight,
        ..SendStatus::blocked(label)
    }
}

/// A concrete outbound transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Chain the tokens leave from.
    pub source: ChainEndpoint,
    /// Chain the tokens arrive on.
    pub destination: ChainEndpoint,
    /// Amount in micro-units.
    pub amount: Amount,
    /// Recipient on the destination chain, `bytes32`-encoded.
    pub recipient: B256,
}

/// Result of a dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The adapter accepted and submitted the transfer.
    Submitted {
        /// What was sent.
        request: TransferRequest,
        /// Source chain transaction hash.
        tx_hash: String,
    },
    /// Validation did not permit a send; nothing happened.
    Blocked(SendStatus),
    /// The endpoint pair was internally inconsistent; nothing happened.
    Skipped,
}

/// Errors surfaced by a permitted dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The chain adapter failed to send.
    #[error("{chain} send failed: {source}")]
    Adapter {
        /// Name of the source chain.
        chain: String,
        /// Underlying adapter error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Chooses and invokes the send path for the bridge pair.
///
/// Adapters are injected at construction.
#[derive(Debug)]
pub struct Dispatcher<E, S> {
    pair: BridgePair,
    evm: Arc<E>,
    solana: Arc<S>,
}

impl<E, S> Clone for Dispatcher<E, S> {
    fn clone(&self) -> Self {
        Self {
            pair: self.pair.clone(),
            evm: Arc::clone(&self.evm),
            solana: Arc::clone(&self.solana),
        }
    }
}

impl<E: ChainAdapter, S: ChainAdapter> Dispatcher<E, S> {
    /// Creates a dispatcher over the two adapters.
    pub const fn new(pair: BridgePair, evm: Arc<E>, solana: Arc<S>) -> Self {
        Self { pair, evm, solana }
    }

    /// The endpoint pair.
    pub const fn pair(&self) -> &BridgePair {
        &self.pair
    }

    /// The EVM adapter.
    pub const fn evm(&self) -> &Arc<E> {
        &self.evm
    }

    /// The Solana adapter.
    pub const fn solana(&self) -> &Arc<S> {
        &self.solana
    }

    /// Evaluates the current status from live wallet snapshots.
    pub fn status(&self, direction: Option<Direction>, amount: &str) -> SendStatus {
        evaluate_send(
            direction,
            parse_amount(amount).unwrap_or(Amount::ZERO),
            &self.evm.state(),
            &self.solana.state(),
        )
    }

    /// Re-validates and, if permitted, sends through the source chain adapter.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Adapter`] if the adapter's send fails.
    pub async fn dispatch(
        &self,
        direction: Option<Direction>,
        amount: &str,
    ) -> Result<DispatchOutcome, DispatchError> {
        let amount = parse_amount(amount).unwrap_or(Amount::ZERO);
        let evm_state = self.evm.state();
        let solana_state = self.solana.state();
        let status = evaluate_send(direction, amount, &evm_state, &solana_state);
        let (Some(direction), true) = (direction, status.enabled) else {
            return Ok(DispatchOutcome::Blocked(status));
        };
        let (Some(evm_address), Some(solana_address)) = (evm_state.address, solana_state.address)
        else {
            return Ok(DispatchOutcome::Blocked(status));
        };

        match direction {
            Direction::SolanaToEvm => {
                let recipient = evm_address.to_bytes32();
                let request = self.request(direction, amount, recipient);
                tracing::info!(
                    from = %request.source.eid,
                    to = %request.destination.eid,
                    amount = %amount,
                    recipient = ?evm_address,
                    "Dispatching Solana -> EVM transfer"
                );
                let tx_hash = self
                    .solana
                    .send_to_other_chain(recipient, amount)
                    .await
                    .map_err(|e| adapter_error(&request.source, e))?;
                Ok(DispatchOutcome::Submitted { request, tx_hash })
            }
            Direction::EvmToSolana => {
                let recipient = solana_address.to_bytes32();
                let request = self.request(direction, amount, recipient);
                tracing::info!(
                    from = %request.source.eid,
                    to = %request.destination.eid,
                    amount = %amount,
                    recipient = %bytes32_hex(recipient),
                    "Dispatching EVM -> Solana transfer"
                );
                let tx_hash = self
                    .evm
                    .send_to_other_chain(recipient, amount)
                    .await
                    .map_err(|e| adapter_error(&request.source, e))?;
                Ok(DispatchOutcome::Submitted { request, tx_hash })
            }
        }
    }

    /// Dispatch by raw endpoint IDs.
    ///
    /// A pair that is not one of the two bridge directions is logged and
    /// yields [`DispatchOutcome::Skipped`].
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Adapter`] if the adapter's send fails.
    pub async fn dispatch_eids(
        &self,
        from: EndpointId,
        to: EndpointId,
        amount: &str,
    ) -> Result<DispatchOutcome, DispatchError> {
        match Direction::from_eids(&self.pair, from, to) {
            Ok(direction) => self.dispatch(Some(direction), amount).await,
            Err(e) => {
                tracing::error!(%from, %to, error = %e, "Refusing to dispatch inconsistent endpoint pair");
                Ok(DispatchOutcome::Skipped)
            }
        }
    }

    /// Subscribes to both wallets and recomputes the status on every change.
    pub fn watch(&self, direction: Option<Direction>, amount: &str) -> StatusWatch<E, S> {
        StatusWatch {
            direction,
            amount: parse_amount(amount).unwrap_or(Amount::ZERO),
            evm: Some(self.evm.subscribe()),
            solana: Some(self.solana.subscribe()),
        }
    }

    fn request(&self, direction: Direction, amount: Amount, recipient: B256) -> TransferRequest {
        TransferRequest {
            source: self.pair.by_kind(direction.source()).clone(),
            destination: self.pair.by_kind(direction.destination()).clone(),
            amount,
            recipient,
        }
    }
}

fn adapter_error<X: std::error::Error + Send + Sync + 'static>(
    source: &ChainEndpoint,
    e: X,
) -> DispatchError {
    tracing::warn!(chain = %source.name, error = %e, "Send failed");
    DispatchError::Adapter {
        chain: source.name.clone(),
        source: Box::new(e),
    }
}

/// Live status feed over both wallets' state channels.
///
/// Holds one receiver per adapter. [`StatusWatch::unsubscribe`] or dropping
/// the watch releases them.
pub struct StatusWatch<E: ChainAdapter, S: ChainAdapter> {
    direction: Option<Direction>,
    amount: Amount,
    evm: Option<watch::Receiver<WalletState<E::Address>>>,
    solana: Option<watch::Receiver<WalletState<S::Address>>>,
}

impl<E: ChainAdapter, S: ChainAdapter> fmt::Debug for StatusWatch<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusWatch")
            .field("direction", &self.direction)
            .field("amount", &self.amount)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

impl<E: ChainAdapter, S: ChainAdapter> StatusWatch<E, S> {
    /// Status computed from the latest states seen.
    #[must_use]
    pub fn current(&self) -> Option<SendStatus> {
        let evm = self.evm.as_ref()?;
        let solana = self.solana.as_ref()?;
        Some(evaluate_send(
            self.direction,
            self.amount,
            &evm.borrow(),
            &solana.borrow(),
        ))
    }

    /// Changes the inputs without resubscribing.
    pub fn set_inputs(&mut self, direction: Option<Direction>, amount: Amount) {
        self.direction = direction;
        self.amount = amount;
    }

    /// Waits for either wallet to change and returns the new status.
    ///
    /// Returns `None` once unsubscribed or when an adapter has been dropped.
    pub async fn changed(&mut self) -> Option<SendStatus> {
        let evm = self.evm.as_mut()?;
        let solana = self.solana.as_mut()?;
        let result = tokio::select! {
            r = evm.changed() => r,
            r = solana.changed() => r,
        };
        if result.is_err() {
            self.unsubscribe();
            return None;
        }
        let status = evaluate_send(
            self.direction,
            self.amount,
            &evm.borrow_and_update(),
            &solana.borrow_and_update(),
        );
        Some(status)
    }

    /// Releases both subscriptions.
    pub fn unsubscribe(&mut self) {
        self.evm = None;
        self.solana = None;
    }

    /// Whether the watch still holds its subscriptions.
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.evm.is_some() && self.solana.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{SEPOLIA_V2_TESTNET, SOLANA_V2_MAINNET, SOLANA_V2_TESTNET};
    use crate::wallet::{ConnectMode, WalletStateCell};
    use alloy_primitives::{Address, address};
    use solana_pubkey::Pubkey;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("fake adapter failure")]
    struct FakeError;

    #[derive(Debug)]
    struct FakeAdapter<A> {
        endpoint: ChainEndpoint,
        cell: WalletStateCell<A>,
        sent: Mutex<Vec<(B256, Amount)>>,
        fail: bool,
    }

    impl<A: Clone> FakeAdapter<A> {
        fn new(endpoint: ChainEndpoint) -> Self {
            Self {
                endpoint,
                cell: WalletStateCell::new(),
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn sent(&self) -> Vec<(B256, Amount)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl<A> ChainAdapter for FakeAdapter<A>
    where
        A: UniversalAddress + Clone + fmt::Debug + Send + Sync + 'static,
    {
        type Address = A;
        type Error = FakeError;

        fn endpoint(&self) -> &ChainEndpoint {
            &self.endpoint
        }

        fn state(&self) -> WalletState<A> {
            self.cell.snapshot()
        }

        fn subscribe(&self) -> watch::Receiver<WalletState<A>> {
            self.cell.subscribe()
        }

        async fn connect(&self, _mode: ConnectMode) -> Result<(), FakeError> {
            Err(FakeError)
        }

        async fn disconnect(&self) -> Result<(), FakeError> {
            self.cell.set_disconnected();
            Ok(())
        }

        async fn send_to_other_chain(&self, to: B256, amount: Amount) -> Result<String, FakeError> {
            let fail = self.fail;
            self.cell
                .track_send(async {
                    if fail {
                        return Err(FakeError);
                    }
                    self.sent.lock().unwrap().push((to, amount));
                    Ok(format!("tx-{}", amount.micro()))
                })
                .await
        }
    }

    type Evm = FakeAdapter<Address>;
    type Sol = FakeAdapter<Pubkey>;

    const EVM_ADDRESS: Address = address!("AeA544425b62bC0AE3aaDD85500ECFffB35c4400");

    fn sol_address() -> Pubkey {
        Pubkey::new_from_array([7; 32])
    }

    fn dispatcher() -> Dispatcher<Evm, Sol> {
        let pair = BridgePair::testnet();
        Dispatcher::new(
            pair.clone(),
            Arc::new(FakeAdapter::new(pair.evm().clone())),
            Arc::new(FakeAdapter::new(pair.solana().clone())),
        )
    }

    fn connect_both(d: &Dispatcher<Evm, Sol>, evm_balance: u64, sol_balance: u64) {
        d.evm()
            .cell
            .set_connected(EVM_ADDRESS, Amount::from_micro(evm_balance));
        d.solana()
            .cell
            .set_connected(sol_address(), Amount::from_micro(sol_balance));
    }

    fn state<A>(address: Option<A>, balance: u64) -> WalletState<A> {
        WalletState {
            address,
            token_balance: Amount::from_micro(balance),
            ..WalletState::default()
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(SendLabel::ConnectEvmWallet.to_string(), "connect EVM wallet");
        assert_eq!(SendLabel::EnterAmount.to_string(), "enter an amount");
    }

    #[test]
    fn test_rule_priority_is_total() {
        let directions = [
            None,
            Some(Direction::EvmToSolana),
            Some(Direction::SolanaToEvm),
        ];
        let amounts = [0u64, 5, 50];
        let connections = [(false, false), (true, false), (false, true), (true, true)];
        let balances = [0u64, 10, 100];

        for direction in directions {
            for &amount in &amounts {
                for &(evm_on, sol_on) in &connections {
                    for &evm_balance in &balances {
                        for &sol_balance in &balances {
                            let evm = state(evm_on.then_some(1u8), evm_balance);
                            let sol = state(sol_on.then_some(2u8), sol_balance);
                            let amount = Amount::from_micro(amount);
                            let status = evaluate_send(direction, amount, &evm, &sol);

                            let expected = if direction.is_none() {
                                SendLabel::SelectChains
                            } else if !evm_on && !sol_on {
                                SendLabel::ConnectWallets
                            } else if !evm_on {
                                SendLabel::ConnectEvmWallet
                            } else if !sol_on {
                                SendLabel::ConnectSolanaWallet
                            } else if amount.is_zero() {
                                SendLabel::EnterAmount
                            } else if direction == Some(Direction::EvmToSolana)
                                && amount > evm.token_balance
                            {
                                SendLabel::InsufficientFunds
                            } else if direction == Some(Direction::SolanaToEvm)
                                && amount > sol.token_balance
                            {
                                SendLabel::InsufficientFunds
                            } else {
                                SendLabel::Send
                            };
                            assert_eq!(status.label, expected);
                            assert_eq!(status.enabled, expected == SendLabel::Send);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_amount_once_connected() {
        let d = dispatcher();
        connect_both(&d, 1_000, 1_000);
        for direction in [Direction::EvmToSolana, Direction::SolanaToEvm] {
            let status = d.status(Some(direction), "0");
            assert!(!status.enabled);
            assert_eq!(status.label, SendLabel::EnterAmount);
        }
    }

    #[test]
    fn test_balance_checked_on_source_only() {
        let d = dispatcher();
        connect_both(&d, 10_000_000, 1_000_000);
        let status = d.status(Some(Direction::SolanaToEvm), "2");
        assert_eq!(status.label, SendLabel::InsufficientFunds);
        let status = d.status(Some(Direction::EvmToSolana), "2");
        assert_eq!(status.label, SendLabel::Send);
        assert!(status.enabled);
    }

    #[test]
    fn test_unparseable_amount_counts_as_zero() {
        let d = dispatcher();
        connect_both(&d, 1, 1);
        assert_eq!(
            d.status(Some(Direction::EvmToSolana), "1.2.3").label,
            SendLabel::EnterAmount
        );
    }

    #[test]
    fn test_in_flight_is_advisory() {
        let evm = WalletState {
            is_pending: true,
            ..state(Some(1u8), 100)
        };
        let sol = state(Some(2u8), 100);
        let status = evaluate_send(
            Some(Direction::EvmToSolana),
            Amount::from_micro(1),
            &evm,
            &sol,
        );
        assert!(status.enabled);
        assert!(status.in_flight);
    }

    #[tokio::test]
    async fn test_dispatch_solana_to_evm_encodes_evm_recipient() {
        let d = dispatcher();
        connect_both(&d, 0, 5_000_000);
        let outcome = d
            .dispatch(Some(Direction::SolanaToEvm), "1,234.56")
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Blocked(_)));

        let outcome = d
            .dispatch(Some(Direction::SolanaToEvm), "1.5")
            .await
            .unwrap();
        let DispatchOutcome::Submitted { request, tx_hash } = outcome else {
            panic!("expected submission");
        };
        assert_eq!(tx_hash, "tx-1500000");
        assert_eq!(request.source.eid, SOLANA_V2_TESTNET);
        assert_eq!(request.destination.eid, SEPOLIA_V2_TESTNET);

        let sent = d.solana().sent();
        assert_eq!(sent.len(), 1);
        assert!(d.evm().sent().is_empty());
        let (to, amount) = sent[0];
        assert_eq!(amount, Amount::from_micro(1_500_000));
        assert_eq!(
            crate::address::evm_address_from_bytes32(to).unwrap(),
            EVM_ADDRESS
        );
        assert_eq!(
            d.solana().state().last_tx_hash.as_deref(),
            Some("tx-1500000")
        );
    }

    #[tokio::test]
    async fn test_dispatch_evm_to_solana_encodes_pubkey() {
        let d = dispatcher();
        connect_both(&d, 5_000_000, 0);
        let outcome = d
            .dispatch(Some(Direction::EvmToSolana), "5")
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Submitted { .. }));
        let sent = d.evm().sent();
        assert_eq!(sent, vec![(B256::from([7; 32]), Amount::from_micro(5_000_000))]);
        assert!(d.solana().sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_blocked_has_no_side_effects() {
        let d = dispatcher();
        let outcome = d
            .dispatch(Some(Direction::EvmToSolana), "1")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Blocked(SendStatus::blocked(SendLabel::ConnectWallets))
        );
        assert!(d.evm().sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_inconsistent_eids_is_skipped() {
        let d = dispatcher();
        connect_both(&d, 5_000_000, 5_000_000);
        let outcome = d
            .dispatch_eids(SOLANA_V2_TESTNET, SOLANA_V2_TESTNET, "1")
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Skipped);
        let outcome = d
            .dispatch_eids(SOLANA_V2_MAINNET, SEPOLIA_V2_TESTNET, "1")
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert!(d.evm().sent().is_empty());
        assert!(d.solana().sent().is_empty());
    }

    #[tokio::test]
    async fn test_adapter_failure_propagates_without_hash() {
        let pair = BridgePair::testnet();
        let mut solana = FakeAdapter::new(pair.solana().clone());
        solana.fail = true;
        let d: Dispatcher<Evm, Sol> = Dispatcher::new(
            pair.clone(),
            Arc::new(FakeAdapter::new(pair.evm().clone())),
            Arc::new(solana),
        );
        connect_both(&d, 0, 5_000_000);
        let err = d
            .dispatch(Some(Direction::SolanaToEvm), "1")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Adapter { .. }));
        let state = d.solana().state();
        assert!(state.last_tx_hash.is_none());
        assert!(!state.is_pending);
    }

    #[tokio::test]
    async fn test_eager_connect_failure_is_silent() {
        let d = dispatcher();
        assert!(!crate::wallet::connect_eagerly(d.evm().as_ref()).await);
        assert!(!crate::wallet::connect_explicitly(d.solana().as_ref()).await);
    }

    #[tokio::test]
    async fn test_watch_tracks_changes_and_unsubscribes() {
        let d = dispatcher();
        let mut watch = d.watch(Some(Direction::EvmToSolana), "1");
        assert_eq!(d.evm().cell.subscriber_count(), 1);
        assert_eq!(watch.current().unwrap().label, SendLabel::ConnectWallets);

        d.evm().cell.set_connected(EVM_ADDRESS, Amount::from_micro(0));
        assert_eq!(
            watch.changed().await.unwrap().label,
            SendLabel::ConnectSolanaWallet
        );

        d.solana().cell.set_connected(sol_address(), Amount::ZERO);
        assert_eq!(
            watch.changed().await.unwrap().label,
            SendLabel::InsufficientFunds
        );

        watch.unsubscribe();
        assert!(watch.changed().await.is_none());
        assert_eq!(d.evm().cell.subscriber_count(), 0);
        assert_eq!(d.solana().cell.subscriber_count(), 0);
    }
}
