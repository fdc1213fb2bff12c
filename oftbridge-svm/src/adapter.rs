//! [`ChainAdapter`] implementation for the Solana OFT program.
//!
//! Sends are compiled into v0 messages that reference the endpoint's
//! address lookup table. A Solana endpoint without a known table cannot
//! send at all, and neither can a wallet without an associated token
//! account for the mint.

use alloy_primitives::{B256, U256};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use borsh::BorshDeserialize;
use oftbridge::amount::Amount;
use oftbridge::endpoint::{BridgePair, ChainEndpoint, EndpointId};
use oftbridge::oft::{
    self, DEFAULT_LZ_RECEIVE_GAS, ExecutorOptions, OftSendParams, SlippageGuard,
};
use oftbridge::wallet::{ChainAdapter, ConnectMode, WalletState, WalletStateCell};
use solana_client::rpc_config::RpcSimulateTransactionConfig;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_message::v0::Message as MessageV0;
use solana_message::{AddressLookupTableAccount, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use spl_token::solana_program::program_pack::Pack;
use tokio::sync::{OnceCell, watch};

use crate::error::SvmError;
use crate::lookup_table::fetch_lookup_table;
use crate::networks::lookup_table_for_eid;
use crate::program::{
    EndpointAccounts, MessagingFee, OftProgram, QuoteSendParams, SendParams,
    StaticEndpointAccounts,
};
use crate::rpc::RpcClientLike;

/// Compute unit limit requested for `send` transactions.
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 500_000;

/// Static configuration of a Solana OFT deployment.
#[derive(Debug, Clone)]
pub struct SvmOftConfig {
    /// OFT program, mint and escrow.
    pub program: OftProgram,
    /// Lookup table override. Falls back to the well-known table of the endpoint.
    pub lookup_table: Option<Pubkey>,
    /// Compute unit limit of the send transaction.
    pub compute_unit_limit: u32,
    /// Executor options attached to every send.
    pub options: ExecutorOptions,
    /// Minimum-received bound.
    pub slippage: SlippageGuard,
}

impl SvmOftConfig {
    /// Configuration with default compute budget, gas and slippage bound.
    #[must_use]
    pub fn new(program: OftProgram) -> Self {
        Self {
            program,
            lookup_table: None,
            compute_unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            options: ExecutorOptions::new().lz_receive(DEFAULT_LZ_RECEIVE_GAS, 0),
            slippage: SlippageGuard::default(),
        }
    }
}

/// Solana side of the bridge.
pub struct SvmOftAdapter<R, S, A = StaticEndpointAccounts> {
    endpoint: ChainEndpoint,
    destination: EndpointId,
    rpc: R,
    signer: S,
    accounts: A,
    config: SvmOftConfig,
    decimals: OnceCell<u8>,
    state: WalletStateCell<Pubkey>,
}

impl<R, S, A> std::fmt::Debug for SvmOftAdapter<R, S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvmOftAdapter")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R, S, A> SvmOftAdapter<R, S, A>
where
    R: RpcClientLike,
    S: Signer + Send + Sync,
    A: EndpointAccounts,
{
    /// Creates an adapter for the Solana endpoint of `pair`.
    #[must_use]
    pub fn new(pair: &BridgePair, rpc: R, signer: S, accounts: A, config: SvmOftConfig) -> Self {
        Self {
            endpoint: pair.solana().clone(),
            destination: pair.evm().eid,
            rpc,
            signer,
            accounts,
            config,
            decimals: OnceCell::new(),
            state: WalletStateCell::new(),
        }
    }

    /// Address that signs and pays for sends.
    #[must_use]
    pub fn pubkey(&self) -> Pubkey {
        self.signer.pubkey()
    }

    /// Static configuration.
    #[must_use]
    pub const fn config(&self) -> &SvmOftConfig {
        &self.config
    }

    /// Decimals of the OFT mint.
    ///
    /// # Errors
    ///
    /// Returns [`SvmError::InvalidMint`] if the mint account is missing or
    /// not owned by the configured token program.
    pub async fn mint_decimals(&self) -> Result<u8, SvmError> {
        self.decimals
            .get_or_try_init(|| async {
                let mint = self.config.program.mint;
                let account = self
                    .rpc
                    .get_account(&mint)
                    .await?
                    .ok_or(SvmError::InvalidMint(mint))?;
                if account.owner != self.config.program.token_program {
                    return Err(SvmError::InvalidMint(mint));
                }
                let state = account
                    .data
                    .get(..spl_token::state::Mint::LEN)
                    .and_then(|data| spl_token::state::Mint::unpack_from_slice(data).ok())
                    .ok_or(SvmError::InvalidMint(mint))?;
                Ok::<_, SvmError>(state.decimals)
            })
            .await
            .copied()
    }

    /// Signer's associated token account.
    #[must_use]
    pub fn token_account(&self) -> Pubkey {
        self.config.program.token_account(&self.pubkey())
    }

    /// Signer's token balance. A missing token account holds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SvmError`] if the RPC calls fail.
    pub async fn token_balance(&self) -> Result<Amount, SvmError> {
        let ata = self.token_account();
        if self.rpc.get_account(&ata).await?.is_none() {
            return Ok(Amount::ZERO);
        }
        let decimals = self.mint_decimals().await?;
        let raw = self.rpc.get_token_account_balance(&ata).await?;
        Ok(Amount::from_local_units(U256::from(raw), decimals))
    }

    /// Lookup table used by send transactions.
    ///
    /// # Errors
    ///
    /// Returns [`SvmError::MissingLookupTable`] if neither the configuration
    /// nor the well-known tables provide one.
    pub fn lookup_table_address(&self) -> Result<Pubkey, SvmError> {
        self.config
            .lookup_table
            .or_else(|| lookup_table_for_eid(self.endpoint.eid))
            .ok_or(SvmError::MissingLookupTable(self.endpoint.eid))
    }

    async fn load_lookup_table(&self) -> Result<AddressLookupTableAccount, SvmError> {
        let key = self.lookup_table_address()?;
        fetch_lookup_table(&self.rpc, key).await
    }

    /// Send parameters for `amount` to `to`, with the slippage guard applied.
    ///
    /// # Errors
    ///
    /// Returns [`SvmError`] if the mint cannot be read or the amount does not
    /// fit its precision.
    pub async fn send_params(&self, to: B256, amount: Amount) -> Result<OftSendParams, SvmError> {
        let decimals = self.mint_decimals().await?;
        Ok(OftSendParams::for_amount(
            self.destination,
            to,
            amount,
            decimals,
            &self.config.options,
            self.config.slippage,
        )?)
    }

    /// Quotes the messaging fee for sending `amount` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`SvmError`] if the lookup table is missing or simulation fails.
    pub async fn quote(&self, to: B256, amount: Amount) -> Result<oft::MessagingFee, SvmError> {
        let params = self.send_params(to, amount).await?;
        let table = self.load_lookup_table().await?;
        let fee = self.quote_raw(&params.preview(), &table).await?;
        Ok(fee.into())
    }

    async fn quote_raw(
        &self,
        params: &OftSendParams,
        table: &AddressLookupTableAccount,
    ) -> Result<MessagingFee, SvmError> {
        let program = &self.config.program;
        let payer = self.pubkey();
        let quote_params = QuoteSendParams::new(params)?;
        let remaining = self
            .accounts
            .quote_accounts(program, &payer, params.dst_eid)
            .await?;
        let ix = program.quote_send_instruction(&quote_params, remaining)?;

        let blockhash = self.rpc.get_latest_blockhash().await?;
        let message = MessageV0::try_compile(&payer, &[ix], std::slice::from_ref(table), blockhash)
            .map_err(|e| SvmError::Compile(format!("{e:?}")))?;
        let message = VersionedMessage::V0(message);
        let num_required_signatures = message.header().num_required_signatures;
        let tx = VersionedTransaction {
            signatures: vec![Signature::default(); usize::from(num_required_signatures)],
            message,
        };

        let sim = self
            .rpc
            .simulate_transaction_with_config(
                &tx,
                RpcSimulateTransactionConfig {
                    sig_verify: false,
                    replace_recent_blockhash: true,
                    ..RpcSimulateTransactionConfig::default()
                },
            )
            .await?;
        if let Some(err) = sim.value.err {
            return Err(SvmError::Simulation(format!("{err:?}")));
        }
        let return_data = sim
            .value
            .return_data
            .ok_or_else(|| SvmError::ReturnData("missing".to_owned()))?;
        if return_data.program_id != program.program_id.to_string() {
            return Err(SvmError::ReturnData(format!(
                "returned by {} instead of the OFT program",
                return_data.program_id
            )));
        }
        let bytes = BASE64
            .decode(&return_data.data.0)
            .map_err(|e| SvmError::ReturnData(e.to_string()))?;
        MessagingFee::deserialize(&mut bytes.as_slice())
            .map_err(|e| SvmError::ReturnData(e.to_string()))
    }

    async fn submit(&self, to: B256, amount: Amount) -> Result<String, SvmError> {
        let table_key = self.lookup_table_address()?;
        let payer = self.pubkey();
        let source = self.token_account();
        if self.rpc.get_account(&source).await?.is_none() {
            return Err(SvmError::MissingTokenAccount(source));
        }

        let table = fetch_lookup_table(&self.rpc, table_key).await?;
        let params = self.send_params(to, amount).await?;
        let fee = self.quote_raw(&params.preview(), &table).await?;
        tracing::debug!(
            dst_eid = %params.dst_eid,
            amount_ld = %params.amount_ld,
            min_amount_ld = %params.min_amount_ld,
            native_fee = fee.native_fee,
            "Submitting OFT send"
        );

        let program = &self.config.program;
        let send_params = SendParams::new(&params, fee)?;
        let remaining = self
            .accounts
            .send_accounts(program, &payer, params.dst_eid)
            .await?;
        let instructions = [
            ComputeBudgetInstruction::set_compute_unit_limit(self.config.compute_unit_limit),
            program.send_instruction(&payer, &send_params, remaining)?,
        ];

        let blockhash = self.rpc.get_latest_blockhash().await?;
        let message = MessageV0::try_compile(&payer, &instructions, &[table], blockhash)
            .map_err(|e| SvmError::Compile(format!("{e:?}")))?;
        let tx = VersionedTransaction::try_new(VersionedMessage::V0(message), &[&self.signer])?;

        let signature = self.rpc.send_and_confirm_transaction(&tx).await?;
        tracing::info!(tx = %signature, chain = %self.endpoint.name, "OFT send confirmed");
        Ok(signature.to_string())
    }
}

impl<R, S, A> ChainAdapter for SvmOftAdapter<R, S, A>
where
    R: RpcClientLike,
    S: Signer + Send + Sync,
    A: EndpointAccounts,
{
    type Address = Pubkey;
    type Error = SvmError;

    fn endpoint(&self) -> &ChainEndpoint {
        &self.endpoint
    }

    fn state(&self) -> WalletState<Pubkey> {
        self.state.snapshot()
    }

    fn subscribe(&self) -> watch::Receiver<WalletState<Pubkey>> {
        self.state.subscribe()
    }

    async fn connect(&self, mode: ConnectMode) -> Result<(), SvmError> {
        let balance = self.token_balance().await?;
        let pubkey = self.pubkey();
        tracing::debug!(?mode, %pubkey, %balance, "Solana wallet connected");
        self.state.set_connected(pubkey, balance);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SvmError> {
        self.state.set_disconnected();
        Ok(())
    }

    async fn send_to_other_chain(&self, to: B256, amount: Amount) -> Result<String, SvmError> {
        let signature = self.state.track_send(self.submit(to, amount)).await?;
        match self.token_balance().await {
            Ok(balance) => self.state.set_balance(balance),
            Err(e) => tracing::warn!(error = %e, "Failed to refresh Solana balance after send"),
        }
        Ok(signature)
    }
}
