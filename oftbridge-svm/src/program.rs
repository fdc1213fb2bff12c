//! LayerZero OFT program interface.
//!
//! Instructions are Anchor-encoded: an 8-byte discriminator
//! (`sha256("global:<name>")[..8]`) followed by the borsh-encoded
//! arguments. Both `send` and `quote_send` CPI into the LayerZero endpoint,
//! whose accounts are appended after the OFT's own accounts. Those are
//! supplied by an [`EndpointAccounts`] resolver.

use std::future::Future;

use alloy_primitives::U256;
use borsh::{BorshDeserialize, BorshSerialize};
use oftbridge::EndpointId;
use oftbridge::amount::AmountError;
use oftbridge::oft::{self, OftSendParams};
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::{Pubkey, pubkey};

use crate::error::SvmError;

/// Associated Token Account program.
pub const ATA_PROGRAM_PUBKEY: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Anchor discriminator of `send`.
pub const SEND_DISCRIMINATOR: [u8; 8] = [102, 251, 20, 187, 65, 75, 12, 69];

/// Anchor discriminator of `quote_send`.
pub const QUOTE_SEND_DISCRIMINATOR: [u8; 8] = [207, 0, 49, 214, 160, 211, 76, 211];

const OFT_SEED: &[u8] = b"OFT";
const PEER_SEED: &[u8] = b"Peer";
const EVENT_AUTHORITY_SEED: &[u8] = b"__event_authority";

/// Arguments of the `send` instruction.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SendParams {
    /// Destination endpoint ID.
    pub dst_eid: u32,
    /// Recipient, `bytes32`-encoded.
    pub to: [u8; 32],
    /// Amount in local decimals.
    pub amount_ld: u64,
    /// Minimum amount received, in local decimals.
    pub min_amount_ld: u64,
    /// Executor options.
    pub options: Vec<u8>,
    /// Optional compose message.
    pub compose_msg: Option<Vec<u8>>,
    /// Native fee in lamports.
    pub native_fee: u64,
    /// LZ token fee.
    pub lz_token_fee: u64,
}

impl SendParams {
    /// Builds `send` arguments paying `fee`.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if an amount does not fit in `u64`.
    pub fn new(params: &OftSendParams, fee: MessagingFee) -> Result<Self, AmountError> {
        Ok(Self {
            dst_eid: params.dst_eid.as_u32(),
            to: params.to.0,
            amount_ld: to_u64(params.amount_ld)?,
            min_amount_ld: to_u64(params.min_amount_ld)?,
            options: params.extra_options.to_vec(),
            compose_msg: params.compose_msg.as_ref().map(|msg| msg.to_vec()),
            native_fee: fee.native_fee,
            lz_token_fee: fee.lz_token_fee,
        })
    }
}

/// Arguments of the `quote_send` instruction.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct QuoteSendParams {
    /// Destination endpoint ID.
    pub dst_eid: u32,
    /// Recipient, `bytes32`-encoded.
    pub to: [u8; 32],
    /// Amount in local decimals.
    pub amount_ld: u64,
    /// Minimum amount received, in local decimals.
    pub min_amount_ld: u64,
    /// Executor options.
    pub options: Vec<u8>,
    /// Optional compose message.
    pub compose_msg: Option<Vec<u8>>,
    /// Whether the fee is paid in LZ token.
    pub pay_in_lz_token: bool,
}

impl QuoteSendParams {
    /// Builds `quote_send` arguments, paying in native SOL.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if an amount does not fit in `u64`.
    pub fn new(params: &OftSendParams) -> Result<Self, AmountError> {
        Ok(Self {
            dst_eid: params.dst_eid.as_u32(),
            to: params.to.0,
            amount_ld: to_u64(params.amount_ld)?,
            min_amount_ld: to_u64(params.min_amount_ld)?,
            options: params.extra_options.to_vec(),
            compose_msg: params.compose_msg.as_ref().map(|msg| msg.to_vec()),
            pay_in_lz_token: false,
        })
    }
}

/// Fee returned by `quote_send`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MessagingFee {
    /// Native fee in lamports.
    pub native_fee: u64,
    /// LZ token fee.
    pub lz_token_fee: u64,
}

impl From<MessagingFee> for oft::MessagingFee {
    fn from(fee: MessagingFee) -> Self {
        Self {
            native_fee: u128::from(fee.native_fee),
            lz_token_fee: u128::from(fee.lz_token_fee),
        }
    }
}

fn to_u64(value: U256) -> Result<u64, AmountError> {
    u64::try_from(value).map_err(|_| AmountError::Overflow)
}

/// One OFT deployment: program, mint and escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OftProgram {
    /// OFT program ID.
    pub program_id: Pubkey,
    /// Token mint.
    pub mint: Pubkey,
    /// Token escrow.
    pub escrow: Pubkey,
    /// Token program owning the mint.
    pub token_program: Pubkey,
}

impl OftProgram {
    /// Creates a deployment description for an SPL Token mint.
    #[must_use]
    pub fn new(program_id: Pubkey, mint: Pubkey, escrow: Pubkey) -> Self {
        Self {
            program_id,
            mint,
            escrow,
            token_program: spl_token::id(),
        }
    }

    /// Overrides the token program (e.g. for Token-2022 mints).
    #[must_use]
    pub const fn with_token_program(mut self, token_program: Pubkey) -> Self {
        self.token_program = token_program;
        self
    }

    /// OFT store PDA.
    #[must_use]
    pub fn oft_store(&self) -> Pubkey {
        Pubkey::find_program_address(&[OFT_SEED, self.escrow.as_ref()], &self.program_id).0
    }

    /// Peer configuration PDA for `dst_eid`.
    #[must_use]
    pub fn peer(&self, dst_eid: EndpointId) -> Pubkey {
        let oft_store = self.oft_store();
        Pubkey::find_program_address(
            &[
                PEER_SEED,
                oft_store.as_ref(),
                &dst_eid.as_u32().to_be_bytes(),
            ],
            &self.program_id,
        )
        .0
    }

    /// Anchor event authority PDA.
    #[must_use]
    pub fn event_authority(&self) -> Pubkey {
        Pubkey::find_program_address(&[EVENT_AUTHORITY_SEED], &self.program_id).0
    }

    /// Associated token account of `owner` for this mint.
    #[must_use]
    pub fn token_account(&self, owner: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(
            &[
                owner.as_ref(),
                self.token_program.as_ref(),
                self.mint.as_ref(),
            ],
            &ATA_PROGRAM_PUBKEY,
        )
        .0
    }

    /// Builds the `send` instruction.
    ///
    /// # Errors
    ///
    /// Returns [`SvmError::Encode`] if the arguments cannot be serialized.
    pub fn send_instruction(
        &self,
        signer: &Pubkey,
        params: &SendParams,
        endpoint_accounts: Vec<AccountMeta>,
    ) -> Result<Instruction, SvmError> {
        let dst_eid = EndpointId::new(params.dst_eid);
        let mut accounts = vec![
            AccountMeta::new(*signer, true),
            AccountMeta::new(self.peer(dst_eid), false),
            AccountMeta::new(self.oft_store(), false),
            AccountMeta::new(self.token_account(signer), false),
            AccountMeta::new(self.escrow, false),
            AccountMeta::new(self.mint, false),
            AccountMeta::new_readonly(self.token_program, false),
            AccountMeta::new_readonly(self.event_authority(), false),
            AccountMeta::new_readonly(self.program_id, false),
        ];
        accounts.extend(endpoint_accounts);
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data(SEND_DISCRIMINATOR, params)?,
            accounts,
        ))
    }

    /// Builds the `quote_send` instruction.
    ///
    /// # Errors
    ///
    /// Returns [`SvmError::Encode`] if the arguments cannot be serialized.
    pub fn quote_send_instruction(
        &self,
        params: &QuoteSendParams,
        endpoint_accounts: Vec<AccountMeta>,
    ) -> Result<Instruction, SvmError> {
        let dst_eid = EndpointId::new(params.dst_eid);
        let mut accounts = vec![
            AccountMeta::new_readonly(self.oft_store(), false),
            AccountMeta::new_readonly(self.peer(dst_eid), false),
            AccountMeta::new_readonly(self.mint, false),
        ];
        accounts.extend(endpoint_accounts);
        Ok(Instruction::new_with_bytes(
            self.program_id,
            &instruction_data(QUOTE_SEND_DISCRIMINATOR, params)?,
            accounts,
        ))
    }
}

fn instruction_data<T: BorshSerialize>(
    discriminator: [u8; 8],
    args: &T,
) -> Result<Vec<u8>, SvmError> {
    let mut data = discriminator.to_vec();
    args.serialize(&mut data)?;
    Ok(data)
}

/// Resolves the LayerZero endpoint accounts appended to OFT instructions.
pub trait EndpointAccounts: Send + Sync {
    /// Remaining accounts of `send`.
    fn send_accounts(
        &self,
        program: &OftProgram,
        payer: &Pubkey,
        dst_eid: EndpointId,
    ) -> impl Future<Output = Result<Vec<AccountMeta>, SvmError>> + Send;

    /// Remaining accounts of `quote_send`.
    fn quote_accounts(
        &self,
        program: &OftProgram,
        payer: &Pubkey,
        dst_eid: EndpointId,
    ) -> impl Future<Output = Result<Vec<AccountMeta>, SvmError>> + Send;
}

/// Endpoint accounts taken verbatim from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticEndpointAccounts {
    send: Vec<AccountMeta>,
    quote: Vec<AccountMeta>,
}

impl StaticEndpointAccounts {
    /// Creates a resolver returning fixed account lists.
    #[must_use]
    pub const fn new(send: Vec<AccountMeta>, quote: Vec<AccountMeta>) -> Self {
        Self { send, quote }
    }
}

impl EndpointAccounts for StaticEndpointAccounts {
    async fn send_accounts(
        &self,
        _program: &OftProgram,
        _payer: &Pubkey,
        _dst_eid: EndpointId,
    ) -> Result<Vec<AccountMeta>, SvmError> {
        Ok(self.send.clone())
    }

    async fn quote_accounts(
        &self,
        _program: &OftProgram,
        _payer: &Pubkey,
        _dst_eid: EndpointId,
    ) -> Result<Vec<AccountMeta>, SvmError> {
        Ok(self.quote.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::DEVNET_OFT;
    use alloy_primitives::B256;
    use oftbridge::Amount;
    use oftbridge::endpoint::SEPOLIA_V2_TESTNET;
    use oftbridge::oft::{DEFAULT_LZ_RECEIVE_GAS, ExecutorOptions, SlippageGuard};
    use sha2::{Digest, Sha256};

    fn program() -> OftProgram {
        OftProgram::new(DEVNET_OFT.program_id, DEVNET_OFT.mint, DEVNET_OFT.escrow)
    }

    fn oft_params() -> OftSendParams {
        OftSendParams::for_amount(
            SEPOLIA_V2_TESTNET,
            B256::repeat_byte(0xab),
            Amount::from_micro(5_000_000),
            6,
            &ExecutorOptions::new().lz_receive(DEFAULT_LZ_RECEIVE_GAS, 0),
            SlippageGuard::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_discriminators() {
        let send = Sha256::digest(b"global:send");
        assert_eq!(&send[..8], &SEND_DISCRIMINATOR);
        let quote = Sha256::digest(b"global:quote_send");
        assert_eq!(&quote[..8], &QUOTE_SEND_DISCRIMINATOR);
    }

    #[test]
    fn test_pdas() {
        let program = program();
        let (store, _) = Pubkey::find_program_address(
            &[b"OFT", DEVNET_OFT.escrow.as_ref()],
            &DEVNET_OFT.program_id,
        );
        assert_eq!(program.oft_store(), store);

        let (peer, _) = Pubkey::find_program_address(
            &[b"Peer", store.as_ref(), &40161u32.to_be_bytes()],
            &DEVNET_OFT.program_id,
        );
        assert_eq!(program.peer(SEPOLIA_V2_TESTNET), peer);
        assert_ne!(program.peer(EndpointId::new(30101)), peer);
    }

    #[test]
    fn test_send_instruction_layout() {
        let program = program();
        let signer = Pubkey::new_from_array([3; 32]);
        let fee = MessagingFee {
            native_fee: 1_000,
            lz_token_fee: 0,
        };
        let params = SendParams::new(&oft_params(), fee).unwrap();
        assert_eq!(params.amount_ld, 5_000_000);
        assert_eq!(params.min_amount_ld, 4_500_000);

        let extra = vec![AccountMeta::new_readonly(Pubkey::new_from_array([4; 32]), false)];
        let ix = program.send_instruction(&signer, &params, extra).unwrap();
        assert_eq!(ix.program_id, DEVNET_OFT.program_id);
        assert_eq!(ix.accounts.len(), 10);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[3].pubkey, program.token_account(&signer));
        assert_eq!(ix.accounts[9].pubkey, Pubkey::new_from_array([4; 32]));
        assert_eq!(&ix.data[..8], &SEND_DISCRIMINATOR);
        assert_eq!(&ix.data[8..12], &40161u32.to_le_bytes());

        let decoded = SendParams::try_from_slice(&ix.data[8..]).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn test_quote_params_use_preview_minimum() {
        let params = QuoteSendParams::new(&oft_params().preview()).unwrap();
        assert_eq!(params.min_amount_ld, 1);
        assert!(!params.pay_in_lz_token);

        let ix = program()
            .quote_send_instruction(&params, Vec::new())
            .unwrap();
        assert_eq!(ix.accounts.len(), 3);
        assert!(ix.accounts.iter().all(|meta| !meta.is_signer));
        assert_eq!(&ix.data[..8], &QUOTE_SEND_DISCRIMINATOR);
    }

    #[test]
    fn test_amount_overflow() {
        let mut params = oft_params();
        params.amount_ld = U256::from(u64::MAX) + U256::from(1u64);
        assert_eq!(QuoteSendParams::new(&params), Err(AmountError::Overflow));
    }

    #[test]
    fn test_messaging_fee_decode() {
        let mut data = 5_000u64.to_le_bytes().to_vec();
        data.extend_from_slice(&0u64.to_le_bytes());
        let fee = MessagingFee::try_from_slice(&data).unwrap();
        let fee: oft::MessagingFee = fee.into();
        assert_eq!(fee.native_fee, 5_000);
        assert_eq!(fee.lz_token_fee, 0);
    }
}
