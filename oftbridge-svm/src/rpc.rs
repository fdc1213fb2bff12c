//! RPC client abstraction.
//!
//! [`RpcClientLike`] narrows the nonblocking [`RpcClient`] to the calls the
//! adapter makes, so tests can substitute an in-memory chain.

use std::future::Future;
use std::sync::Arc;

use solana_account::Account;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSimulateTransactionConfig;
use solana_client::rpc_response::{Response, RpcSimulateTransactionResult};
use solana_message::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

/// The subset of Solana JSON-RPC used by the bridge.
pub trait RpcClientLike: Send + Sync {
    /// Latest blockhash at the client's commitment.
    fn get_latest_blockhash(&self) -> impl Future<Output = Result<Hash, ClientError>> + Send;

    /// Fetches an account, or `None` if it does not exist.
    fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> impl Future<Output = Result<Option<Account>, ClientError>> + Send;

    /// Raw token amount held by an SPL token account.
    fn get_token_account_balance(
        &self,
        pubkey: &Pubkey,
    ) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Simulates a transaction.
    fn simulate_transaction_with_config(
        &self,
        tx: &VersionedTransaction,
        config: RpcSimulateTransactionConfig,
    ) -> impl Future<Output = Result<Response<RpcSimulateTransactionResult>, ClientError>> + Send;

    /// Sends a signed transaction and waits for confirmation.
    fn send_and_confirm_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> impl Future<Output = Result<Signature, ClientError>> + Send;
}

impl RpcClientLike for RpcClient {
    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        Self::get_latest_blockhash(self).await
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, ClientError> {
        let response = self.get_account_with_commitment(pubkey, self.commitment()).await?;
        Ok(response.value)
    }

    async fn get_token_account_balance(&self, pubkey: &Pubkey) -> Result<u64, ClientError> {
        let balance = Self::get_token_account_balance(self, pubkey).await?;
        balance.amount.parse().map_err(|e| {
            ClientError::from(ClientErrorKind::Custom(format!(
                "invalid token amount {:?}: {e}",
                balance.amount
            )))
        })
    }

    async fn simulate_transaction_with_config(
        &self,
        tx: &VersionedTransaction,
        config: RpcSimulateTransactionConfig,
    ) -> Result<Response<RpcSimulateTransactionResult>, ClientError> {
        Self::simulate_transaction_with_config(self, tx, config).await
    }

    async fn send_and_confirm_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, ClientError> {
        Self::send_and_confirm_transaction(self, tx).await
    }
}

impl<T: RpcClientLike> RpcClientLike for Arc<T> {
    fn get_latest_blockhash(&self) -> impl Future<Output = Result<Hash, ClientError>> + Send {
        (**self).get_latest_blockhash()
    }

    fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> impl Future<Output = Result<Option<Account>, ClientError>> + Send {
        (**self).get_account(pubkey)
    }

    fn get_token_account_balance(
        &self,
        pubkey: &Pubkey,
    ) -> impl Future<Output = Result<u64, ClientError>> + Send {
        (**self).get_token_account_balance(pubkey)
    }

    fn simulate_transaction_with_config(
        &self,
        tx: &VersionedTransaction,
        config: RpcSimulateTransactionConfig,
    ) -> impl Future<Output = Result<Response<RpcSimulateTransactionResult>, ClientError>> + Send {
        (**self).simulate_transaction_with_config(tx, config)
    }

    fn send_and_confirm_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> impl Future<Output = Result<Signature, ClientError>> + Send {
        (**self).send_and_confirm_transaction(tx)
    }
}
