//! [`ChainAdapter`] implementation for an EVM OFT deployment.
//!
//! The adapter holds a provider whose wallet signs for `signer`. Connecting
//! checks that the provider is on the configured chain and loads the
//! signer's balance of the OFT's underlying token. Sending first approves
//! the OFT to pull the token when it is an adapter and the allowance is
//! short. It then quotes the messaging fee with a preview minimum of 1 and
//! submits `send` with the real minimum and the quoted native fee attached
//! as value.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::Provider;
use oftbridge::amount::Amount;
use oftbridge::endpoint::{BridgePair, ChainEndpoint, EndpointId};
use oftbridge::oft::{
    DEFAULT_LZ_RECEIVE_GAS, ExecutorOptions, MessagingFee, OftSendParams, SlippageGuard,
};
use oftbridge::wallet::{ChainAdapter, ConnectMode, WalletState, WalletStateCell};
use tokio::sync::{OnceCell, watch};

use crate::contract::{IERC20, IOFT};
use crate::error::EvmError;

/// Static configuration of an EVM OFT deployment.
#[derive(Debug, Clone)]
pub struct EvmOftConfig {
    /// OFT (or OFT adapter) contract address.
    pub oft: Address,
    /// Expected EIP-155 chain ID of the provider.
    pub chain_id: u64,
    /// Token decimals. Read from the token contract when `None`.
    pub token_decimals: Option<u8>,
    /// Executor options attached to every send.
    pub options: ExecutorOptions,
    /// Minimum-received bound.
    pub slippage: SlippageGuard,
}

impl EvmOftConfig {
    /// Configuration with the default `lzReceive` gas and slippage bound.
    #[must_use]
    pub fn new(oft: Address, chain_id: u64) -> Self {
        Self {
            oft,
            chain_id,
            token_decimals: None,
            options: ExecutorOptions::new().lz_receive(DEFAULT_LZ_RECEIVE_GAS, 0),
            slippage: SlippageGuard::default(),
        }
    }
}

/// EVM side of the bridge.
#[derive(Debug)]
pub struct EvmOftAdapter<P> {
    endpoint: ChainEndpoint,
    destination: EndpointId,
    provider: P,
    signer: Address,
    config: EvmOftConfig,
    token: OnceCell<Address>,
    decimals: OnceCell<u8>,
    approval_required: OnceCell<bool>,
    state: WalletStateCell<Address>,
}

impl<P: Provider> EvmOftAdapter<P> {
    /// Creates an adapter for the EVM endpoint of `pair`.
    ///
    /// `provider` must be able to sign transactions from `signer`.
    #[must_use]
    pub fn new(pair: &BridgePair, provider: P, signer: Address, config: EvmOftConfig) -> Self {
        Self {
            endpoint: pair.evm().clone(),
            destination: pair.solana().eid,
            provider,
            signer,
            config,
            token: OnceCell::new(),
            decimals: OnceCell::new(),
            approval_required: OnceCell::new(),
            state: WalletStateCell::new(),
        }
    }

    /// Address that signs and pays for sends.
    #[must_use]
    pub const fn signer(&self) -> Address {
        self.signer
    }

    /// Static configuration.
    #[must_use]
    pub const fn config(&self) -> &EvmOftConfig {
        &self.config
    }

    /// Fails unless the provider reports the configured chain ID.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError::WrongNetwork`] on mismatch, or a transport error.
    pub async fn ensure_network(&self) -> Result<(), EvmError> {
        let actual = self.provider.get_chain_id().await?;
        if actual == self.config.chain_id {
            Ok(())
        } else {
            Err(EvmError::WrongNetwork {
                expected: self.config.chain_id,
                actual,
            })
        }
    }

    /// Underlying ERC-20 token of the OFT.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError`] if the `token()` call fails.
    pub async fn token(&self) -> Result<Address, EvmError> {
        self.token
            .get_or_try_init(|| async {
                let oft = IOFT::new(self.config.oft, &self.provider);
                Ok::<_, EvmError>(oft.token().call().await?)
            })
            .await
            .copied()
    }

    /// Decimals of the underlying token.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError`] if the token lookup or `decimals()` call fails.
    pub async fn token_decimals(&self) -> Result<u8, EvmError> {
        if let Some(decimals) = self.config.token_decimals {
            return Ok(decimals);
        }
        self.decimals
            .get_or_try_init(|| async {
                let token = self.token().await?;
                let erc20 = IERC20::new(token, &self.provider);
                Ok::<_, EvmError>(erc20.decimals().call().await?)
            })
            .await
            .copied()
    }

    /// Whether `send` pulls the underlying token through an allowance.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError`] if the `approvalRequired()` call fails.
    pub async fn approval_required(&self) -> Result<bool, EvmError> {
        self.approval_required
            .get_or_try_init(|| async {
                let oft = IOFT::new(self.config.oft, &self.provider);
                Ok::<_, EvmError>(oft.approvalRequired().call().await?)
            })
            .await
            .copied()
    }

    /// Approves the OFT for `amount_ld` when it needs an allowance and the
    /// current one is short.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError`] if a read fails or the approval reverts.
    pub async fn ensure_allowance(&self, amount_ld: U256) -> Result<(), EvmError> {
        if !self.approval_required().await? {
            return Ok(());
        }
        let token = self.token().await?;
        let erc20 = IERC20::new(token, &self.provider);
        let allowance = erc20.allowance(self.signer, self.config.oft).call().await?;
        if allowance >= amount_ld {
            return Ok(());
        }

        tracing::info!(
            %token,
            spender = %self.config.oft,
            %allowance,
            amount = %amount_ld,
            "Approving OFT"
        );
        let receipt = erc20
            .approve(self.config.oft, amount_ld)
            .from(self.signer)
            .send()
            .await?
            .get_receipt()
            .await?;
        if !receipt.status() {
            return Err(EvmError::Reverted(receipt.transaction_hash));
        }
        Ok(())
    }

    /// Signer's balance of the underlying token.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError`] if any of the contract reads fail.
    pub async fn token_balance(&self) -> Result<Amount, EvmError> {
        let token = self.token().await?;
        let decimals = self.token_decimals().await?;
        let erc20 = IERC20::new(token, &self.provider);
        let balance = erc20.balanceOf(self.signer).call().await?;
        Ok(Amount::from_local_units(balance, decimals))
    }

    /// Send parameters for `amount` to `to`, with the slippage guard applied.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError`] if decimals cannot be read or the amount does not
    /// fit the token's precision.
    pub async fn send_params(&self, to: B256, amount: Amount) -> Result<OftSendParams, EvmError> {
        let decimals = self.token_decimals().await?;
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
    /// Returns [`EvmError`] if the quote call fails.
    pub async fn quote(&self, to: B256, amount: Amount) -> Result<MessagingFee, EvmError> {
        let params = self.send_params(to, amount).await?;
        let fee = self.quote_raw(&params.preview()).await?;
        Ok(MessagingFee {
            native_fee: fee.nativeFee.saturating_to(),
            lz_token_fee: fee.lzTokenFee.saturating_to(),
        })
    }

    async fn quote_raw(&self, params: &OftSendParams) -> Result<IOFT::MessagingFee, EvmError> {
        let oft = IOFT::new(self.config.oft, &self.provider);
        Ok(oft.quoteSend(sol_send_param(params), false).call().await?)
    }

    async fn submit(&self, to: B256, amount: Amount) -> Result<String, EvmError> {
        self.ensure_network().await?;
        let params = self.send_params(to, amount).await?;
        self.ensure_allowance(params.amount_ld).await?;
        let fee = self.quote_raw(&params.preview()).await?;
        tracing::debug!(
            dst_eid = %params.dst_eid,
            amount_ld = %params.amount_ld,
            min_amount_ld = %params.min_amount_ld,
            native_fee = %fee.nativeFee,
            "Submitting OFT send"
        );

        let oft = IOFT::new(self.config.oft, &self.provider);
        let native_fee = fee.nativeFee;
        let receipt = oft
            .send(sol_send_param(&params), fee, self.signer)
            .from(self.signer)
            .value(native_fee)
            .send()
            .await?
            .get_receipt()
            .await?;

        let hash = receipt.transaction_hash;
        if !receipt.status() {
            return Err(EvmError::Reverted(hash));
        }
        tracing::info!(tx = %hash, chain = %self.endpoint.name, "OFT send confirmed");
        Ok(format!("{hash:#x}"))
    }
}

impl<P: Provider> ChainAdapter for EvmOftAdapter<P> {
    type Address = Address;
    type Error = EvmError;

    fn endpoint(&self) -> &ChainEndpoint {
        &self.endpoint
    }

    fn state(&self) -> WalletState<Address> {
        self.state.snapshot()
    }

    fn subscribe(&self) -> watch::Receiver<WalletState<Address>> {
        self.state.subscribe()
    }

    /// A locally held key is always trusted, so both modes connect.
    async fn connect(&self, mode: ConnectMode) -> Result<(), EvmError> {
        self.ensure_network().await?;
        let balance = self.token_balance().await?;
        tracing::debug!(?mode, signer = %self.signer, %balance, "EVM wallet connected");
        self.state.set_connected(self.signer, balance);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), EvmError> {
        self.state.set_disconnected();
        Ok(())
    }

    async fn send_to_other_chain(&self, to: B256, amount: Amount) -> Result<String, EvmError> {
        let hash = self.state.track_send(self.submit(to, amount)).await?;
        // A failed refresh does not fail the send.
        match self.token_balance().await {
            Ok(balance) => self.state.set_balance(balance),
            Err(e) => tracing::warn!(error = %e, "Failed to refresh EVM balance after send"),
        }
        Ok(hash)
    }
}

/// Converts shared send parameters to the contract's `SendParam` struct.
#[must_use]
pub fn sol_send_param(params: &OftSendParams) -> IOFT::SendParam {
    IOFT::SendParam {
        dstEid: params.dst_eid.as_u32(),
        to: params.to,
        amountLD: params.amount_ld,
        minAmountLD: params.min_amount_ld,
        extraOptions: params.extra_options.clone(),
        composeMsg: params.compose_msg.clone().unwrap_or_default(),
        oftCmd: Bytes::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_network::EthereumWallet;
    use alloy_primitives::{address, b256, hex};
    use alloy_provider::{DynProvider, ProviderBuilder, RootProvider};
    use alloy_signer_local::PrivateKeySigner;
    use alloy_sol_types::SolCall;
    use oftbridge::address::UniversalAddress;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, body_string_contains, method};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const OFT: Address = address!("0x1111111111111111111111111111111111111111");
    const TOKEN: Address = address!("0x2222222222222222222222222222222222222222");
    const SIGNER: Address = address!("0xAeA544425b62bC0AE3aaDD85500ECFffB35c4400");
    const SENDER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const SENDER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TX_HASH: B256 =
        b256!("0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060");
    const NATIVE_FEE: u64 = 10_000_000_000_000_000;

    /// Replies with a JSON-RPC result echoing the request id.
    struct JsonRpc(Value);

    impl Respond for JsonRpc {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "result": self.0,
            }))
        }
    }

    fn word(value: U256) -> String {
        format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
    }

    async fn mock_chain_id(server: &MockServer, chain_id: u64) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_chainId"})))
            .respond_with(JsonRpc(json!(format!("{chain_id:#x}"))))
            .mount(server)
            .await;
    }

    async fn mock_call(server: &MockServer, selector: &str, result: String) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_call"})))
            .and(body_string_contains(selector))
            .respond_with(JsonRpc(json!(result)))
            .mount(server)
            .await;
    }

    async fn mock_rpc(server: &MockServer, rpc_method: &str, result: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": rpc_method})))
            .respond_with(JsonRpc(result))
            .mount(server)
            .await;
    }

    fn receipt(success: bool) -> Value {
        json!({
            "transactionHash": format!("{TX_HASH:#x}"),
            "transactionIndex": "0x0",
            "blockHash": format!("{:#x}", B256::repeat_byte(0xbb)),
            "blockNumber": "0x10",
            "from": SENDER.to_string(),
            "to": OFT.to_string(),
            "cumulativeGasUsed": "0x30d40",
            "gasUsed": "0x30d40",
            "effectiveGasPrice": "0x3b9aca00",
            "contractAddress": null,
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "type": "0x2",
            "status": if success { "0x1" } else { "0x0" },
        })
    }

    /// Mounts everything a wallet-backed provider needs to sign, submit and
    /// confirm one transaction, plus the OFT reads of a send.
    async fn mock_send_chain(server: &MockServer, approval_required: bool, success: bool) {
        mock_chain_id(server, crate::SEPOLIA).await;
        mock_rpc(server, "eth_getTransactionCount", json!("0x0")).await;
        mock_rpc(server, "eth_estimateGas", json!("0x493e0")).await;
        mock_rpc(
            server,
            "eth_feeHistory",
            json!({
                "oldestBlock": "0xf",
                "baseFeePerGas": ["0x3b9aca00", "0x3b9aca00"],
                "gasUsedRatio": [0.5],
                "reward": [["0x3b9aca00"]]
            }),
        )
        .await;
        mock_rpc(server, "eth_sendRawTransaction", json!(format!("{TX_HASH:#x}"))).await;
        mock_rpc(server, "eth_getTransactionReceipt", receipt(success)).await;

        mock_call(
            server,
            &hex::encode(IOFT::approvalRequiredCall::SELECTOR),
            word(U256::from(u8::from(approval_required))),
        )
        .await;
        mock_call(
            server,
            &hex::encode(IOFT::quoteSendCall::SELECTOR),
            format!("{}{}", word(U256::from(NATIVE_FEE)), &word(U256::ZERO)[2..]),
        )
        .await;
        mock_call(server, "fc0c546a", word(U256::from_be_slice(TOKEN.as_slice()))).await;
        mock_call(
            server,
            "70a08231",
            word(U256::from(500_000_000_000_000_000u128)),
        )
        .await;
    }

    fn wallet_adapter(server: &MockServer) -> EvmOftAdapter<DynProvider> {
        let url: url::Url = server.uri().parse().unwrap();
        let signer: PrivateKeySigner = SENDER_KEY.parse().unwrap();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        let mut config = EvmOftConfig::new(OFT, crate::SEPOLIA);
        config.token_decimals = Some(18);
        EvmOftAdapter::new(&BridgePair::testnet(), provider, SENDER, config)
    }

    /// Transaction requests the provider estimated gas for, in order.
    async fn estimated_transactions(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
            .filter(|body| body["method"] == "eth_estimateGas")
            .map(|body| body["params"][0].clone())
            .collect()
    }

    fn calldata(tx: &Value) -> Vec<u8> {
        let input = tx["input"].as_str().or_else(|| tx["data"].as_str()).unwrap();
        hex::decode(input).unwrap()
    }

    fn quantity(tx: &Value, field: &str) -> U256 {
        tx[field].as_str().map_or(U256::ZERO, |v| v.parse().unwrap())
    }

    fn adapter(server: &MockServer) -> EvmOftAdapter<RootProvider> {
        let url: url::Url = server.uri().parse().unwrap();
        let provider: RootProvider = RootProvider::new_http(url);
        let mut config = EvmOftConfig::new(OFT, crate::SEPOLIA);
        config.token_decimals = Some(18);
        EvmOftAdapter::new(&BridgePair::testnet(), provider, SIGNER, config)
    }

    #[test]
    fn test_sol_send_param() {
        let params = OftSendParams::for_amount(
            EndpointId::new(40168),
            SIGNER.to_bytes32(),
            Amount::from_micro(2_000_000),
            18,
            &ExecutorOptions::new().lz_receive(DEFAULT_LZ_RECEIVE_GAS, 0),
            SlippageGuard::default(),
        )
        .unwrap();
        let param = sol_send_param(&params);
        assert_eq!(param.dstEid, 40168);
        assert_eq!(param.to, SIGNER.into_word());
        assert_eq!(param.amountLD, U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(param.minAmountLD, U256::from(1_800_000_000_000_000_000u128));
        assert_eq!(param.extraOptions.len(), 22);
        assert!(param.composeMsg.is_empty());
        assert!(param.oftCmd.is_empty());
    }

    #[tokio::test]
    async fn test_connect_loads_balance() {
        let server = MockServer::start().await;
        mock_chain_id(&server, crate::SEPOLIA).await;
        mock_call(&server, "fc0c546a", word(U256::from_be_slice(TOKEN.as_slice()))).await;
        mock_call(
            &server,
            "70a08231",
            word(U256::from(1_500_000_000_000_000_000u128)),
        )
        .await;

        let adapter = adapter(&server);
        let mut rx = adapter.subscribe();
        adapter.connect(ConnectMode::OnlyIfTrusted).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.address, Some(SIGNER));
        assert_eq!(state.token_balance, Amount::from_micro(1_500_000));
        assert_eq!(adapter.token().await.unwrap(), TOKEN);

        adapter.disconnect().await.unwrap();
        assert!(!adapter.state().is_connected());
    }

    #[tokio::test]
    async fn test_connect_rejects_wrong_network() {
        let server = MockServer::start().await;
        mock_chain_id(&server, crate::ETHEREUM_MAINNET).await;

        let adapter = adapter(&server);
        let err = adapter.connect(ConnectMode::Explicit).await.unwrap_err();
        assert!(matches!(
            err,
            EvmError::WrongNetwork {
                expected: 11_155_111,
                actual: 1
            }
        ));
        assert!(!adapter.state().is_connected());
    }

    #[tokio::test]
    async fn test_quote_reads_native_fee() {
        let server = MockServer::start().await;
        let fee = U256::from(10_000_000_000_000_000u64);
        let result = format!("{}{}", word(fee), &word(U256::ZERO)[2..]);
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_call"})))
            .respond_with(JsonRpc(json!(result)))
            .mount(&server)
            .await;

        let adapter = adapter(&server);
        let quoted = adapter
            .quote(B256::repeat_byte(7), Amount::from_micro(1_000_000))
            .await
            .unwrap();
        assert_eq!(quoted.native_fee, 10_000_000_000_000_000);
        assert_eq!(quoted.lz_token_fee, 0);
    }

    #[tokio::test]
    async fn test_send_pays_quoted_fee_with_slippage_floor() {
        let server = MockServer::start().await;
        mock_send_chain(&server, false, true).await;
        let adapter = wallet_adapter(&server);
        let recipient = B256::repeat_byte(0x42);

        let hash = adapter
            .send_to_other_chain(recipient, Amount::from_micro(2_000_000))
            .await
            .unwrap();
        assert_eq!(hash, format!("{TX_HASH:#x}"));
        let state = adapter.state();
        assert!(!state.is_pending);
        assert_eq!(state.last_tx_hash.as_deref(), Some(hash.as_str()));
        assert_eq!(state.token_balance, Amount::from_micro(500_000));

        let txs = estimated_transactions(&server).await;
        assert_eq!(txs.len(), 1);
        let tx = &txs[0];
        assert_eq!(tx["from"].as_str().unwrap().parse::<Address>().unwrap(), SENDER);
        assert_eq!(tx["to"].as_str().unwrap().parse::<Address>().unwrap(), OFT);
        assert_eq!(quantity(tx, "value"), U256::from(NATIVE_FEE));

        let call = IOFT::sendCall::abi_decode(&calldata(tx)).unwrap();
        assert_eq!(call.sendParam.dstEid, 40168);
        assert_eq!(call.sendParam.to, recipient);
        assert_eq!(call.sendParam.amountLD, U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(call.sendParam.minAmountLD, U256::from(1_800_000_000_000_000_000u128));
        assert_eq!(call.fee.nativeFee, U256::from(NATIVE_FEE));
        assert_eq!(call.fee.lzTokenFee, U256::ZERO);
        assert_eq!(call.refundAddress, SENDER);
    }

    #[tokio::test]
    async fn test_send_reverted_keeps_previous_hash() {
        let server = MockServer::start().await;
        mock_send_chain(&server, false, false).await;
        let adapter = wallet_adapter(&server);

        let err = adapter
            .send_to_other_chain(B256::repeat_byte(0x42), Amount::from_micro(1_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, EvmError::Reverted(hash) if hash == TX_HASH));
        let state = adapter.state();
        assert!(!state.is_pending);
        assert!(state.last_tx_hash.is_none());
    }

    #[tokio::test]
    async fn test_send_approves_adapter_when_allowance_short() {
        let server = MockServer::start().await;
        mock_send_chain(&server, true, true).await;
        mock_call(
            &server,
            &hex::encode(IERC20::allowanceCall::SELECTOR),
            word(U256::from(1_000u64)),
        )
        .await;
        let adapter = wallet_adapter(&server);

        adapter
            .send_to_other_chain(B256::repeat_byte(0x42), Amount::from_micro(3_000_000))
            .await
            .unwrap();

        let txs = estimated_transactions(&server).await;
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0]["to"].as_str().unwrap().parse::<Address>().unwrap(), TOKEN);
        let approve = IERC20::approveCall::abi_decode(&calldata(&txs[0])).unwrap();
        assert_eq!(approve.spender, OFT);
        assert_eq!(approve.amount, U256::from(3_000_000_000_000_000_000u128));
        assert!(IOFT::sendCall::abi_decode(&calldata(&txs[1])).is_ok());
    }

    #[tokio::test]
    async fn test_send_skips_approval_when_allowance_covers_amount() {
        let server = MockServer::start().await;
        mock_send_chain(&server, true, true).await;
        mock_call(
            &server,
            &hex::encode(IERC20::allowanceCall::SELECTOR),
            word(U256::MAX),
        )
        .await;
        let adapter = wallet_adapter(&server);

        adapter
            .send_to_other_chain(B256::repeat_byte(0x42), Amount::from_micro(3_000_000))
            .await
            .unwrap();

        let txs = estimated_transactions(&server).await;
        assert_eq!(txs.len(), 1);
        assert!(IOFT::sendCall::abi_decode(&calldata(&txs[0])).is_ok());
    }
}
