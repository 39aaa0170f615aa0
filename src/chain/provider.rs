//! JSON-RPC backed chain client

use super::erc20::IERC20;
use super::{CallRequest, ChainClient};
use crate::config::ConfirmationConfig;
use crate::wallet::{PendingTransaction, SecureWallet, TransactionReceipt, TxStatus};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use tracing::{debug, warn};

fn rpc_err(method: &str, e: impl std::fmt::Display) -> Error {
    Error::Connection(format!("{}: {}", method, e))
}

fn to_request(call: &CallRequest) -> TransactionRequest {
    TransactionRequest {
        from: Some(call.from),
        to: Some(TxKind::Call(call.to)),
        value: Some(call.value),
        input: TransactionInput::new(call.data.clone()),
        ..Default::default()
    }
}

/// Chain client over an alloy HTTP provider
#[derive(Clone)]
pub struct AlloyChainClient {
    provider: DynProvider,
}

impl AlloyChainClient {
    /// Connect to an HTTP JSON-RPC endpoint
    ///
    /// No request is made here; use [`ChainClient::chain_id`] to check the endpoint.
    pub fn connect(rpc_url: &str) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;
        Ok(Self::from_provider(
            ProviderBuilder::new().connect_http(url).erased(),
        ))
    }

    pub fn from_provider(provider: DynProvider) -> Self {
        Self { provider }
    }

    async fn receipt_at_depth(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<Option<TransactionReceipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| rpc_err("eth_getTransactionReceipt", e))?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };

        if confirmations > 1 {
            let Some(included) = receipt.block_number else {
                return Ok(None);
            };
            let head = self
                .provider
                .get_block_number()
                .await
                .map_err(|e| rpc_err("eth_blockNumber", e))?;
            if head.saturating_sub(included) + 1 < confirmations {
                return Ok(None);
            }
        }

        Ok(Some(TransactionReceipt {
            tx_hash,
            status: if receipt.status() {
                TxStatus::Success
            } else {
                TxStatus::Failure
            },
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }))
    }
}

impl std::fmt::Debug for AlloyChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyChainClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| rpc_err("eth_chainId", e))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| rpc_err("eth_getBalance", e))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        IERC20::new(token, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| rpc_err("balanceOf", e))
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        IERC20::new(token, &self.provider)
            .decimals()
            .call()
            .await
            .map_err(|e| rpc_err("decimals", e))
    }

    async fn token_symbol(&self, token: Address) -> Result<String> {
        IERC20::new(token, &self.provider)
            .symbol()
            .call()
            .await
            .map_err(|e| rpc_err("symbol", e))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        IERC20::new(token, &self.provider)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| rpc_err("allowance", e))
    }

    async fn transaction_count(&self, owner: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(owner)
            .pending()
            .await
            .map_err(|e| rpc_err("eth_getTransactionCount", e))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| rpc_err("eth_gasPrice", e))
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64> {
        self.provider
            .estimate_gas(to_request(call))
            .await
            .map_err(|e| rpc_err("eth_estimateGas", e))
    }

    async fn call(&self, call: &CallRequest) -> Result<Bytes> {
        self.provider
            .call(to_request(call))
            .await
            .map_err(|e| rpc_err("eth_call", e))
    }

    async fn send_transaction(
        &self,
        wallet: &SecureWallet,
        tx: &PendingTransaction,
    ) -> Result<TxHash> {
        let (tx_hash, raw) = wallet.sign_transaction(tx)?;
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| rpc_err("eth_sendRawTransaction", e))?;

        if *pending.tx_hash() != tx_hash {
            warn!(local = %tx_hash, node = %pending.tx_hash(), "Node reported a different transaction hash");
        }
        debug!(%tx_hash, nonce = tx.nonce, "Broadcast transaction");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        settings: &ConfirmationConfig,
    ) -> Result<TransactionReceipt> {
        let poll = async {
            loop {
                match self.receipt_at_depth(tx_hash, settings.confirmations).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {}
                    // The transaction is already out; keep polling through RPC hiccups
                    Err(e) => warn!(%tx_hash, error = %e, "Receipt poll failed"),
                }
                tokio::time::sleep(settings.poll_interval()).await;
            }
        };

        tokio::time::timeout(settings.timeout(), poll)
            .await
            .map_err(|_| Error::ConfirmationTimeout {
                tx_hash,
                waited_secs: settings.timeout_secs,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::providers::mock::Asserter;
    use serde_json::{json, Value};

    const TX: TxHash = TxHash::repeat_byte(0xab);

    fn mocked(asserter: &Asserter) -> AlloyChainClient {
        AlloyChainClient::from_provider(
            ProviderBuilder::new()
                .connect_mocked_client(asserter.clone())
                .erased(),
        )
    }

    fn settings(confirmations: u64, timeout_secs: u64) -> ConfirmationConfig {
        ConfirmationConfig {
            timeout_secs,
            confirmations,
            poll_interval_ms: 10,
        }
    }

    fn mined_receipt(block: u64) -> Value {
        json!({
            "type": "0x0",
            "status": "0x1",
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": TX.to_string(),
            "transactionIndex": "0x0",
            "blockHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": format!("{:#x}", block),
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "to": "0x4242424242424242424242424242424242424242",
            "contractAddress": null
        })
    }

    #[test]
    fn connect_rejects_bad_url() {
        assert!(matches!(
            AlloyChainClient::connect("not a url"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn connect_accepts_http_url() {
        assert!(AlloyChainClient::connect("http://localhost:8545").is_ok());
    }

    #[tokio::test]
    async fn unreachable_node_is_connection_error() {
        let client = AlloyChainClient::connect("http://127.0.0.1:1").unwrap();
        let err = client.chain_id().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn unmined_transaction_times_out() {
        let asserter = Asserter::new();
        for _ in 0..5 {
            asserter.push_success(&Value::Null);
        }
        let client = mocked(&asserter);

        let err = client
            .wait_for_receipt(TX, &settings(1, 1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::ConfirmationTimeout { tx_hash, waited_secs: 1 } if tx_hash == TX
        ));
        assert!(err.outcome_unknown());
    }

    #[tokio::test]
    async fn mined_receipt_returns_at_depth_one() {
        let asserter = Asserter::new();
        asserter.push_success(&Value::Null);
        asserter.push_success(&mined_receipt(10));
        let client = mocked(&asserter);

        let receipt = client.wait_for_receipt(TX, &settings(1, 5)).await.unwrap();

        assert_eq!(receipt.tx_hash, TX);
        assert_eq!(receipt.status, TxStatus::Success);
        assert_eq!(receipt.block_number, Some(10));
        assert_eq!(receipt.gas_used, 21_000);
    }

    #[tokio::test]
    async fn rpc_errors_while_polling_are_retried() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("header not found");
        asserter.push_success(&mined_receipt(10));
        let client = mocked(&asserter);

        let receipt = client.wait_for_receipt(TX, &settings(1, 5)).await.unwrap();
        assert_eq!(receipt.block_number, Some(10));
    }

    #[tokio::test]
    async fn deeper_confirmation_waits_for_head_to_advance() {
        let asserter = Asserter::new();
        // Head equals the inclusion block: one confirmation only
        asserter.push_success(&mined_receipt(10));
        asserter.push_success(&"0xa");
        // One block on top: two confirmations
        asserter.push_success(&mined_receipt(10));
        asserter.push_success(&"0xb");
        let client = mocked(&asserter);

        let receipt = client.wait_for_receipt(TX, &settings(2, 5)).await.unwrap();
        assert_eq!(receipt.block_number, Some(10));
    }

    #[tokio::test]
    async fn stalled_head_never_reaches_depth() {
        let asserter = Asserter::new();
        for _ in 0..3 {
            asserter.push_success(&mined_receipt(10));
            asserter.push_success(&"0xa");
        }
        let client = mocked(&asserter);

        let err = client
            .wait_for_receipt(TX, &settings(2, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfirmationTimeout { .. }));
    }
}
