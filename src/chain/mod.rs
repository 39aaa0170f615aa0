//! Chain access
//!
//! Everything the action layer needs from an EVM node sits behind
//! [`ChainClient`], so the swap and transfer flows can run against an
//! in-memory chain in tests.

pub mod erc20;
mod provider;

#[cfg(test)]
pub(crate) mod testing;

pub use provider::AlloyChainClient;

use crate::config::ConfirmationConfig;
use crate::tokens::{is_native, TokenDescriptor};
use crate::wallet::{PendingTransaction, SecureWallet, TransactionReceipt};
use crate::Result;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;

/// Symbol reported when a token contract does not expose one
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Parameters for gas estimation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Read and write access to one EVM chain
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    async fn native_balance(&self, owner: Address) -> Result<U256>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    async fn token_decimals(&self, token: Address) -> Result<u8>;

    async fn token_symbol(&self, token: Address) -> Result<String>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// Next nonce for `owner`, including pending transactions
    async fn transaction_count(&self, owner: Address) -> Result<u64>;

    async fn gas_price(&self) -> Result<u128>;

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64>;

    /// Execute a read-only call against the latest block
    async fn call(&self, call: &CallRequest) -> Result<Bytes>;

    /// Sign with `wallet` and broadcast
    async fn send_transaction(
        &self,
        wallet: &SecureWallet,
        tx: &PendingTransaction,
    ) -> Result<TxHash>;

    /// Wait until the transaction is mined at the configured depth
    ///
    /// Gives up with `Error::ConfirmationTimeout` after `settings.timeout()`.
    /// A failed receipt is returned as-is; callers decide what it means.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        settings: &ConfirmationConfig,
    ) -> Result<TransactionReceipt>;

    /// Balance of `token` held by `owner`, native or ERC-20
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        if is_native(&token) {
            self.native_balance(owner).await
        } else {
            self.token_balance(token, owner).await
        }
    }
}

/// How a transaction's gas limit is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasLimit {
    Fixed(u64),
    /// Estimate; an estimation failure aborts
    Estimated,
    /// Estimate; fall back to this limit if estimation fails
    EstimatedOr(u64),
}

/// Fill nonce, gas price, gas limit and chain id for a call
///
/// The nonce is read here, immediately before signing, so it reflects any
/// transaction the same account just had mined.
pub async fn prepare_transaction(
    chain: &dyn ChainClient,
    call: CallRequest,
    gas: GasLimit,
) -> Result<PendingTransaction> {
    let gas_limit = match gas {
        GasLimit::Fixed(limit) => limit,
        GasLimit::Estimated => chain.estimate_gas(&call).await?,
        GasLimit::EstimatedOr(fallback) => match chain.estimate_gas(&call).await {
            Ok(estimate) => estimate,
            Err(e) => {
                tracing::warn!(error = %e, fallback, "Gas estimation failed, using fallback limit");
                fallback
            }
        },
    };

    Ok(PendingTransaction {
        chain_id: chain.chain_id().await?,
        nonce: chain.transaction_count(call.from).await?,
        gas_price: chain.gas_price().await?,
        gas_limit,
        to: call.to,
        value: call.value,
        data: call.data,
    })
}

/// Fetch a token's decimals and symbol
///
/// The native sentinel resolves without touching the chain. A failing
/// `symbol()` degrades to [`UNKNOWN_SYMBOL`]; a failing `decimals()` is an error.
pub async fn describe_token(
    chain: &dyn ChainClient,
    token: Address,
    native_symbol: &str,
) -> Result<TokenDescriptor> {
    if is_native(&token) {
        return Ok(TokenDescriptor::native(native_symbol));
    }

    let decimals = chain.token_decimals(token).await?;
    let symbol = match chain.token_symbol(token).await {
        Ok(symbol) => symbol,
        Err(e) => {
            tracing::warn!(%token, error = %e, "Token symbol unavailable");
            UNKNOWN_SYMBOL.to_string()
        }
    };

    Ok(TokenDescriptor {
        address: token,
        decimals,
        symbol,
    })
}
