//! Native and ERC-20 transfers, and wrapping the native currency

use crate::chain::{
    describe_token, erc20, prepare_transaction, CallRequest, ChainClient, GasLimit,
};
use crate::config::ConfirmationConfig;
use crate::swap::FALLBACK_GAS_LIMIT;
use crate::tokens::{TokenDescriptor, NATIVE_TOKEN};
use crate::wallet::{SecureWallet, TransactionReceipt};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, U256};
use std::sync::Arc;
use tracing::info;

/// Gas limit of a plain value transfer
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

pub struct Transfers {
    chain: Arc<dyn ChainClient>,
    confirmation: ConfirmationConfig,
    native_symbol: String,
    wrapped_native: Option<Address>,
}

impl Transfers {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        confirmation: ConfirmationConfig,
        native_symbol: &str,
        wrapped_native: Option<Address>,
    ) -> Self {
        Self {
            chain,
            confirmation,
            native_symbol: native_symbol.to_string(),
            wrapped_native,
        }
    }

    /// Send `amount` (human-readable) of `token`, or of the native currency when `None`
    pub async fn transfer(
        &self,
        wallet: &SecureWallet,
        to: Address,
        amount: &str,
        token: Option<Address>,
    ) -> Result<TransactionReceipt> {
        let token = token.unwrap_or(NATIVE_TOKEN);
        let descriptor = describe_token(self.chain.as_ref(), token, &self.native_symbol).await?;
        let raw = descriptor.to_raw(amount)?;
        self.check_balance(wallet.address(), &descriptor, raw).await?;

        let (call, gas) = if descriptor.is_native() {
            let call = CallRequest {
                from: wallet.address(),
                to,
                value: raw,
                data: Bytes::new(),
            };
            (call, GasLimit::Fixed(NATIVE_TRANSFER_GAS))
        } else {
            let call = CallRequest {
                from: wallet.address(),
                to: token,
                value: U256::ZERO,
                data: erc20::transfer_calldata(to, raw),
            };
            (call, GasLimit::EstimatedOr(FALLBACK_GAS_LIMIT))
        };

        info!(%to, amount, token = %descriptor.symbol, "💸 Sending transfer");
        self.submit(wallet, call, gas).await
    }

    /// Deposit `amount` of the native currency into the wrapped-native contract
    pub async fn wrap_native(&self, wallet: &SecureWallet, amount: &str) -> Result<TransactionReceipt> {
        let wrapped = self.wrapped_native.ok_or_else(|| {
            Error::Config("No wrapped native token known for this network".to_string())
        })?;

        let native = TokenDescriptor::native(&self.native_symbol);
        let raw = native.to_raw(amount)?;
        self.check_balance(wallet.address(), &native, raw).await?;

        let call = CallRequest {
            from: wallet.address(),
            to: wrapped,
            value: raw,
            data: erc20::deposit_calldata(),
        };

        info!(%wrapped, amount, "🎁 Wrapping native currency");
        self.submit(wallet, call, GasLimit::EstimatedOr(FALLBACK_GAS_LIMIT))
            .await
    }

    async fn check_balance(
        &self,
        owner: Address,
        token: &TokenDescriptor,
        required: U256,
    ) -> Result<()> {
        let available = self.chain.balance_of(token.address, owner).await?;
        if available < required {
            return Err(Error::InsufficientBalance {
                token: token.symbol.clone(),
                required: token.format(required),
                available: token.format(available),
            });
        }
        Ok(())
    }

    async fn submit(
        &self,
        wallet: &SecureWallet,
        call: CallRequest,
        gas: GasLimit,
    ) -> Result<TransactionReceipt> {
        let tx = prepare_transaction(self.chain.as_ref(), call, gas).await?;
        let tx_hash = self.chain.send_transaction(wallet, &tx).await?;
        info!(%tx_hash, "Transaction submitted, waiting for confirmation");

        let receipt = self
            .chain
            .wait_for_receipt(tx_hash, &self.confirmation)
            .await?;
        if !receipt.is_success() {
            return Err(Error::TransferFailed { tx_hash });
        }
        Ok(receipt)
    }
}
