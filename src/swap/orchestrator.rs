//! End-to-end swap execution

use super::{ApprovalManager, FALLBACK_GAS_LIMIT};
use crate::aggregator::AggregatorClient;
use crate::chain::{describe_token, prepare_transaction, CallRequest, ChainClient, GasLimit};
use crate::config::ConfirmationConfig;
use crate::wallet::{SecureWallet, TransactionReceipt};
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const MAX_SLIPPAGE_BPS: u32 = 10_000;

/// Quote, approve, sign and submit a swap through the aggregator router
pub struct SwapOrchestrator {
    chain: Arc<dyn ChainClient>,
    aggregator: AggregatorClient,
    approvals: ApprovalManager,
    confirmation: ConfirmationConfig,
    native_symbol: String,
}

impl SwapOrchestrator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        aggregator: AggregatorClient,
        confirmation: ConfirmationConfig,
        native_symbol: &str,
    ) -> Self {
        Self {
            approvals: ApprovalManager::new(chain.clone(), confirmation.clone()),
            chain,
            aggregator,
            confirmation,
            native_symbol: native_symbol.to_string(),
        }
    }

    /// Swap `amount_in` (human-readable) of `token_in` for `token_out`
    ///
    /// Output lands in `account`. Either token may be the native sentinel.
    #[instrument(skip(self, account), fields(account = %account.address()))]
    pub async fn execute_swap(
        &self,
        account: &SecureWallet,
        token_in: Address,
        token_out: Address,
        amount_in: &str,
        slippage_bps: u32,
    ) -> Result<TransactionReceipt> {
        if slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(Error::InvalidArgument(format!(
                "Slippage {} bps exceeds {} bps",
                slippage_bps, MAX_SLIPPAGE_BPS
            )));
        }
        if token_in == token_out {
            return Err(Error::InvalidArgument(
                "Input and output tokens are the same".to_string(),
            ));
        }

        let owner = account.address();
        let input = describe_token(self.chain.as_ref(), token_in, &self.native_symbol).await?;
        let amount_raw = input.to_raw(amount_in)?;

        let available = self.chain.balance_of(token_in, owner).await?;
        if available < amount_raw {
            return Err(Error::InsufficientBalance {
                token: input.symbol.clone(),
                required: input.format(amount_raw),
                available: input.format(available),
            });
        }

        let route = self.aggregator.get_route(&input, token_out, amount_in).await?;
        debug!(
            router = %route.router_address,
            expected_out = ?route.amount_out(),
            "Route found"
        );
        let calldata = self
            .aggregator
            .encode_route(&route, owner, owner, slippage_bps)
            .await?;

        if !input.is_native() {
            self.approvals
                .ensure_allowance(account, token_in, route.router_address, amount_raw)
                .await?;
        }

        let call = CallRequest {
            from: owner,
            to: route.router_address,
            value: if input.is_native() {
                amount_raw
            } else {
                U256::ZERO
            },
            data: calldata,
        };
        let tx = prepare_transaction(
            self.chain.as_ref(),
            call,
            GasLimit::EstimatedOr(FALLBACK_GAS_LIMIT),
        )
        .await?;

        let tx_hash = self.chain.send_transaction(account, &tx).await?;
        info!(%tx_hash, router = %route.router_address, "Swap submitted, waiting for confirmation");

        let receipt = self
            .chain
            .wait_for_receipt(tx_hash, &self.confirmation)
            .await?;
        if !receipt.is_success() {
            return Err(Error::SwapFailed { tx_hash });
        }

        Ok(receipt)
    }
}
