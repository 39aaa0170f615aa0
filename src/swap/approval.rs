//! ERC-20 allowance management

use crate::chain::{erc20, prepare_transaction, CallRequest, ChainClient, GasLimit};
use crate::config::ConfirmationConfig;
use crate::tokens::is_native;
use crate::wallet::{SecureWallet, TransactionReceipt};
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, info};

/// Makes sure a spender may move enough of an owner's tokens
pub struct ApprovalManager {
    chain: Arc<dyn ChainClient>,
    confirmation: ConfirmationConfig,
}

impl ApprovalManager {
    pub fn new(chain: Arc<dyn ChainClient>, confirmation: ConfirmationConfig) -> Self {
        Self {
            chain,
            confirmation,
        }
    }

    /// Approve exactly `required` if the current allowance is short
    ///
    /// Returns the approval receipt, or `None` when nothing had to be sent.
    pub async fn ensure_allowance(
        &self,
        owner: &SecureWallet,
        token: Address,
        spender: Address,
        required: U256,
    ) -> Result<Option<TransactionReceipt>> {
        if is_native(&token) {
            return Ok(None);
        }

        let current = self
            .chain
            .allowance(token, owner.address(), spender)
            .await?;
        if current >= required {
            debug!(%token, %spender, %current, "Allowance already sufficient");
            return Ok(None);
        }

        info!(%token, %spender, %required, "🔓 Approving token spend");

        let call = CallRequest {
            from: owner.address(),
            to: token,
            value: U256::ZERO,
            data: erc20::approve_calldata(spender, required),
        };
        let tx = prepare_transaction(self.chain.as_ref(), call, GasLimit::Estimated).await?;
        let tx_hash = self.chain.send_transaction(owner, &tx).await?;
        info!(%tx_hash, "Approval submitted, waiting for confirmation");

        let receipt = self
            .chain
            .wait_for_receipt(tx_hash, &self.confirmation)
            .await?;
        if !receipt.is_success() {
            return Err(Error::ApprovalFailed { tx_hash });
        }

        info!(%tx_hash, "✅ Approval confirmed");
        Ok(Some(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::testing::{test_wallet, FakeChain, Outcome};
    use crate::tokens::NATIVE_TOKEN;
    use alloy::primitives::address;

    const TOKEN: Address = address!("0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c");
    const ROUTER: Address = address!("7777777777777777777777777777777777777777");

    fn manager(chain: &Arc<FakeChain>) -> ApprovalManager {
        ApprovalManager::new(chain.clone(), ConfirmationConfig::default())
    }

    #[tokio::test]
    async fn sufficient_allowance_sends_nothing() {
        let chain = Arc::new(FakeChain::new());
        let wallet = test_wallet();
        chain.set_allowance(TOKEN, wallet.address(), ROUTER, U256::from(100u64));

        let receipt = manager(&chain)
            .ensure_allowance(&wallet, TOKEN, ROUTER, U256::from(100u64))
            .await
            .unwrap();

        assert!(receipt.is_none());
        assert!(chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn short_allowance_approves_exact_amount() {
        let chain = Arc::new(FakeChain::new());
        let wallet = test_wallet();
        chain.set_allowance(TOKEN, wallet.address(), ROUTER, U256::from(10u64));

        let receipt = manager(&chain)
            .ensure_allowance(&wallet, TOKEN, ROUTER, U256::from(250u64))
            .await
            .unwrap();

        assert!(receipt.is_some_and(|r| r.is_success()));
        let submitted = chain.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].to, TOKEN);
        assert_eq!(submitted[0].value, U256::ZERO);
        assert_eq!(
            submitted[0].data,
            erc20::approve_calldata(ROUTER, U256::from(250u64))
        );
        assert_eq!(
            chain.current_allowance(TOKEN, wallet.address(), ROUTER),
            U256::from(250u64)
        );
    }

    #[tokio::test]
    async fn second_call_is_a_no_op() {
        let chain = Arc::new(FakeChain::new());
        let wallet = test_wallet();
        let manager = manager(&chain);

        manager
            .ensure_allowance(&wallet, TOKEN, ROUTER, U256::from(5u64))
            .await
            .unwrap();
        let second = manager
            .ensure_allowance(&wallet, TOKEN, ROUTER, U256::from(5u64))
            .await
            .unwrap();

        assert!(second.is_none());
        assert_eq!(chain.submitted().len(), 1);
        assert_eq!(chain.allowance_reads(), 2);
    }

    #[tokio::test]
    async fn reverted_approval_is_reported() {
        let chain = Arc::new(FakeChain::new());
        let wallet = test_wallet();
        chain.push_outcome(Outcome::Revert);

        let err = manager(&chain)
            .ensure_allowance(&wallet, TOKEN, ROUTER, U256::from(5u64))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ApprovalFailed { .. }));
        assert!(err.tx_hash().is_some());
    }

    #[tokio::test]
    async fn native_token_needs_no_allowance() {
        let chain = Arc::new(FakeChain::new());
        let wallet = test_wallet();

        let receipt = manager(&chain)
            .ensure_allowance(&wallet, NATIVE_TOKEN, ROUTER, U256::from(5u64))
            .await
            .unwrap();

        assert!(receipt.is_none());
        assert_eq!(chain.allowance_reads(), 0);
    }
}
