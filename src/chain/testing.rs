//! In-memory chain for unit tests

use super::erc20::IERC20;
use super::{CallRequest, ChainClient};
use crate::config::ConfirmationConfig;
use crate::wallet::{PendingTransaction, SecureWallet, TransactionReceipt, TxStatus};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub(crate) const TEST_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub(crate) fn test_wallet() -> SecureWallet {
    SecureWallet::from_hex(TEST_KEY).unwrap()
}

/// What happens to the next submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    Revert,
    NeverMined,
}

#[derive(Default)]
struct State {
    native: HashMap<Address, U256>,
    balances: HashMap<(Address, Address), U256>,
    tokens: HashMap<Address, (Option<String>, u8)>,
    allowances: HashMap<(Address, Address, Address), U256>,
    nonces: HashMap<Address, u64>,
    estimate: Option<u64>,
    outcomes: VecDeque<Outcome>,
    mined: HashMap<TxHash, Outcome>,
    submitted: Vec<PendingTransaction>,
    allowance_reads: usize,
    estimates: Vec<CallRequest>,
    call_results: HashMap<Address, Bytes>,
    calls: Vec<CallRequest>,
}

pub(crate) struct FakeChain {
    chain_id: u64,
    state: Mutex<State>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            chain_id: 146,
            state: Mutex::new(State {
                estimate: Some(120_000),
                ..State::default()
            }),
        }
    }

    pub fn add_token(&self, token: Address, symbol: &str, decimals: u8) {
        let mut state = self.state.lock().unwrap();
        state
            .tokens
            .insert(token, (Some(symbol.to_string()), decimals));
    }

    pub fn add_token_without_symbol(&self, token: Address, decimals: u8) {
        self.state.lock().unwrap().tokens.insert(token, (None, decimals));
    }

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        self.state.lock().unwrap().native.insert(owner, amount);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn set_nonce(&self, owner: Address, nonce: u64) {
        self.state.lock().unwrap().nonces.insert(owner, nonce);
    }

    /// Make gas estimation fail for every call
    pub fn fail_estimates(&self) {
        self.state.lock().unwrap().estimate = None;
    }

    /// Queue outcomes for the next submitted transactions; unqueued ones succeed
    pub fn push_outcome(&self, outcome: Outcome) {
        self.state.lock().unwrap().outcomes.push_back(outcome);
    }

    /// Answer every read-only call to `to` with `output`
    pub fn set_call_result(&self, to: Address, output: Bytes) {
        self.state.lock().unwrap().call_results.insert(to, output);
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn submitted(&self) -> Vec<PendingTransaction> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn allowance_reads(&self) -> usize {
        self.state.lock().unwrap().allowance_reads
    }

    pub fn estimates(&self) -> Vec<CallRequest> {
        self.state.lock().unwrap().estimates.clone()
    }

    pub fn current_allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        let state = self.state.lock().unwrap();
        Ok(state.native.get(&owner).copied().unwrap_or_default())
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let state = self.state.lock().unwrap();
        if !state.tokens.contains_key(&token) {
            return Err(Error::Connection(format!("balanceOf: no contract at {}", token)));
        }
        Ok(state
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        let state = self.state.lock().unwrap();
        state
            .tokens
            .get(&token)
            .map(|(_, decimals)| *decimals)
            .ok_or_else(|| Error::Connection(format!("decimals: no contract at {}", token)))
    }

    async fn token_symbol(&self, token: Address) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .tokens
            .get(&token)
            .and_then(|(symbol, _)| symbol.clone())
            .ok_or_else(|| Error::Connection("symbol: execution reverted".to_string()))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.allowance_reads += 1;
        Ok(state
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn transaction_count(&self, owner: Address) -> Result<u64> {
        let state = self.state.lock().unwrap();
        Ok(state.nonces.get(&owner).copied().unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(1_000_000_000)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.estimates.push(call.clone());
        state
            .estimate
            .ok_or_else(|| Error::Connection("eth_estimateGas: execution reverted".to_string()))
    }

    async fn call(&self, call: &CallRequest) -> Result<Bytes> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        state
            .call_results
            .get(&call.to)
            .cloned()
            .ok_or_else(|| Error::Connection("eth_call: execution reverted".to_string()))
    }

    async fn send_transaction(
        &self,
        wallet: &SecureWallet,
        tx: &PendingTransaction,
    ) -> Result<TxHash> {
        let (tx_hash, _) = wallet.sign_transaction(tx)?;
        let owner = wallet.address();

        let mut state = self.state.lock().unwrap();
        let outcome = state.outcomes.pop_front().unwrap_or(Outcome::Success);

        if outcome == Outcome::Success {
            if let Ok(call) = IERC20::approveCall::abi_decode(&tx.data) {
                state
                    .allowances
                    .insert((tx.to, owner, call.spender), call.amount);
            }
        }

        *state.nonces.entry(owner).or_default() += 1;
        state.mined.insert(tx_hash, outcome);
        state.submitted.push(tx.clone());
        Ok(tx_hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        settings: &ConfirmationConfig,
    ) -> Result<TransactionReceipt> {
        let outcome = self.state.lock().unwrap().mined.get(&tx_hash).copied();
        let status = match outcome {
            Some(Outcome::Success) => TxStatus::Success,
            Some(Outcome::Revert) => TxStatus::Failure,
            Some(Outcome::NeverMined) => {
                return Err(Error::ConfirmationTimeout {
                    tx_hash,
                    waited_secs: settings.timeout_secs,
                })
            }
            None => return Err(Error::Connection(format!("unknown transaction {}", tx_hash))),
        };

        Ok(TransactionReceipt {
            tx_hash,
            status,
            block_number: Some(1),
            gas_used: 21_000,
        })
    }
}
