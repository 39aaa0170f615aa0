//! Transaction and receipt types passed between the action layer and the chain client

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::Serialize;

/// A fully-populated legacy transaction ready for signing
///
/// Every field is fixed before the wallet sees it; the signer only adds
/// the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Execution status reported by a mined receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Failure,
}

/// Record of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionReceipt {
    pub tx_hash: TxHash,
    pub status: TxStatus,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}
