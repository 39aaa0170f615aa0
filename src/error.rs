//! Error types for chain actions

use alloy::primitives::TxHash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Insufficient {token} balance. Required: {required}, Available: {available}")]
    InsufficientBalance {
        token: String,
        required: String,
        available: String,
    },

    #[error("No swap route found: {0}")]
    RouteNotFound(String),

    #[error("Swap encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Contract ABI unavailable: {0}")]
    AbiUnavailable(String),

    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Approval transaction {tx_hash} failed")]
    ApprovalFailed { tx_hash: TxHash },

    #[error("Swap transaction {tx_hash} failed")]
    SwapFailed { tx_hash: TxHash },

    #[error("Transfer transaction {tx_hash} failed")]
    TransferFailed { tx_hash: TxHash },

    /// The transaction was broadcast but not seen mined in time. It may still confirm.
    #[error("Transaction {tx_hash} not confirmed after {waited_secs}s; it may still be mined")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Interceptor blocked: {0}")]
    Blocked(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the on-chain outcome is not known locally.
    pub fn outcome_unknown(&self) -> bool {
        matches!(self, Error::ConfirmationTimeout { .. })
    }

    /// Hash of the transaction this error refers to, if one was broadcast.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Error::ApprovalFailed { tx_hash }
            | Error::SwapFailed { tx_hash }
            | Error::TransferFailed { tx_hash }
            | Error::ConfirmationTimeout { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
