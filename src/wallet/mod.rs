//! Secure wallet management
//!
//! This module handles private key storage and transaction signing.
//! The private key never leaves this module.

mod signer;
mod transaction;

pub use signer::SecureWallet;
pub use transaction::{PendingTransaction, TransactionReceipt, TxStatus};

use crate::Result;
use secrecy::SecretString;

/// Where the signing key comes from
///
/// Resolved lazily so a missing key only fails the actions that sign.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Hex private key read from this environment variable
    Env(String),
    /// Hex private key held in memory
    Static(SecretString),
}

impl Credentials {
    pub fn load(&self) -> Result<SecureWallet> {
        match self {
            Credentials::Env(var) => SecureWallet::from_env(var),
            Credentials::Static(key) => SecureWallet::from_secret(key),
        }
    }

    /// Whether a key is available without loading it
    pub fn is_present(&self) -> bool {
        match self {
            Credentials::Env(var) => std::env::var(var).is_ok_and(|v| !v.trim().is_empty()),
            Credentials::Static(_) => true,
        }
    }
}
