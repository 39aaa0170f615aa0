//! DeFi Actions
//!
//! Agent-facing actions for an EVM chain:
//! - Look up tokens by ticker and read balances
//! - Send native currency or ERC-20 tokens
//! - Swap through a DEX aggregator, approving the router when needed
//! - List and call functions of verified contracts
//!
//! # Security Model
//!
//! - Private keys are loaded on demand and never leave the wallet module
//! - All actions pass through the interceptor pipeline
//! - Every action start and completion is written to a JSONL audit trail

pub mod actions;
pub mod aggregator;
pub mod chain;
pub mod config;
pub mod contract;
pub mod interceptors;
pub mod lookup;
pub mod swap;
pub mod tokens;
pub mod transfer;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use actions::{ActionName, EvmConnection};
pub use aggregator::{AggregatorClient, SwapRoute};
pub use chain::{AlloyChainClient, ChainClient};
pub use config::{Config, Network, RpcConfig};
pub use error::{Error, Result};
pub use lookup::TokenLookup;
pub use swap::{ApprovalManager, SwapOrchestrator};
pub use tokens::{TokenDescriptor, NATIVE_TOKEN};
pub use transfer::Transfers;
pub use wallet::{Credentials, SecureWallet, TransactionReceipt};
