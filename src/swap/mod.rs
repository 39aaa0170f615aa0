//! Token swaps routed through a DEX aggregator

mod approval;
mod orchestrator;

pub use approval::ApprovalManager;
pub use orchestrator::SwapOrchestrator;

/// Slippage tolerance used when a caller does not give one (1%)
pub const DEFAULT_SLIPPAGE_BPS: u32 = 100;

/// Gas limit used when estimating the swap transaction fails
pub const FALLBACK_GAS_LIMIT: u64 = 500_000;
