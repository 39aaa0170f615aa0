//! Slippage guard interceptor
//!
//! Blocks swaps that request more slippage than the configured maximum.

use super::{ActionContext, ActionInterceptor, InterceptorDecision};
use crate::actions::ActionName;
use crate::swap::DEFAULT_SLIPPAGE_BPS;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Interceptor that blocks swaps with excessive slippage
pub struct SlippageGuardInterceptor {
    /// Maximum allowed slippage in basis points (100 = 1%)
    max_slippage_bps: u32,
    /// Slippage a swap gets when it does not ask for one
    default_slippage_bps: u32,
}

impl SlippageGuardInterceptor {
    pub fn new(max_slippage_bps: u32) -> Self {
        Self {
            max_slippage_bps,
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }

    pub fn with_default_slippage(mut self, default_slippage_bps: u32) -> Self {
        self.default_slippage_bps = default_slippage_bps;
        self
    }
}

#[async_trait]
impl ActionInterceptor for SlippageGuardInterceptor {
    async fn before_action(&self, context: &ActionContext) -> Result<InterceptorDecision> {
        if context.action != ActionName::Swap {
            return Ok(InterceptorDecision::Allow);
        }

        // Unparseable values are left for the action's own validation
        let slippage = context
            .params
            .get("slippage_bps")
            .and_then(Value::as_u64)
            .unwrap_or(u64::from(self.default_slippage_bps));

        if slippage > u64::from(self.max_slippage_bps) {
            return Ok(InterceptorDecision::Block(format!(
                "Requested slippage {} bps exceeds maximum allowed {} bps",
                slippage, self.max_slippage_bps
            )));
        }

        tracing::debug!(
            requested_slippage_bps = slippage,
            max_slippage_bps = self.max_slippage_bps,
            "Slippage check passed"
        );

        Ok(InterceptorDecision::Allow)
    }

    async fn after_action(
        &self,
        _context: &ActionContext,
        _result: &Result<Value>,
        _duration_ms: u64,
    ) {
    }
}
