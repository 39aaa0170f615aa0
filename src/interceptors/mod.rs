//! Risk management and audit interceptors
//!
//! Every action dispatched through `EvmConnection` passes through this
//! pipeline. Interceptors can block an action before it runs and observe its
//! result afterwards.

mod audit_log;
mod slippage_guard;

pub use audit_log::AuditLogInterceptor;
pub use slippage_guard::SlippageGuardInterceptor;

use crate::actions::ActionName;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// What an interceptor sees about one action invocation
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Correlates the start and completion of one invocation
    pub id: Uuid,
    pub action: ActionName,
    pub params: Value,
}

impl ActionContext {
    pub fn new(action: ActionName, params: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptorDecision {
    Allow,
    Block(String),
}

#[async_trait]
pub trait ActionInterceptor: Send + Sync {
    async fn before_action(&self, context: &ActionContext) -> Result<InterceptorDecision>;

    async fn after_action(&self, context: &ActionContext, result: &Result<Value>, duration_ms: u64);
}

/// Ordered set of interceptors; the first block wins
#[derive(Default, Clone)]
pub struct InterceptorPipeline {
    interceptors: Vec<Arc<dyn ActionInterceptor>>,
}

impl InterceptorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, interceptor: impl ActionInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub async fn before(&self, context: &ActionContext) -> Result<InterceptorDecision> {
        for interceptor in &self.interceptors {
            if let InterceptorDecision::Block(reason) = interceptor.before_action(context).await? {
                return Ok(InterceptorDecision::Block(reason));
            }
        }
        Ok(InterceptorDecision::Allow)
    }

    pub async fn after(&self, context: &ActionContext, result: &Result<Value>, duration_ms: u64) {
        for interceptor in &self.interceptors {
            interceptor.after_action(context, result, duration_ms).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn first_block_wins() {
        let pipeline = InterceptorPipeline::new()
            .with(SlippageGuardInterceptor::new(100))
            .with(SlippageGuardInterceptor::new(10));

        let context = ActionContext::new(ActionName::Swap, json!({ "slippage_bps": 200 }));
        match pipeline.before(&context).await.unwrap() {
            InterceptorDecision::Block(reason) => assert!(reason.contains("100 bps")),
            InterceptorDecision::Allow => panic!("expected block"),
        }
    }

    #[tokio::test]
    async fn empty_pipeline_allows() {
        let pipeline = InterceptorPipeline::new();
        let context = ActionContext::new(ActionName::GetBalance, json!({}));
        assert_eq!(
            pipeline.before(&context).await.unwrap(),
            InterceptorDecision::Allow
        );
    }
}
