//! Audit log interceptor
//!
//! Appends one JSON line per action start and completion.

use super::{ActionContext, ActionInterceptor, InterceptorDecision};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Entry in the audit log
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    entry_type: &'static str,
    id: Uuid,
    action: &'static str,
    params: &'a Value,
    result: Option<&'a Value>,
    error: Option<String>,
    duration_ms: u64,
    status: &'static str,
}

/// Writer for audit log entries
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Interceptor that logs all actions to a JSONL file
pub struct AuditLogInterceptor {
    writer: Arc<Mutex<AuditLogWriter>>,
}

impl AuditLogInterceptor {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter {
                path: log_path.into(),
            })),
        }
    }

    async fn record(&self, entry: AuditEntry<'_>) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

#[async_trait]
impl ActionInterceptor for AuditLogInterceptor {
    async fn before_action(&self, context: &ActionContext) -> Result<InterceptorDecision> {
        self.record(AuditEntry {
            timestamp: Utc::now(),
            entry_type: "action_start",
            id: context.id,
            action: context.action.as_str(),
            params: &context.params,
            result: None,
            error: None,
            duration_ms: 0,
            status: "pending",
        })
        .await;

        // Audit logging never blocks
        Ok(InterceptorDecision::Allow)
    }

    async fn after_action(&self, context: &ActionContext, result: &Result<Value>, duration_ms: u64) {
        let (result, error, status) = match result {
            Ok(v) => (Some(v), None, "success"),
            Err(e) if e.outcome_unknown() => (None, Some(e.to_string()), "unknown"),
            Err(e) => (None, Some(e.to_string()), "error"),
        };

        self.record(AuditEntry {
            timestamp: Utc::now(),
            entry_type: "action_complete",
            id: context.id,
            action: context.action.as_str(),
            params: &context.params,
            result,
            error,
            duration_ms,
            status,
        })
        .await;
    }
}
