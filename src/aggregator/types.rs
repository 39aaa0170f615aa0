//! Aggregator wire types

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope shared by every aggregator endpoint; `code == 0` is success
#[derive(Debug, Deserialize)]
pub(super) struct ApiResponse<T> {
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn describe_failure(&self) -> String {
        match &self.message {
            Some(message) if !message.is_empty() => format!("{} (code {})", message, self.code),
            _ => format!("code {}", self.code),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RouteData {
    #[serde(default)]
    pub route_summary: Option<Value>,
    #[serde(default)]
    pub router_address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuildData {
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BuildRequest<'a> {
    pub route_summary: &'a Value,
    pub sender: String,
    pub recipient: String,
    pub slippage_tolerance: u32,
    pub deadline: i64,
    pub source: &'a str,
}

/// A route quoted by the aggregator
///
/// The summary is opaque and must be handed back unchanged to
/// [`super::AggregatorClient::encode_route`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapRoute {
    pub router_address: Address,
    pub summary: Value,
    pub token_in: Address,
    pub token_out: Address,
    /// Input amount in raw units
    pub amount_in: U256,
}

impl SwapRoute {
    /// Expected output in raw units, when the summary reports one
    pub fn amount_out(&self) -> Option<U256> {
        self.summary
            .get("amountOut")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }
}
