//! DEX aggregator client
//!
//! Speaks the KyberSwap-style HTTP API: `GET /routes` quotes a route,
//! `POST /route/build` turns it into router calldata. Both endpoints wrap
//! their payload in a `{code, message, data}` envelope.

mod types;

pub use types::SwapRoute;

use crate::tokens::TokenDescriptor;
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use types::{ApiResponse, BuildData, BuildRequest, RouteData};

/// Seconds a built swap stays valid
pub const DEFAULT_DEADLINE_SECS: i64 = 1200;

const CLIENT_ID_HEADER: &str = "x-client-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a non-success aggregator reply is reported
enum Stage {
    Route,
    Build,
}

impl Stage {
    fn error(&self, detail: String) -> Error {
        match self {
            Stage::Route => Error::RouteNotFound(detail),
            Stage::Build => Error::EncodingFailed(detail),
        }
    }
}

/// HTTP client for one chain's aggregator API
#[derive(Debug, Clone)]
pub struct AggregatorClient {
    http: Client,
    base_url: String,
    client_id: String,
    deadline_secs: i64,
}

impl AggregatorClient {
    /// `base_url` already includes the chain segment, e.g.
    /// `https://aggregator-api.kyberswap.com/sonic/api/v1`
    pub fn new(base_url: &str, client_id: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            deadline_secs: DEFAULT_DEADLINE_SECS,
        })
    }

    pub fn with_deadline_secs(mut self, deadline_secs: i64) -> Self {
        self.deadline_secs = deadline_secs;
        self
    }

    /// Quote a route for selling `amount_in` (human-readable) of `token_in`
    pub async fn get_route(
        &self,
        token_in: &TokenDescriptor,
        token_out: Address,
        amount_in: &str,
    ) -> Result<SwapRoute> {
        let amount_raw = token_in.to_raw(amount_in)?;

        tracing::debug!(
            token_in = %token_in.address,
            %token_out,
            %amount_raw,
            "Requesting swap route"
        );

        let response = self
            .http
            .get(format!("{}/routes", self.base_url))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .query(&[
                ("tokenIn", token_in.address.to_string()),
                ("tokenOut", token_out.to_string()),
                ("amountIn", amount_raw.to_string()),
                ("gasInclude", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Connection(format!("Route request failed: {}", e)))?;

        let data: RouteData = Self::unwrap_envelope(response, Stage::Route).await?;

        let summary = data
            .route_summary
            .filter(|s| !s.is_null())
            .ok_or_else(|| Error::RouteNotFound("Response carried no route summary".into()))?;
        let router_address = data
            .router_address
            .ok_or_else(|| Error::RouteNotFound("Response carried no router address".into()))?;

        Ok(SwapRoute {
            router_address,
            summary,
            token_in: token_in.address,
            token_out,
            amount_in: amount_raw,
        })
    }

    /// Build router calldata for a quoted route
    pub async fn encode_route(
        &self,
        route: &SwapRoute,
        sender: Address,
        recipient: Address,
        slippage_bps: u32,
    ) -> Result<Bytes> {
        let deadline = chrono::Utc::now().timestamp() + self.deadline_secs;
        let body = BuildRequest {
            route_summary: &route.summary,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            slippage_tolerance: slippage_bps,
            deadline,
            source: &self.client_id,
        };

        let response = self
            .http
            .post(format!("{}/route/build", self.base_url))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("Route build request failed: {}", e)))?;

        let data: BuildData = Self::unwrap_envelope(response, Stage::Build).await?;

        let encoded = data
            .data
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::EncodingFailed("Response carried no calldata".into()))?;

        alloy::hex::decode(&encoded)
            .map(Bytes::from)
            .map_err(|e| Error::EncodingFailed(format!("Calldata is not hex: {}", e)))
    }

    /// Judge a reply by its envelope; the HTTP status only matters when the body is unreadable
    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        stage: Stage,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Connection(format!("Failed to read aggregator response: {}", e)))?;

        let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(stage.error(format!("Malformed aggregator response: {}", e)))
            }
            Err(_) => return Err(stage.error(format!("Aggregator returned HTTP {}", status))),
        };

        if envelope.code != 0 {
            return Err(stage.error(envelope.describe_failure()));
        }

        envelope
            .data
            .ok_or_else(|| stage.error("Response carried no data".to_string()))
    }
}
