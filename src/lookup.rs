//! Ticker → token address lookup via DexScreener search

use crate::config::Network;
use crate::tokens::NATIVE_TOKEN;
use crate::{Error, Result};
use alloy::primitives::Address;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    chain_id: String,
    base_token: BaseToken,
    #[serde(default)]
    fdv: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    address: String,
    symbol: String,
}

/// Resolves tickers to addresses on one network
#[derive(Debug, Clone)]
pub struct TokenLookup {
    http: Client,
    base_url: String,
    network: Network,
}

impl TokenLookup {
    pub fn new(base_url: &str, network: Network) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            network,
        })
    }

    /// Find the most valuable token on this network whose symbol is `ticker`
    ///
    /// The network's own currency symbol resolves to [`NATIVE_TOKEN`]
    /// without a request.
    pub async fn by_ticker(&self, ticker: &str) -> Result<Option<Address>> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(Error::InvalidArgument("Ticker must not be empty".to_string()));
        }
        if ticker.eq_ignore_ascii_case(self.network.native_symbol()) {
            return Ok(Some(NATIVE_TOKEN));
        }

        let response = self
            .http
            .get(format!("{}/latest/dex/search", self.base_url))
            .query(&[("q", ticker)])
            .send()
            .await
            .map_err(|e| Error::Connection(format!("Token lookup failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Connection(format!(
                "Token lookup returned HTTP {}",
                status
            )));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Connection(format!("Malformed token lookup response: {}", e)))?;

        let chain = self.network.dexscreener_slug();
        let mut pairs: Vec<Pair> = search
            .pairs
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.chain_id == chain)
            .collect();
        pairs.sort_by(|a, b| {
            b.fdv
                .unwrap_or(0.0)
                .total_cmp(&a.fdv.unwrap_or(0.0))
        });

        let found = pairs
            .iter()
            .filter(|p| p.base_token.symbol.eq_ignore_ascii_case(ticker))
            .find_map(|p| p.base_token.address.parse::<Address>().ok());

        match found {
            Some(address) => tracing::debug!(ticker, %address, "Resolved ticker"),
            None => tracing::debug!(ticker, chain, "No token found for ticker"),
        }
        Ok(found)
    }
}
