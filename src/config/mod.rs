//! Configuration for the chain action layer

pub mod rpc;

use crate::tokens::addresses;
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Default environment variable holding the hex private key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// KyberSwap-compatible aggregator base URL; the chain slug is appended.
pub const DEFAULT_AGGREGATOR_BASE: &str = "https://aggregator-api.kyberswap.com";

/// DexScreener API used for ticker lookups
pub const DEFAULT_TOKEN_LOOKUP_API: &str = "https://api.dexscreener.com";

/// Etherscan multichain API used for contract ABIs; the chain id is sent per request
pub const DEFAULT_SCANNER_API: &str = "https://api.etherscan.io/v2/api";

/// Default environment variable holding the block explorer API key
pub const SCANNER_KEY_ENV: &str = "SCANNER_API_KEY";

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    Sonic,
    SonicTestnet,
    Ethereum,
    Arbitrum,
    Base,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Sonic => rpc::chains::SONIC,
            Network::SonicTestnet => rpc::chains::SONIC_TESTNET,
            Network::Ethereum => rpc::chains::ETHEREUM,
            Network::Arbitrum => rpc::chains::ARBITRUM,
            Network::Base => rpc::chains::BASE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Sonic => "sonic",
            Network::SonicTestnet => "sonic_testnet",
            Network::Ethereum => "ethereum",
            Network::Arbitrum => "arbitrum",
            Network::Base => "base",
        }
    }

    /// Symbol of the chain's base currency
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Network::Sonic | Network::SonicTestnet => "S",
            Network::Ethereum | Network::Arbitrum | Network::Base => "ETH",
        }
    }

    pub fn default_explorer_url(&self) -> &'static str {
        match self {
            Network::Sonic => "https://sonicscan.org",
            Network::SonicTestnet => "https://testnet.sonicscan.org",
            Network::Ethereum => "https://etherscan.io",
            Network::Arbitrum => "https://arbiscan.io",
            Network::Base => "https://basescan.org",
        }
    }

    /// Path segment used by the aggregator API, if the aggregator serves this chain
    pub fn aggregator_slug(&self) -> Option<&'static str> {
        match self {
            Network::Sonic => Some("sonic"),
            Network::SonicTestnet => None,
            Network::Ethereum => Some("ethereum"),
            Network::Arbitrum => Some("arbitrum"),
            Network::Base => Some("base"),
        }
    }

    /// `chainId` value DexScreener reports for pairs on this network
    pub fn dexscreener_slug(&self) -> &'static str {
        match self {
            Network::Sonic | Network::SonicTestnet => "sonic",
            Network::Ethereum => "ethereum",
            Network::Arbitrum => "arbitrum",
            Network::Base => "base",
        }
    }

    /// Wrapped native token contract (accepts `deposit()`)
    pub fn wrapped_native(&self) -> Option<Address> {
        match self {
            Network::Sonic => Some(addresses::WS_SONIC),
            Network::SonicTestnet => None,
            Network::Ethereum => Some(addresses::WETH_ETH),
            Network::Arbitrum => Some(addresses::WETH_ARB),
            Network::Base => Some(addresses::WETH_BASE),
        }
    }

    /// Link to a transaction on a block explorer
    pub fn explorer_tx_url(explorer_url: &str, tx_hash: &TxHash) -> String {
        format!("{}/tx/{}", explorer_url.trim_end_matches('/'), tx_hash)
    }
}

/// Confirmation wait settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Give up waiting after this many seconds (the transaction may still be mined)
    pub timeout_secs: u64,
    /// Blocks required on top of the inclusion block, counting it
    pub confirmations: u64,
    /// Receipt polling interval (milliseconds)
    pub poll_interval_ms: u64,
}

impl ConfirmationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "confirmation.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "confirmation.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 150, // 2.5 minutes
            confirmations: 1,
            poll_interval_ms: 2_000,
        }
    }
}

/// Risk management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum slippage tolerance a swap may request (basis points)
    pub max_slippage_bps: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_slippage_bps: 500, // 5%
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network to operate on
    pub network: Network,
    /// RPC URL override (otherwise resolved from the environment)
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Block explorer override
    #[serde(default)]
    pub explorer_url: Option<String>,
    /// Aggregator API override, including the chain path segment
    #[serde(default)]
    pub aggregator_api: Option<String>,
    /// Token lookup API base
    #[serde(default = "default_token_lookup_api")]
    pub token_lookup_api: String,
    /// Client id sent to the aggregator
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Environment variable holding the wallet private key
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
    /// Block explorer API serving verified contract ABIs
    #[serde(default)]
    pub scanner_api: Option<String>,
    /// Environment variable holding the block explorer API key
    #[serde(default = "default_scanner_key_env")]
    pub scanner_key_env: String,
    /// Seconds a built swap stays valid on the router
    #[serde(default = "default_swap_deadline_secs")]
    pub swap_deadline_secs: i64,
    /// Slippage used when a swap does not specify one (basis points)
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u32,
    /// Confirmation wait settings
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    /// Risk management settings
    #[serde(default)]
    pub risk: RiskConfig,
    /// Path to audit log file
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

fn default_token_lookup_api() -> String {
    DEFAULT_TOKEN_LOOKUP_API.to_string()
}

fn default_client_id() -> String {
    "defi-actions".to_string()
}

fn default_private_key_env() -> String {
    PRIVATE_KEY_ENV.to_string()
}

fn default_scanner_key_env() -> String {
    SCANNER_KEY_ENV.to_string()
}

fn default_swap_deadline_secs() -> i64 {
    crate::aggregator::DEFAULT_DEADLINE_SECS
}

fn default_slippage_bps() -> u32 {
    crate::swap::DEFAULT_SLIPPAGE_BPS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Sonic,
            rpc_url: None,
            explorer_url: None,
            aggregator_api: None,
            token_lookup_api: default_token_lookup_api(),
            client_id: default_client_id(),
            private_key_env: default_private_key_env(),
            scanner_api: None,
            scanner_key_env: default_scanner_key_env(),
            swap_deadline_secs: default_swap_deadline_secs(),
            default_slippage_bps: default_slippage_bps(),
            confirmation: ConfirmationConfig::default(),
            risk: RiskConfig::default(),
            audit_log_path: Some("audit.jsonl".to_string()),
        }
    }
}

/// Concrete endpoints for one network after applying overrides
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub network: Network,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: String,
    pub aggregator_api: String,
    pub token_lookup_api: String,
    pub scanner_api: String,
}

impl Config {
    /// Resolve endpoints: explicit config values win over network defaults
    pub fn resolve(&self, rpc: &RpcConfig) -> Result<NetworkSettings> {
        self.confirmation.validate()?;
        if self.swap_deadline_secs <= 0 {
            return Err(Error::Config(
                "swap_deadline_secs must be greater than zero".to_string(),
            ));
        }

        let network = self.network;
        let chain_id = network.chain_id();

        let rpc_url = match &self.rpc_url {
            Some(url) => url.clone(),
            None => rpc
                .get(chain_id)
                .ok_or_else(|| {
                    Error::Config(format!("No RPC URL configured for {}", network.name()))
                })?
                .to_string(),
        };

        let aggregator_api = match (&self.aggregator_api, network.aggregator_slug()) {
            (Some(api), _) => api.clone(),
            (None, Some(slug)) => format!("{}/{}/api/v1", DEFAULT_AGGREGATOR_BASE, slug),
            (None, None) => {
                return Err(Error::Config(format!(
                    "No aggregator available for {}; set aggregator_api",
                    network.name()
                )))
            }
        };

        let scanner_api = self
            .scanner_api
            .clone()
            .unwrap_or_else(|| DEFAULT_SCANNER_API.to_string());

        for (field, value) in [
            ("rpc_url", &rpc_url),
            ("aggregator_api", &aggregator_api),
            ("token_lookup_api", &self.token_lookup_api),
            ("scanner_api", &scanner_api),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", field, value, e)))?;
        }

        Ok(NetworkSettings {
            network,
            chain_id,
            rpc_url,
            explorer_url: self
                .explorer_url
                .clone()
                .unwrap_or_else(|| network.default_explorer_url().to_string()),
            aggregator_api,
            token_lookup_api: self.token_lookup_api.clone(),
            scanner_api,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn rpc_for(network: Network) -> RpcConfig {
        let mut urls = HashMap::new();
        urls.insert(network.chain_id(), "https://rpc.example".to_string());
        RpcConfig::with_urls(urls)
    }

    #[test]
    fn config_deserialize_defaults() {
        let value = serde_json::json!({ "network": "sonic" });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.network, Network::Sonic);
        assert_eq!(parsed.default_slippage_bps, 100);
        assert_eq!(parsed.private_key_env, PRIVATE_KEY_ENV);
        assert_eq!(parsed.confirmation.timeout_secs, 150);
        assert_eq!(parsed.confirmation.confirmations, 1);
        assert_eq!(parsed.scanner_key_env, SCANNER_KEY_ENV);
        assert_eq!(parsed.swap_deadline_secs, 1200);
        assert!(parsed.audit_log_path.is_none());
    }

    #[test]
    fn config_deserialize_explicit() {
        let value = serde_json::json!({
            "network": "base",
            "explorer_url": "https://explorer.example",
            "default_slippage_bps": 50,
            "confirmation": { "timeout_secs": 30, "confirmations": 2, "poll_interval_ms": 500 },
            "risk": { "max_slippage_bps": 200 }
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.network, Network::Base);
        assert_eq!(parsed.default_slippage_bps, 50);
        assert_eq!(parsed.confirmation.timeout(), Duration::from_secs(30));
        assert_eq!(parsed.risk.max_slippage_bps, 200);
    }

    #[test]
    fn resolve_uses_network_defaults() {
        let config = Config::default();
        let settings = config.resolve(&rpc_for(Network::Sonic)).unwrap();

        assert_eq!(settings.chain_id, 146);
        assert_eq!(settings.rpc_url, "https://rpc.example");
        assert_eq!(settings.explorer_url, "https://sonicscan.org");
        assert_eq!(
            settings.aggregator_api,
            "https://aggregator-api.kyberswap.com/sonic/api/v1"
        );
        assert_eq!(settings.scanner_api, DEFAULT_SCANNER_API);
    }

    #[test]
    fn resolve_prefers_explicit_values() {
        let config = Config {
            rpc_url: Some("http://localhost:8545".to_string()),
            aggregator_api: Some("http://localhost:9000".to_string()),
            ..Config::default()
        };
        let settings = config.resolve(&RpcConfig::with_urls(HashMap::new())).unwrap();

        assert_eq!(settings.rpc_url, "http://localhost:8545");
        assert_eq!(settings.aggregator_api, "http://localhost:9000");
    }

    #[test]
    fn resolve_requires_aggregator_for_testnet() {
        let config = Config {
            network: Network::SonicTestnet,
            ..Config::default()
        };
        let err = config
            .resolve(&rpc_for(Network::SonicTestnet))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn resolve_rejects_invalid_url() {
        let config = Config {
            rpc_url: Some("not a url".to_string()),
            ..Config::default()
        };
        let err = config.resolve(&rpc_for(Network::Sonic)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn resolve_rejects_zero_confirmation_timings() {
        for confirmation in [
            ConfirmationConfig {
                timeout_secs: 0,
                ..ConfirmationConfig::default()
            },
            ConfirmationConfig {
                poll_interval_ms: 0,
                ..ConfirmationConfig::default()
            },
        ] {
            let config = Config {
                confirmation,
                ..Config::default()
            };
            let err = config.resolve(&rpc_for(Network::Sonic)).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
        }
    }

    #[test]
    fn explorer_link_format() {
        let hash = TxHash::repeat_byte(0x01);
        let link = Network::explorer_tx_url("https://sonicscan.org/", &hash);
        assert_eq!(link, format!("https://sonicscan.org/tx/{}", hash));
    }
}
