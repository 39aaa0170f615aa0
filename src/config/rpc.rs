//! RPC endpoint configuration
//!
//! Resolution order, per chain:
//! 1. Per-chain env vars (SONIC_RPC_URL, ETH_RPC_URL, ...) - highest priority
//! 2. ALCHEMY_API_KEY - builds URLs for the chains Alchemy serves
//! 3. Public RPC fallbacks - for testing only
//!
//! # Examples
//!
//! ```bash
//! # Option 1: Per-chain URLs (recommended for production)
//! export SONIC_RPC_URL="https://sonic-mainnet.g.alchemy.com/v2/YOUR_KEY"
//!
//! # Option 2: Single provider API key
//! export ALCHEMY_API_KEY="YOUR_KEY"
//!
//! # Option 3: No env vars - uses public RPCs (rate limited, for testing only)
//! ```

use std::collections::HashMap;

/// RPC configuration for multiple chains
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// RPC URLs indexed by chain ID
    urls: HashMap<u64, String>,
}

/// Chain ID constants
pub mod chains {
    pub const SONIC: u64 = 146;
    pub const SONIC_TESTNET: u64 = 57054;
    pub const ETHEREUM: u64 = 1;
    pub const ARBITRUM: u64 = 42161;
    pub const BASE: u64 = 8453;
}

/// Environment variable names
mod env_vars {
    // Per-chain URLs (highest priority)
    pub const SONIC_RPC_URL: &str = "SONIC_RPC_URL";
    pub const SONIC_TESTNET_RPC_URL: &str = "SONIC_TESTNET_RPC_URL";
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const ARBITRUM_RPC_URL: &str = "ARBITRUM_RPC_URL";
    pub const BASE_RPC_URL: &str = "BASE_RPC_URL";

    // Provider API keys
    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
}

/// Public RPC endpoints (rate limited, for testing only)
mod public_rpcs {
    pub const SONIC: &str = "https://rpc.soniclabs.com";
    pub const SONIC_TESTNET: &str = "https://rpc.blaze.soniclabs.com";
    pub const ETHEREUM: &str = "https://eth.llamarpc.com";
    pub const ARBITRUM: &str = "https://arb1.arbitrum.io/rpc";
    pub const BASE: &str = "https://mainnet.base.org";
}

const PER_CHAIN_VARS: [(u64, &str); 5] = [
    (chains::SONIC, env_vars::SONIC_RPC_URL),
    (chains::SONIC_TESTNET, env_vars::SONIC_TESTNET_RPC_URL),
    (chains::ETHEREUM, env_vars::ETH_RPC_URL),
    (chains::ARBITRUM, env_vars::ARBITRUM_RPC_URL),
    (chains::BASE, env_vars::BASE_RPC_URL),
];

const PUBLIC_FALLBACKS: [(u64, &str); 5] = [
    (chains::SONIC, public_rpcs::SONIC),
    (chains::SONIC_TESTNET, public_rpcs::SONIC_TESTNET),
    (chains::ETHEREUM, public_rpcs::ETHEREUM),
    (chains::ARBITRUM, public_rpcs::ARBITRUM),
    (chains::BASE, public_rpcs::BASE),
];

impl RpcConfig {
    /// Create RPC config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create RPC config from an arbitrary variable source
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut urls = HashMap::new();

        // Priority 1: Check per-chain env vars
        for (chain_id, var) in PER_CHAIN_VARS {
            if let Some(url) = lookup(var) {
                tracing::debug!(chain_id, var, "Using per-chain RPC URL");
                urls.insert(chain_id, url);
            }
        }

        // Priority 2: Fill gaps from ALCHEMY_API_KEY
        if let Some(key) = lookup(env_vars::ALCHEMY_API_KEY) {
            tracing::info!("Building missing RPC URLs from ALCHEMY_API_KEY");
            let alchemy = [
                (chains::SONIC, "sonic-mainnet"),
                (chains::SONIC_TESTNET, "sonic-blaze"),
                (chains::ETHEREUM, "eth-mainnet"),
                (chains::ARBITRUM, "arb-mainnet"),
                (chains::BASE, "base-mainnet"),
            ];
            for (chain_id, subdomain) in alchemy {
                urls.entry(chain_id)
                    .or_insert_with(|| format!("https://{}.g.alchemy.com/v2/{}", subdomain, key));
            }
        }

        // Priority 3: Fall back to public RPCs for any missing chains
        for (chain_id, url) in PUBLIC_FALLBACKS {
            urls.entry(chain_id).or_insert_with(|| {
                tracing::warn!(chain_id, "No RPC configured, using public RPC (rate limited)");
                url.to_string()
            });
        }

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<u64, String>) -> Self {
        Self { urls }
    }

    /// Get RPC URL for a chain
    pub fn get(&self, chain_id: u64) -> Option<&str> {
        self.urls.get(&chain_id).map(|s| s.as_str())
    }

    /// Check if a chain is configured
    pub fn has_chain(&self, chain_id: u64) -> bool {
        self.urls.contains_key(&chain_id)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_public_rpc_fallbacks() {
        let config = RpcConfig::from_lookup(vars(&[]));

        assert_eq!(config.get(chains::SONIC), Some(public_rpcs::SONIC));
        assert_eq!(config.get(chains::ETHEREUM), Some(public_rpcs::ETHEREUM));
        assert!(config.has_chain(chains::SONIC_TESTNET));
        assert!(config.has_chain(chains::ARBITRUM));
        assert!(config.has_chain(chains::BASE));
    }

    #[test]
    fn test_per_chain_var_wins_over_alchemy() {
        let config = RpcConfig::from_lookup(vars(&[
            ("SONIC_RPC_URL", "https://custom.sonic"),
            ("ALCHEMY_API_KEY", "abc"),
        ]));

        assert_eq!(config.get(chains::SONIC), Some("https://custom.sonic"));
        assert_eq!(
            config.get(chains::ETHEREUM),
            Some("https://eth-mainnet.g.alchemy.com/v2/abc")
        );
    }

    #[test]
    fn test_get_returns_url() {
        let mut urls = HashMap::new();
        urls.insert(146, "https://custom.rpc".to_string());
        let config = RpcConfig::with_urls(urls);

        assert_eq!(config.get(146), Some("https://custom.rpc"));
        assert_eq!(config.get(999), None);
    }
}
