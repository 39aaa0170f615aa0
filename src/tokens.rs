//! Token descriptors and amount conversion
//!
//! Amounts cross the action boundary as human-readable decimals ("1.5") and
//! are converted to raw integer units with the token's on-chain decimals
//! before any chain or aggregator call.

use crate::{Error, Result};
use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::{address, Address, U256};
use serde::Serialize;

/// Sentinel address standing for the chain's base currency
pub const NATIVE_TOKEN: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// Decimals of every supported chain's base currency
pub const NATIVE_DECIMALS: u8 = 18;

/// Well-known token addresses per chain
pub mod addresses {
    use super::*;

    // === Sonic ===
    pub const WS_SONIC: Address = address!("039e2fb66102314ce7b64ce5ce3e5183bc94ad38");

    // === Ethereum Mainnet ===
    pub const WETH_ETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    // === Arbitrum ===
    pub const WETH_ARB: Address = address!("82af49447d8a07e3bd95bd0d56f35241523fbab1");

    // === Base ===
    pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");
}

/// Whether an address is the native-currency sentinel
pub fn is_native(token: &Address) -> bool {
    *token == NATIVE_TOKEN
}

/// Token metadata; immutable once fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenDescriptor {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
}

impl TokenDescriptor {
    /// Descriptor for the chain's base currency
    pub fn native(symbol: &str) -> Self {
        Self {
            address: NATIVE_TOKEN,
            decimals: NATIVE_DECIMALS,
            symbol: symbol.to_string(),
        }
    }

    pub fn is_native(&self) -> bool {
        is_native(&self.address)
    }

    /// Convert a human-readable amount into raw units
    pub fn to_raw(&self, amount: &str) -> Result<U256> {
        parse_amount(amount, self.decimals)
    }

    /// Format raw units as a human-readable amount
    pub fn format(&self, raw: U256) -> String {
        format_units(raw, self.decimals)
    }
}

/// Parse a positive decimal amount into raw integer units
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let trimmed = amount.trim();
    let parsed = parse_units(trimmed, decimals)
        .map_err(|e| Error::InvalidArgument(format!("Invalid amount '{}': {}", amount, e)))?;

    let raw = match parsed {
        ParseUnits::U256(raw) => raw,
        ParseUnits::I256(_) => {
            return Err(Error::InvalidArgument(format!(
                "Amount must not be negative: {}",
                amount
            )))
        }
    };

    if raw.is_zero() {
        return Err(Error::InvalidArgument(
            "Amount must be greater than zero".to_string(),
        ));
    }
    Ok(raw)
}

/// Format a U256 value with decimals
pub fn format_units(value: U256, decimals: u8) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let remainder_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = remainder_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}
