//! Agent-facing action surface
//!
//! Commands arrive as a kebab-case name plus a loose JSON keyword bag. The
//! name is resolved through [`ActionName`]; the bag is deserialized into the
//! action's typed parameters.

mod connection;

pub use connection::EvmConnection;

use crate::{Error, Result};
use alloy::primitives::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Every action the connection exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionName {
    GetTokenByTicker,
    GetBalance,
    Transfer,
    Swap,
    WrapNative,
    CallContract,
    ListContractFunctions,
}

impl ActionName {
    pub const ALL: [ActionName; 7] = [
        ActionName::GetTokenByTicker,
        ActionName::GetBalance,
        ActionName::Transfer,
        ActionName::Swap,
        ActionName::WrapNative,
        ActionName::CallContract,
        ActionName::ListContractFunctions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::GetTokenByTicker => "get-token-by-ticker",
            ActionName::GetBalance => "get-balance",
            ActionName::Transfer => "transfer",
            ActionName::Swap => "swap",
            ActionName::WrapNative => "wrap-native",
            ActionName::CallContract => "call-contract",
            ActionName::ListContractFunctions => "list-contract-functions",
        }
    }

    /// Whether the action signs and submits a transaction
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ActionName::Transfer | ActionName::Swap | ActionName::WrapNative
        )
    }

    /// Value returned by the collapsed boundary when the action fails
    pub fn failure_sentinel(&self) -> Value {
        if self.is_write() {
            Value::Bool(false)
        } else {
            Value::Null
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActionName::GetTokenByTicker => "Look up a token address by its ticker symbol",
            ActionName::GetBalance => "Get native or token balance of an address",
            ActionName::Transfer => "Send native currency or tokens to an address",
            ActionName::Swap => "Swap tokens through the DEX aggregator",
            ActionName::WrapNative => "Wrap native currency into its ERC-20 form",
            ActionName::CallContract => "Call a function of a verified contract without sending a transaction",
            ActionName::ListContractFunctions => "List the functions of a verified contract",
        }
    }
}

impl FromStr for ActionName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "get-token-by-ticker" => Ok(ActionName::GetTokenByTicker),
            "get-balance" => Ok(ActionName::GetBalance),
            "transfer" => Ok(ActionName::Transfer),
            "swap" => Ok(ActionName::Swap),
            "wrap-native" => Ok(ActionName::WrapNative),
            "call-contract" => Ok(ActionName::CallContract),
            "list-contract-functions" => Ok(ActionName::ListContractFunctions),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable amount given as a JSON string or number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountArg {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for AmountArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountArg::Text(s) => f.write_str(s.trim()),
            // serde_json renders 1e-7 in exponent form; f64's Display never does
            AmountArg::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
                (Some(u), _, _) => write!(f, "{}", u),
                (None, Some(i), _) => write!(f, "{}", i),
                (None, None, Some(x)) => write!(f, "{}", x),
                (None, None, None) => write!(f, "{}", n),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TickerParams {
    pub ticker: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceParams {
    /// Defaults to the configured account
    #[serde(default)]
    pub address: Option<Address>,
    /// Defaults to the native currency
    #[serde(default)]
    pub token_address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub struct TransferParams {
    pub to_address: Address,
    pub amount: AmountArg,
    #[serde(default)]
    pub token_address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub struct SwapParams {
    pub token_in: Address,
    pub token_out: Address,
    pub amount: AmountArg,
    /// Defaults to the configured slippage
    #[serde(default)]
    pub slippage_bps: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WrapParams {
    pub amount: AmountArg,
}

#[derive(Debug, Deserialize)]
pub struct CallContractParams {
    pub contract_address: Address,
    /// Function name, or a full signature to pick an overload
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ContractParams {
    pub contract_address: Address,
}

/// Deserialize an action's keyword bag; `null` counts as no arguments
pub fn parse_params<T: DeserializeOwned>(action: ActionName, params: &Value) -> Result<T> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params.clone()
    };
    serde_json::from_value(params)
        .map_err(|e| Error::InvalidArgument(format!("Invalid parameters for {}: {}", action, e)))
}
