//! Read-only calls to verified contracts
//!
//! ABIs come from an Etherscan-compatible explorer API. Calls are encoded
//! from the ABI at runtime, executed with `eth_call`, and their outputs
//! rendered as JSON.

use crate::chain::{CallRequest, ChainClient};
use crate::{Error, Result};
use alloy::dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi, Param, StateMutability};
use alloy::primitives::{Address, U256};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct ScannerResponse {
    status: String,
    message: Option<String>,
    result: Value,
}

/// Fetches verified contract ABIs from a block explorer
#[derive(Debug, Clone)]
pub struct AbiClient {
    http: Client,
    base_url: String,
    chain_id: u64,
    api_key: Option<SecretString>,
}

impl AbiClient {
    pub fn new(base_url: &str, chain_id: u64, api_key: Option<SecretString>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            chain_id,
            api_key,
        })
    }

    pub async fn fetch_abi(&self, contract: Address) -> Result<JsonAbi> {
        let mut query = vec![
            ("chainid", self.chain_id.to_string()),
            ("module", "contract".to_string()),
            ("action", "getabi".to_string()),
            ("address", contract.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.expose_secret().to_string()));
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("ABI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Connection(format!(
                "ABI request returned HTTP {}",
                status
            )));
        }

        let body: ScannerResponse = response
            .json()
            .await
            .map_err(|e| Error::AbiUnavailable(format!("Malformed explorer response: {}", e)))?;

        let result = body.result.as_str().unwrap_or_default();
        if body.status != "1" {
            let message = body.message.unwrap_or_default();
            return Err(Error::AbiUnavailable(format!("{} ({})", result, message)));
        }

        let abi: JsonAbi = serde_json::from_str(result)
            .map_err(|e| Error::AbiUnavailable(format!("Explorer returned an invalid ABI: {}", e)))?;
        debug!(%contract, functions = abi.functions().count(), "Fetched contract ABI");
        Ok(abi)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl From<&Param> for ParamInfo {
    fn from(param: &Param) -> Self {
        Self {
            name: param.name.clone(),
            ty: param.selector_type().into_owned(),
        }
    }
}

/// One entry of a contract's function listing, numbered from 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub index: usize,
    pub name: String,
    pub signature: String,
    pub inputs: Vec<ParamInfo>,
    pub outputs: Vec<ParamInfo>,
    pub state_mutability: StateMutability,
}

/// Lists and calls functions of verified contracts
pub struct ContractReader {
    chain: Arc<dyn ChainClient>,
    abis: AbiClient,
}

impl ContractReader {
    pub fn new(chain: Arc<dyn ChainClient>, abis: AbiClient) -> Self {
        Self { chain, abis }
    }

    pub async fn list_functions(&self, contract: Address) -> Result<Vec<FunctionInfo>> {
        let abi = self.abis.fetch_abi(contract).await?;
        Ok(abi
            .functions()
            .enumerate()
            .map(|(i, f)| FunctionInfo {
                index: i + 1,
                name: f.name.clone(),
                signature: f.signature(),
                inputs: f.inputs.iter().map(ParamInfo::from).collect(),
                outputs: f.outputs.iter().map(ParamInfo::from).collect(),
                state_mutability: f.state_mutability,
            })
            .collect())
    }

    /// Call `method` with JSON `args` and decode its outputs
    ///
    /// `method` is a function name, or a full signature such as
    /// `balanceOf(address)` to pick one overload. A single output is returned
    /// bare, several as an array, none as `null`. Integers are rendered as
    /// decimal strings.
    pub async fn call(&self, contract: Address, method: &str, args: &[Value]) -> Result<Value> {
        let abi = self.abis.fetch_abi(contract).await?;
        let (function, data) = encode_call(&abi, method, args)?;

        if !matches!(
            function.state_mutability,
            StateMutability::View | StateMutability::Pure
        ) {
            warn!(%contract, method, "Function can change state; its result is only simulated");
        }

        let output = self
            .chain
            .call(&CallRequest {
                from: Address::ZERO,
                to: contract,
                value: U256::ZERO,
                data: data.into(),
            })
            .await?;

        let values = function
            .abi_decode_output(&output)
            .map_err(|e| Error::ContractCall(format!("Cannot decode {} output: {}", method, e)))?;

        Ok(match values.as_slice() {
            [] => Value::Null,
            [single] => to_json(single),
            many => Value::Array(many.iter().map(to_json).collect()),
        })
    }
}

/// Pick the overload matching `method` and `args`, and ABI-encode the call
fn encode_call<'a>(abi: &'a JsonAbi, method: &str, args: &[Value]) -> Result<(&'a Function, Vec<u8>)> {
    let name = method.split('(').next().unwrap_or(method).trim();
    let overloads = abi
        .function(name)
        .ok_or_else(|| Error::InvalidArgument(format!("Contract has no function {}", name)))?;

    let mut last_error = None;
    for function in overloads {
        let matches = if method.contains('(') {
            function.signature() == method.replace(' ', "")
        } else {
            function.inputs.len() == args.len()
        };
        if !matches {
            continue;
        }

        match coerce_args(&function.inputs, args).and_then(|values| {
            function
                .abi_encode_input(&values)
                .map_err(|e| Error::InvalidArgument(format!("Cannot encode {}: {}", method, e)))
        }) {
            Ok(data) => return Ok((function, data)),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        Error::InvalidArgument(format!(
            "No overload of {} takes {} argument(s)",
            name,
            args.len()
        ))
    }))
}

fn coerce_args(params: &[Param], args: &[Value]) -> Result<Vec<DynSolValue>> {
    if params.len() != args.len() {
        return Err(Error::InvalidArgument(format!(
            "Expected {} argument(s), got {}",
            params.len(),
            args.len()
        )));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| Error::InvalidArgument(format!("Unsupported ABI type: {}", e)))?;
            ty.coerce_str(&arg_text(&ty, arg)).map_err(|e| {
                Error::InvalidArgument(format!("Bad value for {} ({}): {}", param.name, ty, e))
            })
        })
        .collect()
}

/// Render a JSON argument in the textual form `DynSolType::coerce_str` parses
fn arg_text(ty: &DynSolType, arg: &Value) -> String {
    match (ty, arg) {
        (DynSolType::Tuple(types), Value::Array(items)) => {
            let parts: Vec<String> = types
                .iter()
                .zip(items)
                .map(|(t, item)| arg_text(t, item))
                .collect();
            format!("({})", parts.join(", "))
        }
        (DynSolType::Array(inner) | DynSolType::FixedArray(inner, _), Value::Array(items)) => {
            let parts: Vec<String> = items.iter().map(|item| arg_text(inner, item)).collect();
            format!("[{}]", parts.join(", "))
        }
        (_, Value::String(s)) => s.trim().to_string(),
        (_, other) => other.to_string(),
    }
}

fn to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(alloy::hex::encode_prefixed(&word[..*size]))
        }
        DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
        DynSolValue::Function(function) => Value::String(function.to_string()),
        DynSolValue::Bytes(bytes) => Value::String(alloy::hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(to_json).collect())
        }
        #[allow(unreachable_patterns)]
        other => Value::String(format!("{:?}", other)),
    }
}
