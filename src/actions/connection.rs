//! EVM connection: resolves actions to swap, transfer and lookup operations

use super::{
    parse_params, ActionName, BalanceParams, CallContractParams, ContractParams, SwapParams,
    TickerParams, TransferParams, WrapParams,
};
use crate::aggregator::AggregatorClient;
use crate::chain::{describe_token, AlloyChainClient, ChainClient};
use crate::config::{Config, Network, NetworkSettings, RpcConfig};
use crate::contract::{AbiClient, ContractReader};
use crate::interceptors::{
    ActionContext, AuditLogInterceptor, InterceptorDecision, InterceptorPipeline,
    SlippageGuardInterceptor,
};
use crate::lookup::TokenLookup;
use crate::swap::SwapOrchestrator;
use crate::tokens::NATIVE_TOKEN;
use crate::transfer::Transfers;
use crate::wallet::{Credentials, TransactionReceipt};
use crate::{Error, Result};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// One configured account on one EVM network
pub struct EvmConnection {
    settings: NetworkSettings,
    chain: Arc<dyn ChainClient>,
    credentials: Credentials,
    swaps: SwapOrchestrator,
    transfers: Transfers,
    lookup: TokenLookup,
    contracts: ContractReader,
    interceptors: InterceptorPipeline,
    default_slippage_bps: u32,
}

impl EvmConnection {
    /// Connect over JSON-RPC using endpoints resolved from `config` and the environment
    pub fn from_config(config: &Config, rpc: &RpcConfig) -> Result<Self> {
        let settings = config.resolve(rpc)?;
        let chain = Arc::new(AlloyChainClient::connect(&settings.rpc_url)?);
        let credentials = Credentials::Env(config.private_key_env.clone());
        Self::with_chain(config, settings, chain, credentials)
    }

    /// Build on an existing chain client
    pub fn with_chain(
        config: &Config,
        settings: NetworkSettings,
        chain: Arc<dyn ChainClient>,
        credentials: Credentials,
    ) -> Result<Self> {
        let network = settings.network;
        let aggregator = AggregatorClient::new(&settings.aggregator_api, &config.client_id)?
            .with_deadline_secs(config.swap_deadline_secs);
        let lookup = TokenLookup::new(&settings.token_lookup_api, network)?;
        let scanner_key = std::env::var(&config.scanner_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);
        let contracts = ContractReader::new(
            chain.clone(),
            AbiClient::new(&settings.scanner_api, settings.chain_id, scanner_key)?,
        );

        let swaps = SwapOrchestrator::new(
            chain.clone(),
            aggregator,
            config.confirmation.clone(),
            network.native_symbol(),
        );
        let transfers = Transfers::new(
            chain.clone(),
            config.confirmation.clone(),
            network.native_symbol(),
            network.wrapped_native(),
        );

        let mut interceptors = InterceptorPipeline::new().with(
            SlippageGuardInterceptor::new(config.risk.max_slippage_bps)
                .with_default_slippage(config.default_slippage_bps),
        );
        if let Some(path) = &config.audit_log_path {
            interceptors = interceptors.with(AuditLogInterceptor::new(path));
        }

        Ok(Self {
            settings,
            chain,
            credentials,
            swaps,
            transfers,
            lookup,
            contracts,
            interceptors,
            default_slippage_bps: config.default_slippage_bps,
        })
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    /// Whether the signing key loads and the node answers for the expected chain
    pub async fn is_configured(&self) -> bool {
        if !self.credentials.is_present() {
            warn!("No private key configured");
            return false;
        }
        if let Err(e) = self.credentials.load() {
            warn!(error = %e, "Credentials not available");
            return false;
        }

        match self.chain.chain_id().await {
            Ok(id) if id == self.settings.chain_id => true,
            Ok(id) => {
                warn!(
                    expected = self.settings.chain_id,
                    actual = id,
                    "RPC endpoint serves a different chain"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "Chain connection check failed");
                false
            }
        }
    }

    /// Run an action and keep its structured error
    pub async fn perform(&self, action: ActionName, params: Value) -> Result<Value> {
        let context = ActionContext::new(action, params);
        let start = Instant::now();

        let result = match self.interceptors.before(&context).await {
            Ok(InterceptorDecision::Allow) => self.run(action, &context.params).await,
            Ok(InterceptorDecision::Block(reason)) => Err(Error::Blocked(reason)),
            Err(e) => Err(e),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        self.interceptors.after(&context, &result, duration_ms).await;
        result
    }

    /// Run a named command, collapsing any failure into the action's sentinel
    ///
    /// Writes return `false` on failure, reads return `null`. The error is
    /// logged, not returned.
    pub async fn dispatch(&self, command: &str, params: Value) -> Value {
        let action = match command.parse::<ActionName>() {
            Ok(action) => action,
            Err(e) => {
                error!("❌ {}", e);
                return Value::Null;
            }
        };

        match self.perform(action, params).await {
            Ok(value) => value,
            Err(e) if e.outcome_unknown() => {
                warn!(%action, "⏳ Outcome unknown: {}", e);
                action.failure_sentinel()
            }
            Err(e) => {
                error!(%action, "❌ {} failed: {}", action, e);
                action.failure_sentinel()
            }
        }
    }

    async fn run(&self, action: ActionName, params: &Value) -> Result<Value> {
        match action {
            ActionName::GetTokenByTicker => {
                let p: TickerParams = parse_params(action, params)?;
                self.get_token_by_ticker(&p).await
            }
            ActionName::GetBalance => {
                let p: BalanceParams = parse_params(action, params)?;
                self.get_balance(&p).await
            }
            ActionName::Transfer => {
                let p: TransferParams = parse_params(action, params)?;
                self.transfer(&p).await
            }
            ActionName::Swap => {
                let p: SwapParams = parse_params(action, params)?;
                self.swap(&p).await
            }
            ActionName::WrapNative => {
                let p: WrapParams = parse_params(action, params)?;
                self.wrap_native(&p).await
            }
            ActionName::CallContract => {
                let p: CallContractParams = parse_params(action, params)?;
                self.call_contract(&p).await
            }
            ActionName::ListContractFunctions => {
                let p: ContractParams = parse_params(action, params)?;
                self.list_contract_functions(&p).await
            }
        }
    }

    async fn get_token_by_ticker(&self, p: &TickerParams) -> Result<Value> {
        info!(ticker = %p.ticker, "🔍 Looking up token");
        match self.lookup.by_ticker(&p.ticker).await? {
            Some(address) => {
                info!(ticker = %p.ticker, %address, "✅ Token found");
                Ok(json!(address.to_string()))
            }
            None => {
                info!(ticker = %p.ticker, "No token found");
                Ok(Value::Null)
            }
        }
    }

    async fn get_balance(&self, p: &BalanceParams) -> Result<Value> {
        let owner = match p.address {
            Some(address) => address,
            None => self.credentials.load()?.address(),
        };
        let token = describe_token(
            self.chain.as_ref(),
            p.token_address.unwrap_or(NATIVE_TOKEN),
            self.settings.network.native_symbol(),
        )
        .await?;

        let raw = self.chain.balance_of(token.address, owner).await?;
        let balance = token.format(raw);
        info!(%owner, symbol = %token.symbol, %balance, "💰 Balance");

        Ok(json!({
            "address": owner.to_string(),
            "token": token.address.to_string(),
            "symbol": token.symbol,
            "balance": balance,
        }))
    }

    async fn transfer(&self, p: &TransferParams) -> Result<Value> {
        let wallet = self.credentials.load()?;
        let amount = p.amount.to_string();
        info!(to = %p.to_address, %amount, "💸 Transferring");

        let receipt = self
            .transfers
            .transfer(&wallet, p.to_address, &amount, p.token_address)
            .await?;
        Ok(self.receipt_value(&receipt))
    }

    async fn swap(&self, p: &SwapParams) -> Result<Value> {
        let wallet = self.credentials.load()?;
        let amount = p.amount.to_string();
        let slippage_bps = p.slippage_bps.unwrap_or(self.default_slippage_bps);
        info!(
            token_in = %p.token_in,
            token_out = %p.token_out,
            %amount,
            slippage_bps,
            "🔄 Swapping"
        );

        let receipt = self
            .swaps
            .execute_swap(&wallet, p.token_in, p.token_out, &amount, slippage_bps)
            .await?;
        Ok(self.receipt_value(&receipt))
    }

    async fn wrap_native(&self, p: &WrapParams) -> Result<Value> {
        let wallet = self.credentials.load()?;
        let amount = p.amount.to_string();
        info!(%amount, "🎁 Wrapping");

        let receipt = self.transfers.wrap_native(&wallet, &amount).await?;
        Ok(self.receipt_value(&receipt))
    }

    async fn call_contract(&self, p: &CallContractParams) -> Result<Value> {
        info!(contract = %p.contract_address, method = %p.method, "📞 Calling contract");
        let value = self
            .contracts
            .call(p.contract_address, &p.method, &p.args)
            .await?;
        info!(contract = %p.contract_address, method = %p.method, result = %value, "✅ Call returned");
        Ok(value)
    }

    async fn list_contract_functions(&self, p: &ContractParams) -> Result<Value> {
        info!(contract = %p.contract_address, "📜 Listing contract functions");
        let functions = self.contracts.list_functions(p.contract_address).await?;
        info!(contract = %p.contract_address, count = functions.len(), "✅ Functions listed");
        Ok(serde_json::to_value(functions)?)
    }

    fn receipt_value(&self, receipt: &TransactionReceipt) -> Value {
        let explorer = Network::explorer_tx_url(&self.settings.explorer_url, &receipt.tx_hash);
        info!(tx_hash = %receipt.tx_hash, "✅ Confirmed: {}", explorer);

        json!({
            "tx_hash": receipt.tx_hash.to_string(),
            "explorer_url": explorer,
            "status": receipt.status,
            "block_number": receipt.block_number,
            "gas_used": receipt.gas_used,
        })
    }
}
