//! DeFi actions CLI
//!
//! Runs balance, transfer and swap actions against one configured EVM network.

use clap::{Parser, Subcommand};
use defi_actions::actions::{ActionName, EvmConnection};
use defi_actions::{Config, Error, Result, RpcConfig};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "defi-actions")]
#[command(about = "Balances, transfers and aggregator-routed swaps on EVM chains")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Run(RunCommand),

    /// List available actions
    Actions,

    /// Show current configuration
    Config,
}

/// Commands that need a network connection
#[derive(Subcommand)]
enum RunCommand {
    /// Show a native or token balance
    Balance {
        /// Address to query (defaults to the configured account)
        #[arg(long)]
        address: Option<String>,

        /// Token address (defaults to the native currency)
        #[arg(long)]
        token: Option<String>,
    },

    /// Swap tokens through the aggregator
    Swap {
        /// Input token address (0xEeee...EEeE for native)
        #[arg(long)]
        token_in: String,

        /// Output token address
        #[arg(long)]
        token_out: String,

        /// Human-readable input amount, e.g. 1.5
        #[arg(long)]
        amount: String,

        /// Slippage tolerance in basis points
        #[arg(long)]
        slippage_bps: Option<u32>,
    },

    /// Send native currency or tokens
    Transfer {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Human-readable amount
        #[arg(long)]
        amount: String,

        /// Token address (defaults to the native currency)
        #[arg(long)]
        token: Option<String>,
    },

    /// Wrap native currency
    Wrap {
        /// Human-readable amount
        #[arg(long)]
        amount: String,
    },

    /// Look up a token address by ticker
    Token {
        /// Ticker symbol, e.g. USDC
        ticker: String,
    },

    /// Call a function of a verified contract without sending a transaction
    Call {
        /// Contract address
        contract: String,

        /// Function name or full signature, e.g. balanceOf(address)
        method: String,

        /// Arguments as a JSON array
        #[arg(long)]
        args: Option<String>,
    },

    /// List the functions of a verified contract
    Functions {
        /// Contract address
        contract: String,
    },

    /// Run a named action with a JSON keyword bag; failures print false or null
    Action {
        /// Action name, see `actions`
        name: String,

        /// Parameters as JSON
        #[arg(short = 'P', long)]
        params: Option<String>,
    },

    /// Check that the key loads and the RPC endpoint answers
    Check,
}

fn parse_json(raw: Option<String>, flag: &str, default: Value) -> Result<Value> {
    match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidArgument(format!("Invalid {} JSON: {}", flag, e))),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Load config
    let config: Config = if let Some(config_path) = cli.config {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("{}: {}", config_path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Actions => {
            for action in ActionName::ALL {
                println!("{:<26}{}", action.as_str(), action.description());
            }
            Ok(())
        }
        Commands::Run(command) => {
            let value = run(command, &config).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    }
}

async fn run(command: RunCommand, config: &Config) -> Result<Value> {
    let rpc = RpcConfig::from_env();
    let connection = EvmConnection::from_config(config, &rpc)?;
    tracing::info!(
        network = connection.settings().network.name(),
        chain_id = connection.settings().chain_id,
        "Connected"
    );

    let value = match command {
        RunCommand::Balance { address, token } => {
            connection
                .perform(
                    ActionName::GetBalance,
                    json!({ "address": address, "token_address": token }),
                )
                .await?
        }
        RunCommand::Swap {
            token_in,
            token_out,
            amount,
            slippage_bps,
        } => {
            connection
                .perform(
                    ActionName::Swap,
                    json!({
                        "token_in": token_in,
                        "token_out": token_out,
                        "amount": amount,
                        "slippage_bps": slippage_bps,
                    }),
                )
                .await?
        }
        RunCommand::Transfer { to, amount, token } => {
            connection
                .perform(
                    ActionName::Transfer,
                    json!({ "to_address": to, "amount": amount, "token_address": token }),
                )
                .await?
        }
        RunCommand::Wrap { amount } => {
            connection
                .perform(ActionName::WrapNative, json!({ "amount": amount }))
                .await?
        }
        RunCommand::Token { ticker } => {
            connection
                .perform(ActionName::GetTokenByTicker, json!({ "ticker": ticker }))
                .await?
        }
        RunCommand::Call {
            contract,
            method,
            args,
        } => {
            let args = parse_json(args, "--args", json!([]))?;
            connection
                .perform(
                    ActionName::CallContract,
                    json!({ "contract_address": contract, "method": method, "args": args }),
                )
                .await?
        }
        RunCommand::Functions { contract } => {
            connection
                .perform(
                    ActionName::ListContractFunctions,
                    json!({ "contract_address": contract }),
                )
                .await?
        }
        RunCommand::Action { name, params } => {
            let params = parse_json(params, "--params", json!({}))?;
            connection.dispatch(&name, params).await
        }
        RunCommand::Check => json!(connection.is_configured().await),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn offline_and_connected_commands_split() {
        let cli = Cli::try_parse_from(["defi-actions", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config));

        let cli = Cli::try_parse_from(["defi-actions", "actions"]).unwrap();
        assert!(matches!(cli.command, Commands::Actions));

        let cli = Cli::try_parse_from([
            "defi-actions",
            "call",
            "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c",
            "balanceOf",
            "--args",
            r#"["0x4242424242424242424242424242424242424242"]"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Run(RunCommand::Call { method, args, .. }) => {
                assert_eq!(method, "balanceOf");
                let args = parse_json(args, "--args", json!([])).unwrap();
                assert_eq!(args.as_array().map(Vec::len), Some(1));
            }
            _ => panic!("expected call command"),
        }
    }

    #[test]
    fn bad_json_flag_is_invalid_argument() {
        let err = parse_json(Some("{".to_string()), "--params", json!({})).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
