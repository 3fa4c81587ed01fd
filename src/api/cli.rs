use alloy::hex;
use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::{validate_transfer, Aggregator, TransferSubmitter};
use crate::config::AppConfig;
use crate::error::{ConfigError, GatewayError, SubmissionError};
use crate::models::{AggregationRequest, RecentTransactionsResponse, TransferRequest, TransferResponse};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "evm-tx-gateway-cli")]
#[command(about = "Query recent transactions and send native transfers through an EVM node")]
#[command(version)]
pub struct Cli {
    /// JSON-RPC endpoint, overrides RPC_URL and the config file
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List transactions from the most recent blocks
    Recent {
        /// Number of blocks to inspect (clamped to 1..=50)
        #[arg(long, allow_negative_numbers = true)]
        count: Option<i64>,
        /// Keep only transactions sent from or to this address
        #[arg(long)]
        address: Option<String>,
    },
    /// Send ETH from the configured sender account
    Send {
        #[arg(long)]
        to: String,
        /// Amount in ETH, decimal notation
        #[arg(long = "amount-eth")]
        amount_eth: String,
    },
    /// Print a sample configuration file, or write it with --output
    Config {
        #[arg(long)]
        output: Option<String>,
    },
}

pub struct CliHandler {
    aggregator: Aggregator,
    submitter: Option<TransferSubmitter>,
}

impl CliHandler {
    pub fn new(aggregator: Aggregator, submitter: Option<TransferSubmitter>) -> Self {
        Self { aggregator, submitter }
    }

    pub async fn execute_command(&self, command: &Commands) -> Result<(), CliError> {
        match command {
            Commands::Recent { count, address } => {
                let response = self.recent(AggregationRequest::new(*count, address.clone())).await?;
                print_json(&response)
            }
            Commands::Send { to, amount_eth } => {
                let response = self.send(TransferRequest::new(to.trim(), amount_eth.trim())).await?;
                print_json(&response)
            }
            Commands::Config { output } => write_sample_config(output.as_deref()),
        }
    }

    pub async fn recent(&self, request: AggregationRequest) -> Result<RecentTransactionsResponse, GatewayError> {
        let recent = self.aggregator.recent_transactions(&request).await?;
        Ok(RecentTransactionsResponse::from(&recent))
    }

    pub async fn send(&self, request: TransferRequest) -> Result<TransferResponse, GatewayError> {
        let transfer = validate_transfer(&request)?;
        let submitter = self
            .submitter
            .as_ref()
            .ok_or(GatewayError::Submission(SubmissionError::MissingCredential))?;

        let hash = submitter.submit(&transfer).await?;
        Ok(TransferResponse {
            hash: hex::encode_prefixed(hash.as_slice()),
        })
    }
}

/// Handled without a node connection
pub fn write_sample_config(output: Option<&str>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            AppConfig::default().save_to_file(path)?;
            println!("Sample configuration written to {}", path);
        }
        None => println!("{}", AppConfig::generate_sample_config()?),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recent() {
        let cli = Cli::try_parse_from(["cli", "recent", "--count", "5", "--address", "0xabc"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Recent {
                count: Some(5),
                address: Some("0xabc".to_string())
            }
        );
        assert!(cli.rpc_url.is_none());
    }

    #[test]
    fn test_parse_recent_negative_count() {
        let cli = Cli::try_parse_from(["cli", "recent", "--count", "-3"]).unwrap();
        assert_eq!(cli.command, Commands::Recent { count: Some(-3), address: None });
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from([
            "cli",
            "--rpc-url",
            "http://localhost:8545",
            "send",
            "--to",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "--amount-eth",
            "0.01",
        ])
        .unwrap();

        assert_eq!(cli.rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(
            cli.command,
            Commands::Send {
                to: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
                amount_eth: "0.01".to_string()
            }
        );
    }

    #[test]
    fn test_send_requires_both_fields() {
        assert!(Cli::try_parse_from(["cli", "send", "--to", "0x00"]).is_err());
    }

    #[test]
    fn test_write_sample_config_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");

        write_sample_config(Some(path.to_str().unwrap())).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[rpc]"));
        assert!(!written.contains("private_key"));
    }
}
