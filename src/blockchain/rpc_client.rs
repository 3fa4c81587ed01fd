use alloy::primitives::{Address, B256, U256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RpcError, UpstreamError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{Block, TransactionRecord};

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    /// `null` is a legitimate result (e.g. an unknown block)
    #[serde(default)]
    result: Value,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Block as returned by `eth_getBlockByNumber(n, true)`
#[derive(Debug, Deserialize)]
struct RpcBlock {
    number: Option<String>,
    #[serde(default)]
    transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    value: String,
}

/// Thin JSON-RPC 2.0 client over HTTP
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl RpcClient {
    pub fn new(endpoint: String) -> Result<Self, RpcError> {
        Self::new_with_config(endpoint, 30)
    }

    pub fn new_with_config(endpoint: String, timeout_seconds: u64) -> Result<Self, RpcError> {
        let context = LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", serde_json::json!(endpoint))
            .with_metadata("timeout_seconds", serde_json::json!(timeout_seconds));
        context.info("Initializing RPC client");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .pool_max_idle_per_host(64)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout_seconds,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let monitor = PerformanceMonitor::new(&format!("rpc_{}", method));
        let result = self.send_request(method, params).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, duration, result.is_ok());
        result
    }

    async fn send_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: 1,
        };

        LogContext::new("rpc_client", "make_request")
            .with_metadata("method", serde_json::json!(method))
            .trace(&format!("Sending RPC request: {}", method));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout { seconds: self.timeout_seconds }
                } else if e.is_connect() {
                    RpcError::Connection(e.to_string())
                } else {
                    RpcError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status { status: status.as_u16() });
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Method {
                code: error.code,
                message: error.message,
            });
        }

        Ok(rpc_response.result)
    }

    pub async fn get_latest_block_number(&self) -> Result<U256, UpstreamError> {
        let result = self.make_request("eth_blockNumber", vec![]).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| UpstreamError::InvalidBlockNumber(result.to_string()))?;

        let latest = parse_quantity(raw).map_err(|_| UpstreamError::InvalidBlockNumber(raw.to_string()))?;

        LogContext::new("rpc_client", "get_latest_block_number")
            .with_block_number(latest)
            .debug(&format!("Retrieved latest block number: {}", latest));

        Ok(latest)
    }

    pub async fn get_block_with_transactions(&self, block_number: U256) -> Result<Block, UpstreamError> {
        let params = vec![Value::String(format_quantity(block_number)), Value::Bool(true)];
        let result = self.make_request("eth_getBlockByNumber", params).await?;

        if result.is_null() {
            return Err(UpstreamError::BlockNotFound(block_number));
        }

        let malformed = |reason: String| UpstreamError::MalformedBlock { block: block_number, reason };

        let raw: RpcBlock = serde_json::from_value(result).map_err(|e| malformed(e.to_string()))?;
        let number = match raw.number.as_deref() {
            Some(number) => parse_quantity(number).map_err(&malformed)?,
            None => block_number,
        };

        let transactions = raw
            .transactions
            .into_iter()
            .map(|tx| parse_transaction(tx, number))
            .collect::<Result<Vec<_>, _>>()
            .map_err(&malformed)?;

        LogContext::new("rpc_client", "get_block_with_transactions")
            .with_block_number(number)
            .with_metadata("transaction_count", serde_json::json!(transactions.len()))
            .debug(&format!("Retrieved block {} with {} transactions", number, transactions.len()));

        Ok(Block { number, transactions })
    }

    pub async fn get_chain_id(&self) -> Result<u64, RpcError> {
        let result = self.make_request("eth_chainId", vec![]).await?;
        parse_u64_result(&result)
    }

    /// Pending nonce, so back-to-back submissions do not collide
    pub async fn get_transaction_count(&self, address: Address) -> Result<u64, RpcError> {
        let params = vec![Value::String(address.to_string()), Value::String("pending".to_string())];
        let result = self.make_request("eth_getTransactionCount", params).await?;
        parse_u64_result(&result)
    }

    pub async fn get_gas_price(&self) -> Result<u128, RpcError> {
        let result = self.make_request("eth_gasPrice", vec![]).await?;
        let raw = expect_str(&result)?;
        let price = parse_quantity(raw).map_err(RpcError::InvalidResponse)?;
        u128::try_from(price).map_err(|_| RpcError::InvalidResponse(format!("gas price out of range: {}", raw)))
    }

    /// Broadcasts a signed transaction and returns its hash
    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<B256, RpcError> {
        let params = vec![Value::String(alloy::hex::encode_prefixed(raw_tx))];
        let result = self.make_request("eth_sendRawTransaction", params).await?;
        let raw = expect_str(&result)?;
        B256::from_str(raw).map_err(|e| RpcError::InvalidResponse(format!("bad transaction hash {}: {}", raw, e)))
    }
}

fn parse_transaction(tx: RpcTransaction, block_number: U256) -> Result<TransactionRecord, String> {
    let hash = B256::from_str(&tx.hash).map_err(|e| format!("bad transaction hash {}: {}", tx.hash, e))?;
    let from = parse_address(&tx.from)?;
    let to = tx.to.as_deref().map(parse_address).transpose()?;
    let value_wei = parse_quantity(&tx.value)?;

    Ok(TransactionRecord {
        hash,
        from,
        to,
        value_wei,
        block_number,
    })
}

fn parse_address(raw: &str) -> Result<Address, String> {
    Address::from_str(raw).map_err(|e| format!("bad address {}: {}", raw, e))
}

fn expect_str(value: &Value) -> Result<&str, RpcError> {
    value
        .as_str()
        .ok_or_else(|| RpcError::InvalidResponse(format!("expected hex string, got {}", value)))
}

fn parse_u64_result(value: &Value) -> Result<u64, RpcError> {
    let raw = expect_str(value)?;
    let parsed = parse_quantity(raw).map_err(RpcError::InvalidResponse)?;
    u64::try_from(parsed).map_err(|_| RpcError::InvalidResponse(format!("quantity out of range: {}", raw)))
}

/// Parses a JSON-RPC hex quantity. Signed or empty values are rejected.
pub fn parse_quantity(raw: &str) -> Result<U256, String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return Err(format!("negative quantity: {}", raw));
    }

    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(format!("empty quantity: {}", raw));
    }

    U256::from_str_radix(digits, 16).map_err(|e| format!("failed to parse quantity {}: {}", raw, e))
}

pub fn format_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}
