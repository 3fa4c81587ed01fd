use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use super::rpc_client::RpcClient;
use super::signer::{TransferParams, TransferSigner};
use crate::error::{GatewayError, SubmissionError};
use crate::logging::LogContext;
use crate::models::Block;

/// Everything the gateway needs from a chain node.
///
/// Read methods fail with `GatewayError::Upstream`, the submit method with
/// `GatewayError::Submission`.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn latest_block_number(&self) -> Result<U256, GatewayError>;

    async fn block_with_transactions(&self, number: U256) -> Result<Block, GatewayError>;

    /// Signs with `signer` and broadcasts; returns once the node accepts it
    async fn submit_native_transfer(
        &self,
        signer: &TransferSigner,
        to: Address,
        value_wei: U256,
    ) -> Result<B256, GatewayError>;
}

/// `ChainClient` backed by a JSON-RPC node
#[derive(Clone)]
pub struct NodeClient {
    rpc: RpcClient,
}

impl NodeClient {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }
}

#[async_trait]
impl ChainClient for NodeClient {
    async fn latest_block_number(&self) -> Result<U256, GatewayError> {
        Ok(self.rpc.get_latest_block_number().await?)
    }

    async fn block_with_transactions(&self, number: U256) -> Result<Block, GatewayError> {
        Ok(self.rpc.get_block_with_transactions(number).await?)
    }

    async fn submit_native_transfer(
        &self,
        signer: &TransferSigner,
        to: Address,
        value_wei: U256,
    ) -> Result<B256, GatewayError> {
        let from = signer.address();

        let chain_id = self.rpc.get_chain_id().await.map_err(SubmissionError::from)?;
        let nonce = self.rpc.get_transaction_count(from).await.map_err(SubmissionError::from)?;
        let gas_price = self.rpc.get_gas_price().await.map_err(SubmissionError::from)?;

        let params = TransferParams {
            chain_id,
            nonce,
            gas_price,
            gas_limit: signer.gas_limit(),
        };

        LogContext::new("node_client", "submit_native_transfer")
            .with_address(&from.to_string())
            .with_metadata("chain_id", serde_json::json!(chain_id))
            .with_metadata("nonce", serde_json::json!(nonce))
            .debug(&format!("Signing native transfer of {} wei to {}", value_wei, to));

        let raw_tx = signer.sign_native_transfer(to, value_wei, params)?;
        let hash = self.rpc.send_raw_transaction(&raw_tx).await.map_err(SubmissionError::from)?;

        Ok(hash)
    }
}
