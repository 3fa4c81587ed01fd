use alloy::hex;
use alloy::primitives::{Address, B256};
use std::sync::Arc;

use super::chain_client::ChainClient;
use super::signer::TransferSigner;
use crate::error::GatewayError;
use crate::logging::{MetricsLogger, PerformanceMonitor};
use crate::models::ValidatedTransfer;

/// Submits validated native transfers with the server's signing credential.
///
/// One submission per call and no internal retry: a failure is returned to the
/// caller as-is.
#[derive(Clone)]
pub struct TransferSubmitter {
    client: Arc<dyn ChainClient>,
    signer: Arc<TransferSigner>,
}

impl TransferSubmitter {
    pub fn new(client: Arc<dyn ChainClient>, signer: Arc<TransferSigner>) -> Self {
        Self { client, signer }
    }

    pub fn sender(&self) -> Address {
        self.signer.address()
    }

    pub async fn submit(&self, transfer: &ValidatedTransfer) -> Result<B256, GatewayError> {
        let monitor = PerformanceMonitor::new("submit_native_transfer");

        let hash = self
            .client
            .submit_native_transfer(&self.signer, transfer.to, transfer.value_wei)
            .await?;

        MetricsLogger::log_submission(&transfer.to.to_string(), &hex::encode_prefixed(hash.as_slice()), monitor.elapsed_ms());

        Ok(hash)
    }
}
