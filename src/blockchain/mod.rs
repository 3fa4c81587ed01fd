pub mod aggregator;
pub mod chain_client;
pub mod range_builder;
pub mod rpc_client;
pub mod signer;
pub mod transfer_submitter;
pub mod transfer_validator;

pub use aggregator::Aggregator;
pub use chain_client::{ChainClient, NodeClient};
pub use range_builder::build_block_range;
pub use rpc_client::RpcClient;
pub use signer::{TransferParams, TransferSigner};
pub use transfer_submitter::TransferSubmitter;
pub use transfer_validator::{parse_ether_to_wei, validate_address, validate_transfer};

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{GatewayError, UpstreamError};

/// Wires the read and write paths to the configured node. The write path is
/// `None` when no signing key is configured.
pub fn services_from_config(config: &AppConfig) -> Result<(Aggregator, Option<TransferSubmitter>), GatewayError> {
    let rpc = RpcClient::new_with_config(config.rpc.endpoint.clone(), config.rpc.timeout_seconds)
        .map_err(UpstreamError::from)?;
    let client: Arc<dyn ChainClient> = Arc::new(NodeClient::new(rpc));

    let aggregator = Aggregator::new(Arc::clone(&client)).with_default_count(config.recent.default_count);

    let submitter = config
        .transfer_signer()?
        .map(|signer| TransferSubmitter::new(client, Arc::new(signer.with_gas_limit(config.signer.gas_limit))));

    Ok((aggregator, submitter))
}
