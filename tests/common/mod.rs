#![allow(dead_code)]

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use evm_tx_gateway::blockchain::{ChainClient, TransferSigner};
use evm_tx_gateway::error::{GatewayError, RpcError, SubmissionError, UpstreamError};
use evm_tx_gateway::models::{Block, TransactionRecord};
use std::collections::HashSet;
use std::sync::Mutex;

/// Hardhat's first dev account
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const RECIPIENT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// In-memory chain: every block carries one transfer from a fixed sender to
/// a fixed recipient, plus one contract creation by a second sender.
pub struct MockChainClient {
    pub latest: u64,
    pub failing_blocks: HashSet<u64>,
    pub latest_error: Option<String>,
    pub reject_submission: Option<String>,
    pub fetched: Mutex<Vec<u64>>,
    pub submissions: Mutex<Vec<(Address, Address, U256)>>,
}

impl MockChainClient {
    pub fn new(latest: u64) -> Self {
        Self {
            latest,
            failing_blocks: HashSet::new(),
            latest_error: None,
            reject_submission: None,
            fetched: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn sender() -> Address {
        Address::repeat_byte(0x11)
    }

    pub fn recipient() -> Address {
        Address::repeat_byte(0x22)
    }

    pub fn deployer() -> Address {
        Address::repeat_byte(0x33)
    }

    pub fn block(number: u64) -> Block {
        let n = U256::from(number);
        Block {
            number: n,
            transactions: vec![
                TransactionRecord {
                    hash: B256::left_padding_from(&number.to_be_bytes()),
                    from: Self::sender(),
                    to: Some(Self::recipient()),
                    value_wei: U256::from(1_000_000_000_000_000_000u64),
                    block_number: n,
                },
                TransactionRecord {
                    hash: B256::repeat_byte(0xcc),
                    from: Self::deployer(),
                    to: None,
                    value_wei: U256::ZERO,
                    block_number: n,
                },
            ],
        }
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn latest_block_number(&self) -> Result<U256, GatewayError> {
        match &self.latest_error {
            Some(message) => Err(UpstreamError::Rpc(RpcError::Connection(message.clone())).into()),
            None => Ok(U256::from(self.latest)),
        }
    }

    async fn block_with_transactions(&self, number: U256) -> Result<Block, GatewayError> {
        let number = number.to::<u64>();
        self.fetched.lock().unwrap().push(number);
        if self.failing_blocks.contains(&number) {
            return Err(UpstreamError::BlockNotFound(U256::from(number)).into());
        }
        Ok(Self::block(number))
    }

    async fn submit_native_transfer(
        &self,
        signer: &TransferSigner,
        to: Address,
        value_wei: U256,
    ) -> Result<B256, GatewayError> {
        self.submissions.lock().unwrap().push((signer.address(), to, value_wei));
        match &self.reject_submission {
            Some(message) => Err(SubmissionError::Rpc(RpcError::Method {
                code: -32000,
                message: message.clone(),
            })
            .into()),
            None => Ok(B256::repeat_byte(0xab)),
        }
    }
}
