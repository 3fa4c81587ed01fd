use alloy::primitives::U256;
use futures::future::try_join_all;
use std::sync::Arc;

use super::chain_client::ChainClient;
use super::range_builder::build_block_range;
use crate::error::{GatewayError, UpstreamError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{AddressFilter, AggregationRequest, Block, RecentTransactions, DEFAULT_COUNT};

/// Collects recent transactions across a window of blocks
#[derive(Clone)]
pub struct Aggregator {
    client: Arc<dyn ChainClient>,
    default_count: u32,
}

impl Aggregator {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self {
            client,
            default_count: DEFAULT_COUNT,
        }
    }

    pub fn with_default_count(mut self, default_count: u32) -> Self {
        self.default_count = default_count;
        self
    }

    pub async fn recent_transactions(&self, request: &AggregationRequest) -> Result<RecentTransactions, GatewayError> {
        let monitor = PerformanceMonitor::new("aggregate_recent_transactions");
        let max_blocks = request.effective_count(self.default_count);
        let filter = request.address_filter();

        let latest = self.client.latest_block_number().await?;
        let range = build_block_range(latest, max_blocks);

        LogContext::new("aggregator", "recent_transactions")
            .with_block_number(latest)
            .with_metadata("blocks_requested", serde_json::json!(max_blocks))
            .with_metadata("blocks_in_range", serde_json::json!(range.len()))
            .with_metadata("address_filter", serde_json::json!(filter.as_ref().map(AddressFilter::as_str)))
            .debug("Fetching block window");

        let blocks = self.fetch_blocks(&range).await?;
        let blocks_returned = blocks.len();

        let transactions = blocks
            .into_iter()
            .flat_map(|block| {
                let filter = filter.clone();
                block.into_filtered(move |tx| match &filter {
                    Some(filter) => filter.matches_either(&tx.from, tx.to.as_ref()),
                    None => true,
                })
            })
            .collect();

        let recent = RecentTransactions {
            latest,
            blocks_requested: max_blocks,
            blocks_returned,
            transactions,
        };

        MetricsLogger::log_aggregation(&latest.to_string(), blocks_returned, recent.count(), monitor.elapsed_ms());

        Ok(recent)
    }

    /// One task per block, joined in range order. The first failure fails the
    /// whole batch; tasks still in flight are detached and left to finish.
    async fn fetch_blocks(&self, range: &[U256]) -> Result<Vec<Block>, GatewayError> {
        let handles = range.iter().map(|&number| {
            let client = Arc::clone(&self.client);
            tokio::spawn(async move { client.block_with_transactions(number).await })
        });

        try_join_all(handles.map(|handle| async move {
            handle
                .await
                .map_err(|e| GatewayError::from(UpstreamError::TaskFailed(e.to_string())))?
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::TransferSigner;
    use crate::models::TransactionRecord;
    use alloy::primitives::{address, Address, B256};
    use async_trait::async_trait;
    use crate::models::MAX_BLOCKS;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Barrier;

    const ALICE: Address = address!("abcd00000000000000000000000000000000abcd");
    const BOB: Address = address!("b0b0000000000000000000000000000000000b0b");
    const CAROL: Address = address!("ca40000000000000000000000000000000000ca4");

    struct FakeChain {
        latest: u64,
        failing: HashSet<u64>,
        fetched: Mutex<Vec<u64>>,
    }

    impl FakeChain {
        fn new(latest: u64) -> Self {
            Self {
                latest,
                failing: HashSet::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn block(number: u64) -> Block {
            let n = U256::from(number);
            let tx = |i: u8, from: Address, to: Option<Address>| TransactionRecord {
                hash: B256::with_last_byte(i),
                from,
                to,
                value_wei: U256::from(number * 10 + i as u64),
                block_number: n,
            };
            Block {
                number: n,
                transactions: vec![tx(1, ALICE, Some(BOB)), tx(2, BOB, Some(CAROL)), tx(3, CAROL, None)],
            }
        }
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn latest_block_number(&self) -> Result<U256, GatewayError> {
            Ok(U256::from(self.latest))
        }

        async fn block_with_transactions(&self, number: U256) -> Result<Block, GatewayError> {
            let number = number.to::<u64>();
            self.fetched.lock().unwrap().push(number);
            if self.failing.contains(&number) {
                return Err(UpstreamError::BlockNotFound(U256::from(number)).into());
            }
            Ok(Self::block(number))
        }

        async fn submit_native_transfer(&self, _: &TransferSigner, _: Address, _: U256) -> Result<B256, GatewayError> {
            unreachable!("read path never submits")
        }
    }

    #[tokio::test]
    async fn test_window_without_filter() {
        let chain = Arc::new(FakeChain::new(100));
        let aggregator = Aggregator::new(chain.clone());

        let recent = aggregator
            .recent_transactions(&AggregationRequest::new(Some(10), None))
            .await
            .unwrap();

        assert_eq!(recent.latest, U256::from(100));
        assert_eq!(recent.blocks_requested, 10);
        assert_eq!(recent.blocks_returned, 10);
        assert_eq!(recent.count(), 30);

        let block_order: Vec<u64> = recent.transactions.iter().map(|tx| tx.block_number.to::<u64>()).collect();
        let mut expected = Vec::new();
        for n in (91..=100).rev() {
            expected.extend([n, n, n]);
        }
        assert_eq!(block_order, expected);

        let mut fetched = chain.fetched.lock().unwrap().clone();
        fetched.sort_unstable();
        assert_eq!(fetched, (91..=100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_window_truncated_near_genesis() {
        let aggregator = Aggregator::new(Arc::new(FakeChain::new(3)));
        let recent = aggregator
            .recent_transactions(&AggregationRequest::new(Some(10), None))
            .await
            .unwrap();

        assert_eq!(recent.blocks_requested, 10);
        assert_eq!(recent.blocks_returned, 4);
    }

    #[tokio::test]
    async fn test_filter_matches_from_or_to_case_insensitively() {
        let aggregator = Aggregator::new(Arc::new(FakeChain::new(5)));
        let request = AggregationRequest::new(Some(2), Some("0xABCD00000000000000000000000000000000ABCD".to_string()));

        let recent = aggregator.recent_transactions(&request).await.unwrap();

        assert_eq!(recent.blocks_returned, 2);
        assert_eq!(recent.count(), 2);
        assert!(recent.transactions.iter().all(|tx| tx.from == ALICE || tx.to == Some(ALICE)));
    }

    #[tokio::test]
    async fn test_contract_creation_matches_only_on_sender() {
        let aggregator = Aggregator::new(Arc::new(FakeChain::new(5)));
        let request = AggregationRequest::new(Some(1), Some(format!("{:?}", CAROL)));

        let recent = aggregator.recent_transactions(&request).await.unwrap();

        // BOB -> CAROL and CAROL -> (creation), both matched through CAROL
        assert_eq!(recent.count(), 2);
        let view: Vec<_> = recent.transactions.iter().map(|tx| (tx.from, tx.to)).collect();
        assert_eq!(view, vec![(BOB, Some(CAROL)), (CAROL, None)]);
    }

    #[tokio::test]
    async fn test_single_block_failure_fails_everything() {
        let mut chain = FakeChain::new(20);
        chain.failing.insert(15);
        let aggregator = Aggregator::new(Arc::new(chain));

        let err = aggregator
            .recent_transactions(&AggregationRequest::new(Some(10), None))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Upstream(UpstreamError::BlockNotFound(_))));
        assert_eq!(err.to_string(), "Block 15 not found");
    }

    #[tokio::test]
    async fn test_default_count_applies() {
        let aggregator = Aggregator::new(Arc::new(FakeChain::new(1_000))).with_default_count(4);
        let recent = aggregator.recent_transactions(&AggregationRequest::default()).await.unwrap();
        assert_eq!(recent.blocks_returned, 4);
    }

    /// Every fetch parks on a shared barrier, so the batch only completes if
    /// all fetches are in flight at once.
    struct GatedChain {
        latest: u64,
        gate: Barrier,
        failing: Option<u64>,
        completed: Mutex<Vec<u64>>,
    }

    impl GatedChain {
        fn new(latest: u64, in_flight: usize, failing: Option<u64>) -> Self {
            Self {
                latest,
                gate: Barrier::new(in_flight),
                failing,
                completed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChainClient for GatedChain {
        async fn latest_block_number(&self) -> Result<U256, GatewayError> {
            Ok(U256::from(self.latest))
        }

        async fn block_with_transactions(&self, number: U256) -> Result<Block, GatewayError> {
            let number = number.to::<u64>();
            if self.failing == Some(number) {
                return Err(UpstreamError::BlockNotFound(U256::from(number)).into());
            }
            self.gate.wait().await;
            self.completed.lock().unwrap().push(number);
            Ok(FakeChain::block(number))
        }

        async fn submit_native_transfer(&self, _: &TransferSigner, _: Address, _: U256) -> Result<B256, GatewayError> {
            unreachable!("read path never submits")
        }
    }

    #[tokio::test]
    async fn test_block_fetches_run_concurrently() {
        let chain = Arc::new(GatedChain::new(500, MAX_BLOCKS as usize, None));
        let aggregator = Aggregator::new(chain.clone());

        let recent = tokio::time::timeout(
            Duration::from_secs(5),
            aggregator.recent_transactions(&AggregationRequest::new(Some(MAX_BLOCKS as i64), None)),
        )
        .await
        .expect("fetches were serialized")
        .unwrap();

        assert_eq!(recent.blocks_returned, MAX_BLOCKS as usize);
        assert_eq!(chain.completed.lock().unwrap().len(), MAX_BLOCKS as usize);
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_other_fetches_running() {
        // nine fetches meet at the barrier while block 95 fails straight away
        let chain = Arc::new(GatedChain::new(100, 9, Some(95)));
        let aggregator = Aggregator::new(chain.clone());

        let err = aggregator
            .recent_transactions(&AggregationRequest::new(Some(10), None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Block 95 not found");

        tokio::time::timeout(Duration::from_secs(5), async {
            while chain.completed.lock().unwrap().len() < 9 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("detached fetches did not finish");

        let mut completed = chain.completed.lock().unwrap().clone();
        completed.sort_unstable();
        assert_eq!(completed, vec![91, 92, 93, 94, 96, 97, 98, 99, 100]);
    }
}
