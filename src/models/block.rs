use alloy::primitives::{Address, B256, U256};

/// A block with its transactions in inclusion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: U256,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    pub value_wei: U256,
    pub block_number: U256,
}

/// Result of one read-path aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTransactions {
    pub latest: U256,
    pub blocks_requested: u32,
    pub blocks_returned: usize,
    pub transactions: Vec<TransactionRecord>,
}

impl RecentTransactions {
    /// Post-filter transaction count
    pub fn count(&self) -> usize {
        self.transactions.len()
    }
}

impl Block {
    /// Walks the block's transactions keeping only those accepted by `keep`.
    pub fn into_filtered<F>(self, mut keep: F) -> impl Iterator<Item = TransactionRecord>
    where
        F: FnMut(&TransactionRecord) -> bool,
    {
        self.transactions.into_iter().filter(move |tx| keep(tx))
    }
}
