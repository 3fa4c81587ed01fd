use alloy::hex;
use serde::{Deserialize, Serialize};

use super::block::{RecentTransactions, TransactionRecord};

/// Body of a successful read-path response.
///
/// Chain-scale integers (`latest`, `value`, `blockNumber`) are decimal text so
/// JSON consumers never round them through a float.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransactionsResponse {
    pub latest: String,
    pub blocks_requested: u32,
    pub blocks_returned: usize,
    pub count: usize,
    pub txs: Vec<TransactionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub block_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferResponse {
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl From<&TransactionRecord> for TransactionView {
    fn from(tx: &TransactionRecord) -> Self {
        Self {
            hash: hex::encode_prefixed(tx.hash.as_slice()),
            from: tx.from.to_checksum(None),
            to: tx.to.map(|to| to.to_checksum(None)),
            value: tx.value_wei.to_string(),
            block_number: tx.block_number.to_string(),
        }
    }
}

impl From<&RecentTransactions> for RecentTransactionsResponse {
    fn from(recent: &RecentTransactions) -> Self {
        Self {
            latest: recent.latest.to_string(),
            blocks_requested: recent.blocks_requested,
            blocks_returned: recent.blocks_returned,
            count: recent.count(),
            txs: recent.transactions.iter().map(TransactionView::from).collect(),
        }
    }
}
