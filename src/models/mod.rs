pub mod block;
pub mod request;
pub mod response;

pub use block::{Block, RecentTransactions, TransactionRecord};
pub use request::{unwrap_event_body, AddressFilter, AggregationRequest, TransferRequest, ValidatedTransfer};
pub use request::{DEFAULT_COUNT, MAX_BLOCKS};
pub use response::{ErrorResponse, RecentTransactionsResponse, TransactionView, TransferResponse};
