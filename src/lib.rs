pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

pub use blockchain::{Aggregator, ChainClient, NodeClient, RpcClient, TransferSigner, TransferSubmitter};
pub use config::{ApiConfig, AppConfig, LoggingConfig, RecentConfig, RpcConfig, SignerConfig};
pub use error::{GatewayError, Result};
pub use logging::{init_logging, ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
