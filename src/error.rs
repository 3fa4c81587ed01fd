use alloy::primitives::U256;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Main error type for the transaction gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Malformed or missing request fields
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Transport and protocol errors from the JSON-RPC node
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error: {status}")]
    Status { status: u16 },

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Request values that fail format checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid address")]
    InvalidAddress,

    #[error("invalid amount")]
    InvalidAmount,
}

/// Read-path failures reported by (or about) the chain node
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Invalid latest block number: {0}")]
    InvalidBlockNumber(String),

    #[error("Block {0} not found")]
    BlockNotFound(U256),

    #[error("Malformed block {block}: {reason}")]
    MalformedBlock { block: U256, reason: String },

    #[error("Block fetch task failed: {0}")]
    TaskFailed(String),
}

/// Write-path failures while signing or broadcasting a transfer
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("no signing credential configured")]
    MissingCredential,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl GatewayError {
    pub fn input(message: impl Into<String>) -> Self {
        GatewayError::Input(message.into())
    }

    /// HTTP status for this error: client errors are caught before any node call
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Input(_) | GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(_)
            | GatewayError::Submission(_)
            | GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GatewayError::Config(_) => ErrorSeverity::Critical,
            GatewayError::Submission(SubmissionError::MissingCredential) => ErrorSeverity::Critical,

            GatewayError::Upstream(UpstreamError::Rpc(RpcError::Connection(_))) => ErrorSeverity::High,
            GatewayError::Upstream(UpstreamError::InvalidBlockNumber(_)) => ErrorSeverity::High,
            GatewayError::Submission(_) => ErrorSeverity::High,

            GatewayError::Upstream(_) => ErrorSeverity::Medium,

            GatewayError::Input(_) | GatewayError::Validation(_) => ErrorSeverity::Low,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(GatewayError::input("to & amountEth are required").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::from(ValidationError::InvalidAmount).status_code(), StatusCode::BAD_REQUEST);

        let upstream = GatewayError::from(UpstreamError::Rpc(RpcError::Timeout { seconds: 30 }));
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let submission = GatewayError::from(SubmissionError::MissingCredential);
        assert_eq!(submission.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!submission.is_client_error());
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(GatewayError::from(ValidationError::InvalidAddress).to_string(), "invalid address");
        assert_eq!(GatewayError::from(ValidationError::InvalidAmount).to_string(), "invalid amount");
    }

    #[test]
    fn test_upstream_message_passes_through() {
        let error = GatewayError::from(SubmissionError::Rpc(RpcError::Method {
            code: -32000,
            message: "nonce too low".to_string(),
        }));
        assert_eq!(error.to_string(), "RPC method error: code=-32000, message=nonce too low");

        let error = GatewayError::from(UpstreamError::BlockNotFound(U256::from(42)));
        assert_eq!(error.to_string(), "Block 42 not found");
    }

    #[test]
    fn test_error_severity() {
        let critical = GatewayError::from(ConfigError::InvalidUrl("ftp://node".to_string()));
        assert_eq!(critical.severity(), ErrorSeverity::Critical);

        let high = GatewayError::from(UpstreamError::InvalidBlockNumber("-0x1".to_string()));
        assert_eq!(high.severity(), ErrorSeverity::High);

        let medium = GatewayError::from(UpstreamError::Rpc(RpcError::Timeout { seconds: 30 }));
        assert_eq!(medium.severity(), ErrorSeverity::Medium);

        let low = GatewayError::from(ValidationError::InvalidAddress);
        assert_eq!(low.severity(), ErrorSeverity::Low);
    }
}
