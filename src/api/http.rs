use alloy::hex;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::blockchain::{validate_transfer, Aggregator, TransferSubmitter};
use crate::error::{GatewayError, SubmissionError};
use crate::logging::{ErrorLogger, LogContext};
use crate::models::{
    unwrap_event_body, AggregationRequest, ErrorResponse, RecentTransactionsResponse, TransferRequest,
    TransferResponse,
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Server(String),
}

/// Response structure for health endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub write_path_enabled: bool,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    /// `None` when the server runs without a signing credential
    pub submitter: Option<Arc<TransferSubmitter>>,
}

impl AppState {
    pub fn new(aggregator: Aggregator, submitter: Option<TransferSubmitter>) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            submitter: submitter.map(Arc::new),
        }
    }
}

/// Routes plus the CORS policy the browser UI relies on
pub fn build_router(state: AppState, cors_enabled: bool) -> Router {
    let router = Router::new()
        .route(
            "/recent",
            get(get_recent).post(post_recent).fallback(get_only),
        )
        .route("/send", post(post_send).fallback(post_only))
        .route("/health", get(get_health).fallback(get_only))
        .with_state(state);

    if cors_enabled {
        router.layer(ServiceBuilder::new().layer(cors_layer()))
    } else {
        router
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

/// HTTP API server
pub struct ApiServer {
    state: AppState,
    addr: String,
    cors_enabled: bool,
}

impl ApiServer {
    pub fn new(state: AppState, addr: impl Into<String>) -> Self {
        Self {
            state,
            addr: addr.into(),
            cors_enabled: true,
        }
    }

    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors_enabled = enabled;
        self
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<(), ApiError> {
        let app = build_router(self.state, self.cors_enabled);

        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|source| ApiError::Bind {
                addr: self.addr.clone(),
                source,
            })?;

        log::info!("HTTP API server listening on {}", self.addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Server(e.to_string()))?;

        Ok(())
    }
}

/// GET /recent?count=&address=
pub async fn get_recent(
    State(state): State<AppState>,
    query: Result<Query<AggregationRequest>, QueryRejection>,
) -> Result<Json<RecentTransactionsResponse>, GatewayError> {
    let request = match query {
        Ok(Query(request)) => request,
        Err(rejection) => return Err(reported(GatewayError::input(rejection.body_text()), "get_recent")),
    };

    aggregate(&state, request).await
}

/// POST /recent with `{ count?, address? }`, bare or wrapped in an event `body`
pub async fn post_recent(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RecentTransactionsResponse>, GatewayError> {
    let request = decode_body::<AggregationRequest>(&body).map_err(|e| reported(e, "post_recent"))?;

    aggregate(&state, request).await
}

async fn aggregate(
    state: &AppState,
    request: AggregationRequest,
) -> Result<Json<RecentTransactionsResponse>, GatewayError> {
    let recent = state
        .aggregator
        .recent_transactions(&request)
        .await
        .map_err(|e| reported(e, "recent_transactions"))?;

    Ok(Json(RecentTransactionsResponse::from(&recent)))
}

/// POST /send with `{ to, amountEth }`, bare or wrapped in an event `body`
pub async fn post_send(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TransferResponse>, GatewayError> {
    let result = async {
        let request = decode_body::<TransferRequest>(&body)?;
        let transfer = validate_transfer(&request)?;

        // A missing credential only surfaces once the request itself is valid
        let submitter = state
            .submitter
            .as_ref()
            .ok_or(GatewayError::Submission(SubmissionError::MissingCredential))?;

        submitter.submit(&transfer).await
    }
    .await;

    let hash = result.map_err(|e| reported(e, "post_send"))?;

    LogContext::new("api", "post_send")
        .with_transaction_hash(&hex::encode_prefixed(hash.as_slice()))
        .info("Transfer accepted by node");

    Ok(Json(TransferResponse {
        hash: hex::encode_prefixed(hash.as_slice()),
    }))
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        write_path_enabled: state.submitter.is_some(),
    })
}

async fn get_only() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json(ErrorResponse::new("GET only")))
}

async fn post_only() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json(ErrorResponse::new("POST only")))
}

/// An empty body reads as `{}`
fn decode_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    let raw: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(|e| GatewayError::input(format!("malformed request body: {}", e)))?
    };

    let payload = unwrap_event_body(raw)?;
    serde_json::from_value(payload).map_err(|e| GatewayError::input(format!("invalid request: {}", e)))
}

fn reported(error: GatewayError, operation: &str) -> GatewayError {
    ErrorLogger::log_error(&error, Some(LogContext::new("api", operation)));
    error
}
