use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::blockchain::TransferSigner;
use crate::error::ConfigError;
use crate::models::{DEFAULT_COUNT, MAX_BLOCKS};

/// Gas for a plain native-asset transfer
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Main application configuration, loaded once at process start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub recent: RecentConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// RPC client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint of the chain node
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Server-held signing credential for the write path
#[derive(Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Hex private key; never serialized back out
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,
    /// Gas limit attached to each native transfer
    pub gas_limit: u64,
}

/// Read-path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentConfig {
    /// Block count used when a request does not name one
    pub default_count: u32,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub host: String,
    /// Answer CORS preflight and add permissive CORS headers
    pub cors_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            gas_limit: NATIVE_TRANSFER_GAS,
        }
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("gas_limit", &self.gas_limit)
            .finish()
    }
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            default_count: DEFAULT_COUNT,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file; a missing file yields defaults
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(endpoint) = env::var("RPC_URL") {
            self.rpc.endpoint = endpoint;
        }
        if let Some(timeout) = parse_env("RPC_TIMEOUT_SECONDS")? {
            self.rpc.timeout_seconds = timeout;
        }

        if let Ok(key) = env::var("SENDER_PRIV_KEY") {
            let key = key.trim().to_string();
            self.signer.private_key = if key.is_empty() { None } else { Some(key) };
        }
        if let Some(gas_limit) = parse_env("TRANSFER_GAS_LIMIT")? {
            self.signer.gas_limit = gas_limit;
        }

        if let Some(count) = parse_env("RECENT_DEFAULT_COUNT")? {
            self.recent.default_count = count;
        }

        if let Some(port) = parse_env("API_PORT")? {
            self.api.port = port;
        }
        if let Ok(host) = env::var("API_HOST") {
            self.api.host = host;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.rpc.endpoint.clone()));
        }

        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(invalid("rpc.timeout_seconds", self.rpc.timeout_seconds));
        }

        if self.signer.gas_limit < NATIVE_TRANSFER_GAS {
            return Err(invalid("signer.gas_limit", self.signer.gas_limit));
        }

        if self.recent.default_count == 0 || self.recent.default_count > MAX_BLOCKS {
            return Err(invalid("recent.default_count", self.recent.default_count));
        }

        if self.api.port == 0 {
            return Err(invalid("api.port", self.api.port));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid("logging.level", &self.logging.level));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid("logging.format", &self.logging.format));
        }

        self.transfer_signer()?;

        Ok(())
    }

    /// Build the signing credential; `None` when no key is configured
    pub fn transfer_signer(&self) -> Result<Option<TransferSigner>, ConfigError> {
        self.signer
            .private_key
            .as_deref()
            .map(TransferSigner::from_private_key)
            .transpose()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Save configuration to file (the signing key is never written)
    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parsing(e.to_string()))?;
        fs::write(path, content).map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value }),
        Err(_) => Ok(None),
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
