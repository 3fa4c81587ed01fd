use clap::Parser;
use evm_tx_gateway::api::{ApiServer, AppState};
use evm_tx_gateway::blockchain::services_from_config;
use evm_tx_gateway::config::AppConfig;
use evm_tx_gateway::logging::{init_logging, LogContext};

#[derive(Parser)]
#[command(name = "evm-tx-gateway-server")]
#[command(about = "HTTP gateway for recent EVM transactions and native transfers")]
#[command(version)]
struct Args {
    /// Server port, overrides API_PORT and the config file
    #[arg(long)]
    port: Option<u16>,

    /// Bind host, overrides API_HOST and the config file
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(host) = args.host {
        config.api.host = host;
    }

    init_logging(&config.logging);

    let (aggregator, submitter) = services_from_config(&config)?;

    let context = LogContext::new("server", "startup")
        .with_metadata("rpc_endpoint", serde_json::json!(config.rpc.endpoint))
        .with_metadata("write_path_enabled", serde_json::json!(submitter.is_some()));
    match submitter.as_ref() {
        Some(submitter) => context.with_address(&submitter.sender().to_string()).info("Starting gateway"),
        None => context.warn("Starting gateway without a signing key; /send will fail"),
    }

    let server = ApiServer::new(AppState::new(aggregator, submitter), config.bind_address())
        .with_cors(config.api.cors_enabled);

    if let Err(e) = server.start().await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
