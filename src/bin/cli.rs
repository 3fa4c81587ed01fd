use clap::Parser;
use evm_tx_gateway::api::{cli::write_sample_config, Cli, CliHandler, Commands};
use evm_tx_gateway::blockchain::services_from_config;
use evm_tx_gateway::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Less verbose than the server
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        if let Err(e) = write_sample_config(output.as_deref()) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(rpc_url) = cli.rpc_url.clone() {
        config.rpc.endpoint = rpc_url;
        config.validate()?;
    }

    let (aggregator, submitter) = services_from_config(&config)?;
    let handler = CliHandler::new(aggregator, submitter);

    if let Err(e) = handler.execute_command(&cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
