use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "billing-server")]
#[command(about = "Customer tier and contract SLA lookups over MCP and HTTP", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "billing.toml", env = "BILLING_CONFIG")]
    config: PathBuf,

    /// Dataset file with customers and contracts (built-in seed data when omitted)
    #[arg(short, long, env = "BILLING_DATASET")]
    dataset: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "BILLING_PORT")]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "BILLING_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billing_server=info,billing_mcp=info,tower_http=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    tracing::info!("Starting billing lookup server");

    // Load configuration
    let mut config = ServerConfig::load(&args.config)?;
    config.apply_overrides(args.host, args.port, args.dataset);

    tracing::info!("Starting API server on {}", config.bind_addr());

    api::serve(config).await?;

    Ok(())
}
