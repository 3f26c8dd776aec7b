// Standalone MCP server binary (stdio transport)

use anyhow::{Context, Result};
use billing_core::{BillingDataset, LookupService};
use billing_mcp::protocol::ServerInfo;
use billing_mcp::server::McpServer;
use billing_mcp::tools::lookup_registry;
use billing_mcp::DEFAULT_SERVER_NAME;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries protocol frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billing_mcp=info,billing_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Billing MCP server starting...");

    // Optional dataset file; the built-in seed data is used otherwise
    let dataset_path = std::env::var("BILLING_DATASET").ok().map(PathBuf::from);
    let dataset = BillingDataset::load_or_seed(dataset_path.as_deref())
        .context("Failed to load billing dataset")?;

    let server_name =
        std::env::var("BILLING_SERVER_NAME").unwrap_or_else(|_| DEFAULT_SERVER_NAME.to_string());

    let service = Arc::new(LookupService::new(dataset));
    let registry = lookup_registry(service);

    tracing::info!("Registered {} tools", registry.len());

    // Start MCP server
    let server = McpServer::new(ServerInfo::new(server_name), registry);
    server.serve_stdio().await?;

    Ok(())
}
