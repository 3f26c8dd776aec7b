use anyhow::{Context, Result};
use billing_core::{BillingDataset, LookupService};
use billing_mcp::protocol::ServerInfo;
use billing_mcp::tools::lookup_registry;
use billing_mcp::{McpServer, DEFAULT_SERVER_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,

    #[serde(default)]
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Name advertised to MCP clients and on the health endpoint
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// TOML file with customers and contracts; the seed data is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Command-line values win over the file
    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
        dataset: Option<PathBuf>,
    ) {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if dataset.is_some() {
            self.dataset.path = dataset;
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub name: String,
    pub service: Arc<LookupService>,
    pub mcp: Arc<McpServer>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let dataset = BillingDataset::load_or_seed(config.dataset.path.as_deref())
            .context("Failed to load billing dataset")?;

        Ok(Self::with_service(
            config.server.name.clone(),
            Arc::new(LookupService::new(dataset)),
        ))
    }

    /// Wire the MCP dispatcher and the REST handlers to the same service
    pub fn with_service(name: String, service: Arc<LookupService>) -> Self {
        let mcp = Arc::new(McpServer::new(
            ServerInfo::new(name.clone()),
            lookup_registry(service.clone()),
        ));

        Self { name, service, mcp }
    }
}
