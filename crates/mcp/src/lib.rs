// MCP (Model Context Protocol) server exposing the billing lookups as tools

pub mod codec;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;

/// Name advertised in `serverInfo` unless overridden
pub const DEFAULT_SERVER_NAME: &str = "Business-Client";
