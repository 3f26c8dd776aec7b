// MCP server: JSON-RPC dispatch over a tool registry, plus the stdio transport

use crate::codec::{Frame, JsonLineCodec};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, DEFAULT_PROTOCOL_VERSION, JSONRPC_VERSION,
};
use crate::tools::{InvalidArguments, ToolRegistry};
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

/// Transport-independent MCP request handler.
///
/// Holds no per-connection state, so one instance can serve stdio and any
/// number of concurrent HTTP requests.
pub struct McpServer {
    info: ServerInfo,
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(info: ServerInfo, registry: ToolRegistry) -> Self {
        Self { info, registry }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw JSON-RPC message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse message: {}", e);
                return Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Malformed request: {}", e);
                return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        self.handle(request).await
    }

    /// Handle a decoded request. Returns `None` for notifications.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let outcome = self.dispatch(&method, params).await;

        match id {
            None => {
                if let Err(e) = outcome {
                    tracing::debug!("Notification {} failed: {}", method, e.message);
                }
                None
            }
            Some(id) => Some(match outcome {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(error) => {
                    tracing::warn!("Request {} failed: {}", method, error.message);
                    JsonRpcResponse::error(id, error)
                }
            }),
        }
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, JsonRpcError> {
        match method {
            "initialize" => self.initialize(params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => to_result(&ListToolsResult {
                tools: self.registry.list_schemas(),
            }),
            "tools/call" => self.call_tool(params).await,
            m if m.starts_with("notifications/") => {
                tracing::debug!("Received notification {}", m);
                Ok(serde_json::Value::Null)
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize(
        &self,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, JsonRpcError> {
        let params: Option<InitializeParams> = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e))
            })?;

        let protocol_version = match &params {
            Some(p) => {
                if let Some(client) = &p.client_info {
                    tracing::info!("Client connected: {} {}", client.name, client.version);
                }
                p.protocol_version.clone()
            }
            None => DEFAULT_PROTOCOL_VERSION.to_string(),
        };

        to_result(&InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: self.info.clone(),
        })
    }

    async fn call_tool(
        &self,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
        let params: CallToolParams = serde_json::from_value(params).map_err(|e| {
            JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e))
        })?;

        let tool = self.registry.get(&params.name).ok_or_else(|| {
            JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name))
        })?;

        tracing::debug!("Calling tool {}", params.name);

        let result = match tool.execute(params.arguments).await {
            Ok(result) => result,
            Err(e) if e.downcast_ref::<InvalidArguments>().is_some() => {
                return Err(JsonRpcError::invalid_params(e.to_string()));
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {:#}", params.name, e);
                CallToolResult::error(e.to_string())
            }
        };

        to_result(&result)
    }

    /// Serve newline-delimited JSON-RPC until the reader hits EOF.
    ///
    /// Lines that are not valid UTF-8 or exceed [`MAX_LINE_LENGTH`] get a
    /// parse error reply; only I/O failures end the loop.
    ///
    /// [`MAX_LINE_LENGTH`]: crate::codec::MAX_LINE_LENGTH
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.serve_with_codec(reader, writer, JsonLineCodec::new()).await
    }

    async fn serve_with_codec<R, W>(&self, reader: R, writer: W, codec: JsonLineCodec) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frames = FramedRead::new(reader, codec);
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        while let Some(frame) = frames.next().await {
            let response = match frame.context("Failed to read from transport")? {
                Frame::Line(line) if line.trim().is_empty() => continue,
                Frame::Line(line) => self.handle_message(&line).await,
                Frame::Malformed(reason) => {
                    tracing::warn!("Rejected input line: {}", reason);
                    Some(JsonRpcResponse::error(
                        serde_json::Value::Null,
                        JsonRpcError::parse_error(),
                    ))
                }
            };

            if let Some(response) = response {
                let encoded =
                    serde_json::to_string(&response).context("Failed to encode response")?;
                sink.send(encoded).await.context("Failed to write to transport")?;
            }
        }

        tracing::info!("Transport closed, MCP server stopping");
        Ok(())
    }

    /// Serve over the process's stdin and stdout
    pub async fn serve_stdio(&self) -> Result<()> {
        tracing::info!(
            "MCP server {} {} listening on stdio",
            self.info.name,
            self.info.version
        );
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }
}

fn to_result(value: &impl Serialize) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{lookup_registry, Tool};
    use billing_core::LookupService;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn server() -> McpServer {
        let service = Arc::new(LookupService::seeded());
        McpServer::new(ServerInfo::new("Business-Client"), lookup_registry(service))
    }

    fn call(id: i64, name: &str, arguments: serde_json::Value) -> JsonRpcRequest {
        JsonRpcRequest::new(
            id,
            "tools/call",
            Some(serde_json::json!({"name": name, "arguments": arguments})),
        )
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let resp = server()
            .handle(JsonRpcRequest::new(
                1,
                "initialize",
                Some(serde_json::json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "inspector", "version": "0.1"}
                })),
            ))
            .await
            .unwrap();

        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "Business-Client");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_initialize_without_params_uses_default_version() {
        let resp = server()
            .handle(JsonRpcRequest::new(1, "initialize", None))
            .await
            .unwrap();
        assert_eq!(resp.result.unwrap()["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let server = server();
        let resp = server
            .handle(JsonRpcRequest::notification("notifications/initialized", None))
            .await;
        assert!(resp.is_none());

        let resp = server
            .handle(JsonRpcRequest::notification("tools/call", None))
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_ping_and_unknown_method() {
        let server = server();

        let pong = server.handle(JsonRpcRequest::new(2, "ping", None)).await.unwrap();
        assert_eq!(pong.result, Some(serde_json::json!({})));

        let resp = server
            .handle(JsonRpcRequest::new(3, "resources/list", None))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let resp = server()
            .handle(JsonRpcRequest::new(4, "tools/list", None))
            .await
            .unwrap();
        let tools = resp.result.unwrap()["tools"].clone();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["get-contract-sla", "get-customer-tier"]);
        assert_eq!(tools[1]["inputSchema"]["required"], serde_json::json!(["email"]));
    }

    #[tokio::test]
    async fn test_tools_call_found_and_not_found() {
        let server = server();

        let resp = server
            .handle(call(5, "get-customer-tier", serde_json::json!({"email": "alice@acme.com"})))
            .await
            .unwrap();
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.is_error.is_none());
        assert!(result.text_content().contains("\"tier\": \"Enterprise\""));

        let resp = server
            .handle(call(6, "get-contract-sla", serde_json::json!({"customer_id": "CUST_999"})))
            .await
            .unwrap();
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.is_error.is_none());
        assert!(result.text_content().contains("No active contract found"));
    }

    #[tokio::test]
    async fn test_tools_call_rejects_unknown_tool_and_bad_arguments() {
        let server = server();

        let resp = server
            .handle(call(7, "delete-customer", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);

        let resp = server
            .handle(call(8, "get-customer-tier", serde_json::json!({"email": 42})))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);

        let resp = server
            .handle(JsonRpcRequest::new(9, "tools/call", None))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    struct FailingTool;

    #[async_trait::async_trait]
    impl Tool for FailingTool {
        fn schema(&self) -> crate::protocol::ToolSchema {
            crate::protocol::ToolSchema {
                name: "explode".to_string(),
                description: "Always fails".to_string(),
                input_schema: serde_json::json!({"type": "object"}),
            }
        }

        async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
            anyhow::bail!("backend unavailable")
        }
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_error_content() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool));
        let server = McpServer::new(ServerInfo::new("test"), registry);

        let resp = server
            .handle(call(10, "explode", serde_json::json!({})))
            .await
            .unwrap();
        assert!(!resp.is_error());
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.text_content(), "Error: backend unavailable");
    }

    #[tokio::test]
    async fn test_handle_message_parse_and_version_errors() {
        let server = server();

        let resp = server.handle_message("{not json").await.unwrap();
        assert_eq!(resp.id, serde_json::Value::Null);
        assert_eq!(resp.error.unwrap().code, JsonRpcError::PARSE_ERROR);

        let resp = server
            .handle_message(r#"{"jsonrpc":"1.0","id":11,"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(resp.id, serde_json::json!(11));
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        let resp = server.handle_message(r#"{"jsonrpc":"2.0","id":12}"#).await.unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_serve_over_line_framed_stream() {
        let server = server();
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, mut client_out) = tokio::io::duplex(64 * 1024);

        client_in
            .write_all(
                concat!(
                    r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#, "\n",
                    r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, "\n",
                    "\n",
                    r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":"#,
                    r#"{"name":"get-contract-sla","arguments":{"customer_id":"CUST_001"}}}"#, "\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        drop(client_in);

        server.serve(server_in, server_out).await.unwrap();

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.unwrap();
        let responses: Vec<JsonRpcResponse> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, serde_json::json!(1));
        assert_eq!(responses[1].id, serde_json::json!(2));
        let result: CallToolResult =
            serde_json::from_value(responses[1].result.clone().unwrap()).unwrap();
        assert!(result.text_content().contains("99.99%"));
    }

    /// Feed `input` through the line transport and collect the replies
    async fn exchange(
        server: &McpServer,
        codec: JsonLineCodec,
        input: &[u8],
    ) -> Vec<JsonRpcResponse> {
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, mut client_out) = tokio::io::duplex(64 * 1024);

        client_in.write_all(input).await.unwrap();
        drop(client_in);

        server.serve_with_codec(server_in, server_out, codec).await.unwrap();

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

        let responses = exchange(&server(), JsonLineCodec::new(), &input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, serde_json::Value::Null);
        assert_eq!(responses[0].error.as_ref().unwrap().code, JsonRpcError::PARSE_ERROR);
        assert_eq!(responses[1].id, serde_json::json!(2));
        assert_eq!(responses[1].result, Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_serve_rejects_overlong_line_and_continues() {
        let mut input = vec![b'x'; 512];
        input.push(b'\n');
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n");

        let responses = exchange(&server(), JsonLineCodec::with_max_length(128), &input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].error.as_ref().unwrap().code, JsonRpcError::PARSE_ERROR);
        assert_eq!(responses[1].id, serde_json::json!(3));
        assert!(!responses[1].is_error());
    }

    #[tokio::test]
    async fn test_null_id_is_a_request() {
        let resp = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(resp.id, serde_json::Value::Null);
        assert_eq!(resp.result, Some(serde_json::json!({})));

        let resp = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"ping"}"#)
            .await;
        assert!(resp.is_none());
    }
}
