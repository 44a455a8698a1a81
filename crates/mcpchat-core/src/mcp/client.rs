//! MCP client using the official rmcp SDK
//!
//! Connects to MCP servers over child-process stdio or streamable HTTP.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rmcp::{
    ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool as McpTool,
    },
    service::{Peer, RunningService},
    transport::{StreamableHttpClientTransport, TokioChildProcess},
    RoleClient,
};
use serde_json::Value;
use tokio::process::Command;

use crate::config::ServerConfig;
use crate::logging::Logger;
use crate::types::Tool;

use super::error::{McpError, McpResult};
use super::provider::{ProviderConnector, ToolOutput, ToolProvider};

/// Connection to one MCP server
pub struct McpClient {
    /// Configured server name
    name: String,
    /// Running rmcp service; taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    /// Request handle, usable without holding the service lock
    peer: Peer<RoleClient>,
    closed: AtomicBool,
    logger: Arc<dyn Logger>,
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "mcpchat".to_string(),
            title: Some("mcpchat".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

impl McpClient {
    /// Open a connection described by `config`
    pub async fn connect(
        name: &str,
        config: &ServerConfig,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        match config {
            ServerConfig::Stdio { command, args, env } => {
                logger.info(&format!(
                    "[McpClient] Spawning {}: {}",
                    name,
                    config.describe()
                ));
                let mut cmd = Command::new(command);
                cmd.args(args).envs(env);
                let transport = TokioChildProcess::new(cmd)
                    .map_err(|e| McpError::connection_failed(name, e))?;
                Self::initialize(name, transport, logger).await
            }
            ServerConfig::Http { url } => {
                logger.info(&format!("[McpClient] Connecting {} over HTTP: {}", name, url));
                let transport = StreamableHttpClientTransport::from_uri(url.as_str());
                Self::initialize(name, transport, logger).await
            }
        }
    }

    async fn initialize<T, E, A>(
        name: &str,
        transport: T,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self>
    where
        T: rmcp::transport::IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed {
                provider: name.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(info) = service.peer_info() {
            logger.info(&format!(
                "[McpClient] {} initialized (server: {} {})",
                name, info.server_info.name, info.server_info.version
            ));
        }

        let peer = service.peer().clone();
        Ok(Self {
            name: name.to_string(),
            service: Mutex::new(Some(service)),
            peer,
            closed: AtomicBool::new(false),
            logger,
        })
    }

    fn ensure_open(&self) -> McpResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(McpError::Closed(self.name.clone()));
        }
        Ok(())
    }
}

/// Convert an rmcp tool into a descriptor, rejecting nameless tools
pub(crate) fn descriptor_from_mcp(provider: &str, tool: McpTool) -> McpResult<Tool> {
    if tool.name.trim().is_empty() {
        return Err(McpError::protocol(provider, "tool with empty name"));
    }
    Ok(Tool {
        name: tool.name.to_string(),
        description: tool.description.map(|s| s.to_string()).unwrap_or_default(),
        input_schema: Value::Object(tool.input_schema.as_ref().clone()),
    })
}

/// Flatten an MCP call result into text for the conversation
///
/// Text parts are joined by newlines; other parts are kept as their JSON form,
/// or a placeholder naming the error if they cannot be serialized.
pub(crate) fn output_from_mcp(result: CallToolResult) -> ToolOutput {
    let content = result
        .content
        .iter()
        .map(|c| match &c.raw {
            RawContent::Text(t) => t.text.clone(),
            _ => serde_json::to_string(c)
                .unwrap_or_else(|e| format!("[unreadable tool content: {}]", e)),
        })
        .collect::<Vec<_>>()
        .join("\n");

    ToolOutput {
        content,
        is_error: result.is_error.unwrap_or(false),
    }
}

#[async_trait]
impl ToolProvider for McpClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        self.ensure_open()?;
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::protocol(&self.name, e))?;

        self.logger.info(&format!(
            "[McpClient] {} listed {} tools",
            self.name,
            tools.len()
        ));

        tools
            .into_iter()
            .map(|t| descriptor_from_mcp(&self.name, t))
            .collect()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput> {
        self.ensure_open()?;
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(McpError::InvalidArguments {
                    tool: name.to_string(),
                    reason: format!("expected a JSON object, got {}", other),
                })
            }
        };

        self.logger.debug(&format!("[McpClient] {} calling tool: {}", self.name, name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments,
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::tool_call_failed(&self.name, name, e))?;

        Ok(output_from_mcp(result))
    }

    async fn close(&self) -> McpResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        let service = self.service.lock().take();
        let Some(service) = service else {
            return Ok(());
        };

        self.logger.info(&format!("[McpClient] Closing connection to {}", self.name));
        service
            .cancel()
            .await
            .map_err(|e| McpError::protocol(&self.name, e))?;
        Ok(())
    }
}

/// Connector that opens real MCP connections
pub struct McpConnector {
    logger: Arc<dyn Logger>,
}

impl McpConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl ProviderConnector for McpConnector {
    async fn connect(&self, name: &str, config: &ServerConfig) -> McpResult<Arc<dyn ToolProvider>> {
        let client = McpClient::connect(name, config, Arc::clone(&self.logger)).await?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use rmcp::model::Content;
    use serde_json::json;

    #[test]
    fn test_descriptor_from_mcp() {
        let tool: McpTool = serde_json::from_value(json!({
            "name": "add",
            "description": "Add two numbers",
            "inputSchema": {
                "type": "object",
                "properties": { "a": { "type": "number" }, "b": { "type": "number" } }
            }
        }))
        .unwrap();

        let descriptor = descriptor_from_mcp("math", tool).unwrap();
        assert_eq!(descriptor.name, "add");
        assert_eq!(descriptor.description, "Add two numbers");
        assert_eq!(descriptor.input_schema["properties"]["a"]["type"], "number");
    }

    #[test]
    fn test_descriptor_rejects_empty_name() {
        let tool: McpTool = serde_json::from_value(json!({
            "name": "  ",
            "inputSchema": { "type": "object" }
        }))
        .unwrap();
        assert!(matches!(
            descriptor_from_mcp("math", tool),
            Err(McpError::Protocol { .. })
        ));
    }

    #[test]
    fn test_output_joins_text_parts() {
        let result = CallToolResult::success(vec![Content::text("4"), Content::text("done")]);
        let output = output_from_mcp(result);
        assert_eq!(output, ToolOutput::text("4\ndone"));
    }

    #[test]
    fn test_output_keeps_non_text_parts_as_json() {
        let result = CallToolResult::success(vec![
            Content::text("chart:"),
            Content::image("aGVsbG8=", "image/png"),
        ]);
        let output = output_from_mcp(result);
        let mut lines = output.content.lines();
        assert_eq!(lines.next(), Some("chart:"));
        let image: Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(image["mimeType"], "image/png");
        assert_eq!(image["data"], "aGVsbG8=");
    }

    #[test]
    fn test_output_keeps_tool_error_flag() {
        let result = CallToolResult::error(vec![Content::text("bad input")]);
        let output = output_from_mcp(result);
        assert!(output.is_error);
        assert_eq!(output.content, "bad input");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_connection_failed() {
        let config = ServerConfig::stdio("/nonexistent/mcpchat-test-server-binary");
        let err = McpClient::connect("ghost", &config, Arc::new(NoOpLogger))
            .await
            .err()
            .expect("spawn should fail");
        assert!(matches!(
            err,
            McpError::ConnectionFailed { ref provider, .. } if provider == "ghost"
        ));
    }
}
