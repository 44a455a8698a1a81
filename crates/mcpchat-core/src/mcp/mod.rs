//! Tool provider connections (Model Context Protocol)
//!
//! Uses the official rmcp SDK. A provider is either a child process spoken
//! to over stdio or a streamable HTTP endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcpchat_core::mcp::{McpClient, ToolProvider};
//! use mcpchat_core::config::ServerConfig;
//!
//! let config = ServerConfig::stdio("uvx").with_args(["mcp-server-fetch"]);
//! let client = McpClient::connect("fetch", &config, logger).await?;
//!
//! let tools = client.list_tools().await?;
//! let output = client.call_tool("fetch", json!({ "url": "https://example.com" })).await?;
//! client.close().await?;
//! ```

mod error;
mod provider;
mod client;

pub use error::{McpError, McpResult};
pub use provider::{ProviderConnector, ToolOutput, ToolProvider};
pub use client::{McpClient, McpConnector};
