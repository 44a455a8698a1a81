//! Provider connection traits
//!
//! `ToolProvider` is one open channel; `ProviderConnector` opens them. The
//! registry and connection pool only see these traits, so tests can swap in
//! in-process fakes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::types::Tool;

use super::error::McpResult;

/// Result payload of a successful round trip
///
/// `is_error` is the provider reporting a tool-level failure; the call
/// itself still completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// One live channel to a tool-hosting process
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Configured provider name, for diagnostics
    fn name(&self) -> &str;

    /// False once `close()` has run
    fn is_open(&self) -> bool;

    /// Capabilities the provider currently exposes
    async fn list_tools(&self) -> McpResult<Vec<Tool>>;

    /// Invoke one capability and wait for its result
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput>;

    /// Release the channel; calling it again is a no-op
    async fn close(&self) -> McpResult<()>;
}

/// Opens provider connections from configuration
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    async fn connect(&self, name: &str, config: &ServerConfig) -> McpResult<Arc<dyn ToolProvider>>;
}
