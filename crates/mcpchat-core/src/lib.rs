//! mcpchat Core
//!
//! Lets a language model call tools hosted by MCP servers during a
//! multi-turn conversation. This crate has no terminal or runtime-specific
//! code; the `mcpchat` binary is a thin shell around it.
//!
//! ## Orchestration
//!
//! - `lifecycle::ConnectionPool` opens every configured server and closes
//!   them in reverse order when the session ends
//! - `tools::ToolRegistry` merges their tool catalogs into one namespace
//! - `chat::ChatSession` runs the model/tool loop for each query
//!
//! ```rust,ignore
//! use mcpchat_core::{ChatSession, ConnectionPool, McpConnector, ToolRegistry};
//!
//! let registry = Arc::new(ToolRegistry::new(logger.clone()));
//! let pool = ConnectionPool::new(logger.clone());
//! pool.acquire_all(&config.mcp_servers, &McpConnector::new(logger.clone()), &registry).await;
//!
//! let mut session = ChatSession::new(gateway, registry, logger);
//! pool.scoped(|| async {
//!     let outcome = session.process_query("what is 2+2", &cancel).await?;
//!     println!("{}", outcome.text);
//!     Ok::<_, ChatError>(())
//! })
//! .await?;
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod gateway;
pub mod mcp;
pub mod tools;
pub mod chat;
pub mod lifecycle;

// Re-export commonly used types
pub use types::{
    ContentBlock, Role, Turn,
    Tool, ToolCall, ToolResult,
    CancellationToken, Cancelled,
};

pub use secrets::{SecretStore, EnvSecretStore, MemorySecretStore};

pub use logging::{Logger, LogLevel, NoOpLogger, ConsoleLogger, MemoryLogger};

pub use config::{
    ConfigProvider, ConfigError, ConfigResult, ConfigFile, ChatSettings,
    ServerConfig, ServerList, FileConfigProvider, MemoryConfigProvider,
};

pub use gateway::{
    create_gateway, GatewayConfig, GatewayError, GatewayResult, GenaiGateway, MockGateway,
    ModelGateway,
};

pub use mcp::{
    McpClient, McpConnector, McpError, McpResult, ProviderConnector, ToolOutput, ToolProvider,
};

pub use tools::{ToolError, ToolFilter, ToolRegistry};

pub use chat::{ChatError, ChatEvent, ChatResult, ChatSession, QueryOutcome, QueryState};

pub use lifecycle::{AcquireReport, ConnectionPool};
