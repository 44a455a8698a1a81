//! Provider connection errors

use thiserror::Error;

/// Errors raised by a tool provider connection
#[derive(Error, Debug)]
pub enum McpError {
    /// The channel could not be opened (spawn failure, unreachable URL)
    #[error("Failed to connect to {provider}: {reason}")]
    ConnectionFailed { provider: String, reason: String },

    /// The channel opened but the MCP handshake failed
    #[error("Failed to initialize {provider}: {reason}")]
    InitializationFailed { provider: String, reason: String },

    /// The provider answered with something we cannot use
    #[error("Protocol error from {provider}: {reason}")]
    Protocol { provider: String, reason: String },

    /// A capability invocation failed
    #[error("Tool '{tool}' on {provider} failed: {reason}")]
    ToolCallFailed {
        provider: String,
        tool: String,
        reason: String,
    },

    /// Arguments were not a JSON object
    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Used after `close()`
    #[error("Connection to {0} is closed")]
    Closed(String),
}

impl McpError {
    pub fn connection_failed(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConnectionFailed {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn protocol(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::Protocol {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn tool_call_failed(
        provider: impl Into<String>,
        tool: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::ToolCallFailed {
            provider: provider.into(),
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
