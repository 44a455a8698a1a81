//! Core types for conversations and capability calls
//!
//! This module contains the shared types passed between the registry,
//! the model gateway and the chat session.

mod message;
mod tool;
mod cancellation;

pub use message::{ContentBlock, Role, Turn};
pub use tool::{Tool, ToolCall, ToolResult};
pub use cancellation::{CancellationToken, Cancelled};
