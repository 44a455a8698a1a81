//! Chat session errors

use thiserror::Error;

use crate::gateway::GatewayError;

/// Reasons a query ends without a final answer
///
/// The session history is rolled back to where it was before the query, so
/// the next query starts from a consistent conversation.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Model request failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Tool round limit of {0} exceeded")]
    RoundLimitExceeded(usize),

    #[error("Query cancelled")]
    Cancelled,
}

impl From<crate::types::Cancelled> for ChatError {
    fn from(_: crate::types::Cancelled) -> Self {
        ChatError::Cancelled
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
