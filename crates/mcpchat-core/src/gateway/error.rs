//! Gateway error types

use thiserror::Error;

/// Errors from a model round trip
///
/// Any of these ends the current query; the session and the provider
/// connections stay usable.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No API key could be resolved
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// The model API rejected or failed the request
    #[error("{provider} API error: {message}")]
    ApiError { provider: String, message: String },

    /// History or catalog could not be converted for the API
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    pub fn api_error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
