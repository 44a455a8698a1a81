//! Model gateway trait definition

use async_trait::async_trait;

use crate::config::ChatSettings;
use crate::types::{Tool, Turn};

use super::error::GatewayResult;

/// Model settings for gateway requests
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Model identifier; genai infers the adapter from it
    pub model: String,
    /// Maximum tokens to generate per turn
    pub max_tokens: u32,
    /// System prompt sent with every request
    pub system_prompt: Option<String>,
}

impl GatewayConfig {
    pub fn new(model: impl Into<String>) -> Self {
        let defaults = ChatSettings::default();
        Self {
            model: model.into(),
            max_tokens: defaults.max_tokens,
            system_prompt: None,
        }
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

impl From<&ChatSettings> for GatewayConfig {
    fn from(settings: &ChatSettings) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            system_prompt: settings.system_prompt.clone(),
        }
    }
}

/// Stateless request/response access to a language model
///
/// Implementations must not keep conversation state: everything the model
/// should see is in `history`.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Gateway name, for logs
    fn name(&self) -> &str;

    /// Produce the next assistant turn
    async fn send(&self, history: &[Turn], catalog: &[Tool]) -> GatewayResult<Turn>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = ChatSettings {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            system_prompt: Some("Be brief.".to_string()),
            ..Default::default()
        };
        let config = GatewayConfig::from(&settings);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.system_prompt.as_deref(), Some("Be brief."));
    }

    #[test]
    fn test_builder() {
        let config = GatewayConfig::new("claude-3-5-haiku-latest")
            .with_max_tokens(100)
            .with_system_prompt("x");
        assert_eq!(config.max_tokens, 100);
        assert!(config.system_prompt.is_some());
    }
}
