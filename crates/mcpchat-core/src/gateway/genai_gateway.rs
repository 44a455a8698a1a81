//! GenaiGateway - model access through the genai crate
//!
//! genai picks the provider adapter from the model name (`claude-*` is
//! Anthropic, `gpt-*` is OpenAI, ...). Keys come from our secret store.

use std::sync::Arc;

use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::ChatRequest;
use genai::Client;

use crate::logging::Logger;
use crate::secrets::SecretStore;
use crate::types::{Tool, Turn};

use super::error::{GatewayError, GatewayResult};
use super::genai_adapter::{
    adapter_kind_to_secret_key, create_client, from_genai_response, requires_api_key,
    to_genai_messages, to_genai_options, to_genai_tools,
};
use super::traits::{GatewayConfig, ModelGateway};

/// Gateway for every genai-supported API
pub struct GenaiGateway {
    config: GatewayConfig,
    client: Client,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
}

impl GenaiGateway {
    pub fn new(
        config: GatewayConfig,
        secrets: Arc<dyn SecretStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let client = create_client(Arc::clone(&secrets));
        Self {
            config,
            client,
            secrets,
            logger,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Adapter genai will use for the configured model
    pub fn adapter_kind(&self) -> GatewayResult<AdapterKind> {
        AdapterKind::from_model(&self.config.model).map_err(|e| {
            GatewayError::InvalidRequest(format!("unknown model {}: {}", self.config.model, e))
        })
    }

    /// Fail early when the adapter needs a key and none is configured
    fn check_auth(&self, adapter: AdapterKind) -> GatewayResult<()> {
        let key = adapter_kind_to_secret_key(adapter);
        if requires_api_key(adapter) && !self.secrets.has(&key) {
            return Err(GatewayError::MissingApiKey { provider: key });
        }
        Ok(())
    }
}

#[async_trait]
impl ModelGateway for GenaiGateway {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn send(&self, history: &[Turn], catalog: &[Tool]) -> GatewayResult<Turn> {
        let adapter = self.adapter_kind()?;
        self.check_auth(adapter)?;

        self.logger.debug(&format!(
            "[GenaiGateway] send: model={}, adapter={:?}, turns={}, tools={}",
            self.config.model,
            adapter,
            history.len(),
            catalog.len()
        ));

        let mut chat_req = ChatRequest::new(to_genai_messages(history)?);
        if let Some(system) = &self.config.system_prompt {
            chat_req = chat_req.with_system(system);
        }
        if !catalog.is_empty() {
            chat_req = chat_req.with_tools(to_genai_tools(catalog));
        }

        let options = to_genai_options(self.config.max_tokens);

        let response = self
            .client
            .exec_chat(&self.config.model, chat_req, Some(&options))
            .await
            .map_err(|e| {
                self.logger.error(&format!("[GenaiGateway] Request failed: {}", e));
                GatewayError::api_error(adapter_kind_to_secret_key(adapter), e.to_string())
            })?;

        let turn = from_genai_response(&response);
        self.logger.debug(&format!(
            "[GenaiGateway] Received turn: {} blocks, {} tool calls",
            turn.content.len(),
            turn.tool_calls().len()
        ));

        Ok(turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    fn gateway(model: &str, secrets: MemorySecretStore) -> GenaiGateway {
        GenaiGateway::new(GatewayConfig::new(model), Arc::new(secrets), Arc::new(NoOpLogger))
    }

    #[test]
    fn test_adapter_from_model() {
        let gw = gateway("claude-3-7-sonnet-20250219", MemorySecretStore::new());
        assert_eq!(gw.adapter_kind().unwrap(), AdapterKind::Anthropic);
        assert_eq!(gw.name(), "claude-3-7-sonnet-20250219");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let gw = gateway("claude-3-7-sonnet-20250219", MemorySecretStore::new());
        let err = gw.send(&[Turn::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::MissingApiKey { ref provider } if provider == "anthropic"
        ));
    }

    #[test]
    fn test_key_present_passes_auth_check() {
        let gw = gateway(
            "claude-3-7-sonnet-20250219",
            MemorySecretStore::new().with("anthropic", "sk-test"),
        );
        assert!(gw.check_auth(AdapterKind::Anthropic).is_ok());
    }
}
