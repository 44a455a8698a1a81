//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::model::{ChatSettings, ConfigFile, ServerConfig};
use super::traits::{ConfigProvider, ConfigResult};

/// In-memory configuration, for tests and for embedding without a file
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    config: RwLock<ConfigFile>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConfigFile) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Add (or replace) a server
    pub fn with_server(self, name: impl Into<String>, server: ServerConfig) -> Self {
        self.config.write().mcp_servers.insert(name, server);
        self
    }

    pub fn with_chat(self, chat: ChatSettings) -> Self {
        self.config.write().chat = chat;
        self
    }

    /// Replace the configuration
    pub fn set(&self, config: ConfigFile) {
        *self.config.write() = config;
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn load(&self) -> ConfigResult<ConfigFile> {
        Ok(self.config.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder() {
        let provider = MemoryConfigProvider::new()
            .with_server("math", ServerConfig::stdio("math-server"))
            .with_server("search", ServerConfig::http("http://localhost:1/mcp"));

        let config = provider.load().await.unwrap();
        assert_eq!(config.mcp_servers.names(), vec!["math", "search"]);

        provider.set(ConfigFile::default());
        assert!(provider.load().await.unwrap().mcp_servers.is_empty());
    }
}
