//! Configuration provider trait

use std::path::PathBuf;

use async_trait::async_trait;

use super::model::ConfigFile;

/// Source of the provider and chat configuration
///
/// Implementations:
/// - `MemoryConfigProvider`: in-memory for testing
/// - `FileConfigProvider`: `server_config.json` or a YAML equivalent
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Load the full configuration
    ///
    /// Any error here is fatal at startup.
    async fn load(&self) -> ConfigResult<ConfigFile>;
}

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Server '{server}' references unset environment variable '{var}'")]
    UnresolvedVariable { server: String, var: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
