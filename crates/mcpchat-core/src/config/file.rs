//! File-based configuration provider (JSON or YAML)
//!
//! Looks for `server_config.json` in the working directory, then
//! `<config dir>/mcpchat/servers.json`.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::model::ConfigFile;
use super::traits::{ConfigError, ConfigProvider, ConfigResult};

/// File name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "server_config.json";

/// Serialization format, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase) {
            Some(ext) if ext == "yaml" || ext == "yml" => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }

    pub fn parse(&self, content: &str) -> ConfigResult<ConfigFile> {
        match self {
            ConfigFormat::Json => Ok(serde_json::from_str(content)?),
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(content)?),
        }
    }
}

/// Reads the configuration from a file on disk
///
/// # Example
///
/// ```no_run
/// use mcpchat_core::config::{ConfigProvider, FileConfigProvider};
///
/// # async fn run() -> mcpchat_core::config::ConfigResult<()> {
/// let provider = FileConfigProvider::discover();
/// let config = provider.load().await?;
/// println!("{} servers configured", config.mcp_servers.len());
/// # Ok(())
/// # }
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `./server_config.json` if present, otherwise the user-level file
    pub fn discover() -> Self {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::new(local);
        }
        Self::new(Self::user_path())
    }

    /// `~/.config/mcpchat/servers.json` (platform config dir)
    pub fn user_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        config_dir.join("mcpchat").join("servers.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> ConfigResult<ConfigFile> {
        if !self.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }
        let content = fs::read_to_string(&self.path)?;
        ConfigFormat::from_path(&self.path)
            .parse(&content)?
            .expand_env(|var| std::env::var(var).ok())
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn load(&self) -> ConfigResult<ConfigFile> {
        self.read()
    }
}
