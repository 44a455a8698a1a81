//! Configuration sources
//!
//! Supports:
//! - `FileConfigProvider`: JSON or YAML file with an `mcpServers` map
//! - `MemoryConfigProvider`: in-memory, for tests and embedding

mod traits;
mod model;
mod memory;
mod file;

pub use traits::{ConfigProvider, ConfigError, ConfigResult};
pub use model::{ChatSettings, ConfigFile, ServerConfig, ServerList};
pub use memory::MemoryConfigProvider;
pub use file::{ConfigFormat, FileConfigProvider, DEFAULT_CONFIG_FILE};
