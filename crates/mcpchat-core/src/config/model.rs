//! Configuration file model

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::traits::{ConfigError, ConfigResult};

/// How to reach one tool provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerConfig {
    /// Spawn a child process and speak MCP over its stdio
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },
    /// Connect to a streamable HTTP endpoint
    Http { url: String },
}

impl ServerConfig {
    /// Stdio server with no arguments or extra environment
    pub fn stdio(command: impl Into<String>) -> Self {
        ServerConfig::Stdio {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        ServerConfig::Http { url: url.into() }
    }

    /// Append command-line arguments (no-op for HTTP servers)
    pub fn with_args<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let ServerConfig::Stdio { args, .. } = &mut self {
            args.extend(extra.into_iter().map(Into::into));
        }
        self
    }

    /// Set an environment variable for the child (no-op for HTTP servers)
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let ServerConfig::Stdio { env, .. } = &mut self {
            env.insert(key.into(), value.into());
        }
        self
    }

    /// Short human-readable target, for logs
    pub fn describe(&self) -> String {
        match self {
            ServerConfig::Stdio { command, args, .. } if args.is_empty() => command.clone(),
            ServerConfig::Stdio { command, args, .. } => format!("{} {}", command, args.join(" ")),
            ServerConfig::Http { url } => url.clone(),
        }
    }
}

/// Ordered `name -> ServerConfig` map
///
/// Providers are connected in declaration order, so the order in the file
/// is kept. A repeated name replaces the earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerList(Vec<(String, ServerConfig)>);

impl ServerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a server, keeping the position of an existing entry
    pub fn insert(&mut self, name: impl Into<String>, config: ServerConfig) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = config,
            None => self.0.push((name, config)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServerConfig)> {
        self.0.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, ServerConfig)> for ServerList {
    fn from_iter<T: IntoIterator<Item = (N, ServerConfig)>>(iter: T) -> Self {
        let mut list = ServerList::new();
        for (name, config) in iter {
            list.insert(name, config);
        }
        list
    }
}

impl IntoIterator for ServerList {
    type Item = (String, ServerConfig);
    type IntoIter = std::vec::IntoIter<(String, ServerConfig)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for ServerList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, config) in &self.0 {
            map.serialize_entry(name, config)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ServerList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ServerListVisitor;

        impl<'de> Visitor<'de> for ServerListVisitor {
            type Value = ServerList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of server name to server configuration")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ServerList, A::Error> {
                let mut list = ServerList::new();
                while let Some((name, config)) = access.next_entry::<String, ServerConfig>()? {
                    list.insert(name, config);
                }
                Ok(list)
            }
        }

        deserializer.deserialize_map(ServerListVisitor)
    }
}

/// Settings for the chat session and model gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Model identifier passed to the gateway
    pub model: String,
    /// Maximum tokens per model turn
    pub max_tokens: u32,
    /// Maximum tool-dispatch rounds per query
    pub max_rounds: usize,
    /// Optional system prompt sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Capabilities never offered to the model
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded_tools: Vec<String>,
}

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_MAX_TOKENS: u32 = 2024;
pub const DEFAULT_MAX_ROUNDS: usize = 10;

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_rounds: DEFAULT_MAX_ROUNDS,
            system_prompt: None,
            excluded_tools: Vec::new(),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: ServerList,

    #[serde(default)]
    pub chat: ChatSettings,
}

impl ConfigFile {
    /// Expand `${VAR}` references in stdio server `env` values
    pub fn expand_env<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (name, config) in self.mcp_servers.0.iter_mut() {
            if let ServerConfig::Stdio { env, .. } = config {
                for value in env.values_mut() {
                    *value = expand_vars(value, &lookup).map_err(|var| {
                        ConfigError::UnresolvedVariable {
                            server: name.clone(),
                            var,
                        }
                    })?;
                }
            }
        }
        Ok(self)
    }
}

/// Replace each `${NAME}` with `lookup(NAME)`; returns the first unknown name
fn expand_vars<F>(input: &str, lookup: &F) -> Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated reference, keep verbatim
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let var = &after[..end];
        let value = lookup(var).ok_or_else(|| var.to_string())?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
