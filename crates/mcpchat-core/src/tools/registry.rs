//! Capability registry
//!
//! The ToolRegistry is the single namespace the model sees:
//! - Aggregates descriptors from every connected provider
//! - Remembers which connection owns each name
//! - Filters what is offered to the model
//! - Routes invocations and converts their outcome into `ToolResult`s

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::logging::Logger;
use crate::mcp::{McpError, ToolOutput, ToolProvider};
use crate::types::{Tool, ToolCall, ToolResult};

/// Per-call registry failures; both become error results, never abort a query
#[derive(Error, Debug)]
pub enum ToolError {
    /// Model asked for a name nobody registered (hallucination or stale catalog)
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// The owning provider failed to run the call
    #[error(transparent)]
    Invocation(#[from] McpError),
}

/// Which descriptors are offered to the model
#[derive(Debug, Clone)]
pub struct ToolFilter {
    /// Never include tools with these names
    pub exclude: HashSet<String>,
    /// Only include enabled tools
    pub only_enabled: bool,
}

impl Default for ToolFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolFilter {
    pub fn new() -> Self {
        Self {
            exclude: HashSet::new(),
            only_enabled: true,
        }
    }

    /// Include everything, disabled tools too
    pub fn all() -> Self {
        Self {
            exclude: HashSet::new(),
            only_enabled: false,
        }
    }

    pub fn with_exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude = names.into_iter().collect();
        self
    }

    fn matches(&self, entry: &Entry) -> bool {
        if self.only_enabled && !entry.enabled {
            return false;
        }
        !self.exclude.contains(&entry.tool.name)
    }
}

/// Registered descriptor and the connection that owns it
struct Entry {
    tool: Tool,
    provider: Arc<dyn ToolProvider>,
    enabled: bool,
}

#[derive(Default)]
struct Table {
    /// Catalog order
    entries: Vec<Entry>,
    /// name -> index into `entries`
    index: HashMap<String, usize>,
}

/// Registry mapping capability names to owning connections
///
/// Duplicate names follow last-writer-wins: a later registration replaces
/// the descriptor and owner but keeps the catalog position.
pub struct ToolRegistry {
    table: RwLock<Table>,
    /// Filter applied by `catalog()`
    filter: RwLock<ToolFilter>,
    /// User-configured enabled/disabled state, survives re-registration
    tool_states: RwLock<HashMap<String, bool>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            filter: RwLock::new(ToolFilter::new()),
            tool_states: RwLock::new(HashMap::new()),
            logger,
        }
    }

    /// Replace the filter used by `catalog()`
    pub fn set_filter(&self, filter: ToolFilter) {
        *self.filter.write() = filter;
    }

    /// Register descriptors as owned by `provider`
    pub fn register(&self, provider: Arc<dyn ToolProvider>, tools: Vec<Tool>) {
        let states = self.tool_states.read();
        let mut table = self.table.write();

        for tool in tools {
            let enabled = states.get(&tool.name).copied().unwrap_or(true);
            let entry = Entry {
                tool,
                provider: Arc::clone(&provider),
                enabled,
            };

            match table.index.get(&entry.tool.name).copied() {
                Some(pos) => {
                    let previous = table.entries[pos].provider.name().to_string();
                    self.logger.warn(&format!(
                        "[ToolRegistry] Tool '{}' from {} replaces the one from {}",
                        entry.tool.name,
                        provider.name(),
                        previous
                    ));
                    table.entries[pos] = entry;
                }
                None => {
                    let pos = table.entries.len();
                    table.index.insert(entry.tool.name.clone(), pos);
                    table.entries.push(entry);
                }
            }
        }

        self.logger.debug(&format!(
            "[ToolRegistry] {} tools registered after {}",
            table.entries.len(),
            provider.name()
        ));
    }

    /// Drop every tool owned by the named provider
    pub fn unregister_provider(&self, provider_name: &str) -> usize {
        let mut table = self.table.write();
        let before = table.entries.len();
        table.entries.retain(|e| e.provider.name() != provider_name);
        let removed = before - table.entries.len();

        if removed > 0 {
            let index = table
                .entries
                .iter()
                .enumerate()
                .map(|(i, e)| (e.tool.name.clone(), i))
                .collect();
            table.index = index;
        }
        removed
    }

    /// Descriptors offered to the model, in registration order
    pub fn catalog(&self) -> Vec<Tool> {
        let filter = self.filter.read();
        self.table
            .read()
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .map(|e| e.tool.clone())
            .collect()
    }

    /// Descriptors matching an explicit filter
    pub fn get_tools(&self, filter: &ToolFilter) -> Vec<Tool> {
        self.table
            .read()
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .map(|e| e.tool.clone())
            .collect()
    }

    /// Connection that owns `name`
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolProvider>, ToolError> {
        let table = self.table.read();
        table
            .index
            .get(name)
            .map(|&pos| Arc::clone(&table.entries[pos].provider))
            .ok_or_else(|| ToolError::UnknownCapability(name.to_string()))
    }

    /// Enable or disable a tool; the state also applies to later registrations
    pub fn set_tool_enabled(&self, name: &str, enabled: bool) {
        self.tool_states.write().insert(name.to_string(), enabled);

        let mut table = self.table.write();
        if let Some(pos) = table.index.get(name).copied() {
            table.entries[pos].enabled = enabled;
        }
    }

    /// Resolve and invoke one capability
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let provider = self.resolve(name)?;
        self.logger.debug(&format!(
            "[ToolRegistry] Routing '{}' to {}",
            name,
            provider.name()
        ));
        Ok(provider.call_tool(name, arguments).await?)
    }

    /// Execute a capability request and turn any outcome into a `ToolResult`
    pub async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolResult {
        match self.call_tool(&tool_call.name, tool_call.input.clone()).await {
            Ok(output) => ToolResult {
                call_id: tool_call.id.clone(),
                content: output.content,
                is_error: output.is_error,
            },
            Err(e) => {
                self.logger.warn(&format!(
                    "[ToolRegistry] Call {} ({}) failed: {}",
                    tool_call.id, tool_call.name, e
                ));
                ToolResult::error(tool_call.id.clone(), format!("Error: {}", e))
            }
        }
    }

    /// Execute several requests strictly in order
    pub async fn execute_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            results.push(self.execute_tool_call(call).await);
        }
        results
    }

    /// Number of registered tools, filtered or not
    pub fn tool_count(&self) -> usize {
        self.table.read().entries.len()
    }

    /// Distinct provider names in registration order
    pub fn providers(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for entry in self.table.read().entries.iter() {
            let name = entry.provider.name();
            if !seen.iter().any(|s: &String| s == name) {
                seen.push(name.to_string());
            }
        }
        seen
    }

    /// Name of the provider that owns `name`, if any
    pub fn owner_of(&self, name: &str) -> Option<String> {
        self.resolve(name).ok().map(|p| p.name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::McpResult;
    use async_trait::async_trait;
    use serde_json::json;

    /// Provider answering every call with its own name
    struct NamedProvider {
        name: String,
    }

    impl NamedProvider {
        fn arc(name: &str) -> Arc<dyn ToolProvider> {
            Arc::new(Self {
                name: name.to_string(),
            })
        }
    }

    #[async_trait]
    impl ToolProvider for NamedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn is_open(&self) -> bool {
            true
        }

        async fn list_tools(&self) -> McpResult<Vec<Tool>> {
            Ok(vec![])
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput> {
            if arguments.get("fail").is_some() {
                return Err(McpError::tool_call_failed(&self.name, name, "asked to fail"));
            }
            if arguments.get("reject").is_some() {
                return Ok(ToolOutput::error(format!("{} rejected the input", name)));
            }
            Ok(ToolOutput::text(format!("{}:{}", self.name, name)))
        }

        async fn close(&self) -> McpResult<()> {
            Ok(())
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(NoOpLogger))
    }

    #[test]
    fn test_catalog_in_registration_order() {
        let registry = registry();
        registry.register(
            NamedProvider::arc("math"),
            vec![Tool::new("add", "Add"), Tool::new("mul", "Multiply")],
        );
        registry.register(NamedProvider::arc("web"), vec![Tool::new("search", "Search")]);

        let names: Vec<_> = registry.catalog().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["add", "mul", "search"]);
        assert_eq!(registry.providers(), vec!["math", "web"]);
    }

    #[test]
    fn test_last_writer_wins() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = ToolRegistry::new(logger.clone());

        registry.register(NamedProvider::arc("first"), vec![Tool::new("search", "old")]);
        registry.register(NamedProvider::arc("second"), vec![Tool::new("search", "new")]);

        let catalog = registry.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].description, "new");
        assert_eq!(registry.owner_of("search").as_deref(), Some("second"));
        assert_eq!(logger.messages_at(LogLevel::Warn).len(), 1);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = registry();
        registry.register(NamedProvider::arc("math"), vec![Tool::new("add", "Add")]);

        assert!(registry.resolve("add").is_ok());
        assert!(matches!(
            registry.resolve("subtract"),
            Err(ToolError::UnknownCapability(ref n)) if n == "subtract"
        ));
    }

    #[test]
    fn test_filter_and_disabled_tools() {
        let registry = registry();
        registry.register(
            NamedProvider::arc("fs"),
            vec![Tool::new("read_file", "Read"), Tool::new("delete_file", "Delete")],
        );

        registry.set_filter(ToolFilter::new().with_exclude(["delete_file".to_string()]));
        let names: Vec<_> = registry.catalog().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["read_file"]);

        registry.set_tool_enabled("read_file", false);
        assert!(registry.catalog().is_empty());
        assert_eq!(registry.get_tools(&ToolFilter::all()).len(), 2);

        // Disabled state survives re-registration
        registry.register(NamedProvider::arc("fs"), vec![Tool::new("read_file", "Read")]);
        assert!(registry.catalog().is_empty());
    }

    #[test]
    fn test_unregister_provider_reindexes() {
        let registry = registry();
        registry.register(NamedProvider::arc("a"), vec![Tool::new("one", "")]);
        registry.register(NamedProvider::arc("b"), vec![Tool::new("two", "")]);

        assert_eq!(registry.unregister_provider("a"), 1);
        assert_eq!(registry.tool_count(), 1);
        assert!(registry.resolve("one").is_err());
        assert_eq!(registry.owner_of("two").as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_execute_routes_to_owner() {
        let registry = registry();
        registry.register(NamedProvider::arc("math"), vec![Tool::new("add", "")]);
        registry.register(NamedProvider::arc("web"), vec![Tool::new("search", "")]);

        let result = registry
            .execute_tool_call(&ToolCall::new("c1", "search", json!({})))
            .await;
        assert_eq!(result, ToolResult::success("c1", "web:search"));
    }

    #[tokio::test]
    async fn test_execute_failures_become_error_results() {
        let registry = registry();
        registry.register(NamedProvider::arc("math"), vec![Tool::new("add", "")]);

        let unknown = registry
            .execute_tool_call(&ToolCall::new("c1", "nope", json!({})))
            .await;
        assert!(unknown.is_error);
        assert!(unknown.content.contains("Unknown capability: nope"));

        let failed = registry
            .execute_tool_call(&ToolCall::new("c2", "add", json!({ "fail": true })))
            .await;
        assert!(failed.is_error);
        assert!(failed.content.contains("asked to fail"));
        assert_eq!(failed.call_id, "c2");
    }

    #[tokio::test]
    async fn test_tool_level_error_passes_through() {
        let registry = registry();
        registry.register(NamedProvider::arc("math"), vec![Tool::new("div", "")]);

        let result = registry
            .execute_tool_call(&ToolCall::new("c3", "div", json!({ "reject": true })))
            .await;
        assert_eq!(result, ToolResult::error("c3", "div rejected the input"));
    }

    #[tokio::test]
    async fn test_execute_many_in_order() {
        let registry = registry();
        registry.register(NamedProvider::arc("p"), vec![Tool::new("x", ""), Tool::new("y", "")]);

        let calls = vec![
            ToolCall::new("1", "y", json!({})),
            ToolCall::new("2", "x", json!({})),
        ];
        let results = registry.execute_tool_calls(&calls).await;
        let ids: Vec<_> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(results[0].content, "p:y");
    }
}
