//! Connection pool with scoped release

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;

use crate::config::ServerList;
use crate::logging::Logger;
use crate::mcp::{ProviderConnector, ToolProvider};
use crate::tools::ToolRegistry;

/// A provider that connected and registered its tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedProvider {
    pub name: String,
    pub tools: Vec<String>,
}

/// A provider that was skipped during startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedProvider {
    pub name: String,
    pub reason: String,
}

/// Outcome of `acquire_all`, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquireReport {
    pub connected: Vec<ConnectedProvider>,
    pub failed: Vec<FailedProvider>,
}

impl AcquireReport {
    pub fn tool_count(&self) -> usize {
        self.connected.iter().map(|p| p.tools.len()).sum()
    }
}

/// Owner of every open provider connection
///
/// Connections are closed in reverse acquisition order by `release_all`,
/// which runs at most once. Use `scoped` to tie release to a session body.
pub struct ConnectionPool {
    connections: Mutex<Vec<Arc<dyn ToolProvider>>>,
    released: AtomicBool,
    logger: Arc<dyn Logger>,
}

impl ConnectionPool {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            connections: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
            logger,
        }
    }

    /// Connect to every configured server in order and register its tools
    ///
    /// A server that fails to connect or to list its tools is logged and
    /// skipped; a half-open connection is closed before moving on. Zero
    /// connected servers is not an error.
    pub async fn acquire_all(
        &self,
        servers: &ServerList,
        connector: &dyn ProviderConnector,
        registry: &ToolRegistry,
    ) -> AcquireReport {
        let mut report = AcquireReport::default();

        for (name, config) in servers.iter() {
            let provider = match connector.connect(name, config).await {
                Ok(provider) => provider,
                Err(e) => {
                    self.logger.warn(&format!(
                        "[ConnectionPool] Failed to connect to {}: {}",
                        name, e
                    ));
                    report.failed.push(FailedProvider {
                        name: name.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let tools = match provider.list_tools().await {
                Ok(tools) => tools,
                Err(e) => {
                    self.logger.warn(&format!(
                        "[ConnectionPool] Failed to list tools from {}: {}",
                        name, e
                    ));
                    if let Err(close_err) = provider.close().await {
                        self.logger.warn(&format!(
                            "[ConnectionPool] Error closing {}: {}",
                            name, close_err
                        ));
                    }
                    report.failed.push(FailedProvider {
                        name: name.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let tool_names: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
            self.logger.info(&format!(
                "[ConnectionPool] Connected to {} with tools: {:?}",
                name, tool_names
            ));

            registry.register(Arc::clone(&provider), tools);
            self.connections.lock().push(provider);
            report.connected.push(ConnectedProvider {
                name: name.to_string(),
                tools: tool_names,
            });
        }

        self.released.store(false, Ordering::SeqCst);
        self.logger.info(&format!(
            "[ConnectionPool] {} of {} servers connected, {} tools",
            report.connected.len(),
            servers.len(),
            report.tool_count()
        ));
        report
    }

    /// Close every connection, newest first
    ///
    /// Close errors are logged and swallowed. Calling this again is a no-op.
    pub async fn release_all(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        let connections = std::mem::take(&mut *self.connections.lock());
        if connections.is_empty() {
            return;
        }

        self.logger.info(&format!(
            "[ConnectionPool] Releasing {} connections",
            connections.len()
        ));

        for provider in connections.into_iter().rev() {
            match provider.close().await {
                Ok(()) => self
                    .logger
                    .debug(&format!("[ConnectionPool] Closed {}", provider.name())),
                Err(e) => self.logger.warn(&format!(
                    "[ConnectionPool] Error closing {}: {}",
                    provider.name(),
                    e
                )),
            }
        }
    }

    /// Run `body`, then release every connection
    ///
    /// Release happens whether the body returns normally, returns an error
    /// value, or panics; a panic is resumed after release.
    pub async fn scoped<F, Fut, T>(&self, body: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let outcome = AssertUnwindSafe(async move { body().await })
            .catch_unwind()
            .await;
        self.release_all().await;
        match outcome {
            Ok(value) => value,
            Err(panic) => {
                self.logger
                    .error("[ConnectionPool] Session panicked; connections released");
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// Names of open connections in acquisition order
    pub fn names(&self) -> Vec<String> {
        self.connections
            .lock()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        let open = self.connections.get_mut().len();
        if open > 0 {
            self.logger.warn(&format!(
                "[ConnectionPool] Dropped with {} unreleased connections",
                open
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, ServerList};
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::{McpError, McpResult, ToolOutput};
    use crate::types::Tool;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;

    type CloseLog = Arc<Mutex<Vec<String>>>;

    struct FakeProvider {
        name: String,
        tools: Vec<String>,
        fail_list: bool,
        fail_close: bool,
        open: AtomicBool,
        close_log: CloseLog,
    }

    #[async_trait]
    impl ToolProvider for FakeProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }

        async fn list_tools(&self) -> McpResult<Vec<Tool>> {
            if self.fail_list {
                return Err(McpError::protocol(&self.name, "garbled tools/list"));
            }
            Ok(self.tools.iter().map(|t| Tool::new(t.as_str(), "")).collect())
        }

        async fn call_tool(&self, name: &str, _arguments: Value) -> McpResult<ToolOutput> {
            Ok(ToolOutput::text(format!("{}:{}", self.name, name)))
        }

        async fn close(&self) -> McpResult<()> {
            self.open.store(false, Ordering::SeqCst);
            self.close_log.lock().push(self.name.clone());
            if self.fail_close {
                return Err(McpError::protocol(&self.name, "close failed"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Behaviour {
        refuse: bool,
        fail_list: bool,
        fail_close: bool,
        tools: Vec<&'static str>,
    }

    struct FakeConnector {
        behaviours: HashMap<&'static str, Behaviour>,
        close_log: CloseLog,
    }

    impl FakeConnector {
        fn new() -> Self {
            Self {
                behaviours: HashMap::new(),
                close_log: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn with(mut self, name: &'static str, behaviour: Behaviour) -> Self {
            self.behaviours.insert(name, behaviour);
            self
        }

        fn closed(&self) -> Vec<String> {
            self.close_log.lock().clone()
        }
    }

    #[async_trait]
    impl ProviderConnector for FakeConnector {
        async fn connect(
        &self,
        name: &str,
        _config: &ServerConfig,
    ) -> McpResult<Arc<dyn ToolProvider>> {
            let default = Behaviour::default();
            let b = self.behaviours.get(name).unwrap_or(&default);
            if b.refuse {
                return Err(McpError::connection_failed(name, "No such file or directory"));
            }
            Ok(Arc::new(FakeProvider {
                name: name.to_string(),
                tools: b.tools.iter().map(|t| t.to_string()).collect(),
                fail_list: b.fail_list,
                fail_close: b.fail_close,
                open: AtomicBool::new(true),
                close_log: Arc::clone(&self.close_log),
            }))
        }
    }

    fn servers(names: &[&str]) -> ServerList {
        names
            .iter()
            .map(|n| (n.to_string(), ServerConfig::stdio("fake-server")))
            .collect()
    }

    fn tools(names: &[&'static str]) -> Behaviour {
        Behaviour {
            tools: names.to_vec(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failed_connect_is_skipped() {
        let logger = Arc::new(MemoryLogger::new());
        let connector = FakeConnector::new()
            .with("alpha", tools(&["a"]))
            .with(
                "beta",
                Behaviour {
                    refuse: true,
                    ..Default::default()
                },
            )
            .with("gamma", tools(&["g"]));
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        let pool = ConnectionPool::new(logger.clone());

        let report = pool
            .acquire_all(&servers(&["alpha", "beta", "gamma"]), &connector, &registry)
            .await;

        assert_eq!(report.connected.len(), 2);
        assert_eq!(report.failed[0].name, "beta");
        assert_eq!(pool.names(), vec!["alpha", "gamma"]);
        assert_eq!(registry.owner_of("a").as_deref(), Some("alpha"));
        assert_eq!(registry.owner_of("g").as_deref(), Some("gamma"));
        assert!(logger.contains("Failed to connect to beta"));

        pool.release_all().await;
    }

    #[tokio::test]
    async fn test_list_failure_closes_half_open_connection() {
        let connector = FakeConnector::new().with(
            "broken",
            Behaviour {
                fail_list: true,
                tools: vec!["x"],
                ..Default::default()
            },
        );
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        let pool = ConnectionPool::new(Arc::new(NoOpLogger));

        let report = pool.acquire_all(&servers(&["broken"]), &connector, &registry).await;

        assert!(report.connected.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(connector.closed(), vec!["broken"]);
        assert!(pool.is_empty());
        assert_eq!(registry.tool_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_servers_is_valid() {
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        let pool = ConnectionPool::new(Arc::new(NoOpLogger));
        let report = pool
            .acquire_all(&ServerList::new(), &FakeConnector::new(), &registry)
            .await;
        assert_eq!(report, AcquireReport::default());
        pool.release_all().await;
    }

    #[tokio::test]
    async fn test_release_in_reverse_order_once() {
        let connector = FakeConnector::new();
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        let pool = ConnectionPool::new(Arc::new(NoOpLogger));
        pool.acquire_all(&servers(&["one", "two", "three"]), &connector, &registry)
            .await;

        pool.release_all().await;
        pool.release_all().await;

        assert_eq!(connector.closed(), vec!["three", "two", "one"]);
        assert!(pool.is_released());
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_close_errors_are_swallowed() {
        let logger = Arc::new(MemoryLogger::new());
        let connector = FakeConnector::new().with(
            "two",
            Behaviour {
                fail_close: true,
                ..Default::default()
            },
        );
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        let pool = ConnectionPool::new(logger.clone());
        pool.acquire_all(&servers(&["one", "two", "three"]), &connector, &registry)
            .await;

        pool.release_all().await;

        assert_eq!(connector.closed(), vec!["three", "two", "one"]);
        assert!(logger
            .messages_at(LogLevel::Warn)
            .iter()
            .any(|m| m.contains("Error closing two")));
    }

    #[tokio::test]
    async fn test_scoped_releases_after_error() {
        let connector = FakeConnector::new();
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        let pool = ConnectionPool::new(Arc::new(NoOpLogger));
        pool.acquire_all(&servers(&["one", "two"]), &connector, &registry)
            .await;

        let result: Result<(), String> = pool.scoped(|| async { Err("boom".to_string()) }).await;

        assert!(result.is_err());
        assert_eq!(connector.closed(), vec!["two", "one"]);
    }

    #[tokio::test]
    async fn test_scoped_releases_on_panic() {
        let connector = FakeConnector::new();
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        let pool = ConnectionPool::new(Arc::new(NoOpLogger));
        pool.acquire_all(&servers(&["one", "two"]), &connector, &registry)
            .await;

        let outcome = AssertUnwindSafe(pool.scoped(|| async {
            panic!("session blew up");
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err());
        assert_eq!(connector.closed(), vec!["two", "one"]);
        assert!(pool.is_released());
    }

    #[tokio::test]
    async fn test_scoped_releases_when_body_panics_before_its_future() {
        let connector = FakeConnector::new();
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        let pool = ConnectionPool::new(Arc::new(NoOpLogger));
        pool.acquire_all(&servers(&["one", "two"]), &connector, &registry)
            .await;

        let outcome = AssertUnwindSafe(pool.scoped(|| -> std::future::Ready<()> {
            panic!("setup failed");
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err());
        assert_eq!(connector.closed(), vec!["two", "one"]);
        assert!(pool.is_released());
    }

    #[tokio::test]
    async fn test_drop_unreleased_warns() {
        let logger = Arc::new(MemoryLogger::new());
        let connector = FakeConnector::new();
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        {
            let pool = ConnectionPool::new(logger.clone());
            pool.acquire_all(&servers(&["one"]), &connector, &registry)
                .await;
        }
        assert!(logger.contains("unreleased"));
    }
}
