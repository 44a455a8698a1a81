//! Mock gateway for testing
//!
//! Provides deterministic, configurable turns without network dependencies.
//! Every request is recorded so tests can check what the model was shown.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{GatewayError, GatewayResult};
use super::traits::ModelGateway;
use crate::logging::Logger;
use crate::types::{Role, Tool, Turn};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Reply(Turn),
    Fail(String),
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user text
    #[default]
    Echo,
    /// Always return the same text
    Fixed(String),
    /// Replay steps in order; running out is an error
    Script(Vec<ScriptStep>),
    /// Fail every request
    Error(String),
}

/// What the gateway was given on one call
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub history: Vec<Turn>,
    pub catalog: Vec<Tool>,
}

/// Mock model gateway
pub struct MockGateway {
    mode: MockMode,
    script: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
    logger: Arc<dyn Logger>,
}

impl MockGateway {
    pub fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        let script = match &mode {
            MockMode::Script(steps) => steps.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            mode,
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            delay: None,
            logger,
        }
    }

    /// Create an echo gateway (echoes back the user's text)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    pub fn fixed(text: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(text.into()), logger)
    }

    /// Replay `turns` one per request
    pub fn scripted(turns: Vec<Turn>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(
            MockMode::Script(turns.into_iter().map(ScriptStep::Reply).collect()),
            logger,
        )
    }

    pub fn failing(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Error(message.into()), logger)
    }

    /// Wait this long before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append a step to the script
    pub fn push(&self, step: ScriptStep) {
        self.script.lock().push_back(step);
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Steps left in the script
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    fn last_user_text(history: &[Turn]) -> String {
        history
            .iter()
            .rev()
            .filter(|t| t.role == Role::User)
            .map(Turn::text)
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| "Hello from MockGateway!".to_string())
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, history: &[Turn], catalog: &[Tool]) -> GatewayResult<Turn> {
        self.requests.lock().push(RecordedRequest {
            history: history.to_vec(),
            catalog: catalog.to_vec(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.mode {
            MockMode::Echo => {
                let text = Self::last_user_text(history);
                self.logger.debug(&format!("[MockGateway] Echoing: {}", text));
                Ok(Turn::assistant(format!("Echo: {}", text)))
            }
            MockMode::Fixed(text) => Ok(Turn::assistant(text.clone())),
            MockMode::Error(message) => {
                Err(GatewayError::Other(format!("Mock error: {}", message)))
            }
            MockMode::Script(_) => {
                let step = self.script.lock().pop_front();
                match step {
                    Some(ScriptStep::Reply(turn)) => {
                        self.logger.debug(&format!(
                            "[MockGateway] Scripted reply with {} tool calls",
                            turn.tool_calls().len()
                        ));
                        Ok(turn)
                    }
                    Some(ScriptStep::Fail(message)) => {
                        Err(GatewayError::Other(format!("Mock error: {}", message)))
                    }
                    None => Err(GatewayError::Other("Mock script exhausted".to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::ContentBlock;
    use serde_json::json;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let gateway = MockGateway::echo(test_logger());
        let turn = gateway.send(&[Turn::user("Hello, world!")], &[]).await.unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.text(), "Echo: Hello, world!");
        assert!(!turn.has_tool_calls());
    }

    #[tokio::test]
    async fn test_fixed_mode() {
        let gateway = MockGateway::fixed("This is a test response.", test_logger());
        let turn = gateway.send(&[Turn::user("Anything")], &[]).await.unwrap();
        assert_eq!(turn.text(), "This is a test response.");
    }

    #[tokio::test]
    async fn test_script_replays_in_order_then_exhausts() {
        let call = Turn::new(
            Role::Assistant,
            vec![ContentBlock::tool_use("t1", "add", json!({"a": 1}))],
        );
        let gateway =
            MockGateway::scripted(vec![call.clone(), Turn::assistant("done")], test_logger());

        assert_eq!(gateway.send(&[], &[]).await.unwrap(), call);
        assert_eq!(gateway.send(&[], &[]).await.unwrap().text(), "done");
        assert!(gateway.send(&[], &[]).await.is_err());
        assert_eq!(gateway.remaining(), 0);
    }

    #[tokio::test]
    async fn test_script_failure_step() {
        let gateway = MockGateway::scripted(vec![], test_logger());
        gateway.push(ScriptStep::Fail("overloaded".to_string()));
        let err = gateway.send(&[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_error_mode() {
        let gateway = MockGateway::failing("Test error message", test_logger());
        assert!(gateway.send(&[Turn::user("x")], &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_records_requests() {
        let gateway = MockGateway::echo(test_logger());
        let catalog = vec![Tool::new("add", "Add numbers")];
        gateway.send(&[Turn::user("one")], &catalog).await.unwrap();
        gateway.send(&[Turn::user("two")], &[]).await.unwrap();

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].catalog, catalog);
        assert_eq!(requests[1].history[0].text(), "two");
        assert!(requests[1].catalog.is_empty());
    }
}
