//! Chat session: the model/tool loop for one conversation

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ChatSettings;
use crate::gateway::ModelGateway;
use crate::logging::Logger;
use crate::tools::ToolRegistry;
use crate::types::{CancellationToken, Turn};

use super::error::{ChatError, ChatResult};

/// Where a query currently is in the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Waiting on the gateway for the next assistant turn
    AwaitingModel,
    /// Holding a turn that has not been inspected yet
    HaveTurn,
    /// Running the turn's tool requests in order
    Dispatching,
    /// Final answer produced (or no query running)
    Done,
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryState::AwaitingModel => "awaiting_model",
            QueryState::HaveTurn => "have_turn",
            QueryState::Dispatching => "dispatching",
            QueryState::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Result of a completed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Text of the final assistant turn
    pub text: String,
    /// Gateway calls made
    pub rounds: usize,
    /// Tool requests dispatched
    pub tool_calls: usize,
}

/// Progress notifications while a query runs
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// Text the model produced, including text alongside tool requests
    AssistantText(String),
    /// A tool request is about to be dispatched
    ToolCall { name: String, input: Value },
    /// A tool request finished
    ToolResult { name: String, is_error: bool },
}

type EventHandler = Box<dyn Fn(&ChatEvent) + Send + Sync>;

/// One conversation with a model and a set of registered tools
///
/// History survives across queries. A query that fails is rolled back so
/// the history never holds a tool request without its result.
pub struct ChatSession {
    gateway: Arc<dyn ModelGateway>,
    registry: Arc<ToolRegistry>,
    history: Vec<Turn>,
    max_rounds: usize,
    state: QueryState,
    on_event: Option<EventHandler>,
    logger: Arc<dyn Logger>,
}

impl ChatSession {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        registry: Arc<ToolRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            gateway,
            registry,
            history: Vec::new(),
            max_rounds: ChatSettings::default().max_rounds,
            state: QueryState::Done,
            on_event: None,
            logger,
        }
    }

    /// Maximum dispatch rounds per query
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Receive `ChatEvent`s as the query progresses
    pub fn with_event_handler(
        mut self,
        handler: impl Fn(&ChatEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Box::new(handler));
        self
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Forget the conversation
    pub fn reset(&mut self) {
        self.history.clear();
        self.state = QueryState::Done;
    }

    /// Run one user query to completion
    pub async fn process_query(
        &mut self,
        query: &str,
        cancel: &CancellationToken,
    ) -> ChatResult<QueryOutcome> {
        let checkpoint = self.history.len();
        let result = self.run_query(query, cancel).await;

        if let Err(e) = &result {
            self.logger.warn(&format!(
                "[ChatSession] Query failed in state {}: {}; rolling back {} turns",
                self.state,
                e,
                self.history.len() - checkpoint
            ));
            self.history.truncate(checkpoint);
        }
        self.transition(QueryState::Done);
        result
    }

    async fn run_query(
        &mut self,
        query: &str,
        cancel: &CancellationToken,
    ) -> ChatResult<QueryOutcome> {
        self.history.push(Turn::user(query));
        self.transition(QueryState::AwaitingModel);

        let mut rounds = 0;
        let mut dispatch_rounds = 0;
        let mut tool_calls = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ChatError::Cancelled);
            }

            let catalog = self.registry.catalog();
            let turn = cancel
                .run_until_cancelled(self.gateway.send(&self.history, &catalog))
                .await??;
            rounds += 1;
            self.transition(QueryState::HaveTurn);

            let text = turn.text();
            if !text.is_empty() {
                self.emit(ChatEvent::AssistantText(text.clone()));
            }

            let requests = turn.tool_calls();
            self.history.push(turn);

            if requests.is_empty() {
                self.logger.info(&format!(
                    "[ChatSession] Query done after {} rounds, {} tool calls",
                    rounds, tool_calls
                ));
                return Ok(QueryOutcome {
                    text,
                    rounds,
                    tool_calls,
                });
            }

            if dispatch_rounds >= self.max_rounds {
                return Err(ChatError::RoundLimitExceeded(self.max_rounds));
            }
            dispatch_rounds += 1;

            self.transition(QueryState::Dispatching);
            for call in requests {
                if cancel.is_cancelled() {
                    return Err(ChatError::Cancelled);
                }

                self.logger.info(&format!(
                    "[ChatSession] Calling tool {} with args {}",
                    call.name, call.input
                ));
                self.emit(ChatEvent::ToolCall {
                    name: call.name.clone(),
                    input: call.input.clone(),
                });

                let result = cancel
                    .run_until_cancelled(self.registry.execute_tool_call(&call))
                    .await?;
                tool_calls += 1;

                self.emit(ChatEvent::ToolResult {
                    name: call.name.clone(),
                    is_error: result.is_error,
                });
                self.history.push(Turn::tool_result(result));
            }
            self.transition(QueryState::AwaitingModel);
        }
    }

    fn transition(&mut self, next: QueryState) {
        if self.state != next {
            self.logger
                .debug(&format!("[ChatSession] {} -> {}", self.state, next));
            self.state = next;
        }
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }
}
