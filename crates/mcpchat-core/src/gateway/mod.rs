//! Model gateway implementations
//!
//! A gateway is a stateless request/response function from
//! (conversation history, capability catalog) to the model's next turn.
//!
//! ## Architecture
//!
//! `GenaiGateway` uses the `genai` crate, which handles the provider-specific
//! protocols (Anthropic, OpenAI, Gemini, ...) and tool calling. Auth flows
//! through our `SecretStore`, not genai's env var lookup.
//!
//! `MockGateway` is kept for tests and offline runs.

mod traits;
mod error;
mod genai_adapter;
mod genai_gateway;
mod mock;

pub use traits::{GatewayConfig, ModelGateway};
pub use error::{GatewayError, GatewayResult};
pub use genai_gateway::GenaiGateway;
pub use mock::{MockGateway, MockMode, RecordedRequest, ScriptStep};

use std::sync::Arc;

use crate::logging::Logger;
use crate::secrets::SecretStore;

/// Model ids that select the offline echo gateway
pub const MOCK_MODELS: &[&str] = &["mock", "mock-echo"];

/// Create the gateway for a configured model
///
/// `mock` / `mock-echo` give an offline echo gateway; anything else goes
/// through genai, which picks the adapter from the model name.
pub fn create_gateway(
    config: GatewayConfig,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
) -> Box<dyn ModelGateway> {
    if MOCK_MODELS.contains(&config.model.to_lowercase().as_str()) {
        Box::new(MockGateway::echo(logger))
    } else {
        Box::new(GenaiGateway::new(config, secrets, logger))
    }
}
