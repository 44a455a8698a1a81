//! Adapter between mcpchat types and genai types
//!
//! Conversation turns are stored in our own content-block form; this module
//! maps them onto genai's message/tool-call/tool-response shapes and maps the
//! model's reply back into a `Turn`.
//!
//! All auth flows through our `SecretStore`, not genai's default env var
//! lookup.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatResponse, Tool as GenaiTool,
    ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver};
use genai::{adapter::AdapterKind, Client, ModelIden};
use serde_json::json;

use crate::secrets::SecretStore;
use crate::types::{ContentBlock, Role, Tool, ToolCall, Turn};

use super::error::{GatewayError, GatewayResult};

// ============================================================================
// History Conversion: mcpchat -> genai
// ============================================================================

/// Build a genai tool call from a `ToolUse` block
///
/// Goes through serde so optional genai fields keep their defaults.
pub fn to_genai_tool_call(call: &ToolCall) -> GatewayResult<GenaiToolCall> {
    serde_json::from_value(json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.input,
    }))
    .map_err(|e| GatewayError::InvalidRequest(format!("tool call {}: {}", call.id, e)))
}

/// Convert one turn into the genai messages it maps to
///
/// Text goes first, then tool calls (assistant) or tool responses (user),
/// preserving block order within each kind.
pub fn to_genai_messages_for_turn(turn: &Turn) -> GatewayResult<Vec<GenaiMessage>> {
    let mut messages = Vec::new();

    let text = turn
        .content
        .iter()
        .filter_map(ContentBlock::as_text)
        .collect::<Vec<_>>()
        .join("\n");

    match turn.role {
        Role::User => {
            if !text.is_empty() {
                messages.push(GenaiMessage::user(text));
            }
            for block in &turn.content {
                if let ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } = block
                {
                    let response = GenaiToolResponse::new(tool_use_id.clone(), content.clone());
                    messages.push(GenaiMessage::from(response));
                }
            }
        }
        Role::Assistant => {
            if !text.is_empty() {
                messages.push(GenaiMessage::assistant(text));
            }
            let calls = turn
                .tool_calls()
                .iter()
                .map(to_genai_tool_call)
                .collect::<GatewayResult<Vec<_>>>()?;
            if !calls.is_empty() {
                messages.push(GenaiMessage::from(calls));
            }
        }
    }

    Ok(messages)
}

/// Convert the whole history, in order
pub fn to_genai_messages(history: &[Turn]) -> GatewayResult<Vec<GenaiMessage>> {
    let mut messages = Vec::with_capacity(history.len());
    for turn in history {
        messages.extend(to_genai_messages_for_turn(turn)?);
    }
    Ok(messages)
}

// ============================================================================
// Tool Conversion: mcpchat -> genai
// ============================================================================

/// Convert a capability descriptor to a genai tool
pub fn to_genai_tool(tool: &Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_schema(tool.input_schema.clone());
    if !tool.description.is_empty() {
        genai_tool = genai_tool.with_description(&tool.description);
    }
    genai_tool
}

pub fn to_genai_tools(tools: &[Tool]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

pub fn to_genai_options(max_tokens: u32) -> GenaiOptions {
    GenaiOptions::default().with_max_tokens(max_tokens)
}

// ============================================================================
// Response Conversion: genai -> mcpchat
// ============================================================================

/// Convert genai ToolCall to our ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

/// Convert a chat response into an assistant turn
///
/// Text parts come first, then tool uses in the order the model emitted them.
///
/// A reply with neither is an empty turn, which ends the query.
pub fn from_genai_response(response: &ChatResponse) -> Turn {
    assistant_turn(response.texts(), response.tool_calls())
}

fn assistant_turn<'a>(
    texts: impl IntoIterator<Item = &'a str>,
    calls: impl IntoIterator<Item = &'a GenaiToolCall>,
) -> Turn {
    let mut content: Vec<ContentBlock> = texts
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(ContentBlock::text)
        .collect();
    content.extend(
        calls
            .into_iter()
            .map(|tc| ContentBlock::from(from_genai_tool_call(tc))),
    );
    Turn::new(Role::Assistant, content)
}

// ============================================================================
// Auth
// ============================================================================

/// Map a genai adapter to the key our secret stores understand
pub fn adapter_kind_to_secret_key(adapter: AdapterKind) -> String {
    match adapter {
        AdapterKind::OpenAI => "openai".to_string(),
        AdapterKind::Anthropic => "anthropic".to_string(),
        AdapterKind::Gemini => "gemini".to_string(),
        AdapterKind::Ollama => "ollama".to_string(),
        AdapterKind::Groq => "groq".to_string(),
        AdapterKind::Xai => "xai".to_string(),
        AdapterKind::DeepSeek => "deepseek".to_string(),
        AdapterKind::Cohere => "cohere".to_string(),
        _ => format!("{:?}", adapter).to_lowercase(),
    }
}

/// Whether the adapter talks to an API that needs a key
pub fn requires_api_key(adapter: AdapterKind) -> bool {
    !matches!(adapter, AdapterKind::Ollama)
}

type AuthFuture = Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>>;

/// Create a genai client whose auth comes from `secrets`
pub fn create_client(secrets: Arc<dyn SecretStore>) -> Client {
    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |model_iden: ModelIden| -> AuthFuture {
            let secrets = Arc::clone(&secrets);
            let key = adapter_kind_to_secret_key(model_iden.adapter_kind);

            Box::pin(async move {
                // None lets genai fall back to its own default for the adapter
                Ok(secrets.get(&key).map(AuthData::from_single))
            })
        },
    );

    Client::builder().with_auth_resolver(auth_resolver).build()
}
