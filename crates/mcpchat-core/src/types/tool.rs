//! Capability descriptor and call types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability descriptor advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique capability name
    pub name: String,
    /// What the capability does
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the input arguments
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl Tool {
    /// Create a descriptor with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_object_schema(),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Capability request extracted from a model turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Invocation identifier, unique within the conversation
    pub id: String,
    /// Name of the capability being called
    pub name: String,
    /// Input arguments
    pub input: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// Outcome of one capability invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the call this answers
    #[serde(rename = "callId")]
    pub call_id: String,
    /// Result payload, or error text when `is_error` is set
    pub content: String,
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: error.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_defaults_to_object_schema() {
        let tool = Tool::new("add", "Add two numbers");
        assert_eq!(tool.input_schema["type"], "object");

        let parsed: Tool = serde_json::from_value(json!({ "name": "ping" })).unwrap();
        assert_eq!(parsed.description, "");
        assert_eq!(parsed.input_schema["type"], "object");
    }

    #[test]
    fn test_tool_schema_serializes_camel_case() {
        let tool = Tool::new("add", "Add").with_schema(json!({
            "type": "object",
            "properties": { "a": { "type": "number" } },
            "required": ["a"]
        }));
        let value = serde_json::to_value(&tool).unwrap();
        assert!(value.get("inputSchema").is_some());
    }

    #[test]
    fn test_tool_result() {
        let ok = ToolResult::success("call_1", "4");
        assert!(!ok.is_error);

        let err = ToolResult::error("call_2", "Unknown capability: nope");
        assert!(err.is_error);
        assert_eq!(err.call_id, "call_2");
    }
}
