//! `get_state`, `set_state`, and `list_state`: the shared blackboard tools.

use std::pin::Pin;
use std::future::Future;
use std::sync::Arc;

use gllm_state::SharedState;
use gllm_types::ToolError;
use serde_json::{json, Value};

use crate::ToolDyn;

/// Reads a single blackboard entry by key.
pub struct GetStateTool {
    /// The shared blackboard.
    pub state: Arc<SharedState>,
}

impl ToolDyn for GetStateTool {
    fn name(&self) -> &str {
        "get_state"
    }
    fn description(&self) -> &str {
        "Read a value previously published to shared state by key."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"key": {"type": "string"}}, "required": ["key"]})
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let key = input.get("key").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: key".into()))?;
            match self.state.get(key).await {
                Some(entry) => Ok(Value::String(entry.value)),
                None => Ok(Value::String(format!("(no value for key: {key})"))),
            }
        })
    }
}

/// Publishes a value to the shared blackboard under a key.
pub struct SetStateTool {
    /// The shared blackboard.
    pub state: Arc<SharedState>,
    /// The agent name recorded as the entry's creator.
    pub agent_name: String,
}

impl ToolDyn for SetStateTool {
    fn name(&self) -> &str {
        "set_state"
    }
    fn description(&self) -> &str {
        "Publish a value to shared state under a key, visible to every agent."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": {"type": "string"},
                "value": {"type": "string"},
                "content_type": {"type": "string", "description": "defaults to text/plain"}
            },
            "required": ["key", "value"]
        })
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let key = input.get("key").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: key".into()))?;
            let value = input.get("value").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: value".into()))?;
            let content_type = input.get("content_type").and_then(Value::as_str).unwrap_or("text/plain");
            self.state.set(key.to_string(), value.to_string(), self.agent_name.clone(), content_type.to_string()).await;
            Ok(Value::String(format!("published {key}")))
        })
    }
}

/// Lists every key currently published to shared state.
pub struct ListStateTool {
    /// The shared blackboard.
    pub state: Arc<SharedState>,
}

impl ToolDyn for ListStateTool {
    fn name(&self) -> &str {
        "list_state"
    }
    fn description(&self) -> &str {
        "List every key published to shared state, with creator and a value preview."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }
    fn call(&self, _input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let entries = self.state.list().await;
            if entries.is_empty() {
                return Ok(Value::String("(shared state is empty)".to_string()));
            }
            let lines: Vec<String> = entries
                .into_iter()
                .map(|(key, entry)| {
                    let preview: String = entry.value.chars().take(80).collect();
                    format!("{key} (by {}, {} bytes): {preview}", entry.created_by, entry.size)
                })
                .collect();
            Ok(Value::String(lines.join("\n")))
        })
    }
}
