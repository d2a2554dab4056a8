//! `switch_agent` and `list_agent`: handing a conversation off between
//! differently-configured agents within the same session.

use std::pin::Pin;
use std::future::Future;
use std::sync::Arc;

use gllm_types::ToolError;
use serde_json::{json, Value};

use crate::ToolDyn;

/// One entry in an agent catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSummary {
    /// The agent's configured name.
    pub name: String,
    /// One-line description shown in catalog listings.
    pub description: String,
}

/// Read-only view over the set of configured agents a session can switch
/// between. Kept separate from any concrete configuration type so this
/// crate doesn't need to depend on one.
pub trait AgentDirectory: Send + Sync {
    /// Every agent available to switch to.
    fn list(&self) -> Vec<AgentSummary>;
    /// Whether an agent with this name exists.
    fn exists(&self, name: &str) -> bool;
    /// The name of the currently active agent.
    fn active(&self) -> String;
}

fn format_catalog(directory: &dyn AgentDirectory) -> String {
    let active = directory.active();
    directory
        .list()
        .into_iter()
        .map(|a| {
            let marker = if a.name == active { " (active)" } else { "" };
            format!("- {}{marker}: {}", a.name, a.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Requests the driver abort the current turn and resume as a different
/// agent. Reported through the [`ToolError::SwitchAgent`] sentinel; the
/// tool call itself never "succeeds" except for `name = "list"`.
pub struct SwitchAgentTool {
    /// The agent directory this session switches within.
    pub directory: Arc<dyn AgentDirectory>,
}

impl ToolDyn for SwitchAgentTool {
    fn name(&self) -> &str {
        "switch_agent"
    }
    fn description(&self) -> &str {
        "Switch the conversation to a different configured agent. Pass name=\"list\" to see available agents."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "follow_up": {"type": "string", "description": "optional instruction to hand to the new agent"}
            },
            "required": ["name"]
        })
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let name = input.get("name").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: name".into()))?;
            if name == "list" {
                return Ok(Value::String(format_catalog(self.directory.as_ref())));
            }
            if name == self.directory.active() {
                return Ok(Value::String(format!("already running as {name}")));
            }
            if !self.directory.exists(name) {
                return Err(ToolError::InvalidInput(format!("no such agent: {name}")));
            }
            let follow_up = input.get("follow_up").and_then(Value::as_str).map(str::to_string);
            Err(ToolError::SwitchAgent { target: name.to_string(), follow_up })
        })
    }
}

/// Lists every agent available to switch to.
pub struct ListAgentTool {
    /// The agent directory this session switches within.
    pub directory: Arc<dyn AgentDirectory>,
}

impl ToolDyn for ListAgentTool {
    fn name(&self) -> &str {
        "list_agent"
    }
    fn description(&self) -> &str {
        "List every agent configured for this session."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }
    fn call(&self, _input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move { Ok(Value::String(format_catalog(self.directory.as_ref()))) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDirectory {
        active: String,
        agents: Vec<AgentSummary>,
    }

    impl AgentDirectory for FixedDirectory {
        fn list(&self) -> Vec<AgentSummary> {
            self.agents.clone()
        }
        fn exists(&self, name: &str) -> bool {
            self.agents.iter().any(|a| a.name == name)
        }
        fn active(&self) -> String {
            self.active.clone()
        }
    }

    fn directory() -> Arc<dyn AgentDirectory> {
        Arc::new(FixedDirectory {
            active: "default".into(),
            agents: vec![
                AgentSummary { name: "default".into(), description: "general purpose".into() },
                AgentSummary { name: "researcher".into(), description: "finds things".into() },
            ],
        })
    }

    #[tokio::test]
    async fn list_name_returns_catalog() {
        let tool = SwitchAgentTool { directory: directory() };
        let out = tool.call(json!({"name": "list"})).await.unwrap();
        let text = out.as_str().unwrap();
        assert!(text.contains("default (active)"));
        assert!(text.contains("researcher"));
    }

    #[tokio::test]
    async fn switching_to_active_agent_is_a_no_op() {
        let tool = SwitchAgentTool { directory: directory() };
        let out = tool.call(json!({"name": "default"})).await.unwrap();
        assert!(out.as_str().unwrap().contains("already running"));
    }

    #[tokio::test]
    async fn switching_to_unknown_agent_is_invalid_input() {
        let tool = SwitchAgentTool { directory: directory() };
        let err = tool.call(json!({"name": "ghost"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn switching_to_known_agent_yields_switch_sentinel() {
        let tool = SwitchAgentTool { directory: directory() };
        let err = tool.call(json!({"name": "researcher", "follow_up": "look into X"})).await.unwrap_err();
        match err {
            ToolError::SwitchAgent { target, follow_up } => {
                assert_eq!(target, "researcher");
                assert_eq!(follow_up.as_deref(), Some("look into X"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_agent_tool_returns_catalog() {
        let tool = ListAgentTool { directory: directory() };
        let out = tool.call(json!({})).await.unwrap();
        assert!(out.as_str().unwrap().contains("researcher"));
    }
}
