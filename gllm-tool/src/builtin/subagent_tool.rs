//! `spawn_subagents`: runs a dependency-ordered batch of sub-agent tasks.

use std::pin::Pin;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gllm_subagent::{BatchReport, SubagentExecutor, SubagentTaskSpec, TaskResult};
use gllm_types::ToolError;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::ToolDyn;

const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Deserialize)]
struct TaskInput {
    agent_name: String,
    instruction: String,
    task_key: String,
    #[serde(default)]
    input_keys: Vec<String>,
    #[serde(default)]
    wait: bool,
}

impl From<TaskInput> for SubagentTaskSpec {
    fn from(t: TaskInput) -> Self {
        SubagentTaskSpec { agent_name: t.agent_name, instruction: t.instruction, task_key: t.task_key, input_keys: t.input_keys, wait: t.wait }
    }
}

fn format_report(report: &BatchReport) -> String {
    let mut out = format!(
        "{} completed, {} failed, {} cancelled",
        report.completed, report.failed, report.cancelled
    );
    if !report.published_keys.is_empty() {
        out.push_str(&format!("\npublished keys: {}", report.published_keys.join(", ")));
    }
    for result in &report.results {
        out.push_str(&format!("\n- {} [{}]: {:?}", result.task_key, result.agent_name, result.status));
        if let Some(err) = &result.error {
            out.push_str(&format!(" ({err})"));
        }
    }
    out
}

fn exec_failed(msg: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed(msg.into().into())
}

/// Dispatches a batch of sub-agent tasks through a [`SubagentExecutor`],
/// waiting for the whole batch (or timeout) before returning.
pub struct SpawnSubagentsTool {
    /// The executor this tool drives.
    pub executor: Arc<SubagentExecutor>,
    /// How long to wait for the whole batch before cancelling it.
    pub timeout: Duration,
}

impl SpawnSubagentsTool {
    /// Build a tool with the default 10 minute batch timeout.
    pub fn new(executor: Arc<SubagentExecutor>) -> Self {
        Self { executor, timeout: DEFAULT_BATCH_TIMEOUT }
    }
}

impl ToolDyn for SpawnSubagentsTool {
    fn name(&self) -> &str {
        "spawn_subagents"
    }
    fn description(&self) -> &str {
        "Run a batch of sub-agent tasks, resolving dependencies between them through shared state. \
         Each task names an agent, an instruction, a task_key to publish its result under, and the \
         input_keys of earlier tasks it depends on."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tasks": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "agent_name": {"type": "string"},
                            "instruction": {"type": "string"},
                            "task_key": {"type": "string"},
                            "input_keys": {"type": "array", "items": {"type": "string"}},
                            "wait": {"type": "boolean"}
                        },
                        "required": ["agent_name", "instruction", "task_key"]
                    }
                }
            },
            "required": ["tasks"]
        })
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let tasks = input.get("tasks").cloned().ok_or_else(|| ToolError::InvalidInput("missing required field: tasks".into()))?;
            let specs: Vec<TaskInput> = serde_json::from_value(tasks).map_err(|e| ToolError::InvalidInput(format!("invalid tasks: {e}")))?;
            if specs.is_empty() {
                return Err(ToolError::InvalidInput("tasks must not be empty".into()));
            }
            let specs: Vec<SubagentTaskSpec> = specs.into_iter().map(Into::into).collect();

            let report = self.executor.run_batch(specs, self.timeout, CancellationToken::new()).await;
            if report.failed > 0 && report.completed == 0 {
                return Err(exec_failed(format_report(&report)));
            }
            Ok(Value::String(format_report(&report)))
        })
    }
}

#[allow(dead_code)]
fn _assert_task_result_shape(r: &TaskResult) -> &str {
    &r.task_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gllm_subagent::{AgentCatalog, AgentRunner, MemoryProvider};
    use gllm_state::SharedState;
    use gllm_types::SubagentError;
    use tempfile::tempdir;

    struct EchoRunner;

    #[async_trait]
    impl AgentRunner for EchoRunner {
        async fn run(&self, agent_name: &str, _system_prompt: &str, instruction: &str, _cancellation: &CancellationToken) -> Result<String, SubagentError> {
            Ok(format!("{agent_name} handled: {instruction}"))
        }
    }

    struct FixedCatalog;
    impl AgentCatalog for FixedCatalog {
        fn system_prompt(&self, agent_name: &str) -> Option<String> {
            match agent_name {
                "researcher" | "writer" => Some("You are an agent.".to_string()),
                _ => None,
            }
        }
    }

    struct NoMemory;
    impl MemoryProvider for NoMemory {
        fn format_memory(&self) -> String {
            String::new()
        }
    }

    fn tool() -> (SpawnSubagentsTool, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let executor = Arc::new(SubagentExecutor::new(Arc::new(SharedState::new()), Arc::new(EchoRunner), Arc::new(FixedCatalog), Arc::new(NoMemory), dir.path().to_path_buf()));
        (SpawnSubagentsTool::new(executor), dir)
    }

    #[tokio::test]
    async fn runs_independent_tasks_to_completion() {
        let (t, _dir) = tool();
        let out = t
            .call(json!({"tasks": [
                {"agent_name": "researcher", "instruction": "look into x", "task_key": "t1"},
                {"agent_name": "writer", "instruction": "write about y", "task_key": "t2"}
            ]}))
            .await
            .unwrap();
        assert!(out.as_str().unwrap().contains("2 completed"));
    }

    #[tokio::test]
    async fn empty_tasks_is_invalid_input() {
        let (t, _dir) = tool();
        let err = t.call(json!({"tasks": []})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn all_failed_batch_surfaces_as_execution_error() {
        let (t, _dir) = tool();
        let out = t
            .call(json!({"tasks": [
                {"agent_name": "ghost-agent", "instruction": "do x", "task_key": "t1"}
            ]}))
            .await;
        assert!(out.is_err());
    }
}
