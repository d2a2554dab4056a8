//! `list_memory` and `save_memory`: a single durable memory file per agent.

use std::path::PathBuf;
use std::pin::Pin;
use std::future::Future;

use gllm_types::ToolError;
use serde_json::{json, Value};

use crate::ToolDyn;

fn exec_failed(msg: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed(msg.into().into())
}

fn parse_entries(payload: &str) -> Vec<String> {
    payload
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| {
            let trimmed = line.trim();
            trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")).unwrap_or(trimmed)
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads the memory file's current entries back as a bulleted list.
pub struct ListMemoryTool(pub PathBuf);

impl ToolDyn for ListMemoryTool {
    fn name(&self) -> &str {
        "list_memory"
    }
    fn description(&self) -> &str {
        "List the agent's saved memory entries."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }
    fn call(&self, _input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            match tokio::fs::read_to_string(&self.0).await {
                Ok(content) => {
                    let entries = parse_entries(&content);
                    if entries.is_empty() {
                        Ok(Value::String("(no memory saved)".to_string()))
                    } else {
                        Ok(Value::String(entries.iter().map(|e| format!("- {e}")).collect::<Vec<_>>().join("\n")))
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Value::String("(no memory saved)".to_string())),
                Err(e) => Err(exec_failed(e.to_string())),
            }
        })
    }
}

/// Replaces the agent's entire memory file with the given payload.
///
/// Lines prefixed with `-`/`*` or plain text become entries; lines starting
/// with `#` are treated as headings and dropped. An empty payload clears
/// memory.
pub struct SaveMemoryTool(pub PathBuf);

impl ToolDyn for SaveMemoryTool {
    fn name(&self) -> &str {
        "save_memory"
    }
    fn description(&self) -> &str {
        "Replace the agent's saved memory with the given entries (one per line)."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"content": {"type": "string"}}, "required": ["content"]})
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let content = input.get("content").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: content".into()))?;
            let entries = parse_entries(content);
            if let Some(parent) = self.0.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| exec_failed(e.to_string()))?;
            }
            let body = entries.iter().map(|e| format!("- {e}")).collect::<Vec<_>>().join("\n");
            tokio::fs::write(&self.0, &body).await.map_err(|e| exec_failed(e.to_string()))?;
            Ok(Value::String(format!("saved {} memory entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" })))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_then_list_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memory.md");
        let save = SaveMemoryTool(path.clone());
        save.call(json!({"content": "- likes rust\n# heading\n* writes tests\nplain line"})).await.unwrap();

        let list = ListMemoryTool(path);
        let out = list.call(json!({})).await.unwrap();
        let text = out.as_str().unwrap();
        assert!(text.contains("likes rust"));
        assert!(text.contains("writes tests"));
        assert!(text.contains("plain line"));
        assert!(!text.contains("heading"));
    }

    #[tokio::test]
    async fn missing_file_lists_as_empty() {
        let dir = tempdir().unwrap();
        let list = ListMemoryTool(dir.path().join("absent.md"));
        let out = list.call(json!({})).await.unwrap();
        assert_eq!(out.as_str().unwrap(), "(no memory saved)");
    }

    #[tokio::test]
    async fn empty_payload_clears_memory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memory.md");
        let save = SaveMemoryTool(path.clone());
        save.call(json!({"content": "- something"})).await.unwrap();
        save.call(json!({"content": ""})).await.unwrap();

        let list = ListMemoryTool(path);
        let out = list.call(json!({})).await.unwrap();
        assert_eq!(out.as_str().unwrap(), "(no memory saved)");
    }
}
