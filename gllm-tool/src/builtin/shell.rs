//! The `shell` tool: runs a command through the platform shell.

use std::path::PathBuf;
use std::pin::Pin;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use gllm_types::ToolError;
use serde_json::{json, Value};

use crate::confirm::{require_confirmation, Confirmer};
use crate::ToolDyn;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// The `shell` tool. Destructive by default — runs arbitrary commands.
pub struct ShellTool {
    cwd: PathBuf,
    timeout: Duration,
    confirmer: Arc<dyn Confirmer>,
    need_confirm: bool,
    auto_approve: bool,
}

impl ShellTool {
    /// Build a shell tool rooted at `cwd`, confirming through `confirmer`
    /// unless `auto_approve` is set.
    pub fn new(cwd: PathBuf, confirmer: Arc<dyn Confirmer>, need_confirm: bool, auto_approve: bool) -> Self {
        Self { cwd, timeout: DEFAULT_TIMEOUT, confirmer, need_confirm, auto_approve }
    }

    /// Override the default 60 second command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ToolDyn for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }
    fn description(&self) -> &str {
        "Run a shell command in the workspace and return its combined stdout/stderr."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"command": {"type": "string"}}, "required": ["command"]})
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let command = input.get("command").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: command".into()))?;

            require_confirmation(self.confirmer.as_ref(), self.need_confirm, self.auto_approve, "shell", &format!("run: {command}"), None).await?;

            let mut cmd = if cfg!(target_os = "windows") {
                let mut c = tokio::process::Command::new("cmd");
                c.args(["/C", command]);
                c
            } else {
                let mut c = tokio::process::Command::new("sh");
                c.args(["-c", command]);
                c
            };
            cmd.current_dir(&self.cwd).stdout(Stdio::piped()).stderr(Stdio::piped());

            let child = cmd.spawn().map_err(|e| ToolError::ExecutionFailed(e.to_string().into()))?;
            let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
                Ok(result) => result.map_err(|e| ToolError::ExecutionFailed(e.to_string().into()))?,
                Err(_) => {
                    return Err(ToolError::ExecutionFailed(format!("command timed out after {:?}", self.timeout).into()));
                }
            };

            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.is_empty() {
                combined.push_str("\n--- stderr ---\n");
                combined.push_str(&stderr);
            }
            if !output.status.success() {
                combined.push_str(&format!("\n--- exit status: {} ---", output.status));
            }
            Ok(Value::String(combined))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoApprove;

    fn tool() -> ShellTool {
        ShellTool::new(std::env::temp_dir(), Arc::new(AutoApprove), true, true)
    }

    #[tokio::test]
    async fn runs_command_and_captures_stdout() {
        let t = tool();
        let out = t.call(json!({"command": "echo hello"})).await.unwrap();
        assert!(out.as_str().unwrap().contains("hello"));
    }

    #[tokio::test]
    async fn missing_command_is_invalid_input() {
        let t = tool();
        let err = t.call(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let t = tool().with_timeout(Duration::from_millis(20));
        let err = t.call(json!({"command": "sleep 2"})).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
