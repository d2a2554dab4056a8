//! `activate_skill`: thin wrapper over on-disk skill activation.

use std::path::PathBuf;
use std::pin::Pin;
use std::future::Future;

use gllm_types::ToolError;
use serde_json::{json, Value};

use crate::ToolDyn;

/// Activates a named skill found under a skills directory, returning its
/// body followed by a directory tree of accompanying files.
pub struct ActivateSkillTool {
    /// Root directory skills are scanned from.
    pub skills_dir: PathBuf,
}

impl ToolDyn for ActivateSkillTool {
    fn name(&self) -> &str {
        "activate_skill"
    }
    fn description(&self) -> &str {
        "Activate a named skill, returning its instructions and a listing of its files."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]})
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let name = input.get("name").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: name".into()))?;
            gllm_state::activate_skill(&self.skills_dir, name)
                .await
                .map(Value::String)
                .map_err(|e| ToolError::ExecutionFailed(e.to_string().into()))
        })
    }
}
