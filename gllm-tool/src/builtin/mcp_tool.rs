//! Adapts MCP-discovered tools into [`ToolDyn`] so they can sit in the
//! same registry as the fixed built-in inventory.

use std::pin::Pin;
use std::future::Future;
use std::sync::Arc;

use gllm_mcp::{McpClient, McpToolInfo};
use gllm_types::ToolError;
use serde_json::Value;

use crate::ToolDyn;

/// A single MCP tool, bound to the client it was discovered through.
pub struct McpToolAdapter {
    client: Arc<dyn McpClient>,
    info: McpToolInfo,
}

impl McpToolAdapter {
    /// Wrap one tool discovered via `client.find_tools()`.
    pub fn new(client: Arc<dyn McpClient>, info: McpToolInfo) -> Self {
        Self { client, info }
    }
}

impl ToolDyn for McpToolAdapter {
    fn name(&self) -> &str {
        &self.info.name
    }
    fn description(&self) -> &str {
        &self.info.description
    }
    fn input_schema(&self) -> Value {
        self.info.input_schema.clone()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move { self.client.call_tool(&self.info.name, input).await.map_err(|e| ToolError::ExecutionFailed(e.to_string().into())) })
    }
}

/// Discover every tool `client` exposes and wrap each as a [`ToolDyn`].
pub async fn discover(client: Arc<dyn McpClient>) -> Result<Vec<Arc<dyn ToolDyn>>, ToolError> {
    let infos = client.find_tools().await.map_err(|e| ToolError::ExecutionFailed(e.to_string().into()))?;
    Ok(infos.into_iter().map(|info| Arc::new(McpToolAdapter::new(client.clone(), info)) as Arc<dyn ToolDyn>).collect())
}
