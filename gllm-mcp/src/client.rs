//! The `FindTool`/`CallTool` boundary an MCP transport implements.
//!
//! This crate has no opinion on how a client reaches its server (stdio,
//! child process, streamable HTTP); it only defines the shape the tool
//! dispatcher depends on. A concrete transport lives outside this crate
//! and is handed to the dispatcher as `Arc<dyn McpClient>`.

use async_trait::async_trait;
use gllm_types::McpError;
use serde_json::Value;

/// One tool an MCP server advertises.
#[derive(Debug, Clone, PartialEq)]
pub struct McpToolInfo {
    /// The tool's name, as the model will call it.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema describing the tool's input.
    pub input_schema: Value,
}

/// A connection to one MCP server.
///
/// Implementations own their transport (stdio, child process, HTTP) and
/// are expected to be cheaply cloneable or already wrapped in `Arc` by the
/// caller, since the tool dispatcher holds one per configured server for
/// the lifetime of a session.
#[async_trait]
pub trait McpClient: Send + Sync {
    /// List the tools this server currently advertises.
    async fn find_tools(&self) -> Result<Vec<McpToolInfo>, McpError>;

    /// Invoke `name` with `arguments`, returning its result payload.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Stub;

    #[async_trait]
    impl McpClient for Stub {
        async fn find_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
            Ok(vec![McpToolInfo {
                name: "echo".into(),
                description: "echoes input".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }])
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
            if name != "echo" {
                return Err(McpError::ToolNotFound(name.to_string()));
            }
            Ok(arguments)
        }
    }

    #[tokio::test]
    async fn usable_as_dyn_trait_object() {
        let client: Arc<dyn McpClient> = Arc::new(Stub);
        let tools = client.find_tools().await.unwrap();
        assert_eq!(tools[0].name, "echo");
        let result = client.call_tool("echo", serde_json::json!({"x": 1})).await.unwrap();
        assert_eq!(result, serde_json::json!({"x": 1}));
    }

    #[tokio::test]
    async fn unknown_tool_name_errors() {
        let client = Stub;
        let err = client.call_tool("missing", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound(_)));
    }
}
