//! Error types shared by every gllm crate.

use std::time::Duration;

/// Errors from LLM provider operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// Network-level error (connection reset, DNS failure, etc.).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Rate limited by the provider.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimit {
        /// Suggested retry delay, if provided by the API.
        retry_after: Option<Duration>,
    },
    /// Request timed out.
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    /// Provider service is temporarily unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Authentication/authorization failure.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Malformed or invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Requested model does not exist.
    #[error("model not found: {0}")]
    ModelNotFound(String),
    /// Error parsing or consuming the stream.
    #[error("stream error: {0}")]
    StreamError(String),
    /// Any other provider error.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether this error is likely transient and the request can be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimit { .. } | Self::Timeout(_) | Self::ServiceUnavailable(_))
    }
}

/// Errors from tool operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ToolError {
    /// Tool not found in registry.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// Invalid input for the tool.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Tool execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Permission denied, or the user declined a confirmation prompt.
    #[error("user cancelled")]
    UserCancel,
    /// The `switch_agent` tool requested the driver abort to another agent.
    #[error("switch agent to {target}")]
    SwitchAgent {
        /// Name of the agent to switch to.
        target: String,
        /// Optional follow-up instruction for the new agent.
        follow_up: Option<String>,
    },
}

/// Errors from context management operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ContextError {
    /// Compaction strategy failed.
    #[error("compaction failed: {0}")]
    CompactionFailed(String),
    /// The named strategy is declared but not implemented.
    #[error("unsupported context strategy: {0}")]
    Unsupported(String),
}

/// Errors from the provider stream driver's turn loop.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DriverError {
    /// Provider call failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    /// Context management failed.
    #[error("context error: {0}")]
    Context(#[from] ContextError),
    /// Conversation persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// Loop exceeded the configured recursion limit.
    #[error("max recursions reached ({0})")]
    MaxRecursions(usize),
    /// The turn was cancelled via the session's cancellation token.
    #[error("cancelled")]
    Cancelled,
    /// A usage limit was exceeded (token budget, request limit, or tool call limit).
    #[error("usage limit exceeded: {0}")]
    UsageLimitExceeded(String),
    /// `switch_agent` aborted the current agent; propagated after conversation
    /// integrity is restored.
    #[error("switch agent to {target}")]
    SwitchAgent {
        /// Name of the agent to switch to.
        target: String,
        /// Optional follow-up instruction for the new agent.
        follow_up: Option<String>,
    },
    /// The user declined a destructive tool confirmation.
    #[error("user cancelled")]
    UserCancel,
}

/// Errors from MCP operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum McpError {
    /// Failed to connect to MCP server.
    #[error("connection failed: {0}")]
    Connection(String),
    /// MCP tool call failed.
    #[error("tool call failed: {0}")]
    ToolCall(String),
    /// Requested tool is not known to the MCP server.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
}

/// Errors from embedding provider operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EmbeddingError {
    /// Authentication/authorization failure.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Malformed or invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Network-level error.
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Rate limit hit, with an optional hint of how long to back off.
    #[error("rate limited")]
    RateLimit {
        /// Suggested delay before retrying, if the provider sent one.
        retry_after: Option<std::time::Duration>,
    },
}

/// Errors from conversation storage operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// A stored message was structurally empty (no role or no content).
    #[error("malformed message at line {0}: {1}")]
    MalformedMessage(usize, String),
    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// I/O error during a storage operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from sub-agent batch execution.
#[derive(Debug, thiserror::Error, Clone)]
#[non_exhaustive]
pub enum SubagentError {
    /// The dependency graph for this batch contains a cycle.
    #[error("circular dependency detected")]
    CircularDependency,
    /// The named agent has no configuration registered.
    #[error("agent config not found: {0}")]
    ConfigNotFound(String),
    /// The task was cancelled before or during execution.
    #[error("cancelled")]
    Cancelled,
    /// The underlying agent run failed.
    #[error("task failed: {0}")]
    Failed(String),
}
