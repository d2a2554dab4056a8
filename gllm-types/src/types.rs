//! Core message and request/response types shared by every provider and
//! by the context manager, conversation store, and tool dispatcher.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A system directive.
    System,
    /// A human user.
    User,
    /// An AI assistant.
    Assistant,
    /// A tool result, for wire formats that carry it as its own role.
    Tool,
}

/// A content block within a message.
///
/// Each provider family has its own on-wire block taxonomy; this is the
/// small set of concepts the core reasons about across all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ContentBlock {
    /// Plain text content.
    Text {
        /// The text.
        text: String,
    },
    /// Extended reasoning emitted by a thinking-capable model.
    Thinking {
        /// The reasoning text.
        thinking: String,
        /// Opaque provider-issued signature. Present only for providers
        /// (Anthropic) that require it to be echoed back verbatim in
        /// subsequent turns that include this assistant message.
        signature: Option<String>,
    },
    /// A tool invocation request from the assistant.
    ToolUse {
        /// Unique identifier for this tool call.
        id: String,
        /// Name of the tool to invoke.
        name: String,
        /// Structured (or string-fallback) input arguments.
        input: serde_json::Value,
    },
    /// Result of a tool invocation.
    ToolResult {
        /// References the `id` from the corresponding [`ContentBlock::ToolUse`].
        tool_use_id: String,
        /// Rendered tool output.
        content: String,
        /// Whether this result represents an error.
        is_error: bool,
    },
    /// An image or file, inline or by reference.
    Media {
        /// MIME type (e.g. `"image/png"`).
        mime_type: String,
        /// Where the bytes live.
        source: MediaSource,
    },
}

/// Where the bytes of a [`ContentBlock::Media`] block live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSource {
    /// Base64-encoded inline bytes.
    Base64 {
        /// Base64-encoded data.
        data: String,
    },
    /// A URL the provider fetches itself.
    Url {
        /// The media URL.
        url: String,
    },
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// The content blocks of this message.
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a user message with a single text content block.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: vec![ContentBlock::Text { text: text.into() }] }
    }

    /// Create an assistant message with a single text content block.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: vec![ContentBlock::Text { text: text.into() }] }
    }

    /// Create a system message with a single text content block.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, content: vec![ContentBlock::Text { text: text.into() }] }
    }

    /// Ids of every [`ContentBlock::ToolUse`] block in this message.
    pub fn tool_use_ids(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
            _ => None,
        })
    }

    /// Ids referenced by every [`ContentBlock::ToolResult`] block in this message.
    pub fn tool_result_ids(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
            _ => None,
        })
    }

    /// Concatenation of every text block's content, ignoring other block kinds.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Whether this message has no content blocks at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// System prompt configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    /// A simple text system prompt.
    Text(String),
    /// Multiple system fragments, consolidated by the context manager.
    Blocks(Vec<String>),
}

impl From<String> for SystemPrompt {
    fn from(s: String) -> Self {
        SystemPrompt::Text(s)
    }
}

impl From<&str> for SystemPrompt {
    fn from(s: &str) -> Self {
        SystemPrompt::Text(s.to_string())
    }
}

/// Tool selection strategy for the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides whether to use tools.
    Auto,
    /// Model must not use tools.
    None,
    /// Model must use at least one tool.
    Required,
    /// Model must use the specified tool.
    Specific {
        /// Name of the required tool.
        name: String,
    },
}

/// Reasoning effort requested of a thinking-capable model.
///
/// Maps to each provider's own thinking-budget knob in the provider crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingLevel {
    /// Thinking disabled.
    Off,
    /// A small reasoning budget.
    Low,
    /// A moderate reasoning budget.
    Medium,
    /// A large reasoning budget.
    High,
}

impl Default for ThinkingLevel {
    fn default() -> Self {
        Self::Off
    }
}

/// Definition of a tool available to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name (unique identifier).
    pub name: String,
    /// Description of what the tool does.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: serde_json::Value,
}

/// A completion request to an LLM provider, in wire-agnostic form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model identifier.
    pub model: String,
    /// The conversation messages (system consolidation already applied).
    pub messages: Vec<Message>,
    /// Optional system prompt, for families that carry it out-of-band.
    pub system: Option<SystemPrompt>,
    /// Tool definitions available to the model.
    pub tools: Vec<ToolDefinition>,
    /// Maximum tokens to generate, derived from the model limits registry.
    pub max_tokens: Option<usize>,
    /// Sampling temperature. Mutually exclusive with `top_p`; when both are
    /// set the driver prefers `temperature` when it is greater than zero.
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,
    /// Requested thinking/reasoning level.
    pub thinking: ThinkingLevel,
}

/// Token usage statistics for a completion, accumulated across a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the input/prompt.
    pub input_tokens: u64,
    /// Tokens in the output/completion.
    pub output_tokens: u64,
    /// Tokens read from a provider-side cache (excluded from `input_tokens`
    /// for providers that account for it separately).
    pub cached_tokens: u64,
    /// Tokens spent on thinking/reasoning.
    pub thought_tokens: u64,
}

impl TokenUsage {
    /// Total tokens: input + output + cached.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cached_tokens
    }

    /// Accumulate another usage snapshot into this one (message_delta events
    /// on top of message_start events, for providers that split usage across
    /// stream events).
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.input_tokens = self.input_tokens.max(other.input_tokens);
        self.output_tokens += other.output_tokens;
        self.cached_tokens = self.cached_tokens.max(other.cached_tokens);
        self.thought_tokens += other.thought_tokens;
    }
}

/// Resource usage limits for the agentic loop. All limits are optional —
/// only set limits are enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageLimits {
    /// Maximum number of LLM requests (provider calls) allowed.
    pub request_limit: Option<usize>,
    /// Maximum number of tool calls allowed across all turns.
    pub tool_calls_limit: Option<usize>,
    /// Maximum total tokens (input + output) allowed across all turns.
    pub total_tokens_limit: Option<u64>,
}

/// `{contextWindow, maxOutputTokens}` for a known model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLimits {
    /// Total context window, in tokens.
    pub context_window: u64,
    /// Maximum tokens the model will emit in one completion.
    pub max_output_tokens: u64,
}

/// A provider-agnostic embedding request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The embedding model to use.
    pub model: String,
    /// The text inputs to embed.
    pub input: Vec<String>,
    /// Optional number of dimensions for the output embeddings.
    pub dimensions: Option<usize>,
}

/// Response from an embedding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vectors, one per input string.
    pub embeddings: Vec<Vec<f32>>,
    /// The model that generated the embeddings.
    pub model: String,
    /// Tokens consumed by the request.
    pub prompt_tokens: u64,
}

/// `key -> {value, createdBy, contentType, size}` shared-state entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedStateEntry {
    /// The stored value.
    pub value: String,
    /// Name of the agent that created (or last overwrote) this entry.
    pub created_by: String,
    /// Free-form content type tag (e.g. `"text/plain"`).
    pub content_type: String,
    /// Byte length of `value`.
    pub size: usize,
}

impl SharedStateEntry {
    /// Build an entry, computing `size` from `value`.
    #[must_use]
    pub fn new(value: String, created_by: impl Into<String>, content_type: impl Into<String>) -> Self {
        let size = value.len();
        Self { value, created_by: created_by.into(), content_type: content_type.into(), size }
    }
}

/// Status of a sub-agent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Registered, waiting on dependencies or a worker slot.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled before or during execution.
    Cancelled,
}

/// Free-form key/value bag used for tool inputs and extra config.
pub type JsonMap = HashMap<String, serde_json::Value>;
