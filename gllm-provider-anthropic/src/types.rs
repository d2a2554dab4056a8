//! Anthropic Messages API request types.
//!
//! Only request-side types are needed here: this provider only ever streams,
//! so the response is parsed directly off the SSE wire in `streaming.rs`
//! rather than through a typed response body.

use serde::Serialize;

/// Anthropic API request body.
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation messages.
    pub messages: Vec<AnthropicMessage>,
    /// Optional system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Tools available to the model.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<AnthropicTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<AnthropicThinking>,
    pub stream: bool,
}

/// Extended-thinking configuration, per Anthropic's `thinking` request field.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicThinking {
    /// Thinking enabled with a token budget.
    Enabled {
        /// Reasoning token budget.
        budget_tokens: u32,
    },
}

/// A message in the Anthropic API format.
#[derive(Debug, Serialize)]
pub struct AnthropicMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Message content blocks.
    pub content: Vec<AnthropicContentBlock>,
}

/// A content block in the Anthropic API format.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum AnthropicContentBlock {
    /// Text content.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },
    /// A previously-generated thinking block, echoed back verbatim.
    #[serde(rename = "thinking")]
    Thinking {
        /// The reasoning text.
        thinking: String,
        /// Provider-issued signature Anthropic requires echoed back.
        signature: String,
    },
    /// Tool use request.
    #[serde(rename = "tool_use")]
    ToolUse {
        /// Tool use identifier.
        id: String,
        /// Tool name.
        name: String,
        /// Tool input parameters.
        input: serde_json::Value,
    },
    /// Tool result.
    #[serde(rename = "tool_result")]
    ToolResult {
        /// The tool use ID this result is for.
        tool_use_id: String,
        /// The result content.
        content: String,
        /// Whether this result represents an error.
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Inline or referenced media.
    #[serde(rename = "image")]
    Image {
        /// Image source.
        source: AnthropicMediaSource,
    },
}

/// Media source in Anthropic API format.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum AnthropicMediaSource {
    /// Base64-encoded bytes.
    #[serde(rename = "base64")]
    Base64 {
        /// MIME type of the encoded data.
        media_type: String,
        /// Base64 data.
        data: String,
    },
    /// URL-referenced media the provider fetches itself.
    #[serde(rename = "url")]
    Url {
        /// Media URL.
        url: String,
    },
}

/// Tool definition for the Anthropic API.
#[derive(Debug, Serialize)]
pub struct AnthropicTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for the tool input.
    pub input_schema: serde_json::Value,
}
