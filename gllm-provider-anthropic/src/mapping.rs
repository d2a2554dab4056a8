//! Request mapping from the core's wire-agnostic shapes to the Anthropic
//! Messages API format.
//!
//! Reference: <https://docs.anthropic.com/en/api/messages>

use gllm_types::{CompletionRequest, ContentBlock, Message, MediaSource, Role, SystemPrompt, ThinkingLevel};

use crate::types::{AnthropicContentBlock, AnthropicMessage, AnthropicMediaSource, AnthropicRequest, AnthropicThinking, AnthropicTool};

/// Build the Anthropic request body for a streamed completion.
///
/// Anthropic does not accept a `Role::System` message inline; the system
/// prompt travels in the top-level `system` field instead, so any
/// `Role::System` entries left in `messages` (the driver does not produce
/// these, since `carries_system_in_history` is `false` for this family) are
/// dropped rather than rejected.
pub fn to_api_request(request: &CompletionRequest) -> AnthropicRequest {
    AnthropicRequest {
        model: request.model.clone(),
        max_tokens: request.max_tokens.unwrap_or(4096) as u32,
        messages: map_messages(&request.messages),
        system: request.system.as_ref().map(map_system_prompt),
        tools: request.tools.iter().map(map_tool).collect(),
        temperature: request.temperature,
        top_p: request.top_p,
        thinking: map_thinking(request.thinking),
        stream: true,
    }
}

fn map_system_prompt(system: &SystemPrompt) -> String {
    match system {
        SystemPrompt::Text(text) => text.clone(),
        SystemPrompt::Blocks(blocks) => blocks.join("\n\n"),
    }
}

fn map_thinking(level: ThinkingLevel) -> Option<AnthropicThinking> {
    let budget_tokens = match level {
        ThinkingLevel::Off => return None,
        ThinkingLevel::Low => 2_048,
        ThinkingLevel::Medium => 8_192,
        ThinkingLevel::High => 24_576,
    };
    Some(AnthropicThinking::Enabled { budget_tokens })
}

fn map_messages(messages: &[Message]) -> Vec<AnthropicMessage> {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| AnthropicMessage {
            role: match m.role {
                Role::User | Role::Tool => "user",
                Role::Assistant => "assistant",
                Role::System => unreachable!("filtered above"),
            }
            .to_string(),
            content: m.content.iter().map(map_content_block).collect(),
        })
        .collect()
}

fn map_content_block(block: &ContentBlock) -> AnthropicContentBlock {
    match block {
        ContentBlock::Text { text } => AnthropicContentBlock::Text { text: text.clone() },
        ContentBlock::Thinking { thinking, signature } => AnthropicContentBlock::Thinking {
            thinking: thinking.clone(),
            signature: signature.clone().unwrap_or_default(),
        },
        ContentBlock::ToolUse { id, name, input } => AnthropicContentBlock::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        },
        ContentBlock::ToolResult { tool_use_id, content, is_error } => AnthropicContentBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: content.clone(),
            is_error: *is_error,
        },
        ContentBlock::Media { mime_type, source } => AnthropicContentBlock::Image {
            source: map_media_source(mime_type, source),
        },
    }
}

fn map_media_source(mime_type: &str, source: &MediaSource) -> AnthropicMediaSource {
    match source {
        MediaSource::Base64 { data } => AnthropicMediaSource::Base64 {
            media_type: mime_type.to_string(),
            data: data.clone(),
        },
        MediaSource::Url { url } => AnthropicMediaSource::Url { url: url.clone() },
    }
}

fn map_tool(tool: &gllm_types::ToolDefinition) -> AnthropicTool {
    AnthropicTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: tool.input_schema.clone(),
    }
}
