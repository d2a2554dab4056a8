//! Request mapping from the core's wire-agnostic shapes to Gemini's
//! `generateContent` format.
//!
//! Reference: <https://ai.google.dev/api/generate-content>

use gllm_types::{CompletionRequest, ContentBlock, MediaSource, Message, Role, SystemPrompt, ThinkingLevel, ToolDefinition};

use crate::types::{
    GeminiBlob, GeminiContent, GeminiFileData, GeminiFunctionCall, GeminiFunctionDeclaration, GeminiFunctionResponse, GeminiGenerationConfig,
    GeminiPart, GeminiRequest, GeminiThinkingConfig, GeminiTool,
};

/// Build the Gemini request body for a streamed `generateContent` call.
///
/// Gemini has no separate system-role message slot in `contents` — the
/// system prompt travels in its own top-level `systemInstruction` field,
/// the same way Anthropic's `system` field works.
pub fn to_api_request(request: &CompletionRequest) -> GeminiRequest {
    let contents = request.messages.iter().filter(|m| !matches!(m.role, Role::System)).flat_map(map_message).collect();

    GeminiRequest {
        contents,
        system_instruction: request.system.as_ref().map(map_system_prompt),
        tools: if request.tools.is_empty() { vec![] } else { vec![GeminiTool { function_declarations: request.tools.iter().map(map_tool).collect() }] },
        generation_config: GeminiGenerationConfig {
            max_output_tokens: request.max_tokens.map(|n| n as u32),
            temperature: request.temperature,
            top_p: request.top_p,
            thinking_config: map_thinking(request.thinking),
        },
    }
}

fn map_system_prompt(system: &SystemPrompt) -> GeminiContent {
    let text = match system {
        SystemPrompt::Text(text) => text.clone(),
        SystemPrompt::Blocks(blocks) => blocks.join("\n\n"),
    };
    GeminiContent { role: None, parts: vec![GeminiPart::Text { text }] }
}

fn map_thinking(level: ThinkingLevel) -> Option<GeminiThinkingConfig> {
    let budget = match level {
        ThinkingLevel::Off => return None,
        ThinkingLevel::Low => 2048,
        ThinkingLevel::Medium => 8192,
        ThinkingLevel::High => 24576,
    };
    Some(GeminiThinkingConfig { thinking_budget: budget })
}

/// Map one [`Message`] to zero or more Gemini turns.
///
/// A message carrying tool results becomes its own `role: "user"` turn of
/// `functionResponse` parts, since Gemini correlates results to calls by
/// function name rather than by a turn-owned role like OpenAI's `"tool"`.
fn map_message(message: &Message) -> Vec<GeminiContent> {
    match message.role {
        Role::System => vec![],
        Role::User => vec![GeminiContent { role: Some("user".to_string()), parts: message.content.iter().filter_map(map_content_block).collect() }],
        Role::Tool => {
            let parts: Vec<GeminiPart> = message
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolResult { tool_use_id, content, is_error } => Some(GeminiPart::FunctionResponse {
                        function_response: GeminiFunctionResponse {
                            name: tool_use_id.clone(),
                            response: if *is_error { serde_json::json!({ "error": content }) } else { serde_json::json!({ "result": content }) },
                        },
                    }),
                    _ => None,
                })
                .collect();
            vec![GeminiContent { role: Some("user".to_string()), parts }]
        }
        Role::Assistant => {
            vec![GeminiContent { role: Some("model".to_string()), parts: message.content.iter().filter_map(map_content_block).collect() }]
        }
    }
}

/// Map a [`ContentBlock`] to a Gemini part, where Gemini has a wire
/// counterpart. `Thinking` blocks are dropped: Gemini correlates
/// thought continuity via an opaque `thoughtSignature` this crate does not
/// yet round-trip, so prior reasoning is not replayed into later turns.
fn map_content_block(block: &ContentBlock) -> Option<GeminiPart> {
    match block {
        ContentBlock::Text { text } => Some(GeminiPart::Text { text: text.clone() }),
        ContentBlock::ToolUse { name, input, .. } => Some(GeminiPart::FunctionCall { function_call: GeminiFunctionCall { name: name.clone(), args: input.clone() } }),
        ContentBlock::Media { mime_type, source } => Some(map_media(mime_type, source)),
        ContentBlock::Thinking { .. } | ContentBlock::ToolResult { .. } => None,
    }
}

fn map_media(mime_type: &str, source: &MediaSource) -> GeminiPart {
    match source {
        MediaSource::Base64 { data } => GeminiPart::InlineData { inline_data: GeminiBlob { mime_type: mime_type.to_string(), data: data.clone() } },
        MediaSource::Url { url } => GeminiPart::FileData { file_data: GeminiFileData { mime_type: mime_type.to_string(), file_uri: url.clone() } },
    }
}

fn map_tool(tool: &ToolDefinition) -> GeminiFunctionDeclaration {
    GeminiFunctionDeclaration { name: tool.name.clone(), description: tool.description.clone(), parameters: tool.input_schema.clone() }
}
