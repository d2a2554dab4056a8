//! Request mapping from the core's wire-agnostic shapes to the OpenAI Chat
//! Completions API format.
//!
//! Reference: <https://platform.openai.com/docs/api-reference/chat>

use gllm_types::{CompletionRequest, ContentBlock, Message, Role, SystemPrompt, ThinkingLevel, ToolDefinition};

use crate::types::{OpenAIFunctionCall, OpenAIMessage, OpenAIRequest, OpenAIStreamOptions, OpenAITool, OpenAIToolCall};

/// Build the OpenAI request body for a streamed completion.
///
/// OpenAI, unlike Anthropic, accepts the system prompt as an ordinary
/// leading message rather than a separate top-level field, so
/// `request.system` (used when the caller keeps the prompt outside history)
/// is prepended as a `system`-role message ahead of whatever `messages`
/// already carries.
pub fn to_api_request(request: &CompletionRequest) -> OpenAIRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
        messages.push(OpenAIMessage {
            role: "system".to_string(),
            content: Some(map_system_prompt(system)),
            tool_calls: None,
            tool_call_id: None,
        });
    }
    for message in &request.messages {
        messages.extend(map_message(message));
    }

    OpenAIRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens.map(|n| n as u32),
        temperature: request.temperature,
        top_p: request.top_p,
        tools: request.tools.iter().map(map_tool).collect(),
        reasoning_effort: map_reasoning_effort(request.thinking),
        stream: true,
        stream_options: OpenAIStreamOptions { include_usage: true },
    }
}

fn map_system_prompt(system: &SystemPrompt) -> String {
    match system {
        SystemPrompt::Text(text) => text.clone(),
        SystemPrompt::Blocks(blocks) => blocks.join("\n\n"),
    }
}

fn map_reasoning_effort(level: ThinkingLevel) -> Option<String> {
    match level {
        ThinkingLevel::Off => None,
        ThinkingLevel::Low => Some("low".to_string()),
        ThinkingLevel::Medium => Some("medium".to_string()),
        ThinkingLevel::High => Some("high".to_string()),
    }
}

/// Map one [`Message`] to zero or more OpenAI messages.
///
/// A single assistant message carrying both text and tool uses becomes one
/// OpenAI message with `content` plus a `tool_calls` array; a message
/// carrying tool results becomes one `role: "tool"` message per result,
/// since OpenAI has no single message type that bundles multiple results.
fn map_message(message: &Message) -> Vec<OpenAIMessage> {
    match message.role {
        Role::System => vec![OpenAIMessage {
            role: "system".to_string(),
            content: Some(text_content(&message.content)),
            tool_calls: None,
            tool_call_id: None,
        }],
        Role::User => vec![OpenAIMessage {
            role: "user".to_string(),
            content: Some(text_content(&message.content)),
            tool_calls: None,
            tool_call_id: None,
        }],
        Role::Tool => message
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult { tool_use_id, content, .. } => Some(OpenAIMessage {
                    role: "tool".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id.clone()),
                }),
                _ => None,
            })
            .collect(),
        Role::Assistant => {
            let text = message
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("");
            let tool_calls: Vec<OpenAIToolCall> = message
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } => Some(OpenAIToolCall {
                        id: id.clone(),
                        call_type: "function".to_string(),
                        function: OpenAIFunctionCall { name: name.clone(), arguments: input.to_string() },
                    }),
                    _ => None,
                })
                .collect();
            vec![OpenAIMessage {
                role: "assistant".to_string(),
                content: if text.is_empty() { None } else { Some(text) },
                tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
                tool_call_id: None,
            }]
        }
    }
}

fn text_content(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

fn map_tool(tool: &ToolDefinition) -> OpenAITool {
    OpenAITool {
        tool_type: "function".to_string(),
        function: crate::types::OpenAIFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gllm_types::ToolDefinition;

    #[test]
    fn system_prompt_becomes_a_leading_system_message() {
        let request = CompletionRequest {
            system: Some(SystemPrompt::Text("be terse".into())),
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        let body = to_api_request(&request);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[0].content.as_deref(), Some("be terse"));
        assert_eq!(body.messages.len(), 2);
    }

    #[test]
    fn tool_result_message_becomes_a_tool_role_message_with_call_id() {
        let message = Message {
            role: Role::Tool,
            content: vec![ContentBlock::ToolResult { tool_use_id: "call_1".into(), content: "42".into(), is_error: false }],
        };
        let request = CompletionRequest { messages: vec![message], ..Default::default() };
        let body = to_api_request(&request);
        assert_eq!(body.messages[0].role, "tool");
        assert_eq!(body.messages[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn assistant_tool_use_becomes_tool_calls_with_stringified_arguments() {
        let message = Message {
            role: Role::Assistant,
            content: vec![ContentBlock::ToolUse { id: "call_1".into(), name: "search".into(), input: serde_json::json!({"q": "rust"}) }],
        };
        let request = CompletionRequest { messages: vec![message], ..Default::default() };
        let body = to_api_request(&request);
        let calls = body.messages[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "search");
        assert_eq!(calls[0].function.arguments, "{\"q\":\"rust\"}");
    }

    #[test]
    fn reasoning_effort_omitted_when_thinking_is_off() {
        let request = CompletionRequest { thinking: ThinkingLevel::Off, ..Default::default() };
        assert!(to_api_request(&request).reasoning_effort.is_none());
    }

    #[test]
    fn reasoning_effort_maps_high_to_high() {
        let request = CompletionRequest { thinking: ThinkingLevel::High, ..Default::default() };
        assert_eq!(to_api_request(&request).reasoning_effort.as_deref(), Some("high"));
    }

    #[test]
    fn tool_definitions_map_to_function_type_tools() {
        let tool = ToolDefinition { name: "search".into(), description: "search the web".into(), input_schema: serde_json::json!({}) };
        let request = CompletionRequest { tools: vec![tool], ..Default::default() };
        let body = to_api_request(&request);
        assert_eq!(body.tools[0].tool_type, "function");
        assert_eq!(body.tools[0].function.name, "search");
    }
}
