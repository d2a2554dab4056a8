//! Fits a message history, tool definitions, and system prompt into a
//! model's input token budget.
//!
//! [`prepare`] is the single engine; [`prepare_openai`], [`prepare_volcengine`],
//! [`prepare_anthropic`], and [`prepare_gemini`] are thin family-specific
//! entry points that differ only in whether the system prompt travels
//! in-band (as a `Role::System` message) or out-of-band.
#![deny(missing_docs)]

mod strategies;

pub use strategies::Strategy;

use gllm_types::{ContextError, ModelLimits, SystemPrompt, ToolDefinition};

/// Fit `messages` (history) into `limits` at the given `buffer` fraction.
///
/// When `carries_system_in_history` is `true`, any `Role::System` messages
/// inside `messages` are consolidated into a single leading message before
/// eviction runs; otherwise `system` is treated as living outside the
/// history and its tokens are reserved but the message list it came from is
/// left for the caller to manage.
///
/// Returns the (possibly truncated) message list and whether truncation
/// occurred.
pub fn prepare(
    messages: Vec<gllm_types::Message>,
    system: Option<&SystemPrompt>,
    tools: &[ToolDefinition],
    limits: ModelLimits,
    buffer: f64,
    carries_system_in_history: bool,
    strategy: Strategy,
) -> Result<(Vec<gllm_types::Message>, bool), ContextError> {
    let max_input_tokens = gllm_limits::max_input_tokens(limits, buffer);
    let tool_tokens: u64 = tools.iter().map(gllm_token::estimate_tool_definition).sum();
    let external_system_tokens = if carries_system_in_history {
        0
    } else {
        system.map(gllm_token::estimate_system_prompt).unwrap_or(0)
    };

    let message_tokens: u64 = messages.iter().map(gllm_token::estimate_message).sum();
    let current = message_tokens + tool_tokens + external_system_tokens;
    if current <= max_input_tokens {
        return Ok((messages, false));
    }

    let (system_message, non_system) =
        if carries_system_in_history { strategies::consolidate_system(messages) } else { (None, messages) };

    let system_tokens = if carries_system_in_history {
        system_message.as_ref().map(gllm_token::estimate_message).unwrap_or(0)
    } else {
        external_system_tokens
    };

    let available = max_input_tokens.saturating_sub(system_tokens).saturating_sub(tool_tokens);
    let (evicted, truncated) = strategies::apply(strategy, non_system, available)?;

    let mut result = Vec::with_capacity(evicted.len() + 1);
    if let Some(system_message) = system_message {
        result.push(system_message);
    }
    result.extend(evicted);
    Ok((result, truncated))
}

/// OpenAI chat-completions family: system messages live inside `messages`.
pub fn prepare_openai(
    messages: Vec<gllm_types::Message>,
    tools: &[ToolDefinition],
    limits: ModelLimits,
    buffer: f64,
) -> Result<(Vec<gllm_types::Message>, bool), ContextError> {
    prepare(messages, None, tools, limits, buffer, true, Strategy::TruncateOldest)
}

/// Volcengine's OpenAI-compatible variant: identical contract to [`prepare_openai`].
pub fn prepare_volcengine(
    messages: Vec<gllm_types::Message>,
    tools: &[ToolDefinition],
    limits: ModelLimits,
    buffer: f64,
) -> Result<(Vec<gllm_types::Message>, bool), ContextError> {
    prepare_openai(messages, tools, limits, buffer)
}

/// Anthropic Messages API: system prompt lives outside the history.
pub fn prepare_anthropic(
    messages: Vec<gllm_types::Message>,
    system: Option<&SystemPrompt>,
    tools: &[ToolDefinition],
    limits: ModelLimits,
    buffer: f64,
) -> Result<(Vec<gllm_types::Message>, bool), ContextError> {
    prepare(messages, system, tools, limits, buffer, false, Strategy::TruncateOldest)
}

/// Gemini `generateContent`: system instruction lives outside the history.
pub fn prepare_gemini(
    messages: Vec<gllm_types::Message>,
    system: Option<&SystemPrompt>,
    tools: &[ToolDefinition],
    limits: ModelLimits,
    buffer: f64,
) -> Result<(Vec<gllm_types::Message>, bool), ContextError> {
    prepare(messages, system, tools, limits, buffer, false, Strategy::TruncateOldest)
}
