//! Language-aware token estimation.
//!
//! The estimator never calls out to a real tokenizer; it approximates one by
//! picking a chars-per-token ratio from a cheap script classification, which
//! keeps the estimate within the accuracy band mixed natural-language and
//! code content needs for context-budget decisions.

use gllm_types::{ContentBlock, Message, SystemPrompt, ToolDefinition};

/// Token overhead charged per message, regardless of content.
pub const MESSAGE_OVERHEAD: u64 = 4;
/// Token overhead charged per tool-use/tool-result block.
pub const TOOL_CALL_OVERHEAD: u64 = 100;
/// Token overhead charged per media block.
pub const IMAGE_OVERHEAD: u64 = 1000;

const CODE_INDICATORS: &[&str] = &["func ", "def ", "class ", "import ", "{", "}", "=>", "->", "```"];

#[derive(Default)]
struct ScriptCounts {
    total: u64,
    cjk_ideograph: u64,
    hiragana: u64,
    katakana: u64,
    hangul: u64,
}

fn classify(s: &str) -> ScriptCounts {
    let mut counts = ScriptCounts::default();
    for c in s.chars() {
        counts.total += 1;
        let cp = c as u32;
        if (0x4E00..=0x9FFF).contains(&cp) || (0x3400..=0x4DBF).contains(&cp) {
            counts.cjk_ideograph += 1;
        } else if (0x3040..=0x309F).contains(&cp) {
            counts.hiragana += 1;
        } else if (0x30A0..=0x30FF).contains(&cp) {
            counts.katakana += 1;
        } else if (0xAC00..=0xD7A3).contains(&cp) || (0x1100..=0x11FF).contains(&cp) || (0x3130..=0x318F).contains(&cp) {
            counts.hangul += 1;
        }
    }
    counts
}

fn count_code_indicators(s: &str) -> usize {
    CODE_INDICATORS.iter().map(|needle| s.matches(needle).count()).sum()
}

/// Chars-per-token ratio for a string, per the precedence rules in the
/// estimator's specification: Hangul, then Japanese kana, then CJK
/// ideographs, then code-likeness, then the plain-text default.
fn ratio_for(s: &str) -> f64 {
    let counts = classify(s);
    if counts.total == 0 {
        return 4.0;
    }
    let total = counts.total as f64;
    let hangul_frac = counts.hangul as f64 / total;
    if hangul_frac > 0.20 {
        return 2.0;
    }
    let kana_frac = (counts.hiragana + counts.katakana) as f64 / total;
    if kana_frac > 0.10 {
        return 2.0;
    }
    let cjk_frac = counts.cjk_ideograph as f64 / total;
    if cjk_frac > 0.30 {
        return 1.5;
    }
    if count_code_indicators(s) >= 3 {
        return 3.0;
    }
    4.0
}

/// Estimate the token count of a plain string.
#[must_use]
pub fn estimate_string(s: &str) -> u64 {
    let ratio = ratio_for(s);
    (s.len() as f64 / ratio) as u64 + 1
}

/// Estimate the token count of a JSON value, using the fixed JSON ratio.
#[must_use]
pub fn estimate_json(value: &serde_json::Value) -> u64 {
    let text = serde_json::to_string(value).unwrap_or_default();
    (text.len() as f64 / 3.5) as u64 + 1
}

/// Estimate the token count of a single content block, including its
/// structural overhead (tool calls, media).
#[must_use]
pub fn estimate_block(block: &ContentBlock) -> u64 {
    match block {
        ContentBlock::Text { text } => estimate_string(text),
        ContentBlock::Thinking { thinking, signature } => {
            estimate_string(thinking) + signature.as_deref().map(estimate_string).unwrap_or(0)
        }
        ContentBlock::ToolUse { name, input, .. } => {
            estimate_string(name) + estimate_json(input) + TOOL_CALL_OVERHEAD
        }
        ContentBlock::ToolResult { content, .. } => estimate_string(content) + TOOL_CALL_OVERHEAD,
        ContentBlock::Media { .. } => IMAGE_OVERHEAD,
        _ => 0,
    }
}

/// Estimate the token count of a whole message, including per-message overhead.
#[must_use]
pub fn estimate_message(message: &Message) -> u64 {
    MESSAGE_OVERHEAD + message.content.iter().map(estimate_block).sum::<u64>()
}

/// Estimate the token count reserved for a tool's schema and description.
#[must_use]
pub fn estimate_tool_definition(tool: &ToolDefinition) -> u64 {
    estimate_string(&tool.name) + estimate_string(&tool.description) + estimate_json(&tool.input_schema)
}

/// Estimate the token count of a system prompt.
#[must_use]
pub fn estimate_system_prompt(system: &SystemPrompt) -> u64 {
    match system {
        SystemPrompt::Text(text) => estimate_string(text),
        SystemPrompt::Blocks(blocks) => blocks.iter().map(|b| estimate_string(b)).sum(),
    }
}
