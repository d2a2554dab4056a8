//! A frozen registry mapping model names to their context window and
//! maximum output tokens.
#![deny(missing_docs)]

use gllm_types::ModelLimits;

/// Returned when a model name matches nothing in the registry, even by
/// containment.
pub const MODERN_DEFAULT: ModelLimits = ModelLimits { context_window: 128_000, max_output_tokens: 8_000 };

/// `(needle, context_window, max_output_tokens)`. Matched by exact name
/// first, then by substring containment against the lowercased input, in
/// table order.
const TABLE: &[(&str, u64, u64)] = &[
    ("gpt-4o-mini", 128_000, 16_384),
    ("gpt-4o", 128_000, 16_384),
    ("gpt-4.1-mini", 1_047_576, 32_768),
    ("gpt-4.1-nano", 1_047_576, 32_768),
    ("gpt-4.1", 1_047_576, 32_768),
    ("gpt-4-turbo", 128_000, 4_096),
    ("o1-mini", 128_000, 65_536),
    ("o1", 200_000, 100_000),
    ("o3-mini", 200_000, 100_000),
    ("o3", 200_000, 100_000),
    ("gpt-5-mini", 400_000, 128_000),
    ("gpt-5", 400_000, 128_000),
    ("claude-opus-4", 200_000, 32_000),
    ("claude-sonnet-4", 200_000, 64_000),
    ("claude-3-7-sonnet", 200_000, 64_000),
    ("claude-3-5-sonnet", 200_000, 8_192),
    ("claude-3-5-haiku", 200_000, 8_192),
    ("claude-3-opus", 200_000, 4_096),
    ("claude-3-haiku", 200_000, 4_096),
    ("gemini-2.5-pro", 1_048_576, 65_536),
    ("gemini-2.5-flash", 1_048_576, 65_536),
    ("gemini-2.0-flash", 1_048_576, 8_192),
    ("gemini-1.5-pro", 2_097_152, 8_192),
    ("gemini-1.5-flash", 1_048_576, 8_192),
    ("doubao-seed", 256_000, 16_000),
    ("doubao-pro", 128_000, 12_000),
    ("doubao-lite", 32_000, 4_096),
];

/// Look up the context window and max output tokens for `model_name`.
///
/// The name is lowercased, then matched exactly, then by substring
/// containment in table order, then falls back to [`MODERN_DEFAULT`].
#[must_use]
pub fn lookup(model_name: &str) -> ModelLimits {
    let lowered = model_name.to_lowercase();
    if let Some(&(_, ctx, out)) = TABLE.iter().find(|(name, _, _)| *name == lowered) {
        return ModelLimits { context_window: ctx, max_output_tokens: out };
    }
    if let Some(&(_, ctx, out)) = TABLE.iter().find(|(name, _, _)| lowered.contains(name)) {
        return ModelLimits { context_window: ctx, max_output_tokens: out };
    }
    MODERN_DEFAULT
}

/// Maximum input tokens that should be reserved for history + tools +
/// system prompt, leaving room for `maxOutputTokens` and a safety buffer.
///
/// `buffer` outside `(0, 1]` is treated as the default `0.8`.
#[must_use]
pub fn max_input_tokens(limits: ModelLimits, buffer: f64) -> u64 {
    let buffer = if buffer > 0.0 && buffer <= 1.0 { buffer } else { 0.8 };
    let reserved = limits.max_output_tokens.min(limits.context_window.saturating_sub(1));
    let available = limits.context_window.saturating_sub(reserved);
    (available as f64 * buffer) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_containment() {
        let limits = lookup("claude-3-5-sonnet");
        assert_eq!(limits.context_window, 200_000);
        assert_eq!(limits.max_output_tokens, 8_192);
    }

    #[test]
    fn containment_match_is_case_insensitive() {
        let limits = lookup("GPT-4O-2024-08-06");
        assert_eq!(limits, lookup("gpt-4o"));
    }

    #[test]
    fn unknown_model_falls_back_to_modern_default() {
        assert_eq!(lookup("some-future-model-nobody-heard-of"), MODERN_DEFAULT);
    }

    #[test]
    fn max_input_tokens_uses_default_buffer_out_of_range() {
        let limits = ModelLimits { context_window: 100_000, max_output_tokens: 10_000 };
        assert_eq!(max_input_tokens(limits, 0.0), max_input_tokens(limits, 0.8));
        assert_eq!(max_input_tokens(limits, 1.5), max_input_tokens(limits, 0.8));
    }

    #[test]
    fn max_input_tokens_formula() {
        let limits = ModelLimits { context_window: 100_000, max_output_tokens: 10_000 };
        // reserved = min(10_000, 99_999) = 10_000; available = 90_000; * 0.8 = 72_000
        assert_eq!(max_input_tokens(limits, 0.8), 72_000);
    }
}
