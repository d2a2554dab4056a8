//! Wire-agnostic request/stream-event types shared by every provider crate.

use gllm_types::TokenUsage;

/// A completion request in the core's unified shape. Each provider crate
/// maps this to its own wire format.
pub type ProviderRequest = gllm_types::CompletionRequest;

/// One event out of a provider's streamed response.
///
/// Provider crates translate their own SSE/chunked wire format into this
/// shape; the [`crate::driver::Driver`] only ever sees these.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum StreamEvent {
    /// A chunk of assistant-visible text.
    TextDelta(String),
    /// A chunk of reasoning/thinking text.
    ThinkingDelta(String),
    /// An opaque signature fragment for the thinking block (Anthropic).
    ThinkingSignatureDelta(String),
    /// A new tool-use block started at `index`.
    ToolUseStart {
        /// Position of this tool-use block within the response.
        index: usize,
        /// Provider-assigned id for this tool call.
        id: String,
        /// Name of the tool being invoked.
        name: String,
    },
    /// Partial JSON input for the tool-use block at `index`.
    ToolUseDelta {
        /// Position of the tool-use block this delta belongs to.
        index: usize,
        /// Raw partial JSON fragment.
        partial_json: String,
    },
    /// The tool-use block at `index` is complete.
    ToolUseStop {
        /// Position of the now-complete tool-use block.
        index: usize,
    },
    /// A token-usage snapshot; the driver accumulates these across the
    /// stream using [`TokenUsage::accumulate`].
    Usage(TokenUsage),
    /// The stream has ended.
    MessageStop,
}
