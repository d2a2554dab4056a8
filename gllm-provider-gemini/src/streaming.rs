//! SSE streaming support for the Gemini `streamGenerateContent` API.
//!
//! Requesting `?alt=sse` gets `data: {...}\n\n` chunks, each carrying a
//! complete `GenerateContentResponse` rather than an incremental patch —
//! unlike Anthropic/OpenAI, a function call arrives whole in a single chunk
//! instead of being assembled from argument-string fragments. There is no
//! terminator line; the stream simply ends.
//!
//! Reference: <https://ai.google.dev/api/generate-content#method:-models.streamgeneratecontent>

use futures::Stream;
use futures::StreamExt;
use gllm_provider::{EventStream, StreamEvent};
use gllm_types::{ProviderError, TokenUsage};

/// Wrap an HTTP response body into an [`EventStream`].
pub(crate) fn stream_completion(response: reqwest::Response) -> EventStream {
    Box::pin(parse_sse_stream(response.bytes_stream()))
}

fn parse_sse_stream(
    byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = Result<StreamEvent, ProviderError>> + Send + 'static {
    async_stream::stream! {
        let mut state = ChunkParserState::new();
        let mut bytes_stream = std::pin::pin!(byte_stream);
        let mut line_buf = String::new();

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield Err(ProviderError::StreamError(format!("stream read error: {e}")));
                    return;
                }
            };
            let chunk_str = match std::str::from_utf8(&chunk) {
                Ok(s) => s,
                Err(e) => {
                    yield Err(ProviderError::StreamError(format!("UTF-8 decode error: {e}")));
                    return;
                }
            };
            line_buf.push_str(chunk_str);

            while let Some(newline_pos) = line_buf.find('\n') {
                let line = line_buf[..newline_pos].trim_end_matches('\r').to_string();
                line_buf.drain(..=newline_pos);
                for event in state.process_line(&line) {
                    yield event;
                }
            }
        }

        yield Ok(StreamEvent::MessageStop);
    }
}

/// Assigns sequential indices to tool calls as they're seen; Gemini has no
/// index of its own since a function call never streams incrementally.
struct ChunkParserState {
    next_tool_index: usize,
}

impl ChunkParserState {
    fn new() -> Self {
        Self { next_tool_index: 0 }
    }

    fn process_line(&mut self, line: &str) -> Vec<Result<StreamEvent, ProviderError>> {
        let Some(data) = line.strip_prefix("data: ") else { return vec![] };

        let json: serde_json::Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => return vec![Err(ProviderError::StreamError(format!("JSON parse error in SSE chunk: {e}")))],
        };

        let mut events = Vec::new();

        if let Some(candidate) = json["candidates"].as_array().and_then(|c| c.first()) {
            if let Some(parts) = candidate["content"]["parts"].as_array() {
                for part in parts {
                    if let Some(text) = part["text"].as_str() {
                        events.push(Ok(StreamEvent::TextDelta(text.to_string())));
                    }
                    if let Some(call) = part.get("functionCall") {
                        let index = self.next_tool_index;
                        self.next_tool_index += 1;
                        let name = call["name"].as_str().unwrap_or("").to_string();
                        let args = call["args"].clone();
                        let id = format!("gemini_call_{index}");
                        events.push(Ok(StreamEvent::ToolUseStart { index, id, name }));
                        events.push(Ok(StreamEvent::ToolUseDelta { index, partial_json: args.to_string() }));
                        events.push(Ok(StreamEvent::ToolUseStop { index }));
                    }
                }
            }
        }

        if let Some(usage) = json.get("usageMetadata").filter(|u| !u.is_null()) {
            events.push(Ok(StreamEvent::Usage(TokenUsage {
                input_tokens: usage["promptTokenCount"].as_u64().unwrap_or(0),
                output_tokens: usage["candidatesTokenCount"].as_u64().unwrap_or(0),
                cached_tokens: usage["cachedContentTokenCount"].as_u64().unwrap_or(0),
                thought_tokens: usage["thoughtsTokenCount"].as_u64().unwrap_or(0),
            })));
        }

        events
    }
}
