//! SSE streaming support for the OpenAI Chat Completions API.
//!
//! OpenAI's stream is plain `data: {...}\n\n` chunks terminated by
//! `data: [DONE]`, with no `event:` line — simpler than Anthropic's, so the
//! line buffering here only has to find data lines and a blank-line
//! terminator.
//!
//! Reference: <https://platform.openai.com/docs/api-reference/chat-streaming>

use std::collections::HashSet;

use futures::Stream;
use futures::StreamExt;
use gllm_provider::{EventStream, StreamEvent};
use gllm_types::{ProviderError, TokenUsage};
use reqwest::Response;

/// Wrap an HTTP response body into an [`EventStream`].
pub(crate) fn stream_completion(response: Response) -> EventStream {
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
                let (events, done) = state.process_line(&line);
                for event in events {
                    yield event;
                }
                if done {
                    return;
                }
            }
        }

        yield Ok(StreamEvent::MessageStop);
    }
}

/// Tracks which tool-call indices have been opened, so their stop can be
/// emitted once the chunk carrying `finish_reason` arrives.
struct ChunkParserState {
    open_tool_calls: HashSet<usize>,
}

impl ChunkParserState {
    fn new() -> Self {
        Self { open_tool_calls: HashSet::new() }
    }

    /// Returns the events produced by this line, and whether the stream is
    /// now finished (`data: [DONE]` seen).
    fn process_line(&mut self, line: &str) -> (Vec<Result<StreamEvent, ProviderError>>, bool) {
        let Some(data) = line.strip_prefix("data: ") else { return (vec![], false) };
        if data == "[DONE]" {
            return (self.close_open_tool_calls(), true);
        }

        let json: serde_json::Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => return (vec![Err(ProviderError::StreamError(format!("JSON parse error in SSE chunk: {e}")))], false),
        };

        let mut events = Vec::new();

        if let Some(usage) = json.get("usage").filter(|u| !u.is_null()) {
            events.push(Ok(StreamEvent::Usage(TokenUsage {
                input_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0),
                output_tokens: usage["completion_tokens"].as_u64().unwrap_or(0),
                cached_tokens: usage["prompt_tokens_details"]["cached_tokens"].as_u64().unwrap_or(0),
                thought_tokens: usage["completion_tokens_details"]["reasoning_tokens"].as_u64().unwrap_or(0),
            })));
        }

        let Some(choice) = json["choices"].as_array().and_then(|c| c.first()) else { return (events, false) };
        let delta = &choice["delta"];

        if let Some(text) = delta["content"].as_str() {
            events.push(Ok(StreamEvent::TextDelta(text.to_string())));
        }

        if let Some(tool_calls) = delta["tool_calls"].as_array() {
            for call in tool_calls {
                let index = call["index"].as_u64().unwrap_or(0) as usize;
                if let Some(id) = call["id"].as_str() {
                    let name = call["function"]["name"].as_str().unwrap_or("").to_string();
                    self.open_tool_calls.insert(index);
                    events.push(Ok(StreamEvent::ToolUseStart { index, id: id.to_string(), name }));
                }
                if let Some(partial_json) = call["function"]["arguments"].as_str() {
                    if !partial_json.is_empty() {
                        events.push(Ok(StreamEvent::ToolUseDelta { index, partial_json: partial_json.to_string() }));
                    }
                }
            }
        }

        if choice["finish_reason"].is_string() {
            events.extend(self.close_open_tool_calls());
        }

        (events, false)
    }

    fn close_open_tool_calls(&mut self) -> Vec<Result<StreamEvent, ProviderError>> {
        let mut indices: Vec<usize> = self.open_tool_calls.drain().collect();
        indices.sort_unstable();
        indices.into_iter().map(|index| Ok(StreamEvent::ToolUseStop { index })).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(lines: &[&str]) -> Vec<Result<StreamEvent, ProviderError>> {
        let mut state = ChunkParserState::new();
        let mut events = Vec::new();
        for line in lines {
            let (mut produced, _) = state.process_line(line);
            events.append(&mut produced);
        }
        events
    }

    #[test]
    fn text_delta_chunks_decode_in_order() {
        let events = feed(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi \"},\"finish_reason\":null}]}",
            "data: {\"choices\":[{\"delta\":{\"content\":\"there\"},\"finish_reason\":null}]}",
        ]);
        let texts: Vec<String> = events
            .into_iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::TextDelta(t)) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Hi ".to_string(), "there".to_string()]);
    }

    #[test]
    fn tool_call_start_then_delta_then_stop_on_finish_reason() {
        let events = feed(&[
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"search\",\"arguments\":\"\"}}]},\"finish_reason\":null}]}",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"q\\\":\"}}]},\"finish_reason\":null}]}",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"rust\\\"}\"}}]},\"finish_reason\":\"tool_calls\"}]}",
        ]);
        assert_eq!(events[0].as_ref().unwrap(), &StreamEvent::ToolUseStart { index: 0, id: "call_1".into(), name: "search".into() });
        assert!(matches!(events.last().unwrap(), Ok(StreamEvent::ToolUseStop { index: 0 })));
    }

    #[test]
    fn done_marker_closes_any_still_open_tool_calls() {
        let mut state = ChunkParserState::new();
        state.process_line("data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"x\",\"arguments\":\"\"}}]},\"finish_reason\":null}]}");
        let (events, done) = state.process_line("data: [DONE]");
        assert!(done);
        assert!(matches!(events[0], Ok(StreamEvent::ToolUseStop { index: 0 })));
    }

    #[test]
    fn final_usage_only_chunk_reports_tokens() {
        let events = feed(&["data: {\"choices\":[],\"usage\":{\"prompt_tokens\":12,\"completion_tokens\":5}}"]);
        match &events[0] {
            Ok(StreamEvent::Usage(usage)) => {
                assert_eq!(usage.input_tokens, 12);
                assert_eq!(usage.output_tokens, 5);
            }
            other => panic!("expected Usage event, got {other:?}"),
        }
    }
}
