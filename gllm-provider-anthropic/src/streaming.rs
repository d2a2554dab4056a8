//! SSE streaming support for the Anthropic Messages API.
//!
//! Parses the Server-Sent Events stream Anthropic returns and maps each
//! event to a [`StreamEvent`].
//!
//! Reference: <https://docs.anthropic.com/en/api/messages-streaming>

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
        let mut state = SseParserState::new();
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

        if !line_buf.trim().is_empty() {
            for event in state.process_line(line_buf.trim()) {
                yield event;
            }
        }

        yield Ok(StreamEvent::MessageStop);
    }
}

/// Tracks in-progress streaming state across SSE events.
struct SseParserState {
    current_event_type: Option<String>,
    current_data: String,
    tool_uses: HashSet<usize>,
}

impl SseParserState {
    fn new() -> Self {
        Self { current_event_type: None, current_data: String::new(), tool_uses: HashSet::new() }
    }

    fn process_line(&mut self, line: &str) -> Vec<Result<StreamEvent, ProviderError>> {
        if line.is_empty() {
            return self.dispatch_event();
        }
        if let Some(event_type) = line.strip_prefix("event: ") {
            self.current_event_type = Some(event_type.trim().to_string());
        } else if let Some(data) = line.strip_prefix("data: ") {
            if !self.current_data.is_empty() {
                self.current_data.push('\n');
            }
            self.current_data.push_str(data.trim());
        }
        vec![]
    }

    fn dispatch_event(&mut self) -> Vec<Result<StreamEvent, ProviderError>> {
        let Some(event_type) = self.current_event_type.take() else {
            self.current_data.clear();
            return vec![];
        };
        let data = std::mem::take(&mut self.current_data);
        if data.is_empty() || data == "[DONE]" {
            return vec![];
        }

        let json: serde_json::Value = match serde_json::from_str(&data) {
            Ok(v) => v,
            Err(e) => return vec![Err(ProviderError::StreamError(format!("JSON parse error in SSE: {e}")))],
        };

        match event_type.as_str() {
            "content_block_start" => self.handle_content_block_start(&json),
            "content_block_delta" => self.handle_content_block_delta(&json),
            "content_block_stop" => self.handle_content_block_stop(&json),
            "message_start" => self.handle_usage_snapshot(&json["message"]["usage"]),
            "message_delta" => self.handle_usage_snapshot(&json["usage"]),
            "message_stop" | "ping" => vec![],
            "error" => {
                let msg = json["error"]["message"].as_str().unwrap_or("unknown streaming error").to_string();
                vec![Err(ProviderError::StreamError(msg))]
            }
            _ => vec![],
        }
    }

    fn handle_content_block_start(&mut self, json: &serde_json::Value) -> Vec<Result<StreamEvent, ProviderError>> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let block = &json["content_block"];
        match block["type"].as_str().unwrap_or("") {
            "tool_use" => {
                let id = block["id"].as_str().unwrap_or("").to_string();
                let name = block["name"].as_str().unwrap_or("").to_string();
                self.tool_uses.insert(index);
                vec![Ok(StreamEvent::ToolUseStart { index, id, name })]
            }
            _ => vec![],
        }
    }

    fn handle_content_block_delta(&mut self, json: &serde_json::Value) -> Vec<Result<StreamEvent, ProviderError>> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let delta = &json["delta"];
        match delta["type"].as_str().unwrap_or("") {
            "text_delta" => vec![Ok(StreamEvent::TextDelta(delta["text"].as_str().unwrap_or("").to_string()))],
            "thinking_delta" => vec![Ok(StreamEvent::ThinkingDelta(delta["thinking"].as_str().unwrap_or("").to_string()))],
            "signature_delta" => {
                vec![Ok(StreamEvent::ThinkingSignatureDelta(delta["signature"].as_str().unwrap_or("").to_string()))]
            }
            "input_json_delta" => {
                vec![Ok(StreamEvent::ToolUseDelta { index, partial_json: delta["partial_json"].as_str().unwrap_or("").to_string() })]
            }
            _ => vec![],
        }
    }

    fn handle_content_block_stop(&mut self, json: &serde_json::Value) -> Vec<Result<StreamEvent, ProviderError>> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        if self.tool_uses.remove(&index).is_some() {
            vec![Ok(StreamEvent::ToolUseStop { index })]
        } else {
            vec![]
        }
    }

    /// `message_start` and `message_delta` each carry a partial usage
    /// snapshot (input/cache tokens at start, output tokens at the end);
    /// both are forwarded so [`TokenUsage::accumulate`]'s max-semantics for
    /// input/cached tokens sees the real value rather than zero.
    fn handle_usage_snapshot(&mut self, usage_val: &serde_json::Value) -> Vec<Result<StreamEvent, ProviderError>> {
        if usage_val.is_null() {
            return vec![];
        }
        let usage = TokenUsage {
            input_tokens: usage_val["input_tokens"].as_u64().unwrap_or(0),
            output_tokens: usage_val["output_tokens"].as_u64().unwrap_or(0),
            cached_tokens: usage_val["cache_read_input_tokens"].as_u64().unwrap_or(0),
            thought_tokens: 0,
        };
        vec![Ok(StreamEvent::Usage(usage))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(sse: &str) -> Vec<Result<StreamEvent, ProviderError>> {
        let mut state = SseParserState::new();
        let mut events = Vec::new();
        for line in sse.lines() {
            events.extend(state.process_line(line));
        }
        events.extend(state.process_line(""));
        events
    }

    #[test]
    fn parses_text_deltas_in_order() {
        let sse = "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi \"}}\n\nevent: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"there\"}}\n";
        let events = feed(sse);
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
    fn tool_use_start_carries_index_id_and_name() {
        let sse = "event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":2,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_1\",\"name\":\"search\"}}\n";
        let events = feed(sse);
        assert_eq!(
            events[0].as_ref().unwrap(),
            &StreamEvent::ToolUseStart { index: 2, id: "toolu_1".into(), name: "search".into() }
        );
    }

    #[test]
    fn message_start_usage_is_captured_not_discarded() {
        let sse = "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":40,\"cache_read_input_tokens\":10,\"output_tokens\":0}}}\n";
        let events = feed(sse);
        match &events[0] {
            Ok(StreamEvent::Usage(usage)) => {
                assert_eq!(usage.input_tokens, 40);
                assert_eq!(usage.cached_tokens, 10);
            }
            other => panic!("expected Usage event, got {other:?}"),
        }
    }

    #[test]
    fn message_delta_usage_reports_output_tokens() {
        let sse = "event: message_delta\ndata: {\"type\":\"message_delta\",\"usage\":{\"input_tokens\":0,\"output_tokens\":17}}\n";
        let events = feed(sse);
        match &events[0] {
            Ok(StreamEvent::Usage(usage)) => assert_eq!(usage.output_tokens, 17),
            other => panic!("expected Usage event, got {other:?}"),
        }
    }

    #[test]
    fn error_event_yields_a_stream_error() {
        let sse = "event: error\ndata: {\"error\":{\"message\":\"overloaded\"}}\n";
        let events = feed(sse);
        assert!(matches!(&events[0], Err(ProviderError::StreamError(msg)) if msg == "overloaded"));
    }

    #[test]
    fn ping_events_produce_nothing() {
        let sse = "event: ping\ndata: {\"type\":\"ping\"}\n";
        assert!(feed(sse).is_empty());
    }
}
