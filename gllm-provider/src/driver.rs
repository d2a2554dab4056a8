//! The generic turn driver: one recursive request/stream/tool loop shared
//! by every provider family.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use gllm_context::Strategy;
use gllm_tool::ToolRegistry;
use gllm_types::{
    CompletionRequest, ContentBlock, DriverError, Message, ModelLimits, Role, SystemPrompt,
    ThinkingLevel, TokenUsage,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};

use crate::provider::Provider;
use crate::types::StreamEvent;
use crate::ui::{DataEvent, Status, Ui};

/// Tool input fields dropped from the displayable arguments shown to the
/// UI before a tool runs — bulky payloads the user doesn't need to see to
/// approve the call.
const BULKY_ARG_FIELDS: &[&str] = &["content", "edits"];

/// Static, per-agent configuration the driver consults on every turn.
pub struct DriverConfig {
    /// Model identifier sent to the provider.
    pub model: String,
    /// System prompt, if the family carries it out-of-band.
    pub system: Option<SystemPrompt>,
    /// Whether this family consolidates system messages into the history
    /// itself (OpenAI-shaped) rather than carrying `system` out-of-band.
    pub carries_system_in_history: bool,
    /// Maximum request/tool-use recursions before the turn gives up.
    pub max_recursions: usize,
    /// Reasoning effort requested of the model.
    pub thinking: ThinkingLevel,
    /// Sampling temperature; mutually exclusive with `top_p` (temperature
    /// wins when set and greater than zero).
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,
    /// This model's context window and max-output-token limits.
    pub limits: ModelLimits,
    /// Fraction of the context window reserved as headroom.
    pub buffer: f64,
}

/// What one completed turn produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// The final assistant-visible text (empty if the turn ended on
    /// something other than plain text, e.g. a halted tool loop).
    pub final_text: String,
    /// Token usage accumulated across every provider call this turn.
    pub usage: TokenUsage,
    /// Number of request/response recursions the turn took.
    pub turns_used: usize,
}

/// Drives one assistant turn: builds requests, streams responses,
/// dispatches tool calls, and persists the conversation as it grows.
///
/// Generic over `P: Provider` (not a trait object — `Provider` is
/// deliberately not object-safe).
pub struct Driver<P: Provider> {
    provider: P,
    tools: ToolRegistry,
    store: Arc<gllm_store::ConversationStore>,
    config: DriverConfig,
}

#[derive(Default)]
struct ToolUseBuilder {
    id: String,
    name: String,
    partial_json: String,
}

impl<P: Provider> Driver<P> {
    /// Build a driver over `provider`, dispatching through `tools` and
    /// persisting to `store`.
    pub fn new(provider: P, tools: ToolRegistry, store: Arc<gllm_store::ConversationStore>, config: DriverConfig) -> Self {
        Self { provider, tools, store, config }
    }

    fn build_request(&self, messages: Vec<Message>) -> CompletionRequest {
        let (temperature, top_p) = match self.config.temperature {
            Some(t) if t > 0.0 => (Some(t), None),
            _ => (None, self.config.top_p),
        };
        CompletionRequest {
            model: self.config.model.clone(),
            messages,
            system: self.config.system.clone(),
            tools: self.tools.definitions(),
            max_tokens: Some(self.config.limits.max_output_tokens as usize),
            temperature,
            top_p,
            thinking: self.config.thinking,
        }
    }

    /// Run the turn to completion: recursively call the provider, stream
    /// its response, execute any requested tools, and loop until the
    /// assistant responds with no further tool uses or
    /// `max_recursions` is reached.
    pub async fn run_turn(&self, ui: &dyn Ui, cancellation: &CancellationToken) -> Result<TurnOutcome, DriverError> {
        let mut usage = TokenUsage::default();
        let mut turns_used = 0usize;

        loop {
            turns_used += 1;
            if turns_used > self.config.max_recursions {
                return Err(DriverError::MaxRecursions(self.config.max_recursions));
            }

            ui.notify(Status::Processing).await;

            let history = self.store.get_messages().await;
            let tool_defs = self.tools.definitions();
            let (trimmed, was_truncated) = gllm_context::prepare(
                history.clone(),
                self.config.system.as_ref(),
                &tool_defs,
                self.config.limits,
                self.config.buffer,
                self.config.carries_system_in_history,
                Strategy::TruncateOldest,
            )?;
            if was_truncated {
                self.store.set_messages(trimmed.clone()).await?;
                ui.notify(Status::Warn("conversation history truncated to fit the model's context window".to_string())).await;
            }

            let request = self.build_request(trimmed);

            let span = info_span!("provider_turn", model = %self.config.model, turn = turns_used);
            let mut stream = self.provider.stream(request).instrument(span).await?;
            ui.notify(Status::Started).await;

            let mut text = String::new();
            let mut thinking = String::new();
            let mut thinking_signature = String::new();
            let mut reasoning_open = false;
            let mut tool_builders: HashMap<usize, ToolUseBuilder> = HashMap::new();
            let mut tool_order: Vec<usize> = Vec::new();

            while let Some(event) = stream.next().await {
                if cancellation.is_cancelled() {
                    return Err(DriverError::Cancelled);
                }
                match event? {
                    StreamEvent::TextDelta(delta) => {
                        text.push_str(&delta);
                        ui.data(DataEvent::TextDelta(delta)).await;
                    }
                    StreamEvent::ThinkingDelta(delta) => {
                        if !reasoning_open {
                            reasoning_open = true;
                            ui.notify(Status::Reasoning).await;
                        }
                        thinking.push_str(&delta);
                        ui.data(DataEvent::ReasoningDelta(delta)).await;
                    }
                    StreamEvent::ThinkingSignatureDelta(delta) => {
                        thinking_signature.push_str(&delta);
                    }
                    StreamEvent::ToolUseStart { index, id, name } => {
                        tool_order.push(index);
                        tool_builders.insert(index, ToolUseBuilder { id, name, partial_json: String::new() });
                    }
                    StreamEvent::ToolUseDelta { index, partial_json } => {
                        if let Some(builder) = tool_builders.get_mut(&index) {
                            builder.partial_json.push_str(&partial_json);
                        }
                    }
                    StreamEvent::ToolUseStop { .. } => {
                        if reasoning_open {
                            reasoning_open = false;
                            ui.notify(Status::ReasoningOver).await;
                        }
                    }
                    StreamEvent::Usage(snapshot) => {
                        usage.accumulate(&snapshot);
                    }
                    StreamEvent::MessageStop => break,
                }
            }
            if reasoning_open {
                ui.notify(Status::ReasoningOver).await;
            }

            let mut assistant_content = Vec::new();
            if !thinking.is_empty() {
                assistant_content.push(ContentBlock::Thinking {
                    thinking,
                    signature: if thinking_signature.is_empty() { None } else { Some(thinking_signature) },
                });
            }
            if !text.is_empty() {
                assistant_content.push(ContentBlock::Text { text: text.clone() });
            }
            let mut tool_uses: Vec<(String, String, Value)> = Vec::new();
            for index in tool_order {
                let Some(builder) = tool_builders.remove(&index) else { continue };
                let input = serde_json::from_str(&builder.partial_json).unwrap_or(Value::String(builder.partial_json.clone()));
                assistant_content.push(ContentBlock::ToolUse { id: builder.id.clone(), name: builder.name.clone(), input: input.clone() });
                tool_uses.push((builder.id, builder.name, input));
            }

            self.store.append(Message { role: Role::Assistant, content: assistant_content }).await?;

            if tool_uses.is_empty() {
                ui.data(DataEvent::Finished).await;
                ui.await_proceed().await;
                ui.notify(Status::Finished).await;
                return Ok(TurnOutcome { final_text: text, usage, turns_used });
            }

            for (id, name, input) in tool_uses {
                ui.notify(Status::FunctionCalling { name: name.clone(), args: filtered_args(&input) }).await;

                let outcome = match self.tools.get(&name) {
                    Some(tool) => tool.call(input).await,
                    None => Err(gllm_types::ToolError::NotFound(name.clone())),
                };

                match outcome {
                    Ok(value) => {
                        let result = ContentBlock::ToolResult { tool_use_id: id, content: render_tool_output(&value), is_error: false };
                        self.store.append(Message { role: Role::Tool, content: vec![result] }).await?;
                    }
                    Err(gllm_types::ToolError::SwitchAgent { target, follow_up }) => {
                        let result = ContentBlock::ToolResult { tool_use_id: id, content: format!("switching to agent {target}"), is_error: false };
                        self.store.append(Message { role: Role::Tool, content: vec![result] }).await?;
                        return Err(DriverError::SwitchAgent { target, follow_up });
                    }
                    Err(gllm_types::ToolError::UserCancel) => {
                        let result = ContentBlock::ToolResult { tool_use_id: id, content: "cancelled by user".to_string(), is_error: true };
                        self.store.append(Message { role: Role::Tool, content: vec![result] }).await?;
                        return Err(DriverError::UserCancel);
                    }
                    Err(e) => {
                        let message = e.to_string();
                        let result = ContentBlock::ToolResult { tool_use_id: id, content: message.clone(), is_error: true };
                        self.store.append(Message { role: Role::Tool, content: vec![result] }).await?;
                        ui.notify(Status::Warn(format!("{name} failed: {message}"))).await;
                        warn!(tool = %name, error = %message, "tool call failed");
                    }
                }

                ui.notify(Status::FunctionCallingOver).await;
            }
        }
    }
}

fn filtered_args(input: &Value) -> Value {
    let Value::Object(map) = input else { return input.clone() };
    let mut filtered = map.clone();
    for field in BULKY_ARG_FIELDS {
        filtered.remove(*field);
    }
    Value::Object(filtered)
}

fn render_tool_output(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EventStream;
    use crate::ui::QuietUi;
    use futures::stream;
    use gllm_store::Dialect;
    use gllm_types::ProviderError;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct ScriptedProvider {
        responses: Arc<Vec<Vec<StreamEvent>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Vec<StreamEvent>>) -> Self {
            Self { responses: Arc::new(responses), calls: AtomicUsize::new(0) }
        }
    }

    impl Provider for ScriptedProvider {
        fn stream(&self, _request: CompletionRequest) -> impl Future<Output = Result<EventStream, ProviderError>> + Send {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            let responses = self.responses.clone();
            async move {
                let events = responses.get(index).cloned().unwrap_or_default();
                let boxed: EventStream = Box::pin(stream::iter(events.into_iter().map(Ok)));
                Ok(boxed)
            }
        }
    }

    fn limits() -> ModelLimits {
        ModelLimits { context_window: 200_000, max_output_tokens: 4096 }
    }

    fn config() -> DriverConfig {
        DriverConfig {
            model: "test-model".to_string(),
            system: None,
            carries_system_in_history: true,
            max_recursions: 10,
            thinking: ThinkingLevel::Off,
            temperature: Some(0.7),
            top_p: None,
            limits: limits(),
            buffer: 0.1,
        }
    }

    async fn store() -> (Arc<gllm_store::ConversationStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(gllm_store::ConversationStore::new(dir.path().join("convo.json"), Dialect::Generic));
        store.load().await.unwrap();
        store.append(Message::user("hello")).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn plain_text_reply_ends_the_turn() {
        let (store, _dir) = store().await;
        let provider = ScriptedProvider::new(vec![vec![StreamEvent::TextDelta("hi there".into()), StreamEvent::MessageStop]]);
        let driver = Driver::new(provider, ToolRegistry::new(), store.clone(), config());

        let outcome = driver.run_turn(&QuietUi, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.final_text, "hi there");
        assert_eq!(outcome.turns_used, 1);

        let messages = store.get_messages().await;
        assert_eq!(messages.last().unwrap().text(), "hi there");
    }

    struct EchoTool;
    impl gllm_tool::ToolDyn for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes back"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, gllm_types::ToolError>> + Send + '_>> {
            Box::pin(async move { Ok(Value::String(format!("echoed: {input}"))) })
        }
    }

    #[tokio::test]
    async fn tool_use_runs_and_loop_continues_to_final_text() {
        let (store, _dir) = store().await;
        let provider = ScriptedProvider::new(vec![
            vec![
                StreamEvent::ToolUseStart { index: 0, id: "call_1".into(), name: "echo".into() },
                StreamEvent::ToolUseDelta { index: 0, partial_json: "{\"msg\":\"hi\"}".into() },
                StreamEvent::ToolUseStop { index: 0 },
                StreamEvent::MessageStop,
            ],
            vec![StreamEvent::TextDelta("done".into()), StreamEvent::MessageStop],
        ]);
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let driver = Driver::new(provider, registry, store.clone(), config());

        let outcome = driver.run_turn(&QuietUi, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.final_text, "done");
        assert_eq!(outcome.turns_used, 2);

        let messages = store.get_messages().await;
        let tool_result = messages.iter().find_map(|m| {
            m.content.iter().find_map(|c| match c {
                ContentBlock::ToolResult { content, .. } => Some(content.clone()),
                _ => None,
            })
        });
        assert_eq!(tool_result.unwrap(), "echoed: {\"msg\":\"hi\"}");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_as_an_error_result_not_fatal() {
        let (store, _dir) = store().await;
        let provider = ScriptedProvider::new(vec![
            vec![
                StreamEvent::ToolUseStart { index: 0, id: "call_1".into(), name: "ghost".into() },
                StreamEvent::ToolUseStop { index: 0 },
                StreamEvent::MessageStop,
            ],
            vec![StreamEvent::TextDelta("recovered".into()), StreamEvent::MessageStop],
        ]);
        let driver = Driver::new(provider, ToolRegistry::new(), store.clone(), config());

        let outcome = driver.run_turn(&QuietUi, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.final_text, "recovered");
    }

    #[tokio::test]
    async fn max_recursions_is_enforced() {
        let (store, _dir) = store().await;
        let endless_tool_use = vec![
            StreamEvent::ToolUseStart { index: 0, id: "call_1".into(), name: "echo".into() },
            StreamEvent::ToolUseDelta { index: 0, partial_json: "{}".into() },
            StreamEvent::ToolUseStop { index: 0 },
            StreamEvent::MessageStop,
        ];
        let provider = ScriptedProvider::new(vec![endless_tool_use.clone(), endless_tool_use.clone(), endless_tool_use]);
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let mut cfg = config();
        cfg.max_recursions = 2;
        let driver = Driver::new(provider, registry, store, cfg);

        let err = driver.run_turn(&QuietUi, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DriverError::MaxRecursions(2)));
    }

    struct SwitchTool;
    impl gllm_tool::ToolDyn for SwitchTool {
        fn name(&self) -> &str {
            "switch_agent"
        }
        fn description(&self) -> &str {
            "switches agent"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        fn call(&self, _input: Value) -> Pin<Box<dyn Future<Output = Result<Value, gllm_types::ToolError>> + Send + '_>> {
            Box::pin(async move { Err(gllm_types::ToolError::SwitchAgent { target: "researcher".into(), follow_up: None }) })
        }
    }

    #[tokio::test]
    async fn switch_agent_persists_result_then_propagates() {
        let (store, _dir) = store().await;
        let provider = ScriptedProvider::new(vec![vec![
            StreamEvent::ToolUseStart { index: 0, id: "call_1".into(), name: "switch_agent".into() },
            StreamEvent::ToolUseStop { index: 0 },
            StreamEvent::MessageStop,
        ]]);
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SwitchTool));
        let driver = Driver::new(provider, registry, store.clone(), config());

        let err = driver.run_turn(&QuietUi, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DriverError::SwitchAgent { target, .. } if target == "researcher"));

        let messages = store.get_messages().await;
        assert!(messages.iter().any(|m| m.content.iter().any(|c| matches!(c, ContentBlock::ToolResult { .. }))));
    }
}
