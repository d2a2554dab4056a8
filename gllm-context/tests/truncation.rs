use gllm_context::{prepare_anthropic, prepare_gemini, prepare_openai};
use gllm_types::{ContentBlock, Message, ModelLimits, Role};
use std::collections::HashSet;

fn tiny_limits() -> ModelLimits {
    ModelLimits { context_window: 40, max_output_tokens: 8 }
}

#[test]
fn multiple_system_consolidation_openai() {
    let messages = vec![
        Message::system("A"),
        Message::user("M1"),
        Message::system("B"),
        Message::user("M2"),
        Message::system("C"),
        Message::user("M3"),
    ];
    let (result, truncated) = prepare_openai(messages, &[], tiny_limits(), 0.8).unwrap();
    assert!(truncated);
    assert_eq!(result[0].role, Role::System);
    assert_eq!(result[0].text(), "A\nB\nC");
    assert_eq!(result.iter().filter(|m| m.role == Role::System).count(), 1);
}

#[test]
fn atomic_tool_pair_drop_openai() {
    let assistant = Message {
        role: Role::Assistant,
        content: vec![ContentBlock::ToolUse { id: "call_123".into(), name: "shell".into(), input: serde_json::json!({}) }],
    };
    let result_msg = Message {
        role: Role::Tool,
        content: vec![ContentBlock::ToolResult { tool_use_id: "call_123".into(), content: "done".into(), is_error: false }],
    };
    let messages = vec![Message::user("old context padding padding padding"), assistant, result_msg, Message::assistant("final answer")];
    let (result, _truncated) = prepare_openai(messages, &[], tiny_limits(), 0.8).unwrap();
    let use_ids: HashSet<&str> = result.iter().flat_map(|m| m.tool_use_ids()).collect();
    let result_ids: HashSet<&str> = result.iter().flat_map(|m| m.tool_result_ids()).collect();
    assert_eq!(use_ids, result_ids);
}

#[test]
fn gemini_paired_eviction_removes_function_call_and_response_together() {
    let call = Message {
        role: Role::Assistant,
        content: vec![ContentBlock::ToolUse { id: "search".into(), name: "search".into(), input: serde_json::json!({}) }],
    };
    let response = Message {
        role: Role::Tool,
        content: vec![ContentBlock::ToolResult { tool_use_id: "search".into(), content: "results".into(), is_error: false }],
    };
    let messages = vec![call, response, Message::user("keep me, this is the newest turn and should survive")];
    let (result, _truncated) =
        prepare_gemini(messages, Some(&"be helpful".into()), &[], tiny_limits(), 0.8).unwrap();
    let use_ids: HashSet<&str> = result.iter().flat_map(|m| m.tool_use_ids()).collect();
    let result_ids: HashSet<&str> = result.iter().flat_map(|m| m.tool_result_ids()).collect();
    assert_eq!(use_ids, result_ids);
}

#[test]
fn under_budget_history_is_returned_unchanged() {
    let messages = vec![Message::user("hi")];
    let big_limits = ModelLimits { context_window: 1_000_000, max_output_tokens: 1000 };
    let (result, truncated) = prepare_anthropic(messages.clone(), None, &[], big_limits, 0.8).unwrap();
    assert!(!truncated);
    assert_eq!(result, messages);
}

#[test]
fn anthropic_system_stays_external_not_injected_into_history() {
    let messages = vec![Message::user("pad ".repeat(50)), Message::user("recent")];
    let (result, _truncated) =
        prepare_anthropic(messages, Some(&"system text".into()), &[], tiny_limits(), 0.8).unwrap();
    assert!(result.iter().all(|m| m.role != Role::System));
}
