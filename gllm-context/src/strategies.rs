//! The `TruncateOldest` truncation engine shared by every family entry point.

use std::collections::HashSet;

use gllm_types::{ContextError, Message, Role};

/// Which truncation policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Return history unchanged.
    None,
    /// Evict the oldest messages (and their tool-call groups) until the
    /// history fits the budget.
    TruncateOldest,
    /// Reserved; not implemented.
    Summarize,
}

/// Consolidate every system message into a single leading one.
///
/// Later system contents already substring-contained in the accumulator are
/// skipped, so repeated directives are not duplicated.
pub(crate) fn consolidate_system(messages: Vec<Message>) -> (Option<Message>, Vec<Message>) {
    let mut system_texts = Vec::new();
    let mut non_system = Vec::with_capacity(messages.len());
    for message in messages {
        if message.role == Role::System {
            system_texts.push(message.text());
        } else {
            non_system.push(message);
        }
    }
    if system_texts.is_empty() {
        return (None, non_system);
    }
    let mut accumulator = String::new();
    for (i, text) in system_texts.iter().enumerate() {
        if i == 0 {
            accumulator.push_str(text);
            continue;
        }
        if accumulator.contains(text.as_str()) {
            continue;
        }
        accumulator.push('\n');
        accumulator.push_str(text);
    }
    (Some(Message::system(accumulator)), non_system)
}

/// Every id that appears on a message, either defining a tool-use or
/// referencing a tool-result.
fn linked_ids(message: &Message) -> HashSet<String> {
    message.tool_use_ids().chain(message.tool_result_ids()).map(String::from).collect()
}

/// The full atomic group containing `start`: every message elsewhere in the
/// list that shares a tool-use/tool-result id with it, transitively.
pub(crate) fn atomic_group(messages: &[Message], start: usize) -> Vec<usize> {
    let mut ids = linked_ids(&messages[start]);
    if ids.is_empty() {
        return vec![start];
    }
    let mut indices: HashSet<usize> = HashSet::from([start]);
    loop {
        let mut grew = false;
        for (i, message) in messages.iter().enumerate() {
            if indices.contains(&i) {
                continue;
            }
            let their_ids = linked_ids(message);
            if their_ids.iter().any(|id| ids.contains(id)) {
                indices.insert(i);
                for id in their_ids {
                    grew |= ids.insert(id);
                }
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }
    let mut sorted: Vec<usize> = indices.into_iter().collect();
    sorted.sort_unstable();
    sorted
}

/// Evict the oldest message (or its whole atomic tool-call group) from
/// `non_system` until its estimated token total fits `available`, or until
/// nothing more can be removed.
pub(crate) fn truncate_oldest(mut non_system: Vec<Message>, available: u64) -> (Vec<Message>, bool) {
    let mut truncated = false;
    loop {
        if non_system.is_empty() {
            break;
        }
        let current: u64 = non_system.iter().map(gllm_token::estimate_message).sum();
        if current <= available {
            break;
        }
        let group = atomic_group(&non_system, 0);
        for &idx in group.iter().rev() {
            non_system.remove(idx);
        }
        truncated = true;
    }
    (non_system, truncated)
}

/// Apply `strategy` to `non_system` given the token budget left over after
/// reserving space for the system prompt and tool schemas.
pub(crate) fn apply(strategy: Strategy, non_system: Vec<Message>, available: u64) -> Result<(Vec<Message>, bool), ContextError> {
    match strategy {
        Strategy::None => Ok((non_system, false)),
        Strategy::TruncateOldest => Ok(truncate_oldest(non_system, available)),
        Strategy::Summarize => Err(ContextError::Unsupported("summarize".into())),
    }
}
