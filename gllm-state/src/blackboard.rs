//! The in-process keyed blackboard shared by a session's agents and tools.

use std::collections::HashMap;

use gllm_types::SharedStateEntry;
use tokio::sync::RwLock;

/// Thread-safe key/value store that records who wrote each entry.
///
/// Overwrites replace the previous entry outright; there is no versioning
/// or merge semantics. Every write is immediately visible to
/// [`SharedState::list`] and [`SharedState::get`].
#[derive(Default)]
pub struct SharedState {
    entries: RwLock<HashMap<String, SharedStateEntry>>,
}

impl SharedState {
    /// An empty blackboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) `key`, recording `created_by` as the writing agent.
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>, created_by: impl Into<String>, content_type: impl Into<String>) {
        let entry = SharedStateEntry::new(value.into(), created_by, content_type);
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Look up one entry by key.
    pub async fn get(&self, key: &str) -> Option<SharedStateEntry> {
        self.entries.read().await.get(key).cloned()
    }

    /// All entries, sorted by key for stable listings.
    pub async fn list(&self) -> Vec<(String, SharedStateEntry)> {
        let mut entries: Vec<_> = self.entries.read().await.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Whether `key` currently has an entry.
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let state = SharedState::new();
        state.set("task_1", "result text", "researcher", "text/plain").await;
        let entry = state.get("task_1").await.unwrap();
        assert_eq!(entry.value, "result text");
        assert_eq!(entry.created_by, "researcher");
        assert_eq!(entry.size, "result text".len());
    }

    #[tokio::test]
    async fn overwrite_replaces_creator_and_value() {
        let state = SharedState::new();
        state.set("k", "v1", "a1", "text/plain").await;
        state.set("k", "v2", "a2", "text/plain").await;
        let entry = state.get("k").await.unwrap();
        assert_eq!(entry.value, "v2");
        assert_eq!(entry.created_by, "a2");
    }

    #[tokio::test]
    async fn list_is_sorted_and_observes_all_writes() {
        let state = SharedState::new();
        state.set("b", "2", "agent", "text/plain").await;
        state.set("a", "1", "agent", "text/plain").await;
        let listed = state.list().await;
        let keys: Vec<_> = listed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let state = SharedState::new();
        assert!(state.get("nope").await.is_none());
        assert!(!state.contains("nope").await);
    }
}
