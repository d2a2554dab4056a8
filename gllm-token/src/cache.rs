//! A process-wide, concurrent, bounded cache from message fingerprint to
//! estimated token count.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use gllm_types::Message;
use parking_lot::RwLock;

/// Default maximum number of entries before a bulk eviction kicks in.
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// `(hits, misses, size)` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of `get` calls that found a cached value.
    pub hits: u64,
    /// Number of `get` calls that found nothing.
    pub misses: u64,
    /// Current number of entries.
    pub size: usize,
}

/// Canonical fingerprint for a message: its JSON serialization, falling back
/// to a coarse `role|text` key if serialization ever fails (practically
/// unreachable since `Message` derives `Serialize` over plain data, but the
/// fallback keeps cache semantics defined rather than panicking).
#[must_use]
pub fn fingerprint(message: &Message) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| format!("{:?}|{}", message.role, message.text()))
}

/// A thread-safe, bounded map from message fingerprint to token count.
pub struct TokenCache {
    max_size: usize,
    entries: RwLock<HashMap<String, u64>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TokenCache {
    /// Create a cache with the given maximum size.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self { max_size, entries: RwLock::new(HashMap::new()), hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    /// Look up a cached token count for `message`.
    #[must_use]
    pub fn get(&self, message: &Message) -> Option<u64> {
        let key = fingerprint(message);
        let found = self.entries.read().get(&key).copied();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Insert a token count for `message`, evicting roughly half of the
    /// cache first if it is already at capacity.
    pub fn set(&self, message: &Message, tokens: u64) {
        let key = fingerprint(message);
        let mut entries = self.entries.write();
        if entries.len() >= self.max_size && !entries.contains_key(&key) {
            let to_remove: Vec<String> = entries.keys().take(entries.len() / 2).cloned().collect();
            for k in to_remove {
                entries.remove(&k);
            }
        }
        entries.insert(key, tokens);
    }

    /// Current hit/miss/size snapshot.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.read().len(),
        }
    }

    /// Reset hit/miss counters and drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gllm_types::Message;

    #[test]
    fn get_after_set_is_a_hit() {
        let cache = TokenCache::new(16);
        let msg = Message::user("hello");
        cache.set(&msg, 42);
        assert_eq!(cache.get(&msg), Some(42));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn miss_increments_miss_counter() {
        let cache = TokenCache::new(16);
        assert_eq!(cache.get(&Message::user("nope")), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn eviction_keeps_size_bounded() {
        let cache = TokenCache::new(4);
        for i in 0..20 {
            cache.set(&Message::user(format!("msg-{i}")), i);
        }
        assert!(cache.stats().size <= 4);
    }

    #[test]
    fn clear_resets_counters_and_entries() {
        let cache = TokenCache::new(16);
        let msg = Message::user("hi");
        cache.set(&msg, 1);
        cache.get(&msg);
        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats, CacheStats { hits: 0, misses: 0, size: 0 });
    }
}
