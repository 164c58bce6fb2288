//! Tool result cache (spec §4.7): keyed by `(provider, tool, normalized_args,
//! organization_id)`, per-call TTL, last-writer-wins.

use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry {
    result: Value,
    inserted_at: Instant,
    ttl: Duration,
}

/// Build the composite cache key for a single tool call. Arguments are
/// normalized by round-tripping through their canonical `serde_json`
/// string form, so key order doesn't matter.
#[must_use]
pub fn cache_key(provider: &str, tool: &str, args: &Value, organization_id: &str) -> String {
    let normalized = normalize_args(args);
    format!("{provider}:{tool}:{organization_id}:{normalized}")
}

fn normalize_args(args: &Value) -> String {
    match args {
        Value::Object(map) => {
            let mut pairs: Vec<(String, String)> = map
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect();
            pairs.sort();
            pairs
                .into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&")
        }
        other => other.to_string(),
    }
}

/// TTL-bounded cache from composite key to a raw tool result.
#[derive(Default)]
pub struct ToolCache {
    entries: DashMap<String, CacheEntry>,
}

impl ToolCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.inserted_at.elapsed() > entry.ttl {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.result.clone())
    }

    pub fn put(&self, key: String, result: Value, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_key_is_order_independent() {
        let a = cache_key("slack", "send", &json!({"channel": "c1", "text": "hi"}), "org1");
        let b = cache_key("slack", "send", &json!({"text": "hi", "channel": "c1"}), "org1");
        assert_eq!(a, b);
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = ToolCache::new();
        cache.put("k1".to_string(), json!({"ok": true}), Duration::from_secs(60));
        assert_eq!(cache.get("k1"), Some(json!({"ok": true})));
    }

    #[test]
    fn expired_entries_are_treated_as_misses() {
        let cache = ToolCache::new();
        cache.put("k1".to_string(), json!("x"), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("k1").is_none());
    }
}
