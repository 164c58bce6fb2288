//! Session State & Context (system overview table, §4.1 session bias): a
//! per-session TTL cache of the most recently selected category, used to
//! bias follow-up requests toward the same category.

use dashmap::DashMap;
use orch_core::Category;
use std::time::{Duration, Instant};

const REFERENTIAL_TOKENS: &[&str] = &[
    "it", "that", "this", "them", "those", "again", "also", "too", "same", "more",
];

/// A short request (by word count) containing a referential token is
/// treated as a follow-up to the previous turn in the session.
#[must_use]
pub fn is_follow_up(request_text: &str) -> bool {
    let words: Vec<&str> = request_text.split_whitespace().collect();
    if words.len() > 8 {
        return false;
    }
    let lower = request_text.to_lowercase();
    REFERENTIAL_TOKENS
        .iter()
        .any(|token| lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == *token))
}

struct SessionEntry {
    recent_category: Category,
    recent_entities: Vec<String>,
    updated_at: Instant,
}

/// Per-session recent-category/entity memory with TTL eviction (spec §6:
/// session-context cache TTL 300s). Last-writer-wins, as with the route
/// cache — no cross-instance consistency guarantee.
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Record the category chosen for this session, replacing any prior
    /// record and resetting its TTL clock.
    pub fn record(&self, session_id: &str, category: Category, entities: Vec<String>) {
        self.sessions.insert(
            session_id.to_string(),
            SessionEntry {
                recent_category: category,
                recent_entities: entities,
                updated_at: Instant::now(),
            },
        );
    }

    /// Most recent category for this session, if any and not yet expired.
    #[must_use]
    pub fn recent_category(&self, session_id: &str) -> Option<Category> {
        let entry = self.sessions.get(session_id)?;
        if entry.updated_at.elapsed() > self.ttl {
            drop(entry);
            self.sessions.remove(session_id);
            return None;
        }
        Some(entry.recent_category)
    }

    #[must_use]
    pub fn recent_entities(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .get(session_id)
            .filter(|e| e.updated_at.elapsed() <= self.ttl)
            .map(|e| e.recent_entities.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_request_with_referential_token_is_follow_up() {
        assert!(is_follow_up("do that again"));
        assert!(!is_follow_up("build a brand new dashboard for our quarterly sales analytics"));
    }

    #[test]
    fn session_store_round_trips_recent_category() {
        let store = SessionStore::new(Duration::from_secs(300));
        store.record("sess1", Category::Ultrabrain, vec!["widget".to_string()]);
        assert_eq!(store.recent_category("sess1"), Some(Category::Ultrabrain));
        assert_eq!(store.recent_entities("sess1"), vec!["widget".to_string()]);
    }

    #[test]
    fn expired_session_entries_are_forgotten() {
        let store = SessionStore::new(Duration::from_millis(1));
        store.record("sess1", Category::Quick, vec![]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.recent_category("sess1").is_none());
    }
}
