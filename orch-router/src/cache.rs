//! Route cache (spec §4.1): keys the result of a full classification by the
//! request fingerprint, with a 24h TTL. Last-writer-wins, no consistency
//! guarantees beyond TTL, matching spec §5's shared-resource notes.

use dashmap::DashMap;
use orch_core::{CategorySelection, SkillSelection};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry {
    category: CategorySelection,
    skills: SkillSelection,
    inserted_at: Instant,
}

/// TTL-bounded cache from request fingerprint to a full routing decision.
pub struct RouteCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl RouteCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fetch a cached decision if present and not yet expired. A cache
    /// error (not modeled here since `DashMap` access can't fail) is
    /// treated the same as a miss per spec §4.1's "cache error → bypass
    /// cache" failure mode.
    #[must_use]
    pub fn get(&self, fingerprint: &str) -> Option<(CategorySelection, SkillSelection)> {
        let entry = self.entries.get(fingerprint)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(fingerprint);
            return None;
        }
        Some((entry.category.clone(), entry.skills.clone()))
    }

    pub fn put(&self, fingerprint: String, category: CategorySelection, skills: SkillSelection) {
        self.entries.insert(
            fingerprint,
            CacheEntry {
                category,
                skills,
                inserted_at: Instant::now(),
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
