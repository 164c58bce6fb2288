//! ABOUTME: ExecutionContext carried by value through every recursive orchestration call
//! ABOUTME: Immutable except for derived child contexts with depth+1

use crate::types::ComponentId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Spawn depth never exceeds `min(config.max_depth, HARD_SPAWN_DEPTH)`.
pub const HARD_SPAWN_DEPTH: u8 = 5;

/// Per-call execution context. Cheap to clone; `Arc`-wrapped shared pieces
/// (rate limiter handles, budget row handles) are threaded in by the crates
/// that own them rather than stored here, keeping this type dependency-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub organization_id: String,
    pub user_id: String,
    pub session_id: String,
    pub depth: u8,
    pub max_depth: u8,
    pub root_execution_id: ComponentId,
    pub parent_execution_id: Option<ComponentId>,
    pub remaining_budget_tokens: Option<u64>,
}

impl ExecutionContext {
    /// Create a new root context at depth 0.
    #[must_use]
    pub fn root(
        organization_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        max_depth: u8,
    ) -> Self {
        let root_execution_id = ComponentId::new();
        Self {
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            depth: 0,
            max_depth: max_depth.min(HARD_SPAWN_DEPTH),
            root_execution_id,
            parent_execution_id: None,
            remaining_budget_tokens: None,
        }
    }

    /// Derive a child context one level deeper, inheriting organization/user/
    /// session identity and the root execution id, per the spawn-tree invariant:
    /// every record under a `root_execution_id` forms a tree rooted at that id.
    #[must_use]
    pub fn child(&self) -> Self {
        let this_id = ComponentId::new();
        debug!(
            parent = %this_id,
            depth = self.depth + 1,
            root = %self.root_execution_id,
            "deriving child execution context"
        );
        Self {
            organization_id: self.organization_id.clone(),
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
            depth: self.depth + 1,
            max_depth: self.max_depth,
            root_execution_id: self.root_execution_id,
            parent_execution_id: Some(this_id),
            remaining_budget_tokens: self.remaining_budget_tokens,
        }
    }

    /// `true` if one more level of spawning would violate the depth invariant.
    #[must_use]
    pub fn would_exceed_depth(&self) -> bool {
        self.depth + 1 > self.max_depth || self.depth + 1 > HARD_SPAWN_DEPTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_increments_depth_and_keeps_root() {
        let root = ExecutionContext::root("org1", "user1", "sess1", 3);
        let child = root.child();
        assert_eq!(child.depth, 1);
        assert_eq!(child.root_execution_id, root.root_execution_id);
        assert_eq!(child.max_depth, 3);
    }

    #[test]
    fn max_depth_is_capped_at_hard_limit() {
        let root = ExecutionContext::root("org1", "user1", "sess1", 9);
        assert_eq!(root.max_depth, HARD_SPAWN_DEPTH);
    }

    #[test]
    fn depth_guard_detects_overflow() {
        let mut ctx = ExecutionContext::root("org1", "user1", "sess1", 2);
        ctx.depth = 2;
        assert!(ctx.would_exceed_depth());
    }
}
