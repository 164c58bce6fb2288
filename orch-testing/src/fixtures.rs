//! Small builders for the value types threaded through nearly every test in
//! this workspace, so individual crates don't each hand-roll the same
//! `Request`/`ExecutionContext` literals.

use orch_core::{ExecutionContext, Request};

/// Build a `Request` with sensible defaults, overriding only what the test
/// cares about.
pub struct RequestBuilder {
    user_request: String,
    session_id: String,
    organization_id: String,
    user_id: String,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(user_request: impl Into<String>) -> Self {
        Self {
            user_request: user_request.into(),
            session_id: "test-session".to_string(),
            organization_id: "test-org".to_string(),
            user_id: "test-user".to_string(),
        }
    }

    #[must_use]
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = id.into();
        self
    }

    #[must_use]
    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = id.into();
        self
    }

    #[must_use]
    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = id.into();
        self
    }

    #[must_use]
    pub fn build(self) -> Request {
        Request {
            user_request: self.user_request,
            session_id: self.session_id,
            organization_id: self.organization_id,
            user_id: self.user_id,
        }
    }
}

/// A root `ExecutionContext` with workspace-default limits
/// (`max_depth=3`), for tests that don't care about the depth guard.
#[must_use]
pub fn root_context() -> ExecutionContext {
    ExecutionContext::root("test-org", "test-user", "test-session", 3)
}

/// Same as [`root_context`] but already at `depth`, for exercising
/// depth-guard rejections without spawning through the real chain.
#[must_use]
pub fn root_context_at_depth(depth: u8) -> ExecutionContext {
    let mut ctx = root_context();
    ctx.depth = depth;
    ctx
}
