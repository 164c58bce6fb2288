//! A configurable `ProviderClient` double for exercising `orch-tools`'
//! dispatcher without a real provider integration.

use async_trait::async_trait;
use dashmap::DashMap;
use orch_core::Result;
use orch_tools::{ProviderConnection, ToolCallContext, ToolDescriptor, ToolInvocationOutcome};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Records every call it receives and replies according to a fixed table of
/// `tool -> outcome`, falling back to a generic success for unlisted tools.
pub struct MockProviderClient {
    provider: String,
    replies: DashMap<String, ToolInvocationOutcome>,
    calls: AtomicUsize,
}

impl MockProviderClient {
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            replies: DashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, tool: impl Into<String>, outcome: ToolInvocationOutcome) {
        self.replies.insert(tool.into(), outcome);
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl orch_tools::ProviderClient for MockProviderClient {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn register_tools(&self) -> Vec<ToolDescriptor> {
        Vec::new()
    }

    async fn execute_tool(&self, tool: &str, _input: Value, _ctx: &ToolCallContext) -> Result<ToolInvocationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .replies
            .get(tool)
            .map(|entry| entry.clone())
            .unwrap_or_else(|| ToolInvocationOutcome::ok(Value::Null)))
    }

    async fn ensure_fresh_token(&self, _connection: &mut ProviderConnection) -> Result<()> {
        Ok(())
    }
}
