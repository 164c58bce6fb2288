//! Provider client contract and pool (spec §4.7).

use crate::descriptor::{ProviderConnection, ToolDescriptor};
use async_trait::async_trait;
use dashmap::DashMap;
use orch_core::Result;
use serde_json::Value;
use std::sync::Arc;

/// Context threaded into a provider client call.
#[derive(Debug, Clone)]
pub struct ToolCallContext {
    pub organization_id: String,
    pub connection_id: String,
    pub user_id: Option<String>,
}

/// Raw outcome of a tool invocation, before idempotency/cache handling.
#[derive(Debug, Clone)]
pub struct ToolInvocationOutcome {
    pub output: Value,
    pub error_code: Option<String>,
}

impl ToolInvocationOutcome {
    #[must_use]
    pub fn ok(output: Value) -> Self {
        Self {
            output,
            error_code: None,
        }
    }

    #[must_use]
    pub fn failed(error_code: impl Into<String>) -> Self {
        Self {
            output: Value::Null,
            error_code: Some(error_code.into()),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }
}

/// Contract a provider integration must implement to participate in
/// dispatch. `ensure_fresh_token` is called before every invocation for
/// OAuth connections; it mutates `connection` in place when it refreshes.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider_name(&self) -> &str;

    fn register_tools(&self) -> Vec<ToolDescriptor>;

    async fn execute_tool(
        &self,
        tool: &str,
        input: Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolInvocationOutcome>;

    async fn ensure_fresh_token(&self, connection: &mut ProviderConnection) -> Result<()>;
}

/// Reference-counted client pool keyed by `(provider, organization_id)`.
/// Pooling is advisory per spec §5 — clients are cheap to create, so
/// acquisition never blocks and release is a no-op beyond bookkeeping.
#[derive(Default)]
pub struct ClientPool {
    clients: DashMap<(String, String), Arc<dyn ProviderClient>>,
}

impl ClientPool {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    pub fn register(&self, organization_id: &str, client: Arc<dyn ProviderClient>) {
        let key = (client.provider_name().to_string(), organization_id.to_string());
        self.clients.insert(key, client);
    }

    #[must_use]
    pub fn acquire(&self, provider: &str, organization_id: &str) -> Option<Arc<dyn ProviderClient>> {
        self.clients
            .get(&(provider.to_string(), organization_id.to_string()))
            .map(|entry| entry.clone())
    }

    /// Release is synchronous and advisory (spec §5); pooling here is
    /// reference-count based so there's nothing to do beyond letting the
    /// `Arc` clone drop.
    pub fn release(&self, _provider: &str, _organization_id: &str) {}
}
