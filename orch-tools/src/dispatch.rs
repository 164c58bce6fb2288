//! Tool dispatcher (spec §4.7): parses and validates a tool name, consults
//! the result cache, then invokes the provider client under a circuit
//! breaker adapted from `orch_hooks::circuit_breaker::CircuitBreaker`
//! (retargeted here from hook execution to provider-tool calls).

use crate::cache::{cache_key, ToolCache};
use crate::client::{ClientPool, ToolCallContext, ToolInvocationOutcome};
use crate::descriptor::ProviderConnection;
use crate::idempotency::is_idempotent_success;
use crate::naming::{parse_full_name, resolve_alias};
use dashmap::DashMap;
use orch_core::{OrchError, Result};
use orch_events::{EventBus, Language, UniversalEvent};
use orch_hooks::circuit_breaker::{BreakerConfig, CircuitBreakerManager};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{instrument, warn};

/// Circuit breaker thresholds from spec §4.7: 5 consecutive failures open;
/// 2 consecutive successes close from half-open; per-call timeout 30s;
/// reset-timeout 60s. The teacher's `BreakerConfig` also tracks "slow
/// calls" as an independent open trigger; that isn't part of this spec, so
/// it's neutralized with a threshold no ordinary call reaches.
fn tool_breaker_config() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: 5,
        success_threshold: 2,
        failure_window: Duration::from_secs(300),
        open_duration: Duration::from_secs(60),
        slow_call_threshold: u32::MAX,
        slow_call_duration: Duration::from_secs(3600),
    }
}

const PER_CALL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Tool dispatch entry point, wiring together naming, access control,
/// caching, the client pool, and the circuit breaker.
pub struct ToolDispatcher {
    connections: DashMap<(String, String), ProviderConnection>,
    pool: ClientPool,
    cache: ToolCache,
    breakers: CircuitBreakerManager,
    events: Option<Arc<EventBus>>,
    /// Per-provider `snake_case` → canonical `camelCase` alias table (spec
    /// §4.7/§8's legacy-alias round-trip law), applied to the parsed tool
    /// name right after `parse_full_name` and before anything else keys on
    /// the tool (cache, client call, tracing span).
    aliases: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl ToolDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            pool: ClientPool::new(),
            cache: ToolCache::new(),
            breakers: CircuitBreakerManager::with_config(tool_breaker_config()),
            events: None,
            aliases: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Install the `snake_case` → `camelCase` alias table for one provider
    /// (spec §4.7). Overwrites any table previously registered for the same
    /// provider.
    pub fn register_aliases(&self, provider: &str, table: HashMap<String, String>) {
        self.aliases
            .write()
            .expect("alias table lock poisoned")
            .insert(provider.to_string(), table);
    }

    pub fn register_connection(&self, connection: ProviderConnection) {
        let key = (connection.provider.clone(), connection.organization_id.clone());
        self.connections.insert(key, connection);
    }

    pub fn register_client(&self, organization_id: &str, client: Arc<dyn crate::client::ProviderClient>) {
        self.pool.register(organization_id, client);
    }

    /// Dispatch a single tool call (spec §4.7 steps 1-5).
    #[instrument(skip(self, input))]
    pub async fn execute_tool(
        &self,
        full_name: &str,
        input: Value,
        organization_id: &str,
        user_id: Option<&str>,
        skip_cache: bool,
    ) -> Result<Value> {
        let mut parsed = parse_full_name(full_name)?;
        {
            let aliases = self.aliases.read().expect("alias table lock poisoned");
            parsed.tool = resolve_alias(&parsed.provider, &parsed.tool, &aliases);
        }

        let connection_key = (parsed.provider.clone(), organization_id.to_string());
        let Some(mut connection) = self
            .connections
            .get(&connection_key)
            .map(|entry| entry.clone())
        else {
            return Err(OrchError::ToolAccessDenied {
                full_name: full_name.to_string(),
                organization_id: organization_id.to_string(),
            });
        };
        if !connection.enabled {
            return Err(OrchError::ToolAccessDenied {
                full_name: full_name.to_string(),
                organization_id: organization_id.to_string(),
            });
        }

        let key = cache_key(&parsed.provider, &parsed.tool, &input, organization_id);
        if !skip_cache {
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached);
            }
        }

        let Some(client) = self.pool.acquire(&parsed.provider, organization_id) else {
            return Err(OrchError::ToolNotFound {
                full_name: full_name.to_string(),
            });
        };

        let breaker = self.breakers.get_or_create(&parsed.provider);
        if !breaker.can_execute() {
            return Err(OrchError::CircuitOpen {
                provider: parsed.provider.clone(),
            });
        }

        if connection.is_oauth() {
            client.ensure_fresh_token(&mut connection).await?;
            self.connections.insert(connection_key, connection.clone());
        }

        let ctx = ToolCallContext {
            organization_id: organization_id.to_string(),
            connection_id: connection.id.clone(),
            user_id: user_id.map(str::to_string),
        };

        let started = Instant::now();
        let call = tokio::time::timeout(PER_CALL_TIMEOUT, client.execute_tool(&parsed.tool, input, &ctx)).await;
        let duration = started.elapsed();

        let (success, outcome) = match call {
            Ok(Ok(outcome)) if !outcome.is_error() => {
                breaker.record_success(duration);
                (true, Ok(outcome))
            }
            Ok(Ok(outcome)) => {
                let code = outcome.error_code.clone().unwrap_or_default();
                if is_idempotent_success(&code) {
                    breaker.record_success(duration);
                    (true, Ok(ToolInvocationOutcome::ok(Value::Null)))
                } else {
                    breaker.record_failure(&anyhow::anyhow!(code.clone()));
                    (false, Err(OrchError::Provider { message: code }))
                }
            }
            Ok(Err(err)) => {
                breaker.record_failure(&anyhow::anyhow!(err.to_string()));
                (false, Err(err))
            }
            Err(_elapsed) => {
                breaker.record_failure(&anyhow::anyhow!("tool call timed out"));
                (
                    false,
                    Err(OrchError::Timeout {
                        message: format!("tool {full_name} timed out after {}ms", PER_CALL_TIMEOUT.as_millis()),
                    }),
                )
            }
        };

        self.emit_metric(&parsed.provider, &parsed.tool, success, duration).await;

        match outcome {
            Ok(invocation) => {
                if !skip_cache {
                    self.cache.put(key, invocation.output.clone(), DEFAULT_CACHE_TTL);
                }
                Ok(invocation.output)
            }
            Err(err) => Err(err),
        }
    }

    async fn emit_metric(&self, provider: &str, tool: &str, success: bool, duration: Duration) {
        let Some(bus) = &self.events else {
            return;
        };
        let event = UniversalEvent::new(
            "tool.dispatch",
            json!({
                "provider": provider,
                "tool": tool,
                "success": success,
                "duration_ms": duration.as_millis(),
            }),
            Language::Rust,
        );
        if let Err(err) = bus.publish(event).await {
            warn!(%err, "failed to publish tool dispatch metric event");
        }
    }
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ProviderClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubClient {
        calls: AtomicUsize,
        fail_with: Option<String>,
        last_tool: std::sync::Mutex<Option<String>>,
    }

    impl StubClient {
        fn new(fail_with: Option<String>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_with,
                last_tool: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ProviderClient for StubClient {
        fn provider_name(&self) -> &str {
            "slack"
        }

        fn register_tools(&self) -> Vec<crate::descriptor::ToolDescriptor> {
            Vec::new()
        }

        async fn execute_tool(
            &self,
            tool: &str,
            _input: Value,
            _ctx: &ToolCallContext,
        ) -> Result<ToolInvocationOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_tool.lock().expect("last_tool lock poisoned") = Some(tool.to_string());
            match &self.fail_with {
                Some(code) => Ok(ToolInvocationOutcome::failed(code.clone())),
                None => Ok(ToolInvocationOutcome::ok(json!({"ok": true}))),
            }
        }

        async fn ensure_fresh_token(&self, _connection: &mut ProviderConnection) -> Result<()> {
            Ok(())
        }
    }

    fn connection() -> ProviderConnection {
        ProviderConnection {
            id: "conn1".to_string(),
            organization_id: "org1".to_string(),
            provider: "slack".to_string(),
            enabled: true,
            oauth: None,
        }
    }

    #[tokio::test]
    async fn successful_call_is_cached_and_returned() {
        let dispatcher = ToolDispatcher::new();
        dispatcher.register_connection(connection());
        dispatcher.register_client(
            "org1",
            Arc::new(StubClient::new(None)),
        );

        let result = dispatcher
            .execute_tool("slack:send_message", json!({"text": "hi"}), "org1", None, false)
            .await
            .unwrap();
        assert_eq!(result, json!({"ok": true}));
        assert_eq!(dispatcher.cache.len(), 1);
    }

    #[tokio::test]
    async fn unregistered_connection_is_denied() {
        let dispatcher = ToolDispatcher::new();
        let result = dispatcher
            .execute_tool("slack:send_message", json!({}), "org1", None, false)
            .await;
        assert!(matches!(result, Err(OrchError::ToolAccessDenied { .. })));
    }

    #[tokio::test]
    async fn idempotency_error_is_treated_as_success() {
        let dispatcher = ToolDispatcher::new();
        dispatcher.register_connection(connection());
        dispatcher.register_client(
            "org1",
            Arc::new(StubClient::new(Some("already_reacted".to_string()))),
        );

        let result = dispatcher
            .execute_tool("slack:react", json!({}), "org1", None, true)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn non_idempotent_error_surfaces_as_failure() {
        let dispatcher = ToolDispatcher::new();
        dispatcher.register_connection(connection());
        dispatcher.register_client(
            "org1",
            Arc::new(StubClient::new(Some("rate_limited".to_string()))),
        );

        let result = dispatcher
            .execute_tool("slack:send_message", json!({}), "org1", None, true)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn legacy_snake_case_alias_resolves_to_the_same_canonical_tool() {
        let dispatcher = ToolDispatcher::new();
        dispatcher.register_connection(connection());
        let stub = Arc::new(StubClient::new(None));
        dispatcher.register_client("org1", stub.clone());

        let mut table = HashMap::new();
        table.insert("send_message".to_string(), "sendMessage".to_string());
        dispatcher.register_aliases("slack", table);

        dispatcher
            .execute_tool("slack__send_message", json!({"text": "hi"}), "org1", None, true)
            .await
            .unwrap();
        assert_eq!(
            stub.last_tool.lock().expect("last_tool lock poisoned").as_deref(),
            Some("sendMessage")
        );

        dispatcher
            .execute_tool("slack:sendMessage", json!({"text": "hi"}), "org1", None, true)
            .await
            .unwrap();
        assert_eq!(
            stub.last_tool.lock().expect("last_tool lock poisoned").as_deref(),
            Some("sendMessage")
        );
    }
}
