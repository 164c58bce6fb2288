//! ABOUTME: Model Executor contract defining capabilities and invocation shape
//! ABOUTME: Enables provider-agnostic model calls with tool-use interleaving (spec §4.9)

use async_trait::async_trait;
use orch_core::{Category, OrchError, Skill};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Capabilities a model executor might support.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProviderCapabilities {
    pub supports_streaming: bool,
    pub supports_tool_use: bool,
    pub max_context_tokens: Option<usize>,
    pub max_output_tokens: Option<usize>,
    pub available_models: Vec<String>,
    pub custom_features: HashMap<String, Value>,
}

/// Configuration for a provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (e.g. "anthropic", "openai", "google", "openrouter")
    pub name: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub custom_config: HashMap<String, Value>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            endpoint: None,
            api_key: None,
            timeout_secs: Some(30),
            max_retries: Some(3),
            custom_config: HashMap::new(),
        }
    }

    /// Load configuration from `ORCH_<NAME>_*` environment variables.
    pub fn from_env(name: &str) -> Result<Self, OrchError> {
        let env_prefix = format!("ORCH_{}_", name.to_uppercase());

        let api_key = std::env::var(format!("{env_prefix}API_KEY")).ok();
        let endpoint = std::env::var(format!("{env_prefix}ENDPOINT")).ok();
        let model =
            std::env::var(format!("{env_prefix}MODEL")).unwrap_or_else(|_| "default".to_string());

        Ok(Self {
            name: name.to_string(),
            endpoint,
            api_key,
            model,
            timeout_secs: std::env::var(format!("{env_prefix}TIMEOUT"))
                .ok()
                .and_then(|s| s.parse().ok()),
            max_retries: std::env::var(format!("{env_prefix}MAX_RETRIES"))
                .ok()
                .and_then(|s| s.parse().ok()),
            custom_config: HashMap::new(),
        })
    }
}

/// A single model-invoked tool call, emitted mid-completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub full_name: String,
    pub arguments: Value,
}

/// The result fed back to the model for a previously emitted tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub content: Value,
    pub is_error: bool,
}

/// Execution status, matching spec §4.9: failure is represented in-band,
/// never as a raised error, so ordinary model failures don't unwind the
/// coordinator's call stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Call metadata returned alongside every completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallMetadata {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
    pub cost_cents: f64,
}

/// Request passed to a model executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub category: Category,
    pub skills: Vec<Skill>,
    pub prompt: String,
    pub session_id: String,
    pub organization_id: String,
    pub user_id: String,
    /// Tool results fed back from a prior round of tool-use interleaving.
    pub tool_results: Vec<ToolCallResult>,
}

/// Response from a model executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    pub status: ExecutionStatus,
    pub output: String,
    /// Tool-use blocks the model wants resolved before it continues.
    pub tool_calls: Vec<ToolCall>,
    pub metadata: CallMetadata,
    pub error: Option<String>,
}

impl ModelResponse {
    pub fn ok(output: impl Into<String>, metadata: CallMetadata) -> Self {
        Self {
            status: ExecutionStatus::Success,
            output: output.into(),
            tool_calls: Vec::new(),
            metadata,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, metadata: CallMetadata) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            output: String::new(),
            tool_calls: Vec::new(),
            metadata,
            error: Some(error.into()),
        }
    }
}

/// Contract for a model executor (spec §4.9). This core ships the trait
/// only — no concrete HTTP client for any provider — since the executor
/// is an external collaborator; `orch-testing` supplies a deterministic
/// mock implementation for router/coordinator tests.
#[async_trait]
pub trait ModelExecutor: Send + Sync {
    fn capabilities(&self) -> &ProviderCapabilities;

    async fn execute(&self, request: &ModelRequest) -> Result<ModelResponse, OrchError>;

    async fn validate(&self) -> Result<(), OrchError>;

    fn name(&self) -> &str;

    fn model(&self) -> &str;
}

/// Factory function type for creating model executor instances.
pub type ProviderFactory =
    Box<dyn Fn(ProviderConfig) -> Result<Box<dyn ModelExecutor>, OrchError> + Send + Sync>;

type ProviderInstanceMap = HashMap<String, Arc<Box<dyn ModelExecutor>>>;

/// Registry of provider factories, independent of any live instance.
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(ProviderConfig) -> Result<Box<dyn ModelExecutor>, OrchError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn create(&self, config: ProviderConfig) -> Result<Box<dyn ModelExecutor>, OrchError> {
        let factory = self
            .factories
            .get(&config.name)
            .ok_or_else(|| OrchError::Configuration {
                message: format!("unknown provider: {}", config.name),
            })?;

        factory(config)
    }

    pub fn available_providers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Default provider priority order (spec §4.9): anthropic > openai >
/// google > openrouter. Used when a request doesn't pin a provider.
pub const DEFAULT_PROVIDER_PRIORITY: &[&str] = &["anthropic", "openai", "google", "openrouter"];

/// Manages live provider instances and picks one by priority list.
pub struct ProviderManager {
    registry: Arc<RwLock<ProviderRegistry>>,
    instances: Arc<RwLock<ProviderInstanceMap>>,
    priority: Arc<RwLock<Vec<String>>>,
}

impl ProviderManager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(ProviderRegistry::new())),
            instances: Arc::new(RwLock::new(HashMap::new())),
            priority: Arc::new(RwLock::new(
                DEFAULT_PROVIDER_PRIORITY.iter().map(|s| s.to_string()).collect(),
            )),
        }
    }

    pub async fn register_provider<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(ProviderConfig) -> Result<Box<dyn ModelExecutor>, OrchError> + Send + Sync + 'static,
    {
        let mut registry = self.registry.write().await;
        registry.register(name, factory);
    }

    pub async fn init_provider(&self, config: ProviderConfig) -> Result<(), OrchError> {
        let instance_name = format!("{}:{}", config.name, config.model);

        let registry = self.registry.read().await;
        let provider = registry.create(config)?;
        provider.validate().await?;

        let mut instances = self.instances.write().await;
        instances.insert(instance_name, Arc::new(provider));

        Ok(())
    }

    /// Set an explicit provider priority order, overriding the default.
    pub async fn set_priority(&self, priority: Vec<String>) {
        *self.priority.write().await = priority;
    }

    /// Select the first healthy provider from the priority list whose
    /// circuit isn't open. Circuit state is owned by the caller (see
    /// `orch-hooks::CircuitBreaker`) — this only consults `is_open`.
    pub async fn select_provider(
        &self,
        is_open: impl Fn(&str) -> bool,
    ) -> Result<Arc<Box<dyn ModelExecutor>>, OrchError> {
        let instances = self.instances.read().await;
        let priority = self.priority.read().await;

        for provider_name in priority.iter() {
            if is_open(provider_name) {
                continue;
            }
            if let Some((_, instance)) = instances
                .iter()
                .find(|(key, _)| key.starts_with(&format!("{provider_name}:")))
            {
                return Ok(instance.clone());
            }
        }

        Err(OrchError::Provider {
            message: "no available provider: all circuits open or none configured".to_string(),
        })
    }

    pub async fn get_provider(&self, name: &str) -> Result<Arc<Box<dyn ModelExecutor>>, OrchError> {
        let instances = self.instances.read().await;
        instances
            .get(name)
            .cloned()
            .ok_or_else(|| OrchError::Provider {
                message: format!("provider not found: {name}"),
            })
    }

    pub async fn list_providers(&self) -> Vec<String> {
        self.instances.read().await.keys().cloned().collect()
    }
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_capabilities_default() {
        let caps = ProviderCapabilities::default();
        assert!(!caps.supports_streaming);
        assert!(!caps.supports_tool_use);
        assert!(caps.available_models.is_empty());
    }

    #[test]
    fn test_provider_config_creation() {
        let config = ProviderConfig::new("anthropic", "claude-opus-4");
        assert_eq!(config.name, "anthropic");
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn test_provider_registry() {
        let mut registry = ProviderRegistry::new();
        registry.register("mock", |_config| {
            Err(OrchError::Provider {
                message: "mock provider".to_string(),
            })
        });
        assert_eq!(registry.available_providers(), vec!["mock"]);
    }

    #[tokio::test]
    async fn test_provider_manager_initialization() {
        let manager = ProviderManager::new();
        manager
            .register_provider("mock", |_config| {
                Err(OrchError::Provider {
                    message: "mock provider".to_string(),
                })
            })
            .await;
        assert_eq!(manager.list_providers().await.len(), 0);
    }

    #[test]
    fn default_priority_matches_spec() {
        assert_eq!(
            DEFAULT_PROVIDER_PRIORITY,
            &["anthropic", "openai", "google", "openrouter"]
        );
    }
}
