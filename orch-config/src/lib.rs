//! ABOUTME: Central configuration management for the orchestration core
//! ABOUTME: Layers built-in defaults, an optional TOML file, and `ORCH_*` environment overrides

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub mod validation;

pub use validation::validate_config;

/// Configuration file discovery order, mirroring the teacher's
/// `CONFIG_SEARCH_PATHS` convention for this workspace.
const CONFIG_SEARCH_PATHS: &[&str] = &["orchestrator.toml", ".orchestrator.toml", "config/orchestrator.toml"];

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "ORCH_";

/// Router-specific configuration (spec §4.1, §6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    pub min_confidence: f64,
    pub route_cache_ttl_secs: u64,
    pub session_context_cache_ttl_secs: u64,
    pub session_follow_up_boost: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            route_cache_ttl_secs: 86_400,
            session_context_cache_ttl_secs: 300,
            session_follow_up_boost: 0.1,
        }
    }
}

/// Orchestrator / spawner limits (spec §4.4, §4.5, §6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_parallel_agents: usize,
    pub max_delegation_depth: u8,
    pub hard_spawn_depth: u8,
    pub default_timeout_ms: u64,
    pub child_timeout_ms: u64,
    pub loop_max_iterations: u32,
    pub loop_max_dependency_depth: usize,
    pub min_required_budget_tokens: u64,
    pub max_agents_per_decomposition: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_parallel_agents: 5,
            max_delegation_depth: 3,
            hard_spawn_depth: 5,
            default_timeout_ms: 120_000,
            child_timeout_ms: 300_000,
            loop_max_iterations: 10,
            loop_max_dependency_depth: 5,
            min_required_budget_tokens: 1_000,
            max_agents_per_decomposition: 5,
        }
    }
}

/// Circuit breaker defaults applied to every provider (spec §4.7, §6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub per_call_timeout_ms: u64,
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            per_call_timeout_ms: 30_000,
            reset_timeout_ms: 60_000,
        }
    }
}

/// Budget-aware downgrade thresholds, in cents (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BudgetDowngradeConfig {
    pub ultrabrain_floor_cents: i64,
    pub premium_floor_cents: i64,
    pub exhausted_floor_cents: i64,
}

impl Default for BudgetDowngradeConfig {
    fn default() -> Self {
        Self {
            ultrabrain_floor_cents: 100,
            premium_floor_cents: 20,
            exhausted_floor_cents: 10,
        }
    }
}

/// Root configuration object for the orchestration core.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub router: RouterConfig,
    pub limits: LimitsConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub budget_downgrade: BudgetDowngradeConfig,
}

impl OrchestratorConfig {
    /// Load defaults, then merge an optional TOML file, then environment
    /// overrides, validating the final result.
    pub fn load(explicit_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        let file_path = explicit_path
            .map(Path::to_path_buf)
            .or_else(Self::discover_config_file);

        if let Some(path) = file_path {
            debug!(path = %path.display(), "loading orchestrator configuration file");
            let contents = std::fs::read_to_string(&path)?;
            config = toml::from_str(&contents)?;
        }

        config.apply_env_overrides();
        validate_config(&config)?;
        Ok(config)
    }

    fn discover_config_file() -> Option<std::path::PathBuf> {
        CONFIG_SEARCH_PATHS
            .iter()
            .map(std::path::PathBuf::from)
            .find(|p| p.exists())
    }

    /// Apply `ORCH_*` environment variable overrides on top of whatever was
    /// loaded from defaults/file. Malformed values are ignored rather than
    /// causing a hard failure, matching the spec's "selection must never
    /// throw" philosophy for best-effort ambient configuration.
    fn apply_env_overrides(&mut self) {
        // Enumerated explicitly (rather than macro-generated) so each
        // override is easy to audit.
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}MIN_CONFIDENCE")) {
            if let Ok(parsed) = v.parse() {
                self.router.min_confidence = parsed;
            }
        }
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}MAX_PARALLEL_AGENTS")) {
            if let Ok(parsed) = v.parse() {
                self.limits.max_parallel_agents = parsed;
            }
        }
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}MAX_DELEGATION_DEPTH")) {
            if let Ok(parsed) = v.parse() {
                self.limits.max_delegation_depth = parsed;
            }
        }
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}DEFAULT_TIMEOUT_MS")) {
            if let Ok(parsed) = v.parse() {
                self.limits.default_timeout_ms = parsed;
            }
        }
    }
}
