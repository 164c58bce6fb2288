//! Top-level request/response shapes for `orchestrate` (spec §4.4, §6).

use orch_agents::ExitSummary;
use orch_core::{AgentId, Category, SkillSelection};
use orch_router::{Complexity, DowngradeThresholds};
use orch_providers::ModelExecutor;

/// Tunables for a single `orchestrate` call. Mirrors `RouteOptions` for the
/// routing-specific fields so callers don't need to know the router crate's
/// types to drive an end-to-end request.
pub struct OrchestrateOptions<'a> {
    pub max_agents: usize,
    pub timeout_ms: u64,
    pub multi_agent_enabled: bool,
    pub min_confidence: f64,
    pub complexity_hint: Option<Complexity>,
    pub remaining_budget_cents: i64,
    pub remaining_budget_tokens: Option<u64>,
    pub downgrade_thresholds: DowngradeThresholds,
    /// Present only when the caller has an LLM key configured for the
    /// router's classification fallback and the coordinator/model calls.
    pub llm_executor: Option<&'a dyn ModelExecutor>,
    pub time_budget_available: bool,
}

impl Default for OrchestrateOptions<'_> {
    fn default() -> Self {
        Self {
            max_agents: 5,
            timeout_ms: 120_000,
            multi_agent_enabled: true,
            min_confidence: 0.7,
            complexity_hint: None,
            remaining_budget_cents: i64::MAX,
            remaining_budget_tokens: None,
            downgrade_thresholds: DowngradeThresholds::default(),
            llm_executor: None,
            time_budget_available: true,
        }
    }
}

/// Which coordinator path a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Single,
    Sequential,
    Parallel,
}

/// Terminal status of an `orchestrate` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationStatus {
    Completed,
    Failed,
}

/// Aggregated result of `orchestrate`, matching spec §6's external entry
/// point shape: an output string plus a metadata block.
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    pub status: OrchestrationStatus,
    pub output: String,
    pub category: Category,
    pub skills: SkillSelection,
    pub duration_ms: u64,
    pub model: String,
    pub agents_used: Vec<AgentId>,
    pub execution_mode: ExecutionMode,
    pub loop_detection: Option<ExitSummary>,
    /// Machine-readable reason for a `Failed` status (e.g. `"budget_exhausted"`,
    /// `"timeout"`, `"loop_detected"`), mirroring the `metadata.reason` a host
    /// would persist on the execution record (spec §6, §8 scenario 3).
    pub failure_reason: Option<String>,
}
