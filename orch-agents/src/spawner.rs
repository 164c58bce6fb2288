//! Sub-Agent Spawner (spec §4.5): lets an agent spawn a child agent
//! execution under depth, rate, and budget guards, recording a spawn tree
//! rooted at the top-level execution.
//!
//! The rate limiter is `orch-hooks`' token bucket keyed by
//! `(user_id, organization_id)`; spawn records live in an in-memory
//! `DashMap` for this core — external persistence of execution rows is the
//! host application's concern (spec §6).

use crate::coordinator::execute_with_agent;
use dashmap::DashMap;
use orch_core::{AgentExecutionResult, AgentId, ComponentId, ExecutionContext};
use orch_hooks::RateLimiter;
use orch_providers::ModelExecutor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

/// Minimum token budget required to allow a spawn at all.
pub const MIN_REQUIRED_BUDGET_TOKENS: u64 = 1000;
/// Wall-clock budget for a spawned child, independent of the parent's timeout.
pub const CHILD_TIMEOUT_MS: u64 = 300_000;

/// Inputs to a single spawn attempt.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub agent_type: AgentId,
    pub task: String,
    /// Maximum depth allowed for this spawn's subtree; defaults to the
    /// parent context's `max_depth` when unset.
    pub max_depth: Option<u8>,
    pub remaining_budget_tokens: Option<u64>,
}

/// Lifecycle status of one spawn record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnStatus {
    Running,
    Completed,
    Failed,
}

/// One node in the spawn tree, keyed by its own execution id.
#[derive(Debug, Clone)]
pub struct SpawnRecord {
    pub execution_id: ComponentId,
    pub parent_execution_id: Option<ComponentId>,
    pub root_execution_id: ComponentId,
    pub depth: u8,
    pub max_depth: u8,
    pub status: SpawnStatus,
    pub tokens_used: u64,
    pub remaining_budget_after: Option<u64>,
}

/// Outcome of `spawn_sub_agent`. Every failure mode — timeout, rate limit,
/// depth, budget, or the underlying agent erroring — surfaces here rather
/// than as an `Err`.
#[derive(Debug, Clone)]
pub struct SpawnOutcome {
    pub success: bool,
    pub result: Option<AgentExecutionResult>,
    pub tokens_used: u64,
    pub execution_time_ms: u64,
    pub child_execution_id: Option<ComponentId>,
    pub error: Option<String>,
}

impl SpawnOutcome {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            tokens_used: 0,
            execution_time_ms: 0,
            child_execution_id: None,
            error: Some(error.into()),
        }
    }
}

/// Owns the spawn tree and the spawn-rate limiter for one orchestration run
/// (or process, if shared across runs by the host application).
pub struct SubAgentSpawner {
    records: DashMap<ComponentId, SpawnRecord>,
    rate_limiter: Arc<RateLimiter>,
}

impl SubAgentSpawner {
    #[must_use]
    pub fn new(rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            records: DashMap::new(),
            rate_limiter,
        }
    }

    fn rate_limit_key(user_id: &str, organization_id: &str) -> String {
        format!("{organization_id}:{user_id}")
    }

    /// Attempt to spawn and run a child agent under `parent_ctx`.
    #[instrument(skip(parent_ctx, config, executor), fields(agent = %config.agent_type))]
    pub async fn spawn_sub_agent(
        &self,
        parent_ctx: &ExecutionContext,
        config: SpawnConfig,
        executor: &dyn ModelExecutor,
    ) -> SpawnOutcome {
        let max_depth = config.max_depth.unwrap_or(parent_ctx.max_depth);
        if parent_ctx.depth + 1 > max_depth || parent_ctx.depth + 1 > orch_core::execution_context::HARD_SPAWN_DEPTH
        {
            warn!("spawn rejected: depth guard");
            return SpawnOutcome::rejected(format!(
                "spawn would exceed depth: {} + 1 > {}",
                parent_ctx.depth, max_depth
            ));
        }

        let key = Self::rate_limit_key(&parent_ctx.user_id, &parent_ctx.organization_id);
        let (allowed, retry_after_tokens) = self.rate_limiter.try_acquire(&key, 1.0);
        if !allowed {
            warn!("spawn rejected: rate limited");
            return SpawnOutcome::rejected(format!(
                "spawn rate limited for {key}, retry after ~{retry_after_tokens:.1} tokens refill"
            ));
        }

        let remaining_budget = config.remaining_budget_tokens.unwrap_or(u64::MAX);
        if remaining_budget < MIN_REQUIRED_BUDGET_TOKENS {
            warn!("spawn rejected: budget guard");
            return SpawnOutcome::rejected(format!(
                "remaining budget {remaining_budget} below minimum {MIN_REQUIRED_BUDGET_TOKENS}"
            ));
        }

        let child_ctx = ExecutionContext {
            max_depth,
            ..parent_ctx.child()
        };
        let child_execution_id = child_ctx
            .parent_execution_id
            .expect("child() always sets parent_execution_id");

        self.records.insert(
            child_execution_id,
            SpawnRecord {
                execution_id: child_execution_id,
                parent_execution_id: Some(parent_ctx.root_execution_id),
                root_execution_id: child_ctx.root_execution_id,
                depth: child_ctx.depth,
                max_depth: child_ctx.max_depth,
                status: SpawnStatus::Running,
                tokens_used: 0,
                remaining_budget_after: None,
            },
        );

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(CHILD_TIMEOUT_MS);

        let outcome = match tokio::time::timeout(
            timeout,
            execute_with_agent(config.agent_type, &config.task, &child_ctx, executor),
        )
        .await
        {
            Ok(result) => {
                let execution_time_ms = start.elapsed().as_millis() as u64;
                let tokens_used = result
                    .output
                    .as_ref()
                    .map_or(0, |s| (s.len() as u64) / 4);
                let remaining_after = remaining_budget.saturating_sub(tokens_used);

                if let Some(mut record) = self.records.get_mut(&child_execution_id) {
                    record.status = if result.success {
                        SpawnStatus::Completed
                    } else {
                        SpawnStatus::Failed
                    };
                    record.tokens_used = tokens_used;
                    record.remaining_budget_after = Some(remaining_after);
                }

                SpawnOutcome {
                    success: result.success,
                    error: result.error.clone(),
                    result: Some(result),
                    tokens_used,
                    execution_time_ms,
                    child_execution_id: Some(child_execution_id),
                }
            }
            Err(_) => {
                if let Some(mut record) = self.records.get_mut(&child_execution_id) {
                    record.status = SpawnStatus::Failed;
                }
                SpawnOutcome {
                    success: false,
                    result: None,
                    tokens_used: 0,
                    execution_time_ms: start.elapsed().as_millis() as u64,
                    child_execution_id: Some(child_execution_id),
                    error: Some(format!("child execution timed out after {CHILD_TIMEOUT_MS}ms")),
                }
            }
        };

        outcome
    }

    /// Fetch a spawn record, e.g. to verify the tree invariant in tests.
    #[must_use]
    pub fn get_record(&self, execution_id: ComponentId) -> Option<SpawnRecord> {
        self.records.get(&execution_id).map(|r| r.clone())
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
