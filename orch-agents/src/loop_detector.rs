//! Loop Detector (spec §4.4a): guards the orchestrator's execution loop
//! against runaway iteration, circular delegation, and task repetition.

use orch_core::AgentId;
use std::collections::HashMap;
use tracing::warn;

/// Hard ceiling on orchestrator iterations before the run is aborted.
pub const MAX_ITERATIONS: u32 = 10;
/// How far back in the execution chain to look for a repeated agent.
pub const MAX_DEPENDENCY_DEPTH: usize = 5;

/// Task description hash, a simple FNV-1a-style rolling polynomial hash over
/// the normalized (lower-cased, whitespace-collapsed) description —
/// deterministic and dependency-free, not a cryptographic hash.
pub type TaskHash = u64;

#[must_use]
pub fn hash_task(description: &str) -> TaskHash {
    let normalized = description
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in normalized.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Why a loop was flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopKind {
    MaxIterations,
    CircularDependency,
    TaskRepetition,
}

/// One detected loop, recorded for the exit summary.
#[derive(Debug, Clone)]
pub struct LoopInfo {
    pub kind: LoopKind,
    pub agent: AgentId,
    pub detail: String,
    pub cycle: Vec<AgentId>,
}

/// Outcome of a single `check_before` call.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub loop_detected: bool,
    pub info: Option<LoopInfo>,
}

impl CheckResult {
    fn clear() -> Self {
        Self {
            loop_detected: false,
            info: None,
        }
    }

    fn detected(info: LoopInfo) -> Self {
        Self {
            loop_detected: true,
            info: Some(info),
        }
    }
}

/// Summary produced once the orchestrator loop ends, successfully or not.
#[derive(Debug, Clone)]
pub struct ExitSummary {
    pub iteration_count: u32,
    pub detected_loops: Vec<LoopInfo>,
    pub completed_tasks_preview: Vec<String>,
    pub execution_chain: Vec<AgentId>,
}

/// Mutable loop-detection state threaded through one orchestrator run.
pub struct LoopDetector {
    agent_task_history: HashMap<AgentId, Vec<TaskHash>>,
    execution_chain: Vec<AgentId>,
    completed_tasks: Vec<String>,
    iteration_count: u32,
    detected_loops: Vec<LoopInfo>,
}

impl LoopDetector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent_task_history: HashMap::new(),
            execution_chain: Vec::new(),
            completed_tasks: Vec::new(),
            iteration_count: 0,
            detected_loops: Vec::new(),
        }
    }

    /// Call before dispatching `agent` to run `task`. Returns whether a loop
    /// was detected; on detection the run should terminate instead of
    /// executing the task.
    pub fn check_before(&mut self, agent: AgentId, task: &str) -> CheckResult {
        self.iteration_count += 1;

        if self.iteration_count > MAX_ITERATIONS {
            let info = LoopInfo {
                kind: LoopKind::MaxIterations,
                agent,
                detail: format!("exceeded {MAX_ITERATIONS} iterations"),
                cycle: Vec::new(),
            };
            self.detected_loops.push(info.clone());
            warn!(agent = %agent, "loop detector: max iterations exceeded");
            return CheckResult::detected(info);
        }

        let recent_len = self.execution_chain.len().min(MAX_DEPENDENCY_DEPTH);
        let recent = &self.execution_chain[self.execution_chain.len() - recent_len..];
        if let Some(pos) = recent.iter().position(|a| *a == agent) {
            let cycle = recent[pos..].to_vec();
            let info = LoopInfo {
                kind: LoopKind::CircularDependency,
                agent,
                detail: format!("{agent} reappeared within the last {MAX_DEPENDENCY_DEPTH} steps"),
                cycle,
            };
            self.detected_loops.push(info.clone());
            warn!(agent = %agent, "loop detector: circular dependency");
            return CheckResult::detected(info);
        }

        let task_hash = hash_task(task);
        let history = self.agent_task_history.entry(agent).or_default();
        if history.contains(&task_hash) {
            let info = LoopInfo {
                kind: LoopKind::TaskRepetition,
                agent,
                detail: "task repeated for this agent".to_string(),
                cycle: Vec::new(),
            };
            self.detected_loops.push(info.clone());
            warn!(agent = %agent, "loop detector: task repetition");
            return CheckResult::detected(info);
        }

        history.push(task_hash);
        self.execution_chain.push(agent);
        CheckResult::clear()
    }

    /// Record a task as completed for the exit summary's preview list.
    pub fn record_completed(&mut self, task_preview: impl Into<String>) {
        self.completed_tasks.push(task_preview.into());
    }

    #[must_use]
    pub fn exit_summary(&self) -> ExitSummary {
        ExitSummary {
            iteration_count: self.iteration_count,
            detected_loops: self.detected_loops.clone(),
            completed_tasks_preview: self.completed_tasks.clone(),
            execution_chain: self.execution_chain.clone(),
        }
    }
}

impl Default for LoopDetector {
    fn default() -> Self {
        Self::new()
    }
}
