//! Agent Coordinator (spec §4.3): drives single-agent execution and fans
//! subtasks out sequentially or in parallel, generalizing the shape of
//! `llmspell-agents::composition::delegation`'s `DelegationRequest`/
//! `DelegationResult` pair to this core's `SubTask`/`AgentExecutionResult`.

use crate::registry::get_agent;
use orch_core::{AgentExecutionResult, AgentId, ExecutionContext, OrchError, SubTask, SubTaskId};
use orch_providers::{ModelExecutor, ModelRequest};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{instrument, warn};

/// Default cap on concurrently-running agents, per spec §6. Callers wired
/// to `orch-config` should pass `RouterConfig`'s configured value instead.
pub const DEFAULT_MAX_PARALLEL_AGENTS: usize = 5;

fn compose_prompt(system_prompt: &str, prompt: &str) -> String {
    format!(
        "{system_prompt}\n---\nUSER REQUEST:\n{prompt}\n---\nGUIDELINES: respond directly and \
         completely; do not ask clarifying questions unless the request is ambiguous."
    )
}

/// Execute one agent against a prompt. Never returns `Err` for ordinary
/// execution failure — those become `AgentExecutionResult::failed`.
#[instrument(skip(prompt, ctx, executor), fields(agent = %agent_id))]
pub async fn execute_with_agent(
    agent_id: AgentId,
    prompt: &str,
    ctx: &ExecutionContext,
    executor: &dyn ModelExecutor,
) -> AgentExecutionResult {
    if ctx.depth >= ctx.max_depth {
        return AgentExecutionResult::failed(
            agent_id,
            format!("depth {} exceeds max_depth {}", ctx.depth, ctx.max_depth),
        );
    }

    let Some(agent) = get_agent(agent_id) else {
        return AgentExecutionResult::failed(agent_id, "unknown agent in catalog");
    };

    let composite_prompt = compose_prompt(&agent.system_prompt, prompt);
    let start = std::time::Instant::now();

    let request = ModelRequest {
        category: agent.category,
        skills: agent.skills.clone(),
        prompt: composite_prompt,
        session_id: ctx.session_id.clone(),
        organization_id: ctx.organization_id.clone(),
        user_id: ctx.user_id.clone(),
        tool_results: Vec::new(),
    };

    match executor.execute(&request).await {
        Ok(response) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            match response.error {
                None => AgentExecutionResult::ok(agent_id, response.output, duration_ms),
                Some(error) => {
                    warn!(agent = %agent_id, %error, "model executor reported in-band failure");
                    AgentExecutionResult::failed(agent_id, error)
                }
            }
        }
        Err(err) => {
            warn!(agent = %agent_id, error = %err, "model executor call errored");
            AgentExecutionResult::failed(agent_id, err.to_string())
        }
    }
}

/// Kahn's-algorithm topological order over a subtask set's dependency edges.
fn topological_order(subtasks: &[SubTask]) -> Result<Vec<SubTaskId>, OrchError> {
    let mut indegree: HashMap<SubTaskId, usize> =
        subtasks.iter().map(|t| (t.id, t.dependencies.len())).collect();
    let mut dependents: HashMap<SubTaskId, Vec<SubTaskId>> = HashMap::new();
    for task in subtasks {
        for dep in &task.dependencies {
            dependents.entry(*dep).or_default().push(task.id);
        }
    }

    let mut ready: Vec<SubTaskId> = indegree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| *id)
        .collect();
    ready.sort_by_key(SubTaskId::uuid);

    let mut order = Vec::with_capacity(subtasks.len());
    while let Some(id) = ready.pop() {
        order.push(id);
        if let Some(children) = dependents.get(&id) {
            for child in children {
                if let Some(deg) = indegree.get_mut(child) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(*child);
                    }
                }
            }
        }
        ready.sort_by_key(SubTaskId::uuid);
    }

    if order.len() != subtasks.len() {
        return Err(OrchError::Decomposition {
            message: "subtask dependency graph contains a cycle".to_string(),
        });
    }

    Ok(order)
}

/// Run subtasks one at a time in dependency order, threading completed
/// dependency output into each prompt as `CONTEXT FROM PREVIOUS AGENTS`.
#[instrument(skip(subtasks, ctx, executor))]
pub async fn coordinate_sequential(
    subtasks: &[SubTask],
    ctx: &ExecutionContext,
    executor: &dyn ModelExecutor,
) -> Result<Vec<AgentExecutionResult>, OrchError> {
    let order = topological_order(subtasks)?;
    let by_id: HashMap<SubTaskId, &SubTask> = subtasks.iter().map(|t| (t.id, t)).collect();

    let mut results: HashMap<SubTaskId, AgentExecutionResult> = HashMap::new();
    let mut ordered_results = Vec::with_capacity(subtasks.len());
    let mut failed: HashSet<SubTaskId> = HashSet::new();

    for task_id in order {
        let task = by_id[&task_id];

        let deps_failed = task.dependencies.iter().any(|d| failed.contains(d));
        if deps_failed {
            let result = AgentExecutionResult::failed(task.assigned_agent, "Dependencies not met");
            failed.insert(task_id);
            ordered_results.push(result.clone());
            results.insert(task_id, result);
            continue;
        }

        let mut prompt = task.description.clone();
        if !task.dependencies.is_empty() {
            let mut context = String::from("\n\nCONTEXT FROM PREVIOUS AGENTS:\n");
            for dep in &task.dependencies {
                if let Some(dep_result) = results.get(dep) {
                    if let Some(output) = &dep_result.output {
                        context.push_str(&format!("[{}]: {output}\n", dep_result.agent));
                    }
                }
            }
            prompt.push_str(&context);
        }

        let result = execute_with_agent(task.assigned_agent, &prompt, ctx, executor).await;
        if !result.success {
            failed.insert(task_id);
        }
        ordered_results.push(result.clone());
        results.insert(task_id, result);
    }

    Ok(ordered_results)
}

/// Run subtasks concurrently, bounded by `max_parallel`. All tasks run to
/// completion regardless of earlier failures (no short-circuit).
#[instrument(skip(tasks, ctx, executor))]
pub async fn coordinate_parallel(
    tasks: &[SubTask],
    ctx: &ExecutionContext,
    executor: &dyn ModelExecutor,
    max_parallel: usize,
) -> Vec<AgentExecutionResult> {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));

    let futures = tasks.iter().map(|task| {
        let semaphore = semaphore.clone();
        let agent_id = task.assigned_agent;
        let prompt = task.description.clone();
        async move {
            let _permit = semaphore
                .acquire()
                .await
                .expect("semaphore closed unexpectedly");
            execute_with_agent(agent_id, &prompt, ctx, executor).await
        }
    });

    futures::future::join_all(futures).await
}

/// Concatenate successful outputs in insertion order, each prefixed by the
/// producing agent's label, with a trailing section listing failures.
#[must_use]
pub fn aggregate(results: &[AgentExecutionResult]) -> String {
    let mut successes = String::new();
    let mut failures = Vec::new();

    for result in results {
        if result.success {
            if let Some(output) = &result.output {
                if !successes.is_empty() {
                    successes.push_str("\n\n");
                }
                successes.push_str(&format!("[{}]: {output}", result.agent));
            }
        } else if let Some(error) = &result.error {
            failures.push(format!("- {}: {error}", result.agent));
        }
    }

    if failures.is_empty() {
        successes
    } else {
        format!(
            "{successes}\n\n--- FAILED AGENTS ---\n{}",
            failures.join("\n")
        )
    }
}
