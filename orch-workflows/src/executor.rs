//! Workflow DAG executor (spec §4.6): walks a `WorkflowDefinition` from
//! `START`, dispatching each node by variant and re-evaluating outgoing
//! edge conditions after every node. A `human_approval` node pauses the
//! run and returns immediately; `resume_after_approval` continues it once
//! an external trigger supplies the outcome.

use crate::approval::ApprovalService;
use crate::condition;
use crate::types::{
    NodeId, NodeResult, NodeStatus, WorkflowContext, WorkflowDefinition, WorkflowExecutionResult,
    WorkflowNode, WorkflowStatus, END,
};
use chrono::Utc;
use orch_agents::{aggregate, coordinate_parallel, execute_with_agent};
use orch_core::{ExecutionContext, OrchError, Request, Result, SubTask};
use orch_providers::ModelExecutor;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::{error, instrument, warn};

/// Drive the graph from whatever nodes are already queued, mutating
/// `context` as it goes. Returns `Ok(Some(approval_id))` if execution
/// paused at a `human_approval` node, `Ok(None)` if it ran to a terminal
/// state (`context.status` is `Completed` or `Failed` on return).
async fn drive(
    workflow: &WorkflowDefinition,
    context: &mut WorkflowContext,
    mut queue: VecDeque<NodeId>,
    mut visited: HashSet<NodeId>,
    exec_ctx: &ExecutionContext,
    executor: &dyn ModelExecutor,
    approvals: &dyn ApprovalService,
) -> Result<Option<String>> {
    let mut guard = 0usize;
    let guard_limit = workflow.nodes.len() * 4 + 8;

    while let Some(node_id) = queue.pop_front() {
        guard += 1;
        if guard > guard_limit {
            error!(workflow = %workflow.name, "workflow executor: runaway graph traversal, aborting");
            context.status = WorkflowStatus::Failed;
            return Ok(None);
        }
        if !visited.insert(node_id.clone()) {
            continue;
        }

        let Some(node) = workflow.nodes.get(&node_id) else {
            warn!(workflow = %workflow.name, node = %node_id, "workflow references unknown node id");
            context.status = WorkflowStatus::Failed;
            return Ok(None);
        };

        let started_at = Utc::now();
        context.current_node = node_id.clone();

        match node {
            WorkflowNode::Agent {
                agent_id,
                timeout_ms,
            } => {
                let timeout =
                    Duration::from_millis(timeout_ms.unwrap_or(workflow.default_timeout_ms));
                let prompt = context
                    .variables
                    .get("user_request")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                match tokio::time::timeout(
                    timeout,
                    execute_with_agent(*agent_id, &prompt, exec_ctx, executor),
                )
                .await
                {
                    Ok(result) if result.success => {
                        context.node_results.insert(
                            node_id.clone(),
                            NodeResult {
                                status: NodeStatus::Completed,
                                output: result.output,
                                error: None,
                                started_at,
                                completed_at: Utc::now(),
                            },
                        );
                    }
                    Ok(result) => {
                        context.node_results.insert(
                            node_id.clone(),
                            NodeResult {
                                status: NodeStatus::Failed,
                                output: None,
                                error: result.error,
                                started_at,
                                completed_at: Utc::now(),
                            },
                        );
                        context.status = WorkflowStatus::Failed;
                        return Ok(None);
                    }
                    Err(_elapsed) => {
                        context.node_results.insert(
                            node_id.clone(),
                            NodeResult {
                                status: NodeStatus::Failed,
                                output: None,
                                error: Some(format!(
                                    "node {node_id} timed out after {}ms",
                                    timeout.as_millis()
                                )),
                                started_at,
                                completed_at: Utc::now(),
                            },
                        );
                        context.status = WorkflowStatus::Failed;
                        return Ok(None);
                    }
                }
            }
            WorkflowNode::Parallel { parallel_agents } => {
                let prompt = context
                    .variables
                    .get("user_request")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let subtasks: Vec<SubTask> = parallel_agents
                    .iter()
                    .map(|agent| SubTask::new(prompt.clone(), *agent))
                    .collect();
                let results = coordinate_parallel(
                    &subtasks,
                    exec_ctx,
                    executor,
                    parallel_agents.len().max(1),
                )
                .await;
                let any_failed = results.iter().any(|r| !r.success);
                let output = aggregate(&results);
                context.node_results.insert(
                    node_id.clone(),
                    NodeResult {
                        status: if any_failed {
                            NodeStatus::Failed
                        } else {
                            NodeStatus::Completed
                        },
                        output: Some(output),
                        error: any_failed.then(|| "one or more parallel agents failed".to_string()),
                        started_at,
                        completed_at: Utc::now(),
                    },
                );
                if any_failed {
                    context.status = WorkflowStatus::Failed;
                    return Ok(None);
                }
            }
            WorkflowNode::Condition { expr } => {
                let value = condition::evaluate(expr, &context.variables);
                context
                    .variables
                    .insert(format!("condition:{node_id}"), Value::Bool(value));
                context.node_results.insert(
                    node_id.clone(),
                    NodeResult {
                        status: NodeStatus::Completed,
                        output: Some(value.to_string()),
                        error: None,
                        started_at,
                        completed_at: Utc::now(),
                    },
                );
            }
            WorkflowNode::HumanApproval { approval_type } => {
                let Some(approver_id) = context
                    .variables
                    .get("approverId")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                else {
                    context.node_results.insert(
                        node_id.clone(),
                        NodeResult {
                            status: NodeStatus::Failed,
                            output: None,
                            error: Some(
                                "human_approval node requires variables.approverId".to_string(),
                            ),
                            started_at,
                            completed_at: Utc::now(),
                        },
                    );
                    context.status = WorkflowStatus::Failed;
                    return Ok(None);
                };

                let approval_id = approvals
                    .create_approval_request(
                        &context.organization_id,
                        &context.user_id,
                        &approver_id,
                        approval_type,
                        &format!("workflow {} node {node_id}", workflow.name),
                        serde_json::json!({ "variables": context.variables }),
                    )
                    .await?;

                context.node_results.insert(
                    node_id.clone(),
                    NodeResult {
                        status: NodeStatus::Completed,
                        output: Some(approval_id.clone()),
                        error: None,
                        started_at,
                        completed_at: Utc::now(),
                    },
                );
                context.status = WorkflowStatus::WaitingApproval;
                return Ok(Some(approval_id));
            }
        }

        for next in workflow.next_nodes(&node_id, &context.variables) {
            if next != END && !visited.contains(&next) {
                queue.push_back(next);
            }
        }
    }

    if context.status != WorkflowStatus::Failed {
        context.status = WorkflowStatus::Completed;
    }
    Ok(None)
}

/// Execute a workflow from `START` (spec §6 `execute_workflow`).
#[instrument(skip(workflow, request, initial_variables, exec_ctx, executor, approvals), fields(workflow = %workflow.name))]
pub async fn execute_workflow(
    workflow: &WorkflowDefinition,
    request: &Request,
    initial_variables: std::collections::HashMap<String, Value>,
    exec_ctx: &ExecutionContext,
    executor: &dyn ModelExecutor,
    approvals: &dyn ApprovalService,
) -> Result<WorkflowExecutionResult> {
    let run_started = Instant::now();

    let mut variables = initial_variables;
    variables
        .entry("user_request".to_string())
        .or_insert_with(|| Value::String(request.user_request.clone()));

    let mut context = WorkflowContext::new(
        request.organization_id.clone(),
        request.user_id.clone(),
        request.session_id.clone(),
        variables,
        Utc::now(),
    );
    context.status = WorkflowStatus::Running;

    let queue: VecDeque<NodeId> = workflow
        .next_nodes(crate::types::START, &context.variables)
        .into_iter()
        .filter(|id| id != END)
        .collect();

    let approval_id = drive(
        workflow,
        &mut context,
        queue,
        HashSet::new(),
        exec_ctx,
        executor,
        approvals,
    )
    .await?;

    context.completed_at = Some(Utc::now());

    Ok(WorkflowExecutionResult {
        status: context.status,
        duration_ms: u64::try_from(run_started.elapsed().as_millis()).unwrap_or(u64::MAX),
        workflow_name: workflow.name.clone(),
        approval_id,
        context,
    })
}

/// Resume a workflow paused at a `human_approval` node. `approved=false`
/// transitions the workflow straight to `Failed`, matching "From
/// `waiting_approval` an external event transitions to `running` or
/// `failed`".
#[instrument(skip(workflow, context, exec_ctx, executor, approvals), fields(workflow = %workflow.name, node = %approval_node_id))]
pub async fn resume_after_approval(
    workflow: &WorkflowDefinition,
    mut context: WorkflowContext,
    approval_node_id: &str,
    approved: bool,
    exec_ctx: &ExecutionContext,
    executor: &dyn ModelExecutor,
    approvals: &dyn ApprovalService,
) -> Result<WorkflowExecutionResult> {
    if context.status != WorkflowStatus::WaitingApproval {
        return Err(OrchError::Validation {
            message: format!(
                "cannot resume workflow {} node {approval_node_id}: status is not waiting_approval",
                workflow.name
            ),
        });
    }

    let run_started = Instant::now();

    if !approved {
        context.status = WorkflowStatus::Failed;
        context.completed_at = Some(Utc::now());
        return Ok(WorkflowExecutionResult {
            status: context.status,
            duration_ms: u64::try_from(run_started.elapsed().as_millis()).unwrap_or(u64::MAX),
            workflow_name: workflow.name.clone(),
            approval_id: None,
            context,
        });
    }

    context.status = WorkflowStatus::Running;
    context
        .variables
        .insert(format!("approval:{approval_node_id}"), Value::Bool(true));

    let queue: VecDeque<NodeId> = workflow
        .next_nodes(approval_node_id, &context.variables)
        .into_iter()
        .filter(|id| id != END)
        .collect();

    let mut visited = HashSet::new();
    visited.insert(approval_node_id.to_string());

    let approval_id = drive(
        workflow,
        &mut context,
        queue,
        visited,
        exec_ctx,
        executor,
        approvals,
    )
    .await?;

    context.completed_at = Some(Utc::now());

    Ok(WorkflowExecutionResult {
        status: context.status,
        duration_ms: u64::try_from(run_started.elapsed().as_millis()).unwrap_or(u64::MAX),
        workflow_name: workflow.name.clone(),
        approval_id,
        context,
    })
}
