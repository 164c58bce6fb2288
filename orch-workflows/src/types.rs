//! Declarative workflow types (spec §4.6): the `WorkflowDefinition` an
//! operator supplies, and the `WorkflowContext` the executor mutates as it
//! walks the graph.

use chrono::{DateTime, Utc};
use orch_core::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel node id marking workflow entry.
pub const START: &str = "START";
/// Sentinel node id marking workflow exit.
pub const END: &str = "END";

pub type NodeId = String;

/// One node in a workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowNode {
    Agent {
        agent_id: AgentId,
        #[serde(skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    Parallel {
        parallel_agents: Vec<AgentId>,
    },
    Condition {
        expr: String,
    },
    HumanApproval {
        approval_type: String,
    },
}

/// One directed edge, optionally gated by a condition-language expression
/// evaluated against `WorkflowContext.variables`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A named, externally-supplied workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    pub nodes: HashMap<NodeId, WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    pub default_timeout_ms: u64,
}

impl WorkflowDefinition {
    /// Edges leading out of `node_id` whose condition (if any) is satisfied
    /// by `variables`, excluding edges back into `START` by construction
    /// (the graph is expected to be acyclic; the executor itself tolerates
    /// revisits by relying on the caller's scheduler, not an internal guard).
    #[must_use]
    pub fn next_nodes(
        &self,
        node_id: &str,
        variables: &HashMap<String, serde_json::Value>,
    ) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|edge| edge.from == node_id)
            .filter(|edge| match &edge.condition {
                Some(expr) => crate::condition::evaluate(expr, variables),
                None => true,
            })
            .map(|edge| edge.to.clone())
            .collect()
    }
}

/// Outcome of entering a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Completed,
    Failed,
}

/// Per-node execution record, kept for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    pub status: NodeStatus,
    pub output: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Workflow-level lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
    WaitingApproval,
}

/// Per-execution mutable state threaded through the executor loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowContext {
    pub organization_id: String,
    pub user_id: String,
    pub session_id: String,
    pub variables: HashMap<String, serde_json::Value>,
    pub node_results: HashMap<NodeId, NodeResult>,
    pub current_node: NodeId,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowContext {
    #[must_use]
    pub fn new(
        organization_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        variables: HashMap<String, serde_json::Value>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            variables,
            node_results: HashMap::new(),
            current_node: START.to_string(),
            status: WorkflowStatus::Pending,
            started_at,
            completed_at: None,
        }
    }
}

/// Result of `execute_workflow` (spec §6 workflow entry point).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecutionResult {
    pub status: WorkflowStatus,
    pub context: WorkflowContext,
    pub duration_ms: u64,
    pub workflow_name: String,
    pub approval_id: Option<String>,
}
