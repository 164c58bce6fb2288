//! Workflow entry point (spec §6): resolves a named `WorkflowDefinition` out
//! of a small in-memory registry and delegates to `orch_workflows`.
//!
//! "Loads a set of named `WorkflowDefinition`s (externally supplied)" (spec
//! §4.6) — the registry here is that load path. Definitions normally come
//! from the host application (a config file, a database row); tests and
//! small deployments can also build one in-process with `register`.

use orch_agents::DEFAULT_MAX_PARALLEL_AGENTS;
use orch_core::{ExecutionContext, OrchError, Request, Result};
use orch_providers::ModelExecutor;
use orch_workflows::{
    execute_workflow as run_workflow, resume_after_approval as resume_workflow, ApprovalService,
    WorkflowContext, WorkflowDefinition, WorkflowExecutionResult,
};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::instrument;

/// Max delegation depth given to a workflow's `ExecutionContext`; workflows
/// are a fixed-shape alternative to the decomposer, not a spawn tree, so
/// this mirrors the orchestrator's own root depth.
const WORKFLOW_MAX_DEPTH: u8 = 3;

#[allow(unused)]
const _KEEP_MAX_PARALLEL_IN_SCOPE: usize = DEFAULT_MAX_PARALLEL_AGENTS;

/// Named store of externally-supplied workflow definitions.
#[derive(Default)]
pub struct WorkflowRegistry {
    definitions: RwLock<HashMap<String, WorkflowDefinition>>,
}

impl WorkflowRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, definition: WorkflowDefinition) {
        self.definitions
            .write()
            .expect("workflow registry lock poisoned")
            .insert(definition.name.clone(), definition);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<WorkflowDefinition> {
        self.definitions
            .read()
            .expect("workflow registry lock poisoned")
            .get(name)
            .cloned()
    }
}

/// `execute_workflow(name, request, initial_variables) → {status, context,
/// duration, approval_id?}` (spec §6). `WorkflowNotFound` is thrown to the
/// caller rather than returned as a structured failure — per spec §7 it's a
/// programming error, not a runtime one.
#[instrument(skip(registry, request, initial_variables, exec_ctx, executor, approvals), fields(workflow = %name))]
pub async fn execute_workflow(
    registry: &WorkflowRegistry,
    name: &str,
    request: &Request,
    initial_variables: HashMap<String, serde_json::Value>,
    exec_ctx: Option<&ExecutionContext>,
    executor: &dyn ModelExecutor,
    approvals: &dyn ApprovalService,
) -> Result<WorkflowExecutionResult> {
    let definition = registry.get(name).ok_or_else(|| OrchError::WorkflowNotFound {
        name: name.to_string(),
    })?;

    let owned_ctx;
    let ctx = match exec_ctx {
        Some(ctx) => ctx,
        None => {
            owned_ctx = ExecutionContext::root(
                &request.organization_id,
                &request.user_id,
                &request.session_id,
                WORKFLOW_MAX_DEPTH,
            );
            &owned_ctx
        }
    };

    run_workflow(&definition, request, initial_variables, ctx, executor, approvals).await
}

/// Resume a workflow paused at a `human_approval` node (spec §4.6's
/// `waiting_approval → {running|failed}` transition).
#[instrument(skip(registry, context, exec_ctx, executor, approvals), fields(workflow = %name, node = %approval_node_id))]
#[allow(clippy::too_many_arguments)]
pub async fn resume_workflow_after_approval(
    registry: &WorkflowRegistry,
    name: &str,
    context: WorkflowContext,
    approval_node_id: &str,
    approved: bool,
    exec_ctx: &ExecutionContext,
    executor: &dyn ModelExecutor,
    approvals: &dyn ApprovalService,
) -> Result<WorkflowExecutionResult> {
    let definition = registry.get(name).ok_or_else(|| OrchError::WorkflowNotFound {
        name: name.to_string(),
    })?;

    resume_workflow(
        &definition,
        context,
        approval_node_id,
        approved,
        exec_ctx,
        executor,
        approvals,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orch_core::OrchError as CoreError;
    use orch_providers::{CallMetadata, ExecutionStatus, ModelRequest, ModelResponse, ProviderCapabilities};
    use orch_workflows::{WorkflowEdge, WorkflowNode, END, START};
    use serde_json::json;

    struct StubExecutor;

    #[async_trait]
    impl ModelExecutor for StubExecutor {
        fn capabilities(&self) -> &ProviderCapabilities {
            static CAPS: ProviderCapabilities = ProviderCapabilities {
                supports_streaming: false,
                supports_tool_use: false,
                max_context_tokens: None,
                max_output_tokens: None,
                available_models: Vec::new(),
                custom_features: std::collections::HashMap::new(),
            };
            &CAPS
        }

        async fn execute(&self, _request: &ModelRequest) -> std::result::Result<ModelResponse, CoreError> {
            Ok(ModelResponse::ok(
                "done",
                CallMetadata {
                    model: "stub".to_string(),
                    input_tokens: 1,
                    output_tokens: 1,
                    duration_ms: 1,
                    cost_cents: 0.0,
                },
            ))
        }

        async fn validate(&self) -> std::result::Result<(), CoreError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    struct StubApprovals;

    #[async_trait]
    impl ApprovalService for StubApprovals {
        async fn create_approval_request(
            &self,
            _organization_id: &str,
            _requester_id: &str,
            _approver_id: &str,
            _approval_type: &str,
            _description: &str,
            _payload: serde_json::Value,
        ) -> Result<String> {
            Ok("approval-1".to_string())
        }
    }

    fn request() -> Request {
        Request {
            user_request: "send the report".to_string(),
            session_id: "sess1".to_string(),
            organization_id: "org1".to_string(),
            user_id: "user1".to_string(),
        }
    }

    fn linear_workflow() -> WorkflowDefinition {
        let mut nodes = HashMap::new();
        nodes.insert(
            "notify".to_string(),
            WorkflowNode::Agent {
                agent_id: orch_core::AgentId::Comms,
                timeout_ms: None,
            },
        );
        WorkflowDefinition {
            name: "notify-team".to_string(),
            nodes,
            edges: vec![
                WorkflowEdge {
                    from: START.to_string(),
                    to: "notify".to_string(),
                    condition: None,
                },
                WorkflowEdge {
                    from: "notify".to_string(),
                    to: END.to_string(),
                    condition: None,
                },
            ],
            default_timeout_ms: 120_000,
        }
    }

    #[tokio::test]
    async fn unknown_workflow_name_is_an_error() {
        let registry = WorkflowRegistry::new();
        let err = execute_workflow(
            &registry,
            "does-not-exist",
            &request(),
            HashMap::new(),
            None,
            &StubExecutor,
            &StubApprovals,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OrchError::WorkflowNotFound { .. }));
    }

    #[tokio::test]
    async fn registered_workflow_runs_to_completion() {
        let registry = WorkflowRegistry::new();
        registry.register(linear_workflow());

        let result = execute_workflow(
            &registry,
            "notify-team",
            &request(),
            HashMap::from([("foo".to_string(), json!("bar"))]),
            None,
            &StubExecutor,
            &StubApprovals,
        )
        .await
        .unwrap();

        assert_eq!(result.workflow_name, "notify-team");
    }
}
