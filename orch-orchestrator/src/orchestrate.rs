//! Top-level orchestration entry point (spec §4.4): routes, decomposes,
//! guards against loops, and fans a request out to one or many agents under
//! a wall-clock deadline.

use crate::types::{ExecutionMode, OrchestrateOptions, OrchestrationResult, OrchestrationStatus};
use orch_agents::{
    aggregate, coordinate_parallel, coordinate_sequential, DEFAULT_MAX_PARALLEL_AGENTS, LoopDetector,
};
use orch_core::{AgentId, ExecutionContext, OrchError, Request, Result};
use orch_decompose::{decompose, Complexity as DecomposeComplexity};
use orch_providers::{ModelRequest, ModelResponse};
use orch_router::cache::RouteCache;
use orch_router::{route, RouteOptions, SessionStore};
use orch_tenancy::BudgetEnforcer;
use std::time::{Duration, Instant};
use tracing::{instrument, warn};

/// Default max-delegation depth for a fresh root context (spec §6).
const MAX_DELEGATION_DEPTH: u8 = 3;

/// The single-agent shortcut: delegate straight to the Model Executor with
/// the router's category/skill selection, skipping decomposition and the
/// coordinator's agent catalog entirely (spec §4.4 step 1).
async fn run_single_agent(
    request: &Request,
    category: orch_core::Category,
    executor: &dyn ModelExecutor,
) -> (bool, String, String) {
    let model_request = ModelRequest {
        category,
        skills: Vec::new(),
        prompt: request.user_request.clone(),
        session_id: request.session_id.clone(),
        organization_id: request.organization_id.clone(),
        user_id: request.user_id.clone(),
        tool_results: Vec::new(),
    };

    match executor.execute(&model_request).await {
        Ok(ModelResponse { error: Some(err), metadata, .. }) => (false, err, metadata.model),
        Ok(response) => {
            let model = response.metadata.model.clone();
            (true, response.output, model)
        }
        Err(err) => (false, err.to_string(), executor.model().to_string()),
    }
}

use orch_providers::ModelExecutor;

/// Run a request end to end (spec §4.4). Never returns `Err` for ordinary
/// execution failure — those surface as `OrchestrationStatus::Failed` with a
/// human-readable `output`; `Err` is reserved for structural input errors
/// (`request.validate()`).
#[instrument(skip(request, options, executor, cache, sessions), fields(session = %request.session_id))]
pub async fn orchestrate(
    request: &Request,
    options: OrchestrateOptions<'_>,
    executor: &dyn ModelExecutor,
    cache: &RouteCache,
    sessions: &SessionStore,
) -> Result<OrchestrationResult> {
    request.validate()?;
    let started = Instant::now();

    // Budget exhaustion is checked before routing so an exhausted org never
    // triggers the router's LLM fallback or any agent/model call (spec §7,
    // §8 scenario 3: "no LLM call is made").
    if BudgetEnforcer::is_exhausted(options.remaining_budget_cents) {
        return Ok(OrchestrationResult {
            status: OrchestrationStatus::Failed,
            output: "budget exhausted: organization has no remaining budget for this request"
                .to_string(),
            category: orch_core::Category::Quick,
            skills: orch_core::SkillSelection::default(),
            duration_ms: started.elapsed().as_millis() as u64,
            model: String::new(),
            agents_used: Vec::new(),
            execution_mode: ExecutionMode::Single,
            loop_detection: None,
            failure_reason: Some("budget_exhausted".to_string()),
        });
    }

    let route_options = RouteOptions {
        min_confidence: options.min_confidence,
        complexity_hint: options.complexity_hint,
        remaining_budget_cents: options.remaining_budget_cents,
        downgrade_thresholds: options.downgrade_thresholds,
        llm_executor: options.llm_executor,
        time_budget_available: options.time_budget_available,
    };
    let (category_selection, skill_selection) = route(request, route_options, cache, sessions).await;
    let category = category_selection.category;

    let decomposition = decompose(&request.user_request);

    let single_agent_path = !options.multi_agent_enabled
        || decomposition.complexity == DecomposeComplexity::Low
        || !decomposition.requires_multi_agent;

    if single_agent_path {
        let (success, output, model) = run_single_agent(request, category, executor).await;
        return Ok(OrchestrationResult {
            status: if success {
                OrchestrationStatus::Completed
            } else {
                OrchestrationStatus::Failed
            },
            output,
            category,
            skills: skill_selection,
            duration_ms: started.elapsed().as_millis() as u64,
            model,
            agents_used: Vec::new(),
            execution_mode: ExecutionMode::Single,
            loop_detection: None,
            failure_reason: if success { None } else { Some("agent_execution_failed".to_string()) },
        });
    }

    let mut subtasks = decomposition.subtasks;
    subtasks.truncate(options.max_agents.max(1));

    let ctx = ExecutionContext::root(
        &request.organization_id,
        &request.user_id,
        &request.session_id,
        MAX_DELEGATION_DEPTH,
    );

    let mode = if decomposition
        .parallel_groups
        .first()
        .is_some_and(|group| group.len() > 1)
    {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    };

    let mut detector = LoopDetector::new();
    for task in &subtasks {
        let check = detector.check_before(task.assigned_agent, &task.description);
        if check.loop_detected {
            warn!(agent = %task.assigned_agent, "orchestrate: loop detector aborted the run");
            let summary = detector.exit_summary();
            return Ok(OrchestrationResult {
                status: OrchestrationStatus::Failed,
                output: format!(
                    "run aborted by loop detector: {}",
                    check.info.map(|i| i.detail).unwrap_or_default()
                ),
                category,
                skills: skill_selection,
                duration_ms: started.elapsed().as_millis() as u64,
                model: executor.model().to_string(),
                agents_used: subtasks.iter().map(|t| t.assigned_agent).collect(),
                execution_mode: mode,
                loop_detection: Some(summary),
                failure_reason: Some("loop_detected".to_string()),
            });
        }
    }

    let agents_used: Vec<AgentId> = subtasks.iter().map(|t| t.assigned_agent).collect();
    let timeout = Duration::from_millis(options.timeout_ms);

    let run = async {
        match mode {
            ExecutionMode::Parallel => Ok(coordinate_parallel(
                &subtasks,
                &ctx,
                executor,
                DEFAULT_MAX_PARALLEL_AGENTS,
            )
            .await),
            _ => coordinate_sequential(&subtasks, &ctx, executor).await,
        }
    };

    let results = match tokio::time::timeout(timeout, run).await {
        Ok(Ok(results)) => results,
        Ok(Err(err)) => {
            return Ok(OrchestrationResult {
                status: OrchestrationStatus::Failed,
                output: format!("decomposition graph error: {err}"),
                category,
                skills: skill_selection,
                duration_ms: started.elapsed().as_millis() as u64,
                model: executor.model().to_string(),
                agents_used,
                execution_mode: mode,
                loop_detection: None,
                failure_reason: Some("decomposition_graph_error".to_string()),
            });
        }
        Err(_elapsed) => {
            return Ok(OrchestrationResult {
                status: OrchestrationStatus::Failed,
                output: format!("orchestration timed out after {}ms", options.timeout_ms),
                category,
                skills: skill_selection,
                duration_ms: started.elapsed().as_millis() as u64,
                model: executor.model().to_string(),
                agents_used,
                execution_mode: mode,
                loop_detection: None,
                failure_reason: Some("timeout".to_string()),
            });
        }
    };

    for result in &results {
        if result.success {
            detector.record_completed(result.output.clone().unwrap_or_default());
        }
    }

    let output = aggregate(&results);
    Ok(OrchestrationResult {
        status: OrchestrationStatus::Completed,
        output,
        category,
        skills: skill_selection,
        duration_ms: started.elapsed().as_millis() as u64,
        model: executor.model().to_string(),
        agents_used,
        execution_mode: mode,
        loop_detection: None,
        failure_reason: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orch_core::OrchError as CoreError;
    use orch_providers::{CallMetadata, ProviderCapabilities};
    use orch_router::{default_route_cache, default_session_store};

    struct StubExecutor {
        reply: String,
    }

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
                self.reply.clone(),
                CallMetadata {
                    model: "stub-model".to_string(),
                    input_tokens: 10,
                    output_tokens: 10,
                    duration_ms: 1,
                    cost_cents: 0.1,
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

    fn request(text: &str) -> Request {
        Request {
            user_request: text.to_string(),
            session_id: "sess1".to_string(),
            organization_id: "org1".to_string(),
            user_id: "user1".to_string(),
        }
    }

    #[tokio::test]
    async fn low_complexity_request_takes_the_single_agent_path() {
        let executor = StubExecutor {
            reply: "typo fixed".to_string(),
        };
        let cache = default_route_cache();
        let sessions = default_session_store();

        let result = orchestrate(
            &request("fix typo in README"),
            OrchestrateOptions::default(),
            &executor,
            &cache,
            &sessions,
        )
        .await
        .unwrap();

        assert_eq!(result.execution_mode, ExecutionMode::Single);
        assert_eq!(result.status, OrchestrationStatus::Completed);
        assert_eq!(result.output, "typo fixed");
    }

    #[tokio::test]
    async fn multi_agent_request_runs_sequentially_and_aggregates() {
        let executor = StubExecutor {
            reply: "ok".to_string(),
        };
        let cache = default_route_cache();
        let sessions = default_session_store();

        let result = orchestrate(
            &request(
                "create a weekly report with sales metrics from the database and send it to the team in Slack",
            ),
            OrchestrateOptions::default(),
            &executor,
            &cache,
            &sessions,
        )
        .await
        .unwrap();

        assert_eq!(result.status, OrchestrationStatus::Completed);
        assert_eq!(result.agents_used.len(), 3);
        assert!(result.output.contains("ok"));
    }

    #[tokio::test]
    async fn empty_request_is_rejected_before_routing() {
        let executor = StubExecutor {
            reply: "ok".to_string(),
        };
        let cache = default_route_cache();
        let sessions = default_session_store();

        let err = orchestrate(&request(""), OrchestrateOptions::default(), &executor, &cache, &sessions)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchError::InvalidInput { .. }));
    }

    struct PanicExecutor;

    #[async_trait]
    impl ModelExecutor for PanicExecutor {
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
            panic!("budget_exhausted must short-circuit before any model call");
        }

        async fn validate(&self) -> std::result::Result<(), CoreError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panic"
        }

        fn model(&self) -> &str {
            "panic-model"
        }
    }

    #[tokio::test]
    async fn exhausted_budget_short_circuits_before_any_model_call() {
        let executor = PanicExecutor;
        let cache = default_route_cache();
        let sessions = default_session_store();
        let mut options = OrchestrateOptions::default();
        options.remaining_budget_cents = 5;

        let result = orchestrate(&request("anything at all"), options, &executor, &cache, &sessions)
            .await
            .unwrap();

        assert_eq!(result.status, OrchestrationStatus::Failed);
        assert!(result.output.to_lowercase().contains("budget"));
        assert!(result.output.to_lowercase().contains("exhausted"));
        assert_eq!(result.failure_reason.as_deref(), Some("budget_exhausted"));
    }
}
