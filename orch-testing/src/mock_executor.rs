//! A configurable `ModelExecutor` double, generalizing the `StubExecutor`
//! pattern repeated across `orch-agents`/`orch-workflows`/`orch-orchestrator`
//! unit tests into one reusable implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use orch_core::{OrchError, Result};
use orch_providers::{
    CallMetadata, ExecutionStatus, ModelExecutor, ModelRequest, ModelResponse, ProviderCapabilities,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A scripted response for one `execute` call.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Output(String),
    Failure(String),
    Error(String),
}

/// Deterministic `ModelExecutor` double. Replies are consumed in order from
/// a script; once exhausted, the last entry repeats. With an empty script,
/// every call succeeds with `"mock output"`.
pub struct MockModelExecutor {
    script: Vec<ScriptedReply>,
    calls: AtomicUsize,
    recorded_prompts: DashMap<usize, String>,
    model: String,
}

impl MockModelExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            calls: AtomicUsize::new(0),
            recorded_prompts: DashMap::new(),
            model: "mock-model".to_string(),
        }
    }

    #[must_use]
    pub fn with_script(script: Vec<ScriptedReply>) -> Self {
        Self {
            script,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn always_failing(error: impl Into<String>) -> Self {
        Self::with_script(vec![ScriptedReply::Failure(error.into())])
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn prompt_at(&self, index: usize) -> Option<String> {
        self.recorded_prompts.get(&index).map(|r| r.clone())
    }
}

impl Default for MockModelExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelExecutor for MockModelExecutor {
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

    async fn execute(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded_prompts.insert(index, request.prompt.clone());

        let metadata = CallMetadata {
            model: self.model.clone(),
            input_tokens: (request.prompt.len() / 4) as u64,
            output_tokens: 10,
            duration_ms: 1,
            cost_cents: 0.01,
        };

        let reply = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| ScriptedReply::Output("mock output".to_string()));

        match reply {
            ScriptedReply::Output(output) => Ok(ModelResponse {
                status: ExecutionStatus::Success,
                output,
                tool_calls: Vec::new(),
                metadata,
                error: None,
            }),
            ScriptedReply::Failure(message) => Ok(ModelResponse::failed(message, metadata)),
            ScriptedReply::Error(message) => Err(OrchError::Provider { message }),
        }
    }

    async fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orch_core::{Category, Skill};

    fn request(prompt: &str) -> ModelRequest {
        ModelRequest {
            category: Category::Quick,
            skills: Vec::<Skill>::new(),
            prompt: prompt.to_string(),
            session_id: "sess1".to_string(),
            organization_id: "org1".to_string(),
            user_id: "user1".to_string(),
            tool_results: Vec::new(),
        }
    }

    #[tokio::test]
    async fn default_mock_always_succeeds() {
        let executor = MockModelExecutor::new();
        let response = executor.execute(&request("hi")).await.unwrap();
        assert_eq!(response.output, "mock output");
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn scripted_replies_are_consumed_in_order() {
        let executor = MockModelExecutor::with_script(vec![
            ScriptedReply::Output("first".to_string()),
            ScriptedReply::Failure("second failed".to_string()),
        ]);

        let first = executor.execute(&request("a")).await.unwrap();
        assert_eq!(first.output, "first");

        let second = executor.execute(&request("b")).await.unwrap();
        assert_eq!(second.error.as_deref(), Some("second failed"));
    }

    #[tokio::test]
    async fn always_failing_repeats_the_same_failure() {
        let executor = MockModelExecutor::always_failing("boom");
        let a = executor.execute(&request("a")).await.unwrap();
        let b = executor.execute(&request("b")).await.unwrap();
        assert_eq!(a.error.as_deref(), Some("boom"));
        assert_eq!(b.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn error_variant_surfaces_as_err() {
        let executor = MockModelExecutor::with_script(vec![ScriptedReply::Error("upstream down".to_string())]);
        let result = executor.execute(&request("a")).await;
        assert!(result.is_err());
    }
}
