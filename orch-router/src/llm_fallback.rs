//! LLM fallback classification (spec §4.1): invoked when keyword confidence
//! is below `min_confidence` and a model is available. A single call
//! returns `{category, skills, reasoning}`; failure falls back to the
//! keyword result rather than propagating, per spec §4.1's failure modes.

use orch_core::{Category, OrchError, Skill};
use orch_providers::{CallMetadata, ModelExecutor, ModelRequest};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct LlmClassification {
    category: String,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

/// Result of a successful LLM classification call.
#[derive(Debug, Clone)]
pub struct LlmFallbackResult {
    pub category: Category,
    pub skills: Vec<Skill>,
    pub reasoning: String,
}

fn parse_category(raw: &str) -> Option<Category> {
    Category::all()
        .iter()
        .copied()
        .find(|c| c.to_string() == raw.to_lowercase())
}

fn parse_skill(raw: &str) -> Option<Skill> {
    match raw.to_lowercase().as_str() {
        "playwright" => Some(Skill::Playwright),
        "git-master" => Some(Skill::GitMaster),
        "frontend-ui-ux" => Some(Skill::FrontendUiUx),
        "mcp-integration" => Some(Skill::McpIntegration),
        "data-analysis" => Some(Skill::DataAnalysis),
        "api-integration" => Some(Skill::ApiIntegration),
        "document-writing" => Some(Skill::DocumentWriting),
        "image-generation" => Some(Skill::ImageGeneration),
        _ => None,
    }
}

fn classification_prompt(request_text: &str) -> String {
    format!(
        "Classify the following user request. Respond with ONLY a JSON object of the \
         form {{\"category\": <one of visual-engineering|ultrabrain|artistry|quick|writing|\
         unspecified-low|unspecified-high>, \"skills\": [<subset of playwright, git-master, \
         frontend-ui-ux, mcp-integration, data-analysis, api-integration, document-writing, \
         image-generation>], \"reasoning\": <short string>}}.\n\nREQUEST:\n{request_text}"
    )
}

/// Run the single LLM fallback call. Never returns `Err` for an ordinary
/// model or parse failure — callers should treat `Ok(None)` as "fall back
/// to keyword result" (spec §4.1: "LLM failure → return keyword result").
pub async fn classify(
    executor: &dyn ModelExecutor,
    request_text: &str,
    session_id: &str,
    organization_id: &str,
    user_id: &str,
) -> Option<LlmFallbackResult> {
    let request = ModelRequest {
        category: Category::Quick,
        skills: Vec::new(),
        prompt: classification_prompt(request_text),
        session_id: session_id.to_string(),
        organization_id: organization_id.to_string(),
        user_id: user_id.to_string(),
        tool_results: Vec::new(),
    };

    let response = match executor.execute(&request).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "llm fallback classification call failed");
            return None;
        }
    };

    if response.error.is_some() {
        warn!(error = ?response.error, "llm fallback classification reported in-band failure");
        return None;
    }

    let parsed: LlmClassification = match serde_json::from_str(&response.output) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(error = %err, output = %response.output, "llm fallback response was not valid JSON");
            return None;
        }
    };

    let category = parse_category(&parsed.category)?;
    let skills = parsed.skills.iter().filter_map(|s| parse_skill(s)).collect();

    Some(LlmFallbackResult {
        category,
        skills,
        reasoning: parsed.reasoning,
    })
}

/// Placeholder metadata builder retained for callers that need to report a
/// zero-cost call when the fallback never actually invoked a provider.
#[must_use]
pub fn zero_cost_metadata(model: &str) -> CallMetadata {
    CallMetadata {
        model: model.to_string(),
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: 0,
        cost_cents: 0.0,
    }
}

pub fn map_provider_error(err: OrchError) -> OrchError {
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orch_providers::{ExecutionStatus, ModelResponse, ProviderCapabilities};

    struct StubExecutor {
        body: String,
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

        async fn execute(&self, _request: &ModelRequest) -> Result<ModelResponse, OrchError> {
            Ok(ModelResponse {
                status: ExecutionStatus::Success,
                output: self.body.clone(),
                tool_calls: Vec::new(),
                metadata: zero_cost_metadata("stub"),
                error: None,
            })
        }

        async fn validate(&self) -> Result<(), OrchError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    #[tokio::test]
    async fn classify_parses_a_well_formed_response() {
        let executor = StubExecutor {
            body: r#"{"category": "ultrabrain", "skills": ["git-master"], "reasoning": "complex refactor"}"#.to_string(),
        };
        let result = classify(&executor, "refactor the auth module", "s1", "org1", "u1")
            .await
            .unwrap();
        assert_eq!(result.category, Category::Ultrabrain);
        assert_eq!(result.skills, vec![Skill::GitMaster]);
    }

    #[tokio::test]
    async fn classify_returns_none_on_malformed_json() {
        let executor = StubExecutor {
            body: "not json at all".to_string(),
        };
        let result = classify(&executor, "do something", "s1", "org1", "u1").await;
        assert!(result.is_none());
    }
}
