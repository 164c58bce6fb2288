//! ABOUTME: Core domain types shared across the orchestration workspace
//! ABOUTME: Request/response envelopes, category and skill selections, agents, subtasks

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for executions, subtasks, and other workspace entities.
///
/// Uses UUID v4 for random generation and UUID v5 for deterministic generation
/// from names, so a spawn tree rooted at a name can be reproduced in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(Uuid);

impl ComponentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes()))
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable, per-invocation request into the orchestration core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub user_request: String,
    pub session_id: String,
    pub organization_id: String,
    pub user_id: String,
}

impl Request {
    /// Validate the structural invariant: no required field may be empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.user_request.trim().is_empty() {
            return Err(crate::OrchError::InvalidInput {
                message: "user_request must not be empty".to_string(),
            });
        }
        if self.session_id.trim().is_empty()
            || self.organization_id.trim().is_empty()
            || self.user_id.trim().is_empty()
        {
            return Err(crate::OrchError::InvalidInput {
                message: "session_id, organization_id and user_id must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Coarse request class determining model tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    VisualEngineering,
    Ultrabrain,
    Artistry,
    Quick,
    Writing,
    UnspecifiedLow,
    UnspecifiedHigh,
}

impl Category {
    /// Fixed category → model tier mapping.
    #[must_use]
    pub fn tier(self) -> ModelTier {
        match self {
            Category::Ultrabrain => ModelTier::Opus,
            Category::VisualEngineering | Category::Artistry | Category::Writing => {
                ModelTier::Sonnet
            }
            Category::Quick | Category::UnspecifiedLow => ModelTier::Haiku,
            Category::UnspecifiedHigh => ModelTier::Sonnet,
        }
    }

    #[must_use]
    pub fn all() -> &'static [Category] {
        &[
            Category::VisualEngineering,
            Category::Ultrabrain,
            Category::Artistry,
            Category::Quick,
            Category::Writing,
            Category::UnspecifiedLow,
            Category::UnspecifiedHigh,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::VisualEngineering => "visual-engineering",
            Category::Ultrabrain => "ultrabrain",
            Category::Artistry => "artistry",
            Category::Quick => "quick",
            Category::Writing => "writing",
            Category::UnspecifiedLow => "unspecified-low",
            Category::UnspecifiedHigh => "unspecified-high",
        };
        write!(f, "{s}")
    }
}

/// Pricing/capability class of the underlying model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Opus,
    Sonnet,
    Haiku,
}

impl ModelTier {
    /// Strictly-cheaper-than ordering used by budget-aware downgrade.
    #[must_use]
    pub fn is_cheaper_than(self, other: ModelTier) -> bool {
        self.rank() < other.rank()
    }

    fn rank(self) -> u8 {
        match self {
            ModelTier::Haiku => 0,
            ModelTier::Sonnet => 1,
            ModelTier::Opus => 2,
        }
    }
}

/// How a `CategorySelection` was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingMethod {
    KeywordFast,
    KeywordLlmHybrid,
    ComplexityFallback,
    LlmFallback,
}

/// Result of classifying a free-text request into a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySelection {
    pub category: Category,
    pub confidence: f64,
    pub method: RoutingMethod,
    pub matched_keywords: Vec<String>,
    pub downgraded: bool,
    pub base_category: Option<Category>,
}

/// Orthogonal capability tag influencing an agent's system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Skill {
    Playwright,
    GitMaster,
    FrontendUiUx,
    McpIntegration,
    DataAnalysis,
    ApiIntegration,
    DocumentWriting,
    ImageGeneration,
}

/// A single scored skill match produced by the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: Skill,
    pub score: f64,
    pub matched_keywords: Vec<String>,
    pub from_dependency: bool,
}

/// Set of skills selected for a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillSelection {
    pub skills: Vec<SkillMatch>,
}

impl SkillSelection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    #[must_use]
    pub fn contains(&self, skill: Skill) -> bool {
        self.skills.iter().any(|m| m.skill == skill)
    }

    #[must_use]
    pub fn as_set(&self) -> HashSet<Skill> {
        self.skills.iter().map(|m| m.skill).collect()
    }
}

/// Closed enum of specialized agents in the static registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentId {
    Search,
    Data,
    Analytics,
    Task,
    Approval,
    Report,
    Comms,
    General,
}

impl AgentId {
    /// Fixed priority used to linearize an unordered set of mentioned agents
    /// (`search < data < analytics < task < approval < report < comms`).
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            AgentId::Search => 0,
            AgentId::Data => 1,
            AgentId::Analytics => 2,
            AgentId::Task => 3,
            AgentId::Approval => 4,
            AgentId::Report => 5,
            AgentId::Comms => 6,
            AgentId::General => 7,
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentId::Search => "search",
            AgentId::Data => "data",
            AgentId::Analytics => "analytics",
            AgentId::Task => "task",
            AgentId::Approval => "approval",
            AgentId::Report => "report",
            AgentId::Comms => "comms",
            AgentId::General => "general",
        };
        write!(f, "{s}")
    }
}

/// Static registry record for a specialized agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub category: Category,
    pub skills: Vec<Skill>,
    pub capabilities: Vec<String>,
    pub system_prompt: String,
    pub can_delegate_to: HashSet<AgentId>,
    pub max_concurrent_tasks: usize,
    pub timeout_ms: u64,
}

/// Identifier for a subtask within a decomposition.
pub type SubTaskId = ComponentId;

/// Lifecycle status of a subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubTaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A unit of a decomposition DAG, assigned to exactly one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTask {
    pub id: SubTaskId,
    pub description: String,
    pub assigned_agent: AgentId,
    pub dependencies: Vec<SubTaskId>,
    pub status: SubTaskStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl SubTask {
    #[must_use]
    pub fn new(description: impl Into<String>, assigned_agent: AgentId) -> Self {
        Self {
            id: ComponentId::new(),
            description: description.into(),
            assigned_agent,
            dependencies: Vec::new(),
            status: SubTaskStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn with_dependencies(mut self, deps: Vec<SubTaskId>) -> Self {
        self.dependencies = deps;
        self
    }
}

/// Result of a single agent execution, returned by the Agent Coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionResult {
    pub success: bool,
    pub agent: AgentId,
    pub output: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl AgentExecutionResult {
    #[must_use]
    pub fn ok(agent: AgentId, output: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: true,
            agent,
            output: Some(output.into()),
            error: None,
            duration_ms,
        }
    }

    #[must_use]
    pub fn failed(agent: AgentId, error: impl Into<String>) -> Self {
        Self {
            success: false,
            agent,
            output: None,
            error: Some(error.into()),
            duration_ms: 0,
        }
    }
}
