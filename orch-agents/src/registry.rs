//! Static agent registry (spec §4.3): a fixed catalog of specialized agents,
//! built once via `LazyLock` the way the router's keyword table is built —
//! this core does not support runtime agent registration.

use orch_core::{Agent, AgentId, Category, Skill};
use std::collections::HashSet;
use std::sync::LazyLock;

static AGENT_CATALOG: LazyLock<Vec<Agent>> = LazyLock::new(|| {
    vec![
        Agent {
            id: AgentId::Search,
            name: "search".to_string(),
            category: Category::Quick,
            skills: vec![Skill::ApiIntegration],
            capabilities: vec!["web-search".to_string(), "lookup".to_string()],
            system_prompt: "You research facts and locate information requested by the user."
                .to_string(),
            can_delegate_to: HashSet::new(),
            max_concurrent_tasks: 5,
            timeout_ms: 120_000,
        },
        Agent {
            id: AgentId::Data,
            name: "data".to_string(),
            category: Category::UnspecifiedHigh,
            skills: vec![Skill::DataAnalysis],
            capabilities: vec!["transform".to_string(), "summarize".to_string()],
            system_prompt: "You process and transform structured data on request.".to_string(),
            can_delegate_to: HashSet::new(),
            max_concurrent_tasks: 5,
            timeout_ms: 120_000,
        },
        Agent {
            id: AgentId::Analytics,
            name: "analytics".to_string(),
            category: Category::Ultrabrain,
            skills: vec![Skill::DataAnalysis],
            capabilities: vec!["statistics".to_string(), "forecasting".to_string()],
            system_prompt: "You analyze data and surface trends, anomalies, and forecasts."
                .to_string(),
            can_delegate_to: HashSet::from([AgentId::Data]),
            max_concurrent_tasks: 3,
            timeout_ms: 120_000,
        },
        Agent {
            id: AgentId::Task,
            name: "task".to_string(),
            category: Category::Quick,
            skills: vec![Skill::ApiIntegration],
            capabilities: vec!["task-management".to_string()],
            system_prompt: "You create, update, and track tasks in project tools.".to_string(),
            can_delegate_to: HashSet::new(),
            max_concurrent_tasks: 5,
            timeout_ms: 120_000,
        },
        Agent {
            id: AgentId::Approval,
            name: "approval".to_string(),
            category: Category::Quick,
            skills: vec![],
            capabilities: vec!["human-approval".to_string()],
            system_prompt: "You route requests that need human sign-off to an approver."
                .to_string(),
            can_delegate_to: HashSet::new(),
            max_concurrent_tasks: 5,
            timeout_ms: 120_000,
        },
        Agent {
            id: AgentId::Report,
            name: "report".to_string(),
            category: Category::Writing,
            skills: vec![Skill::DocumentWriting],
            capabilities: vec!["document-generation".to_string()],
            system_prompt: "You compose clear written reports from prior agent output."
                .to_string(),
            can_delegate_to: HashSet::from([AgentId::Data, AgentId::Analytics]),
            max_concurrent_tasks: 5,
            timeout_ms: 120_000,
        },
        Agent {
            id: AgentId::Comms,
            name: "comms".to_string(),
            category: Category::Writing,
            skills: vec![Skill::DocumentWriting, Skill::ApiIntegration],
            capabilities: vec!["messaging".to_string(), "notification".to_string()],
            system_prompt: "You draft and send messages to the requested channel or recipient."
                .to_string(),
            can_delegate_to: HashSet::new(),
            max_concurrent_tasks: 5,
            timeout_ms: 120_000,
        },
        Agent {
            id: AgentId::General,
            name: "general".to_string(),
            category: Category::UnspecifiedLow,
            skills: vec![],
            capabilities: vec!["general-purpose".to_string()],
            system_prompt: "You handle requests that don't fit a specialized agent.".to_string(),
            can_delegate_to: HashSet::new(),
            max_concurrent_tasks: 5,
            timeout_ms: 120_000,
        },
    ]
});

/// Look up a catalog entry by its fixed identifier.
#[must_use]
pub fn get_agent(id: AgentId) -> Option<&'static Agent> {
    AGENT_CATALOG.iter().find(|a| a.id == id)
}

/// The full static catalog, in the fixed priority order used for linearization.
#[must_use]
pub fn all_agents() -> &'static [Agent] {
    &AGENT_CATALOG
}
