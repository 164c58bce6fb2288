//! Keyword-to-agent detection (spec §4.2): used when no pattern matches.
//! If at most one agent is mentioned the request is single-agent; otherwise
//! the mentioned agents are linearized by the fixed priority order
//! (`search < data < analytics < task < approval < report < comms`).

use orch_core::AgentId;

const AGENT_KEYWORDS: &[(AgentId, &[&str])] = &[
    (AgentId::Search, &["search", "look up", "find", "research"]),
    (AgentId::Data, &["data", "database", "query", "extract"]),
    (AgentId::Analytics, &["analyze", "analysis", "trend", "forecast", "statistic"]),
    (AgentId::Task, &["task", "ticket", "todo", "assign"]),
    (AgentId::Approval, &["approve", "approval", "sign off", "sign-off"]),
    (AgentId::Report, &["report", "summary", "write up"]),
    (AgentId::Comms, &["send", "notify", "message", "slack", "email"]),
];

/// Agents whose keywords appear in `text`, in the fixed priority order
/// (not in the order they were matched).
#[must_use]
pub fn detect_agents(text: &str) -> Vec<AgentId> {
    let lower = text.to_lowercase();
    let mut found: Vec<AgentId> = AGENT_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(agent, _)| *agent)
        .collect();
    found.sort_by_key(|a| a.priority());
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_agent_mention_is_detected() {
        let agents = detect_agents("search for the latest pricing");
        assert_eq!(agents, vec![AgentId::Search]);
    }

    #[test]
    fn multiple_agents_are_sorted_by_priority() {
        let agents = detect_agents("notify the team and analyze the data");
        assert_eq!(agents, vec![AgentId::Data, AgentId::Analytics, AgentId::Comms]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(detect_agents("what's the capital of France").is_empty());
    }
}
