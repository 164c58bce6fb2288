//! ABOUTME: Task Decomposer — pattern/keyword-driven decomposition into a subtask DAG
//! ABOUTME: Implements spec §4.2

pub mod keyword_agents;
pub mod layering;
pub mod patterns;

use orch_core::{AgentId, SubTask};

/// Coarse complexity bucket, matching `orch_router::Complexity` in spirit
/// but scoped to the decomposer's own estimate from subtask count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Output of decomposing a free-text request into a subtask DAG.
#[derive(Debug, Clone)]
pub struct DecompositionResult {
    pub subtasks: Vec<SubTask>,
    pub requires_multi_agent: bool,
    pub complexity: Complexity,
    pub parallel_groups: Vec<Vec<AgentId>>,
}

/// 1 task → low; ≤3 → medium; else high.
#[must_use]
pub fn estimate_complexity(subtask_count: usize) -> Complexity {
    match subtask_count {
        0 | 1 => Complexity::Low,
        2..=3 => Complexity::Medium,
        _ => Complexity::High,
    }
}

fn chain_to_subtasks(chain: &[AgentId], request_text: &str) -> Vec<SubTask> {
    let mut subtasks = Vec::with_capacity(chain.len());
    let mut previous_id = None;
    for agent in chain {
        let mut task = SubTask::new(request_text.to_string(), *agent);
        if let Some(prev) = previous_id {
            task = task.with_dependencies(vec![prev]);
        }
        previous_id = Some(task.id);
        subtasks.push(task);
    }
    subtasks
}

/// Decompose a free-text request into a subtask DAG (spec §4.2).
///
/// Matching order: (1) the regex pattern table — first match wins; (2) the
/// keyword-to-agent map — at most one agent mentioned is single-agent,
/// otherwise the mentioned agents are linearized by fixed priority.
#[must_use]
pub fn decompose(request_text: &str) -> DecompositionResult {
    let chain: Vec<AgentId> = match patterns::first_match(request_text) {
        Some(pattern_chain) => pattern_chain.to_vec(),
        None => keyword_agents::detect_agents(request_text),
    };

    if chain.is_empty() {
        let subtasks = vec![SubTask::new(request_text.to_string(), AgentId::General)];
        let complexity = estimate_complexity(subtasks.len());
        let parallel_groups = layering::parallel_groups(&subtasks);
        return DecompositionResult {
            subtasks,
            requires_multi_agent: false,
            complexity,
            parallel_groups,
        };
    }

    let subtasks = chain_to_subtasks(&chain, request_text);
    let requires_multi_agent = subtasks.len() > 1;
    let complexity = estimate_complexity(subtasks.len());
    let parallel_groups = layering::parallel_groups(&subtasks);

    DecompositionResult {
        subtasks,
        requires_multi_agent,
        complexity,
        parallel_groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_agent_request_is_not_multi_agent() {
        let result = decompose("fix typo in README");
        assert!(!result.requires_multi_agent);
        assert_eq!(result.subtasks.len(), 1);
    }

    #[test]
    fn report_and_send_decomposes_into_three_dependent_subtasks() {
        let result = decompose("create a weekly report with sales metrics from the database and send it to the team in Slack");
        assert!(result.requires_multi_agent);
        assert_eq!(result.subtasks.len(), 3);
        assert_eq!(result.subtasks[0].assigned_agent, AgentId::Data);
        assert_eq!(result.subtasks[1].assigned_agent, AgentId::Report);
        assert_eq!(result.subtasks[2].assigned_agent, AgentId::Comms);
        assert_eq!(result.subtasks[1].dependencies, vec![result.subtasks[0].id]);
        assert_eq!(result.complexity, Complexity::Medium);
    }

    #[test]
    fn parallel_groups_reflect_the_dependency_chain() {
        let result = decompose("put together a report from the database");
        assert_eq!(result.parallel_groups.len(), 2);
    }

    #[test]
    fn estimate_complexity_buckets_match_spec() {
        assert_eq!(estimate_complexity(1), Complexity::Low);
        assert_eq!(estimate_complexity(3), Complexity::Medium);
        assert_eq!(estimate_complexity(4), Complexity::High);
    }
}
