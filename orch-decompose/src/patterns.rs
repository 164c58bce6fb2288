//! Pattern table (spec §4.2): each entry is a regex plus an ordered chain of
//! agents to run in sequence. Compiled once via `LazyLock`, mirroring the
//! router's keyword table and `orch-agents::registry`'s static-catalog
//! convention. First match wins.

use orch_core::AgentId;
use regex::Regex;
use std::sync::LazyLock;

/// One pattern-table entry: a regex and the ordered agent chain it implies.
pub struct PatternEntry {
    pub regex: Regex,
    pub chain: &'static [AgentId],
}

static PATTERN_TABLE: LazyLock<Vec<PatternEntry>> = LazyLock::new(|| {
    vec![
        PatternEntry {
            regex: Regex::new(r"(?i)send.*report").unwrap(),
            chain: &[AgentId::Data, AgentId::Report, AgentId::Comms],
        },
        PatternEntry {
            regex: Regex::new(r"(?i)report.*(send|deliver|share).*(team|slack|channel)").unwrap(),
            chain: &[AgentId::Data, AgentId::Report, AgentId::Comms],
        },
        PatternEntry {
            regex: Regex::new(r"(?i)report.*(from|using|based on).*(data|database|metrics)").unwrap(),
            chain: &[AgentId::Data, AgentId::Report],
        },
        PatternEntry {
            regex: Regex::new(r"(?i)analy(z|s)e.*(and|then).*report").unwrap(),
            chain: &[AgentId::Data, AgentId::Analytics, AgentId::Report],
        },
        PatternEntry {
            regex: Regex::new(r"(?i)research.*(and|then).*(summar|writ)").unwrap(),
            chain: &[AgentId::Search, AgentId::Report],
        },
        PatternEntry {
            regex: Regex::new(r"(?i)(needs?|require).*approval").unwrap(),
            chain: &[AgentId::Task, AgentId::Approval],
        },
        PatternEntry {
            regex: Regex::new(r"(?i)create.*task.*(and|then).*notify").unwrap(),
            chain: &[AgentId::Task, AgentId::Comms],
        },
    ]
});

/// First pattern whose regex matches `text`, if any.
#[must_use]
pub fn first_match(text: &str) -> Option<&'static [AgentId]> {
    PATTERN_TABLE
        .iter()
        .find(|entry| entry.regex.is_match(text))
        .map(|entry| entry.chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_report_matches_three_agent_chain() {
        let chain = first_match("create a weekly report with sales metrics from the database and send it to the team in Slack");
        assert_eq!(chain, Some([AgentId::Data, AgentId::Report, AgentId::Comms].as_slice()));
    }

    #[test]
    fn report_from_data_matches_two_agent_chain() {
        let chain = first_match("put together a report from the database");
        assert_eq!(chain, Some([AgentId::Data, AgentId::Report].as_slice()));
    }

    #[test]
    fn unrelated_text_matches_nothing() {
        assert!(first_match("what's the weather today").is_none());
    }

    #[test]
    fn first_match_wins_when_multiple_patterns_could_apply() {
        let chain = first_match("send a report based on database metrics to the team");
        assert_eq!(chain, Some([AgentId::Data, AgentId::Report, AgentId::Comms].as_slice()));
    }
}
