//! Topological layering via Kahn's algorithm (spec §4.2): repeatedly collect
//! subtasks whose dependencies are all already placed into an earlier
//! layer. A circular dependency is a bug, not a valid decomposition; it is
//! logged and the run fails safe by breaking out of the loop rather than
//! looping forever.

use orch_core::{AgentId, SubTask};
use std::collections::{HashMap, HashSet};
use tracing::error;

/// Compute layers of agent ids, one layer per round of Kahn's algorithm,
/// from a subtask set's dependency edges.
#[must_use]
pub fn parallel_groups(subtasks: &[SubTask]) -> Vec<Vec<AgentId>> {
    let mut indegree: HashMap<_, usize> = subtasks
        .iter()
        .map(|t| (t.id, t.dependencies.len()))
        .collect();
    let mut dependents: HashMap<_, Vec<_>> = HashMap::new();
    for task in subtasks {
        for dep in &task.dependencies {
            dependents.entry(*dep).or_insert_with(Vec::new).push(task.id);
        }
    }
    let by_id: HashMap<_, _> = subtasks.iter().map(|t| (t.id, t)).collect();

    let mut completed: HashSet<_> = HashSet::new();
    let mut groups = Vec::new();
    let mut guard = 0;

    while completed.len() < subtasks.len() {
        guard += 1;
        if guard > subtasks.len() + 1 {
            error!("task decomposer: circular dependency detected, breaking layering loop");
            break;
        }

        let ready: Vec<_> = subtasks
            .iter()
            .filter(|t| !completed.contains(&t.id) && indegree[&t.id] == 0)
            .map(|t| t.id)
            .collect();

        if ready.is_empty() {
            error!("task decomposer: no ready subtasks but some remain incomplete (cycle)");
            break;
        }

        let mut layer: Vec<AgentId> = ready.iter().map(|id| by_id[id].assigned_agent).collect();
        layer.sort_by_key(AgentId::priority);
        groups.push(layer);

        for id in &ready {
            completed.insert(*id);
            if let Some(children) = dependents.get(id) {
                for child in children {
                    if let Some(deg) = indegree.get_mut(child) {
                        *deg = deg.saturating_sub(1);
                    }
                }
            }
        }
    }

    groups
}
