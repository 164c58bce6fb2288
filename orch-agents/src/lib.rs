//! ABOUTME: Agent registry, coordinator, loop detector, and sub-agent spawner
//! ABOUTME: Implements spec §4.3 (coordinator), §4.4a (loop detector), §4.5 (spawner)

pub mod coordinator;
pub mod loop_detector;
pub mod registry;
pub mod spawner;

pub use coordinator::{
    aggregate, coordinate_parallel, coordinate_sequential, execute_with_agent,
    DEFAULT_MAX_PARALLEL_AGENTS,
};
pub use loop_detector::{
    hash_task, CheckResult, ExitSummary, LoopDetector, LoopInfo, LoopKind, TaskHash,
    MAX_DEPENDENCY_DEPTH, MAX_ITERATIONS,
};
pub use registry::{all_agents, get_agent};
pub use spawner::{
    SpawnConfig, SpawnOutcome, SpawnRecord, SpawnStatus, SubAgentSpawner, CHILD_TIMEOUT_MS,
    MIN_REQUIRED_BUDGET_TOKENS,
};
