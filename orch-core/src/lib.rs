//! ABOUTME: Core types, error handling, and execution context for the orchestration core
//! ABOUTME: Foundation layer shared by the router, decomposer, agents, workflows, and tools crates

pub mod error;
pub mod execution_context;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{OrchError, Result};
pub use execution_context::ExecutionContext;
pub use types::{
    Agent, AgentExecutionResult, AgentId, Category, CategorySelection, ComponentId, ModelTier,
    Request, RoutingMethod, Skill, SkillMatch, SkillSelection, SubTask, SubTaskId, SubTaskStatus,
};