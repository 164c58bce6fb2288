//! ABOUTME: Top-level multi-agent orchestration entry point and workflow delegation
//! ABOUTME: Implements spec §4.4 (orchestrate) and the §6 external interfaces

pub mod orchestrate;
pub mod types;
pub mod workflow_entry;

pub use orchestrate::orchestrate;
pub use types::{ExecutionMode, OrchestrateOptions, OrchestrationResult, OrchestrationStatus};
pub use workflow_entry::{execute_workflow, resume_workflow_after_approval, WorkflowRegistry};
