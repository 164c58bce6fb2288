//! ABOUTME: Declarative DAG workflow executor with conditional edges and approval pauses
//! ABOUTME: Implements spec §4.6

pub mod approval;
pub mod condition;
pub mod executor;
pub mod types;

pub use approval::ApprovalService;
pub use executor::{execute_workflow, resume_after_approval};
pub use types::{
    NodeId, NodeResult, NodeStatus, WorkflowContext, WorkflowDefinition, WorkflowEdge,
    WorkflowExecutionResult, WorkflowNode, WorkflowStatus, END, START,
};
