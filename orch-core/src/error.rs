//! ABOUTME: Error types and handling for the orchestration core
//! ABOUTME: Provides OrchError enum and Result type alias shared by every subsystem

use thiserror::Error;

/// Comprehensive error enum for all orchestration-core operations.
///
/// Subsystems map their domain errors onto one of these variants instead of
/// inventing a parallel error type per crate, mirroring the teacher's single
/// cross-cutting error enum.
#[derive(Debug, Error)]
pub enum OrchError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("budget exhausted: {message}")]
    BudgetExhausted { message: String },

    #[error("budget insufficient for category: {message}")]
    BudgetInsufficientForCategory { message: String },

    #[error("routing error: {message}")]
    Routing { message: String },

    #[error("decomposition error: {message}")]
    Decomposition { message: String },

    #[error("depth exceeded: {message}")]
    DepthExceeded { message: String },

    #[error("hard depth exceeded: {message}")]
    HardDepthExceeded { message: String },

    #[error("rate limited, retry after {retry_after_ms}ms: {message}")]
    RateLimited { message: String, retry_after_ms: u64 },

    #[error("timeout: {message}")]
    Timeout { message: String },

    #[error("circuit open for provider {provider}")]
    CircuitOpen { provider: String },

    #[error("tool not found: {full_name}")]
    ToolNotFound { full_name: String },

    #[error("tool access denied: {full_name} for organization {organization_id}")]
    ToolAccessDenied {
        full_name: String,
        organization_id: String,
    },

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("loop detected: {message}")]
    LoopDetected { message: String },

    #[error("dependencies not met")]
    DependenciesNotMet,

    #[error("workflow not found: {name}")]
    WorkflowNotFound { name: String },

    #[error("tenancy error: {message}")]
    Tenancy { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Convenience Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, OrchError>;
