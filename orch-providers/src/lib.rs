//! ABOUTME: orch-providers implementation crate
//! ABOUTME: Model executor contract and provider selection (spec §4.9)

pub mod abstraction;
pub mod model_specifier;

pub use abstraction::{
    CallMetadata, ExecutionStatus, ModelExecutor, ModelRequest, ModelResponse,
    ProviderCapabilities, ProviderConfig, ProviderFactory, ProviderManager, ProviderRegistry,
    ToolCall, ToolCallResult, DEFAULT_PROVIDER_PRIORITY,
};
pub use model_specifier::ModelSpecifier;
