//! ABOUTME: Shared mock collaborators and fixture builders for cross-crate tests
//! ABOUTME: Dev-dependency only; never consumed by non-test code

pub mod fixtures;
pub mod mock_executor;
pub mod mock_provider;

pub use fixtures::{root_context, root_context_at_depth, RequestBuilder};
pub use mock_executor::{MockModelExecutor, ScriptedReply};
pub use mock_provider::MockProviderClient;
