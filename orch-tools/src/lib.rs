//! ABOUTME: Namespaced multi-provider tool registry, connection layer, and dispatcher
//! ABOUTME: Implements spec §4.7

pub mod cache;
pub mod client;
pub mod descriptor;
pub mod dispatch;
pub mod idempotency;
pub mod naming;

pub use client::{ClientPool, ProviderClient, ToolCallContext, ToolInvocationOutcome};
pub use descriptor::{OAuthToken, ProviderConnection, ToolDescriptor};
pub use dispatch::ToolDispatcher;
pub use idempotency::is_idempotent_success;
pub use naming::{parse_full_name, resolve_alias, ParsedToolName};
