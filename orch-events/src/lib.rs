// ABOUTME: Event bus and in-process event system for the orchestration core
// ABOUTME: Provides UniversalEvent format, FlowController, and EventBus with backpressure

//! # Orchestrator Events
//!
//! This crate provides the in-process event system used to observe router,
//! orchestrator, and workflow activity:
//! - **UniversalEvent**: a language-agnostic event envelope
//! - **FlowController**: rate limiting and backpressure
//! - **EventBus**: async pub/sub with pattern matching
//!
//! ## Example
//!
//! ```rust,no_run
//! use orch_events::{EventBus, UniversalEvent, Language};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bus = EventBus::new();
//!
//!     let mut receiver = bus.subscribe("router.*").await?;
//!
//!     let event = UniversalEvent::new(
//!         "router.category_selected",
//!         serde_json::json!({"category": "quick"}),
//!         Language::Rust,
//!     );
//!     bus.publish(event).await?;
//!
//!     if let Some(event) = receiver.recv().await {
//!         println!("Received: {:?}", event);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod flow_controller;
pub mod handler;
pub mod metrics;
pub mod overflow;
pub mod pattern;
pub mod universal_event;

pub use bus::{EventBus, EventBusBuilder};
pub use flow_controller::{BackpressureNotification, FlowController};
pub use handler::{AsyncEventHandler, EventHandler};
pub use metrics::{EventMetrics, MetricsCollector};
pub use overflow::{OverflowHandler, OverflowStrategy};
pub use pattern::{EventPattern, PatternMatcher};
pub use universal_event::{EventMetadata, Language, UniversalEvent};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AsyncEventHandler, BackpressureNotification, EventBus, EventBusBuilder, EventHandler,
        EventMetadata, EventPattern, FlowController, Language, OverflowStrategy, UniversalEvent,
    };
}
