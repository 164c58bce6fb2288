// ABOUTME: EventBus implementation with async pub/sub and pattern matching
// ABOUTME: Provides high-performance event routing with flow control integration

use crate::flow_controller::{FlowController, FlowControllerConfig};
use crate::handler::AsyncEventHandler;
use crate::pattern::{EventPattern, PatternMatcher};
use crate::universal_event::UniversalEvent;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Event bus for publishing and subscribing to events.
///
/// Persistence of published events is the host application's concern
/// (spec §1 excludes persistence schema from this core's scope); this bus
/// only routes events in-process.
pub struct EventBus {
    /// Pattern-based subscriptions
    subscriptions: Arc<DashMap<String, Vec<Subscription>>>,
    /// Flow controller for backpressure
    flow_controller: Arc<FlowController>,
    /// Broadcast channel for all events
    broadcast_tx: broadcast::Sender<UniversalEvent>,
    /// Pattern matcher
    pattern_matcher: PatternMatcher,
}

/// Individual subscription
#[derive(Debug)]
struct Subscription {
    #[allow(dead_code)]
    id: Uuid,
    #[allow(dead_code)]
    pattern: EventPattern,
    sender: mpsc::UnboundedSender<UniversalEvent>,
}

impl EventBus {
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::with_config(FlowControllerConfig::default())
    }

    /// Create an event bus with custom flow control configuration
    pub fn with_config(config: FlowControllerConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(10000);

        Self {
            subscriptions: Arc::new(DashMap::new()),
            flow_controller: Arc::new(FlowController::new(config)),
            broadcast_tx,
            pattern_matcher: PatternMatcher::new(),
        }
    }

    /// Publish an event to the bus
    pub async fn publish(&self, event: UniversalEvent) -> Result<(), PublishError> {
        if !self.flow_controller.can_process(&event).await {
            return Err(PublishError::RateLimited);
        }

        let overflow_result = self.flow_controller.handle_overflow(event.clone()).await;
        match overflow_result {
            crate::overflow::OverflowResult::Accepted => {}
            crate::overflow::OverflowResult::Dropped { reason } => {
                return Err(PublishError::Dropped { reason });
            }
            crate::overflow::OverflowResult::Rejected { reason } => {
                return Err(PublishError::Rejected { reason });
            }
            crate::overflow::OverflowResult::Blocked => {
                return Err(PublishError::Blocked);
            }
        }

        if self.broadcast_tx.send(event.clone()).is_err() {
            debug!("No broadcast receivers for event: {}", event.event_type);
        }

        self.route_event(event).await;

        Ok(())
    }

    /// Subscribe to events matching a pattern
    pub async fn subscribe(
        &self,
        pattern: &str,
    ) -> Result<mpsc::UnboundedReceiver<UniversalEvent>, SubscribeError> {
        let event_pattern = EventPattern::new(pattern)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let subscription = Subscription {
            id: Uuid::new_v4(),
            pattern: event_pattern.clone(),
            sender: tx,
        };

        self.subscriptions
            .entry(pattern.to_string())
            .or_default()
            .push(subscription);

        info!("New subscription created for pattern: {}", pattern);
        Ok(rx)
    }

    /// Subscribe with a custom event handler
    pub async fn subscribe_with_handler<H>(
        &self,
        pattern: &str,
        handler: H,
    ) -> Result<Uuid, SubscribeError>
    where
        H: AsyncEventHandler + Send + 'static,
    {
        let mut receiver = self.subscribe(pattern).await?;
        let subscription_id = Uuid::new_v4();

        let handler = Arc::new(handler);
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if let Err(e) = handler.handle_event(event).await {
                    error!("Event handler error: {}", e);
                }
            }
        });

        Ok(subscription_id)
    }

    /// Get a broadcast receiver for all events
    pub fn subscribe_all(&self) -> broadcast::Receiver<UniversalEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Route an event to matching subscriptions
    async fn route_event(&self, event: UniversalEvent) {
        let mut matched_count = 0;

        for subscription_entry in self.subscriptions.iter() {
            let pattern = subscription_entry.key();
            let subscriptions = subscription_entry.value();

            if self.pattern_matcher.matches(&event.event_type, pattern) {
                for subscription in subscriptions {
                    if subscription.sender.send(event.clone()).is_err() {
                        debug!("Subscription receiver dropped for pattern: {}", pattern);
                    } else {
                        matched_count += 1;
                    }
                }
            }
        }

        if matched_count == 0 {
            debug!("No subscribers for event: {}", event.event_type);
        } else {
            debug!(
                "Event {} routed to {} subscribers",
                event.event_type, matched_count
            );
        }
    }

    /// Get current buffer size
    pub fn buffer_size(&self) -> usize {
        self.flow_controller.buffer_size()
    }

    /// Get flow statistics
    pub fn get_stats(&self) -> crate::flow_controller::FlowStats {
        self.flow_controller.get_stats()
    }

    /// Get number of active subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .iter()
            .map(|entry| entry.value().len())
            .sum()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for EventBus
pub struct EventBusBuilder {
    flow_config: FlowControllerConfig,
    broadcast_capacity: usize,
}

impl EventBusBuilder {
    pub fn new() -> Self {
        Self {
            flow_config: FlowControllerConfig::default(),
            broadcast_capacity: 10000,
        }
    }

    pub fn with_flow_config(mut self, config: FlowControllerConfig) -> Self {
        self.flow_config = config;
        self
    }

    pub fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    pub fn build(self) -> EventBus {
        let (broadcast_tx, _) = broadcast::channel(self.broadcast_capacity);
        EventBus {
            subscriptions: Arc::new(DashMap::new()),
            flow_controller: Arc::new(FlowController::new(self.flow_config)),
            broadcast_tx,
            pattern_matcher: PatternMatcher::new(),
        }
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when publishing events
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event was rate limited")]
    RateLimited,
    #[error("Event was dropped: {reason}")]
    Dropped { reason: String },
    #[error("Event was rejected: {reason}")]
    Rejected { reason: String },
    #[error("Publisher is blocked")]
    Blocked,
}

/// Errors that can occur when subscribing
#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Subscription limit reached")]
    LimitReached,
}

impl From<String> for SubscribeError {
    fn from(error: String) -> Self {
        SubscribeError::InvalidPattern(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universal_event::{Language, UniversalEvent};
    use serde_json::Value;

    fn create_test_event(event_type: &str) -> UniversalEvent {
        UniversalEvent::new(event_type, Value::Null, Language::Rust)
    }

    #[tokio::test]
    async fn test_basic_pub_sub() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe("test.*").await.unwrap();

        let event = create_test_event("test.event");
        bus.publish(event.clone()).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event_type, "test.event");
    }

    #[tokio::test]
    async fn test_pattern_matching() {
        let bus = EventBus::new();
        let mut system_receiver = bus.subscribe("system.*").await.unwrap();
        let mut agent_receiver = bus.subscribe("agent.*").await.unwrap();

        let system_event = create_test_event("system.startup");
        bus.publish(system_event).await.unwrap();

        let agent_event = create_test_event("agent.created");
        bus.publish(agent_event).await.unwrap();

        let received = system_receiver.recv().await.unwrap();
        assert_eq!(received.event_type, "system.startup");

        let received = agent_receiver.recv().await.unwrap();
        assert_eq!(received.event_type, "agent.created");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut receiver1 = bus.subscribe("multi.*").await.unwrap();
        let mut receiver2 = bus.subscribe("multi.*").await.unwrap();

        let event = create_test_event("multi.test");
        bus.publish(event).await.unwrap();

        let received1 = receiver1.recv().await.unwrap();
        let received2 = receiver2.recv().await.unwrap();

        assert_eq!(received1.event_type, "multi.test");
        assert_eq!(received2.event_type, "multi.test");
    }

    #[tokio::test]
    async fn test_statistics() {
        let bus = EventBus::new();

        let event = create_test_event("stats.test");
        bus.publish(event).await.unwrap();

        let stats = bus.get_stats();
        assert!(stats.events_processed > 0);
    }

    #[tokio::test]
    async fn test_builder() {
        let bus = EventBusBuilder::new().with_broadcast_capacity(5000).build();

        assert_eq!(bus.subscription_count(), 0);
    }
}
