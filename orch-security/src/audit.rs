//! Audit logging for security-relevant orchestrator events.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Audit event types for the orchestration core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuditEvent {
    /// A tool dispatch was granted for an organization
    ToolAccessGranted {
        organization_id: String,
        full_name: String,
    },

    /// A tool dispatch was denied, e.g. cross-organization access attempt
    ToolAccessDenied {
        organization_id: String,
        full_name: String,
        reason: String,
    },

    /// A request or sub-task exceeded its organization's budget
    BudgetExhausted {
        organization_id: String,
        requested_tokens: u64,
        remaining_tokens: i64,
    },

    /// A provider's circuit breaker opened
    CircuitOpened { provider: String, failures: u32 },

    /// A sub-agent spawn attempt violated the depth or rate guard
    SpawnGuardTripped {
        organization_id: String,
        reason: String,
        depth: u8,
    },

    /// Cross-tenant access was attempted and rejected
    TenantIsolationViolation {
        organization_id: String,
        attempted_organization_id: String,
        resource: String,
    },

    /// Configuration changed at runtime
    ConfigurationChanged {
        changed_by: String,
        changes: HashMap<String, String>,
    },
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: uuid::Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
    pub session_id: Option<String>,
    pub correlation_id: Option<String>,
}

impl AuditEntry {
    pub fn new(event: AuditEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
            session_id: None,
            correlation_id: None,
        }
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Async audit logger: callers push events onto an unbounded channel, a
/// background task fans them out to structured tracing.
pub struct AuditLogger {
    sender: mpsc::UnboundedSender<AuditEntry>,
}

impl AuditLogger {
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<AuditEntry>();

        tokio::spawn(async move {
            while let Some(entry) = receiver.recv().await {
                match &entry.event {
                    AuditEvent::ToolAccessGranted {
                        organization_id,
                        full_name,
                    } => {
                        info!(
                            audit = true,
                            event_type = "tool_access_granted",
                            organization_id = %organization_id,
                            tool = %full_name,
                            "tool access granted"
                        );
                    }
                    AuditEvent::ToolAccessDenied {
                        organization_id,
                        full_name,
                        reason,
                    } => {
                        info!(
                            audit = true,
                            event_type = "tool_access_denied",
                            organization_id = %organization_id,
                            tool = %full_name,
                            reason = %reason,
                            "tool access denied"
                        );
                    }
                    AuditEvent::BudgetExhausted {
                        organization_id,
                        requested_tokens,
                        remaining_tokens,
                    } => {
                        info!(
                            audit = true,
                            event_type = "budget_exhausted",
                            organization_id = %organization_id,
                            requested_tokens = requested_tokens,
                            remaining_tokens = remaining_tokens,
                            "budget exhausted"
                        );
                    }
                    AuditEvent::CircuitOpened { provider, failures } => {
                        info!(
                            audit = true,
                            event_type = "circuit_opened",
                            provider = %provider,
                            failures = failures,
                            "provider circuit opened"
                        );
                    }
                    AuditEvent::SpawnGuardTripped {
                        organization_id,
                        reason,
                        depth,
                    } => {
                        info!(
                            audit = true,
                            event_type = "spawn_guard_tripped",
                            organization_id = %organization_id,
                            reason = %reason,
                            depth = depth,
                            "sub-agent spawn guard tripped"
                        );
                    }
                    AuditEvent::TenantIsolationViolation {
                        organization_id,
                        attempted_organization_id,
                        resource,
                    } => {
                        info!(
                            audit = true,
                            event_type = "tenant_isolation_violation",
                            organization_id = %organization_id,
                            attempted_organization_id = %attempted_organization_id,
                            resource = %resource,
                            "tenant isolation violation"
                        );
                    }
                    AuditEvent::ConfigurationChanged { changed_by, .. } => {
                        info!(
                            audit = true,
                            event_type = "configuration_changed",
                            changed_by = %changed_by,
                            "configuration changed"
                        );
                    }
                }
            }
        });

        Self { sender }
    }

    /// Log an audit event
    pub fn log(&self, event: AuditEvent) -> Result<()> {
        let entry = AuditEntry::new(event);
        self.sender.send(entry).map_err(|e| {
            error!("failed to send audit entry: {}", e);
            anyhow::anyhow!("audit logging failed")
        })
    }

    /// Log an audit event with session/correlation context
    pub fn log_with_context(
        &self,
        event: AuditEvent,
        session_id: Option<String>,
        correlation_id: Option<String>,
    ) -> Result<()> {
        let mut entry = AuditEntry::new(event);
        if let Some(id) = session_id {
            entry = entry.with_session_id(id);
        }
        if let Some(id) = correlation_id {
            entry = entry.with_correlation_id(id);
        }
        self.sender.send(entry).map_err(|e| {
            error!("failed to send audit entry: {}", e);
            anyhow::anyhow!("audit logging failed")
        })
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
