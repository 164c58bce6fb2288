//! External collaborator contract for the human-approval gate (spec §6).
//! This core has no concrete ticketing/Slack/email integration; callers
//! supply one.

use async_trait::async_trait;
use orch_core::Result;

/// Creates an approval request in an external system and returns its id.
/// The workflow executor treats this purely as a side-effecting handle —
/// it never polls it; resumption is driven externally via `resume_after_approval`.
#[async_trait]
pub trait ApprovalService: Send + Sync {
    async fn create_approval_request(
        &self,
        organization_id: &str,
        requester_id: &str,
        approver_id: &str,
        approval_type: &str,
        description: &str,
        payload: serde_json::Value,
    ) -> Result<String>;
}
