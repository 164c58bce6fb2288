//! ABOUTME: orch-security implementation crate
//! ABOUTME: Audit trail and organization isolation checks for the orchestration core

pub mod audit;
pub mod isolation;

pub use audit::{AuditEntry, AuditEvent, AuditLogger};
pub use isolation::require_same_organization;
