//! Organization isolation checks shared by the tool dispatch and budget layers.

use orch_core::OrchError;

/// Assert that a resource's owning organization matches the caller's
/// organization. Every cross-tenant boundary in the orchestration core
/// (budget accounts, provider connections, spawned sub-agent trees) goes
/// through this check rather than re-implementing the comparison inline.
pub fn require_same_organization(
    caller_organization_id: &str,
    resource_organization_id: &str,
) -> Result<(), OrchError> {
    if caller_organization_id == resource_organization_id {
        Ok(())
    } else {
        Err(OrchError::Tenancy {
            message: format!(
                "organization {caller_organization_id} may not access resource owned by {resource_organization_id}"
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_organization_is_allowed() {
        assert!(require_same_organization("org1", "org1").is_ok());
    }

    #[test]
    fn cross_organization_is_denied() {
        match require_same_organization("org1", "org2") {
            Err(OrchError::Tenancy { .. }) => {}
            other => panic!("expected Tenancy error, got {other:?}"),
        }
    }
}
