//! ABOUTME: Configuration validation logic for the orchestration core
//! ABOUTME: Validates limits, timeouts, and circuit breaker thresholds are internally consistent

use crate::OrchestratorConfig;
use orch_core::OrchError;
use tracing::debug;

/// Validate the entire configuration, matching the spec's invariants
/// (e.g. hard spawn depth, non-zero timeouts, sane confidence threshold).
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), OrchError> {
    debug!("starting orchestrator configuration validation");

    if !(0.0..=1.0).contains(&config.router.min_confidence) {
        return Err(OrchError::Configuration {
            message: "router.min_confidence must be in [0,1]".to_string(),
        });
    }

    if config.limits.max_delegation_depth == 0 {
        return Err(OrchError::Configuration {
            message: "limits.max_delegation_depth must be at least 1".to_string(),
        });
    }

    if config.limits.max_delegation_depth > config.limits.hard_spawn_depth {
        return Err(OrchError::Configuration {
            message: "limits.max_delegation_depth must not exceed limits.hard_spawn_depth"
                .to_string(),
        });
    }

    if config.limits.hard_spawn_depth == 0 {
        return Err(OrchError::Configuration {
            message: "limits.hard_spawn_depth must be at least 1".to_string(),
        });
    }

    if config.limits.max_parallel_agents == 0 {
        return Err(OrchError::Configuration {
            message: "limits.max_parallel_agents must be at least 1".to_string(),
        });
    }

    if config.limits.default_timeout_ms == 0 || config.limits.child_timeout_ms == 0 {
        return Err(OrchError::Configuration {
            message: "timeouts must be greater than zero".to_string(),
        });
    }

    if config.circuit_breaker.failure_threshold == 0
        || config.circuit_breaker.success_threshold == 0
    {
        return Err(OrchError::Configuration {
            message: "circuit breaker thresholds must be greater than zero".to_string(),
        });
    }

    debug!("orchestrator configuration validation completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut config = OrchestratorConfig::default();
        config.router.min_confidence = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_delegation_depth_above_hard_limit() {
        let mut config = OrchestratorConfig::default();
        config.limits.max_delegation_depth = 9;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&OrchestratorConfig::default()).is_ok());
    }
}
