//! ABOUTME: orch-tenancy implementation crate
//! ABOUTME: Per-organization budget enforcement and spend tracking (spec §4.8)

pub mod budget;

pub use budget::{BudgetEnforcer, ReserveOutcome, TierCost, EXHAUSTION_THRESHOLD_CENTS};
