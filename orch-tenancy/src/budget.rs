//! Per-organization budget tracking and enforcement (spec §4.8).
//!
//! Each organization gets one row with a `current_spend` counter updated by
//! compare-and-swap, mirroring the atomic bookkeeping used for circuit
//! breaker stats in `orch-hooks` — the budget row is a single-writer-mostly
//! counter under concurrent readers, not a database transaction.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use dashmap::DashMap;
use orch_core::{Category, ModelTier, OrchError};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// `is_exhausted` threshold: remaining budget under 10 cents counts as exhausted.
pub const EXHAUSTION_THRESHOLD_CENTS: i64 = 10;

/// Cost in cents per 1K tokens for a model tier.
#[derive(Debug, Clone, Copy)]
pub struct TierCost {
    pub input_cents_per_1k: f64,
    pub output_cents_per_1k: f64,
}

impl ModelTier {
    /// Fixed per-1K-token pricing for this tier, in cents.
    #[must_use]
    pub fn cost(self) -> TierCost {
        match self {
            ModelTier::Opus => TierCost {
                input_cents_per_1k: 15.0,
                output_cents_per_1k: 75.0,
            },
            ModelTier::Sonnet => TierCost {
                input_cents_per_1k: 3.0,
                output_cents_per_1k: 15.0,
            },
            ModelTier::Haiku => TierCost {
                input_cents_per_1k: 0.25,
                output_cents_per_1k: 1.25,
            },
        }
    }
}

/// Default token counts assumed when a caller doesn't know them in advance.
const DEFAULT_INPUT_TOKENS: u64 = 1_000;
const DEFAULT_OUTPUT_TOKENS: u64 = 500;

/// Estimate the cost, in cents, of a call in the given category.
#[must_use]
pub fn estimate_cost(category: Category, in_tokens: Option<u64>, out_tokens: Option<u64>) -> i64 {
    let cost = category.tier().cost();
    let in_tokens = in_tokens.unwrap_or(DEFAULT_INPUT_TOKENS) as f64;
    let out_tokens = out_tokens.unwrap_or(DEFAULT_OUTPUT_TOKENS) as f64;

    let cents =
        (in_tokens / 1000.0) * cost.input_cents_per_1k + (out_tokens / 1000.0) * cost.output_cents_per_1k;

    cents.ceil() as i64
}

/// Outcome of a `reserve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveOutcome {
    pub allowed: bool,
    pub remaining_cents: i64,
}

struct BudgetRow {
    monthly_budget_cents: AtomicI64,
    /// -1 sentinel means "no budget set" (unlimited).
    current_spend_cents: AtomicI64,
    budget_reset_at: std::sync::RwLock<DateTime<Utc>>,
}

impl BudgetRow {
    fn new(monthly_budget_cents: Option<i64>) -> Self {
        Self {
            monthly_budget_cents: AtomicI64::new(monthly_budget_cents.unwrap_or(-1)),
            current_spend_cents: AtomicI64::new(0),
            budget_reset_at: std::sync::RwLock::new(Utc::now()),
        }
    }

    fn remaining(&self) -> i64 {
        let budget = self.monthly_budget_cents.load(Ordering::Acquire);
        if budget < 0 {
            return i64::MAX;
        }
        let spend = self.current_spend_cents.load(Ordering::Acquire);
        (budget - spend).max(0)
    }
}

/// Tracks per-organization monthly budgets and enforces spend limits.
///
/// Isolation is implicit in the map key: every operation is scoped to one
/// `organization_id` and never reads or writes another organization's row.
pub struct BudgetEnforcer {
    rows: DashMap<String, Arc<BudgetRow>>,
}

impl BudgetEnforcer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    fn row_for(&self, organization_id: &str) -> Arc<BudgetRow> {
        self.rows
            .entry(organization_id.to_string())
            .or_insert_with(|| Arc::new(BudgetRow::new(None)))
            .clone()
    }

    /// Set (or replace) an organization's monthly budget. `None` means unlimited.
    pub fn set_monthly_budget(&self, organization_id: &str, monthly_budget_cents: Option<i64>) {
        self.rows.insert(
            organization_id.to_string(),
            Arc::new(BudgetRow::new(monthly_budget_cents)),
        );
    }

    /// `max(0, monthly_budget − current_spend)`; `i64::MAX` stands in for ∞.
    #[must_use]
    pub fn get_remaining(&self, organization_id: &str) -> i64 {
        self.row_for(organization_id).remaining()
    }

    /// Compare-and-set increment of `current_spend`, retried once on conflict.
    pub fn reserve(&self, organization_id: &str, cents: i64) -> Result<ReserveOutcome, OrchError> {
        let row = self.row_for(organization_id);
        let budget = row.monthly_budget_cents.load(Ordering::Acquire);

        for _ in 0..2 {
            let current = row.current_spend_cents.load(Ordering::Acquire);

            if budget >= 0 {
                let remaining = (budget - current).max(0);
                if remaining < cents {
                    return Ok(ReserveOutcome {
                        allowed: false,
                        remaining_cents: remaining,
                    });
                }
            }

            let attempted = current + cents;
            if row
                .current_spend_cents
                .compare_exchange(current, attempted, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let remaining = if budget >= 0 {
                    (budget - attempted).max(0)
                } else {
                    i64::MAX
                };
                return Ok(ReserveOutcome {
                    allowed: true,
                    remaining_cents: remaining,
                });
            }
        }

        Err(OrchError::Internal {
            message: format!("reserve conflict for organization {organization_id} after retry"),
        })
    }

    /// Decrement `current_spend` on cancellation or underspend.
    pub fn refund(&self, organization_id: &str, cents: i64) {
        let row = self.row_for(organization_id);
        row.current_spend_cents.fetch_sub(cents, Ordering::AcqRel);
    }

    /// Final commit after execution. Callers are expected to have already
    /// reserved an estimate; this adjusts the row so the net of
    /// reserve + refund + update_spend equals the actual spend.
    pub fn update_spend(&self, organization_id: &str, actual_cents: i64) {
        let row = self.row_for(organization_id);
        row.current_spend_cents
            .store(actual_cents.max(0), Ordering::Release);
    }

    /// `remaining < 10 cents`.
    #[must_use]
    pub fn is_exhausted(remaining_cents: i64) -> bool {
        remaining_cents < EXHAUSTION_THRESHOLD_CENTS
    }

    /// Zero `current_spend` and roll `budget_reset_at` forward for any
    /// organization whose reset marker predates the current UTC month.
    /// Manual only — nothing in this crate calls it on a schedule.
    pub fn reset_monthly_budgets(&self) {
        let now = Utc::now();
        let this_month_start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now);

        for entry in self.rows.iter() {
            let row = entry.value();
            let mut reset_at = row.budget_reset_at.write().expect("budget_reset_at lock poisoned");
            if *reset_at < this_month_start {
                row.current_spend_cents.store(0, Ordering::Release);
                *reset_at = this_month_start;
            }
        }
    }
}

impl Default for BudgetEnforcer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_cost_uses_category_tier_pricing() {
        let cents = estimate_cost(Category::Ultrabrain, Some(1000), Some(1000));
        assert_eq!(cents, 15 + 75);
    }

    #[test]
    fn estimate_cost_rounds_up() {
        let cents = estimate_cost(Category::Quick, Some(1), Some(1));
        assert!(cents >= 1);
    }

    #[test]
    fn get_remaining_is_unlimited_without_a_budget() {
        let enforcer = BudgetEnforcer::new();
        assert_eq!(enforcer.get_remaining("org1"), i64::MAX);
    }

    #[test]
    fn reserve_denies_when_over_budget() {
        let enforcer = BudgetEnforcer::new();
        enforcer.set_monthly_budget("org1", Some(100));

        let outcome = enforcer.reserve("org1", 150).unwrap();
        assert!(!outcome.allowed);
        assert_eq!(outcome.remaining_cents, 100);
    }

    #[test]
    fn reserve_allows_and_decrements_remaining() {
        let enforcer = BudgetEnforcer::new();
        enforcer.set_monthly_budget("org1", Some(100));

        let outcome = enforcer.reserve("org1", 40).unwrap();
        assert!(outcome.allowed);
        assert_eq!(outcome.remaining_cents, 60);
    }

    #[test]
    fn refund_gives_cents_back() {
        let enforcer = BudgetEnforcer::new();
        enforcer.set_monthly_budget("org1", Some(100));

        enforcer.reserve("org1", 40).unwrap();
        enforcer.refund("org1", 40);
        assert_eq!(enforcer.get_remaining("org1"), 100);
    }

    #[test]
    fn update_spend_overwrites_to_actual() {
        let enforcer = BudgetEnforcer::new();
        enforcer.set_monthly_budget("org1", Some(100));

        enforcer.reserve("org1", 40).unwrap();
        enforcer.update_spend("org1", 25);
        assert_eq!(enforcer.get_remaining("org1"), 75);
    }

    #[test]
    fn is_exhausted_below_ten_cents() {
        assert!(BudgetEnforcer::is_exhausted(9));
        assert!(!BudgetEnforcer::is_exhausted(10));
    }

    #[test]
    fn organizations_are_isolated() {
        let enforcer = BudgetEnforcer::new();
        enforcer.set_monthly_budget("org1", Some(100));
        enforcer.set_monthly_budget("org2", Some(50));

        enforcer.reserve("org1", 90).unwrap();
        assert_eq!(enforcer.get_remaining("org1"), 10);
        assert_eq!(enforcer.get_remaining("org2"), 50);
    }

    #[test]
    fn reset_monthly_budgets_zeroes_stale_rows() {
        let enforcer = BudgetEnforcer::new();
        enforcer.set_monthly_budget("org1", Some(100));
        enforcer.reserve("org1", 60).unwrap();

        {
            let row = enforcer.row_for("org1");
            *row.budget_reset_at.write().unwrap() = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        }

        enforcer.reset_monthly_budgets();
        assert_eq!(enforcer.get_remaining("org1"), 100);
    }
}
