//! Budget-aware downgrade (spec §4.1, post-selection): moves a selection to
//! a cheaper category when the organization's remaining budget is low.
//! Downgrade only ever moves to a cheaper tier, never the reverse.

use orch_core::{Category, CategorySelection};

/// Complexity hint used both for tie-breaking category selection and for
/// the "low complexity but expensive category" downgrade rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Thresholds in cents, matching `orch_config::BudgetDowngradeConfig`
/// defaults (§4.1: $1.00 / $0.20).
#[derive(Debug, Clone, Copy)]
pub struct DowngradeThresholds {
    pub ultrabrain_floor_cents: i64,
    pub premium_floor_cents: i64,
}

impl Default for DowngradeThresholds {
    fn default() -> Self {
        Self {
            ultrabrain_floor_cents: 100,
            premium_floor_cents: 20,
        }
    }
}

/// Apply the downgrade rules in place, recording `base_category` and
/// `downgraded=true` when a move occurs. Downgrade never raises a category.
pub fn apply_budget_downgrade(
    selection: &mut CategorySelection,
    remaining_cents: i64,
    complexity: Complexity,
    thresholds: DowngradeThresholds,
) {
    let original = selection.category;

    let mut target = original;
    if remaining_cents < thresholds.ultrabrain_floor_cents && original == Category::Ultrabrain {
        target = Category::Quick;
    } else if remaining_cents < thresholds.premium_floor_cents
        && matches!(
            original,
            Category::VisualEngineering | Category::Writing | Category::Artistry
        )
    {
        target = Category::Quick;
    } else if complexity == Complexity::Low && is_expensive(original) {
        target = Category::Quick;
    }

    if target != original {
        selection.base_category = Some(original);
        selection.downgraded = true;
        selection.category = target;
    }
}

fn is_expensive(category: Category) -> bool {
    matches!(
        category,
        Category::Ultrabrain | Category::VisualEngineering | Category::Writing | Category::Artistry
    )
}
