//! ABOUTME: Hybrid keyword/LLM request router with caching and session bias
//! ABOUTME: Implements spec §4.1 — category + skill classification, budget-aware downgrade

pub mod cache;
pub mod downgrade;
pub mod fingerprint;
pub mod keyword_table;
pub mod llm_fallback;
pub mod session;
pub mod skills;

use cache::RouteCache;
pub use downgrade::{Complexity, DowngradeThresholds};
use orch_core::{
    Category, CategorySelection, ModelTier, Request, RoutingMethod, Skill, SkillMatch,
    SkillSelection,
};
use orch_providers::ModelExecutor;
pub use session::SessionStore;
use std::time::Duration;
use tracing::{debug, instrument};

/// Options controlling a single `route` call.
pub struct RouteOptions<'a> {
    pub min_confidence: f64,
    pub complexity_hint: Option<Complexity>,
    pub remaining_budget_cents: i64,
    pub downgrade_thresholds: DowngradeThresholds,
    /// Present only when the caller has an LLM key configured; `None`
    /// disables the fallback path entirely.
    pub llm_executor: Option<&'a dyn ModelExecutor>,
    /// `false` once the caller's time budget for this request is spent;
    /// disables the fallback path without needing a key check.
    pub time_budget_available: bool,
}

impl Default for RouteOptions<'_> {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            complexity_hint: None,
            remaining_budget_cents: i64::MAX,
            downgrade_thresholds: DowngradeThresholds::default(),
            llm_executor: None,
            time_budget_available: true,
        }
    }
}

fn confidence_from_match_count(count: usize) -> f64 {
    match count {
        0 => 0.4,
        1 => 0.65,
        2 => 0.8,
        _ => 0.9,
    }
}

fn pick_category(
    category_scores: &[(Category, f64)],
    complexity_hint: Option<Complexity>,
) -> Category {
    let best = category_scores
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    match best {
        Some((category, _)) => *category,
        None => match complexity_hint {
            Some(Complexity::Low) => Category::Quick,
            Some(Complexity::High) => Category::Ultrabrain,
            _ => Category::UnspecifiedLow,
        },
    }
}

fn build_skill_selection(skill_scores: &[(Skill, f64)]) -> SkillSelection {
    let matches: Vec<SkillMatch> = skill_scores
        .iter()
        .map(|(skill, score)| SkillMatch {
            skill: *skill,
            score: *score,
            matched_keywords: Vec::new(),
            from_dependency: false,
        })
        .collect();
    let expanded = skills::expand_dependencies(matches);
    SkillSelection { skills: expanded }
}

/// Apply the declared `(category, skill)` conflict table over a selection,
/// mutating both in place.
fn apply_conflicts(category: &mut Category, skills: &mut SkillSelection) {
    let mut warnings = Vec::new();
    let candidate_skills: Vec<Skill> = skills.skills.iter().map(|m| m.skill).collect();
    for skill in candidate_skills {
        if let Some(resolution) = skills::resolve_conflict(*category, skill) {
            match resolution {
                skills::ConflictResolution::UpgradeCategory(new_category) => {
                    *category = new_category;
                }
                skills::ConflictResolution::RemoveSkill(removed) => {
                    skills.skills.retain(|m| m.skill != removed);
                }
                skills::ConflictResolution::Warn(message) => warnings.push(message),
            }
        }
    }
    for warning in warnings {
        debug!(%warning, "router conflict warning");
    }
}

/// Hybrid category + skill classifier (spec §4.1). Never errors — always
/// yields a category, falling back through keyword scoring, complexity
/// hints, and (best-effort) the LLM classifier.
#[instrument(skip(request, options, cache, sessions), fields(session = %request.session_id))]
#[allow(clippy::too_many_arguments)]
pub async fn route(
    request: &Request,
    options: RouteOptions<'_>,
    cache: &RouteCache,
    sessions: &SessionStore,
) -> (CategorySelection, SkillSelection) {
    let fp = fingerprint::fingerprint(&request.user_request);
    if let Some(cached) = cache.get(&fp) {
        debug!(fingerprint = %fp, "route cache hit");
        return cached;
    }

    let scan = keyword_table::scan(&request.user_request);
    let mut category = pick_category(&scan.category_scores, options.complexity_hint);
    let mut confidence = confidence_from_match_count(scan.matched_terms.len());
    let mut method = if scan.matched_terms.is_empty() {
        RoutingMethod::ComplexityFallback
    } else {
        RoutingMethod::KeywordFast
    };

    let mut skill_selection = build_skill_selection(&scan.skill_scores);
    apply_conflicts(&mut category, &mut skill_selection);

    if let Some((combo_category, boost)) = skills::combination_category(&skill_selection) {
        if confidence < 0.85 {
            category = combo_category;
            confidence = (confidence + boost).min(1.0);
            method = RoutingMethod::KeywordLlmHybrid;
        }
    }

    // Session follow-up bias.
    if session::is_follow_up(&request.user_request) {
        if let Some(recent) = sessions.recent_category(&request.session_id) {
            if recent == category {
                confidence = (confidence + 0.1).min(1.0);
            }
        }
    }

    // LLM fallback: only when confidence is weak and the caller has budget
    // and an executor to spend it on.
    if confidence < options.min_confidence && options.time_budget_available {
        if let Some(executor) = options.llm_executor {
            if let Some(result) = llm_fallback::classify(
                executor,
                &request.user_request,
                &request.session_id,
                &request.organization_id,
                &request.user_id,
            )
            .await
            {
                category = result.category;
                confidence = 0.95;
                method = RoutingMethod::LlmFallback;
                skill_selection = build_skill_selection(
                    &result.skills.iter().map(|s| (*s, 1.0)).collect::<Vec<_>>(),
                );
            }
        }
    }

    let mut selection = CategorySelection {
        category,
        confidence,
        method,
        matched_keywords: scan.matched_terms,
        downgraded: false,
        base_category: None,
    };

    downgrade::apply_budget_downgrade(
        &mut selection,
        options.remaining_budget_cents,
        options.complexity_hint.unwrap_or(Complexity::Medium),
        options.downgrade_thresholds,
    );

    sessions.record(&request.session_id, selection.category, Vec::new());
    cache.put(fp, selection.clone(), skill_selection.clone());

    (selection, skill_selection)
}

/// Default route-cache TTL per spec §6: 86,400s (24h).
#[must_use]
pub fn default_route_cache() -> RouteCache {
    RouteCache::new(Duration::from_secs(86_400))
}

/// Default session-context cache TTL per spec §6: 300s.
#[must_use]
pub fn default_session_store() -> SessionStore {
    SessionStore::new(Duration::from_secs(300))
}

/// Fixed category → model tier mapping, re-exported for callers that only
/// need the tier and not the full selection machinery.
#[must_use]
pub fn tier_for(category: Category) -> ModelTier {
    category.tier()
}
