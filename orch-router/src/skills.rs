//! Skill selection machinery (spec §4.1): dependency closure over a static
//! `requires`/`suggests` graph, skill-combination confidence boosts that can
//! override a weak category, and declared `(category, skill)` conflict
//! resolution.

use orch_core::{Category, Skill, SkillMatch, SkillSelection};

/// Fixed priority order used to sort the final selection.
#[must_use]
pub fn skill_priority(skill: Skill) -> u8 {
    match skill {
        Skill::GitMaster => 0,
        Skill::McpIntegration => 1,
        Skill::ApiIntegration => 2,
        Skill::DataAnalysis => 3,
        Skill::FrontendUiUx => 4,
        Skill::Playwright => 5,
        Skill::DocumentWriting => 6,
        Skill::ImageGeneration => 7,
    }
}

/// `requires`: a skill that must always accompany this one (added with
/// `from_dependency=true`).
#[must_use]
fn requires(skill: Skill) -> &'static [Skill] {
    match skill {
        Skill::Playwright => &[Skill::FrontendUiUx],
        _ => &[],
    }
}

/// `suggests`: a skill added only if not already selected.
#[must_use]
fn suggests(skill: Skill) -> &'static [Skill] {
    match skill {
        Skill::DataAnalysis => &[Skill::ApiIntegration],
        _ => &[],
    }
}

/// Expand a set of matched skills with their `requires`/`suggests` closure.
/// `requires` always wins even if previously absent; `suggests` only adds a
/// skill that isn't already present (from any source).
#[must_use]
pub fn expand_dependencies(mut selection: Vec<SkillMatch>) -> Vec<SkillMatch> {
    let mut seen: Vec<Skill> = selection.iter().map(|m| m.skill).collect();

    // requires: closure to fixpoint, since a required skill could itself
    // require another (no cycles in this closed catalog, but guard anyway).
    let mut frontier: Vec<Skill> = seen.clone();
    let mut guard = 0;
    while !frontier.is_empty() && guard < 16 {
        guard += 1;
        let mut next_frontier = Vec::new();
        for skill in &frontier {
            for &req in requires(*skill) {
                if !seen.contains(&req) {
                    seen.push(req);
                    selection.push(SkillMatch {
                        skill: req,
                        score: 0.5,
                        matched_keywords: Vec::new(),
                        from_dependency: true,
                    });
                    next_frontier.push(req);
                }
            }
        }
        frontier = next_frontier;
    }

    let base_skills: Vec<Skill> = selection.iter().map(|m| m.skill).collect();
    for skill in base_skills {
        for &sug in suggests(skill) {
            if !seen.contains(&sug) {
                seen.push(sug);
                selection.push(SkillMatch {
                    skill: sug,
                    score: 0.3,
                    matched_keywords: Vec::new(),
                    from_dependency: true,
                });
            }
        }
    }

    selection.sort_by_key(|m| skill_priority(m.skill));
    selection
}

/// Skill-combination boost table: a declared set of skills implies an
/// emergent category with a confidence boost that may override a weak
/// category pick.
#[must_use]
pub fn combination_category(skills: &SkillSelection) -> Option<(Category, f64)> {
    if skills.contains(Skill::FrontendUiUx) && skills.contains(Skill::Playwright) {
        return Some((Category::VisualEngineering, 0.15));
    }
    None
}

/// Declared `(category, skill)` conflicts: resolution action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolution {
    UpgradeCategory(Category),
    RemoveSkill(Skill),
    Warn(String),
}

/// Look up how to resolve a declared category/skill conflict, if any.
#[must_use]
pub fn resolve_conflict(category: Category, skill: Skill) -> Option<ConflictResolution> {
    match (category, skill) {
        // A "quick" request that also asks for heavyweight data analysis
        // should not stay quick — the tier mapping would under-provision it.
        (Category::Quick, Skill::DataAnalysis) => {
            Some(ConflictResolution::UpgradeCategory(Category::UnspecifiedHigh))
        }
        // Image generation has no place in a pure writing request; drop it
        // rather than silently mixing modalities.
        (Category::Writing, Skill::ImageGeneration) => {
            Some(ConflictResolution::RemoveSkill(Skill::ImageGeneration))
        }
        _ => None,
    }
}
