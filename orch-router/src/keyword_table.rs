//! Unified keyword table (spec §4.1): a single pass over the request text
//! scores every category and skill at once, instead of running one scan per
//! category as a naive port of the source would. Built once via `LazyLock`,
//! matching `orch-agents::registry`'s static-catalog convention.

use orch_core::{Category, Skill};
use std::sync::LazyLock;

/// One entry in the unified keyword table: a single term that contributes
/// weight to zero or more categories and zero or more skills.
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    pub term: &'static str,
    pub categories: &'static [Category],
    pub skills: &'static [Skill],
    pub weight: f64,
    pub language: Language,
}

/// Language tag for a keyword entry; `Any` matches regardless of the
/// request's detected language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Any,
    En,
    Ko,
}

use Category::{Artistry, Quick, Ultrabrain, UnspecifiedHigh, VisualEngineering, Writing};
use Skill::{ApiIntegration, DataAnalysis, DocumentWriting, FrontendUiUx, GitMaster, McpIntegration, Playwright};

/// The fixed keyword catalog. Terms are matched case-insensitively as
/// whole-word substrings of the normalized request text.
pub static KEYWORD_TABLE: LazyLock<Vec<KeywordEntry>> = LazyLock::new(|| {
    vec![
        // quick / trivial edits
        KeywordEntry { term: "typo", categories: &[Quick], skills: &[], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "fix typo", categories: &[Quick], skills: &[], weight: 1.5, language: Language::Any },
        KeywordEntry { term: "rename", categories: &[Quick], skills: &[], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "small change", categories: &[Quick], skills: &[], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "quick fix", categories: &[Quick], skills: &[], weight: 1.2, language: Language::Any },
        // ultrabrain: hard reasoning / architecture
        KeywordEntry { term: "architecture", categories: &[Ultrabrain], skills: &[], weight: 1.2, language: Language::Any },
        KeywordEntry { term: "algorithm", categories: &[Ultrabrain], skills: &[], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "refactor", categories: &[Ultrabrain], skills: &[GitMaster], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "complex", categories: &[Ultrabrain], skills: &[], weight: 0.8, language: Language::Any },
        KeywordEntry { term: "design a system", categories: &[Ultrabrain], skills: &[], weight: 1.5, language: Language::Any },
        KeywordEntry { term: "optimize performance", categories: &[Ultrabrain], skills: &[], weight: 1.2, language: Language::Any },
        // visual engineering (frontend + browser testing)
        KeywordEntry { term: "frontend", categories: &[VisualEngineering], skills: &[FrontendUiUx], weight: 1.2, language: Language::Any },
        KeywordEntry { term: "ui", categories: &[VisualEngineering], skills: &[FrontendUiUx], weight: 0.8, language: Language::Any },
        KeywordEntry { term: "css", categories: &[VisualEngineering], skills: &[FrontendUiUx], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "component", categories: &[VisualEngineering], skills: &[FrontendUiUx], weight: 0.8, language: Language::Any },
        KeywordEntry { term: "browser test", categories: &[VisualEngineering], skills: &[Playwright], weight: 1.4, language: Language::Any },
        KeywordEntry { term: "e2e test", categories: &[VisualEngineering], skills: &[Playwright], weight: 1.4, language: Language::Any },
        KeywordEntry { term: "screenshot", categories: &[VisualEngineering], skills: &[Playwright], weight: 1.0, language: Language::Any },
        // artistry
        KeywordEntry { term: "illustration", categories: &[Artistry], skills: &[], weight: 1.2, language: Language::Any },
        KeywordEntry { term: "generate an image", categories: &[Artistry], skills: &[], weight: 1.5, language: Language::Any },
        KeywordEntry { term: "logo", categories: &[Artistry], skills: &[], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "color palette", categories: &[Artistry], skills: &[], weight: 1.0, language: Language::Any },
        // writing
        KeywordEntry { term: "report", categories: &[Writing], skills: &[DocumentWriting], weight: 1.2, language: Language::Any },
        KeywordEntry { term: "write a summary", categories: &[Writing], skills: &[DocumentWriting], weight: 1.4, language: Language::Any },
        KeywordEntry { term: "draft", categories: &[Writing], skills: &[DocumentWriting], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "documentation", categories: &[Writing], skills: &[DocumentWriting], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "blog post", categories: &[Writing], skills: &[DocumentWriting], weight: 1.3, language: Language::Any },
        // skill-only signals that don't pin a category by themselves
        KeywordEntry { term: "git", categories: &[], skills: &[GitMaster], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "pull request", categories: &[], skills: &[GitMaster], weight: 1.2, language: Language::Any },
        KeywordEntry { term: "merge conflict", categories: &[Ultrabrain], skills: &[GitMaster], weight: 1.3, language: Language::Any },
        KeywordEntry { term: "slack", categories: &[], skills: &[McpIntegration], weight: 0.8, language: Language::Any },
        KeywordEntry { term: "notion", categories: &[], skills: &[McpIntegration], weight: 0.8, language: Language::Any },
        KeywordEntry { term: "database", categories: &[UnspecifiedHigh], skills: &[DataAnalysis], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "sales metrics", categories: &[UnspecifiedHigh], skills: &[DataAnalysis], weight: 1.2, language: Language::Any },
        KeywordEntry { term: "api integration", categories: &[], skills: &[ApiIntegration], weight: 1.0, language: Language::Any },
        KeywordEntry { term: "webhook", categories: &[], skills: &[ApiIntegration], weight: 0.9, language: Language::Any },
    ]
});

/// Per-category/skill score produced by one pass over the request text.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub category_scores: Vec<(Category, f64)>,
    pub skill_scores: Vec<(Skill, f64)>,
    pub matched_terms: Vec<String>,
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Single-pass scan of `text` against the unified keyword table (target <5ms).
#[must_use]
pub fn scan(text: &str) -> ScanResult {
    let normalized = normalize(text);
    let mut category_scores: Vec<(Category, f64)> = Vec::new();
    let mut skill_scores: Vec<(Skill, f64)> = Vec::new();
    let mut matched_terms = Vec::new();

    for entry in KEYWORD_TABLE.iter() {
        if !normalized.contains(entry.term) {
            continue;
        }
        matched_terms.push(entry.term.to_string());
        for &cat in entry.categories {
            bump_category(&mut category_scores, cat, entry.weight);
        }
        for &skill in entry.skills {
            bump_skill(&mut skill_scores, skill, entry.weight);
        }
    }

    ScanResult {
        category_scores,
        skill_scores,
        matched_terms,
    }
}

fn bump_category(scores: &mut Vec<(Category, f64)>, category: Category, weight: f64) {
    if let Some(existing) = scores.iter_mut().find(|(c, _)| *c == category) {
        existing.1 += weight;
    } else {
        scores.push((category, weight));
    }
}

fn bump_skill(scores: &mut Vec<(Skill, f64)>, skill: Skill, weight: f64) {
    if let Some(existing) = scores.iter_mut().find(|(s, _)| *s == skill) {
        existing.1 += weight;
    } else {
        scores.push((skill, weight));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_quick_category_for_typo_fix() {
        let result = scan("please fix typo in README");
        assert!(result.category_scores.iter().any(|(c, _)| *c == Quick));
    }

    #[test]
    fn scan_accumulates_weight_across_terms() {
        let result = scan("fix typo, another typo here");
        let (_, score) = result
            .category_scores
            .iter()
            .find(|(c, _)| *c == Quick)
            .unwrap();
        assert!(*score > 1.0);
    }

    #[test]
    fn scan_surfaces_skills_alongside_categories() {
        let result = scan("write a playwright browser test for the UI");
        assert!(result.skill_scores.iter().any(|(s, _)| *s == Playwright));
        assert!(result
            .category_scores
            .iter()
            .any(|(c, _)| *c == VisualEngineering));
    }

    #[test]
    fn scan_of_unrelated_text_is_empty() {
        let result = scan("the quick brown fox jumps");
        assert!(result.category_scores.is_empty());
    }
}
