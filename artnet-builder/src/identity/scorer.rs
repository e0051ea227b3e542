//! Fuzzy string scorers for alias matching
//!
//! The scorer is a strategy chosen when the resolver is built. `StrsimScorer` is the
//! normal choice; `SubstringScorer` is the degraded containment check.

/// Similarity between a normalized query and a known alias, in [0, 1]
pub trait FuzzyScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, query: &str, alias: &str) -> f64;
}

/// Edit-distance ratio via `strsim::normalized_levenshtein`
#[derive(Debug, Clone, Copy, Default)]
pub struct StrsimScorer;

impl FuzzyScorer for StrsimScorer {
    fn name(&self) -> &'static str {
        "normalized_levenshtein"
    }

    fn score(&self, query: &str, alias: &str) -> f64 {
        strsim::normalized_levenshtein(query, alias)
    }
}

/// Containment check: 1.0 if either string contains the other, else 0.0
///
/// Strings of 2 characters or fewer never match, so short aliases cannot swallow
/// unrelated names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringScorer;

impl FuzzyScorer for SubstringScorer {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn score(&self, query: &str, alias: &str) -> f64 {
        if query.chars().count() <= 2 || alias.chars().count() <= 2 {
            return 0.0;
        }
        if query.contains(alias) || alias.contains(query) {
            1.0
        } else {
            0.0
        }
    }
}
