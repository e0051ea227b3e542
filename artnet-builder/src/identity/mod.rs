//! Identity Resolver
//!
//! Maps any textual artist mention to a stable canonical identity and exposes
//! group membership as a factual similarity signal independent of external APIs.
//!
//! # Lookup order
//! 1. Special-case `(G)I-DLE` spellings (the parenthetical is part of the name)
//! 2. Exact alias lookup on the normalized name
//! 3. Fuzzy match against every alias (top 3 by score, best one must clear the threshold)
//!
//! A miss at every step is a normal outcome (`None`), not an error.
//!
//! # Indices
//! Built once from the curated table:
//! - `alias_index`: lowercase alias → canonical key
//! - `identities`: canonical key → `ArtistIdentity`

pub mod alias_table;
pub mod scorer;

pub use alias_table::{curated_identities, ArtistIdentity};
pub use scorer::{FuzzyScorer, StrsimScorer, SubstringScorer};

use crate::names::normalize_for_matching;
use crate::types::{RelationshipType, SimilarityCandidate};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Default fuzzy acceptance threshold
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

/// How many top-scoring aliases the fuzzy step considers
const FUZZY_CANDIDATES: usize = 3;

/// Case-insensitive set of working-set artist names that remembers original casing
#[derive(Debug, Clone, Default)]
pub struct TargetUniverse {
    by_lower: HashMap<String, String>,
}

impl TargetUniverse {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let by_lower = names
            .into_iter()
            .map(|n| (n.as_ref().to_lowercase(), n.as_ref().to_string()))
            .collect();
        Self { by_lower }
    }

    /// Exact casing of `name` as it appears in the universe
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.by_lower.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_lower.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lower.is_empty()
    }
}

/// A working-set artist factually related to a source artist
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedArtist {
    /// Name with the casing used in the target universe
    pub name: String,
    pub relationship: RelationshipType,
    pub strength: f64,
}

/// Identity Resolver
///
/// Immutable after construction; safe to share across tasks behind an `Arc`.
///
/// # Example
/// ```rust,ignore
/// use artnet_builder::identity::{IdentityResolver, TargetUniverse};
///
/// let resolver = IdentityResolver::new();
/// assert_eq!(resolver.find_canonical_name("안유진").as_deref(), Some("ANYUJIN"));
///
/// let universe = TargetUniverse::new(["IVE"]);
/// let related = resolver.find_related_artists("ANYUJIN", &universe);
/// assert_eq!(related[0].name, "IVE");
/// ```
pub struct IdentityResolver {
    identities: BTreeMap<String, ArtistIdentity>,
    alias_index: BTreeMap<String, String>,
    scorer: Box<dyn FuzzyScorer>,
    threshold: f64,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver {
    /// Curated table with the edit-distance scorer and default threshold
    pub fn new() -> Self {
        Self::with_scorer(Box::new(StrsimScorer))
    }

    /// Curated table with a specific fuzzy scorer
    pub fn with_scorer(scorer: Box<dyn FuzzyScorer>) -> Self {
        let mut resolver = Self {
            identities: BTreeMap::new(),
            alias_index: BTreeMap::new(),
            scorer,
            threshold: DEFAULT_FUZZY_THRESHOLD,
        };
        for identity in curated_identities() {
            resolver.add_identity(identity);
        }
        debug!(
            identities = resolver.identities.len(),
            aliases = resolver.alias_index.len(),
            scorer = resolver.scorer.name(),
            "Identity resolver initialized"
        );
        resolver
    }

    /// Override the fuzzy acceptance threshold (clamped to [0, 1])
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Extend the curated table with additional identities
    pub fn with_identities(mut self, extra: impl IntoIterator<Item = ArtistIdentity>) -> Self {
        for identity in extra {
            self.add_identity(identity);
        }
        self
    }

    /// Add (or replace) one identity and index its aliases
    pub fn add_identity(&mut self, identity: ArtistIdentity) {
        let key = identity.canonical_name.to_lowercase();
        for alias in &identity.aliases {
            self.alias_index.insert(alias.to_lowercase(), key.clone());
        }
        self.alias_index.insert(key.clone(), key.clone());
        self.identities.insert(key, identity);
    }

    /// Identity record for a canonical name
    pub fn identity(&self, canonical_name: &str) -> Option<&ArtistIdentity> {
        self.identities.get(&canonical_name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Canonical name for any spelling of an artist, if known
    pub fn find_canonical_name(&self, raw_name: &str) -> Option<String> {
        if raw_name.trim().is_empty() {
            return None;
        }

        let lower = raw_name.to_lowercase();
        if lower.contains("(g)i-dle") || lower.contains("gidle") {
            return self.identity("(G)I-DLE").map(|i| i.canonical_name.clone());
        }

        let normalized = normalize_for_matching(raw_name);
        if normalized.is_empty() {
            return None;
        }

        if let Some(key) = self.alias_index.get(&normalized) {
            return self.identities.get(key).map(|i| i.canonical_name.clone());
        }

        self.fuzzy_match(&normalized)
    }

    fn fuzzy_match(&self, normalized: &str) -> Option<String> {
        let mut scored: Vec<(f64, &String)> = self
            .alias_index
            .keys()
            .map(|alias| (self.scorer.score(normalized, alias), alias))
            .collect();
        // Stable sort keeps alphabetical alias order among equal scores
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let (score, alias) = scored
            .into_iter()
            .take(FUZZY_CANDIDATES)
            .find(|(score, _)| *score >= self.threshold)?;

        let key = self.alias_index.get(alias)?;
        let identity = self.identities.get(key)?;
        debug!(
            query = normalized,
            alias = %alias,
            score,
            canonical = %identity.canonical_name,
            "Fuzzy identity match"
        );
        Some(identity.canonical_name.clone())
    }

    /// Working-set artists related to `raw_name` through group membership
    ///
    /// `member_of` relations have strength 0.9 and `has_member` 0.8. Only relations whose
    /// related artist is in `universe` are returned, spelled as the universe spells them.
    pub fn find_related_artists(&self, raw_name: &str, universe: &TargetUniverse) -> Vec<RelatedArtist> {
        let Some(canonical) = self.find_canonical_name(raw_name) else {
            return Vec::new();
        };
        let Some(identity) = self.identity(&canonical) else {
            return Vec::new();
        };

        let mut related: Vec<RelatedArtist> = Vec::new();
        let mut push = |name: &str, relationship: RelationshipType| {
            if related.iter().any(|r| r.name == name) {
                return;
            }
            related.push(RelatedArtist {
                name: name.to_string(),
                relationship,
                strength: relationship.strength(),
            });
        };

        for group in &identity.group_memberships {
            if let Some(target) = self
                .find_canonical_name(group)
                .and_then(|c| universe.resolve(&c))
            {
                push(target, RelationshipType::MemberOf);
            }
        }

        for member in &identity.members {
            if let Some(target) = self
                .find_canonical_name(member)
                .and_then(|c| universe.resolve(&c))
            {
                push(target, RelationshipType::HasMember);
            }
        }

        related
    }

    /// Candidate list extended with relationship-derived and canonicalized candidates
    ///
    /// The originals come first and are left untouched. Appended are:
    /// - one `RelationshipDerived` per related working-set artist
    /// - one `Canonicalized` per organic candidate whose spelling differs from, but
    ///   resolves to, a working-set artist (source and raw value carried over)
    pub fn enhance_similarity_matching(
        &self,
        source_artist: &str,
        candidates: &[SimilarityCandidate],
        universe: &TargetUniverse,
    ) -> Vec<SimilarityCandidate> {
        let mut enhanced = candidates.to_vec();

        for rel in self.find_related_artists(source_artist, universe) {
            enhanced.push(SimilarityCandidate::RelationshipDerived {
                name: rel.name,
                relationship: rel.relationship,
                strength: rel.strength,
            });
        }

        for candidate in candidates {
            let SimilarityCandidate::Organic { name, source, raw, .. } = candidate else {
                continue;
            };
            if universe.contains(name) {
                continue;
            }
            let Some(target) = self
                .find_canonical_name(name)
                .and_then(|c| universe.resolve(&c))
            else {
                continue;
            };
            enhanced.push(SimilarityCandidate::Canonicalized {
                name: target.to_string(),
                source: *source,
                raw: raw.clone(),
                matched_from: name.clone(),
            });
        }

        enhanced
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawValue, SourceKind};

    #[test]
    fn test_exact_alias_lookup() {
        let resolver = IdentityResolver::new();
        assert_eq!(resolver.find_canonical_name("IVE").as_deref(), Some("IVE"));
        assert_eq!(resolver.find_canonical_name("아이브").as_deref(), Some("IVE"));
        assert_eq!(resolver.find_canonical_name("안유진").as_deref(), Some("ANYUJIN"));
        assert_eq!(resolver.find_canonical_name("Ahn Yu-jin").as_deref(), Some("ANYUJIN"));
    }

    #[test]
    fn test_parentheticals_and_features_ignored() {
        let resolver = IdentityResolver::new();
        assert_eq!(resolver.find_canonical_name("ANYUJIN (IVE)").as_deref(), Some("ANYUJIN"));
        assert_eq!(resolver.find_canonical_name("TWICE feat. Someone").as_deref(), Some("TWICE"));
    }

    #[test]
    fn test_gidle_special_case() {
        let resolver = IdentityResolver::new();
        assert_eq!(resolver.find_canonical_name("(G)I-DLE").as_deref(), Some("(G)I-DLE"));
        assert_eq!(resolver.find_canonical_name("GIDLE").as_deref(), Some("(G)I-DLE"));
    }

    #[test]
    fn test_fuzzy_match_accepts_close_spelling() {
        let resolver = IdentityResolver::new();
        // "anyujinn" is one edit away from "anyujin"
        assert_eq!(resolver.find_canonical_name("ANYUJINN").as_deref(), Some("ANYUJIN"));
    }

    #[test]
    fn test_unknown_name_is_none() {
        let resolver = IdentityResolver::new();
        assert!(resolver.find_canonical_name("Radiohead").is_none());
        assert!(resolver.find_canonical_name("").is_none());
        assert!(resolver.find_canonical_name("   ").is_none());
    }

    #[test]
    fn test_find_canonical_name_is_idempotent() {
        let resolver = IdentityResolver::new();
        for name in ["ANYUJIN", "izone", "Radiohead", "트와이스"] {
            assert_eq!(resolver.find_canonical_name(name), resolver.find_canonical_name(name));
        }
    }

    #[test]
    fn test_substring_fallback_scorer() {
        let resolver = IdentityResolver::with_scorer(Box::new(SubstringScorer));
        assert_eq!(
            resolver.find_canonical_name("itzy official").as_deref(),
            Some("ITZY")
        );
        assert!(resolver.find_canonical_name("zz").is_none());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let strict = IdentityResolver::new().with_threshold(1.0);
        assert!(strict.find_canonical_name("ANYUJINN").is_none());
        assert_eq!(strict.find_canonical_name("anyujin").as_deref(), Some("ANYUJIN"));
    }

    #[test]
    fn test_member_of_relation() {
        let resolver = IdentityResolver::new();
        let universe = TargetUniverse::new(["IVE"]);

        let related = resolver.find_related_artists("ANYUJIN", &universe);
        assert_eq!(
            related,
            vec![RelatedArtist {
                name: "IVE".to_string(),
                relationship: RelationshipType::MemberOf,
                strength: 0.9,
            }]
        );
    }

    #[test]
    fn test_has_member_relation_keeps_universe_casing() {
        let resolver = IdentityResolver::new();
        let universe = TargetUniverse::new(["AnYuJin", "Radiohead"]);

        let related = resolver.find_related_artists("ive", &universe);
        assert_eq!(related.len(), 1, "aliases of one member collapse to one relation");
        assert_eq!(related[0].name, "AnYuJin");
        assert_eq!(related[0].relationship, RelationshipType::HasMember);
        assert_eq!(related[0].strength, 0.8);
    }

    #[test]
    fn test_related_filtered_by_universe() {
        let resolver = IdentityResolver::new();
        let universe = TargetUniverse::new(["TWICE"]);
        assert!(resolver.find_related_artists("ANYUJIN", &universe).is_empty());
        assert!(resolver.find_related_artists("Radiohead", &universe).is_empty());
    }

    #[test]
    fn test_enhance_adds_relationship_and_canonical_candidates() {
        let resolver = IdentityResolver::new();
        let universe = TargetUniverse::new(["ANYUJIN", "IVE", "IZ*ONE"]);

        let organic = vec![
            SimilarityCandidate::scored("아이즈원", SourceKind::Lastfm, 0.62),
            SimilarityCandidate::scored("Radiohead", SourceKind::Lastfm, 0.1),
        ];
        let enhanced = resolver.enhance_similarity_matching("ANYUJIN", &organic, &universe);

        assert_eq!(&enhanced[..2], &organic[..], "originals come first, unchanged");
        assert!(enhanced.contains(&SimilarityCandidate::RelationshipDerived {
            name: "IVE".to_string(),
            relationship: RelationshipType::MemberOf,
            strength: 0.9,
        }));
        assert!(enhanced.contains(&SimilarityCandidate::Canonicalized {
            name: "IZ*ONE".to_string(),
            source: SourceKind::Lastfm,
            raw: RawValue::Score(0.62),
            matched_from: "아이즈원".to_string(),
        }));
        assert_eq!(enhanced.len(), 4);
    }

    #[test]
    fn test_enhance_skips_names_already_in_universe() {
        let resolver = IdentityResolver::new();
        let universe = TargetUniverse::new(["TWICE"]);
        let organic = vec![SimilarityCandidate::scored("twice", SourceKind::Deezer, 0.5)];

        let enhanced = resolver.enhance_similarity_matching("ITZY", &organic, &universe);
        assert_eq!(enhanced, organic);
    }

    #[test]
    fn test_with_identities_extends_table() {
        let extra = ArtistIdentity::new("LE SSERAFIM")
            .aliases(&["르세라핌", "lesserafim"])
            .members(&["kazuha"]);
        let resolver = IdentityResolver::new().with_identities([extra]);

        assert_eq!(resolver.find_canonical_name("르세라핌").as_deref(), Some("LE SSERAFIM"));
        assert!(resolver.identity("le sserafim").is_some());
    }
}
