//! Edge weighting
//!
//! Reduces every source's claim about one (source artist, target artist) pair
//! to a single `WeightedEdge`.
//!
//! # Fusion
//! Contributions are split into factual (MusicBrainz relations, curated
//! group membership) and algorithmic (Last.fm, Deezer, Spotify scores):
//! - factual only → `factual_primary`: strongest factual similarity
//! - algorithmic only → `algorithmic_weighted`: confidence-weighted average
//! - both → `hybrid_weighted`: 0.6 × strongest factual + 0.4 × weighted average
//!
//! Two or more distinct sources add a flat 0.05 bonus (capped at 1.0) and a
//! `_multi_source` suffix. Algorithmic scores are used exactly as reported;
//! nothing is rounded up or saturated.

use crate::types::{RawValue, SimilarityCandidate, SourceCandidates, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Floor applied to similarity before inverting it into a distance
pub const DISTANCE_EPSILON: f64 = 0.01;

/// Shortest distance ever emitted
pub const MIN_DISTANCE: f64 = 0.5;

pub const MULTI_SOURCE_BONUS: f64 = 0.05;

const FACTUAL_SHARE: f64 = 0.6;
const ALGORITHMIC_SHARE: f64 = 0.4;

/// Confidence of a MusicBrainz relation or curated membership
pub const FACTUAL_CONFIDENCE: f64 = 0.9;

/// Similarity implied by a MusicBrainz relation type
///
/// `member of band` 0.95, `collaboration` 0.85, `similar` 0.70, anything else 0.50.
pub fn relationship_similarity(category: &str) -> f64 {
    match category.trim().to_lowercase().as_str() {
        "member of band" => 0.95,
        "collaboration" => 0.85,
        "similar" => 0.70,
        _ => 0.50,
    }
}

/// Default reliability weight of each source's scores
pub fn default_reliability(source: SourceKind) -> f64 {
    match source {
        SourceKind::Lastfm => 1.0,
        SourceKind::Deezer => 0.8,
        SourceKind::Spotify => 0.7,
        SourceKind::Musicbrainz | SourceKind::Relationship => FACTUAL_CONFIDENCE,
    }
}

/// One source's normalized claim about a pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeContribution {
    pub source: SourceKind,
    pub raw_value: RawValue,
    pub normalized_similarity: f64,
    pub confidence: f64,
    pub is_factual: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
}

/// How contributions were combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    FactualPrimary,
    AlgorithmicWeighted,
    HybridWeighted,
}

impl FusionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionMethod::FactualPrimary => "factual_primary",
            FusionMethod::AlgorithmicWeighted => "algorithmic_weighted",
            FusionMethod::HybridWeighted => "hybrid_weighted",
        }
    }
}

impl fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fused relationship between two artists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source_artist: String,
    pub target_artist: String,
    /// Fused similarity in [0, 1]
    pub similarity: f64,
    /// Layout distance, at least `MIN_DISTANCE`
    pub distance: f64,
    /// Mean contribution confidence in [0, 1]
    pub confidence: f64,
    pub is_factual: bool,
    pub method: FusionMethod,
    pub multi_source: bool,
    pub contributions: Vec<EdgeContribution>,
}

impl WeightedEdge {
    /// `fusion_method` label, e.g. `hybrid_weighted_multi_source`
    pub fn fusion_method(&self) -> String {
        if self.multi_source {
            format!("{}_multi_source", self.method)
        } else {
            self.method.to_string()
        }
    }

    /// Contributing sources in contribution order
    pub fn sources(&self) -> Vec<SourceKind> {
        self.contributions.iter().map(|c| c.source).collect()
    }
}

/// Builds weighted edges from per-source candidate lists
#[derive(Debug, Clone)]
pub struct EdgeWeighter {
    reliability: BTreeMap<SourceKind, f64>,
}

impl Default for EdgeWeighter {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeWeighter {
    pub fn new() -> Self {
        let reliability = SourceKind::PROVIDERS
            .iter()
            .chain(std::iter::once(&SourceKind::Relationship))
            .map(|s| (*s, default_reliability(*s)))
            .collect();
        Self { reliability }
    }

    /// Override the confidence assigned to one source's contributions
    pub fn with_reliability(mut self, source: SourceKind, weight: f64) -> Self {
        if weight.is_finite() {
            self.reliability.insert(source, weight.clamp(0.0, 1.0));
        }
        self
    }

    fn reliability(&self, source: SourceKind) -> f64 {
        self.reliability
            .get(&source)
            .copied()
            .unwrap_or_else(|| default_reliability(source))
    }

    /// Normalize a single candidate; `None` if its score is unusable
    pub fn contribution(&self, candidate: &SimilarityCandidate) -> Option<EdgeContribution> {
        let source = candidate.source();
        let raw_value = candidate.raw_value();

        let normalized_similarity = match &raw_value {
            RawValue::Relationship(category) => relationship_similarity(category),
            RawValue::Score(score) if score.is_finite() => score.clamp(0.0, 1.0),
            RawValue::Score(_) => return None,
        };

        Some(EdgeContribution {
            source,
            normalized_similarity,
            confidence: self.reliability(source),
            is_factual: source.is_factual(),
            relationship_type: candidate.relationship_type(),
            raw_value,
        })
    }

    /// Fuse every source's claim about `source_artist → target_artist`
    ///
    /// Takes the first case-insensitive name match per source. Returns `None`
    /// when no source mentions the target.
    ///
    /// MusicBrainz and curated-membership contributions describe the same
    /// fact: when both are present only the stronger is kept (MusicBrainz on a
    /// tie), so the pair never earns the multi-source bonus on its own.
    pub fn create_weighted_edge(
        &self,
        source_artist: &str,
        target_artist: &str,
        candidates: &SourceCandidates,
    ) -> Option<WeightedEdge> {
        let target = target_artist.to_lowercase();

        let mut contributions: Vec<EdgeContribution> = candidates
            .iter()
            .filter_map(|(_, list)| list.iter().find(|c| c.name().to_lowercase() == target))
            .filter_map(|c| self.contribution(c))
            .collect();

        let score_of = |kind: SourceKind| {
            contributions
                .iter()
                .find(|c| c.source == kind)
                .map(|c| c.normalized_similarity)
        };
        if let (Some(mb), Some(rel)) = (score_of(SourceKind::Musicbrainz), score_of(SourceKind::Relationship)) {
            let weaker = if rel > mb { SourceKind::Musicbrainz } else { SourceKind::Relationship };
            contributions.retain(|c| c.source != weaker);
        }

        if contributions.is_empty() {
            return None;
        }

        let factual_max = contributions
            .iter()
            .filter(|c| c.is_factual)
            .map(|c| c.normalized_similarity)
            .reduce(f64::max);
        let algorithmic: Vec<&EdgeContribution> = contributions.iter().filter(|c| !c.is_factual).collect();
        let algorithmic_avg = weighted_average(&algorithmic);

        let (mut similarity, method, is_factual) = match (factual_max, algorithmic_avg) {
            (Some(f), None) => (f, FusionMethod::FactualPrimary, true),
            (None, Some(a)) => (a, FusionMethod::AlgorithmicWeighted, false),
            (Some(f), Some(a)) => (
                FACTUAL_SHARE * f + ALGORITHMIC_SHARE * a,
                FusionMethod::HybridWeighted,
                true,
            ),
            (None, None) => return None,
        };

        let mut distinct: Vec<SourceKind> = contributions.iter().map(|c| c.source).collect();
        distinct.sort();
        distinct.dedup();
        let multi_source = distinct.len() >= 2;
        if multi_source {
            similarity = (similarity + MULTI_SOURCE_BONUS).min(1.0);
        }

        let distance = contributions
            .iter()
            .map(|c| 1.0 / c.normalized_similarity.max(DISTANCE_EPSILON))
            .fold(f64::INFINITY, f64::min)
            .max(MIN_DISTANCE);
        let confidence =
            contributions.iter().map(|c| c.confidence).sum::<f64>() / contributions.len() as f64;

        Some(WeightedEdge {
            source_artist: source_artist.to_string(),
            target_artist: target_artist.to_string(),
            similarity: similarity.clamp(0.0, 1.0),
            distance,
            confidence: confidence.clamp(0.0, 1.0),
            is_factual,
            method,
            multi_source,
            contributions,
        })
    }
}

/// Confidence-weighted mean; plain mean if every confidence is zero
fn weighted_average(contributions: &[&EdgeContribution]) -> Option<f64> {
    if contributions.is_empty() {
        return None;
    }
    let total_weight: f64 = contributions.iter().map(|c| c.confidence).sum();
    if total_weight > 0.0 {
        Some(
            contributions
                .iter()
                .map(|c| c.normalized_similarity * c.confidence)
                .sum::<f64>()
                / total_weight,
        )
    } else {
        Some(
            contributions.iter().map(|c| c.normalized_similarity).sum::<f64>()
                / contributions.len() as f64,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
