//! Core Types and Trait Definitions
//!
//! Defines the data that flows through the similarity pipeline:
//! - **Sources:** `SourceKind` identifies where a signal came from
//! - **Candidates:** `SimilarityCandidate` is one "artist X is similar to Y" claim
//! - **Providers:** `SimilarityProvider` / `MetadataProvider` are the seams to external APIs
//!
//! # Architecture
//! Providers produce candidates → the aggregator groups them per source →
//! the edge weighter reduces one (source, target) pair to a single weighted edge.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;

// ============================================================================
// Sources
// ============================================================================

/// Origin of a similarity signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Last.fm `artist.getsimilar` (algorithmic, provider-normalized 0-1)
    Lastfm,
    /// Deezer related artists (algorithmic, position-derived)
    Deezer,
    /// MusicBrainz artist relationships (factual categories)
    Musicbrainz,
    /// Spotify playlist co-occurrence (algorithmic)
    Spotify,
    /// Curated group membership from the identity table (factual)
    Relationship,
}

impl SourceKind {
    /// Sources backed by an external API, in aggregation order
    pub const PROVIDERS: [SourceKind; 4] = [
        SourceKind::Lastfm,
        SourceKind::Deezer,
        SourceKind::Musicbrainz,
        SourceKind::Spotify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Lastfm => "lastfm",
            SourceKind::Deezer => "deezer",
            SourceKind::Musicbrainz => "musicbrainz",
            SourceKind::Spotify => "spotify",
            SourceKind::Relationship => "relationship",
        }
    }

    /// Parse a source name as used in config files and CLI flags
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "lastfm" | "last.fm" => Some(SourceKind::Lastfm),
            "deezer" => Some(SourceKind::Deezer),
            "musicbrainz" | "mb" => Some(SourceKind::Musicbrainz),
            "spotify" => Some(SourceKind::Spotify),
            "relationship" => Some(SourceKind::Relationship),
            _ => None,
        }
    }

    /// Whether signals from this source describe verifiable facts
    pub fn is_factual(&self) -> bool {
        matches!(self, SourceKind::Musicbrainz | SourceKind::Relationship)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// Raw value reported by a provider for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    /// Numeric match score, already in [0, 1]
    Score(f64),
    /// Discrete relationship category (e.g. "member of band")
    Relationship(String),
}

/// Factual relationship exposed by the identity table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Source artist is a member of the related group
    MemberOf,
    /// Source group has the related artist as a member
    HasMember,
}

impl RelationshipType {
    /// Fixed strength of the relationship signal
    pub fn strength(&self) -> f64 {
        match self {
            RelationshipType::MemberOf => 0.9,
            RelationshipType::HasMember => 0.8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::MemberOf => "member_of",
            RelationshipType::HasMember => "has_member",
        }
    }
}

/// One "similar artist" claim
///
/// The variant records how the claim was produced so downstream code can tell
/// organic API matches from synthesized ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum SimilarityCandidate {
    /// Returned as-is by an external provider
    Organic {
        name: String,
        source: SourceKind,
        raw: RawValue,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        metadata: BTreeMap<String, serde_json::Value>,
    },
    /// Synthesized from the curated group-membership table
    RelationshipDerived {
        name: String,
        relationship: RelationshipType,
        strength: f64,
    },
    /// A provider result whose spelling was mapped onto a working-set artist
    Canonicalized {
        name: String,
        source: SourceKind,
        raw: RawValue,
        matched_from: String,
    },
}

impl SimilarityCandidate {
    /// Organic candidate carrying a numeric score
    pub fn scored(name: impl Into<String>, source: SourceKind, score: f64) -> Self {
        SimilarityCandidate::Organic {
            name: name.into(),
            source,
            raw: RawValue::Score(score),
            metadata: BTreeMap::new(),
        }
    }

    /// Organic candidate carrying a relationship category
    pub fn related(name: impl Into<String>, source: SourceKind, category: impl Into<String>) -> Self {
        SimilarityCandidate::Organic {
            name: name.into(),
            source,
            raw: RawValue::Relationship(category.into()),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata field (no-op on synthesized variants)
    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        if let SimilarityCandidate::Organic { metadata, .. } = &mut self {
            metadata.insert(key.to_string(), value);
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            SimilarityCandidate::Organic { name, .. }
            | SimilarityCandidate::RelationshipDerived { name, .. }
            | SimilarityCandidate::Canonicalized { name, .. } => name,
        }
    }

    pub fn source(&self) -> SourceKind {
        match self {
            SimilarityCandidate::Organic { source, .. }
            | SimilarityCandidate::Canonicalized { source, .. } => *source,
            SimilarityCandidate::RelationshipDerived { .. } => SourceKind::Relationship,
        }
    }

    /// Raw value as reported (relationship strength for synthesized relationships)
    pub fn raw_value(&self) -> RawValue {
        match self {
            SimilarityCandidate::Organic { raw, .. }
            | SimilarityCandidate::Canonicalized { raw, .. } => raw.clone(),
            SimilarityCandidate::RelationshipDerived { strength, .. } => RawValue::Score(*strength),
        }
    }

    /// Relationship label, if this candidate describes one
    pub fn relationship_type(&self) -> Option<String> {
        match self {
            SimilarityCandidate::RelationshipDerived { relationship, .. } => {
                Some(relationship.as_str().to_string())
            }
            SimilarityCandidate::Organic { raw: RawValue::Relationship(r), .. }
            | SimilarityCandidate::Canonicalized { raw: RawValue::Relationship(r), .. } => {
                Some(r.clone())
            }
            _ => None,
        }
    }

    /// True for candidates not returned verbatim by a provider
    pub fn is_enhanced(&self) -> bool {
        !matches!(self, SimilarityCandidate::Organic { .. })
    }
}

/// Per-source candidate lists for one source artist
pub type SourceCandidates = BTreeMap<SourceKind, Vec<SimilarityCandidate>>;

// ============================================================================
// Provider seams
// ============================================================================

/// Errors raised inside a provider adapter
///
/// These never escape the aggregation step: every variant degrades to
/// "no candidates from this source".
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// External API returned an error status or error payload
    #[error("API error: {0}")]
    Api(String),

    /// Provider throttled the request
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Provider has no such artist (eligible for negative caching)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Required credentials missing
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Request exceeded its time budget
    #[error("Timed out after {0}s")]
    Timeout(u64),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Network(format!("request timed out: {}", e))
        } else if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// External "similar artists" source
///
/// # Example
/// ```rust,ignore
/// #[async_trait]
/// impl SimilarityProvider for MyProvider {
///     fn source(&self) -> SourceKind { SourceKind::Lastfm }
///
///     async fn fetch_similar(&self, artist: &str, limit: usize)
///         -> Result<Vec<SimilarityCandidate>, ProviderError> {
///         let rows = self.call_api(artist, limit).await?;
///         Ok(rows.into_iter().map(|r| SimilarityCandidate::scored(r.name, self.source(), r.score)).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    /// Source this provider reports as
    fn source(&self) -> SourceKind;

    /// Whether the provider has everything it needs (credentials) to make calls
    fn is_configured(&self) -> bool {
        true
    }

    /// Fetch similar artists, surfacing the failure kind
    ///
    /// # Errors
    /// `ProviderError::NotFound` when the provider does not know the artist;
    /// any other variant for transient or configuration failures.
    async fn fetch_similar(
        &self,
        artist: &str,
        limit: usize,
    ) -> Result<Vec<SimilarityCandidate>, ProviderError>;

    /// Fetch similar artists, absorbing every failure into an empty list
    async fn get_similarity(&self, artist: &str, limit: usize) -> Vec<SimilarityCandidate> {
        match self.fetch_similar(artist, limit).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    source = %self.source(),
                    artist = %artist,
                    error = %e,
                    "Similarity lookup failed, treating as no candidates"
                );
                Vec::new()
            }
        }
    }
}

/// Display metadata for one artist from one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistProfile {
    /// Name as spelled by the provider
    pub canonical_name: String,
    pub listeners: u64,
    pub playcount: u64,
    pub url: Option<String>,
    pub mbid: Option<String>,
    /// Free-text tags (Last.fm)
    pub tags: Vec<String>,
    /// Curated genre list (Spotify)
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
}

/// External display-metadata source used for node enrichment
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn source(&self) -> SourceKind;

    /// Look up an artist's profile; `Ok(None)` when the provider has no match
    async fn artist_profile(&self, artist: &str) -> Result<Option<ArtistProfile>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_round_trip_names() {
        for kind in SourceKind::PROVIDERS {
            assert_eq!(SourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(SourceKind::parse("Last.fm"), Some(SourceKind::Lastfm));
        assert_eq!(SourceKind::parse("myspace"), None);
    }

    #[test]
    fn test_factual_sources() {
        assert!(SourceKind::Musicbrainz.is_factual());
        assert!(SourceKind::Relationship.is_factual());
        assert!(!SourceKind::Lastfm.is_factual());
        assert!(!SourceKind::Deezer.is_factual());
    }

    #[test]
    fn test_candidate_accessors() {
        let organic = SimilarityCandidate::scored("ITZY", SourceKind::Lastfm, 0.7);
        assert_eq!(organic.name(), "ITZY");
        assert_eq!(organic.source(), SourceKind::Lastfm);
        assert_eq!(organic.raw_value(), RawValue::Score(0.7));
        assert!(organic.relationship_type().is_none());
        assert!(!organic.is_enhanced());

        let derived = SimilarityCandidate::RelationshipDerived {
            name: "IVE".to_string(),
            relationship: RelationshipType::MemberOf,
            strength: 0.9,
        };
        assert_eq!(derived.source(), SourceKind::Relationship);
        assert_eq!(derived.relationship_type().as_deref(), Some("member_of"));
        assert!(derived.is_enhanced());
    }

    #[test]
    fn test_candidate_serializes_with_origin_tag() {
        let c = SimilarityCandidate::related("IVE", SourceKind::Musicbrainz, "member of band");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["origin"], "organic");
        assert_eq!(json["source"], "musicbrainz");
        assert_eq!(json["raw"]["kind"], "relationship");

        let back: SimilarityCandidate = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_relationship_strengths() {
        assert_eq!(RelationshipType::MemberOf.strength(), 0.9);
        assert_eq!(RelationshipType::HasMember.strength(), 0.8);
    }

    struct FailingProvider;

    #[async_trait]
    impl SimilarityProvider for FailingProvider {
        fn source(&self) -> SourceKind {
            SourceKind::Deezer
        }

        async fn fetch_similar(
            &self,
            _artist: &str,
            _limit: usize,
        ) -> Result<Vec<SimilarityCandidate>, ProviderError> {
            Err(ProviderError::RateLimited("429".to_string()))
        }
    }

    #[tokio::test]
    async fn test_get_similarity_absorbs_errors() {
        let provider = FailingProvider;
        let result = provider.get_similarity("IVE", 10).await;
        assert!(result.is_empty());
    }
}
