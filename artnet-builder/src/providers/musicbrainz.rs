//! MusicBrainz adapter (factual relationships)
//!
//! Queries MusicBrainz for an artist's artist-to-artist relations. Each relation
//! becomes a candidate whose raw value is the relation type ("member of band",
//! "collaboration", ...); the edge weighter maps the type to a similarity.
//!
//! # API Reference
//! - Search: https://musicbrainz.org/ws/2/artist?query=artist:"NAME"&fmt=json
//! - Lookup: https://musicbrainz.org/ws/2/artist/{mbid}?inc=artist-rels&fmt=json
//! - Rate Limit: 1 request/second (MusicBrainz TOS), User-Agent required

use super::{http_client, rate_limiter, status_error, DirectRateLimiter};
use crate::types::{ProviderError, SimilarityCandidate, SimilarityProvider, SourceKind};
use crate::weighting::relationship_similarity;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// MusicBrainz API base URL
const MUSICBRAINZ_API_URL: &str = "https://musicbrainz.org/ws/2";

/// Rate limit: 1 request per second (MusicBrainz TOS)
const REQUESTS_PER_SECOND: u32 = 1;

const SEARCH_LIMIT: &str = "5";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    artists: Vec<MBArtist>,
}

#[derive(Debug, Clone, Deserialize)]
struct MBArtist {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    relations: Vec<MBRelation>,
}

#[derive(Debug, Deserialize)]
struct MBRelation {
    #[serde(rename = "type")]
    relation_type: String,
    #[serde(rename = "target-type")]
    target_type: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    artist: Option<MBArtist>,
}

/// MusicBrainz relationship adapter (no credentials required)
pub struct MusicBrainzProvider {
    client: Client,
    base_url: String,
    rate_limiter: DirectRateLimiter,
}

impl MusicBrainzProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: MUSICBRAINZ_API_URL.to_string(),
            rate_limiter: rate_limiter(REQUESTS_PER_SECOND),
        })
    }

    /// Rate-limited GET returning a parsed JSON body
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ProviderError> {
        // Wait for a permit (1 req/sec)
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Querying MusicBrainz");
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("musicbrainz", status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Parse(format!("MusicBrainz response: {}", e)))
    }

    /// Resolve an artist name to its MBID
    async fn search_mbid(&self, artist: &str) -> Result<String, ProviderError> {
        let query = format!("artist:\"{}\"", artist.replace('"', ""));
        let results: SearchResponse = self
            .get(
                "/artist",
                &[("query", query.as_str()), ("limit", SEARCH_LIMIT), ("fmt", "json")],
            )
            .await?;

        let matched = pick_search_match(results.artists, artist)
            .ok_or_else(|| ProviderError::NotFound(format!("MusicBrainz has no artist '{}'", artist)))?;
        debug!(artist, mbid = %matched.id, matched = %matched.name, "MusicBrainz artist resolved");
        Ok(matched.id)
    }
}

/// Exact case-insensitive name match, else the top-scored search hit
fn pick_search_match(results: Vec<MBArtist>, artist: &str) -> Option<MBArtist> {
    let wanted = artist.to_lowercase();
    let index = results
        .iter()
        .position(|a| a.name.to_lowercase() == wanted)
        .unwrap_or(0);
    results.into_iter().nth(index)
}

/// Artist-targeted relations as candidates, strongest relation type first
///
/// One candidate per related artist; when an artist appears under several
/// relation types the strongest type is kept.
fn relation_candidates(relations: Vec<MBRelation>, limit: usize) -> Vec<SimilarityCandidate> {
    let mut kept: Vec<(String, String, String, Option<String>)> = Vec::new();

    for relation in relations {
        if relation.target_type.as_deref() != Some("artist") {
            continue;
        }
        let Some(target) = relation.artist else {
            continue;
        };
        let category = relation.relation_type.trim().to_lowercase();

        match kept.iter_mut().find(|(name, ..)| name.eq_ignore_ascii_case(&target.name)) {
            Some(existing) => {
                if relationship_similarity(&category) > relationship_similarity(&existing.1) {
                    existing.1 = category;
                    existing.3 = relation.direction;
                }
            }
            None => kept.push((target.name, category, target.id, relation.direction)),
        }
    }

    // Stable: MusicBrainz order is kept within one relation type
    kept.sort_by(|a, b| relationship_similarity(&b.1).total_cmp(&relationship_similarity(&a.1)));

    kept.into_iter()
        .take(limit)
        .map(|(name, category, mbid, direction)| {
            let mut candidate = SimilarityCandidate::related(name, SourceKind::Musicbrainz, category)
                .with_metadata("mbid", Value::String(mbid));
            if let Some(direction) = direction {
                candidate = candidate.with_metadata("direction", Value::String(direction));
            }
            candidate
        })
        .collect()
}

#[async_trait]
impl SimilarityProvider for MusicBrainzProvider {
    fn source(&self) -> SourceKind {
        SourceKind::Musicbrainz
    }

    async fn fetch_similar(
        &self,
        artist: &str,
        limit: usize,
    ) -> Result<Vec<SimilarityCandidate>, ProviderError> {
        let mbid = self.search_mbid(artist).await?;
        let lookup: LookupResponse = self
            .get(&format!("/artist/{}", mbid), &[("inc", "artist-rels"), ("fmt", "json")])
            .await?;

        let candidates = relation_candidates(lookup.relations, limit);
        debug!(artist, relations = candidates.len(), "MusicBrainz relations");
        Ok(candidates)
    }
}

// ============================================================================
// Tests
// ============================================================================
