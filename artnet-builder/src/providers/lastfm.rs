//! Last.fm adapter
//!
//! # API Reference
//! - Endpoint: https://ws.audioscrobbler.com/2.0/
//! - `artist.getsimilar`: provider-normalized match scores in [0, 1]
//! - `artist.getinfo`: listeners, playcount, tags
//! - Rate Limit: 5 requests/second
//!
//! Responses are memoized in an optional `JsonCache` keyed by method and
//! sorted parameters, so repeated builds do not re-spend the API quota.

use super::{http_client, rate_limiter, status_error, DirectRateLimiter, Numeric};
use crate::names::name_variants;
use crate::types::{
    ArtistProfile, MetadataProvider, ProviderError, SimilarityCandidate, SimilarityProvider,
    SourceKind,
};
use artnet_common::{cache_key, JsonCache};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

const REQUESTS_PER_SECOND: u32 = 5;

/// Spellings tried before giving up on an artist
const MAX_VARIANTS: usize = 3;

/// Last.fm error codes (https://www.last.fm/api/errorcodes)
const ERROR_INVALID_PARAMETERS: i64 = 6;
const ERROR_RATE_LIMIT: i64 = 29;

#[derive(Debug, Deserialize)]
struct SimilarResponse {
    similarartists: SimilarArtists,
}

#[derive(Debug, Deserialize)]
struct SimilarArtists {
    #[serde(default)]
    artist: Vec<SimilarArtist>,
}

#[derive(Debug, Deserialize)]
struct SimilarArtist {
    name: String,
    #[serde(default)]
    mbid: Option<String>,
    #[serde(rename = "match")]
    score: Option<Numeric>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    artist: InfoArtist,
}

#[derive(Debug, Deserialize)]
struct InfoArtist {
    name: String,
    #[serde(default)]
    mbid: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    stats: Option<InfoStats>,
    #[serde(default)]
    tags: Option<InfoTags>,
}

#[derive(Debug, Deserialize)]
struct InfoStats {
    listeners: Option<Numeric>,
    playcount: Option<Numeric>,
}

#[derive(Debug, Deserialize)]
struct InfoTags {
    #[serde(default)]
    tag: Vec<InfoTag>,
}

#[derive(Debug, Deserialize)]
struct InfoTag {
    name: String,
}

/// Last.fm similarity and metadata adapter
///
/// Without an API key the adapter is inert: `is_configured()` is false and
/// every call returns `ProviderError::NotConfigured`.
pub struct LastfmProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    rate_limiter: DirectRateLimiter,
    cache: Option<Arc<JsonCache<Value>>>,
}

impl LastfmProvider {
    /// # Arguments
    /// * `api_key` - Last.fm API key (blank keys count as missing)
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: LASTFM_API_URL.to_string(),
            rate_limiter: rate_limiter(REQUESTS_PER_SECOND),
            cache: None,
        })
    }

    /// Memoize raw responses in `cache`
    pub fn with_cache(mut self, cache: Arc<JsonCache<Value>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Call one API method, consulting the response cache first
    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("Last.fm API key not set".to_string()))?;

        let key = cache_key(method, params);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&key).await {
                debug!(method, "Last.fm cache hit");
                return Ok(cached);
            }
        }

        self.rate_limiter.until_ready().await;

        let mut query: Vec<(&str, &str)> = vec![("method", method), ("api_key", api_key), ("format", "json")];
        query.extend_from_slice(params);

        debug!(method, "Querying Last.fm");
        let response = self.client.get(&self.base_url).query(&query).send().await?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            if status.is_success() {
                ProviderError::Parse(format!("Last.fm response: {}", e))
            } else {
                status_error("lastfm", status)
            }
        })?;

        check_api_error(&body)?;
        if !status.is_success() {
            return Err(status_error("lastfm", status));
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.insert(key, body.clone()).await {
                warn!(method, error = %e, "Failed to persist Last.fm response cache");
            }
        }

        Ok(body)
    }

    async fn artist_info(&self, artist: &str) -> Result<ArtistProfile, ProviderError> {
        let body = self
            .call("artist.getinfo", &[("artist", artist), ("autocorrect", "1")])
            .await?;
        parse_info(body)
    }
}

/// Translate an in-body `{"error": N, "message": ...}` payload
fn check_api_error(body: &Value) -> Result<(), ProviderError> {
    let Some(code) = body.get("error").and_then(Value::as_i64) else {
        return Ok(());
    };
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();

    Err(match code {
        ERROR_INVALID_PARAMETERS => ProviderError::NotFound(message),
        ERROR_RATE_LIMIT => ProviderError::RateLimited(message),
        _ => ProviderError::Api(format!("Last.fm error {}: {}", code, message)),
    })
}

/// Candidates from an `artist.getsimilar` payload
///
/// Entries with a missing or non-finite match score are dropped; scores are
/// clamped to [0, 1] but otherwise kept exactly as reported.
fn parse_similar(body: Value, limit: usize) -> Result<Vec<SimilarityCandidate>, ProviderError> {
    let parsed: SimilarResponse = serde_json::from_value(body)
        .map_err(|e| ProviderError::Parse(format!("Last.fm similar artists: {}", e)))?;

    Ok(parsed
        .similarartists
        .artist
        .into_iter()
        .filter_map(|a| {
            let score = a.score.as_ref().and_then(Numeric::as_f64)?;
            let mut candidate =
                SimilarityCandidate::scored(a.name, SourceKind::Lastfm, score.clamp(0.0, 1.0));
            if let Some(mbid) = a.mbid.filter(|m| !m.is_empty()) {
                candidate = candidate.with_metadata("mbid", Value::String(mbid));
            }
            if let Some(url) = a.url.filter(|u| !u.is_empty()) {
                candidate = candidate.with_metadata("url", Value::String(url));
            }
            Some(candidate)
        })
        .take(limit)
        .collect())
}

fn parse_info(body: Value) -> Result<ArtistProfile, ProviderError> {
    let parsed: InfoResponse = serde_json::from_value(body)
        .map_err(|e| ProviderError::Parse(format!("Last.fm artist info: {}", e)))?;
    let artist = parsed.artist;

    let (listeners, playcount) = artist
        .stats
        .map(|s| {
            (
                s.listeners.as_ref().map(Numeric::as_u64).unwrap_or(0),
                s.playcount.as_ref().map(Numeric::as_u64).unwrap_or(0),
            )
        })
        .unwrap_or((0, 0));

    Ok(ArtistProfile {
        canonical_name: artist.name,
        listeners,
        playcount,
        url: artist.url.filter(|u| !u.is_empty()),
        mbid: artist.mbid.filter(|m| !m.is_empty()),
        tags: artist
            .tags
            .map(|t| t.tag.into_iter().map(|tag| tag.name).collect())
            .unwrap_or_default(),
        genres: Vec::new(),
        popularity: None,
    })
}

#[async_trait]
impl SimilarityProvider for LastfmProvider {
    fn source(&self) -> SourceKind {
        SourceKind::Lastfm
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Tries the first few name variants until one returns similar artists
    async fn fetch_similar(
        &self,
        artist: &str,
        limit: usize,
    ) -> Result<Vec<SimilarityCandidate>, ProviderError> {
        let limit_param = limit.to_string();
        let mut resolved = false;

        for variant in name_variants(artist).into_iter().take(MAX_VARIANTS) {
            let params = [
                ("artist", variant.as_str()),
                ("limit", limit_param.as_str()),
                ("autocorrect", "1"),
            ];
            match self.call("artist.getsimilar", &params).await {
                Ok(body) => {
                    resolved = true;
                    let candidates = parse_similar(body, limit)?;
                    if !candidates.is_empty() {
                        debug!(artist, variant = %variant, count = candidates.len(), "Last.fm similar artists");
                        return Ok(candidates);
                    }
                }
                Err(ProviderError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        if resolved {
            Ok(Vec::new())
        } else {
            Err(ProviderError::NotFound(format!("Last.fm has no artist '{}'", artist)))
        }
    }
}

#[async_trait]
impl MetadataProvider for LastfmProvider {
    fn source(&self) -> SourceKind {
        SourceKind::Lastfm
    }

    /// Profile of the variant spelling with the largest listener count
    async fn artist_profile(&self, artist: &str) -> Result<Option<ArtistProfile>, ProviderError> {
        let mut best: Option<ArtistProfile> = None;
        let mut last_error = None;

        for variant in name_variants(artist).into_iter().take(MAX_VARIANTS) {
            match self.artist_info(&variant).await {
                Ok(profile) => {
                    if best.as_ref().map_or(true, |b| profile.listeners > b.listeners) {
                        best = Some(profile);
                    }
                }
                Err(ProviderError::NotFound(_)) => {}
                Err(e) => last_error = Some(e),
            }
        }

        match (best, last_error) {
            (Some(profile), _) => Ok(Some(profile)),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(None),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
