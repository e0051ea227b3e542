//! Deezer adapter
//!
//! Deezer exposes related artists as an ordered list without scores, so the
//! score is derived from list position plus a small popularity bonus:
//!
//! `score = min(1.0, (n - i) / n + min(0.2, nb_fan / 1_000_000))`
//!
//! # API Reference
//! - Search: https://api.deezer.com/search/artist?q=NAME
//! - Related: https://api.deezer.com/artist/{id}/related
//! - Rate Limit: 10 requests/second (50 per 5s documented quota)

use super::{http_client, rate_limiter, status_error, DirectRateLimiter};
use crate::types::{ProviderError, SimilarityCandidate, SimilarityProvider, SourceKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const DEEZER_API_URL: &str = "https://api.deezer.com";

const REQUESTS_PER_SECOND: u32 = 10;

/// Search results inspected when looking for an exact name match
const SEARCH_LIMIT: usize = 10;

const ERROR_QUOTA: i64 = 4;
const ERROR_NO_DATA: i64 = 800;

/// Fan count that earns the full popularity bonus
const FAN_BONUS_SCALE: f64 = 1_000_000.0;
const MAX_FAN_BONUS: f64 = 0.2;

#[derive(Debug, Deserialize)]
struct ArtistList {
    #[serde(default)]
    data: Vec<DeezerArtist>,
}

#[derive(Debug, Clone, Deserialize)]
struct DeezerArtist {
    id: u64,
    name: String,
    #[serde(default)]
    nb_fan: u64,
    #[serde(default)]
    link: Option<String>,
}

/// Deezer related-artists adapter (no credentials required)
pub struct DeezerProvider {
    client: Client,
    base_url: String,
    rate_limiter: DirectRateLimiter,
}

impl DeezerProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: DEEZER_API_URL.to_string(),
            rate_limiter: rate_limiter(REQUESTS_PER_SECOND),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ProviderError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Querying Deezer");
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("deezer", status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Deezer response: {}", e)))?;
        check_api_error(&body)?;

        serde_json::from_value(body).map_err(|e| ProviderError::Parse(format!("Deezer payload: {}", e)))
    }

    async fn search_artist(&self, artist: &str) -> Result<DeezerArtist, ProviderError> {
        let limit = SEARCH_LIMIT.to_string();
        let results: ArtistList = self
            .get("/search/artist", &[("q", artist), ("limit", limit.as_str())])
            .await?;
        pick_search_match(results.data, artist)
            .ok_or_else(|| ProviderError::NotFound(format!("Deezer has no artist '{}'", artist)))
    }
}

/// Translate an in-body `{"error": {"code": N, ...}}` payload
fn check_api_error(body: &Value) -> Result<(), ProviderError> {
    let Some(error) = body.get("error") else {
        return Ok(());
    };
    let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();

    Err(match code {
        ERROR_QUOTA => ProviderError::RateLimited(message),
        ERROR_NO_DATA => ProviderError::NotFound(message),
        _ => ProviderError::Api(format!("Deezer error {}: {}", code, message)),
    })
}

/// Exact case-insensitive name match, else the top search hit
fn pick_search_match(results: Vec<DeezerArtist>, artist: &str) -> Option<DeezerArtist> {
    let wanted = artist.to_lowercase();
    let exact = results.iter().position(|a| a.name.to_lowercase() == wanted);
    let index = exact.unwrap_or(0);
    results.into_iter().nth(index)
}

/// Position-derived similarity for the i-th of n related artists
fn position_score(index: usize, total: usize, nb_fan: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let position = (total - index) as f64 / total as f64;
    let popularity = (nb_fan as f64 / FAN_BONUS_SCALE).min(MAX_FAN_BONUS);
    (position + popularity).min(1.0)
}

fn related_candidates(related: Vec<DeezerArtist>, limit: usize) -> Vec<SimilarityCandidate> {
    let related: Vec<DeezerArtist> = related.into_iter().take(limit).collect();
    let total = related.len();

    related
        .into_iter()
        .enumerate()
        .map(|(i, a)| {
            let score = position_score(i, total, a.nb_fan);
            let mut candidate = SimilarityCandidate::scored(a.name, SourceKind::Deezer, score)
                .with_metadata("deezer_id", Value::from(a.id))
                .with_metadata("nb_fan", Value::from(a.nb_fan));
            if let Some(link) = a.link {
                candidate = candidate.with_metadata("url", Value::String(link));
            }
            candidate
        })
        .collect()
}

#[async_trait]
impl SimilarityProvider for DeezerProvider {
    fn source(&self) -> SourceKind {
        SourceKind::Deezer
    }

    async fn fetch_similar(
        &self,
        artist: &str,
        limit: usize,
    ) -> Result<Vec<SimilarityCandidate>, ProviderError> {
        let found = self.search_artist(artist).await?;
        debug!(artist, deezer_id = found.id, matched = %found.name, "Deezer artist resolved");

        let limit_param = limit.to_string();
        let related: ArtistList = self
            .get(&format!("/artist/{}/related", found.id), &[("limit", limit_param.as_str())])
            .await?;

        Ok(related_candidates(related.data, limit))
    }
}

// ============================================================================
// Tests
// ============================================================================
