//! External similarity and metadata providers
//!
//! Thin HTTP adapters, one per API. Each adapter owns its `reqwest::Client`
//! and a `governor` rate limiter, and converts every failure into a
//! `ProviderError` at its boundary.
//!
//! # Architecture
//! Adapters implement `SimilarityProvider` (all four) and `MetadataProvider`
//! (Last.fm, Spotify). `build_providers` wires them from a resolved
//! `NetworkConfig`, including sources that are disabled or unconfigured so the
//! aggregator can still report them in `apis_used`.

pub mod deezer;
pub mod lastfm;
pub mod musicbrainz;
pub mod spotify;

pub use deezer::DeezerProvider;
pub use lastfm::LastfmProvider;
pub use musicbrainz::MusicBrainzProvider;
pub use spotify::SpotifyProvider;

use crate::config::NetworkConfig;
use crate::types::{MetadataProvider, ProviderError, SimilarityProvider, SourceKind};
use artnet_common::JsonCache;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// User-Agent sent to every API (MusicBrainz rejects anonymous clients)
pub const USER_AGENT: &str = concat!(
    "artnet-builder/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/artnet/artnet)"
);

/// Connection establishment budget, independent of the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Unkeyed token-bucket limiter shared by one adapter's requests
pub type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token bucket allowing `per_second` requests per second (at least one)
pub fn rate_limiter(per_second: u32) -> DirectRateLimiter {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rate))
}

/// HTTP client with request/connect timeouts and the crate User-Agent
///
/// # Errors
/// `ProviderError::Network` if the TLS backend cannot be initialized.
pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {}", e)))
}

/// Map a non-success HTTP status onto the provider error taxonomy
pub(crate) fn status_error(provider: &str, status: StatusCode) -> ProviderError {
    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(format!("{} returned 404", provider)),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            ProviderError::RateLimited(format!("{} returned {}", provider, status))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::NotConfigured(format!("{} rejected credentials ({})", provider, status))
        }
        _ => ProviderError::Api(format!("{} returned {}", provider, status)),
    }
}

/// A JSON field some APIs send as a number and others as a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Num(f64),
    Text(String),
}

impl Numeric {
    /// Finite value, or `None` for unparseable text, NaN and infinities
    pub(crate) fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Num(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub(crate) fn as_u64(&self) -> u64 {
        self.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64).unwrap_or(0)
    }
}

/// All adapters, wired from configuration
pub struct ProviderSet {
    /// Every similarity source, in aggregation order (disabled ones included)
    pub similarity: Vec<Arc<dyn SimilarityProvider>>,
    /// Display-metadata sources used for node enrichment
    pub metadata: Vec<Arc<dyn MetadataProvider>>,
}

/// Construct the four HTTP adapters from a resolved configuration
///
/// Last.fm gets a response cache under `cache_dir` when one is configured.
///
/// # Errors
/// Propagates `http_client` failures.
pub fn build_providers(config: &NetworkConfig) -> Result<ProviderSet, ProviderError> {
    let timeout = config.provider_timeout;

    let response_cache = config.cache_dir.as_ref().map(|dir| {
        Arc::new(JsonCache::open(
            dir.join("lastfm_responses.json"),
            chrono::Duration::days(config.response_cache_days),
        ))
    });

    let mut lastfm = LastfmProvider::new(config.lastfm_api_key.clone(), timeout)?;
    if let Some(cache) = response_cache {
        lastfm = lastfm.with_cache(cache);
    }
    let lastfm = Arc::new(lastfm);
    let deezer = Arc::new(DeezerProvider::new(timeout)?);
    let musicbrainz = Arc::new(MusicBrainzProvider::new(timeout)?);
    let spotify = Arc::new(SpotifyProvider::new(
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
        timeout,
    )?);

    let mut metadata: Vec<Arc<dyn MetadataProvider>> = Vec::new();
    if config.is_enabled(SourceKind::Lastfm) && lastfm.is_configured() {
        metadata.push(lastfm.clone());
    }
    if config.is_enabled(SourceKind::Spotify) && spotify.is_configured() {
        metadata.push(spotify.clone());
    }

    Ok(ProviderSet {
        similarity: vec![lastfm, deezer, musicbrainz, spotify],
        metadata,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_accepts_string_and_number() {
        let n: Numeric = serde_json::from_str("0.75").unwrap();
        let s: Numeric = serde_json::from_str("\"0.5\"").unwrap();
        let bad: Numeric = serde_json::from_str("\"n/a\"").unwrap();
        assert_eq!(n.as_f64(), Some(0.75));
        assert_eq!(s.as_f64(), Some(0.5));
        assert_eq!(bad.as_f64(), None);
    }

    #[test]
    fn test_numeric_rejects_non_finite() {
        let s: Numeric = serde_json::from_str("\"NaN\"").unwrap();
        assert_eq!(s.as_f64(), None);
        assert_eq!(s.as_u64(), 0);
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error("deezer", StatusCode::NOT_FOUND),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            status_error("musicbrainz", StatusCode::SERVICE_UNAVAILABLE),
            ProviderError::RateLimited(_)
        ));
        assert!(matches!(
            status_error("spotify", StatusCode::UNAUTHORIZED),
            ProviderError::NotConfigured(_)
        ));
        assert!(matches!(
            status_error("lastfm", StatusCode::BAD_GATEWAY),
            ProviderError::Api(_)
        ));
    }

    #[test]
    fn test_rate_limiter_zero_is_clamped() {
        let limiter = rate_limiter(0);
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_user_agent_identifies_crate() {
        assert!(USER_AGENT.starts_with("artnet-builder/"));
    }
}
