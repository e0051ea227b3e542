//! Spotify adapter
//!
//! Spotify's related-artists endpoint is unavailable to client-credential apps,
//! so similarity is approximated by playlist co-occurrence: search playlists
//! built around the artist, keep the ones that actually contain the artist, and
//! count which other artists appear alongside it.
//!
//! # Implementation
//! - Auth: client-credentials token, refreshed a minute before expiry
//! - Score: `count / max_count` over co-occurring artists (self excluded)
//! - Also a `MetadataProvider` supplying genres and popularity
//!
//! # API Reference
//! - Token: https://accounts.spotify.com/api/token
//! - Search: https://api.spotify.com/v1/search
//! - Playlist tracks: https://api.spotify.com/v1/playlists/{id}/tracks

use super::{http_client, rate_limiter, status_error, DirectRateLimiter};
use crate::types::{
    ArtistProfile, MetadataProvider, ProviderError, SimilarityCandidate, SimilarityProvider,
    SourceKind,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

const REQUESTS_PER_SECOND: u32 = 10;

/// Playlists requested per search query
const PLAYLIST_SEARCH_LIMIT: &str = "20";
/// Playlists analyzed per search query
const PLAYLISTS_PER_QUERY: usize = 5;
const PLAYLIST_TRACK_LIMIT: &str = "100";

/// Refresh this long before the token actually expires
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct PlaylistSearch {
    playlists: Page<Option<PlaylistRef>>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PlaylistRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArtistSearch {
    artists: Page<Option<SpotifyArtist>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SpotifyArtist {
    id: String,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    popularity: Option<u32>,
    #[serde(default)]
    followers: Option<Followers>,
    #[serde(default)]
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Deserialize)]
struct Followers {
    total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Spotify playlist co-occurrence adapter
pub struct SpotifyProvider {
    client: Client,
    credentials: Option<(String, String)>,
    api_url: String,
    token_url: String,
    token: Mutex<Option<AccessToken>>,
    rate_limiter: DirectRateLimiter,
}

impl SpotifyProvider {
    /// Both `client_id` and `client_secret` are needed; otherwise the adapter
    /// reports itself unconfigured.
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let credentials = client_id
            .filter(|id| !id.trim().is_empty())
            .zip(client_secret.filter(|s| !s.trim().is_empty()));

        Ok(Self {
            client: http_client(timeout)?,
            credentials,
            api_url: SPOTIFY_API_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            token: Mutex::new(None),
            rate_limiter: rate_limiter(REQUESTS_PER_SECOND),
        })
    }

    /// Valid bearer token, fetching a new one when missing or near expiry
    async fn access_token(&self) -> Result<String, ProviderError> {
        let (client_id, client_secret) = self
            .credentials
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("Spotify client credentials not set".to_string()))?;

        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < current.expires_at {
                return Ok(current.value.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("spotify", status));
        }
        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Spotify token: {}", e)))?;

        let value = parsed.access_token.clone();
        *token = Some(AccessToken {
            value: parsed.access_token,
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        });
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ProviderError> {
        let token = self.access_token().await?;
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.api_url, path);
        debug!(url = %url, "Querying Spotify");
        let response = self.client.get(&url).bearer_auth(token).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("spotify", status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Parse(format!("Spotify response: {}", e)))
    }

    /// Artist names per playlist track, flattened
    async fn playlist_artists(&self, playlist_id: &str) -> Result<Vec<String>, ProviderError> {
        let page: Page<PlaylistItem> = self
            .get(
                &format!("/playlists/{}/tracks", playlist_id),
                &[("limit", PLAYLIST_TRACK_LIMIT)],
            )
            .await?;
        Ok(page
            .items
            .into_iter()
            .filter_map(|item| item.track)
            .flat_map(|track| track.artists.into_iter().map(|a| a.name))
            .collect())
    }
}

/// Playlist search queries for an artist
fn playlist_queries(artist: &str) -> [String; 4] {
    [
        format!("\"{}\"", artist),
        format!("{} radio", artist),
        format!("This is {}", artist),
        format!("{} mix", artist),
    ]
}

/// Co-occurrence counts keyed by lowercase name, with the first-seen spelling
///
/// Only playlists containing `artist` are counted; the artist itself is excluded.
fn count_co_occurrences(playlists: &[Vec<String>], artist: &str) -> BTreeMap<String, (String, usize)> {
    let target = artist.to_lowercase();
    let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();

    for names in playlists {
        if !names.iter().any(|n| n.to_lowercase() == target) {
            continue;
        }
        for name in names {
            let key = name.to_lowercase();
            if key == target {
                continue;
            }
            counts.entry(key).or_insert_with(|| (name.clone(), 0)).1 += 1;
        }
    }

    counts
}

/// Candidates scored by `count / max_count`, most frequent first
fn co_occurrence_candidates(
    counts: BTreeMap<String, (String, usize)>,
    limit: usize,
) -> Vec<SimilarityCandidate> {
    let Some(max_count) = counts.values().map(|(_, c)| *c).max().filter(|m| *m > 0) else {
        return Vec::new();
    };

    let mut ranked: Vec<(String, usize)> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(name, count)| {
            SimilarityCandidate::scored(name, SourceKind::Spotify, count as f64 / max_count as f64)
                .with_metadata("co_occurrences", Value::from(count))
        })
        .collect()
}

/// Exact case-insensitive name match, else the first result
fn pick_artist(results: Vec<Option<SpotifyArtist>>, artist: &str) -> Option<SpotifyArtist> {
    let results: Vec<SpotifyArtist> = results.into_iter().flatten().collect();
    let wanted = artist.to_lowercase();
    let index = results
        .iter()
        .position(|a| a.name.to_lowercase() == wanted)
        .unwrap_or(0);
    results.into_iter().nth(index)
}

fn artist_profile_from(artist: SpotifyArtist) -> ArtistProfile {
    ArtistProfile {
        canonical_name: artist.name,
        listeners: artist.followers.and_then(|f| f.total).unwrap_or(0),
        playcount: 0,
        url: artist.external_urls.and_then(|u| u.spotify),
        mbid: None,
        tags: Vec::new(),
        genres: artist.genres,
        popularity: artist.popularity,
    }
}

#[async_trait]
impl SimilarityProvider for SpotifyProvider {
    fn source(&self) -> SourceKind {
        SourceKind::Spotify
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn fetch_similar(
        &self,
        artist: &str,
        limit: usize,
    ) -> Result<Vec<SimilarityCandidate>, ProviderError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut playlists: Vec<Vec<String>> = Vec::new();

        for query in playlist_queries(artist) {
            let search: PlaylistSearch = self
                .get(
                    "/search",
                    &[("q", query.as_str()), ("type", "playlist"), ("limit", PLAYLIST_SEARCH_LIMIT)],
                )
                .await?;

            let ids: Vec<String> = search
                .playlists
                .items
                .into_iter()
                .flatten()
                .map(|p| p.id)
                .filter(|id| seen.insert(id.clone()))
                .take(PLAYLISTS_PER_QUERY)
                .collect();

            for id in ids {
                match self.playlist_artists(&id).await {
                    Ok(names) => playlists.push(names),
                    Err(e @ ProviderError::RateLimited(_)) => return Err(e),
                    Err(e) => debug!(playlist = %id, error = %e, "Skipping unreadable Spotify playlist"),
                }
            }
        }

        if playlists.is_empty() {
            return Err(ProviderError::NotFound(format!("no Spotify playlists for '{}'", artist)));
        }

        let counts = count_co_occurrences(&playlists, artist);
        debug!(artist, playlists = playlists.len(), co_artists = counts.len(), "Spotify co-occurrence");
        Ok(co_occurrence_candidates(counts, limit))
    }
}

#[async_trait]
impl MetadataProvider for SpotifyProvider {
    fn source(&self) -> SourceKind {
        SourceKind::Spotify
    }

    async fn artist_profile(&self, artist: &str) -> Result<Option<ArtistProfile>, ProviderError> {
        let query = format!("artist:\"{}\"", artist.replace('"', ""));
        let search: ArtistSearch = self
            .get("/search", &[("q", query.as_str()), ("type", "artist"), ("limit", "5")])
            .await?;

        Ok(pick_artist(search.artists.items, artist).map(|a| {
            debug!(artist, spotify_id = %a.id, genres = a.genres.len(), "Spotify artist resolved");
            artist_profile_from(a)
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
