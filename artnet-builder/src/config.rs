//! Resolved build configuration
//!
//! `NetworkConfig` is assembled once at startup from three tiers, highest
//! priority first: command-line overrides, environment (credentials only), the
//! TOML file, then compiled defaults. It is immutable for the rest of the build.

use crate::error::{BuildError, BuildResult};
use crate::identity::DEFAULT_FUZZY_THRESHOLD;
use crate::types::SourceKind;
use artnet_common::config::{
    default_cache_dir, resolve_credential, TomlConfig, LASTFM_API_KEY_ENV, SPOTIFY_CLIENT_ID_ENV,
    SPOTIFY_CLIENT_SECRET_ENV,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_TOP_N: usize = 100;
pub const DEFAULT_MIN_PLAYS: u64 = 5;
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.2;
pub const DEFAULT_MAX_GENRES: usize = 2;
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_NEGATIVE_CACHE_HOURS: u64 = 24;
pub const DEFAULT_RESPONSE_CACHE_DAYS: u64 = 30;
pub const DEFAULT_SIMILARITY_CACHE_DAYS: u64 = 7;

/// Similar artists requested from each provider per lookup
pub fn default_similarity_limit(source: SourceKind) -> usize {
    match source {
        SourceKind::Lastfm => 50,
        SourceKind::Deezer => 30,
        SourceKind::Musicbrainz | SourceKind::Spotify => 20,
        SourceKind::Relationship => 0,
    }
}

/// Values supplied on the command line; `None` leaves lower tiers in charge
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub top_n: Option<usize>,
    pub min_plays: Option<u64>,
    pub min_similarity: Option<f64>,
    pub disabled_sources: Vec<SourceKind>,
    pub lastfm_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub cache_dir: Option<PathBuf>,
    /// Run without any on-disk cache
    pub no_cache: bool,
}

/// Runtime configuration for one network build
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub top_n: usize,
    pub min_plays: u64,
    pub min_similarity: f64,
    pub max_genres: usize,
    pub similarity_limits: BTreeMap<SourceKind, usize>,
    pub enabled_sources: BTreeMap<SourceKind, bool>,
    pub provider_timeout: Duration,
    pub fuzzy_threshold: f64,
    pub negative_cache_hours: u64,
    pub response_cache_days: i64,
    pub similarity_cache_days: i64,
    /// Cache directory; `None` disables every on-disk cache
    pub cache_dir: Option<PathBuf>,
    pub lastfm_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_plays: DEFAULT_MIN_PLAYS,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            max_genres: DEFAULT_MAX_GENRES,
            similarity_limits: SourceKind::PROVIDERS
                .iter()
                .map(|s| (*s, default_similarity_limit(*s)))
                .collect(),
            enabled_sources: SourceKind::PROVIDERS.iter().map(|s| (*s, true)).collect(),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            negative_cache_hours: DEFAULT_NEGATIVE_CACHE_HOURS,
            response_cache_days: DEFAULT_RESPONSE_CACHE_DAYS as i64,
            similarity_cache_days: DEFAULT_SIMILARITY_CACHE_DAYS as i64,
            cache_dir: None,
            lastfm_api_key: None,
            spotify_client_id: None,
            spotify_client_secret: None,
        }
    }
}

impl NetworkConfig {
    /// Merge CLI overrides, environment credentials and the TOML file
    pub fn resolve(toml: &TomlConfig, overrides: &ConfigOverrides) -> Self {
        let defaults = Self::default();
        let network = &toml.network;
        let sources = &toml.sources;
        let creds = &toml.credentials;

        let mut enabled_sources = defaults.enabled_sources.clone();
        for (source, flag) in [
            (SourceKind::Lastfm, sources.lastfm),
            (SourceKind::Deezer, sources.deezer),
            (SourceKind::Musicbrainz, sources.musicbrainz),
            (SourceKind::Spotify, sources.spotify),
        ] {
            if let Some(flag) = flag {
                enabled_sources.insert(source, flag);
            }
        }
        for source in &overrides.disabled_sources {
            enabled_sources.insert(*source, false);
        }

        let cache_dir = if overrides.no_cache {
            None
        } else {
            Some(
                overrides
                    .cache_dir
                    .clone()
                    .or_else(|| toml.cache.dir.clone())
                    .unwrap_or_else(default_cache_dir),
            )
        };

        let days = |v: Option<u64>, default: u64| v.unwrap_or(default).min(365 * 100) as i64;

        Self {
            top_n: overrides.top_n.or(network.top_n).unwrap_or(defaults.top_n),
            min_plays: overrides.min_plays.or(network.min_plays).unwrap_or(defaults.min_plays),
            min_similarity: overrides
                .min_similarity
                .or(network.min_similarity)
                .unwrap_or(defaults.min_similarity),
            max_genres: network.max_genres.unwrap_or(defaults.max_genres),
            similarity_limits: defaults.similarity_limits,
            enabled_sources,
            provider_timeout: network
                .provider_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.provider_timeout),
            fuzzy_threshold: network.fuzzy_threshold.unwrap_or(defaults.fuzzy_threshold),
            negative_cache_hours: toml
                .cache
                .negative_cache_hours
                .unwrap_or(defaults.negative_cache_hours),
            response_cache_days: days(toml.cache.response_cache_days, DEFAULT_RESPONSE_CACHE_DAYS),
            similarity_cache_days: days(toml.cache.similarity_cache_days, DEFAULT_SIMILARITY_CACHE_DAYS),
            cache_dir,
            lastfm_api_key: resolve_credential(
                "lastfm_api_key",
                overrides.lastfm_api_key.as_deref(),
                LASTFM_API_KEY_ENV,
                creds.lastfm_api_key.as_deref(),
            ),
            spotify_client_id: resolve_credential(
                "spotify_client_id",
                overrides.spotify_client_id.as_deref(),
                SPOTIFY_CLIENT_ID_ENV,
                creds.spotify_client_id.as_deref(),
            ),
            spotify_client_secret: resolve_credential(
                "spotify_client_secret",
                overrides.spotify_client_secret.as_deref(),
                SPOTIFY_CLIENT_SECRET_ENV,
                creds.spotify_client_secret.as_deref(),
            ),
        }
    }

    /// Reject values outside their meaningful range
    ///
    /// # Errors
    /// `BuildError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> BuildResult<()> {
        if self.top_n == 0 {
            return Err(BuildError::InvalidConfig("top_n must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(BuildError::InvalidConfig(format!(
                "min_similarity must be within [0, 1], got {}",
                self.min_similarity
            )));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(BuildError::InvalidConfig(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.provider_timeout.is_zero() {
            return Err(BuildError::InvalidConfig("provider_timeout must be positive".to_string()));
        }
        Ok(())
    }

    pub fn is_enabled(&self, source: SourceKind) -> bool {
        self.enabled_sources.get(&source).copied().unwrap_or(false)
    }

    /// Whether the credentials a source needs are present
    pub fn is_configured(&self, source: SourceKind) -> bool {
        match source {
            SourceKind::Lastfm => self.lastfm_api_key.is_some(),
            SourceKind::Spotify => self.spotify_client_id.is_some() && self.spotify_client_secret.is_some(),
            SourceKind::Deezer | SourceKind::Musicbrainz | SourceKind::Relationship => true,
        }
    }

    pub fn similarity_limit(&self, source: SourceKind) -> usize {
        self.similarity_limits
            .get(&source)
            .copied()
            .unwrap_or_else(|| default_similarity_limit(source))
    }

    /// Similarity sources that are both enabled and configured
    ///
    /// Enabled sources missing credentials are logged and skipped.
    ///
    /// # Errors
    /// `BuildError::NoSourcesConfigured` when no source is usable. Raised once,
    /// before any artist is processed; callers may still choose to build a
    /// node-only graph.
    pub fn preflight(&self) -> BuildResult<Vec<SourceKind>> {
        let mut usable = Vec::new();
        let mut missing = Vec::new();

        for source in SourceKind::PROVIDERS {
            if !self.is_enabled(source) {
                continue;
            }
            if self.is_configured(source) {
                usable.push(source);
            } else {
                warn!(source = %source, "Source enabled but credentials are missing; skipping");
                missing.push(source.as_str());
            }
        }

        if usable.is_empty() {
            let detail = if missing.is_empty() {
                "all sources disabled".to_string()
            } else {
                format!("missing credentials for {}", missing.join(", "))
            };
            return Err(BuildError::NoSourcesConfigured(detail));
        }

        info!(
            sources = %usable.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "),
            "Similarity sources ready"
        );
        Ok(usable)
    }
}

// ============================================================================
// Tests
// ============================================================================
