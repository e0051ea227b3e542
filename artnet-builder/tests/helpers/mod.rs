//! Test Helper Utilities
//!
//! In-memory providers and builder setup shared by the integration tests.
//! Nothing here touches the network.

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::{capture_logs, LogCapture};

use artnet_builder::aggregator::SimilarityAggregator;
use artnet_builder::config::NetworkConfig;
use artnet_builder::network::NetworkBuilder;
use artnet_builder::types::{
    ArtistProfile, MetadataProvider, ProviderError, SimilarityCandidate, SimilarityProvider, SourceKind,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Canned similarity source keyed by lowercase artist name
///
/// Unknown artists yield `NotFound`; `failing` makes every call an API error.
pub struct StubSimilarity {
    source: SourceKind,
    responses: HashMap<String, Vec<SimilarityCandidate>>,
    failing: bool,
    configured: bool,
    calls: AtomicUsize,
}

impl StubSimilarity {
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            responses: HashMap::new(),
            failing: false,
            configured: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(source: SourceKind) -> Self {
        Self {
            failing: true,
            ..Self::new(source)
        }
    }

    pub fn unconfigured(source: SourceKind) -> Self {
        Self {
            configured: false,
            ..Self::new(source)
        }
    }

    /// Scored candidates for `artist`
    pub fn scores(mut self, artist: &str, rows: &[(&str, f64)]) -> Self {
        let source = self.source;
        self.responses.insert(
            artist.to_lowercase(),
            rows.iter()
                .map(|(name, score)| SimilarityCandidate::scored(*name, source, *score))
                .collect(),
        );
        self
    }

    /// Relationship candidates for `artist`
    pub fn relations(mut self, artist: &str, rows: &[(&str, &str)]) -> Self {
        let source = self.source;
        self.responses.insert(
            artist.to_lowercase(),
            rows.iter()
                .map(|(name, category)| SimilarityCandidate::related(*name, source, *category))
                .collect(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimilarityProvider for StubSimilarity {
    fn source(&self) -> SourceKind {
        self.source
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_similar(&self, artist: &str, limit: usize) -> Result<Vec<SimilarityCandidate>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(ProviderError::Api(format!("{} unavailable", self.source)));
        }
        match self.responses.get(&artist.to_lowercase()) {
            Some(rows) => Ok(rows.iter().take(limit).cloned().collect()),
            None => Err(ProviderError::NotFound(artist.to_string())),
        }
    }
}

/// Canned display-metadata source
pub struct StubMetadata {
    source: SourceKind,
    profiles: HashMap<String, ArtistProfile>,
    failing: bool,
}

impl StubMetadata {
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            profiles: HashMap::new(),
            failing: false,
        }
    }

    pub fn failing(source: SourceKind) -> Self {
        Self {
            failing: true,
            ..Self::new(source)
        }
    }

    pub fn profile(mut self, artist: &str, profile: ArtistProfile) -> Self {
        self.profiles.insert(artist.to_lowercase(), profile);
        self
    }
}

#[async_trait]
impl MetadataProvider for StubMetadata {
    fn source(&self) -> SourceKind {
        self.source
    }

    async fn artist_profile(&self, artist: &str) -> Result<Option<ArtistProfile>, ProviderError> {
        if self.failing {
            return Err(ProviderError::Network("connection refused".to_string()));
        }
        Ok(self.profiles.get(&artist.to_lowercase()).cloned())
    }
}

/// Defaults with a play-count floor of 1
pub fn test_config() -> NetworkConfig {
    NetworkConfig {
        min_plays: 1,
        provider_timeout: Duration::from_secs(2),
        ..NetworkConfig::default()
    }
}

/// Builder over the given similarity providers (all enabled)
pub fn builder_with(config: NetworkConfig, providers: Vec<Arc<StubSimilarity>>) -> NetworkBuilder {
    let mut aggregator = SimilarityAggregator::new(config.provider_timeout);
    for provider in providers {
        let limit = config.similarity_limit(provider.source());
        aggregator = aggregator.with_provider(provider, true, limit);
    }
    NetworkBuilder::new(config, aggregator)
}
