//! Network building
//!
//! Orchestrates a complete build: artist selection, node enrichment, per-artist
//! similarity gathering, pairwise edge weighting and undirected collapse.
//!
//! # Architecture
//! ```text
//! artists ─▶ select ─▶ nodes (metadata + genre)
//!                  └─▶ for each A: aggregator ─▶ enhance ─▶ for each B≠A: weighter
//!                                                                 └─▶ dedup ─▶ graph
//! ```
//!
//! # Failure semantics
//! Only an empty selection fails the build. Provider and enrichment failures
//! degrade the output (fewer edges, default node metadata); a total outage
//! yields a node-only graph.

pub mod model;
pub mod stats;

pub use model::{
    ApiUsage, ArtistInput, BuildParameters, EdgeRecord, NetworkGraph, NetworkMetadata, NetworkNode,
    SourceDetail,
};
pub use stats::{network_statistics, NetworkStatistics};

use crate::aggregator::SimilarityAggregator;
use crate::config::NetworkConfig;
use crate::error::{BuildError, BuildResult};
use crate::genre::{genre_color, GenreClassifier};
use crate::identity::{IdentityResolver, TargetUniverse};
use crate::names::slugify;
use crate::providers::build_providers;
use crate::types::{ArtistProfile, MetadataProvider, SourceKind};
use crate::weighting::{EdgeWeighter, WeightedEdge};
use artnet_common::{JsonCache, NegativeCache};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Builds a `NetworkGraph` from a list of artists
pub struct NetworkBuilder {
    config: NetworkConfig,
    aggregator: SimilarityAggregator,
    resolver: IdentityResolver,
    weighter: EdgeWeighter,
    classifier: GenreClassifier,
    metadata_providers: Vec<Arc<dyn MetadataProvider>>,
}

impl NetworkBuilder {
    /// Builder over an already-assembled aggregator
    ///
    /// The identity resolver uses the curated table and `config.fuzzy_threshold`.
    pub fn new(config: NetworkConfig, aggregator: SimilarityAggregator) -> Self {
        let resolver = IdentityResolver::new().with_threshold(config.fuzzy_threshold);
        Self {
            config,
            aggregator,
            resolver,
            weighter: EdgeWeighter::new(),
            classifier: GenreClassifier::new(),
            metadata_providers: Vec::new(),
        }
    }

    /// Wire the HTTP providers and on-disk caches described by `config`
    ///
    /// # Errors
    /// `BuildError::InvalidConfig` if the HTTP client cannot be constructed.
    pub fn from_config(config: NetworkConfig) -> BuildResult<Self> {
        let providers = build_providers(&config).map_err(|e| BuildError::InvalidConfig(e.to_string()))?;

        let mut aggregator = SimilarityAggregator::new(config.provider_timeout);
        for provider in providers.similarity {
            let source = provider.source();
            aggregator = aggregator.with_provider(
                provider,
                config.is_enabled(source),
                config.similarity_limit(source),
            );
        }

        if let Some(dir) = &config.cache_dir {
            info!(cache_dir = %dir.display(), "Using on-disk caches");
            aggregator = aggregator
                .with_similarity_cache(Arc::new(JsonCache::open(
                    dir.join("similarity_cache.json"),
                    chrono::Duration::days(config.similarity_cache_days),
                )))
                .with_negative_cache(Arc::new(NegativeCache::open(
                    dir.join("negative_cache.json"),
                    config.negative_cache_hours,
                )));
        }

        let mut builder = Self::new(config, aggregator);
        for provider in providers.metadata {
            builder = builder.with_metadata_provider(provider);
        }
        Ok(builder)
    }

    /// Replace the identity resolver (e.g. one extended with user aliases)
    pub fn with_resolver(mut self, resolver: IdentityResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_weighter(mut self, weighter: EdgeWeighter) -> Self {
        self.weighter = weighter;
        self
    }

    /// Add a display-metadata source for node enrichment
    pub fn with_metadata_provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata_providers.push(provider);
        self
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Working set: merged by node id, filtered, sorted and truncated
    ///
    /// Artists sharing a node id (same name up to case) are merged by summing
    /// play counts. Order is play count descending, then name.
    ///
    /// # Errors
    /// - `BuildError::EmptyInput` if no artist has a non-blank name
    /// - `BuildError::NoEligibleArtists` if none reaches `min_plays`
    pub fn select_artists(&self, artists: &[ArtistInput]) -> BuildResult<Vec<ArtistInput>> {
        let mut merged: Vec<ArtistInput> = Vec::new();
        let mut index_by_id: HashMap<String, usize> = HashMap::new();

        for artist in artists {
            let name = artist.name.trim();
            if name.is_empty() {
                continue;
            }
            let id = slugify(name);
            match index_by_id.get(&id).copied() {
                Some(i) => merged[i].play_count = merged[i].play_count.saturating_add(artist.play_count),
                None => {
                    index_by_id.insert(id, merged.len());
                    merged.push(ArtistInput::new(name, artist.play_count));
                }
            }
        }

        if merged.is_empty() {
            return Err(BuildError::EmptyInput);
        }
        let total = merged.len();

        let mut selected: Vec<ArtistInput> = merged
            .into_iter()
            .filter(|a| a.play_count >= self.config.min_plays)
            .collect();
        if selected.is_empty() {
            return Err(BuildError::NoEligibleArtists {
                min_plays: self.config.min_plays,
                total,
            });
        }

        selected.sort_by(|a, b| b.play_count.cmp(&a.play_count).then_with(|| a.name.cmp(&b.name)));
        selected.truncate(self.config.top_n);
        Ok(selected)
    }

    /// Node for one artist, enriched best-effort from the metadata providers
    pub async fn build_node(&self, artist: &ArtistInput, rank: usize) -> NetworkNode {
        let mut lastfm: Option<ArtistProfile> = None;
        let mut spotify: Option<ArtistProfile> = None;

        for provider in &self.metadata_providers {
            let source = provider.source();
            let outcome = tokio::time::timeout(self.config.provider_timeout, provider.artist_profile(&artist.name)).await;
            match outcome {
                Ok(Ok(Some(profile))) => match source {
                    SourceKind::Spotify => spotify = Some(profile),
                    _ => {
                        if lastfm.is_none() {
                            lastfm = Some(profile);
                        }
                    }
                },
                Ok(Ok(None)) => debug!(source = %source, artist = %artist.name, "No metadata profile"),
                Ok(Err(e)) => warn!(
                    source = %source,
                    artist = %artist.name,
                    error = %e,
                    "Metadata lookup failed, using defaults"
                ),
                Err(_) => warn!(source = %source, artist = %artist.name, "Metadata lookup timed out"),
            }
        }

        let tags = lastfm.as_ref().map(|p| p.tags.clone()).unwrap_or_default();
        let spotify_genres = spotify.as_ref().map(|p| p.genres.clone()).unwrap_or_default();
        let genres = self.classifier.classify(&tags, &spotify_genres, self.config.max_genres);
        let cluster_genre = genres
            .first()
            .cloned()
            .unwrap_or_else(|| crate::genre::OTHER.to_string());

        let canonical_name = lastfm
            .as_ref()
            .or(spotify.as_ref())
            .map(|p| p.canonical_name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| artist.name.clone());

        NetworkNode {
            id: slugify(&artist.name),
            name: artist.name.clone(),
            canonical_name,
            play_count: artist.play_count,
            rank,
            listeners: lastfm.as_ref().map(|p| p.listeners).unwrap_or(0),
            color: genre_color(&cluster_genre).to_string(),
            genres,
            cluster_genre,
            popularity: spotify.as_ref().and_then(|p| p.popularity),
            url: lastfm
                .as_ref()
                .and_then(|p| p.url.clone())
                .or_else(|| spotify.as_ref().and_then(|p| p.url.clone())),
            mbid: lastfm.as_ref().and_then(|p| p.mbid.clone()),
        }
    }

    /// Build the complete network
    ///
    /// # Errors
    /// Only selection failures (`EmptyInput`, `NoEligibleArtists`). Everything
    /// past selection degrades instead of failing.
    pub async fn generate_network(&self, artists: &[ArtistInput]) -> BuildResult<NetworkGraph> {
        let build_id = Uuid::new_v4();
        let span = info_span!("network_build", build_id = %build_id);
        self.generate(artists, build_id).instrument(span).await
    }

    async fn generate(&self, artists: &[ArtistInput], build_id: Uuid) -> BuildResult<NetworkGraph> {
        let selected = self.select_artists(artists)?;
        info!(
            input = artists.len(),
            selected = selected.len(),
            sources = ?self.aggregator.active_sources(),
            "Building artist network"
        );

        let mut nodes = Vec::with_capacity(selected.len());
        for (i, artist) in selected.iter().enumerate() {
            nodes.push(self.build_node(artist, i + 1).await);
        }

        let universe = TargetUniverse::new(selected.iter().map(|a| a.name.as_str()));
        let mut kept: BTreeMap<(String, String), WeightedEdge> = BTreeMap::new();

        for (i, source) in selected.iter().enumerate() {
            let candidates = self
                .aggregator
                .get_enhanced_similarity(&source.name, &universe, &self.resolver)
                .await;

            let mut found = 0usize;
            for (j, target) in selected.iter().enumerate() {
                if i == j {
                    continue;
                }
                let Some(edge) = self.weighter.create_weighted_edge(&source.name, &target.name, &candidates) else {
                    continue;
                };
                if edge.similarity < self.config.min_similarity {
                    continue;
                }
                found += 1;

                let (a, b) = (slugify(&source.name), slugify(&target.name));
                let key = if a <= b { (a, b) } else { (b, a) };
                // Ties keep the first-evaluated direction
                let replace = kept
                    .get(&key)
                    .map_or(true, |existing| edge.similarity > existing.similarity);
                if replace {
                    kept.insert(key, edge);
                }
            }

            info!(
                artist = %source.name,
                progress = format!("{}/{}", i + 1, selected.len()),
                edges = found,
                "Artist processed"
            );
        }

        let mut edges: Vec<EdgeRecord> = kept
            .values()
            .map(|edge| {
                EdgeRecord::from_weighted(edge, slugify(&edge.source_artist), slugify(&edge.target_artist))
            })
            .collect();
        edges.sort_by(|x, y| {
            y.weight
                .total_cmp(&x.weight)
                .then_with(|| x.source.cmp(&y.source))
                .then_with(|| x.target.cmp(&y.target))
        });

        let statistics = network_statistics(&edges);
        let apis_used = self
            .aggregator
            .source_status()
            .into_iter()
            .map(|(source, status)| {
                let usage = ApiUsage {
                    enabled: status.enabled,
                    configured: status.configured,
                    contributed: statistics.source_edges.get(&source).copied().unwrap_or(0) > 0,
                    requests: status.requests,
                    cache_hits: status.cache_hits,
                    negative_hits: status.negative_hits,
                    failures: status.failures,
                };
                (source, usage)
            })
            .collect();

        if edges.is_empty() {
            warn!("No edges found; emitting a node-only graph");
        }
        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            factual = statistics.factual_edges,
            "Network build complete"
        );

        Ok(NetworkGraph {
            metadata: NetworkMetadata {
                generated: Utc::now(),
                build_id,
                input_artists: artists.len(),
                total_artists: nodes.len(),
                total_edges: edges.len(),
                parameters: BuildParameters::from(&self.config),
                apis_used,
                source_breakdown: statistics,
            },
            nodes,
            edges,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
