//! Multi-source similarity aggregation
//!
//! Fans one artist out to every enabled provider, waits for all of them under
//! an independent per-provider timeout, and groups the results by source.
//!
//! # Architecture
//! - Providers run concurrently via `futures::future::join_all`; a slow or
//!   failing provider only empties its own list.
//! - A `NegativeCache` short-circuits artists a provider confirmed it does not
//!   know. A `JsonCache` memoizes successful results between builds.
//! - Every provider source is always a key in the result, even when disabled.

use crate::identity::{IdentityResolver, TargetUniverse};
use crate::types::{ProviderError, SimilarityCandidate, SimilarityProvider, SourceCandidates, SourceKind};
use artnet_common::{cache_key, JsonCache, NegativeCache};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default per-provider time budget
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime view of one source, reported in build metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub enabled: bool,
    pub configured: bool,
    /// Lookups answered by the provider itself
    pub requests: usize,
    /// Lookups answered from the similarity cache
    pub cache_hits: usize,
    /// Lookups skipped because of a negative-cache entry
    pub negative_hits: usize,
    /// Errors and timeouts absorbed into empty lists
    pub failures: usize,
}

struct ProviderSlot {
    provider: Arc<dyn SimilarityProvider>,
    enabled: bool,
    limit: usize,
    requests: AtomicUsize,
    cache_hits: AtomicUsize,
    negative_hits: AtomicUsize,
    failures: AtomicUsize,
}

impl ProviderSlot {
    fn active(&self) -> bool {
        self.enabled && self.provider.is_configured()
    }
}

/// Per-artist similarity gathering across all providers
pub struct SimilarityAggregator {
    slots: Vec<ProviderSlot>,
    timeout: Duration,
    similarity_cache: Option<Arc<JsonCache<Vec<SimilarityCandidate>>>>,
    negative_cache: Option<Arc<NegativeCache>>,
}

impl SimilarityAggregator {
    /// # Arguments
    /// * `timeout` - Budget for each provider call, independent of the others
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Vec::new(),
            timeout,
            similarity_cache: None,
            negative_cache: None,
        }
    }

    /// Register a provider with its result limit
    ///
    /// Disabled providers are kept so their source still appears in results
    /// and status reports.
    pub fn with_provider(mut self, provider: Arc<dyn SimilarityProvider>, enabled: bool, limit: usize) -> Self {
        self.slots.push(ProviderSlot {
            provider,
            enabled,
            limit,
            requests: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            negative_hits: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        });
        self
    }

    pub fn with_similarity_cache(mut self, cache: Arc<JsonCache<Vec<SimilarityCandidate>>>) -> Self {
        self.similarity_cache = Some(cache);
        self
    }

    pub fn with_negative_cache(mut self, cache: Arc<NegativeCache>) -> Self {
        self.negative_cache = Some(cache);
        self
    }

    /// Sources that will actually be queried
    pub fn active_sources(&self) -> Vec<SourceKind> {
        self.slots
            .iter()
            .filter(|s| s.active())
            .map(|s| s.provider.source())
            .collect()
    }

    /// Status of every registered source plus the curated relationship source
    pub fn source_status(&self) -> BTreeMap<SourceKind, SourceStatus> {
        let mut status: BTreeMap<SourceKind, SourceStatus> = self
            .slots
            .iter()
            .map(|s| {
                (
                    s.provider.source(),
                    SourceStatus {
                        enabled: s.enabled,
                        configured: s.provider.is_configured(),
                        requests: s.requests.load(Ordering::Relaxed),
                        cache_hits: s.cache_hits.load(Ordering::Relaxed),
                        negative_hits: s.negative_hits.load(Ordering::Relaxed),
                        failures: s.failures.load(Ordering::Relaxed),
                    },
                )
            })
            .collect();
        status.insert(
            SourceKind::Relationship,
            SourceStatus {
                enabled: true,
                configured: true,
                ..SourceStatus::default()
            },
        );
        status
    }

    /// Candidates from every provider for `artist`, keyed by source
    ///
    /// Each provider source is present in the map; inactive or failing sources
    /// map to an empty list. Never fails.
    pub async fn get_multi_source_similarity(&self, artist: &str) -> SourceCandidates {
        let mut result: SourceCandidates = SourceKind::PROVIDERS
            .iter()
            .map(|s| (*s, Vec::new()))
            .collect();

        let lookups = self
            .slots
            .iter()
            .filter(|slot| slot.active())
            .map(|slot| async move { (slot.provider.source(), self.lookup(slot, artist).await) });

        for (source, candidates) in join_all(lookups).await {
            result.entry(source).or_default().extend(candidates);
        }

        let total: usize = result.values().map(Vec::len).sum();
        debug!(artist, candidates = total, "Aggregated similarity");
        result
    }

    /// Identity-enhanced candidates for `artist` against the working set
    ///
    /// Each provider list gains `Canonicalized` entries for alternate spellings
    /// of working-set artists. Curated group memberships go to a separate
    /// `relationship` list so they count as one source, not one per provider.
    pub fn enhance(
        &self,
        artist: &str,
        raw: SourceCandidates,
        universe: &TargetUniverse,
        resolver: &IdentityResolver,
    ) -> SourceCandidates {
        let mut enhanced: SourceCandidates = raw
            .into_iter()
            .map(|(source, list)| {
                let list: Vec<SimilarityCandidate> = resolver
                    .enhance_similarity_matching(artist, &list, universe)
                    .into_iter()
                    .filter(|c| !matches!(c, SimilarityCandidate::RelationshipDerived { .. }))
                    .collect();
                (source, list)
            })
            .collect();

        let related: Vec<SimilarityCandidate> = resolver
            .find_related_artists(artist, universe)
            .into_iter()
            .filter(|r| !r.name.eq_ignore_ascii_case(artist))
            .map(|r| SimilarityCandidate::RelationshipDerived {
                name: r.name,
                relationship: r.relationship,
                strength: r.strength,
            })
            .collect();
        if !related.is_empty() {
            debug!(artist, related = related.len(), "Curated relationships added");
        }
        enhanced.insert(SourceKind::Relationship, related);

        enhanced
    }

    /// `get_multi_source_similarity` followed by `enhance`
    pub async fn get_enhanced_similarity(
        &self,
        artist: &str,
        universe: &TargetUniverse,
        resolver: &IdentityResolver,
    ) -> SourceCandidates {
        let raw = self.get_multi_source_similarity(artist).await;
        self.enhance(artist, raw, universe, resolver)
    }

    /// One provider lookup with caching, timeout and error absorption
    async fn lookup(&self, slot: &ProviderSlot, artist: &str) -> Vec<SimilarityCandidate> {
        let source = slot.provider.source();
        let limit = slot.limit.to_string();
        let normalized = artist.trim().to_lowercase();
        let key = cache_key(source.as_str(), &[("artist", normalized.as_str()), ("limit", limit.as_str())]);

        if let Some(negative) = &self.negative_cache {
            if let Some(reason) = negative.check(&key).await {
                slot.negative_hits.fetch_add(1, Ordering::Relaxed);
                debug!(source = %source, artist, reason = %reason, "Negative cache hit, skipping");
                return Vec::new();
            }
        }

        if let Some(cache) = &self.similarity_cache {
            if let Some(cached) = cache.get(&key).await {
                slot.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(source = %source, artist, count = cached.len(), "Similarity cache hit");
                return cached;
            }
        }

        slot.requests.fetch_add(1, Ordering::Relaxed);
        let outcome = tokio::time::timeout(self.timeout, slot.provider.fetch_similar(artist, slot.limit))
            .await
            .unwrap_or(Err(ProviderError::Timeout(self.timeout.as_secs())));

        match outcome {
            Ok(candidates) => {
                if let Some(cache) = &self.similarity_cache {
                    if let Err(e) = cache.insert(key, candidates.clone()).await {
                        warn!(source = %source, error = %e, "Failed to persist similarity cache");
                    }
                }
                candidates
            }
            Err(ProviderError::NotFound(reason)) => {
                info!(source = %source, artist, reason = %reason, "Artist unknown to provider");
                if let Some(negative) = &self.negative_cache {
                    if let Err(e) = negative.record(key, reason).await {
                        warn!(source = %source, error = %e, "Failed to persist negative cache");
                    }
                }
                Vec::new()
            }
            Err(e) => {
                slot.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    source = %source,
                    artist,
                    error = %e,
                    "Provider failed, continuing without it"
                );
                Vec::new()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelationshipType;
    use async_trait::async_trait;

    struct StaticProvider {
        source: SourceKind,
        result: Result<Vec<(&'static str, f64)>, &'static str>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StaticProvider {
        fn ok(source: SourceKind, rows: Vec<(&'static str, f64)>) -> Self {
            Self { source, result: Ok(rows), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        fn not_found(source: SourceKind) -> Self {
            Self { source, result: Err("not found"), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        fn slow(source: SourceKind, delay: Duration) -> Self {
            Self { source, result: Ok(vec![("X", 0.5)]), delay, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl SimilarityProvider for StaticProvider {
        fn source(&self) -> SourceKind {
            self.source
        }

        async fn fetch_similar(&self, _artist: &str, _limit: usize) -> Result<Vec<SimilarityCandidate>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.result {
                Ok(rows) => Ok(rows
                    .iter()
                    .map(|(n, s)| SimilarityCandidate::scored(*n, self.source, *s))
                    .collect()),
                Err(reason) => Err(ProviderError::NotFound(reason.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_all_provider_keys_present() {
        let aggregator = SimilarityAggregator::new(Duration::from_secs(1))
            .with_provider(Arc::new(StaticProvider::ok(SourceKind::Lastfm, vec![("ITZY", 0.8)])), true, 50);

        let result = aggregator.get_multi_source_similarity("IVE").await;
        for source in SourceKind::PROVIDERS {
            assert!(result.contains_key(&source), "missing {}", source);
        }
        assert_eq!(result[&SourceKind::Lastfm].len(), 1);
        assert!(result[&SourceKind::Deezer].is_empty());
    }

    #[tokio::test]
    async fn test_disabled_provider_not_called() {
        let provider = Arc::new(StaticProvider::ok(SourceKind::Deezer, vec![("ITZY", 0.8)]));
        let aggregator = SimilarityAggregator::new(Duration::from_secs(1)).with_provider(provider.clone(), false, 30);

        let result = aggregator.get_multi_source_similarity("IVE").await;
        assert!(result[&SourceKind::Deezer].is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(aggregator.active_sources().is_empty());
        assert!(!aggregator.source_status()[&SourceKind::Deezer].enabled);
    }

    #[tokio::test]
    async fn test_timeout_isolated_to_one_source() {
        let aggregator = SimilarityAggregator::new(Duration::from_millis(50))
            .with_provider(Arc::new(StaticProvider::slow(SourceKind::Spotify, Duration::from_secs(5))), true, 20)
            .with_provider(Arc::new(StaticProvider::ok(SourceKind::Lastfm, vec![("ITZY", 0.8)])), true, 50);

        let result = aggregator.get_multi_source_similarity("IVE").await;
        assert!(result[&SourceKind::Spotify].is_empty());
        assert_eq!(result[&SourceKind::Lastfm].len(), 1);
        assert_eq!(aggregator.source_status()[&SourceKind::Spotify].failures, 1);
    }

    #[tokio::test]
    async fn test_not_found_recorded_in_negative_cache() {
        let dir = tempfile::tempdir().unwrap();
        let negative = Arc::new(NegativeCache::open(dir.path().join("negative.json"), 24));
        let provider = Arc::new(StaticProvider::not_found(SourceKind::Musicbrainz));
        let aggregator = SimilarityAggregator::new(Duration::from_secs(1))
            .with_provider(provider.clone(), true, 20)
            .with_negative_cache(negative.clone());

        aggregator.get_multi_source_similarity("Nobody").await;
        aggregator.get_multi_source_similarity("nobody").await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1, "second lookup skipped");
        let status = aggregator.source_status();
        assert_eq!(status[&SourceKind::Musicbrainz].negative_hits, 1);
        assert_eq!(status[&SourceKind::Musicbrainz].failures, 0);
        assert_eq!(negative.stats().await.valid, 1);
    }

    #[tokio::test]
    async fn test_similarity_cache_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(JsonCache::open(dir.path().join("similarity.json"), chrono::Duration::days(7)));
        let provider = Arc::new(StaticProvider::ok(SourceKind::Lastfm, vec![("ITZY", 0.8)]));
        let aggregator = SimilarityAggregator::new(Duration::from_secs(1))
            .with_provider(provider.clone(), true, 50)
            .with_similarity_cache(cache);

        let first = aggregator.get_multi_source_similarity("IVE").await;
        let second = aggregator.get_multi_source_similarity("IVE").await;
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(aggregator.source_status()[&SourceKind::Lastfm].cache_hits, 1);
    }

    #[tokio::test]
    async fn test_enhance_routes_relationships_to_own_source() {
        let aggregator = SimilarityAggregator::new(Duration::from_secs(1))
            .with_provider(Arc::new(StaticProvider::ok(SourceKind::Lastfm, vec![("Ahn Yujin", 0.6)])), true, 50)
            .with_provider(Arc::new(StaticProvider::ok(SourceKind::Deezer, vec![])), true, 30);
        let resolver = IdentityResolver::new();
        let universe = TargetUniverse::new(["IVE", "ANYUJIN"]);

        let result = aggregator.get_enhanced_similarity("ANYUJIN", &universe, &resolver).await;

        let relationship = &result[&SourceKind::Relationship];
        assert_eq!(relationship.len(), 1, "one curated relation, not one per provider");
        assert_eq!(relationship[0].name(), "IVE");
        assert!(matches!(
            relationship[0],
            SimilarityCandidate::RelationshipDerived { relationship: RelationshipType::MemberOf, .. }
        ));
        assert!(result[&SourceKind::Deezer].is_empty());
        assert!(result[&SourceKind::Lastfm]
            .iter()
            .all(|c| !matches!(c, SimilarityCandidate::RelationshipDerived { .. })));
    }

    #[tokio::test]
    async fn test_status_reports_relationship_source() {
        let aggregator = SimilarityAggregator::new(DEFAULT_PROVIDER_TIMEOUT);
        let status = aggregator.source_status();
        assert!(status[&SourceKind::Relationship].enabled);
    }
}
