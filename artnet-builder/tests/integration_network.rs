// Network build integration tests
//
// Drive NetworkBuilder end to end with in-memory providers. No network access.

mod helpers;

use artnet_builder::aggregator::SimilarityAggregator;
use artnet_builder::genre::genre_color;
use artnet_builder::network::{ArtistInput, NetworkBuilder};
use artnet_builder::types::{ArtistProfile, SourceKind};
use artnet_builder::BuildError;
use artnet_common::NegativeCache;
use helpers::{builder_with, capture_logs, test_config, StubMetadata, StubSimilarity};
use std::sync::Arc;
use tracing::Level;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn trio() -> Vec<ArtistInput> {
    vec![
        ArtistInput::new("Portishead", 50),
        ArtistInput::new("Radiohead", 100),
        ArtistInput::new("Massive Attack", 20),
    ]
}

// ================================================================================================
// Factual relationships
// ================================================================================================

#[tokio::test]
async fn test_member_of_band_yields_single_factual_edge() {
    let musicbrainz = Arc::new(
        StubSimilarity::new(SourceKind::Musicbrainz).relations("ANYUJIN", &[("IVE", "member of band")]),
    );
    let builder = builder_with(test_config(), vec![musicbrainz]);

    let artists = vec![ArtistInput::new("ANYUJIN", 400), ArtistInput::new("IVE", 600)];
    let graph = builder.generate_network(&artists).await.unwrap();

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);

    let edge = graph.edge_between("anyujin", "ive").expect("anyujin-ive edge");
    assert!(approx(edge.weight, 0.95));
    assert!(approx(edge.distance, 1.0 / 0.95));
    assert!(edge.is_factual);
    assert_eq!(edge.fusion_method, "factual_primary");
    // The curated membership describes the same fact and is not counted twice
    assert_eq!(edge.sources, vec![SourceKind::Musicbrainz]);
    assert_eq!(
        edge.source_details[&SourceKind::Musicbrainz].relationship_type.as_deref(),
        Some("member of band")
    );

    assert!(graph.metadata.apis_used[&SourceKind::Musicbrainz].contributed);
    assert!(!graph.metadata.apis_used[&SourceKind::Relationship].contributed);
}

#[tokio::test]
async fn test_alternate_spelling_and_membership_fuse() {
    // Last.fm spells the group in Hangul; the identity table maps it onto "IVE"
    let lastfm = Arc::new(StubSimilarity::new(SourceKind::Lastfm).scores("ANYUJIN", &[("아이브", 0.7)]));
    let builder = builder_with(test_config(), vec![lastfm]);

    let artists = vec![ArtistInput::new("ANYUJIN", 400), ArtistInput::new("IVE", 600)];
    let graph = builder.generate_network(&artists).await.unwrap();

    assert_eq!(graph.edges.len(), 1);
    let edge = &graph.edges[0];
    // 0.6 × 0.9 (member_of) + 0.4 × 0.7 (lastfm) + 0.05 bonus
    assert!(approx(edge.weight, 0.87));
    assert_eq!(edge.fusion_method, "hybrid_weighted_multi_source");
    assert_eq!(edge.sources, vec![SourceKind::Lastfm, SourceKind::Relationship]);
    assert!(edge.is_factual);
    assert_eq!((edge.source.as_str(), edge.target.as_str()), ("anyujin", "ive"));
}

#[tokio::test]
async fn test_hybrid_factual_and_algorithmic() {
    let musicbrainz = Arc::new(
        StubSimilarity::new(SourceKind::Musicbrainz).relations("Radiohead", &[("Portishead", "collaboration")]),
    );
    let lastfm = Arc::new(StubSimilarity::new(SourceKind::Lastfm).scores("Radiohead", &[("Portishead", 0.7)]));
    let builder = builder_with(test_config(), vec![lastfm, musicbrainz]);

    let graph = builder.generate_network(&trio()).await.unwrap();

    let edge = graph.edge_between("radiohead", "portishead").unwrap();
    assert!(approx(edge.weight, 0.6 * 0.85 + 0.4 * 0.7 + 0.05));
    assert_eq!(edge.fusion_method, "hybrid_weighted_multi_source");
    assert!(edge.is_factual);
    assert!(approx(edge.distance, 1.0 / 0.85));
}

// ================================================================================================
// Algorithmic fusion
// ================================================================================================

#[tokio::test]
async fn test_multi_source_weighted_average() {
    let lastfm = Arc::new(StubSimilarity::new(SourceKind::Lastfm).scores("Radiohead", &[("Portishead", 0.8)]));
    let deezer = Arc::new(StubSimilarity::new(SourceKind::Deezer).scores("Radiohead", &[("Portishead", 0.6)]));
    let builder = builder_with(test_config(), vec![lastfm, deezer]);

    let graph = builder.generate_network(&trio()).await.unwrap();

    let edge = graph.edge_between("radiohead", "portishead").unwrap();
    let expected = (0.8 * 1.0 + 0.6 * 0.8) / 1.8 + 0.05;
    assert!(approx(edge.weight, expected));
    assert!(approx(edge.confidence, 0.9));
    assert!(approx(edge.distance, 1.25));
    assert!(!edge.is_factual);
    assert_eq!(edge.fusion_method, "algorithmic_weighted_multi_source");
    assert_eq!(edge.source_details.len(), 2);
    assert_eq!(graph.metadata.source_breakdown.multi_source_edges, 1);
}

#[tokio::test]
async fn test_edges_are_undirected_and_reference_nodes() {
    let lastfm = Arc::new(
        StubSimilarity::new(SourceKind::Lastfm)
            .scores(
                "Radiohead",
                &[("Radiohead", 0.99), ("Portishead", 0.8), ("Unknown Pleasures Band", 0.7)],
            )
            .scores("Portishead", &[("radiohead", 0.6), ("Massive Attack", 0.5)])
            .scores("Massive Attack", &[]),
    );
    let builder = builder_with(test_config(), vec![lastfm]);

    let graph = builder.generate_network(&trio()).await.unwrap();

    assert!(graph.dangling_edges().is_empty());
    assert!(graph.edges.iter().all(|e| e.source != e.target));
    assert_eq!(graph.edges.len(), 2);

    // Radiohead is processed first; its stronger claim survives the collapse
    let top = &graph.edges[0];
    assert_eq!((top.source.as_str(), top.target.as_str()), ("radiohead", "portishead"));
    assert!(approx(top.weight, 0.8));
    assert_eq!(top.fusion_method, "algorithmic_weighted");

    let second = graph.edge_between("portishead", "massive_attack").unwrap();
    assert!(approx(second.weight, 0.5));
    assert!(graph.edges[0].weight >= graph.edges[1].weight);
}

#[tokio::test]
async fn test_min_similarity_filter() {
    let lastfm = Arc::new(
        StubSimilarity::new(SourceKind::Lastfm)
            .scores("Radiohead", &[("Portishead", 0.8)])
            .scores("Portishead", &[("Massive Attack", 0.5)]),
    );
    let config = artnet_builder::NetworkConfig {
        min_similarity: 0.55,
        ..test_config()
    };
    let graph = builder_with(config, vec![lastfm]).generate_network(&trio()).await.unwrap();

    assert_eq!(graph.edges.len(), 1);
    assert!(graph.edge_between("portishead", "massive_attack").is_none());
    assert!(graph.edges.iter().all(|e| e.weight >= 0.55));
}

// ================================================================================================
// Graceful degradation
// ================================================================================================

#[tokio::test]
async fn test_total_provider_outage_yields_node_only_graph() {
    let (logs, _guard) = capture_logs();
    let lastfm = Arc::new(StubSimilarity::failing(SourceKind::Lastfm));
    let deezer = Arc::new(StubSimilarity::failing(SourceKind::Deezer));
    let builder = builder_with(test_config(), vec![lastfm.clone(), deezer]);

    let graph = builder.generate_network(&trio()).await.unwrap();

    assert_eq!(graph.nodes.len(), 3);
    assert!(graph.edges.is_empty());
    assert_eq!(lastfm.calls(), 3);
    assert_eq!(graph.metadata.apis_used[&SourceKind::Lastfm].failures, 3);
    assert_eq!(graph.metadata.source_breakdown.average_similarity, 0.0);
    assert_eq!(logs.count_at(Level::WARN, "Provider failed, continuing without it"), 6);
    logs.assert_contains("No edges found; emitting a node-only graph");
}

#[tokio::test]
async fn test_one_failing_provider_does_not_hide_others() {
    let lastfm = Arc::new(StubSimilarity::failing(SourceKind::Lastfm));
    let deezer = Arc::new(StubSimilarity::new(SourceKind::Deezer).scores("Radiohead", &[("Portishead", 0.6)]));
    let graph = builder_with(test_config(), vec![lastfm, deezer])
        .generate_network(&trio())
        .await
        .unwrap();

    let edge = graph.edge_between("radiohead", "portishead").unwrap();
    assert_eq!(edge.sources, vec![SourceKind::Deezer]);
    assert!(approx(edge.weight, 0.6));
    assert!(graph.metadata.apis_used[&SourceKind::Deezer].contributed);
    assert!(!graph.metadata.apis_used[&SourceKind::Lastfm].contributed);
}

#[tokio::test]
async fn test_disabled_and_unconfigured_sources_are_not_called() {
    let config = test_config();
    let deezer = Arc::new(StubSimilarity::new(SourceKind::Deezer).scores("Radiohead", &[("Portishead", 0.6)]));
    let spotify = Arc::new(StubSimilarity::unconfigured(SourceKind::Spotify));
    let aggregator = SimilarityAggregator::new(config.provider_timeout)
        .with_provider(deezer.clone(), false, 10)
        .with_provider(spotify.clone(), true, 10);
    let builder = NetworkBuilder::new(config, aggregator);

    let graph = builder.generate_network(&trio()).await.unwrap();

    assert_eq!(deezer.calls(), 0);
    assert_eq!(spotify.calls(), 0);
    assert!(graph.edges.is_empty());
    let usage = &graph.metadata.apis_used;
    assert!(!usage[&SourceKind::Deezer].enabled);
    assert!(usage[&SourceKind::Spotify].enabled);
    assert!(!usage[&SourceKind::Spotify].configured);
}

#[tokio::test]
async fn test_negative_cache_skips_known_misses_across_builds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("negative_cache.json");
    let artists = vec![ArtistInput::new("Radiohead", 10), ArtistInput::new("Portishead", 5)];

    for expected_calls in [2, 1] {
        let lastfm = Arc::new(StubSimilarity::new(SourceKind::Lastfm).scores("Radiohead", &[("Portishead", 0.8)]));
        let config = test_config();
        let aggregator = SimilarityAggregator::new(config.provider_timeout)
            .with_provider(lastfm.clone(), true, 50)
            .with_negative_cache(Arc::new(NegativeCache::open(&path, 24)));
        let graph = NetworkBuilder::new(config, aggregator)
            .generate_network(&artists)
            .await
            .unwrap();

        assert_eq!(lastfm.calls(), expected_calls);
        assert_eq!(graph.edges.len(), 1);
    }
}

// ================================================================================================
// Nodes
// ================================================================================================

#[tokio::test]
async fn test_nodes_ordered_by_play_count_with_rank() {
    let graph = builder_with(test_config(), vec![]).generate_network(&trio()).await.unwrap();

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["radiohead", "portishead", "massive_attack"]);
    let ranks: Vec<usize> = graph.nodes.iter().map(|n| n.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(graph.metadata.input_artists, 3);
    assert_eq!(graph.metadata.total_artists, 3);
}

#[tokio::test]
async fn test_nodes_enriched_from_metadata_providers() {
    let lastfm = Arc::new(StubMetadata::new(SourceKind::Lastfm).profile(
        "Radiohead",
        ArtistProfile {
            canonical_name: "Radiohead".to_string(),
            listeners: 5_000_000,
            url: Some("https://www.last.fm/music/Radiohead".to_string()),
            mbid: Some("a74b1b7f-71a5-4011-9441-d0b5e4122711".to_string()),
            tags: vec!["alternative rock".to_string(), "rock".to_string()],
            ..ArtistProfile::default()
        },
    ));
    let spotify = Arc::new(StubMetadata::new(SourceKind::Spotify).profile(
        "Radiohead",
        ArtistProfile {
            canonical_name: "Radiohead".to_string(),
            genres: vec!["art rock".to_string()],
            popularity: Some(80),
            ..ArtistProfile::default()
        },
    ));
    let builder = builder_with(test_config(), vec![])
        .with_metadata_provider(lastfm)
        .with_metadata_provider(spotify);

    let graph = builder.generate_network(&trio()).await.unwrap();

    let node = graph.node("radiohead").unwrap();
    assert_eq!(node.listeners, 5_000_000);
    assert_eq!(node.popularity, Some(80));
    assert_eq!(node.cluster_genre, "rock");
    assert_eq!(node.genres[0], "rock");
    assert_eq!(node.color, genre_color("rock"));
    assert!(node.mbid.is_some());

    // No profile: defaults
    let other = graph.node("portishead").unwrap();
    assert_eq!(other.listeners, 0);
    assert_eq!(other.cluster_genre, "other");
    assert_eq!(other.canonical_name, "Portishead");
}

#[tokio::test]
async fn test_metadata_failure_falls_back_to_defaults() {
    let builder = builder_with(test_config(), vec![])
        .with_metadata_provider(Arc::new(StubMetadata::failing(SourceKind::Lastfm)));

    let graph = builder.generate_network(&trio()).await.unwrap();

    assert_eq!(graph.nodes.len(), 3);
    for node in &graph.nodes {
        assert_eq!(node.listeners, 0);
        assert_eq!(node.genres, vec!["other"]);
        assert_eq!(node.canonical_name, node.name);
    }
}

// ================================================================================================
// Input validation and output shape
// ================================================================================================

#[tokio::test]
async fn test_empty_input_is_an_error() {
    let result = builder_with(test_config(), vec![]).generate_network(&[]).await;
    assert!(matches!(result, Err(BuildError::EmptyInput)));
}

#[tokio::test]
async fn test_all_artists_below_min_plays_is_an_error() {
    let config = artnet_builder::NetworkConfig {
        min_plays: 1000,
        ..test_config()
    };
    let result = builder_with(config, vec![]).generate_network(&trio()).await;
    assert!(matches!(
        result,
        Err(BuildError::NoEligibleArtists { min_plays: 1000, total: 3 })
    ));
}

#[tokio::test]
async fn test_output_json_shape() {
    let lastfm = Arc::new(StubSimilarity::new(SourceKind::Lastfm).scores("Radiohead", &[("Portishead", 0.8)]));
    let graph = builder_with(test_config(), vec![lastfm]).generate_network(&trio()).await.unwrap();

    let json = serde_json::to_value(&graph).unwrap();
    assert_eq!(json["nodes"][0]["id"], "radiohead");
    assert_eq!(json["edges"][0]["sources"][0], "lastfm");
    assert_eq!(json["edges"][0]["source_details"]["lastfm"]["raw_value"], 0.8);
    assert_eq!(json["metadata"]["total_edges"], 1);
    assert_eq!(json["metadata"]["parameters"]["min_plays"], 1);
    assert!(json["metadata"]["build_id"].is_string());
    assert_eq!(json["metadata"]["apis_used"]["lastfm"]["contributed"], true);
    assert_eq!(json["metadata"]["source_breakdown"]["fusion_methods"]["algorithmic_weighted"], 1);
}
