//! artnet-builder - Artist similarity network builder
//!
//! Reads a list of artists with play counts, queries the configured similarity
//! sources and writes the resulting network as JSON.
//!
//! ```text
//! artnet-builder --input artists.json --output network.json --stats
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artnet_builder::config::{ConfigOverrides, NetworkConfig};
use artnet_builder::identity::{ArtistIdentity, IdentityResolver};
use artnet_builder::network::{ArtistInput, NetworkBuilder, NetworkGraph};
use artnet_builder::{BuildError, SourceKind};
use artnet_common::config::{load_toml_config, resolve_config_path, TomlConfig};

/// Command-line arguments for artnet-builder
#[derive(Parser, Debug)]
#[command(name = "artnet-builder")]
#[command(about = "Build an artist similarity network from listening data")]
#[command(version)]
struct Args {
    /// Artists JSON: `[{"name": .., "play_count": ..}]` or `{"name": play_count}`
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the network JSON
    #[arg(short, long, default_value = "network.json")]
    output: PathBuf,

    /// TOML config file
    #[arg(short, long, env = "ARTNET_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of artists in the network
    #[arg(long)]
    top_n: Option<usize>,

    /// Minimum plays for an artist to be included
    #[arg(long)]
    min_plays: Option<u64>,

    /// Minimum fused similarity for an edge
    #[arg(long)]
    min_similarity: Option<f64>,

    /// Disable a similarity source (lastfm, deezer, musicbrainz, spotify)
    #[arg(long = "disable", value_parser = parse_source)]
    disabled: Vec<SourceKind>,

    /// Last.fm API key (falls back to ARTNET_LASTFM_API_KEY, then TOML)
    #[arg(long)]
    lastfm_api_key: Option<String>,

    #[arg(long)]
    spotify_client_id: Option<String>,

    #[arg(long)]
    spotify_client_secret: Option<String>,

    /// Cache directory
    #[arg(long, env = "ARTNET_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Disable every on-disk cache
    #[arg(long)]
    no_cache: bool,

    /// Extra artist identities (JSON list) merged into the curated table
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// Build a node-only graph when no similarity source is usable
    #[arg(long)]
    allow_node_only: bool,

    /// Print edge statistics after the build
    #[arg(long)]
    stats: bool,
}

fn parse_source(value: &str) -> std::result::Result<SourceKind, String> {
    match SourceKind::parse(value) {
        Some(source) if source != SourceKind::Relationship => Ok(source),
        _ => Err(format!(
            "unknown source '{}' (expected lastfm, deezer, musicbrainz or spotify)",
            value
        )),
    }
}

/// Accepted input shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum InputFile {
    List(Vec<ArtistInput>),
    Counts(BTreeMap<String, u64>),
}

impl InputFile {
    fn into_artists(self) -> Vec<ArtistInput> {
        match self {
            InputFile::List(artists) => artists,
            InputFile::Counts(counts) => counts.into_iter().map(|(name, plays)| ArtistInput::new(name, plays)).collect(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read before the subscriber exists so the TOML log level can apply
    let config_path = resolve_config_path(args.config.as_deref());
    let toml = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load config file")?,
        None => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting artnet-builder {}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!(path = %path.display(), "Config file"),
        None => info!("No config file, using defaults"),
    }

    let overrides = ConfigOverrides {
        top_n: args.top_n,
        min_plays: args.min_plays,
        min_similarity: args.min_similarity,
        disabled_sources: args.disabled.clone(),
        lastfm_api_key: args.lastfm_api_key.clone(),
        spotify_client_id: args.spotify_client_id.clone(),
        spotify_client_secret: args.spotify_client_secret.clone(),
        cache_dir: args.cache_dir.clone(),
        no_cache: args.no_cache,
    };
    let config = NetworkConfig::resolve(&toml, &overrides);
    config.validate()?;

    match config.preflight() {
        Ok(_) => {}
        Err(BuildError::NoSourcesConfigured(detail)) if args.allow_node_only => {
            warn!(%detail, "No similarity source usable; building a node-only graph");
        }
        Err(e) => return Err(e).context("Pass --allow-node-only to build without similarity sources"),
    }

    let artists = read_artists(&args.input)?;
    info!(path = %args.input.display(), count = artists.len(), "Loaded artists");

    let mut builder = NetworkBuilder::from_config(config.clone()).context("Failed to set up providers")?;
    if let Some(path) = &args.aliases {
        let extra = read_aliases(path)?;
        info!(path = %path.display(), count = extra.len(), "Loaded extra artist identities");
        builder = builder.with_resolver(
            IdentityResolver::new()
                .with_threshold(config.fuzzy_threshold)
                .with_identities(extra),
        );
    }

    let graph = builder.generate_network(&artists).await?;

    let json = serde_json::to_string_pretty(&graph)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Network written"
    );

    if args.stats {
        print_stats(&graph);
    }

    Ok(())
}

fn read_artists(path: &Path) -> Result<Vec<ArtistInput>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read input {}", path.display()))?;
    let input: InputFile = serde_json::from_str(&content)
        .with_context(|| format!("Input {} is not an artist list or name → play count map", path.display()))?;
    let artists = input.into_artists();
    if artists.is_empty() {
        bail!("Input {} contains no artists", path.display());
    }
    Ok(artists)
}

fn read_aliases(path: &Path) -> Result<Vec<ArtistIdentity>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read aliases {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse aliases {}", path.display()))
}

fn print_stats(graph: &NetworkGraph) {
    let stats = &graph.metadata.source_breakdown;
    println!("Artists:            {}", graph.nodes.len());
    println!("Edges:              {}", stats.total_edges);
    println!("Multi-source edges: {}", stats.multi_source_edges);
    println!(
        "Factual edges:      {} ({:.1}%)",
        stats.factual_edges, stats.factual_percentage
    );
    println!("Average similarity: {:.3}", stats.average_similarity);
    println!("Average confidence: {:.3}", stats.average_confidence);

    println!("\nEdges per source:");
    for (source, usage) in &graph.metadata.apis_used {
        let edges = stats.source_edges.get(source).copied().unwrap_or(0);
        let state = match (usage.enabled, usage.configured) {
            (false, _) => "disabled",
            (true, false) => "not configured",
            (true, true) => "active",
        };
        println!(
            "  {:<12} {:>5} edges  {:>4} requests  {:>4} cache hits  {:>3} failures  [{}]",
            source.as_str(),
            edges,
            usage.requests,
            usage.cache_hits,
            usage.failures,
            state
        );
    }

    println!("\nFusion methods:");
    for (method, count) in &stats.fusion_methods {
        println!("  {:<36} {}", method, count);
    }
}
