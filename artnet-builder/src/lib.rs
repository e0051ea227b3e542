//! artnet-builder library interface
//!
//! Builds a weighted, undirected similarity network over a listener's artists
//! by fusing Last.fm, Deezer, MusicBrainz and Spotify signals.
//!
//! Exposes public APIs for the CLI and for integration testing.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod genre;
pub mod identity;
pub mod names;
pub mod network;
pub mod providers;
pub mod types;
pub mod weighting;

pub use crate::aggregator::{SimilarityAggregator, SourceStatus};
pub use crate::config::{ConfigOverrides, NetworkConfig};
pub use crate::error::{BuildError, BuildResult};
pub use crate::identity::{ArtistIdentity, IdentityResolver, TargetUniverse};
pub use crate::network::{ArtistInput, EdgeRecord, NetworkBuilder, NetworkGraph, NetworkNode};
pub use crate::types::{
    ArtistProfile, MetadataProvider, ProviderError, SimilarityCandidate, SimilarityProvider, SourceKind,
};
pub use crate::weighting::{EdgeWeighter, WeightedEdge};
