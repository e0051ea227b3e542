//! Error types for artnet-builder
//!
//! Provider failures never surface here: they are absorbed per source inside
//! the aggregator. `BuildError` covers only what stops a whole build.

use thiserror::Error;

/// Build-level error
#[derive(Debug, Error)]
pub enum BuildError {
    /// No artists were supplied
    #[error("Input contains no artists")]
    EmptyInput,

    /// Every artist was filtered out by the play-count threshold
    #[error("No artist has at least {min_plays} plays ({total} supplied)")]
    NoEligibleArtists { min_plays: u64, total: usize },

    /// Every enabled similarity source lacks credentials
    #[error("No similarity source is usable: {0}")]
    NoSourcesConfigured(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for build operations
pub type BuildResult<T> = Result<T, BuildError>;
