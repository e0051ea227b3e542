//! # artnet Common Library
//!
//! Shared code for the artist network workspace including:
//! - Error types
//! - TOML configuration loading and credential resolution
//! - Flat-file JSON caches (timed entries and negative results)

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{cache_key, CacheStats, JsonCache, NegativeCache};
pub use error::{Error, Result};
