//! Genre classification
//!
//! Buckets an artist into one of sixteen coarse genres from Last.fm tags and
//! Spotify genre lists.
//!
//! # Scoring
//! - Each tag scores `hierarchy(bucket) × authority` for every bucket that has a
//!   keyword contained in the tag (once per bucket per tag), doubled when the
//!   tag equals the keyword.
//! - Spotify genres carry authority 2.0, Last.fm tags 1.0; only the first five
//!   of each are read.
//! - An exclusive keyword ("k-pop", "reggaeton", ...) forces its bucket to be
//!   primary regardless of score; the best-scoring other bucket is secondary.
//! - Equal scores are broken by hierarchy, then table order.

pub mod colors;
pub mod tables;

pub use colors::genre_color;
pub use tables::OTHER;

use std::collections::BTreeMap;
use tables::{hierarchy, EXCLUSIVE_KEYWORDS, GENRE_MAPPINGS};

/// Tags read per source
const TAGS_PER_SOURCE: usize = 5;

/// Where a tag came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    Spotify,
    Lastfm,
}

impl TagSource {
    pub fn authority(&self) -> f64 {
        match self {
            TagSource::Spotify => 2.0,
            TagSource::Lastfm => 1.0,
        }
    }
}

/// Genre classifier over the fixed keyword tables
#[derive(Debug, Clone, Default)]
pub struct GenreClassifier;

impl GenreClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Up to `max_genres` buckets, primary first; `["other"]` when nothing matches
    ///
    /// # Arguments
    /// * `lastfm_tags` - Free-text tags, most relevant first
    /// * `spotify_genres` - Spotify genre strings, most relevant first
    /// * `max_genres` - Cap on returned buckets (treated as at least 1)
    pub fn classify(&self, lastfm_tags: &[String], spotify_genres: &[String], max_genres: usize) -> Vec<String> {
        let max_genres = max_genres.max(1);
        let tags = collect_tags(lastfm_tags, spotify_genres);
        if tags.is_empty() {
            return vec![OTHER.to_string()];
        }

        if let Some(exclusive) = exclusive_bucket(&tags) {
            let mut genres = vec![exclusive.to_string()];
            if max_genres > 1 {
                if let Some(secondary) = ranked_buckets(&tags, Some(exclusive)).into_iter().next() {
                    genres.push(secondary.to_string());
                }
            }
            return genres;
        }

        let ranked = ranked_buckets(&tags, None);
        if ranked.is_empty() {
            return vec![OTHER.to_string()];
        }
        ranked.into_iter().take(max_genres).map(str::to_string).collect()
    }

    /// Primary bucket only
    pub fn primary_genre(&self, lastfm_tags: &[String], spotify_genres: &[String]) -> String {
        self.classify(lastfm_tags, spotify_genres, 1)
            .into_iter()
            .next()
            .unwrap_or_else(|| OTHER.to_string())
    }
}

/// Normalized (tag, source) pairs, Spotify first
fn collect_tags(lastfm_tags: &[String], spotify_genres: &[String]) -> Vec<(String, TagSource)> {
    let normalize = |t: &String| t.trim().to_lowercase();
    spotify_genres
        .iter()
        .take(TAGS_PER_SOURCE)
        .map(|g| (normalize(g), TagSource::Spotify))
        .chain(
            lastfm_tags
                .iter()
                .take(TAGS_PER_SOURCE)
                .map(|t| (normalize(t), TagSource::Lastfm)),
        )
        .filter(|(t, _)| !t.is_empty())
        .collect()
}

fn exclusive_bucket(tags: &[(String, TagSource)]) -> Option<&'static str> {
    EXCLUSIVE_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            tags.iter()
                .any(|(tag, _)| keywords.iter().any(|k| tag.contains(k)))
        })
        .map(|(bucket, _)| *bucket)
}

/// Buckets with a positive score, best first
fn ranked_buckets(tags: &[(String, TagSource)], exclude: Option<&str>) -> Vec<&'static str> {
    // Keyed by table position so equal scores fall back to table order
    let mut scores: BTreeMap<usize, f64> = BTreeMap::new();

    for (tag, source) in tags {
        for (position, (bucket, keywords)) in GENRE_MAPPINGS.iter().enumerate() {
            if Some(*bucket) == exclude {
                continue;
            }
            if let Some(keyword) = keywords.iter().find(|k| tag.contains(*k)) {
                let mut score = hierarchy(bucket) as f64 * source.authority();
                if *keyword == tag.as_str() {
                    score *= 2.0;
                }
                *scores.entry(position).or_insert(0.0) += score;
            }
        }
    }

    let mut ranked: Vec<(usize, f64)> = scores.into_iter().filter(|(_, s)| *s > 0.0).collect();
    ranked.sort_by(|a, b| {
        let (bucket_a, bucket_b) = (GENRE_MAPPINGS[a.0].0, GENRE_MAPPINGS[b.0].0);
        b.1.total_cmp(&a.1)
            .then_with(|| hierarchy(bucket_b).cmp(&hierarchy(bucket_a)))
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.into_iter().map(|(position, _)| GENRE_MAPPINGS[position].0).collect()
}

// ============================================================================
// Tests
// ============================================================================
