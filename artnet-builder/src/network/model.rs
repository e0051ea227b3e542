//! Network graph data model (serialized output)

use crate::config::NetworkConfig;
use crate::network::stats::NetworkStatistics;
use crate::types::{RawValue, SourceKind};
use crate::weighting::WeightedEdge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// One input artist (typically derived from a listening history)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistInput {
    pub name: String,
    #[serde(default)]
    pub play_count: u64,
}

impl ArtistInput {
    pub fn new(name: impl Into<String>, play_count: u64) -> Self {
        Self {
            name: name.into(),
            play_count,
        }
    }
}

/// Graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    /// Slug of `name`; edge endpoints refer to this
    pub id: String,
    pub name: String,
    /// Provider spelling, or `name` when enrichment found nothing
    pub canonical_name: String,
    pub play_count: u64,
    /// 1-based position by play count
    pub rank: usize,
    pub listeners: u64,
    pub genres: Vec<String>,
    pub cluster_genre: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,
}

/// Per-source explanation attached to an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDetail {
    /// Score as reported, or the relationship category
    pub raw_value: Value,
    pub normalized_similarity: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
}

/// Graph edge as emitted (undirected; `source`/`target` are node ids)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub distance: f64,
    pub confidence: f64,
    pub is_factual: bool,
    pub fusion_method: String,
    pub sources: Vec<SourceKind>,
    pub source_details: BTreeMap<SourceKind, SourceDetail>,
}

impl EdgeRecord {
    /// Flatten a weighted edge onto node ids
    pub fn from_weighted(edge: &WeightedEdge, source_id: String, target_id: String) -> Self {
        let source_details = edge
            .contributions
            .iter()
            .map(|c| {
                let raw_value = match &c.raw_value {
                    RawValue::Score(s) => Value::from(*s),
                    RawValue::Relationship(r) => Value::String(r.clone()),
                };
                (
                    c.source,
                    SourceDetail {
                        raw_value,
                        normalized_similarity: c.normalized_similarity,
                        confidence: c.confidence,
                        relationship_type: c.relationship_type.clone(),
                    },
                )
            })
            .collect();

        Self {
            source: source_id,
            target: target_id,
            weight: edge.similarity,
            distance: edge.distance,
            confidence: edge.confidence,
            is_factual: edge.is_factual,
            fusion_method: edge.fusion_method(),
            sources: edge.sources(),
            source_details,
        }
    }
}

/// Build parameters echoed into the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildParameters {
    pub top_n: usize,
    pub min_plays: u64,
    pub min_similarity: f64,
    pub max_genres: usize,
    pub provider_timeout_secs: u64,
    pub fuzzy_threshold: f64,
    pub similarity_limits: BTreeMap<SourceKind, usize>,
}

impl From<&NetworkConfig> for BuildParameters {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            top_n: config.top_n,
            min_plays: config.min_plays,
            min_similarity: config.min_similarity,
            max_genres: config.max_genres,
            provider_timeout_secs: config.provider_timeout.as_secs(),
            fuzzy_threshold: config.fuzzy_threshold,
            similarity_limits: config.similarity_limits.clone(),
        }
    }
}

/// What each source did during the build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUsage {
    pub enabled: bool,
    pub configured: bool,
    /// At least one emitted edge carries this source
    pub contributed: bool,
    pub requests: usize,
    pub cache_hits: usize,
    pub negative_hits: usize,
    pub failures: usize,
}

/// Summary block of the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetadata {
    pub generated: DateTime<Utc>,
    pub build_id: Uuid,
    pub input_artists: usize,
    pub total_artists: usize,
    pub total_edges: usize,
    pub parameters: BuildParameters,
    pub apis_used: BTreeMap<SourceKind, ApiUsage>,
    pub source_breakdown: NetworkStatistics,
}

/// Complete artist network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<EdgeRecord>,
    pub metadata: NetworkMetadata,
}

impl NetworkGraph {
    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edge between two node ids, in either direction
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&EdgeRecord> {
        self.edges
            .iter()
            .find(|e| (e.source == a && e.target == b) || (e.source == b && e.target == a))
    }

    /// Edges whose endpoints are missing from `nodes` (empty for a valid graph)
    pub fn dangling_edges(&self) -> Vec<&EdgeRecord> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::{EdgeContribution, FusionMethod};

    #[test]
    fn test_artist_input_play_count_defaults() {
        let input: ArtistInput = serde_json::from_str(r#"{"name": "IVE"}"#).unwrap();
        assert_eq!(input, ArtistInput::new("IVE", 0));
    }

    #[test]
    fn test_edge_record_from_weighted() {
        let edge = WeightedEdge {
            source_artist: "ANYUJIN".to_string(),
            target_artist: "IVE".to_string(),
            similarity: 0.95,
            distance: 1.0 / 0.95,
            confidence: 0.9,
            is_factual: true,
            method: FusionMethod::FactualPrimary,
            multi_source: false,
            contributions: vec![EdgeContribution {
                source: SourceKind::Musicbrainz,
                raw_value: RawValue::Relationship("member of band".to_string()),
                normalized_similarity: 0.95,
                confidence: 0.9,
                is_factual: true,
                relationship_type: Some("member of band".to_string()),
            }],
        };

        let record = EdgeRecord::from_weighted(&edge, "anyujin".to_string(), "ive".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fusion_method"], "factual_primary");
        assert_eq!(json["sources"][0], "musicbrainz");
        assert_eq!(json["source_details"]["musicbrainz"]["raw_value"], "member of band");
        assert_eq!(json["weight"], 0.95);
    }
}
