//! Edge statistics for a built network

use crate::network::model::EdgeRecord;
use crate::types::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view of a graph's edges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatistics {
    pub total_edges: usize,
    /// Edges each source contributed to (an edge counts once per source)
    pub source_edges: BTreeMap<SourceKind, usize>,
    /// Edges per `fusion_method` label
    pub fusion_methods: BTreeMap<String, usize>,
    pub multi_source_edges: usize,
    pub factual_edges: usize,
    pub factual_percentage: f64,
    pub average_similarity: f64,
    pub average_confidence: f64,
}

/// Compute statistics over `edges`; all averages are 0 for an empty slice
pub fn network_statistics(edges: &[EdgeRecord]) -> NetworkStatistics {
    let mut stats = NetworkStatistics {
        total_edges: edges.len(),
        ..NetworkStatistics::default()
    };
    if edges.is_empty() {
        return stats;
    }

    let mut similarity_sum = 0.0;
    let mut confidence_sum = 0.0;

    for edge in edges {
        for source in &edge.sources {
            *stats.source_edges.entry(*source).or_insert(0) += 1;
        }
        *stats.fusion_methods.entry(edge.fusion_method.clone()).or_insert(0) += 1;
        if edge.sources.len() > 1 {
            stats.multi_source_edges += 1;
        }
        if edge.is_factual {
            stats.factual_edges += 1;
        }
        similarity_sum += edge.weight;
        confidence_sum += edge.confidence;
    }

    let n = edges.len() as f64;
    stats.average_similarity = similarity_sum / n;
    stats.average_confidence = confidence_sum / n;
    stats.factual_percentage = stats.factual_edges as f64 / n * 100.0;
    stats
}
