//! Vector/semantic search using cosine similarity over node vectors

use crate::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use trellis_core::{limits, GraphView, Node, VectorQuery};

/// A node and its similarity to the query vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    pub node: Node,
    pub similarity: f32,
}

/// Stateless vector search engine
#[derive(Debug, Clone, Copy)]
pub struct VectorSearchEngine {
    pub enabled: bool,
    pub dimension: usize,
}

impl VectorSearchEngine {
    pub fn new(dimension: usize) -> Self {
        Self {
            enabled: true,
            dimension,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            dimension: 0,
        }
    }

    /// Rank every node that carries a vector by similarity to
    /// `query.vector`, highest first. Ties keep store iteration order.
    ///
    /// `min_similarity` is applied before `limit`.
    pub fn search(&self, view: &impl GraphView, query: &VectorQuery) -> SearchResult<Vec<SimilarityHit>> {
        if !self.enabled {
            return Err(SearchError::VectorSearchDisabled);
        }
        limits::validate_vector(&query.vector, self.dimension)?;

        let mut scored: Vec<(&Node, f32)> = view
            .nodes()
            .filter(|n| query.node_types.is_empty() || n.has_type(&query.node_types))
            .filter_map(|n| {
                n.vector
                    .as_ref()
                    .map(|v| (n, cosine_similarity(&query.vector, v)))
            })
            .collect();

        // Stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(threshold) = query.min_similarity {
            scored.retain(|(_, score)| *score >= threshold);
        }

        let hits: Vec<SimilarityHit> = scored
            .into_iter()
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(node, similarity)| SimilarityHit {
                node: node.clone(),
                similarity,
            })
            .collect();

        tracing::debug!(
            "Vector search returned {} hits (threshold {:?})",
            hits.len(),
            query.min_similarity
        );

        Ok(hits)
    }
}

/// Cosine similarity in `[-1, 1]`, accumulated in f64.
///
/// Zero-norm vectors and length mismatches score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::Graph;

    fn with_vector(label: &str, node_type: &str, vector: Vec<f32>) -> Node {
        let mut node = Node::new(node_type, label);
        node.vector = Some(vector);
        node
    }

    fn sample() -> Graph {
        Graph::new().with_nodes(vec![
            with_vector("first", "CONCEPT", vec![1.0, 0.0]),
            with_vector("second", "CONCEPT", vec![0.0, 1.0]),
            with_vector("third", "TOPIC", vec![0.9, 0.1]),
            Node::new("CONCEPT", "no vector"),
        ])
    }

    fn labels(hits: &[SimilarityHit]) -> Vec<&str> {
        hits.iter().map(|h| h.node.label.as_str()).collect()
    }

    #[test]
    fn test_ranks_by_descending_similarity() {
        let engine = VectorSearchEngine::new(2);
        let hits = engine.search(&sample(), &VectorQuery::new(vec![1.0, 0.0])).unwrap();

        assert_eq!(labels(&hits), vec!["first", "third", "second"]);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
        assert!(hits[1].similarity > 0.99 && hits[1].similarity < 1.0);
        assert_eq!(hits[2].similarity, 0.0);
    }

    #[test]
    fn test_threshold_applies_before_limit() {
        let engine = VectorSearchEngine::new(2);
        let graph = sample();

        let q = VectorQuery::new(vec![1.0, 0.0]).with_min_similarity(0.5).with_limit(5);
        assert_eq!(labels(&engine.search(&graph, &q).unwrap()), vec!["first", "third"]);

        let q = VectorQuery::new(vec![1.0, 0.0]).with_min_similarity(0.5).with_limit(1);
        assert_eq!(labels(&engine.search(&graph, &q).unwrap()), vec!["first"]);

        let q = VectorQuery::new(vec![1.0, 0.0]).with_type("TOPIC");
        assert_eq!(labels(&engine.search(&graph, &q).unwrap()), vec!["third"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let graph = Graph::new().with_nodes(vec![
            with_vector("a", "N", vec![2.0, 0.0]),
            with_vector("b", "N", vec![0.0, 1.0]),
            with_vector("c", "N", vec![5.0, 0.0]),
        ]);
        let hits = VectorSearchEngine::new(2)
            .search(&graph, &VectorQuery::new(vec![1.0, 0.0]))
            .unwrap();
        assert_eq!(labels(&hits), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_disabled_and_bad_dimension() {
        let err = VectorSearchEngine::disabled()
            .search(&sample(), &VectorQuery::new(vec![1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, SearchError::VectorSearchDisabled));
        assert_eq!(
            trellis_core::Error::from(err).kind(),
            trellis_core::ErrorKind::Unsupported
        );

        let err = VectorSearchEngine::new(3)
            .search(&sample(), &VectorQuery::new(vec![1.0, 0.0]))
            .unwrap_err();
        assert_eq!(
            trellis_core::Error::from(err).kind(),
            trellis_core::ErrorKind::Validation
        );
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }
}
