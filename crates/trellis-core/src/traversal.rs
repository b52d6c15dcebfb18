//! Breadth-first neighbourhood traversal

use crate::error::{Error, Result};
use crate::graph::GraphView;
use crate::node::Node;
use crate::path::{type_allowed, GraphPath};
use crate::relationship::{Direction, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Traversal query builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalQuery {
    /// Starting node id
    pub start_node_id: String,

    /// Traversal direction
    #[serde(default)]
    pub direction: Direction,

    /// Maximum hops from the start node
    #[serde(default = "default_depth")]
    pub max_depth: u32,

    /// Maximum nodes to return
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Filter by relationship types (empty = all types)
    #[serde(default)]
    pub relationship_types: Vec<String>,

    /// Filter by node types (empty = all types)
    #[serde(default)]
    pub node_types: Vec<String>,
}

fn default_depth() -> u32 {
    3
}

fn default_limit() -> usize {
    100
}

impl Default for TraversalQuery {
    fn default() -> Self {
        Self {
            start_node_id: String::new(),
            direction: Direction::Both,
            max_depth: default_depth(),
            limit: default_limit(),
            relationship_types: Vec::new(),
            node_types: Vec::new(),
        }
    }
}

impl TraversalQuery {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start_node_id: start.into(),
            ..Default::default()
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn filter_relationship_types(mut self, types: Vec<String>) -> Self {
        self.relationship_types = types;
        self
    }

    pub fn filter_node_types(mut self, types: Vec<String>) -> Self {
        self.node_types = types;
        self
    }
}

/// Result of a traversal
///
/// `nodes[i]` was reached through `relationships[i]` and `paths[i]` is the
/// walk from the start node to it. The start node itself is not listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalResult {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    pub paths: Vec<GraphPath>,
    pub stats: TraversalStats,
}

/// Traversal statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalStats {
    pub nodes_visited: usize,
    pub edges_examined: usize,
    pub max_depth_reached: u32,
}

/// Graph traversal engine
pub struct TraversalEngine;

impl TraversalEngine {
    /// Breadth-first walk from `query.start_node_id`.
    ///
    /// Each node is reported at most once, at its minimum depth. Nodes that
    /// fail the node type filter are neither reported nor expanded, but stay
    /// reachable through another relationship.
    pub fn traverse(view: &impl GraphView, query: &TraversalQuery) -> Result<TraversalResult> {
        tracing::debug!(
            "Executing traversal: start={}, depth={}, limit={}, direction={:?}",
            query.start_node_id,
            query.max_depth,
            query.limit,
            query.direction
        );

        let start = view
            .node(&query.start_node_id)
            .ok_or_else(|| Error::NodeNotFound(query.start_node_id.clone()))?;

        let mut result = TraversalResult::default();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&Node, u32, GraphPath)> = VecDeque::new();

        visited.insert(start.id.as_str());
        queue.push_back((start, 0, GraphPath::single(start.clone())));

        'walk: while let Some((current, depth, path)) = queue.pop_front() {
            result.stats.nodes_visited += 1;
            result.stats.max_depth_reached = result.stats.max_depth_reached.max(depth);

            if depth >= query.max_depth {
                continue;
            }

            for rel in view.neighbors(current.id.as_str(), query.direction) {
                result.stats.edges_examined += 1;

                if !type_allowed(&query.relationship_types, &rel.rel_type) {
                    continue;
                }

                let next_id = rel.other_end(current.id.as_str());
                if visited.contains(next_id.as_str()) {
                    continue;
                }
                let Some(next) = view.node(next_id.as_str()) else {
                    continue;
                };
                if !query.node_types.is_empty() && !next.has_type(&query.node_types) {
                    continue;
                }

                if result.nodes.len() >= query.limit {
                    break 'walk;
                }

                visited.insert(next.id.as_str());
                let next_path = path.extend(rel, next);
                result.nodes.push(next.clone());
                result.relationships.push(rel.clone());
                result.paths.push(next_path.clone());
                queue.push_back((next, depth + 1, next_path));
            }
        }

        tracing::debug!(
            "Traversal from {} reached {} nodes ({} visited, {} edges examined)",
            start.id,
            result.nodes.len(),
            result.stats.nodes_visited,
            result.stats.edges_examined
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn labels(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.label.as_str()).collect()
    }

    /// A(TOPIC) <- B(CONCEPT) <- C(CONCEPT), A -> D(PERSON)
    fn sample() -> (Graph, Vec<Node>) {
        let a = Node::new("TOPIC", "A");
        let b = Node::new("CONCEPT", "B");
        let c = Node::new("CONCEPT", "C");
        let d = Node::new("PERSON", "D");
        let rels = vec![
            Relationship::new(b.id.clone(), a.id.clone(), "BELONGS_TO"),
            Relationship::new(c.id.clone(), b.id.clone(), "BELONGS_TO"),
            Relationship::new(a.id.clone(), d.id.clone(), "AUTHORED_BY"),
        ];
        let nodes = vec![a, b, c, d];
        (
            Graph::new()
                .with_nodes(nodes.clone())
                .with_relationships(rels),
            nodes,
        )
    }

    #[test]
    fn test_query_defaults() {
        let query = TraversalQuery::new("n1");
        assert_eq!(query.max_depth, 3);
        assert_eq!(query.limit, 100);
        assert_eq!(query.direction, Direction::Both);

        let parsed: TraversalQuery = serde_json::from_str(r#"{"startNodeId":"n1"}"#).unwrap();
        assert_eq!(parsed, query);
    }

    #[test]
    fn test_traverse_both_directions() {
        let (graph, nodes) = sample();
        let query = TraversalQuery::new(nodes[0].id.as_str());
        let result = TraversalEngine::traverse(&graph, &query).unwrap();

        // Outgoing before incoming at each hop
        assert_eq!(labels(&result.nodes), vec!["D", "B", "C"]);
        assert_eq!(result.relationships.len(), 3);
        assert_eq!(result.paths[2].length, 2);
        assert_eq!(result.paths[2].node_ids()[0], nodes[0].id.as_str());
    }

    #[test]
    fn test_traverse_respects_depth() {
        let (graph, nodes) = sample();
        let query = TraversalQuery::new(nodes[0].id.as_str()).with_depth(1);
        let result = TraversalEngine::traverse(&graph, &query).unwrap();

        assert_eq!(labels(&result.nodes), vec!["D", "B"]);
        assert!(result.paths.iter().all(|p| p.length <= 1));
        assert_eq!(result.stats.max_depth_reached, 1);
    }

    #[test]
    fn test_traverse_incoming_only() {
        let (graph, nodes) = sample();
        let query = TraversalQuery::new(nodes[0].id.as_str()).with_direction(Direction::Incoming);
        let result = TraversalEngine::traverse(&graph, &query).unwrap();

        assert_eq!(labels(&result.nodes), vec!["B", "C"]);
    }

    #[test]
    fn test_traverse_limit() {
        let (graph, nodes) = sample();
        let query = TraversalQuery::new(nodes[0].id.as_str()).with_limit(2);
        let result = TraversalEngine::traverse(&graph, &query).unwrap();
        assert_eq!(result.nodes.len(), 2);

        let query = query.with_limit(0);
        let result = TraversalEngine::traverse(&graph, &query).unwrap();
        assert!(result.nodes.is_empty());
    }

    #[test]
    fn test_traverse_type_filters() {
        let (graph, nodes) = sample();

        let query = TraversalQuery::new(nodes[0].id.as_str())
            .filter_relationship_types(vec!["BELONGS_TO".to_string()]);
        let result = TraversalEngine::traverse(&graph, &query).unwrap();
        assert_eq!(labels(&result.nodes), vec!["B", "C"]);

        let query = TraversalQuery::new(nodes[0].id.as_str())
            .filter_node_types(vec!["PERSON".to_string()]);
        let result = TraversalEngine::traverse(&graph, &query).unwrap();
        assert_eq!(labels(&result.nodes), vec!["D"]);
    }

    #[test]
    fn test_depth_zero_and_missing_start() {
        let (graph, nodes) = sample();
        let query = TraversalQuery::new(nodes[0].id.as_str()).with_depth(0);
        assert!(TraversalEngine::traverse(&graph, &query)
            .unwrap()
            .nodes
            .is_empty());

        let err = TraversalEngine::traverse(&graph, &TraversalQuery::new("missing")).unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(_)));
    }

    #[test]
    fn test_cycle_visits_each_node_once() {
        let a = Node::new("N", "A");
        let b = Node::new("N", "B");
        let rels = vec![
            Relationship::new(a.id.clone(), b.id.clone(), "LINKS"),
            Relationship::new(b.id.clone(), a.id.clone(), "LINKS"),
            Relationship::new(a.id.clone(), a.id.clone(), "SELF"),
        ];
        let start = a.id.clone();
        let graph = Graph::new().with_nodes(vec![a, b]).with_relationships(rels);

        let result =
            TraversalEngine::traverse(&graph, &TraversalQuery::new(start.as_str()).with_depth(10))
                .unwrap();
        assert_eq!(labels(&result.nodes), vec!["B"]);
    }
}
