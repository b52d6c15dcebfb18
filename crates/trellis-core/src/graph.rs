//! Graph snapshot, read-only view trait, and aggregate statistics

use crate::node::Node;
use crate::relationship::{Direction, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Graph containing nodes and their relationships
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_relationships(mut self, relationships: Vec<Relationship>) -> Self {
        self.relationships = relationships;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

/// Read-only access to a consistent set of nodes and relationships.
///
/// The algorithms in this crate only ever see a `GraphView`; callers are
/// responsible for keeping the view stable (e.g. holding a read guard)
/// for the duration of a call.
pub trait GraphView {
    fn node(&self, id: &str) -> Option<&Node>;

    fn relationship(&self, id: &str) -> Option<&Relationship>;

    /// All nodes in iteration order
    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_>;

    /// All relationships in iteration order
    fn relationships(&self) -> Box<dyn Iterator<Item = &Relationship> + '_>;

    /// Relationships with `node_id` as source or target, each listed once
    fn relationships_touching(&self, node_id: &str) -> Vec<&Relationship>;

    fn node_count(&self) -> usize {
        self.nodes().count()
    }

    fn relationship_count(&self) -> usize {
        self.relationships().count()
    }

    fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Relationships to follow out of `node_id`. For `Both`, outgoing
    /// relationships come before incoming ones.
    fn neighbors(&self, node_id: &str, direction: Direction) -> Vec<&Relationship> {
        let touching = self.relationships_touching(node_id);
        match direction {
            Direction::Outgoing | Direction::Incoming => touching
                .into_iter()
                .filter(|rel| rel.follows(node_id, direction))
                .collect(),
            Direction::Both => {
                let (mut outgoing, incoming): (Vec<_>, Vec<_>) = touching
                    .into_iter()
                    .partition(|rel| rel.source_node_id.as_str() == node_id);
                outgoing.extend(incoming);
                outgoing
            }
        }
    }
}

impl GraphView for Graph {
    fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id.as_str() == id)
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        Box::new(self.nodes.iter())
    }

    fn relationships(&self) -> Box<dyn Iterator<Item = &Relationship> + '_> {
        Box::new(self.relationships.iter())
    }

    fn relationships_touching(&self, node_id: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.touches(node_id))
            .collect()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}

/// Aggregate counts over the whole graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub relationship_count: usize,
    pub node_types: BTreeMap<String, usize>,
    pub relationship_types: BTreeMap<String, usize>,
}

impl GraphStats {
    /// Count nodes and relationships, overall and per type
    pub fn collect(view: &impl GraphView) -> Self {
        let mut stats = GraphStats::default();

        for node in view.nodes() {
            stats.node_count += 1;
            *stats
                .node_types
                .entry(node.node_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        for rel in view.relationships() {
            stats.relationship_count += 1;
            *stats.relationship_types.entry(rel.rel_type.clone()).or_insert(0) += 1;
        }

        stats
    }
}
