//! Path types and path finding between two nodes

use crate::error::{Error, Result};
use crate::graph::GraphView;
use crate::node::Node;
use crate::relationship::{Direction, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Default depth bound for shortest path search
pub const DEFAULT_SHORTEST_PATH_DEPTH: u32 = 5;

/// Default depth bound for all-paths search
pub const DEFAULT_ALL_PATHS_DEPTH: u32 = 3;

/// A walk through the graph: `nodes[i]` and `nodes[i + 1]` are joined by
/// `relationships[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPath {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    /// Number of relationships
    pub length: usize,
}

impl GraphPath {
    /// Zero-length path holding a single node
    pub fn single(node: Node) -> Self {
        Self {
            nodes: vec![node],
            relationships: Vec::new(),
            length: 0,
        }
    }

    /// Copy of this path extended by one hop
    pub fn extend(&self, rel: &Relationship, node: &Node) -> Self {
        let mut next = self.clone();
        next.relationships.push(rel.clone());
        next.nodes.push(node.clone());
        next.length = next.relationships.len();
        next
    }

    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn end(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }
}

/// Path search between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathQuery {
    pub start_node_id: String,

    pub end_node_id: String,

    /// Depth bound; defaults depend on the search kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,

    /// Filter by relationship types (empty = all types)
    #[serde(default)]
    pub relationship_types: Vec<String>,

    #[serde(default)]
    pub direction: Direction,
}

impl PathQuery {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_node_id: start.into(),
            end_node_id: end.into(),
            max_depth: None,
            relationship_types: Vec::new(),
            direction: Direction::Both,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn filter_relationship_types(mut self, types: Vec<String>) -> Self {
        self.relationship_types = types;
        self
    }
}

/// Shortest-path and all-paths search
pub struct PathFinder;

impl PathFinder {
    /// Minimum-hop path from start to end, or `None` when the depth bound
    /// is exhausted first.
    pub fn shortest_path(view: &impl GraphView, query: &PathQuery) -> Result<Option<GraphPath>> {
        let (start, end) = Self::endpoints(view, query)?;
        if start.id == end.id {
            return Ok(Some(GraphPath::single(start.clone())));
        }

        let max_depth = query.max_depth.unwrap_or(DEFAULT_SHORTEST_PATH_DEPTH) as usize;
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&Node, GraphPath)> = VecDeque::new();

        visited.insert(start.id.as_str());
        queue.push_back((start, GraphPath::single(start.clone())));

        while let Some((current, path)) = queue.pop_front() {
            if path.length >= max_depth {
                continue;
            }

            for rel in view.neighbors(current.id.as_str(), query.direction) {
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

                let next_path = path.extend(rel, next);
                if next.id == end.id {
                    tracing::debug!("BFS found path of length {}", next_path.length);
                    return Ok(Some(next_path));
                }

                visited.insert(next.id.as_str());
                queue.push_back((next, next_path));
            }
        }

        tracing::debug!(
            "No path from {} to {} within depth {}",
            start.id,
            end.id,
            max_depth
        );
        Ok(None)
    }

    /// Every simple path from start to end within the depth bound, shortest
    /// first.
    ///
    /// Visited tracking is per branch, so the search is exponential in the
    /// worst case; `max_depth` is the only bound.
    pub fn all_paths(view: &impl GraphView, query: &PathQuery) -> Result<Vec<GraphPath>> {
        let (start, end) = Self::endpoints(view, query)?;
        if start.id == end.id {
            return Ok(vec![GraphPath::single(start.clone())]);
        }

        let search = PathSearch {
            view,
            end: end.id.as_str(),
            direction: query.direction,
            relationship_types: &query.relationship_types,
            max_depth: query.max_depth.unwrap_or(DEFAULT_ALL_PATHS_DEPTH) as usize,
        };

        let mut visited = HashSet::new();
        visited.insert(start.id.as_str());

        let mut found = Vec::new();
        search.dfs(start, &GraphPath::single(start.clone()), &visited, &mut found);

        found.sort_by_key(|p| p.length);
        tracing::debug!("DFS found {} paths from {} to {}", found.len(), start.id, end.id);
        Ok(found)
    }

    fn endpoints<'a, V: GraphView>(view: &'a V, query: &PathQuery) -> Result<(&'a Node, &'a Node)> {
        let start = view
            .node(&query.start_node_id)
            .ok_or_else(|| Error::NodeNotFound(query.start_node_id.clone()))?;
        let end = view
            .node(&query.end_node_id)
            .ok_or_else(|| Error::NodeNotFound(query.end_node_id.clone()))?;
        Ok((start, end))
    }
}

struct PathSearch<'a, V> {
    view: &'a V,
    end: &'a str,
    direction: Direction,
    relationship_types: &'a [String],
    max_depth: usize,
}

impl<'a, V: GraphView> PathSearch<'a, V> {
    fn dfs(
        &self,
        current: &'a Node,
        path: &GraphPath,
        visited: &HashSet<&'a str>,
        found: &mut Vec<GraphPath>,
    ) {
        // Stop at the goal, never walk past it
        if current.id.as_str() == self.end {
            found.push(path.clone());
            return;
        }
        if path.length >= self.max_depth {
            return;
        }

        for rel in self.view.neighbors(current.id.as_str(), self.direction) {
            if !type_allowed(self.relationship_types, &rel.rel_type) {
                continue;
            }

            let next_id = rel.other_end(current.id.as_str());
            if visited.contains(next_id.as_str()) {
                continue;
            }
            let Some(next) = self.view.node(next_id.as_str()) else {
                continue;
            };

            let mut branch = visited.clone();
            branch.insert(next.id.as_str());
            self.dfs(next, &path.extend(rel, next), &branch, found);
        }
    }
}

pub(crate) fn type_allowed(filter: &[String], tag: &str) -> bool {
    filter.is_empty() || filter.iter().any(|t| t == tag)
}
