//! In-memory entity store: the authoritative node and relationship maps

use crate::error::{StorageError, StorageResult};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use trellis_core::{
    Graph, GraphView, NewNode, NewRelationship, Node, NodeId, NodePatch, Relationship,
    RelationshipId, RelationshipPatch,
};

/// Node and relationship maps plus an adjacency index.
///
/// Iteration follows insertion order. The adjacency index maps every node
/// id to the ids of the relationships touching it and is kept in step by
/// every mutation, including the delete cascade.
#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    nodes: IndexMap<NodeId, Node>,
    relationships: IndexMap<RelationshipId, Relationship>,
    adjacency: HashMap<NodeId, IndexSet<RelationshipId>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot. Duplicate ids and dangling
    /// relationships are rejected.
    pub fn from_graph(graph: Graph) -> StorageResult<Self> {
        let mut store = Self::new();
        for node in graph.nodes {
            store.insert_node(node)?;
        }
        for rel in graph.relationships {
            store.insert_relationship(rel)?;
        }
        Ok(store)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    // Node operations

    /// Create a node with a fresh id and timestamps
    pub fn create_node(&mut self, input: NewNode) -> Node {
        let node = Node::from_new(input);
        self.nodes.insert(node.id.clone(), node.clone());
        tracing::debug!("Created node {} ({})", node.id, node.node_type.as_str());
        node
    }

    pub fn create_nodes(&mut self, inputs: Vec<NewNode>) -> Vec<Node> {
        inputs.into_iter().map(|input| self.create_node(input)).collect()
    }

    /// Insert a fully formed node, keeping its id and timestamps
    pub fn insert_node(&mut self, node: Node) -> StorageResult<()> {
        if self.nodes.contains_key(node.id.as_str()) {
            return Err(StorageError::DuplicateNode(node.id.to_string()));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert or replace a node record; relationships touching it are kept
    pub(crate) fn upsert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Apply a patch; `None` when the node does not exist
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Option<Node> {
        let node = self.nodes.get_mut(id)?;
        node.apply(patch);
        Some(node.clone())
    }

    /// Remove a node and every relationship touching it.
    ///
    /// The cascade is one `retain` pass over the relationship map, so
    /// deleting a hub costs O(R) rather than O(degree × R).
    /// Returns `false` if the node does not exist.
    pub fn delete_node(&mut self, id: &str) -> bool {
        if self.nodes.shift_remove(id).is_none() {
            return false;
        }

        let touching = self.adjacency.remove(id).unwrap_or_default();
        if !touching.is_empty() {
            let adjacency = &mut self.adjacency;
            self.relationships.retain(|rel_id, rel| {
                if touching.contains(rel_id) {
                    detach(adjacency, rel);
                    false
                } else {
                    true
                }
            });
        }

        tracing::debug!(
            "Deleted node {} and {} relationships",
            id,
            touching.len()
        );
        true
    }

    // Relationship operations

    /// Create a relationship with a fresh id; both endpoints must exist
    pub fn create_relationship(&mut self, input: NewRelationship) -> StorageResult<Relationship> {
        self.require_endpoints(&input.source_node_id, &input.target_node_id)?;

        let rel = Relationship::from_new(input);
        attach(&mut self.adjacency, &rel);
        self.relationships.insert(rel.id.clone(), rel.clone());
        tracing::debug!(
            "Created relationship {} ({} -> {})",
            rel.id,
            rel.source_node_id,
            rel.target_node_id
        );
        Ok(rel)
    }

    /// Create several relationships; nothing is inserted unless every
    /// endpoint exists
    pub fn create_relationships(
        &mut self,
        inputs: Vec<NewRelationship>,
    ) -> StorageResult<Vec<Relationship>> {
        for input in &inputs {
            self.require_endpoints(&input.source_node_id, &input.target_node_id)?;
        }
        inputs
            .into_iter()
            .map(|input| self.create_relationship(input))
            .collect()
    }

    /// Insert a fully formed relationship, keeping its id and timestamps
    pub fn insert_relationship(&mut self, rel: Relationship) -> StorageResult<()> {
        if self.relationships.contains_key(rel.id.as_str()) {
            return Err(StorageError::DuplicateRelationship(rel.id.to_string()));
        }
        self.require_endpoints(rel.source_node_id.as_str(), rel.target_node_id.as_str())?;

        attach(&mut self.adjacency, &rel);
        self.relationships.insert(rel.id.clone(), rel);
        Ok(())
    }

    /// Insert or replace a relationship record whose endpoints are known
    /// to exist
    pub(crate) fn upsert_relationship(&mut self, rel: Relationship) {
        if let Some(old) = self.relationships.get(rel.id.as_str()) {
            let old = old.clone();
            detach(&mut self.adjacency, &old);
        }
        attach(&mut self.adjacency, &rel);
        self.relationships.insert(rel.id.clone(), rel);
    }

    pub fn get_relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    /// Apply a patch; `Ok(None)` when the relationship does not exist.
    ///
    /// Re-pointed endpoints must exist.
    pub fn update_relationship(
        &mut self,
        id: &str,
        patch: RelationshipPatch,
    ) -> StorageResult<Option<Relationship>> {
        let Some(current) = self.relationships.get(id) else {
            return Ok(None);
        };

        let source = patch
            .source_node_id
            .clone()
            .unwrap_or_else(|| current.source_node_id.to_string());
        let target = patch
            .target_node_id
            .clone()
            .unwrap_or_else(|| current.target_node_id.to_string());
        self.require_endpoints(&source, &target)?;

        let mut updated = current.clone();
        updated.apply(patch);
        self.upsert_relationship(updated.clone());
        Ok(Some(updated))
    }

    /// Returns `false` if the relationship does not exist
    pub fn delete_relationship(&mut self, id: &str) -> bool {
        match self.relationships.shift_remove(id) {
            Some(rel) => {
                detach(&mut self.adjacency, &rel);
                true
            }
            None => false,
        }
    }

    // Whole-store operations

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.relationships.clear();
        self.adjacency.clear();
    }

    /// Owned point-in-time copy in insertion order
    pub fn snapshot(&self) -> Graph {
        Graph::new()
            .with_nodes(self.nodes.values().cloned().collect())
            .with_relationships(self.relationships.values().cloned().collect())
    }

    fn require_endpoints(&self, source: &str, target: &str) -> StorageResult<()> {
        for id in [source, target] {
            if !self.nodes.contains_key(id) {
                return Err(StorageError::MissingEndpoint(id.to_string()));
            }
        }
        Ok(())
    }
}

fn attach(adjacency: &mut HashMap<NodeId, IndexSet<RelationshipId>>, rel: &Relationship) {
    for end in [&rel.source_node_id, &rel.target_node_id] {
        adjacency
            .entry(end.clone())
            .or_default()
            .insert(rel.id.clone());
    }
}

fn detach(adjacency: &mut HashMap<NodeId, IndexSet<RelationshipId>>, rel: &Relationship) {
    for end in [&rel.source_node_id, &rel.target_node_id] {
        if let Some(ids) = adjacency.get_mut(end.as_str()) {
            ids.shift_remove(rel.id.as_str());
            if ids.is_empty() {
                adjacency.remove(end.as_str());
            }
        }
    }
}

impl GraphView for EntityStore {
    fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        Box::new(self.nodes.values())
    }

    fn relationships(&self) -> Box<dyn Iterator<Item = &Relationship> + '_> {
        Box::new(self.relationships.values())
    }

    fn relationships_touching(&self, node_id: &str) -> Vec<&Relationship> {
        self.adjacency
            .get(node_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.relationships.get(id.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}
