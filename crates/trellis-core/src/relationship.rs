//! Relationship (edge) types and operations

use crate::node::NodeId;
use crate::property::{Properties, PropertyValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use ulid::Ulid;

/// Unique identifier for a relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub String);

impl RelationshipId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RelationshipId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RelationshipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RelationshipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Direction for graph traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Outgoing,
    Incoming,
    #[default]
    Both,
}

/// A directed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,

    /// Type of relationship (e.g. `BELONGS_TO`)
    #[serde(rename = "type")]
    pub rel_type: String,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Source node
    pub source_node_id: NodeId,

    /// Target node
    pub target_node_id: NodeId,

    /// Arbitrary properties
    #[serde(default)]
    pub properties: Properties,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// Create a new relationship with a fresh id
    pub fn new(
        source_node_id: impl Into<NodeId>,
        target_node_id: impl Into<NodeId>,
        rel_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RelationshipId::new(),
            rel_type: rel_type.into(),
            label: String::new(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            properties: Properties::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_new(input: NewRelationship) -> Self {
        let mut rel = Self::new(input.source_node_id, input.target_node_id, input.rel_type);
        rel.label = input.label;
        rel.properties = input.properties;
        rel
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Whether either endpoint is `node_id`
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_node_id.as_str() == node_id || self.target_node_id.as_str() == node_id
    }

    /// The endpoint opposite `node_id`; the source for self-loops
    pub fn other_end(&self, node_id: &str) -> &NodeId {
        if self.source_node_id.as_str() == node_id {
            &self.target_node_id
        } else {
            &self.source_node_id
        }
    }

    /// Whether this relationship leaves or enters `node_id` per `direction`
    pub fn follows(&self, node_id: &str, direction: Direction) -> bool {
        match direction {
            Direction::Outgoing => self.source_node_id.as_str() == node_id,
            Direction::Incoming => self.target_node_id.as_str() == node_id,
            Direction::Both => self.touches(node_id),
        }
    }

    pub fn apply(&mut self, patch: RelationshipPatch) {
        if let Some(rel_type) = patch.rel_type {
            self.rel_type = rel_type;
        }
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(source) = patch.source_node_id {
            self.source_node_id = NodeId(source);
        }
        if let Some(target) = patch.target_node_id {
            self.target_node_id = NodeId(target);
        }
        if let Some(properties) = patch.properties {
            self.properties = properties;
        }
        self.updated_at = Utc::now().max(self.created_at);
    }
}

/// Data for creating a new relationship
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRelationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub label: String,
    pub source_node_id: String,
    pub target_node_id: String,
    #[serde(default)]
    pub properties: Properties,
}

impl NewRelationship {
    pub fn new(
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
        rel_type: impl Into<String>,
    ) -> Self {
        Self {
            rel_type: rel_type.into(),
            label: String::new(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Partial update for a relationship; unset fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub rel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl RelationshipPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_type(mut self, rel_type: impl Into<String>) -> Self {
        self.rel_type = Some(rel_type.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_node_id = Some(target.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_creation() {
        let rel = Relationship::new("a", "b", "BELONGS_TO").with_label("belongs to");

        assert_eq!(rel.source_node_id.as_str(), "a");
        assert_eq!(rel.target_node_id.as_str(), "b");
        assert_eq!(rel.rel_type, "BELONGS_TO");
        assert_eq!(rel.label, "belongs to");
    }

    #[test]
    fn test_endpoint_helpers() {
        let rel = Relationship::new("a", "b", "LINKS");

        assert!(rel.touches("a"));
        assert!(rel.touches("b"));
        assert!(!rel.touches("c"));
        assert_eq!(rel.other_end("a").as_str(), "b");
        assert_eq!(rel.other_end("b").as_str(), "a");

        assert!(rel.follows("a", Direction::Outgoing));
        assert!(!rel.follows("a", Direction::Incoming));
        assert!(rel.follows("b", Direction::Incoming));
        assert!(rel.follows("b", Direction::Both));
    }

    #[test]
    fn test_direction_serde() {
        assert_eq!(serde_json::to_string(&Direction::Incoming).unwrap(), "\"INCOMING\"");
        let d: Direction = serde_json::from_str("\"OUTGOING\"").unwrap();
        assert_eq!(d, Direction::Outgoing);
        assert_eq!(Direction::default(), Direction::Both);
    }

    #[test]
    fn test_json_shape() {
        let rel = Relationship::new("a", "b", "LINKS");
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["sourceNodeId"], "a");
        assert_eq!(json["targetNodeId"], "b");
        assert_eq!(json["type"], "LINKS");
    }
}
