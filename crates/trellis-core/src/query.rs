//! Query option types for filtering, ordering and vector search

use crate::property::{Properties, PropertyValue};
use serde::{Deserialize, Serialize};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Ordering clause: a built-in field name or a property key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Node query builder
///
/// Filters apply in order: types, labels, properties; then ordering,
/// then offset/limit. Empty lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeQuery {
    #[serde(default)]
    pub node_types: Vec<String>,

    #[serde(default)]
    pub labels: Vec<String>,

    /// Every key must exist on the node with an equal value
    #[serde(default)]
    pub properties: Properties,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl NodeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_types.push(node_type.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Relationship query builder
///
/// Filters apply in order: types, source ids, target ids, properties;
/// then ordering, then offset/limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipQuery {
    #[serde(default)]
    pub relationship_types: Vec<String>,

    #[serde(default)]
    pub source_node_ids: Vec<String>,

    #[serde(default)]
    pub target_node_ids: Vec<String>,

    #[serde(default)]
    pub properties: Properties,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl RelationshipQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, rel_type: impl Into<String>) -> Self {
        self.relationship_types.push(rel_type.into());
        self
    }

    pub fn from_source(mut self, id: impl Into<String>) -> Self {
        self.source_node_ids.push(id.into());
        self
    }

    pub fn to_target(mut self, id: impl Into<String>) -> Self {
        self.target_node_ids.push(id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Nearest-neighbour query over node vectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorQuery {
    pub vector: Vec<f32>,

    #[serde(default)]
    pub node_types: Vec<String>,

    /// Results below this similarity are dropped before `limit` applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_similarity: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl VectorQuery {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_types.push(node_type.into());
        self
    }

    pub fn with_min_similarity(mut self, threshold: f32) -> Self {
        self.min_similarity = Some(threshold);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
