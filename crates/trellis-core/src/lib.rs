//! Trellis Core - Graph engine for the Trellis knowledge graph
//!
//! This crate provides the data model, the read-only `GraphView` seam,
//! and the traversal and path-finding algorithms that run over it.

pub mod error;
pub mod graph;
pub mod limits;
pub mod node;
pub mod path;
pub mod property;
pub mod query;
pub mod relationship;
pub mod traversal;

pub use error::{Error, ErrorKind, Result};
pub use graph::{Graph, GraphStats, GraphView};
pub use node::{NewNode, Node, NodeId, NodePatch, NodeType};
pub use path::{GraphPath, PathFinder, PathQuery};
pub use property::{Properties, PropertyValue};
pub use query::{NodeQuery, OrderBy, RelationshipQuery, SortDirection, VectorQuery};
pub use relationship::{Direction, NewRelationship, Relationship, RelationshipId, RelationshipPatch};
pub use traversal::{TraversalEngine, TraversalQuery, TraversalResult, TraversalStats};
