//! JSON snapshot codec: `{ "nodes": [...], "relationships": [...] }`

use crate::error::StorageResult;
use trellis_core::Graph;

pub fn to_string(graph: &Graph) -> StorageResult<String> {
    Ok(serde_json::to_string_pretty(graph)?)
}

pub fn from_str(text: &str) -> StorageResult<Graph> {
    Ok(serde_json::from_str(text)?)
}
