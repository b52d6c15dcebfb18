//! CSV tables for nodes and relationships
//!
//! `properties` and `vector` cells hold JSON text; timestamps are RFC 3339.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use trellis_core::{Node, NodeId, NodeType, Properties, Relationship, RelationshipId};

pub const NODE_HEADER: [&str; 7] = [
    "id",
    "type",
    "label",
    "properties",
    "vector",
    "createdAt",
    "updatedAt",
];

pub const RELATIONSHIP_HEADER: [&str; 8] = [
    "id",
    "type",
    "label",
    "sourceNodeId",
    "targetNodeId",
    "properties",
    "createdAt",
    "updatedAt",
];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRow {
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    properties: String,
    #[serde(default)]
    vector: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipRow {
    id: String,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(default)]
    label: String,
    source_node_id: String,
    target_node_id: String,
    #[serde(default)]
    properties: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

pub fn write_nodes(nodes: &[Node]) -> StorageResult<String> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(NODE_HEADER)?;

    for node in nodes {
        let vector = match &node.vector {
            Some(v) => serde_json::to_string(v)?,
            None => String::new(),
        };
        writer.serialize(NodeRow {
            id: node.id.to_string(),
            node_type: node.node_type.as_str().to_string(),
            label: node.label.clone(),
            properties: serde_json::to_string(&node.properties)?,
            vector,
            created_at: format_time(&node.created_at),
            updated_at: format_time(&node.updated_at),
        })?;
    }

    finish(writer)
}

pub fn write_relationships(relationships: &[Relationship]) -> StorageResult<String> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(RELATIONSHIP_HEADER)?;

    for rel in relationships {
        writer.serialize(RelationshipRow {
            id: rel.id.to_string(),
            rel_type: rel.rel_type.clone(),
            label: rel.label.clone(),
            source_node_id: rel.source_node_id.to_string(),
            target_node_id: rel.target_node_id.to_string(),
            properties: serde_json::to_string(&rel.properties)?,
            created_at: format_time(&rel.created_at),
            updated_at: format_time(&rel.updated_at),
        })?;
    }

    finish(writer)
}

pub fn read_nodes(text: &str) -> StorageResult<Vec<Node>> {
    let mut reader = ::csv::Reader::from_reader(text.as_bytes());
    let mut nodes = Vec::new();

    for row in reader.deserialize::<NodeRow>() {
        let row = row?;
        let vector = if row.vector.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Vec<f32>>(&row.vector)?)
        };
        let created_at = parse_time(&row.created_at)?;
        nodes.push(Node {
            id: NodeId(row.id),
            node_type: NodeType(row.node_type),
            label: row.label,
            properties: parse_properties(&row.properties)?,
            vector,
            created_at,
            updated_at: parse_time_or(&row.updated_at, created_at)?,
        });
    }

    Ok(nodes)
}

pub fn read_relationships(text: &str) -> StorageResult<Vec<Relationship>> {
    let mut reader = ::csv::Reader::from_reader(text.as_bytes());
    let mut relationships = Vec::new();

    for row in reader.deserialize::<RelationshipRow>() {
        let row = row?;
        let created_at = parse_time(&row.created_at)?;
        relationships.push(Relationship {
            id: RelationshipId(row.id),
            rel_type: row.rel_type,
            label: row.label,
            source_node_id: NodeId(row.source_node_id),
            target_node_id: NodeId(row.target_node_id),
            properties: parse_properties(&row.properties)?,
            created_at,
            updated_at: parse_time_or(&row.updated_at, created_at)?,
        });
    }

    Ok(relationships)
}

fn finish(writer: ::csv::Writer<Vec<u8>>) -> StorageResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| StorageError::Malformed(e.to_string()))
}

pub(crate) fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Empty cells read as the current time
pub(crate) fn parse_time(raw: &str) -> StorageResult<DateTime<Utc>> {
    parse_time_or(raw, Utc::now())
}

pub(crate) fn parse_time_or(raw: &str, fallback: DateTime<Utc>) -> StorageResult<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(fallback);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Malformed(format!("invalid timestamp '{}': {}", raw, e)))
}

pub(crate) fn parse_properties(raw: &str) -> StorageResult<Properties> {
    if raw.trim().is_empty() {
        return Ok(Properties::new());
    }
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_fixed() {
        let nodes = write_nodes(&[]).unwrap();
        assert_eq!(nodes.trim_end(), "id,type,label,properties,vector,createdAt,updatedAt");

        let rels = write_relationships(&[]).unwrap();
        assert_eq!(
            rels.trim_end(),
            "id,type,label,sourceNodeId,targetNodeId,properties,createdAt,updatedAt"
        );
    }

    #[test]
    fn test_properties_cell_is_quoted_json() {
        let mut node = Node::new("TOPIC", "Rust, the language");
        node.properties.insert("quote".into(), "say \"hi\"".into());

        let text = write_nodes(std::slice::from_ref(&node)).unwrap();
        assert!(text.contains("\"Rust, the language\""));

        let parsed = read_nodes(&text).unwrap();
        assert_eq!(parsed, vec![node]);
    }

    #[test]
    fn test_hand_written_rows() {
        let text = "id,type,label,properties,vector,createdAt,updatedAt\n\
                    n1,TOPIC,Rust,,,2024-01-01T00:00:00Z,\n\
                    n2,TOPIC,Go,\"{\"\"year\"\":2009}\",\"[1.0,0.0]\",,\n";
        let nodes = read_nodes(text).unwrap();

        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].properties.is_empty());
        assert_eq!(nodes[0].updated_at, nodes[0].created_at);
        assert_eq!(nodes[1].property("year").and_then(|v| v.as_f64()), Some(2009.0));
        assert_eq!(nodes[1].vector, Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_malformed_rows() {
        let bad_time = "id,type,label,properties,vector,createdAt,updatedAt\nn1,T,L,,,yesterday,\n";
        assert!(matches!(read_nodes(bad_time), Err(StorageError::Malformed(_))));

        let bad_props = "id,type,label,sourceNodeId,targetNodeId,properties,createdAt,updatedAt\n\
                         r1,T,L,a,b,{not json},,\n";
        assert!(read_relationships(bad_props).is_err());
    }
}
