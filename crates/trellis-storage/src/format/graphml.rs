//! GraphML export and import
//!
//! Every node and edge attribute is declared with a `<key>` element and
//! written as `<data>`. Import resolves `<data key>` through the declared
//! keys, so files using other key ids still load.

use super::csv::{format_time, parse_properties, parse_time, parse_time_or};
use crate::error::{StorageError, StorageResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use trellis_core::{Graph, Node, NodeId, NodeType, Relationship, RelationshipId};

const NODE_KEYS: [&str; 6] = ["type", "label", "properties", "vector", "createdAt", "updatedAt"];
const EDGE_KEYS: [&str; 5] = ["type", "label", "properties", "createdAt", "updatedAt"];

/// Type given to nodes that carry no `type` data
pub const DEFAULT_NODE_TYPE: &str = "node";

pub fn to_string(graph: &Graph) -> String {
    let mut xml = String::new();

    xml.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns
         http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">
"#,
    );

    for key in NODE_KEYS {
        xml.push_str(&format!(
            "  <key id=\"n_{key}\" for=\"node\" attr.name=\"{key}\" attr.type=\"string\"/>\n"
        ));
    }
    for key in EDGE_KEYS {
        xml.push_str(&format!(
            "  <key id=\"e_{key}\" for=\"edge\" attr.name=\"{key}\" attr.type=\"string\"/>\n"
        ));
    }

    xml.push_str("  <graph id=\"G\" edgedefault=\"directed\">\n");

    for node in &graph.nodes {
        xml.push_str(&format!("    <node id=\"{}\">\n", xml_escape(node.id.as_str())));
        push_data(&mut xml, "n_type", node.node_type.as_str());
        push_data(&mut xml, "n_label", &node.label);
        push_data(&mut xml, "n_properties", &properties_json(&node.properties));
        if let Some(vector) = &node.vector {
            let text = serde_json::to_string(vector).unwrap_or_else(|_| "[]".to_string());
            push_data(&mut xml, "n_vector", &text);
        }
        push_data(&mut xml, "n_createdAt", &format_time(&node.created_at));
        push_data(&mut xml, "n_updatedAt", &format_time(&node.updated_at));
        xml.push_str("    </node>\n");
    }

    for rel in &graph.relationships {
        xml.push_str(&format!(
            "    <edge id=\"{}\" source=\"{}\" target=\"{}\">\n",
            xml_escape(rel.id.as_str()),
            xml_escape(rel.source_node_id.as_str()),
            xml_escape(rel.target_node_id.as_str())
        ));
        push_data(&mut xml, "e_type", &rel.rel_type);
        push_data(&mut xml, "e_label", &rel.label);
        push_data(&mut xml, "e_properties", &properties_json(&rel.properties));
        push_data(&mut xml, "e_createdAt", &format_time(&rel.created_at));
        push_data(&mut xml, "e_updatedAt", &format_time(&rel.updated_at));
        xml.push_str("    </edge>\n");
    }

    xml.push_str("  </graph>\n");
    xml.push_str("</graphml>\n");
    xml
}

fn push_data(xml: &mut String, key: &str, value: &str) {
    xml.push_str(&format!(
        "      <data key=\"{}\">{}</data>\n",
        key,
        xml_escape(value)
    ));
}

fn properties_json(properties: &trellis_core::Properties) -> String {
    serde_json::to_string(properties).unwrap_or_else(|_| "{}".to_string())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Node,
    Edge,
}

impl ElementKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Edge => "edge",
        }
    }
}

/// A `<node>` or `<edge>` being read
#[derive(Debug)]
struct Element {
    kind: ElementKind,
    id: String,
    source: Option<String>,
    target: Option<String>,
    data: HashMap<String, String>,
}

/// Declared `<key>`: (`for` scope, `attr.name`)
type KeyTable = HashMap<String, (String, String)>;

pub fn from_str(xml: &str) -> StorageResult<Graph> {
    let mut reader = Reader::from_str(xml);
    let mut keys: KeyTable = HashMap::new();
    let mut graph = Graph::new();
    let mut current: Option<Element> = None;
    let mut data_key: Option<String> = None;
    let mut text = String::new();
    let mut edge_count = 0usize;

    loop {
        match reader.read_event().map_err(quick_xml::Error::from)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"key" => declare_key(&mut keys, &e)?,
                b"node" => current = Some(open_element(&e, ElementKind::Node)?),
                b"edge" => current = Some(open_element(&e, ElementKind::Edge)?),
                b"data" => {
                    data_key = attr(&e, "key")?;
                    text.clear();
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"key" => declare_key(&mut keys, &e)?,
                b"node" => {
                    let element = open_element(&e, ElementKind::Node)?;
                    graph.nodes.push(build_node(element)?);
                }
                b"edge" => {
                    let element = open_element(&e, ElementKind::Edge)?;
                    graph
                        .relationships
                        .push(build_relationship(element, &mut edge_count)?);
                }
                _ => {}
            },
            Event::Text(t) => {
                if data_key.is_some() {
                    text.push_str(&t.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(t) => {
                if data_key.is_some() {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"data" => {
                    if let (Some(key), Some(element)) = (data_key.take(), current.as_mut()) {
                        let name = resolve_key(&keys, key, element.kind);
                        element.data.insert(name, std::mem::take(&mut text));
                    }
                }
                b"node" | b"edge" => {
                    if let Some(element) = current.take() {
                        match element.kind {
                            ElementKind::Node => graph.nodes.push(build_node(element)?),
                            ElementKind::Edge => graph
                                .relationships
                                .push(build_relationship(element, &mut edge_count)?),
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!(
        "Parsed GraphML with {} keys, {} nodes, {} edges",
        keys.len(),
        graph.nodes.len(),
        graph.relationships.len()
    );
    Ok(graph)
}

fn attr(e: &BytesStart<'_>, name: &str) -> StorageResult<Option<String>> {
    match e.try_get_attribute(name).map_err(quick_xml::Error::from)? {
        Some(a) => Ok(Some(
            a.unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

fn declare_key(keys: &mut KeyTable, e: &BytesStart<'_>) -> StorageResult<()> {
    let Some(id) = attr(e, "id")? else {
        return Ok(());
    };
    let scope = attr(e, "for")?.unwrap_or_else(|| "all".to_string());
    let name = attr(e, "attr.name")?.unwrap_or_else(|| id.clone());
    keys.insert(id, (scope, name));
    Ok(())
}

/// Attribute name for a `<data key>`; unknown or out-of-scope keys are
/// used verbatim
fn resolve_key(keys: &KeyTable, key: String, kind: ElementKind) -> String {
    match keys.get(&key) {
        Some((scope, name)) if scope == "all" || scope == kind.as_str() => name.clone(),
        _ => key,
    }
}

fn open_element(e: &BytesStart<'_>, kind: ElementKind) -> StorageResult<Element> {
    let id = attr(e, "id")?;
    let (source, target) = match kind {
        ElementKind::Node => (None, None),
        ElementKind::Edge => (attr(e, "source")?, attr(e, "target")?),
    };

    let id = match (kind, id) {
        (_, Some(id)) => id,
        (ElementKind::Edge, None) => String::new(),
        (ElementKind::Node, None) => {
            return Err(StorageError::Malformed("<node> without id".to_string()))
        }
    };

    Ok(Element {
        kind,
        id,
        source,
        target,
        data: HashMap::new(),
    })
}

fn build_node(mut element: Element) -> StorageResult<Node> {
    let data = &mut element.data;
    let vector = match data.remove("vector") {
        Some(raw) if !raw.trim().is_empty() => Some(serde_json::from_str::<Vec<f32>>(&raw)?),
        _ => None,
    };
    let created_at = parse_time(data.get("createdAt").map(String::as_str).unwrap_or(""))?;
    let updated_at = parse_time_or(
        data.get("updatedAt").map(String::as_str).unwrap_or(""),
        created_at,
    )?;

    Ok(Node {
        label: data.remove("label").unwrap_or_else(|| element.id.clone()),
        node_type: NodeType(
            data.remove("type")
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string()),
        ),
        properties: parse_properties(data.get("properties").map(String::as_str).unwrap_or(""))?,
        vector,
        created_at,
        updated_at,
        id: NodeId(element.id),
    })
}

fn build_relationship(mut element: Element, edge_count: &mut usize) -> StorageResult<Relationship> {
    *edge_count += 1;
    let (Some(source), Some(target)) = (element.source.take(), element.target.take()) else {
        return Err(StorageError::Malformed(format!(
            "<edge {}> without source or target",
            element.id
        )));
    };
    // GraphML edge ids are optional
    let id = if element.id.is_empty() {
        format!("e{}", *edge_count - 1)
    } else {
        std::mem::take(&mut element.id)
    };

    let data = &mut element.data;
    let created_at = parse_time(data.get("createdAt").map(String::as_str).unwrap_or(""))?;
    let updated_at = parse_time_or(
        data.get("updatedAt").map(String::as_str).unwrap_or(""),
        created_at,
    )?;

    Ok(Relationship {
        id: RelationshipId(id),
        rel_type: data.remove("type").unwrap_or_default(),
        label: data.remove("label").unwrap_or_default(),
        source_node_id: NodeId(source),
        target_node_id: NodeId(target),
        properties: parse_properties(data.get("properties").map(String::as_str).unwrap_or(""))?,
        created_at,
        updated_at,
    })
}
