//! Filtered, ordered and paginated queries over nodes and relationships

use crate::ordering::{sort_by_key, SortKey};
use trellis_core::{GraphView, Node, NodeQuery, Properties, Relationship, RelationshipQuery};

/// Stateless query engine
pub struct QueryEngine;

impl QueryEngine {
    /// Filters by type, label, then properties; orders; then applies
    /// offset and limit
    pub fn query_nodes(view: &impl GraphView, query: &NodeQuery) -> Vec<Node> {
        let mut matched: Vec<&Node> = view
            .nodes()
            .filter(|n| query.node_types.is_empty() || n.has_type(&query.node_types))
            .filter(|n| query.labels.is_empty() || query.labels.contains(&n.label))
            .filter(|n| properties_match(&n.properties, &query.properties))
            .collect();

        if let Some(order) = &query.order_by {
            sort_by_key(&mut matched, order, |n| node_key(n, &order.field));
        }

        let results = paginate(matched, query.offset, query.limit);
        tracing::debug!("Node query matched {} nodes", results.len());
        results
    }

    /// Filters by type, source ids, target ids, then properties; orders;
    /// then applies offset and limit
    pub fn query_relationships(view: &impl GraphView, query: &RelationshipQuery) -> Vec<Relationship> {
        let mut matched: Vec<&Relationship> = view
            .relationships()
            .filter(|r| {
                query.relationship_types.is_empty() || query.relationship_types.contains(&r.rel_type)
            })
            .filter(|r| {
                query.source_node_ids.is_empty()
                    || query
                        .source_node_ids
                        .iter()
                        .any(|id| id == r.source_node_id.as_str())
            })
            .filter(|r| {
                query.target_node_ids.is_empty()
                    || query
                        .target_node_ids
                        .iter()
                        .any(|id| id == r.target_node_id.as_str())
            })
            .filter(|r| properties_match(&r.properties, &query.properties))
            .collect();

        if let Some(order) = &query.order_by {
            sort_by_key(&mut matched, order, |r| relationship_key(r, &order.field));
        }

        let results = paginate(matched, query.offset, query.limit);
        tracing::debug!("Relationship query matched {} relationships", results.len());
        results
    }
}

/// Every filter key must be present with an equal value
fn properties_match(properties: &Properties, filter: &Properties) -> bool {
    filter.iter().all(|(key, expected)| {
        properties
            .get(key)
            .map(|actual| actual.matches(expected))
            .unwrap_or(false)
    })
}

fn node_key<'a>(node: &'a Node, field: &str) -> Option<SortKey<'a>> {
    match field {
        "id" => Some(SortKey::Text(node.id.as_str())),
        "type" => Some(SortKey::Text(node.node_type.as_str())),
        "label" => Some(SortKey::Text(&node.label)),
        "createdAt" => Some(SortKey::Time(node.created_at)),
        "updatedAt" => Some(SortKey::Time(node.updated_at)),
        other => node.properties.get(other).map(SortKey::Value),
    }
}

fn relationship_key<'a>(rel: &'a Relationship, field: &str) -> Option<SortKey<'a>> {
    match field {
        "id" => Some(SortKey::Text(rel.id.as_str())),
        "type" => Some(SortKey::Text(&rel.rel_type)),
        "label" => Some(SortKey::Text(&rel.label)),
        "sourceNodeId" => Some(SortKey::Text(rel.source_node_id.as_str())),
        "targetNodeId" => Some(SortKey::Text(rel.target_node_id.as_str())),
        "createdAt" => Some(SortKey::Time(rel.created_at)),
        "updatedAt" => Some(SortKey::Time(rel.updated_at)),
        other => rel.properties.get(other).map(SortKey::Value),
    }
}

fn paginate<T: Clone>(items: Vec<&T>, offset: Option<usize>, limit: Option<usize>) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Graph, OrderBy, PropertyValue};

    fn labels(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.label.as_str()).collect()
    }

    fn node(node_type: &str, label: &str, props: &[(&str, PropertyValue)]) -> Node {
        let mut n = Node::new(node_type, label);
        for (k, v) in props {
            n.properties.insert(k.to_string(), v.clone());
        }
        n
    }

    fn sample() -> Graph {
        Graph::new().with_nodes(vec![
            node("TOPIC", "Rust", &[("year", 2015_i64.into()), ("lang", "en".into())]),
            node("TOPIC", "Go", &[("year", 2009_i64.into())]),
            node("CONCEPT", "Ownership", &[("lang", "en".into())]),
            node("TOPIC", "Zig", &[("year", 2016.0.into()), ("lang", "en".into())]),
        ])
    }

    #[test]
    fn test_filters_compose() {
        let graph = sample();

        let topics = QueryEngine::query_nodes(&graph, &NodeQuery::new().with_type("TOPIC"));
        assert_eq!(labels(&topics), vec!["Rust", "Go", "Zig"]);

        let english_topics = QueryEngine::query_nodes(
            &graph,
            &NodeQuery::new().with_type("TOPIC").with_property("lang", "en"),
        );
        assert_eq!(labels(&english_topics), vec!["Rust", "Zig"]);

        let by_label = QueryEngine::query_nodes(
            &graph,
            &NodeQuery::new().with_label("Go").with_label("Ownership"),
        );
        assert_eq!(labels(&by_label), vec!["Go", "Ownership"]);
    }

    #[test]
    fn test_property_filter_numbers_and_missing_keys() {
        let graph = sample();

        // 2016 (integer) matches the stored 2016.0
        let q = NodeQuery::new().with_property("year", 2016_i64);
        assert_eq!(labels(&QueryEngine::query_nodes(&graph, &q)), vec!["Zig"]);

        // Missing key excludes the node
        let q = NodeQuery::new().with_property("year", PropertyValue::Null);
        assert!(QueryEngine::query_nodes(&graph, &q).is_empty());
    }

    #[test]
    fn test_order_and_paginate() {
        let graph = sample();

        let q = NodeQuery::new().order_by(OrderBy::asc("year"));
        assert_eq!(
            labels(&QueryEngine::query_nodes(&graph, &q)),
            vec!["Go", "Rust", "Zig", "Ownership"]
        );

        let q = NodeQuery::new().order_by(OrderBy::desc("year"));
        assert_eq!(
            labels(&QueryEngine::query_nodes(&graph, &q)),
            vec!["Zig", "Rust", "Go", "Ownership"]
        );

        let q = NodeQuery::new()
            .order_by(OrderBy::asc("label"))
            .with_offset(1)
            .with_limit(2);
        assert_eq!(labels(&QueryEngine::query_nodes(&graph, &q)), vec!["Ownership", "Rust"]);

        let q = NodeQuery::new().with_offset(10);
        assert!(QueryEngine::query_nodes(&graph, &q).is_empty());
    }

    #[test]
    fn test_relationship_queries() {
        let graph = sample();
        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.clone()).collect();
        let mut r1 = Relationship::new(ids[2].clone(), ids[0].clone(), "BELONGS_TO");
        r1.properties.insert("weight".into(), 0.5.into());
        let r2 = Relationship::new(ids[2].clone(), ids[3].clone(), "BELONGS_TO");
        let mut r3 = Relationship::new(ids[0].clone(), ids[1].clone(), "INSPIRED_BY");
        r3.properties.insert("weight".into(), 0.9.into());
        let graph = graph.with_relationships(vec![r1.clone(), r2.clone(), r3.clone()]);

        let q = RelationshipQuery::new().with_type("BELONGS_TO");
        assert_eq!(QueryEngine::query_relationships(&graph, &q), vec![r1.clone(), r2.clone()]);

        let q = RelationshipQuery::new().to_target(ids[3].as_str());
        assert_eq!(QueryEngine::query_relationships(&graph, &q), vec![r2.clone()]);

        let q = RelationshipQuery::new()
            .from_source(ids[2].as_str())
            .from_source(ids[0].as_str())
            .order_by(OrderBy::desc("weight"));
        assert_eq!(
            QueryEngine::query_relationships(&graph, &q),
            vec![r3, r1, r2]
        );
    }

    #[test]
    fn test_order_by_property_mixing_numbers_and_strings() {
        let nodes: Vec<Node> = (0..2000_i64)
            .map(|i| {
                let k: PropertyValue = match i % 3 {
                    0 => (i % 50).into(),
                    1 => (i % 50).to_string().into(),
                    _ => format!("N{}", i % 7).into(),
                };
                node("ITEM", &format!("item-{}", i), &[("k", k)])
            })
            .collect();
        let graph = Graph::new().with_nodes(nodes);

        let asc = QueryEngine::query_nodes(&graph, &NodeQuery::new().order_by(OrderBy::asc("k")));
        assert_eq!(asc.len(), 2000);

        let desc = QueryEngine::query_nodes(&graph, &NodeQuery::new().order_by(OrderBy::desc("k")));
        assert_eq!(desc.len(), 2000);

        // Plain integers still order numerically
        let numbers = QueryEngine::query_nodes(
            &graph,
            &NodeQuery::new()
                .with_label("item-0")
                .with_label("item-9")
                .with_label("item-30")
                .order_by(OrderBy::asc("k")),
        );
        assert_eq!(labels(&numbers), vec!["item-0", "item-9", "item-30"]);
    }
}
