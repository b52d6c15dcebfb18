//! Concurrent readers and writers against one service instance.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use trellis_core::{Direction, ErrorKind, NewNode, NewRelationship, TraversalQuery};
use trellis_service::{GraphService, PersistFormat, ServiceConfig};
use trellis_storage::{ExportFormat, MergeStrategy};

async fn running() -> Arc<GraphService> {
    let service = GraphService::new(ServiceConfig::in_memory(2));
    service.initialize().await.unwrap();
    Arc::new(service)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn traversals_never_see_a_torn_graph() {
    let service = running().await;
    let hub = service.create_node(NewNode::new("HUB", "hub")).await.unwrap();

    let writer = {
        let service = service.clone();
        let hub_id = hub.id.to_string();
        tokio::spawn(async move {
            for i in 0..200 {
                let leaf = service
                    .create_node(NewNode::new("LEAF", format!("leaf{i}")))
                    .await
                    .unwrap();
                service
                    .create_relationship(NewRelationship::new(
                        leaf.id.as_str(),
                        hub_id.as_str(),
                        "POINTS_AT",
                    ))
                    .await
                    .unwrap();
                if i % 3 == 0 {
                    assert!(service.delete_node(leaf.id.as_str()).await.unwrap());
                }
            }
        })
    };

    let reader = {
        let service = service.clone();
        let hub_id = hub.id.to_string();
        tokio::spawn(async move {
            for _ in 0..200 {
                let result = service
                    .traverse_graph(
                        &TraversalQuery::new(hub_id.as_str())
                            .with_direction(Direction::Incoming)
                            .with_depth(1)
                            .with_limit(10_000),
                    )
                    .await
                    .unwrap();

                let returned: HashSet<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
                assert_eq!(returned.len(), result.nodes.len());
                for rel in &result.relationships {
                    assert!(returned.contains(rel.source_node_id.as_str()));
                    assert_eq!(rel.target_node_id.as_str(), hub_id);
                }
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();

    let stats = service.get_graph_stats().await.unwrap();
    // 200 leaves, every third one deleted with its relationship
    assert_eq!(stats.node_count, 1 + 200 - 67);
    assert_eq!(stats.relationship_count, 200 - 67);
}

#[tokio::test]
async fn graphml_export_import_through_the_facade() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.graphml");
    let service = running().await;

    let a = service
        .create_node(NewNode::new("TOPIC", "Fish & Chips").with_property("rank", 1_i64))
        .await
        .unwrap();
    let b = service.create_node(NewNode::new("CONCEPT", "<b>")).await.unwrap();
    service
        .create_relationship(NewRelationship::new(b.id.as_str(), a.id.as_str(), "BELONGS_TO"))
        .await
        .unwrap();

    service.export_graph(ExportFormat::GraphMl, &path).await.unwrap();
    service.clear_graph().await.unwrap();

    let report = service
        .import_graph(ExportFormat::GraphMl, &path, MergeStrategy::Replace)
        .await
        .unwrap();
    assert_eq!(report.nodes_imported, 2);
    assert_eq!(report.relationships_imported, 1);

    let restored = service.get_node(a.id.as_str()).await.unwrap().unwrap();
    assert_eq!(restored.label, "Fish & Chips");
    assert_eq!(restored.node_type.as_str(), "TOPIC");
    assert_eq!(restored.property("rank").and_then(|v| v.as_f64()), Some(1.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writes_acknowledged_during_shutdown_are_persisted() {
    let dir = tempfile::tempdir().unwrap();

    for round in 0..20 {
        let path = dir.path().join(format!("graph-{round}.json"));
        let service = Arc::new(GraphService::new(ServiceConfig::persisted(
            &path,
            PersistFormat::Json,
        )));
        service.initialize().await.unwrap();

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let service = service.clone();
                tokio::spawn(async move {
                    let mut acknowledged = Vec::new();
                    for i in 0.. {
                        match service
                            .create_node(NewNode::new("ITEM", format!("w{w}-{i}")))
                            .await
                        {
                            Ok(node) => acknowledged.push(node.id.to_string()),
                            Err(e) => {
                                assert_eq!(e.kind(), ErrorKind::ServiceUnavailable);
                                break;
                            }
                        }
                        tokio::task::yield_now().await;
                    }
                    acknowledged
                })
            })
            .collect();

        tokio::time::sleep(Duration::from_micros(300)).await;
        service.shutdown().await.unwrap();

        let mut acknowledged = Vec::new();
        for writer in writers {
            acknowledged.extend(writer.await.unwrap());
        }

        let saved = trellis_storage::read_graph(ExportFormat::Json, &path)
            .await
            .unwrap();
        let on_disk: HashSet<String> = saved.nodes.iter().map(|n| n.id.to_string()).collect();
        let missing: Vec<&String> = acknowledged
            .iter()
            .filter(|id| !on_disk.contains(*id))
            .collect();
        assert!(missing.is_empty(), "round {round}: {missing:?} not persisted");
    }
}
