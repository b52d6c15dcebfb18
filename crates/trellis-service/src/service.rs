//! Graph service façade
//!
//! Owns the entity store behind a single-writer lock, validates caller
//! input, runs the read-only algorithms under a read guard, and manages the
//! initialize/shutdown lifecycle together with file persistence.

use crate::config::ServiceConfig;
use crate::persist::{self, Autosave};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use trellis_core::limits::{self, ValidationError};
use trellis_core::{
    Direction, Error, GraphPath, GraphStats, GraphView, NewNode, NewRelationship, Node, NodePatch,
    NodeQuery, PathFinder, PathQuery, Relationship, RelationshipPatch, RelationshipQuery, Result,
    TraversalEngine, TraversalQuery, TraversalResult, VectorQuery,
};
use trellis_search::{QueryEngine, SimilarityHit, VectorSearchEngine};
use trellis_storage::{EntityStore, ExportFormat, ImportReport, MergeStrategy, PersistenceSink};

enum Lifecycle {
    Uninitialized,
    Running { autosave: Option<Autosave> },
    ShutDown,
}

/// Outcome of an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub node_count: usize,
    pub relationship_count: usize,
}

/// The knowledge graph engine as seen by callers.
///
/// Every data operation fails with `SERVICE_UNAVAILABLE` before
/// [`initialize`](Self::initialize) and after [`shutdown`](Self::shutdown).
pub struct GraphService {
    config: ServiceConfig,
    store: Arc<RwLock<EntityStore>>,
    sink: Option<Arc<dyn PersistenceSink>>,
    vectors: VectorSearchEngine,
    lifecycle: RwLock<Lifecycle>,
}

impl GraphService {
    pub fn new(config: ServiceConfig) -> Self {
        let sink = config.sink();
        Self::with_sink(config, sink)
    }

    /// Use `sink` instead of the one the configuration describes
    pub fn with_sink(config: ServiceConfig, sink: Option<Arc<dyn PersistenceSink>>) -> Self {
        let vectors = if config.enable_vector_search {
            VectorSearchEngine::new(config.vector_dimension)
        } else {
            VectorSearchEngine::disabled()
        };

        Self {
            config,
            store: Arc::new(RwLock::new(EntityStore::new())),
            sink,
            vectors,
            lifecycle: RwLock::new(Lifecycle::Uninitialized),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // Lifecycle

    /// Load the persisted snapshot (if any) and start autosave.
    ///
    /// Calling this on a running service does nothing.
    pub async fn initialize(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.write().await;
        match *lifecycle {
            Lifecycle::Running { .. } => return Ok(()),
            Lifecycle::ShutDown => {
                return Err(Error::ServiceUnavailable(
                    "service has been shut down".to_string(),
                ))
            }
            Lifecycle::Uninitialized => {}
        }

        self.config.validate()?;

        let mut autosave = None;
        if let Some(sink) = &self.sink {
            let budget = self.config.persist_timeout();
            if let Some(graph) = persist::with_timeout(budget, sink.load()).await? {
                let report = self.store.write().await.import(
                    graph,
                    MergeStrategy::Replace,
                    self.config.import_dimension(),
                );
                tracing::info!(
                    "Loaded {} nodes and {} relationships from {}",
                    report.nodes_imported,
                    report.relationships_imported,
                    sink.location().display()
                );
            }

            if let Some(interval) = self.config.auto_save_interval() {
                autosave = Some(Autosave::spawn(
                    self.store.clone(),
                    sink.clone(),
                    interval,
                    budget,
                ));
            }
        }

        *lifecycle = Lifecycle::Running { autosave };
        tracing::info!("Graph service initialized");
        Ok(())
    }

    /// Stop autosave and write a final snapshot. Idempotent.
    ///
    /// Waits for in-flight data operations, so every acknowledged write is
    /// in the final snapshot. A service that never initialized is marked
    /// shut down without touching the persisted file.
    pub async fn shutdown(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.write().await;
        let previous = std::mem::replace(&mut *lifecycle, Lifecycle::ShutDown);

        if let Lifecycle::Running { autosave } = previous {
            if let Some(task) = autosave {
                task.stop().await;
            }
            if let Some(sink) = &self.sink {
                persist::save(&self.store, sink.as_ref(), self.config.persist_timeout()).await?;
            }
            tracing::info!("Graph service shut down");
        }
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.lifecycle.read().await, Lifecycle::Running { .. })
    }

    /// The returned guard keeps shutdown out until the operation finishes
    async fn ensure_running(&self) -> Result<RwLockReadGuard<'_, Lifecycle>> {
        let lifecycle = self.lifecycle.read().await;
        match *lifecycle {
            Lifecycle::Running { .. } => Ok(lifecycle),
            Lifecycle::Uninitialized => Err(Error::ServiceUnavailable(
                "service is not initialized".to_string(),
            )),
            Lifecycle::ShutDown => Err(Error::ServiceUnavailable(
                "service has been shut down".to_string(),
            )),
        }
    }

    // Nodes

    pub async fn create_node(&self, input: NewNode) -> Result<Node> {
        let _running = self.ensure_running().await?;
        self.check_new_node(&input)?;
        Ok(self.store.write().await.create_node(input))
    }

    /// All-or-nothing: every input is validated before any is inserted
    pub async fn create_nodes(&self, inputs: Vec<NewNode>) -> Result<Vec<Node>> {
        let _running = self.ensure_running().await?;
        limits::validate_batch_nodes(inputs.len())?;
        for input in &inputs {
            self.check_new_node(input)?;
        }
        Ok(self.store.write().await.create_nodes(inputs))
    }

    pub async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let _running = self.ensure_running().await?;
        Ok(self.store.read().await.get_node(id).cloned())
    }

    pub async fn update_node(&self, id: &str, patch: NodePatch) -> Result<Option<Node>> {
        let _running = self.ensure_running().await?;
        if let Some(node_type) = &patch.node_type {
            limits::validate_type(node_type)?;
        }
        if let Some(vector) = &patch.vector {
            self.check_vector(vector)?;
        }
        Ok(self.store.write().await.update_node(id, patch))
    }

    /// Removes the node and every relationship touching it
    pub async fn delete_node(&self, id: &str) -> Result<bool> {
        let _running = self.ensure_running().await?;
        Ok(self.store.write().await.delete_node(id))
    }

    pub async fn query_nodes(&self, query: &NodeQuery) -> Result<Vec<Node>> {
        let _running = self.ensure_running().await?;
        let store = self.store.read().await;
        Ok(QueryEngine::query_nodes(&*store, query))
    }

    // Relationships

    pub async fn create_relationship(&self, input: NewRelationship) -> Result<Relationship> {
        let _running = self.ensure_running().await?;
        limits::validate_type(&input.rel_type)?;
        Ok(self.store.write().await.create_relationship(input)?)
    }

    /// All-or-nothing: types and endpoints are checked before any insert
    pub async fn create_relationships(
        &self,
        inputs: Vec<NewRelationship>,
    ) -> Result<Vec<Relationship>> {
        let _running = self.ensure_running().await?;
        limits::validate_batch_relationships(inputs.len())?;
        for input in &inputs {
            limits::validate_type(&input.rel_type)?;
        }
        Ok(self.store.write().await.create_relationships(inputs)?)
    }

    pub async fn get_relationship(&self, id: &str) -> Result<Option<Relationship>> {
        let _running = self.ensure_running().await?;
        Ok(self.store.read().await.get_relationship(id).cloned())
    }

    pub async fn update_relationship(
        &self,
        id: &str,
        patch: RelationshipPatch,
    ) -> Result<Option<Relationship>> {
        let _running = self.ensure_running().await?;
        if let Some(rel_type) = &patch.rel_type {
            limits::validate_type(rel_type)?;
        }
        Ok(self.store.write().await.update_relationship(id, patch)?)
    }

    pub async fn delete_relationship(&self, id: &str) -> Result<bool> {
        let _running = self.ensure_running().await?;
        Ok(self.store.write().await.delete_relationship(id))
    }

    pub async fn query_relationships(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>> {
        let _running = self.ensure_running().await?;
        let store = self.store.read().await;
        Ok(QueryEngine::query_relationships(&*store, query))
    }

    /// Relationships touching `node_id` in `direction`; empty for an
    /// unknown node
    pub async fn node_relationships(
        &self,
        node_id: &str,
        direction: Direction,
    ) -> Result<Vec<Relationship>> {
        let _running = self.ensure_running().await?;
        let store = self.store.read().await;
        Ok(store
            .neighbors(node_id, direction)
            .into_iter()
            .cloned()
            .collect())
    }

    // Algorithms

    pub async fn traverse_graph(&self, query: &TraversalQuery) -> Result<TraversalResult> {
        let _running = self.ensure_running().await?;
        limits::validate_traversal_depth(query.max_depth)?;
        limits::validate_traversal_limit(query.limit)?;

        let store = self.store.read().await;
        TraversalEngine::traverse(&*store, query)
    }

    pub async fn find_shortest_path(&self, query: &PathQuery) -> Result<Option<GraphPath>> {
        let _running = self.ensure_running().await?;
        if let Some(depth) = query.max_depth {
            limits::validate_traversal_depth(depth)?;
        }

        let store = self.store.read().await;
        PathFinder::shortest_path(&*store, query)
    }

    pub async fn find_all_paths(&self, query: &PathQuery) -> Result<Vec<GraphPath>> {
        let _running = self.ensure_running().await?;
        if let Some(depth) = query.max_depth {
            limits::validate_traversal_depth(depth)?;
        }

        let store = self.store.read().await;
        PathFinder::all_paths(&*store, query)
    }

    pub async fn vector_search(&self, query: &VectorQuery) -> Result<Vec<SimilarityHit>> {
        let _running = self.ensure_running().await?;
        let store = self.store.read().await;
        Ok(self.vectors.search(&*store, query)?)
    }

    pub async fn get_graph_stats(&self) -> Result<GraphStats> {
        let _running = self.ensure_running().await?;
        let store = self.store.read().await;
        Ok(GraphStats::collect(&*store))
    }

    // Whole-graph operations

    /// Write the current graph to `path`. The store lock is released
    /// before any file I/O starts.
    pub async fn export_graph(&self, format: ExportFormat, path: &Path) -> Result<ExportSummary> {
        let _running = self.ensure_running().await?;
        let snapshot = self.store.read().await.snapshot();

        persist::with_timeout(
            self.config.persist_timeout(),
            trellis_storage::write_graph(&snapshot, format, path),
        )
        .await?;

        tracing::info!(
            "Exported {} nodes and {} relationships as {} to {}",
            snapshot.nodes.len(),
            snapshot.relationships.len(),
            format,
            path.display()
        );
        Ok(ExportSummary {
            format,
            path: path.to_path_buf(),
            node_count: snapshot.nodes.len(),
            relationship_count: snapshot.relationships.len(),
        })
    }

    /// Read `path` outside the lock, then merge under the write guard
    pub async fn import_graph(
        &self,
        format: ExportFormat,
        path: &Path,
        strategy: MergeStrategy,
    ) -> Result<ImportReport> {
        let _running = self.ensure_running().await?;
        let graph = persist::with_timeout(
            self.config.persist_timeout(),
            trellis_storage::read_graph(format, path),
        )
        .await?;

        let report = self
            .store
            .write()
            .await
            .import(graph, strategy, self.config.import_dimension());
        Ok(report)
    }

    pub async fn clear_graph(&self) -> Result<()> {
        let _running = self.ensure_running().await?;
        self.store.write().await.clear();
        tracing::info!("Cleared graph");
        Ok(())
    }

    /// Write the configured persistence snapshot now
    pub async fn save_snapshot(&self) -> Result<PathBuf> {
        let _running = self.ensure_running().await?;
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| Error::Unsupported("file persistence is disabled".to_string()))?;
        persist::save(&self.store, sink.as_ref(), self.config.persist_timeout()).await?;
        Ok(sink.location().to_path_buf())
    }

    // Validation

    fn check_new_node(&self, input: &NewNode) -> Result<()> {
        limits::validate_type(&input.node_type)?;
        if let Some(vector) = &input.vector {
            self.check_vector(vector)?;
        }
        Ok(())
    }

    /// Dimension is only enforced while vector search is enabled
    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if self.config.enable_vector_search {
            limits::validate_vector(vector, self.config.vector_dimension)?;
        } else if vector.iter().any(|x| !x.is_finite()) {
            return Err(ValidationError::VectorNotFinite.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersistFormat;
    use async_trait::async_trait;
    use std::time::Duration;
    use trellis_core::{ErrorKind, Graph};
    use trellis_storage::{StorageError, StorageResult};

    async fn running(dimension: usize) -> GraphService {
        let service = GraphService::new(ServiceConfig::in_memory(dimension));
        service.initialize().await.unwrap();
        service
    }

    fn labels(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.label.as_str()).collect()
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let service = GraphService::new(ServiceConfig::in_memory(2));

        let err = service.create_node(NewNode::new("TOPIC", "A")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(!service.is_running().await);

        service.initialize().await.unwrap();
        let a = service.create_node(NewNode::new("TOPIC", "A")).await.unwrap();

        // Second initialize keeps the data
        service.initialize().await.unwrap();
        assert!(service.get_node(a.id.as_str()).await.unwrap().is_some());

        service.shutdown().await.unwrap();
        service.shutdown().await.unwrap();
        let err = service.get_graph_stats().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(
            service.initialize().await.unwrap_err().kind(),
            ErrorKind::ServiceUnavailable
        );
    }

    #[tokio::test]
    async fn test_create_link_traverse() {
        let service = running(2).await;
        let a = service.create_node(NewNode::new("TOPIC", "A")).await.unwrap();
        let b = service.create_node(NewNode::new("CONCEPT", "B")).await.unwrap();
        let c = service.create_node(NewNode::new("CONCEPT", "C")).await.unwrap();
        for from in [&b, &c] {
            service
                .create_relationship(NewRelationship::new(
                    from.id.as_str(),
                    a.id.as_str(),
                    "BELONGS_TO",
                ))
                .await
                .unwrap();
        }

        let result = service
            .traverse_graph(
                &TraversalQuery::new(a.id.as_str())
                    .with_direction(Direction::Incoming)
                    .with_depth(1),
            )
            .await
            .unwrap();

        let mut found = labels(&result.nodes);
        found.sort();
        assert_eq!(found, vec!["B", "C"]);
        assert_eq!(result.relationships.len(), 2);

        let outgoing = service
            .traverse_graph(&TraversalQuery::new(a.id.as_str()).with_direction(Direction::Outgoing))
            .await
            .unwrap();
        assert!(outgoing.nodes.is_empty());

        let incoming = service
            .node_relationships(a.id.as_str(), Direction::Incoming)
            .await
            .unwrap();
        assert_eq!(incoming.len(), 2);
        assert!(service
            .node_relationships("missing", Direction::Both)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_shortest_and_all_paths_on_diamond() {
        let service = running(2).await;
        let nodes = service
            .create_nodes(vec![
                NewNode::new("N", "A"),
                NewNode::new("N", "B"),
                NewNode::new("N", "C"),
                NewNode::new("N", "D"),
            ])
            .await
            .unwrap();
        let id = |i: usize| nodes[i].id.to_string();
        service
            .create_relationships(vec![
                NewRelationship::new(id(0), id(1), "LINKS"),
                NewRelationship::new(id(1), id(3), "LINKS"),
                NewRelationship::new(id(0), id(2), "LINKS"),
                NewRelationship::new(id(2), id(3), "LINKS"),
            ])
            .await
            .unwrap();

        let shortest = service
            .find_shortest_path(&PathQuery::new(id(0), id(3)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shortest.length, 2);

        let all = service
            .find_all_paths(&PathQuery::new(id(0), id(3)).with_depth(3))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.length == 2));

        let err = service
            .find_shortest_path(&PathQuery::new(id(0), "missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let service = running(2).await;
        let a = service.create_node(NewNode::new("N", "A")).await.unwrap();
        let b = service.create_node(NewNode::new("N", "B")).await.unwrap();
        let rel = service
            .create_relationship(NewRelationship::new(a.id.as_str(), b.id.as_str(), "LINKS"))
            .await
            .unwrap();

        assert!(service.delete_node(a.id.as_str()).await.unwrap());
        assert!(service.get_relationship(rel.id.as_str()).await.unwrap().is_none());
        assert!(!service.delete_node(a.id.as_str()).await.unwrap());
        assert!(!service.delete_relationship(rel.id.as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn test_vector_search() {
        let service = running(2).await;
        for (label, vector) in [("x", vec![1.0, 0.0]), ("y", vec![0.0, 1.0]), ("z", vec![0.9, 0.1])] {
            service
                .create_node(NewNode::new("CONCEPT", label).with_vector(vector))
                .await
                .unwrap();
        }

        let hits = service
            .vector_search(&VectorQuery::new(vec![1.0, 0.0]))
            .await
            .unwrap();
        let order: Vec<&str> = hits.iter().map(|h| h.node.label.as_str()).collect();
        assert_eq!(order, vec!["x", "z", "y"]);

        let err = service
            .vector_search(&VectorQuery::new(vec![1.0, 0.0, 0.0]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .create_node(NewNode::new("CONCEPT", "bad").with_vector(vec![1.0]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_vector_search_disabled() {
        let service = GraphService::new(ServiceConfig::in_memory(2).without_vector_search());
        service.initialize().await.unwrap();

        // Any finite vector is stored when search is off
        service
            .create_node(NewNode::new("CONCEPT", "x").with_vector(vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();

        let err = service
            .vector_search(&VectorQuery::new(vec![1.0, 0.0]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn test_validation() {
        let service = running(2).await;

        let err = service.create_node(NewNode::new("", "A")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .create_relationship(NewRelationship::new("missing", "also-missing", "LINKS"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let a = service.create_node(NewNode::new("N", "A")).await.unwrap();
        let err = service
            .traverse_graph(&TraversalQuery::new(a.id.as_str()).with_depth(51))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .traverse_graph(&TraversalQuery::new(a.id.as_str()).with_limit(10_001))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .traverse_graph(&TraversalQuery::new("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let too_many: Vec<NewNode> = (0..1001).map(|i| NewNode::new("N", format!("n{i}"))).collect();
        let err = service.create_nodes(too_many).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_bulk_create_is_all_or_nothing() {
        let service = running(2).await;
        let a = service.create_node(NewNode::new("N", "A")).await.unwrap();
        let b = service.create_node(NewNode::new("N", "B")).await.unwrap();

        let err = service
            .create_relationships(vec![
                NewRelationship::new(a.id.as_str(), b.id.as_str(), "LINKS"),
                NewRelationship::new(a.id.as_str(), "missing", "LINKS"),
            ])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(service.get_graph_stats().await.unwrap().relationship_count, 0);

        let err = service
            .create_nodes(vec![NewNode::new("N", "C"), NewNode::new(" ", "D")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(service.get_graph_stats().await.unwrap().node_count, 2);
    }

    #[tokio::test]
    async fn test_updates() {
        let service = running(2).await;
        let a = service.create_node(NewNode::new("N", "A")).await.unwrap();
        let b = service.create_node(NewNode::new("N", "B")).await.unwrap();
        let c = service.create_node(NewNode::new("N", "C")).await.unwrap();
        let rel = service
            .create_relationship(NewRelationship::new(a.id.as_str(), b.id.as_str(), "LINKS"))
            .await
            .unwrap();

        let updated = service
            .update_node(a.id.as_str(), NodePatch::new().with_label("A2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.label, "A2");
        assert_eq!(updated.created_at, a.created_at);
        assert!(service
            .update_node("missing", NodePatch::new().with_label("x"))
            .await
            .unwrap()
            .is_none());

        let moved = service
            .update_relationship(rel.id.as_str(), RelationshipPatch::new().with_target(c.id.as_str()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.target_node_id, c.id);

        let err = service
            .update_relationship(rel.id.as_str(), RelationshipPatch::new().with_target("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_queries_and_stats() {
        let service = running(2).await;
        let a = service.create_node(NewNode::new("TOPIC", "A")).await.unwrap();
        let b = service.create_node(NewNode::new("CONCEPT", "B")).await.unwrap();
        service
            .create_relationship(NewRelationship::new(b.id.as_str(), a.id.as_str(), "BELONGS_TO"))
            .await
            .unwrap();

        let topics = service
            .query_nodes(&NodeQuery::new().with_type("TOPIC"))
            .await
            .unwrap();
        assert_eq!(labels(&topics), vec!["A"]);

        let rels = service
            .query_relationships(&RelationshipQuery::new().from_source(b.id.as_str()))
            .await
            .unwrap();
        assert_eq!(rels.len(), 1);

        let stats = service.get_graph_stats().await.unwrap();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.node_types["TOPIC"], 1);
        assert_eq!(stats.relationship_types["BELONGS_TO"], 1);
    }

    #[tokio::test]
    async fn test_export_clear_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let service = running(2).await;
        let a = service.create_node(NewNode::new("TOPIC", "A")).await.unwrap();
        let b = service
            .create_node(NewNode::new("CONCEPT", "B").with_vector(vec![0.5, 0.5]))
            .await
            .unwrap();
        service
            .create_relationship(NewRelationship::new(b.id.as_str(), a.id.as_str(), "BELONGS_TO"))
            .await
            .unwrap();
        let before = service.store.read().await.snapshot();

        let summary = service.export_graph(ExportFormat::Json, &path).await.unwrap();
        assert_eq!(summary.node_count, 2);

        service.clear_graph().await.unwrap();
        assert_eq!(service.get_graph_stats().await.unwrap().node_count, 0);

        let report = service
            .import_graph(ExportFormat::Json, &path, MergeStrategy::Replace)
            .await
            .unwrap();
        assert_eq!(report.nodes_imported, 2);
        assert_eq!(report.relationships_imported, 1);
        assert_eq!(service.store.read().await.snapshot(), before);

        let err = service
            .import_graph(ExportFormat::Json, &dir.path().join("absent.json"), MergeStrategy::Merge)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_persistence_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let mut config = ServiceConfig::persisted(&path, PersistFormat::Json);
        config.vector_dimension = 2;

        let first = GraphService::new(config.clone());
        first.initialize().await.unwrap();
        let a = first.create_node(NewNode::new("TOPIC", "A")).await.unwrap();
        first.shutdown().await.unwrap();
        assert!(path.exists());

        let second = GraphService::new(config);
        second.initialize().await.unwrap();
        assert_eq!(
            second.get_node(a.id.as_str()).await.unwrap().map(|n| n.label),
            Some("A".to_string())
        );
        assert_eq!(second.save_snapshot().await.unwrap(), path);
    }

    #[tokio::test]
    async fn test_shutdown_without_initialize_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let existing = Graph::new().with_nodes(vec![Node::new("TOPIC", "kept")]);
        trellis_storage::write_graph(&existing, ExportFormat::Json, &path)
            .await
            .unwrap();

        let service = GraphService::new(ServiceConfig::persisted(&path, PersistFormat::Json));
        service.shutdown().await.unwrap();

        let on_disk = trellis_storage::read_graph(ExportFormat::Json, &path).await.unwrap();
        assert_eq!(on_disk.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_csv_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::persisted(dir.path().join("kg"), PersistFormat::Csv);

        let first = GraphService::new(config.clone());
        first.initialize().await.unwrap();
        let a = first.create_node(NewNode::new("TOPIC", "A")).await.unwrap();
        let b = first.create_node(NewNode::new("TOPIC", "B")).await.unwrap();
        first
            .create_relationship(NewRelationship::new(a.id.as_str(), b.id.as_str(), "LINKS"))
            .await
            .unwrap();
        first.shutdown().await.unwrap();

        let second = GraphService::new(config);
        second.initialize().await.unwrap();
        let stats = second.get_graph_stats().await.unwrap();
        assert_eq!((stats.node_count, stats.relationship_count), (2, 1));
    }

    #[tokio::test]
    async fn test_save_snapshot_requires_persistence() {
        let service = running(2).await;
        let err = service.save_snapshot().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    struct FailingSink;

    #[async_trait]
    impl PersistenceSink for FailingSink {
        async fn load(&self) -> StorageResult<Option<Graph>> {
            Ok(None)
        }

        async fn save(&self, _graph: &Graph) -> StorageResult<()> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn location(&self) -> &Path {
            Path::new("/read-only")
        }
    }

    #[tokio::test]
    async fn test_failed_autosave_is_not_fatal() {
        let config = ServiceConfig::in_memory(2).with_auto_save(10);
        let service = GraphService::with_sink(config, Some(Arc::new(FailingSink)));
        service.initialize().await.unwrap();

        service.create_node(NewNode::new("N", "A")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.is_running().await);
        assert_eq!(service.get_graph_stats().await.unwrap().node_count, 1);

        // The final save is surfaced to the caller
        let err = service.shutdown().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!service.is_running().await);
    }
}
