//! JSON request envelope over the service façade

use crate::service::GraphService;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trellis_core::{
    Direction, Error, ErrorKind, NewNode, NewRelationship, NodePatch, NodeQuery, PathQuery,
    RelationshipPatch, RelationshipQuery, Result, TraversalQuery, VectorQuery,
};
use trellis_storage::{ExportFormat, MergeStrategy};

/// One façade call, tagged by `action`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GraphRequest {
    CreateNode {
        node: NewNode,
    },
    CreateNodes {
        nodes: Vec<NewNode>,
    },
    GetNode {
        id: String,
    },
    UpdateNode {
        id: String,
        patch: NodePatch,
    },
    DeleteNode {
        id: String,
    },
    QueryNodes {
        #[serde(default)]
        query: NodeQuery,
    },
    CreateRelationship {
        relationship: NewRelationship,
    },
    CreateRelationships {
        relationships: Vec<NewRelationship>,
    },
    GetRelationship {
        id: String,
    },
    UpdateRelationship {
        id: String,
        patch: RelationshipPatch,
    },
    DeleteRelationship {
        id: String,
    },
    QueryRelationships {
        #[serde(default)]
        query: RelationshipQuery,
    },
    NodeRelationships {
        id: String,
        #[serde(default)]
        direction: Direction,
    },
    TraverseGraph {
        query: TraversalQuery,
    },
    FindShortestPath {
        query: PathQuery,
    },
    FindAllPaths {
        query: PathQuery,
    },
    VectorSearch {
        query: VectorQuery,
    },
    GetGraphStats,
    ExportGraph {
        format: ExportFormat,
        path: PathBuf,
    },
    ImportGraph {
        format: ExportFormat,
        path: PathBuf,
        #[serde(default)]
        strategy: MergeStrategy,
    },
    ClearGraph,
    SaveSnapshot,
}

/// Failure half of a [`GraphResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Uniform reply: `data` on success, `error` on failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl GraphResponse {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &Error) -> Self {
        let kind = error.kind();
        if kind == ErrorKind::Internal {
            tracing::error!("Internal error: {:?}", error);
        }
        Self {
            ok: false,
            data: None,
            error: Some(ErrorBody {
                kind,
                message: error.to_string(),
            }),
        }
    }
}

fn json<T: Serialize>(value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| Error::Internal(format!("response encoding: {}", e)))
}

impl GraphService {
    /// Run `request` and fold the outcome into a [`GraphResponse`]
    pub async fn dispatch(&self, request: GraphRequest) -> GraphResponse {
        match self.execute(request).await {
            Ok(data) => GraphResponse::success(data),
            Err(e) => GraphResponse::failure(&e),
        }
    }

    /// Parse a raw JSON request first; malformed input is a validation error
    pub async fn dispatch_json(&self, raw: &str) -> GraphResponse {
        match serde_json::from_str::<GraphRequest>(raw) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => GraphResponse::failure(&Error::validation(format!("Invalid request: {}", e))),
        }
    }

    async fn execute(&self, request: GraphRequest) -> Result<serde_json::Value> {
        tracing::debug!("Dispatching {:?}", request);

        match request {
            GraphRequest::CreateNode { node } => json(self.create_node(node).await?),
            GraphRequest::CreateNodes { nodes } => json(self.create_nodes(nodes).await?),
            GraphRequest::GetNode { id } => json(self.get_node(&id).await?),
            GraphRequest::UpdateNode { id, patch } => json(self.update_node(&id, patch).await?),
            GraphRequest::DeleteNode { id } => json(self.delete_node(&id).await?),
            GraphRequest::QueryNodes { query } => json(self.query_nodes(&query).await?),
            GraphRequest::CreateRelationship { relationship } => {
                json(self.create_relationship(relationship).await?)
            }
            GraphRequest::CreateRelationships { relationships } => {
                json(self.create_relationships(relationships).await?)
            }
            GraphRequest::GetRelationship { id } => json(self.get_relationship(&id).await?),
            GraphRequest::UpdateRelationship { id, patch } => {
                json(self.update_relationship(&id, patch).await?)
            }
            GraphRequest::DeleteRelationship { id } => json(self.delete_relationship(&id).await?),
            GraphRequest::QueryRelationships { query } => {
                json(self.query_relationships(&query).await?)
            }
            GraphRequest::NodeRelationships { id, direction } => {
                json(self.node_relationships(&id, direction).await?)
            }
            GraphRequest::TraverseGraph { query } => json(self.traverse_graph(&query).await?),
            GraphRequest::FindShortestPath { query } => {
                json(self.find_shortest_path(&query).await?)
            }
            GraphRequest::FindAllPaths { query } => json(self.find_all_paths(&query).await?),
            GraphRequest::VectorSearch { query } => json(self.vector_search(&query).await?),
            GraphRequest::GetGraphStats => json(self.get_graph_stats().await?),
            GraphRequest::ExportGraph { format, path } => {
                json(self.export_graph(format, &path).await?)
            }
            GraphRequest::ImportGraph {
                format,
                path,
                strategy,
            } => json(self.import_graph(format, &path, strategy).await?),
            GraphRequest::ClearGraph => {
                self.clear_graph().await?;
                Ok(serde_json::json!({ "cleared": true }))
            }
            GraphRequest::SaveSnapshot => {
                let path = self.save_snapshot().await?;
                Ok(serde_json::json!({ "path": path }))
            }
        }
    }
}
