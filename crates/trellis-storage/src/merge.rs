//! Merging imported snapshots into the entity store

use crate::error::StorageError;
use crate::store::EntityStore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use trellis_core::{limits, Graph};

/// How imported entities combine with the existing store contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeStrategy {
    /// Clear the store first
    Replace,
    /// Upsert; imported records win on id collision
    #[default]
    Merge,
    /// Existing ids are left untouched
    SkipDuplicates,
}

impl FromStr for MergeStrategy {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            "skip_duplicates" | "skip" => Ok(Self::SkipDuplicates),
            other => Err(StorageError::Malformed(format!(
                "unknown merge strategy '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace => write!(f, "REPLACE"),
            Self::Merge => write!(f, "MERGE"),
            Self::SkipDuplicates => write!(f, "SKIP_DUPLICATES"),
        }
    }
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub nodes_imported: usize,
    /// Existing ids left in place, or rows rejected as malformed
    pub nodes_skipped: usize,
    pub relationships_imported: usize,
    pub relationships_skipped: usize,
    /// Rows whose endpoints are not in the node set after the node phase
    pub relationships_dropped: usize,
}

impl EntityStore {
    /// Merge `graph` into the store.
    ///
    /// Nodes are processed first. A relationship is only inserted when both
    /// of its endpoints exist once the node phase is over, whatever the
    /// strategy. With `vector_dimension` set, nodes carrying a vector of
    /// another length are skipped.
    pub fn import(
        &mut self,
        graph: Graph,
        strategy: MergeStrategy,
        vector_dimension: Option<usize>,
    ) -> ImportReport {
        let mut report = ImportReport::default();

        if strategy == MergeStrategy::Replace {
            self.clear();
        }

        for node in graph.nodes {
            if let Err(e) = limits::validate_id(node.id.as_str())
                .and_then(|_| limits::validate_type(node.node_type.as_str()))
            {
                tracing::warn!("Skipping imported node '{}': {}", node.id, e);
                report.nodes_skipped += 1;
                continue;
            }
            if let (Some(dimension), Some(vector)) = (vector_dimension, node.vector.as_ref()) {
                if let Err(e) = limits::validate_vector(vector, dimension) {
                    tracing::warn!("Skipping imported node '{}': {}", node.id, e);
                    report.nodes_skipped += 1;
                    continue;
                }
            }

            let exists = self.get_node(node.id.as_str()).is_some();
            if exists && strategy == MergeStrategy::SkipDuplicates {
                report.nodes_skipped += 1;
                continue;
            }
            self.upsert_node(node);
            report.nodes_imported += 1;
        }

        for rel in graph.relationships {
            if limits::validate_id(rel.id.as_str()).is_err() {
                tracing::warn!("Skipping imported relationship with invalid id '{}'", rel.id);
                report.relationships_skipped += 1;
                continue;
            }

            let source = rel.source_node_id.as_str();
            let target = rel.target_node_id.as_str();
            if self.get_node(source).is_none() || self.get_node(target).is_none() {
                tracing::warn!(
                    "Dropping imported relationship {}: endpoint {} -> {} not present",
                    rel.id,
                    source,
                    target
                );
                report.relationships_dropped += 1;
                continue;
            }

            let exists = self.get_relationship(rel.id.as_str()).is_some();
            if exists && strategy == MergeStrategy::SkipDuplicates {
                report.relationships_skipped += 1;
                continue;
            }
            self.upsert_relationship(rel);
            report.relationships_imported += 1;
        }

        tracing::info!(
            "Imported {} nodes and {} relationships ({} strategy, {} dropped)",
            report.nodes_imported,
            report.relationships_imported,
            strategy,
            report.relationships_dropped
        );

        report
    }
}
