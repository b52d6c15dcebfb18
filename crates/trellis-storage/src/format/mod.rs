//! Snapshot file formats and atomic file writes

pub mod csv;
pub mod graphml;
pub mod json;

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use trellis_core::Graph;

/// File name of the node table inside a CSV export directory
pub const NODES_CSV: &str = "nodes.csv";

/// File name of the relationship table inside a CSV export directory
pub const RELATIONSHIPS_CSV: &str = "relationships.csv";

/// Export / import format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    /// Single JSON document
    Json,
    /// Directory holding `nodes.csv` and `relationships.csv`
    Csv,
    /// GraphML XML document
    GraphMl,
}

impl FromStr for ExportFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "graphml" | "xml" => Ok(Self::GraphMl),
            other => Err(StorageError::UnknownFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::GraphMl => write!(f, "graphml"),
        }
    }
}

/// Write `graph` to `path` in `format`. For CSV `path` is a directory
/// that may hold other files, so each table is replaced on its own; use
/// [`replace_csv_dir`] when the directory belongs to the snapshot.
pub async fn write_graph(graph: &Graph, format: ExportFormat, path: &Path) -> StorageResult<()> {
    match format {
        ExportFormat::Json => write_atomic(path, json::to_string(graph)?.as_bytes()).await?,
        ExportFormat::GraphMl => write_atomic(path, graphml::to_string(graph).as_bytes()).await?,
        ExportFormat::Csv => {
            tokio::fs::create_dir_all(path).await?;
            let nodes = csv::write_nodes(&graph.nodes)?;
            let relationships = csv::write_relationships(&graph.relationships)?;
            write_atomic(&path.join(NODES_CSV), nodes.as_bytes()).await?;
            write_atomic(&path.join(RELATIONSHIPS_CSV), relationships.as_bytes()).await?;
        }
    }

    tracing::info!(
        "Wrote {} nodes and {} relationships to {} ({})",
        graph.nodes.len(),
        graph.relationships.len(),
        path.display(),
        format
    );
    Ok(())
}

/// Read a graph written by [`write_graph`]
pub async fn read_graph(format: ExportFormat, path: &Path) -> StorageResult<Graph> {
    let graph = match format {
        ExportFormat::Json => json::from_str(&tokio::fs::read_to_string(path).await?)?,
        ExportFormat::GraphMl => graphml::from_str(&tokio::fs::read_to_string(path).await?)?,
        ExportFormat::Csv => {
            let nodes = tokio::fs::read_to_string(path.join(NODES_CSV)).await?;
            let relationships_path = path.join(RELATIONSHIPS_CSV);
            let relationships = if tokio::fs::try_exists(&relationships_path).await? {
                csv::read_relationships(&tokio::fs::read_to_string(&relationships_path).await?)?
            } else {
                Vec::new()
            };
            Graph::new()
                .with_nodes(csv::read_nodes(&nodes)?)
                .with_relationships(relationships)
        }
    };

    tracing::debug!(
        "Read {} nodes and {} relationships from {}",
        graph.nodes.len(),
        graph.relationships.len(),
        path.display()
    );
    Ok(graph)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Sibling path used while a file or directory is being written
pub fn temp_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

/// Sibling path holding the previous CSV snapshot during a swap
pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, ".bak")
}

async fn remove_dir_if_exists(path: &Path) -> StorageResult<()> {
    if tokio::fs::try_exists(path).await? {
        tokio::fs::remove_dir_all(path).await?;
    }
    Ok(())
}

/// Replace the CSV snapshot directory `dir` with both tables of `graph`
/// as one unit.
///
/// The tables are staged in a sibling directory, the old directory is
/// moved to [`backup_path`], and the staged one is renamed into place. At
/// any point `dir` or its backup holds a complete pair from one save.
pub async fn replace_csv_dir(graph: &Graph, dir: &Path) -> StorageResult<()> {
    let staging = temp_path(dir);
    remove_dir_if_exists(&staging).await?;
    tokio::fs::create_dir_all(&staging).await?;
    tokio::fs::write(staging.join(NODES_CSV), csv::write_nodes(&graph.nodes)?).await?;
    tokio::fs::write(
        staging.join(RELATIONSHIPS_CSV),
        csv::write_relationships(&graph.relationships)?,
    )
    .await?;

    // A backup without `dir` is the only complete copy; keep it until the swap
    let backup = backup_path(dir);
    if tokio::fs::try_exists(dir).await? {
        remove_dir_if_exists(&backup).await?;
        tokio::fs::rename(dir, &backup).await?;
    }
    tokio::fs::rename(&staging, dir).await?;

    if let Err(e) = remove_dir_if_exists(&backup).await {
        tracing::warn!("Could not remove {}: {}", backup.display(), e);
    }
    tracing::debug!(
        "Swapped in CSV snapshot of {} nodes and {} relationships at {}",
        graph.nodes.len(),
        graph.relationships.len(),
        dir.display()
    );
    Ok(())
}

/// Write to a sibling temp file, then rename over `path`.
///
/// A reader of `path` sees either the old or the new contents.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = temp_path(path);
    if let Err(e) = tokio::fs::write(&tmp, contents).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
