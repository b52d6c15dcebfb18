//! File-backed persistence sinks

use crate::error::StorageResult;
use crate::format::{self, ExportFormat, NODES_CSV};
use crate::traits::PersistenceSink;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use trellis_core::Graph;

/// Snapshot stored as a single JSON document
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PersistenceSink for JsonFileSink {
    async fn load(&self) -> StorageResult<Option<Graph>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        format::read_graph(ExportFormat::Json, &self.path)
            .await
            .map(Some)
    }

    async fn save(&self, graph: &Graph) -> StorageResult<()> {
        format::write_graph(graph, ExportFormat::Json, &self.path).await
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Snapshot stored as `nodes.csv` and `relationships.csv` in a directory
#[derive(Debug, Clone)]
pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PersistenceSink for CsvDirSink {
    /// Falls back to the backup left by an interrupted save
    async fn load(&self) -> StorageResult<Option<Graph>> {
        let mut dir = self.dir.clone();
        if !tokio::fs::try_exists(dir.join(NODES_CSV)).await? {
            let backup = format::backup_path(&self.dir);
            if !tokio::fs::try_exists(backup.join(NODES_CSV)).await? {
                return Ok(None);
            }
            tracing::warn!(
                "{} is missing, loading the previous snapshot from {}",
                self.dir.display(),
                backup.display()
            );
            dir = backup;
        }
        format::read_graph(ExportFormat::Csv, &dir).await.map(Some)
    }

    async fn save(&self, graph: &Graph) -> StorageResult<()> {
        format::replace_csv_dir(graph, &self.dir).await
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}
