//! Persistence sink trait definitions

use crate::error::StorageResult;
use async_trait::async_trait;
use std::path::Path;
use trellis_core::Graph;

/// Destination for periodic graph snapshots
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Load the persisted snapshot; `None` when nothing has been saved yet
    async fn load(&self) -> StorageResult<Option<Graph>>;

    /// Replace the persisted snapshot. Readers never observe a partial write.
    async fn save(&self, graph: &Graph) -> StorageResult<()>;

    /// Where snapshots live
    fn location(&self) -> &Path;
}
