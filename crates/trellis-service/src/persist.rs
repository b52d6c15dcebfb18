//! Snapshot persistence and the periodic autosave task

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use trellis_storage::{EntityStore, PersistenceSink, StorageError, StorageResult};

/// Wrap a persistence future in the configured time budget
pub(crate) async fn with_timeout<T>(
    budget: Duration,
    fut: impl std::future::Future<Output = StorageResult<T>>,
) -> StorageResult<T> {
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(budget.as_millis() as u64)),
    }
}

/// Clone a snapshot under the read guard, release it, then write
pub(crate) async fn save(
    store: &RwLock<EntityStore>,
    sink: &dyn PersistenceSink,
    budget: Duration,
) -> StorageResult<()> {
    let snapshot = store.read().await.snapshot();
    with_timeout(budget, sink.save(&snapshot)).await?;
    tracing::debug!(
        "Saved {} nodes and {} relationships to {}",
        snapshot.nodes.len(),
        snapshot.relationships.len(),
        sink.location().display()
    );
    Ok(())
}

/// Handle to a running autosave task
pub(crate) struct Autosave {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Autosave {
    /// Save every `interval` until stopped. Failures are logged and the
    /// task keeps running.
    pub(crate) fn spawn(
        store: Arc<RwLock<EntityStore>>,
        sink: Arc<dyn PersistenceSink>,
        interval: Duration,
        budget: Duration,
    ) -> Self {
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = save(&store, sink.as_ref(), budget).await {
                            tracing::error!(
                                "Autosave to {} failed: {}",
                                sink.location().display(),
                                e
                            );
                        }
                    }
                    // Err means the sender was dropped along with the service
                    _ = stopped.changed() => break,
                }
            }
            tracing::debug!("Autosave task stopped");
        });

        tracing::info!("Autosave every {} ms", interval.as_millis());
        Self { stop, handle }
    }

    /// Signal the task and wait for an in-flight save to finish
    pub(crate) async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!("Autosave task ended abnormally: {}", e);
        }
    }
}
