use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::db::{SnapshotEntry, SnapshotStore};

/// Request to replace one user's snapshot set
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotJob {
    pub user_id: i64,
    pub entries: Vec<SnapshotEntry>,
}

/// Submits snapshot replacements to a background task
///
/// Jobs run outside the request that produced them, so a client disconnect
/// never cancels a snapshot write. Failures only show up in the logs.
#[derive(Clone)]
pub struct SnapshotWriter {
    job_tx: mpsc::UnboundedSender<SnapshotJob>,
}

/// Handle for gracefully shutting down the snapshot writer
pub struct SnapshotWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SnapshotWriterHandle {
    /// Signals the writer to stop and waits until queued jobs are written
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Snapshot writer task failed during shutdown");
        }
        tracing::info!("Snapshot writer stopped");
    }
}

impl SnapshotWriter {
    /// Spawns the writer task over `store`
    pub fn spawn(store: Arc<dyn SnapshotStore>) -> (Self, SnapshotWriterHandle) {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            Self::writer_task(store, job_rx, shutdown_rx).await;
        });

        (Self { job_tx }, SnapshotWriterHandle { shutdown_tx, task })
    }

    /// Queues a replacement of `user_id`'s snapshots without waiting for it
    pub fn submit(&self, user_id: i64, entries: Vec<SnapshotEntry>) {
        if let Err(e) = self.job_tx.send(SnapshotJob { user_id, entries }) {
            tracing::error!(user_id, error = %e, "Failed to queue snapshot write");
        }
    }

    async fn writer_task(
        store: Arc<dyn SnapshotStore>,
        mut job_rx: mpsc::UnboundedReceiver<SnapshotJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Snapshot writer task started");

        loop {
            tokio::select! {
                job = job_rx.recv() => match job {
                    Some(job) => Self::write(store.as_ref(), job).await,
                    None => break,
                },
                Some(()) = shutdown_rx.recv() => {
                    while let Ok(job) = job_rx.try_recv() {
                        Self::write(store.as_ref(), job).await;
                    }
                    break;
                }
            }
        }
    }

    async fn write(store: &dyn SnapshotStore, job: SnapshotJob) {
        match store.replace_snapshots(job.user_id, &job.entries).await {
            Ok(()) => tracing::debug!(
                user_id = job.user_id,
                count = job.entries.len(),
                "Recommendation snapshots replaced"
            ),
            Err(e) => tracing::error!(
                user_id = job.user_id,
                error = %e,
                "Failed to persist recommendation snapshots"
            ),
        }
    }
}
