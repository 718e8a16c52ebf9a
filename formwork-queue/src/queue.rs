//! The submit/poll queue and its single worker.

use crate::error::{QueueError, QueueResult};
use crate::operation::{OperationKind, OperationRequest, OperationStatus};
use formwork_storage::StorageEngine;
use formwork_types::OperationId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Entry {
    kind: OperationKind,
    entity: String,
    status: OperationStatus,
}

struct Job {
    id: OperationId,
    request: OperationRequest,
}

type Entries = Arc<RwLock<HashMap<OperationId, Entry>>>;

/// Non-blocking submission front-end for the storage engine.
///
/// Results stay retrievable until [`discard`](Self::discard)ed or the queue
/// is dropped.
pub struct OperationQueue {
    tx: mpsc::UnboundedSender<Job>,
    entries: Entries,
    settled: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl OperationQueue {
    /// Starts the worker task. Must be called from within a Tokio runtime.
    pub fn spawn(storage: Arc<StorageEngine>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let entries: Entries = Arc::new(RwLock::new(HashMap::new()));
        let settled = Arc::new(Notify::new());
        let worker = tokio::spawn(run_worker(
            storage,
            rx,
            Arc::clone(&entries),
            Arc::clone(&settled),
        ));
        Self {
            tx,
            entries,
            settled,
            worker,
        }
    }

    /// Enqueues an operation and returns its id without waiting for it.
    pub fn submit(&self, request: OperationRequest) -> QueueResult<OperationId> {
        let id = OperationId::new();
        let entry = Entry {
            kind: request.kind(),
            entity: request.entity().to_string(),
            status: OperationStatus::Pending,
        };
        debug!(op = %id, kind = %entry.kind, entity = %entry.entity, "Operation submitted");
        self.write_entries().insert(id, entry);

        if self.tx.send(Job { id, request }).is_err() {
            self.write_entries().remove(&id);
            return Err(QueueError::Closed);
        }
        Ok(id)
    }

    /// Current status of an operation. Never blocks on the worker.
    pub fn poll(&self, id: OperationId) -> QueueResult<OperationStatus> {
        self.read_entries()
            .get(&id)
            .map(|e| e.status.clone())
            .ok_or(QueueError::UnknownOperation(id))
    }

    /// Resolves once the operation has completed or failed.
    pub async fn wait(&self, id: OperationId) -> QueueResult<OperationStatus> {
        loop {
            // Registered before the check so a settle in between still wakes us.
            let notified = self.settled.notified();
            let status = self.poll(id)?;
            if !status.is_pending() {
                return Ok(status);
            }
            notified.await;
        }
    }

    /// Drops a settled operation's result. Pending operations cannot be
    /// discarded and return false, as do unknown ids.
    pub fn discard(&self, id: OperationId) -> bool {
        let mut entries = self.write_entries();
        match entries.get(&id) {
            Some(entry) if !entry.status.is_pending() => {
                entries.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Kind and entity an operation was submitted with.
    pub fn describe(&self, id: OperationId) -> QueueResult<(OperationKind, String)> {
        self.read_entries()
            .get(&id)
            .map(|e| (e.kind, e.entity.clone()))
            .ok_or(QueueError::UnknownOperation(id))
    }

    /// Number of retained operations, pending or settled.
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.read_entries()
            .values()
            .filter(|e| e.status.is_pending())
            .count()
    }

    /// Stops accepting work, lets the worker drain what was already
    /// submitted, and waits for it to exit.
    pub async fn shutdown(self) {
        let Self { tx, worker, .. } = self;
        drop(tx);
        if let Err(e) = worker.await {
            warn!("Operation queue worker ended abnormally: {e}");
        }
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<OperationId, Entry>> {
        self.entries.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<OperationId, Entry>> {
        self.entries.write().unwrap_or_else(|p| p.into_inner())
    }
}

async fn run_worker(
    storage: Arc<StorageEngine>,
    mut rx: mpsc::UnboundedReceiver<Job>,
    entries: Entries,
    settled: Arc<Notify>,
) {
    while let Some(Job { id, request }) = rx.recv().await {
        let kind = request.kind();
        let storage = Arc::clone(&storage);
        let outcome = tokio::task::spawn_blocking(move || request.execute(&storage)).await;

        let status = match outcome {
            Ok(Ok(value)) => OperationStatus::Completed(value),
            Ok(Err(e)) => {
                warn!(op = %id, kind = %kind, "Operation failed: {e}");
                OperationStatus::Failed(e.to_string())
            }
            Err(e) => {
                warn!(op = %id, kind = %kind, "Operation task aborted: {e}");
                OperationStatus::Failed(format!("operation task aborted: {e}"))
            }
        };
        debug!(op = %id, kind = %kind, failed = status.error().is_some(), "Operation settled");

        let mut guard = entries.write().unwrap_or_else(|p| p.into_inner());
        if let Some(entry) = guard.get_mut(&id) {
            entry.status = status;
        }
        drop(guard);
        settled.notify_waiters();
    }
    debug!("Operation queue worker stopped");
}
