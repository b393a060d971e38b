//! The sync service - owns the offline queue and replays it remotely.
//!
//! A [`SyncService`] is cheap to clone; all clones share one queue. The
//! queue sits behind an async mutex that is held for every
//! read-modify-persist cycle and released while handlers run, so
//! `enqueue`, `clear_queue` and status reads stay responsive during a
//! pass. At most one pass runs at a time.

mod helpers;
mod processor;
mod scheduler;

pub use processor::PassReport;
pub use scheduler::SyncHandle;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pawsync_engine::{
    Operation, OperationDraft, OperationId, OperationQueue, QueueStatus, SyncConfig,
};
use tokio::sync::{broadcast, Mutex};

use crate::clock::{Clock, SystemClock};
use crate::connectivity::ConnectivityMonitor;
use crate::error::ClientError;
use crate::events::{EventNotifier, SyncEvent, DEFAULT_EVENT_CAPACITY};
use crate::handlers::HandlerRegistry;
use crate::storage::{KeyValueStore, QueueStore};

#[derive(Clone)]
pub struct SyncService {
    inner: Arc<Inner>,
}

struct Inner {
    queue: Mutex<OperationQueue>,
    store: QueueStore,
    registry: HandlerRegistry,
    clock: Arc<dyn Clock>,
    notifier: EventNotifier,
    connectivity: ConnectivityMonitor,
    config: SyncConfig,
    /// Single-flight guard for passes
    syncing: AtomicBool,
    paused: AtomicBool,
}

impl Inner {
    /// Persist the queue. Failures are logged; the in-memory queue stays authoritative.
    async fn persist(&self, queue: &OperationQueue) {
        if let Err(e) = self.store.save(queue.operations()).await {
            tracing::error!(error = %e, "Failed to persist offline queue");
        }
    }
}

/// Builder for [`SyncService`].
pub struct SyncServiceBuilder {
    store: Arc<dyn KeyValueStore>,
    registry: HandlerRegistry,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    connectivity: Option<ConnectivityMonitor>,
    event_capacity: usize,
}

impl SyncServiceBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Connectivity source. Defaults to a monitor that starts reachable.
    pub fn connectivity(mut self, monitor: ConnectivityMonitor) -> Self {
        self.connectivity = Some(monitor);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validate the config, load the persisted queue, and recover any
    /// operations a previous process left in flight.
    pub async fn build(self) -> Result<SyncService, ClientError> {
        self.config.validate()?;

        let store = QueueStore::new(self.store);
        let mut queue = OperationQueue::from_operations(store.load().await, self.config.clone());

        let recovered = queue.recover_interrupted();
        if recovered > 0 {
            tracing::warn!(count = recovered, "Recovered interrupted operations");
            store.save(queue.operations()).await?;
        }

        let status = queue.status();
        tracing::info!(
            total = status.total,
            pending = status.pending,
            failed = status.failed,
            "Sync service ready"
        );

        let connectivity = self.connectivity.unwrap_or_default();

        Ok(SyncService {
            inner: Arc::new(Inner {
                queue: Mutex::new(queue),
                store,
                registry: self.registry,
                clock: self.clock,
                notifier: EventNotifier::new(self.event_capacity),
                connectivity,
                config: self.config,
                syncing: AtomicBool::new(false),
                paused: AtomicBool::new(false),
            }),
        })
    }
}

impl SyncService {
    pub fn builder(store: Arc<dyn KeyValueStore>, registry: HandlerRegistry) -> SyncServiceBuilder {
        SyncServiceBuilder {
            store,
            registry,
            clock: Arc::new(SystemClock),
            config: SyncConfig::default(),
            connectivity: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Queue a mutation for remote application.
    ///
    /// Always succeeds: the operation is persisted (or the persist failure
    /// logged) before this returns. If the queue was full, the oldest
    /// operation is evicted. When the API is reachable a pass is started in
    /// the background, even while sync is paused.
    pub async fn enqueue(&self, draft: OperationDraft) -> OperationId {
        let now = self.inner.clock.now_ms();

        let outcome = {
            let mut queue = self.inner.queue.lock().await;
            let outcome = loop {
                let id = uuid::Uuid::new_v4().to_string();
                match queue.enqueue(draft.clone(), id, now) {
                    Ok(outcome) => break outcome,
                    Err(e) => tracing::warn!(error = %e, "Regenerating operation id"),
                }
            };
            self.inner.persist(&queue).await;
            outcome
        };

        for evicted in &outcome.evicted {
            tracing::warn!(
                op_id = %evicted.id,
                route = %evicted.route(),
                status = %evicted.status,
                "Queue full, evicted operation"
            );
        }
        tracing::info!(op_id = %outcome.id, route = %draft.route(), "Operation enqueued");

        if self.is_reachable() {
            self.spawn_pass();
        }

        outcome.id
    }

    pub async fn queue_status(&self) -> QueueStatus {
        self.inner.queue.lock().await.status()
    }

    /// Snapshot of one operation.
    pub async fn operation(&self, id: &str) -> Option<Operation> {
        self.inner.queue.lock().await.get(id).cloned()
    }

    /// Snapshot of the whole queue in processing order.
    pub async fn operations(&self) -> Vec<Operation> {
        self.inner.queue.lock().await.operations().to_vec()
    }

    /// Drop every operation regardless of status.
    ///
    /// A handler call already in flight is not cancelled, but its outcome
    /// is discarded.
    pub async fn clear_queue(&self) {
        let mut queue = self.inner.queue.lock().await;
        let dropped = queue.len();
        queue.clear();
        self.inner.persist(&queue).await;
        tracing::info!(dropped, "Offline queue cleared");
    }

    /// Stop periodic passes. Passes triggered by enqueue, retry timers,
    /// reconnection or an explicit [`process_queue`](Self::process_queue)
    /// call still run.
    pub fn pause_sync(&self) {
        if !self.inner.paused.swap(true, Ordering::SeqCst) {
            tracing::info!("Sync paused");
        }
    }

    pub fn resume_sync(&self) {
        if self.inner.paused.swap(false, Ordering::SeqCst) {
            tracing::info!("Sync resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.notifier.subscribe()
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.inner.connectivity
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Store or clear the bearer token attached to remote calls.
    pub async fn set_auth_token(&self, token: Option<&str>) -> Result<(), ClientError> {
        self.inner.store.set_auth_token(token).await?;
        Ok(())
    }

    fn is_reachable(&self) -> bool {
        self.inner.connectivity.current().is_reachable()
    }

    /// Periodic passes run only when not paused and the API is reachable.
    fn is_active(&self) -> bool {
        !self.is_paused() && self.is_reachable()
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .field("paused", &self.is_paused())
            .field("syncing", &self.is_syncing())
            .finish_non_exhaustive()
    }
}
