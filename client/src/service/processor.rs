//! Queue passes - select a batch, dispatch it, record the outcomes.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use pawsync_engine::{FailureOutcome, Operation, OperationId};
use serde_json::Value;

use super::SyncService;
use crate::error::HandlerError;
use crate::events::SyncEvent;

/// What one pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Operations handed to a handler
    pub attempted: usize,
    pub completed: usize,
    /// Failed and scheduled for another attempt
    pub retried: usize,
    /// Failed terminally
    pub failed: usize,
}

/// Holds the single-flight flag; clears it on drop.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PassGuard(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncService {
    /// Run one pass over the queue.
    ///
    /// Returns immediately with an empty report if a pass is already
    /// running. Operations in the batch are dispatched one at a time in
    /// `createdAt` order. Completed records older than the retention window
    /// are dropped at the end.
    ///
    /// The pass runs on its own task. Dropping the returned future stops
    /// waiting for the report but lets the pass finish.
    pub async fn process_queue(&self) -> PassReport {
        let service = self.clone();
        match tokio::spawn(async move { service.run_pass().await }).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Sync pass aborted");
                PassReport::default()
            }
        }
    }

    async fn run_pass(&self) -> PassReport {
        let Some(_guard) = PassGuard::acquire(&self.inner.syncing) else {
            tracing::debug!("Sync already in progress, skipping pass");
            return PassReport::default();
        };

        let mut report = PassReport::default();

        let batch = {
            let queue = self.inner.queue.lock().await;
            if queue.is_empty() {
                return report;
            }
            queue.select_batch(self.inner.clock.now_ms())
        };

        if !batch.is_empty() {
            tracing::debug!(size = batch.len(), "Processing batch");
        }
        for id in batch {
            self.process_operation(&id, &mut report).await;
        }

        {
            let mut queue = self.inner.queue.lock().await;
            let pruned = queue.prune_completed(self.inner.clock.now_ms());
            if pruned > 0 {
                tracing::debug!(count = pruned, "Pruned completed operations");
            }
            self.inner.persist(&queue).await;
        }

        if report.attempted > 0 {
            tracing::info!(
                attempted = report.attempted,
                completed = report.completed,
                retried = report.retried,
                failed = report.failed,
                "Sync pass finished"
            );
        }
        report
    }

    async fn process_operation(&self, id: &str, report: &mut PassReport) {
        // The record may have been evicted or cleared since selection.
        let operation = {
            let mut queue = self.inner.queue.lock().await;
            if let Err(e) = queue.mark_processing(id) {
                tracing::debug!(op_id = %id, error = %e, "Skipping operation");
                return;
            }
            let Some(operation) = queue.get(id).cloned() else {
                return;
            };
            self.inner.persist(&queue).await;
            operation
        };
        report.attempted += 1;

        let bearer = self.inner.store.auth_token().await;
        let result = self.dispatch(&operation, bearer.as_deref()).await;

        match result {
            Ok(value) => self.complete(operation, value, report).await,
            Err(err) => self.fail(operation, err, report).await,
        }
    }

    /// Run the handler, turning a panic into a retryable failure.
    async fn dispatch(
        &self,
        operation: &Operation,
        bearer: Option<&str>,
    ) -> Result<Value, HandlerError> {
        AssertUnwindSafe(self.inner.registry.dispatch(operation, bearer))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(HandlerError::Panicked(message))
            })
    }

    async fn complete(&self, operation: Operation, result: Value, report: &mut PassReport) {
        let completed = {
            let mut queue = self.inner.queue.lock().await;
            match queue.mark_completed(&operation.id) {
                Ok(op) => {
                    let op = op.clone();
                    self.inner.persist(&queue).await;
                    op
                }
                Err(e) => {
                    tracing::warn!(op_id = %operation.id, error = %e, "Discarding result of removed operation");
                    return;
                }
            }
        };

        tracing::info!(op_id = %completed.id, route = %completed.route(), "Operation completed");
        report.completed += 1;
        self.inner.notifier.emit(SyncEvent::OperationCompleted {
            operation: completed,
            result,
        });
    }

    async fn fail(&self, operation: Operation, err: HandlerError, report: &mut PassReport) {
        let retryable = err.is_retryable(self.inner.config.retry_client_errors);
        let message = err.to_string();
        let now = self.inner.clock.now_ms();

        let (outcome, failed) = {
            let mut queue = self.inner.queue.lock().await;
            let outcome = match queue.record_failure(&operation.id, message.clone(), retryable, now) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(op_id = %operation.id, error = %e, "Discarding failure of removed operation");
                    return;
                }
            };
            let failed = queue.get(&operation.id).cloned();
            self.inner.persist(&queue).await;
            (outcome, failed)
        };

        match outcome {
            FailureOutcome::Retry {
                retry_count,
                delay_ms,
            } => {
                tracing::warn!(
                    op_id = %operation.id,
                    route = %operation.route(),
                    retry_count,
                    delay_ms,
                    error = %message,
                    "Operation failed, retry scheduled"
                );
                report.retried += 1;
                self.schedule_retry(operation.id, retry_count, delay_ms);
            }
            FailureOutcome::Exhausted { retry_count } => {
                tracing::error!(
                    op_id = %operation.id,
                    route = %operation.route(),
                    retry_count,
                    retryable,
                    error = %message,
                    "Operation failed permanently"
                );
                report.failed += 1;
                if let Some(operation) = failed {
                    self.inner.notifier.emit(SyncEvent::OperationFailed {
                        operation,
                        error: message,
                    });
                }
            }
        }
    }

    /// Move the operation back to `PENDING` once its backoff elapses.
    ///
    /// The timer holds only a weak reference, so it does not keep a dropped
    /// service alive.
    fn schedule_retry(&self, id: OperationId, retry_count: u32, delay_ms: u64) {
        let weak = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let service = SyncService { inner };

            let reactivated = {
                let mut queue = service.inner.queue.lock().await;
                let reactivated = queue.reactivate(&id, retry_count);
                if reactivated {
                    service.inner.persist(&queue).await;
                }
                reactivated
            };

            if reactivated {
                tracing::debug!(op_id = %id, retry_count, "Operation ready for retry");
                if service.is_reachable() {
                    service.run_pass().await;
                }
            }
        });
    }

    /// Start a pass on the runtime without waiting for it.
    pub(crate) fn spawn_pass(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            service.run_pass().await;
        });
    }
}
