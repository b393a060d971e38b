//! The bounded operation queue and its state machine.
//!
//! `OperationQueue` holds every pending, in-flight, failed and recently
//! completed operation. It never performs I/O: callers pass the current time
//! in and persist the result of [`OperationQueue::operations`] themselves.

use crate::{
    backoff, error::Result, EvictionPolicy, Error, OpStatus, Operation, OperationDraft,
    OperationId, SyncConfig, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Counters reported to UI layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub total: usize,
    pub pending: usize,
    pub failed: usize,
}

/// Result of enqueueing a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueOutcome {
    /// ID of the new operation
    pub id: OperationId,
    /// Records dropped to stay within `max_queue_size`
    pub evicted: Vec<Operation>,
}

/// What the retry controller decided after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Re-activate after `delay_ms`, but only if the record still has
    /// `retry_count` by then.
    Retry { retry_count: u32, delay_ms: u64 },
    /// Terminal. No further automatic attempts.
    Exhausted { retry_count: u32 },
}

/// Ordered, bounded list of operations.
#[derive(Debug, Clone, Default)]
pub struct OperationQueue {
    config: SyncConfig,
    /// Kept in ascending `created_at` order
    operations: Vec<Operation>,
}

impl OperationQueue {
    /// Create an empty queue.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            operations: Vec::new(),
        }
    }

    /// Restore a queue from persisted records.
    ///
    /// Records are re-sorted by `created_at`; ties keep their persisted order.
    pub fn from_operations(mut operations: Vec<Operation>, config: SyncConfig) -> Self {
        operations.sort_by_key(|op| op.created_at);
        Self { config, operations }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// All records, oldest first.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Look up a record by ID.
    pub fn get(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Operation> {
        self.operations
            .iter_mut()
            .find(|op| op.id == id)
            .ok_or_else(|| Error::OperationNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Append a new `PENDING` operation built from `draft`.
    ///
    /// `created_at` is `now`, bumped past the newest record if needed so that
    /// enqueue order and `created_at` order always agree. When the queue is
    /// full, records are evicted per the configured [`EvictionPolicy`] first.
    pub fn enqueue(
        &mut self,
        draft: OperationDraft,
        id: impl Into<OperationId>,
        now: Timestamp,
    ) -> Result<EnqueueOutcome> {
        let id = id.into();
        if self.get(&id).is_some() {
            return Err(Error::DuplicateOperation(id));
        }

        let created_at = match self.operations.iter().map(|op| op.created_at).max() {
            Some(newest) if newest >= now => newest.saturating_add(1),
            _ => now,
        };

        let mut evicted = Vec::new();
        while self.operations.len() >= self.config.max_queue_size.max(1) {
            match self.evict_one() {
                Some(op) => evicted.push(op),
                None => break,
            }
        }

        self.operations
            .push(Operation::from_draft(draft, id.clone(), created_at));

        Ok(EnqueueOutcome { id, evicted })
    }

    fn evict_one(&mut self) -> Option<Operation> {
        let max_retries = self.config.max_retries;
        let index = match self.config.eviction {
            EvictionPolicy::Oldest => self
                .operations
                .iter()
                .enumerate()
                .min_by_key(|(_, op)| op.created_at)
                .map(|(i, _)| i),
            EvictionPolicy::StatusAware => self
                .operations
                .iter()
                .enumerate()
                .min_by_key(|(_, op)| (eviction_tier(op, max_retries), op.created_at))
                .map(|(i, _)| i),
        }?;

        Some(self.operations.remove(index))
    }

    /// IDs of the operations the next pass should attempt, oldest first.
    ///
    /// `PENDING` records are always eligible. `FAILED` records are eligible
    /// once their backoff has elapsed, unless their retry budget is spent.
    pub fn select_batch(&self, now: Timestamp) -> Vec<OperationId> {
        let mut eligible: Vec<&Operation> = self
            .operations
            .iter()
            .filter(|op| self.is_eligible(op, now))
            .collect();
        eligible.sort_by_key(|op| op.created_at);

        eligible
            .into_iter()
            .take(self.config.batch_size)
            .map(|op| op.id.clone())
            .collect()
    }

    fn is_eligible(&self, op: &Operation, now: Timestamp) -> bool {
        match op.status {
            OpStatus::Pending => true,
            OpStatus::Failed if op.retry_count < self.config.max_retries => {
                let Some(last) = op.last_retry_at else {
                    return true;
                };
                now >= backoff::ready_at(self.config.base_delay_ms, last, op.retry_count)
            }
            _ => false,
        }
    }

    /// `PENDING | FAILED -> PROCESSING`.
    pub fn mark_processing(&mut self, id: &str) -> Result<()> {
        self.get_mut(id)?.transition(OpStatus::Processing)
    }

    /// `PROCESSING -> COMPLETED`.
    pub fn mark_completed(&mut self, id: &str) -> Result<&Operation> {
        let op = self.get_mut(id)?;
        op.transition(OpStatus::Completed)?;
        Ok(op)
    }

    /// Record a failed attempt: `PROCESSING -> FAILED`.
    ///
    /// A non-retryable failure is finalized immediately by raising
    /// `retry_count` to the retry budget, so the terminal state survives a
    /// persist/restore cycle.
    pub fn record_failure(
        &mut self,
        id: &str,
        error: impl Into<String>,
        retryable: bool,
        now: Timestamp,
    ) -> Result<FailureOutcome> {
        let max_retries = self.config.max_retries;
        let base_delay_ms = self.config.base_delay_ms;

        let op = self.get_mut(id)?;
        op.transition(OpStatus::Failed)?;
        op.retry_count = op.retry_count.saturating_add(1);
        op.last_retry_at = Some(now);
        op.last_error = Some(error.into());

        // Marks the record terminal without another field on the wire.
        if !retryable {
            op.retry_count = op.retry_count.max(max_retries);
        }

        if op.retry_count >= max_retries {
            Ok(FailureOutcome::Exhausted {
                retry_count: op.retry_count,
            })
        } else {
            Ok(FailureOutcome::Retry {
                retry_count: op.retry_count,
                delay_ms: backoff::delay_ms(base_delay_ms, op.retry_count),
            })
        }
    }

    /// `FAILED -> PENDING` once a backoff delay fires.
    ///
    /// Returns `false` without touching anything if the record is gone, is no
    /// longer `FAILED`, has been retried since (`retry_count` moved on), or is
    /// exhausted.
    pub fn reactivate(&mut self, id: &str, expected_retry_count: u32) -> bool {
        let max_retries = self.config.max_retries;
        match self.operations.iter_mut().find(|op| op.id == id) {
            Some(op)
                if op.status == OpStatus::Failed
                    && op.retry_count == expected_retry_count
                    && op.retry_count < max_retries =>
            {
                op.status = OpStatus::Pending;
                true
            }
            _ => false,
        }
    }

    /// Return records stuck in `PROCESSING` (the process died mid-handler)
    /// to `PENDING`. They may be delivered twice.
    pub fn recover_interrupted(&mut self) -> usize {
        let mut recovered = 0;
        for op in self
            .operations
            .iter_mut()
            .filter(|op| op.status == OpStatus::Processing)
        {
            op.status = OpStatus::Pending;
            recovered += 1;
        }
        recovered
    }

    /// Drop `COMPLETED` records whose age reached the retention window.
    pub fn prune_completed(&mut self, now: Timestamp) -> usize {
        let retention = self.config.completed_retention_ms;
        let before = self.operations.len();
        self.operations.retain(|op| {
            op.status != OpStatus::Completed || now.saturating_sub(op.created_at) < retention
        });
        before - self.operations.len()
    }

    /// Current counters.
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            total: self.operations.len(),
            pending: self.count(OpStatus::Pending),
            failed: self.count(OpStatus::Failed),
        }
    }

    fn count(&self, status: OpStatus) -> usize {
        self.operations.iter().filter(|op| op.status == status).count()
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.operations.clear();
    }
}

/// Lower tiers are evicted first.
fn eviction_tier(op: &Operation, max_retries: u32) -> u8 {
    match op.status {
        OpStatus::Completed => 0,
        OpStatus::Failed if op.retry_count >= max_retries => 1,
        OpStatus::Pending | OpStatus::Failed => 2,
        OpStatus::Processing => 3,
    }
}
