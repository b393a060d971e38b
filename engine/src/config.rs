//! Tunables for the queue, scheduler and retry controller.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which records to drop when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionPolicy {
    /// Oldest by `createdAt`, whatever its status.
    #[default]
    Oldest,
    /// Completed first, then exhausted failures, then other idle records.
    /// In-flight records go last.
    StatusAware,
}

/// Queue and sync configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Failed attempts before an operation is finalized as `FAILED`
    pub max_retries: u32,
    /// Backoff base, doubled per retry
    pub base_delay_ms: u64,
    /// Operations attempted per pass
    pub batch_size: usize,
    /// Hard bound on queue length
    pub max_queue_size: usize,
    /// Period of the background scheduler
    pub sync_interval_ms: u64,
    /// How long `COMPLETED` records are kept, measured from `createdAt`
    pub completed_retention_ms: u64,
    pub eviction: EvictionPolicy,
    /// Treat 4xx responses (other than auth, 408 and 429) as retryable
    pub retry_client_errors: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1_000,
            batch_size: 10,
            max_queue_size: 1_000,
            sync_interval_ms: 30_000,
            completed_retention_ms: 24 * 60 * 60 * 1_000,
            eviction: EvictionPolicy::Oldest,
            retry_client_errors: true,
        }
    }
}

impl SyncConfig {
    /// Reject settings the queue cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.max_queue_size == 0 {
            return Err(Error::InvalidConfig("maxQueueSize must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batchSize must be at least 1".into()));
        }
        if self.base_delay_ms == 0 {
            return Err(Error::InvalidConfig("baseDelayMs must be at least 1".into()));
        }
        if self.sync_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "syncIntervalMs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
