//! Queue blob and auth token access on top of a [`KeyValueStore`].

use std::sync::Arc;

use pawsync_engine::{snapshot, Operation, AUTH_TOKEN_KEY, QUEUE_KEY};

use super::KeyValueStore;
use crate::error::StorageError;

#[derive(Clone)]
pub struct QueueStore {
    kv: Arc<dyn KeyValueStore>,
}

impl QueueStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the persisted queue.
    ///
    /// Never fails: a missing, unreadable or corrupt blob yields an empty
    /// queue and is logged.
    pub async fn load(&self) -> Vec<Operation> {
        let blob = match self.kv.get(QUEUE_KEY).await {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read offline queue, starting empty");
                return Vec::new();
            }
        };

        let (operations, err) = snapshot::decode_or_empty(blob.as_deref());
        if let Some(e) = err {
            tracing::error!(error = %e, "Discarding corrupt offline queue");
        }

        tracing::debug!(count = operations.len(), "Offline queue loaded");
        operations
    }

    /// Overwrite the persisted queue.
    pub async fn save(&self, operations: &[Operation]) -> Result<(), StorageError> {
        let blob = snapshot::encode(operations)?;
        self.kv.set(QUEUE_KEY, &blob).await
    }

    /// The bearer token for remote calls. Empty or unreadable tokens are `None`.
    pub async fn auth_token(&self) -> Option<String> {
        match self.kv.get(AUTH_TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read auth token");
                None
            }
        }
    }

    /// Store or clear the bearer token.
    pub async fn set_auth_token(&self, token: Option<&str>) -> Result<(), StorageError> {
        match token {
            Some(token) => self.kv.set(AUTH_TOKEN_KEY, token).await,
            None => self.kv.remove(AUTH_TOKEN_KEY).await,
        }
    }
}

impl std::fmt::Debug for QueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueStore").finish_non_exhaustive()
    }
}
