//! Persistence for the offline queue.
//!
//! The service only needs a string key-value store. Two backends ship with
//! the crate: [`MemoryStore`] for tests and ephemeral sessions, and
//! [`SqliteStore`] for on-device persistence. [`QueueStore`] layers the
//! queue blob and auth token keys on top of either.

mod memory;
mod queue_store;
mod sqlite;

pub use memory::MemoryStore;
pub use queue_store::QueueStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::StorageError;

/// Asynchronous string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
