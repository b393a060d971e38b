//! Error types for the sync client.

use pawsync_engine::RouteKey;

/// Top-level error for constructing and running the client.
///
/// Only setup paths return this. Once a [`crate::SyncService`] exists, its
/// public operations record failures on the operations themselves.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Engine error: {0}")]
    Engine(#[from] pawsync_engine::Error),
}

/// Errors from the key-value persistence port.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Encoding error: {0}")]
    Encode(#[from] pawsync_engine::Error),

    /// Failure reported by a custom [`crate::storage::KeyValueStore`]
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors from the remote transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request never produced a response (DNS, refused, reset, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Response with a non-2xx status
    #[error("API error: {status}")]
    Status { status: u16, body: String },
}

/// Why a handler could not apply an operation remotely.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {status}")]
    Api { status: u16, body: String },

    #[error("no handler registered for {0}")]
    UnknownRoute(RouteKey),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl From<TransportError> for HandlerError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network(msg) => HandlerError::Network(msg),
            TransportError::Status { status, body } => HandlerError::Api { status, body },
        }
    }
}

impl HandlerError {
    /// Whether another attempt could succeed.
    ///
    /// Configuration mismatches never can. Client errors (4xx other than
    /// 401, 403, 408 and 429) are retried only when `retry_client_errors`
    /// is set.
    pub fn is_retryable(&self, retry_client_errors: bool) -> bool {
        match self {
            HandlerError::Network(_) | HandlerError::Panicked(_) => true,
            HandlerError::Api { status, .. } => match *status {
                401 | 403 | 408 | 429 => true,
                400..=499 => retry_client_errors,
                _ => true,
            },
            HandlerError::UnknownRoute(_) | HandlerError::InvalidPayload(_) => false,
        }
    }
}
