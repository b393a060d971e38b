//! Sync event notifications.
//!
//! Subscribers learn when a queued operation reaches the remote side or
//! gives up for good. Delivery is best-effort: a subscriber that falls more
//! than the channel capacity behind observes `RecvError::Lagged` and misses
//! the oldest events.

use pawsync_engine::Operation;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Events emitted by the sync service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The operation was applied remotely.
    OperationCompleted {
        operation: Operation,
        /// Whatever the handler returned
        result: Value,
    },

    /// The operation failed terminally and will not be retried.
    OperationFailed { operation: Operation, error: String },
}

impl SyncEvent {
    pub fn operation(&self) -> &Operation {
        match self {
            SyncEvent::OperationCompleted { operation, .. }
            | SyncEvent::OperationFailed { operation, .. } => operation,
        }
    }
}

/// Fan-out of [`SyncEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventNotifier {
    sender: broadcast::Sender<SyncEvent>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`. Returns how many subscribers will see it.
    pub fn emit(&self, event: SyncEvent) -> usize {
        // No subscribers is not an error.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
