//! Operation types for deferred mutations.
//!
//! A mutation made while offline is captured as an [`Operation`] and kept in
//! the queue until the remote API has accepted it. The record carries its own
//! retry bookkeeping so the queue can be persisted and restored at any point.

use crate::{EntityTag, Error, OperationId, Result, RouteKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Create => "CREATE",
            OpKind::Update => "UPDATE",
            OpKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a queued operation.
///
/// ```text
/// PENDING -> PROCESSING -> COMPLETED
///                \-----> FAILED -> PENDING (after backoff)
///                          \-> PROCESSING (selected once backoff elapsed)
/// ```
///
/// `COMPLETED` is terminal. `FAILED` is terminal once the retry budget is
/// spent; the queue tracks that through `retry_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl OpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpStatus::Pending => "PENDING",
            OpStatus::Processing => "PROCESSING",
            OpStatus::Completed => "COMPLETED",
            OpStatus::Failed => "FAILED",
        }
    }

    /// Whether the state machine allows moving from `self` to `to`.
    ///
    /// `PROCESSING -> PENDING` is only used when recovering records that were
    /// interrupted mid-handler.
    pub fn can_transition_to(&self, to: OpStatus) -> bool {
        use OpStatus::*;
        matches!(
            (*self, to),
            (Pending, Processing)
                | (Failed, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Pending)
                | (Failed, Pending)
        )
    }
}

impl fmt::Display for OpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client-initiated mutation that has not been queued yet.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDraft {
    pub kind: OpKind,
    pub entity: EntityTag,
    pub payload: serde_json::Value,
}

impl OperationDraft {
    /// Validate and build a draft.
    pub fn new(
        kind: OpKind,
        entity: impl Into<EntityTag>,
        payload: serde_json::Value,
    ) -> Result<Self> {
        let entity = entity.into();
        if entity.trim().is_empty() {
            return Err(Error::InvalidDraft("entity must not be empty".into()));
        }

        Ok(Self {
            kind,
            entity,
            payload,
        })
    }

    /// The handler route this draft will be dispatched to.
    pub fn route(&self) -> RouteKey {
        RouteKey::new(self.kind, self.entity.clone())
    }
}

/// A queued operation.
///
/// Field names match the persisted `offline.queue` format. The aliases accept
/// queues written by the previous client (`type`, `data`, `timestamp`,
/// `lastRetry`, `error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Assigned at enqueue time, never changes
    pub id: OperationId,
    #[serde(alias = "type")]
    pub kind: OpKind,
    pub entity: EntityTag,
    /// Opaque data needed to perform the mutation remotely
    #[serde(alias = "data", default)]
    pub payload: serde_json::Value,
    /// Enqueue time, the ordering key
    #[serde(alias = "timestamp")]
    pub created_at: Timestamp,
    /// Failed attempts so far. A non-retryable failure raises it straight
    /// to `max_retries`, so it can exceed the number of real attempts.
    #[serde(default)]
    pub retry_count: u32,
    #[serde(alias = "lastRetry", default, skip_serializing_if = "Option::is_none")]
    pub last_retry_at: Option<Timestamp>,
    pub status: OpStatus,
    #[serde(alias = "error", default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Operation {
    /// Build a fresh `PENDING` operation from a draft.
    pub fn from_draft(
        draft: OperationDraft,
        id: impl Into<OperationId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            kind: draft.kind,
            entity: draft.entity,
            payload: draft.payload,
            created_at,
            retry_count: 0,
            last_retry_at: None,
            status: OpStatus::Pending,
            last_error: None,
        }
    }

    /// The handler route for this operation.
    pub fn route(&self) -> RouteKey {
        RouteKey::new(self.kind, self.entity.clone())
    }

    /// `FAILED` with the retry budget spent.
    pub fn is_exhausted(&self, max_retries: u32) -> bool {
        self.status == OpStatus::Failed && self.retry_count >= max_retries
    }

    /// Move to `to`, enforcing the state machine.
    pub(crate) fn transition(&mut self, to: OpStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
