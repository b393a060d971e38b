//! # Pawsync Engine
//!
//! A deterministic offline operation queue for mobile clients.
//!
//! Mutations made while the device is offline (creating a pet, sending a
//! message, editing a profile) are captured as operations, kept in a bounded
//! queue, and replayed against the remote API once connectivity returns.
//! This crate owns the queue and its state machine; the I/O side (storage,
//! HTTP, timers) lives in `pawsync-client`.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never reads a clock, a socket or a file
//! - **Deterministic**: every time-dependent call takes the current time as an argument
//! - **Persistable at any point**: the whole state is a JSON array of operations
//!
//! ## Core Concepts
//!
//! ### Operations
//!
//! An [`Operation`] records one deferred mutation: its [`OpKind`], the target
//! entity tag, an opaque payload, and its retry bookkeeping. Its
//! [`OpStatus`] moves along
//! `PENDING -> PROCESSING -> {COMPLETED | FAILED}`, with `FAILED -> PENDING`
//! after a backoff delay while the retry budget lasts.
//!
//! ### Queue
//!
//! [`OperationQueue`] keeps operations in `createdAt` order, enforces
//! `maxQueueSize` on enqueue, selects the next batch, applies the retry
//! policy, and garbage-collects completed records.
//!
//! ### Routes
//!
//! Each operation is dispatched by its [`RouteKey`], the `(kind, entity)`
//! pair. Unknown routes are configuration errors and never retried.
//!
//! ## Quick Start
//!
//! ```rust
//! use pawsync_engine::{OpKind, OpStatus, OperationDraft, OperationQueue, SyncConfig};
//! use serde_json::json;
//!
//! let mut queue = OperationQueue::new(SyncConfig::default());
//!
//! let draft = OperationDraft::new(OpKind::Create, "pet", json!({"name": "Rex"})).unwrap();
//! let outcome = queue.enqueue(draft, "op_1", 1706745600000).unwrap();
//!
//! let batch = queue.select_batch(1706745600000);
//! assert_eq!(batch, vec![outcome.id.clone()]);
//!
//! queue.mark_processing(&outcome.id).unwrap();
//! queue.mark_completed(&outcome.id).unwrap();
//! assert_eq!(queue.get(&outcome.id).unwrap().status, OpStatus::Completed);
//! ```
//!
//! ## Persistence
//!
//! Use [`snapshot::encode`] and [`snapshot::decode_or_empty`] to move the
//! queue in and out of the `offline.queue` key.

pub mod backoff;
pub mod config;
pub mod error;
pub mod operation;
pub mod queue;
pub mod route;
pub mod snapshot;

// Re-export main types at crate root
pub use config::{EvictionPolicy, SyncConfig};
pub use error::{Error, Result};
pub use operation::{OpKind, OpStatus, Operation, OperationDraft};
pub use queue::{EnqueueOutcome, FailureOutcome, OperationQueue, QueueStatus};
pub use route::RouteKey;
pub use snapshot::{AUTH_TOKEN_KEY, QUEUE_KEY};

/// Type aliases for clarity
pub type OperationId = String;
pub type EntityTag = String;
/// Milliseconds since the Unix epoch
pub type Timestamp = u64;
