//! Error types for the pawsync engine.

use crate::{OpStatus, OperationId};
use thiserror::Error;

/// All possible errors from the queue engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Input errors
    #[error("invalid operation draft: {0}")]
    InvalidDraft(String),

    #[error("invalid sync config: {0}")]
    InvalidConfig(String),

    // State errors
    #[error("duplicate operation id: {0}")]
    DuplicateOperation(OperationId),

    #[error("operation not found: {0}")]
    OperationNotFound(OperationId),

    #[error("invalid transition for operation {id}: {from} -> {to}")]
    InvalidTransition {
        id: OperationId,
        from: OpStatus,
        to: OpStatus,
    },

    // Persistence errors
    #[error("invalid queue snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
