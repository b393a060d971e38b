//! Wire format of the persisted queue.
//!
//! The queue is stored under a single key as a JSON array of operations.
//! Decoding is strict; [`decode_or_empty`] layers the "never fail on load"
//! policy on top of it.

use crate::{error::Result, Error, Operation};
use std::collections::HashSet;

/// Key under which the queue blob is persisted.
pub const QUEUE_KEY: &str = "offline.queue";

/// Key holding the bearer token handlers authenticate with.
pub const AUTH_TOKEN_KEY: &str = "user.authToken";

/// Serialize operations to the persisted JSON array.
pub fn encode(operations: &[Operation]) -> Result<String> {
    serde_json::to_string(operations).map_err(|e| Error::InvalidSnapshot(e.to_string()))
}

/// Deserialize a persisted JSON array.
///
/// Rejects malformed JSON, unknown enum values and duplicate IDs.
pub fn decode(json: &str) -> Result<Vec<Operation>> {
    let operations: Vec<Operation> =
        serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

    let mut seen = HashSet::with_capacity(operations.len());
    for op in &operations {
        if !seen.insert(op.id.as_str()) {
            return Err(Error::InvalidSnapshot(format!(
                "duplicate operation id: {}",
                op.id
            )));
        }
    }

    Ok(operations)
}

/// Decode a possibly missing blob, falling back to an empty queue.
///
/// A missing blob is not an error. A corrupt one yields an empty queue plus
/// the decode error so the caller can report it.
pub fn decode_or_empty(json: Option<&str>) -> (Vec<Operation>, Option<Error>) {
    match json {
        None => (Vec::new(), None),
        Some(s) if s.trim().is_empty() => (Vec::new(), None),
        Some(s) => match decode(s) {
            Ok(ops) => (ops, None),
            Err(e) => (Vec::new(), Some(e)),
        },
    }
}
