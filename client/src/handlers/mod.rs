//! Operation handlers - apply queued operations against the remote API.

mod registry;
mod rest;

pub use registry::*;
pub use rest::*;

use async_trait::async_trait;
use pawsync_engine::Operation;
use serde_json::Value;

use crate::error::HandlerError;

/// Entity tags with built-in routes.
pub mod entity {
    pub const PET: &str = "pet";
    pub const MESSAGE: &str = "message";
    pub const USER: &str = "user";
    pub const LIKE: &str = "like";
}

/// Applies one operation remotely.
///
/// Success means the remote side has durably applied the mutation. The
/// returned value is handed to completion subscribers untouched.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn handle(&self, operation: &Operation, bearer: Option<&str>)
        -> Result<Value, HandlerError>;
}
