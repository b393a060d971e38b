//! Route keys used to pick the handler for an operation.

use crate::{EntityTag, OpKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The `(kind, entity)` pair that selects a handler.
///
/// Two operations with the same key are always dispatched to the same
/// handler. Adding a new entity type means registering a new key, never
/// editing an existing branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
    pub kind: OpKind,
    pub entity: EntityTag,
}

impl RouteKey {
    /// Create a route key.
    pub fn new(kind: OpKind, entity: impl Into<EntityTag>) -> Self {
        Self {
            kind,
            entity: entity.into(),
        }
    }

    /// Shorthand for a `CREATE` route.
    pub fn create(entity: impl Into<EntityTag>) -> Self {
        Self::new(OpKind::Create, entity)
    }

    /// Shorthand for an `UPDATE` route.
    pub fn update(entity: impl Into<EntityTag>) -> Self {
        Self::new(OpKind::Update, entity)
    }

    /// Shorthand for a `DELETE` route.
    pub fn delete(entity: impl Into<EntityTag>) -> Self {
        Self::new(OpKind::Delete, entity)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.entity)
    }
}
