//! Shorthands for the built-in routes.

use pawsync_engine::{OpKind, OperationDraft, OperationId};
use serde_json::{json, Value};

use super::SyncService;
use crate::handlers::entity;

impl SyncService {
    async fn enqueue_route(&self, kind: OpKind, entity: &str, payload: Value) -> OperationId {
        self.enqueue(OperationDraft {
            kind,
            entity: entity.to_string(),
            payload,
        })
        .await
    }

    pub async fn create_pet(&self, pet: Value) -> OperationId {
        self.enqueue_route(OpKind::Create, entity::PET, pet).await
    }

    /// `changes` must carry the pet's `id`.
    pub async fn update_pet(&self, changes: Value) -> OperationId {
        self.enqueue_route(OpKind::Update, entity::PET, changes).await
    }

    pub async fn delete_pet(&self, pet_id: &str) -> OperationId {
        self.enqueue_route(OpKind::Delete, entity::PET, json!({ "id": pet_id }))
            .await
    }

    pub async fn send_message(&self, message: Value) -> OperationId {
        self.enqueue_route(OpKind::Create, entity::MESSAGE, message)
            .await
    }

    pub async fn delete_message(&self, message_id: &str) -> OperationId {
        self.enqueue_route(OpKind::Delete, entity::MESSAGE, json!({ "id": message_id }))
            .await
    }

    pub async fn like(&self, like: Value) -> OperationId {
        self.enqueue_route(OpKind::Create, entity::LIKE, like).await
    }

    pub async fn update_profile(&self, profile: Value) -> OperationId {
        self.enqueue_route(OpKind::Update, entity::USER, profile)
            .await
    }
}
