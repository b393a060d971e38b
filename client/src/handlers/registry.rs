//! Handler registry keyed by route.

use std::collections::HashMap;
use std::sync::Arc;

use pawsync_engine::{Operation, RouteKey};
use serde_json::Value;

use super::{entity, OperationHandler, RestHandler};
use crate::error::HandlerError;
use crate::transport::{Method, RemoteTransport};

/// Maps `(kind, entity)` routes to handlers.
///
/// Built once at startup and read-only afterwards. Dispatching an
/// operation whose route has no handler fails with
/// [`HandlerError::UnknownRoute`].
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<RouteKey, Arc<dyn OperationHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The REST routes of the pawsync API.
    ///
    /// | Route          | Call                    |
    /// |----------------|-------------------------|
    /// | CREATE pet     | `POST /pets`            |
    /// | UPDATE pet     | `PATCH /pets/{id}`      |
    /// | DELETE pet     | `DELETE /pets/{id}`     |
    /// | CREATE message | `POST /messages`        |
    /// | DELETE message | `DELETE /messages/{id}` |
    /// | CREATE like    | `POST /likes`           |
    /// | UPDATE user    | `PATCH /users/profile`  |
    pub fn rest(transport: Arc<dyn RemoteTransport>) -> Self {
        let routes = [
            (RouteKey::create(entity::PET), Method::Post, "/pets"),
            (RouteKey::update(entity::PET), Method::Patch, "/pets/{id}"),
            (RouteKey::delete(entity::PET), Method::Delete, "/pets/{id}"),
            (RouteKey::create(entity::MESSAGE), Method::Post, "/messages"),
            (RouteKey::delete(entity::MESSAGE), Method::Delete, "/messages/{id}"),
            (RouteKey::create(entity::LIKE), Method::Post, "/likes"),
            (RouteKey::update(entity::USER), Method::Patch, "/users/profile"),
        ];

        let mut registry = Self::new();
        for (route, method, path) in routes {
            registry.register(route, RestHandler::new(transport.clone(), method, path));
        }
        registry
    }

    /// Register `handler` for `route`, replacing any previous one.
    pub fn register(
        &mut self,
        route: RouteKey,
        handler: impl OperationHandler + 'static,
    ) -> &mut Self {
        if self.handlers.insert(route.clone(), Arc::new(handler)).is_some() {
            tracing::debug!(%route, "Replaced operation handler");
        }
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, route: RouteKey, handler: impl OperationHandler + 'static) -> Self {
        self.register(route, handler);
        self
    }

    pub fn get(&self, route: &RouteKey) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.get(route).cloned()
    }

    pub fn contains(&self, route: &RouteKey) -> bool {
        self.handlers.contains_key(route)
    }

    /// Registered routes in sorted order.
    pub fn routes(&self) -> Vec<RouteKey> {
        let mut routes: Vec<RouteKey> = self.handlers.keys().cloned().collect();
        routes.sort();
        routes
    }

    /// Apply `operation` with the handler registered for its route.
    pub async fn dispatch(
        &self,
        operation: &Operation,
        bearer: Option<&str>,
    ) -> Result<Value, HandlerError> {
        let route = operation.route();
        let handler = self
            .get(&route)
            .ok_or(HandlerError::UnknownRoute(route))?;
        handler.handle(operation, bearer).await
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("routes", &self.routes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::RemoteRequest;
    use async_trait::async_trait;
    use pawsync_engine::{OpKind, OperationDraft};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<(RemoteRequest, Option<String>)>>,
    }

    #[async_trait]
    impl RemoteTransport for Recorder {
        async fn send(
            &self,
            request: RemoteRequest,
            bearer: Option<&str>,
        ) -> Result<Value, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((request, bearer.map(str::to_string)));
            Ok(json!({"ok": true}))
        }
    }

    struct Fixed(Value);

    #[async_trait]
    impl OperationHandler for Fixed {
        async fn handle(&self, _: &Operation, _: Option<&str>) -> Result<Value, HandlerError> {
            Ok(self.0.clone())
        }
    }

    fn op(kind: OpKind, entity: &str, payload: Value) -> Operation {
        let draft = OperationDraft::new(kind, entity, payload).unwrap();
        Operation::from_draft(draft, "op_1", 1000)
    }

    #[test]
    fn rest_registers_all_routes() {
        let registry = HandlerRegistry::rest(Arc::new(Recorder::default()));
        let routes = registry.routes();

        assert_eq!(routes.len(), 7);
        assert!(registry.contains(&RouteKey::create("like")));
        assert!(registry.contains(&RouteKey::update("user")));
        assert!(!registry.contains(&RouteKey::update("message")));
    }

    #[tokio::test]
    async fn dispatch_routes_by_kind_and_entity() {
        let recorder = Arc::new(Recorder::default());
        let registry = HandlerRegistry::rest(recorder.clone());

        let result = registry
            .dispatch(&op(OpKind::Create, "like", json!({"petId": "p1"})), Some("tok"))
            .await
            .unwrap();
        assert_eq!(result, json!({"ok": true}));

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests[0].0.method, Method::Post);
        assert_eq!(requests[0].0.path, "/likes");
        assert_eq!(requests[0].1.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn unknown_route_fails() {
        let registry = HandlerRegistry::new();
        let err = registry
            .dispatch(&op(OpKind::Create, "walrus", json!({})), None)
            .await
            .unwrap_err();

        assert_eq!(err, HandlerError::UnknownRoute(RouteKey::create("walrus")));
    }

    #[tokio::test]
    async fn later_registration_wins() {
        let registry = HandlerRegistry::new()
            .with(RouteKey::create("pet"), Fixed(json!(1)))
            .with(RouteKey::create("pet"), Fixed(json!(2)));

        let result = registry
            .dispatch(&op(OpKind::Create, "pet", json!({})), None)
            .await
            .unwrap();
        assert_eq!(result, json!(2));
        assert_eq!(registry.routes().len(), 1);
    }
}
