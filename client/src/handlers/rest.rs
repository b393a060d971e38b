//! REST handler - maps an operation onto a single HTTP call.

use std::sync::Arc;

use async_trait::async_trait;
use pawsync_engine::Operation;
use serde_json::Value;

use super::OperationHandler;
use crate::error::HandlerError;
use crate::transport::{Method, RemoteRequest, RemoteTransport};

const ID_PLACEHOLDER: &str = "{id}";

/// Sends the operation payload to a fixed endpoint.
///
/// A `{id}` placeholder in the path is filled from the payload's `id`
/// field, which may be a string or a number. The id is percent-encoded as a
/// single path segment, and `.` or `..` are rejected. `GET` and `DELETE`
/// calls carry no body; every other verb sends the payload as JSON.
#[derive(Clone)]
pub struct RestHandler {
    transport: Arc<dyn RemoteTransport>,
    method: Method,
    path: String,
}

impl RestHandler {
    pub fn new(transport: Arc<dyn RemoteTransport>, method: Method, path: impl Into<String>) -> Self {
        Self {
            transport,
            method,
            path: path.into(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Build the request for `operation` without sending it.
    pub fn request_for(&self, operation: &Operation) -> Result<RemoteRequest, HandlerError> {
        let path = if self.path.contains(ID_PLACEHOLDER) {
            let id = payload_id(&operation.payload).ok_or_else(|| {
                HandlerError::InvalidPayload(format!(
                    "{} {} requires a string or numeric `id`",
                    self.method, self.path
                ))
            })?;
            let segment = encode_segment(&id).ok_or_else(|| {
                HandlerError::InvalidPayload(format!("`id` {:?} is not a valid path segment", id))
            })?;
            self.path.replace(ID_PLACEHOLDER, &segment)
        } else {
            self.path.clone()
        };

        let body = match self.method {
            Method::Get | Method::Delete => None,
            _ => Some(operation.payload.clone()),
        };

        Ok(RemoteRequest {
            method: self.method,
            path,
            body,
        })
    }
}

#[async_trait]
impl OperationHandler for RestHandler {
    async fn handle(
        &self,
        operation: &Operation,
        bearer: Option<&str>,
    ) -> Result<Value, HandlerError> {
        let request = self.request_for(operation)?;
        tracing::debug!(
            op_id = %operation.id,
            method = %request.method,
            path = %request.path,
            "Sending operation"
        );

        Ok(self.transport.send(request, bearer).await?)
    }
}

impl std::fmt::Debug for RestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestHandler")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish()
    }
}

fn payload_id(payload: &Value) -> Option<String> {
    match payload.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Percent-encode `raw` so it stays one path segment.
fn encode_segment(raw: &str) -> Option<String> {
    if matches!(raw, "." | "..") {
        return None;
    }
    let mut url = reqwest::Url::parse("http://localhost/").ok()?;
    url.path_segments_mut().ok()?.clear().push(raw);
    Some(url.path().trim_start_matches('/').to_string())
}
