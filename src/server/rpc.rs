//! JSON-RPC 2.0 dispatch — envelope validation, method routing, batches.
//!
//! The dispatcher maps method names to async handlers. A handler receives
//! the raw `params` value and returns an optional result; `Ok(None)`
//! serializes as `"result": null`. Requests without an `id` are
//! notifications: the handler runs but no response is produced.
//!
//! Streaming methods (`tasks/sendSubscribe`, `tasks/resubscribe`) are
//! answered with SSE by the HTTP layer before dispatch; the dispatcher only
//! knows them by name so it can reject them inside batches, where SSE cannot
//! be multiplexed.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{A2AError, A2AResult};
use crate::types::{JsonRpcRequest, JsonRpcResponse};

/// Boxed future returned by a handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = A2AResult<Option<Value>>> + Send>>;

/// An async JSON-RPC method handler.
pub type Handler = Arc<dyn Fn(Option<Value>) -> HandlerFuture + Send + Sync>;

/// What a raw request body dispatched to.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// One response to serialize.
    Single(JsonRpcResponse),
    /// Batch responses (notifications already excluded).
    Batch(Vec<JsonRpcResponse>),
    /// Nothing to send (notification or all-notification batch): HTTP 204.
    Empty,
}

/// Concurrency-safe method table.
pub struct MethodDispatcher {
    handlers: RwLock<HashMap<String, Handler>>,
    streaming: RwLock<HashSet<String>>,
}

impl MethodDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            streaming: RwLock::new(HashSet::new()),
        }
    }

    /// Register a handler for a method name.
    pub fn register<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = A2AResult<Option<Value>>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |params| Box::pin(handler(params)));
        self.handlers
            .write()
            .expect("dispatcher lock poisoned")
            .insert(method.into(), handler);
    }

    /// Declare a method that streams — known, but not batchable.
    pub fn mark_streaming(&self, method: impl Into<String>) {
        self.streaming
            .write()
            .expect("dispatcher lock poisoned")
            .insert(method.into());
    }

    /// `true` if the method has a registered unary handler.
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers
            .read()
            .expect("dispatcher lock poisoned")
            .contains_key(method)
    }

    /// Dispatch a parsed request. Returns `None` for notifications.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        let is_notification = request.is_notification();

        if request.jsonrpc != "2.0" {
            if is_notification {
                return None;
            }
            return Some(JsonRpcResponse::from_a2a_error(
                id,
                A2AError::invalid_request("jsonrpc version must be \"2.0\""),
            ));
        }

        if self
            .streaming
            .read()
            .expect("dispatcher lock poisoned")
            .contains(&request.method)
        {
            if is_notification {
                return None;
            }
            return Some(JsonRpcResponse::from_a2a_error(
                id,
                A2AError::unsupported_operation(format!(
                    "method {} streams and cannot be dispatched in a batch",
                    request.method
                )),
            ));
        }

        let handler = {
            let handlers = self.handlers.read().expect("dispatcher lock poisoned");
            handlers.get(&request.method).cloned()
        };

        let Some(handler) = handler else {
            warn!(method = %request.method, "unknown JSON-RPC method");
            if is_notification {
                return None;
            }
            return Some(JsonRpcResponse::from_a2a_error(
                id,
                A2AError::method_not_found(request.method.clone()),
            ));
        };

        debug!(method = %request.method, notification = is_notification, "dispatching");
        let result = handler(request.params).await;

        if is_notification {
            return None;
        }
        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value.unwrap_or(Value::Null)),
            Err(err) => JsonRpcResponse::from_a2a_error(id, err),
        })
    }

    /// Dispatch one element of a batch (or a single request) given as a raw
    /// JSON value.
    async fn dispatch_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Some(JsonRpcResponse::from_a2a_error(
                None,
                A2AError::invalid_request(format!("malformed request object: {e}")),
            )),
        }
    }

    /// Parse and dispatch a raw HTTP body: single request or batch.
    pub async fn dispatch_body(&self, body: &[u8]) -> DispatchOutcome {
        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                return DispatchOutcome::Single(JsonRpcResponse::from_a2a_error(
                    None,
                    A2AError::parse_error(format!("invalid JSON: {e}")),
                ));
            }
        };

        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return DispatchOutcome::Single(JsonRpcResponse::from_a2a_error(
                        None,
                        A2AError::invalid_request("batch must not be empty"),
                    ));
                }
                let mut responses = Vec::new();
                for item in items {
                    if let Some(response) = self.dispatch_value(item).await {
                        responses.push(response);
                    }
                }
                if responses.is_empty() {
                    DispatchOutcome::Empty
                } else {
                    DispatchOutcome::Batch(responses)
                }
            }
            other => match self.dispatch_value(other).await {
                Some(response) => DispatchOutcome::Single(response),
                None => DispatchOutcome::Empty,
            },
        }
    }
}

impl Default for MethodDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
