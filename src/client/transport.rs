//! Client transport — JSON-RPC over HTTP with pluggable credential injection.
//!
//! [`Transport`] abstracts the protocol binding; [`JsonRpcTransport`] is the
//! standard reqwest-based implementation. A [`RequestHook`] runs on every
//! outgoing request just before it is sent, which is where bearer tokens or
//! API keys for peer agents and push endpoints get attached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{A2AError, A2AResult};
use crate::types::{JsonRpcRequest, JsonRpcResponse};

use super::sse::SseStream;

/// Mutates an outgoing request before it is sent (credential injection).
pub type RequestHook =
    Arc<dyn Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder + Send + Sync>;

/// Transport abstraction for JSON-RPC communication with an agent.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and receive a single JSON-RPC response.
    async fn send(&self, request: &JsonRpcRequest) -> A2AResult<JsonRpcResponse>;

    /// Send a request whose response is an SSE event stream
    /// (`tasks/sendSubscribe`, `tasks/resubscribe`).
    async fn send_stream(&self, request: &JsonRpcRequest) -> A2AResult<SseStream>;
}

/// JSON-RPC over HTTP POST using `reqwest`.
#[derive(Clone)]
pub struct JsonRpcTransport {
    client: reqwest::Client,
    url: String,
    hook: Option<RequestHook>,
}

impl JsonRpcTransport {
    /// Create a transport targeting the given `/rpc` endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(150))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.into(),
            hook: None,
        }
    }

    /// Create a transport sharing an existing `reqwest::Client`.
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            url: url.into(),
            hook: None,
        }
    }

    /// Install a pre-request hook (e.g. to attach an Authorization header).
    pub fn with_hook(mut self, hook: RequestHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Convenience hook: send `Authorization: Bearer <token>` on every call.
    pub fn with_bearer_token(self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.with_hook(Arc::new(move |req| req.bearer_auth(token.clone())))
    }

    /// The URL this transport posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the request envelope and return the response once the status
    /// checks out. Non-2xx statuses become [`A2AError::Http`] with the body
    /// attached for diagnosis.
    async fn post(&self, request: &JsonRpcRequest, accept: &str) -> A2AResult<reqwest::Response> {
        let mut builder = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, accept)
            .json(request);
        if let Some(ref hook) = self.hook {
            builder = hook(builder);
        }

        let response = builder.send().await.map_err(delivery_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(A2AError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

/// Classify a reqwest send failure.
fn delivery_error(err: reqwest::Error) -> A2AError {
    if err.is_timeout() {
        A2AError::Timeout(err.to_string())
    } else {
        A2AError::Transport(err.to_string())
    }
}

#[async_trait]
impl Transport for JsonRpcTransport {
    async fn send(&self, request: &JsonRpcRequest) -> A2AResult<JsonRpcResponse> {
        self.post(request, "application/json")
            .await?
            .json()
            .await
            .map_err(|e| A2AError::InvalidJson(format!("bad JSON-RPC response: {e}")))
    }

    async fn send_stream(&self, request: &JsonRpcRequest) -> A2AResult<SseStream> {
        let response = self.post(request, "text/event-stream").await?;
        Ok(SseStream::new(response))
    }
}
