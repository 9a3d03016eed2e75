//! Agent facade — binds a card, a task service, the brokers, and the
//! JSON-RPC transport into one HTTP surface.
//!
//! Well-known paths on every agent:
//! - `POST /rpc` — JSON-RPC endpoint (batch-capable; streaming methods
//!   answer with SSE)
//! - `GET /.well-known/agent.json` — the agent card
//! - `GET /.well-known/jwks.json` — push signing keys
//! - `GET /events` — process-wide event stream
//! - `GET /events/{task_id}` — per-task event stream
//! - `GET /` — liveness

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::error::{A2AError, A2AResult};
use crate::types::{
    AgentCard, JsonRpcRequest, JsonRpcResponse, TaskIdParams, TaskPushNotificationConfig,
    TaskQueryParams, TaskSendParams,
};

use super::broker::{sse_response, EventBroker, TaskBrokers, HEARTBEAT_INTERVAL};
use super::catalog::CatalogClient;
use super::push::PushNotifier;
use super::rpc::{DispatchOutcome, MethodDispatcher};
use super::task_manager::{TaskManager, TaskService};

struct AgentState {
    card: AgentCard,
    service: Arc<dyn TaskService>,
    dispatcher: MethodDispatcher,
    brokers: Arc<TaskBrokers>,
    root_broker: Arc<EventBroker>,
    push: Option<Arc<PushNotifier>>,
    heartbeat: Duration,
}

/// A network-addressable agent: one card, one task service, one router.
pub struct Agent {
    state: Arc<AgentState>,
}

impl Agent {
    /// Assemble an agent from its card and task manager.
    pub fn new(card: AgentCard, manager: TaskManager) -> Self {
        let brokers = manager.brokers();
        let root_broker = manager.root_broker();
        let push = manager.push_notifier();
        let service: Arc<dyn TaskService> = Arc::new(manager);

        let dispatcher = MethodDispatcher::new();
        register_methods(&dispatcher, Arc::clone(&service));

        Self {
            state: Arc::new(AgentState {
                card,
                service,
                dispatcher,
                brokers,
                root_broker,
                push,
                heartbeat: HEARTBEAT_INTERVAL,
            }),
        }
    }

    /// Shorten the SSE heartbeat interval (tests).
    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        let state = Arc::get_mut(&mut self.state)
            .expect("with_heartbeat must be called before the router is built");
        state.heartbeat = heartbeat;
        self
    }

    /// The agent's published card.
    pub fn card(&self) -> &AgentCard {
        &self.state.card
    }

    /// Build the axum router serving all well-known agent paths.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_liveness))
            .route("/rpc", post(handle_rpc))
            .route("/.well-known/agent.json", get(handle_agent_card))
            .route("/.well-known/jwks.json", get(handle_jwks))
            .route("/events", get(handle_events_root))
            .route("/events/{task_id}", get(handle_events_task))
            .layer(CorsLayer::permissive())
            .with_state(Arc::clone(&self.state))
    }

    /// Self-register with the catalog, retrying with bounded backoff.
    pub async fn register_with_catalog(&self, catalog_url: &str) -> A2AResult<()> {
        info!(agent = %self.state.card.name, catalog = %catalog_url, "registering with catalog");
        CatalogClient::new(catalog_url)
            .register(&self.state.card)
            .await
    }

    /// Like [`register_with_catalog`](Self::register_with_catalog) but with
    /// an injectable retry policy.
    pub async fn register_with_catalog_retry(
        &self,
        catalog_url: &str,
        attempts: u32,
        base_delay: Duration,
    ) -> A2AResult<()> {
        CatalogClient::new(catalog_url)
            .with_retry(attempts, base_delay)
            .register(&self.state.card)
            .await
    }

    /// Self-register using `CATALOG_URL` when it is set.
    ///
    /// Returns `false` (without error) when no catalog is configured.
    pub async fn register_from_env(&self) -> A2AResult<bool> {
        match crate::config::FabricConfig::from_env().catalog_url {
            Some(url) => {
                self.register_with_catalog(&url).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Wire the seven task methods onto the dispatcher.
fn register_methods(dispatcher: &MethodDispatcher, service: Arc<dyn TaskService>) {
    {
        let service = Arc::clone(&service);
        dispatcher.register("tasks/send", move |params| {
            let service = Arc::clone(&service);
            async move {
                let params: TaskSendParams = parse_params(params)?;
                let task = service.send_task(params).await?;
                Ok(Some(serde_json::to_value(task)?))
            }
        });
    }
    {
        let service = Arc::clone(&service);
        dispatcher.register("tasks/get", move |params| {
            let service = Arc::clone(&service);
            async move {
                let params: TaskQueryParams = parse_params(params)?;
                let task = service.get_task(params).await?;
                Ok(Some(serde_json::to_value(task)?))
            }
        });
    }
    {
        let service = Arc::clone(&service);
        dispatcher.register("tasks/cancel", move |params| {
            let service = Arc::clone(&service);
            async move {
                let params: TaskIdParams = parse_params(params)?;
                let task = service.cancel_task(params).await?;
                Ok(Some(serde_json::to_value(task)?))
            }
        });
    }
    {
        let service = Arc::clone(&service);
        dispatcher.register("tasks/pushNotification/set", move |params| {
            let service = Arc::clone(&service);
            async move {
                let config: TaskPushNotificationConfig = parse_params(params)?;
                let stored = service.set_push_notification(config).await?;
                Ok(Some(serde_json::to_value(stored)?))
            }
        });
    }
    {
        let service = Arc::clone(&service);
        dispatcher.register("tasks/pushNotification/get", move |params| {
            let service = Arc::clone(&service);
            async move {
                let params: TaskIdParams = parse_params(params)?;
                let config = service.get_push_notification(params).await?;
                Ok(Some(serde_json::to_value(config)?))
            }
        });
    }

    dispatcher.mark_streaming("tasks/sendSubscribe");
    dispatcher.mark_streaming("tasks/resubscribe");
}

/// Deserialize method params, mapping failures to invalid-params.
fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> A2AResult<T> {
    let value = params.ok_or_else(|| A2AError::invalid_params("params are required"))?;
    serde_json::from_value(value).map_err(|e| A2AError::invalid_params(e.to_string()))
}

async fn handle_liveness() -> &'static str {
    "OK"
}

async fn handle_agent_card(State(state): State<Arc<AgentState>>) -> Response {
    Json(&state.card).into_response()
}

async fn handle_jwks(State(state): State<Arc<AgentState>>) -> Response {
    match state.push {
        Some(ref push) => Json(push.jwks()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            "push notifications are not enabled on this agent",
        )
            .into_response(),
    }
}

/// JSON-RPC entry point.
///
/// Streaming methods are peeled off before generic dispatch because their
/// response is an SSE stream, not a JSON body. Parse failures still answer
/// HTTP 200 with a `-32700` envelope.
async fn handle_rpc(State(state): State<Arc<AgentState>>, body: Bytes) -> Response {
    if let Ok(Value::Object(ref obj)) = serde_json::from_slice::<Value>(&body) {
        match obj.get("method").and_then(|m| m.as_str()) {
            Some("tasks/sendSubscribe") => return handle_send_subscribe(state, &body).await,
            Some("tasks/resubscribe") => return handle_resubscribe(state, &body).await,
            _ => {}
        }
    }

    match state.dispatcher.dispatch_body(&body).await {
        DispatchOutcome::Single(response) => Json(response).into_response(),
        DispatchOutcome::Batch(responses) => Json(responses).into_response(),
        DispatchOutcome::Empty => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn handle_send_subscribe(state: Arc<AgentState>, body: &[u8]) -> Response {
    let (id, params) = match parse_streaming_request::<TaskSendParams>(body) {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    debug!(task_id = %params.id, "tasks/sendSubscribe");
    match state.service.send_subscribe(params).await {
        Ok((_task, rx)) => sse_response(rx, state.heartbeat).into_response(),
        Err(e) => Json(JsonRpcResponse::from_a2a_error(id, e)).into_response(),
    }
}

async fn handle_resubscribe(state: Arc<AgentState>, body: &[u8]) -> Response {
    let (id, params) = match parse_streaming_request::<TaskQueryParams>(body) {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    debug!(task_id = %params.id, "tasks/resubscribe");
    match state.service.resubscribe(params).await {
        Ok(rx) => sse_response(rx, state.heartbeat).into_response(),
        Err(e) => Json(JsonRpcResponse::from_a2a_error(id, e)).into_response(),
    }
}

/// Parse the envelope and params of a streaming request.
#[allow(clippy::type_complexity)]
fn parse_streaming_request<T: DeserializeOwned>(
    body: &[u8],
) -> Result<(Option<crate::types::JsonRpcId>, T), Response> {
    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            return Err(Json(JsonRpcResponse::from_a2a_error(
                None,
                A2AError::invalid_request(format!("malformed request object: {e}")),
            ))
            .into_response());
        }
    };
    let id = request.id.clone();
    match parse_params::<T>(request.params) {
        Ok(params) => Ok((id, params)),
        Err(e) => Err(Json(JsonRpcResponse::from_a2a_error(id, e)).into_response()),
    }
}

async fn handle_events_root(State(state): State<Arc<AgentState>>) -> Response {
    match state.root_broker.subscribe().await {
        Ok(rx) => sse_response(rx, state.heartbeat).into_response(),
        Err(_) => (StatusCode::GONE, "event stream closed").into_response(),
    }
}

async fn handle_events_task(
    State(state): State<Arc<AgentState>>,
    Path(task_id): Path<String>,
) -> Response {
    let broker = state.brokers.get_or_create(&task_id).await;
    match broker.subscribe().await {
        Ok(rx) => sse_response(rx, state.heartbeat).into_response(),
        Err(_) => (StatusCode::GONE, "task event stream closed").into_response(),
    }
}
