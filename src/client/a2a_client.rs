//! High-level typed client over the seven task RPC methods.

use uuid::Uuid;

use crate::error::{A2AError, A2AResult};
use crate::types::{
    AgentCard, JsonRpcRequest, JsonRpcResponse, Task, TaskIdParams, TaskPushNotificationConfig,
    TaskQueryParams, TaskSendParams,
};

use super::card_resolver::CardResolver;
use super::sse::SseStream;
use super::transport::{JsonRpcTransport, Transport};

/// Client for one remote agent.
///
/// Constructed either against a known `/rpc` endpoint or by resolving the
/// agent's card from its base URL.
pub struct A2AClient {
    transport: Box<dyn Transport>,
    card: Option<AgentCard>,
}

impl A2AClient {
    /// Client over an explicit transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            card: None,
        }
    }

    /// Client for the agent's `/rpc` endpoint at `base_url`.
    pub fn from_endpoint(base_url: &str) -> Self {
        let url = format!("{}/rpc", base_url.trim_end_matches('/'));
        Self::new(JsonRpcTransport::new(url))
    }

    /// Discover the agent card at `base_url`, then target its `/rpc`.
    pub async fn from_url(base_url: &str) -> A2AResult<Self> {
        let card = CardResolver::new().resolve(base_url).await?;
        let url = format!("{}/rpc", card.url.trim_end_matches('/'));
        Ok(Self {
            transport: Box::new(JsonRpcTransport::new(url)),
            card: Some(card),
        })
    }

    /// The resolved agent card, when this client was built via discovery.
    pub fn card(&self) -> Option<&AgentCard> {
        self.card.as_ref()
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> A2AResult<T> {
        let request = JsonRpcRequest::new(Uuid::new_v4().to_string(), method, Some(params));
        let response = self.transport.send(&request).await?;
        decode_result(response)
    }

    /// `tasks/send` — run a task to quiescence.
    pub async fn send_task(&self, params: TaskSendParams) -> A2AResult<Task> {
        self.call("tasks/send", serde_json::to_value(params)?).await
    }

    /// Convenience: send a text message as a fresh task.
    pub async fn send_text(&self, task_id: &str, text: &str) -> A2AResult<Task> {
        self.send_task(TaskSendParams::text(task_id, text)).await
    }

    /// `tasks/sendSubscribe` — start a task and stream its events.
    pub async fn send_subscribe(&self, params: TaskSendParams) -> A2AResult<SseStream> {
        let request = JsonRpcRequest::new(
            Uuid::new_v4().to_string(),
            "tasks/sendSubscribe",
            Some(serde_json::to_value(params)?),
        );
        self.transport.send_stream(&request).await
    }

    /// `tasks/get` — fetch a task with optional history windowing.
    pub async fn get_task(&self, id: &str, history_length: Option<u32>) -> A2AResult<Task> {
        let params = TaskQueryParams {
            id: id.to_string(),
            history_length,
            metadata: None,
        };
        self.call("tasks/get", serde_json::to_value(params)?).await
    }

    /// `tasks/cancel` — cancel a running task.
    pub async fn cancel_task(&self, id: &str) -> A2AResult<Task> {
        let params = TaskIdParams {
            id: id.to_string(),
            metadata: None,
        };
        self.call("tasks/cancel", serde_json::to_value(params)?)
            .await
    }

    /// `tasks/resubscribe` — re-attach to a task's event stream.
    pub async fn resubscribe(&self, id: &str, history_length: Option<u32>) -> A2AResult<SseStream> {
        let params = TaskQueryParams {
            id: id.to_string(),
            history_length,
            metadata: None,
        };
        let request = JsonRpcRequest::new(
            Uuid::new_v4().to_string(),
            "tasks/resubscribe",
            Some(serde_json::to_value(params)?),
        );
        self.transport.send_stream(&request).await
    }

    /// `tasks/pushNotification/set` — associate a push config.
    pub async fn set_push_notification(
        &self,
        config: TaskPushNotificationConfig,
    ) -> A2AResult<TaskPushNotificationConfig> {
        self.call("tasks/pushNotification/set", serde_json::to_value(config)?)
            .await
    }

    /// `tasks/pushNotification/get` — read back a push config.
    pub async fn get_push_notification(
        &self,
        id: &str,
    ) -> A2AResult<TaskPushNotificationConfig> {
        let params = TaskIdParams {
            id: id.to_string(),
            metadata: None,
        };
        self.call("tasks/pushNotification/get", serde_json::to_value(params)?)
            .await
    }
}

/// Unwrap a JSON-RPC response into its typed result.
fn decode_result<T: serde::de::DeserializeOwned>(response: JsonRpcResponse) -> A2AResult<T> {
    if let Some(error) = response.error {
        return Err(A2AError::JsonRpc {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }
    let result = response
        .result
        .ok_or_else(|| A2AError::InvalidJson("response has neither result nor error".into()))?;
    serde_json::from_value(result)
        .map_err(|e| A2AError::InvalidJson(format!("unexpected result shape: {e}")))
}
