//! Shared test utilities for integration tests.

use std::sync::Arc;
use std::time::Duration;

use a2a_fabric::provider::{EchoProvider, Provider};
use a2a_fabric::server::{Agent, InMemoryTaskStore, TaskManager, TaskStore};
use a2a_fabric::tools::ToolRegistry;
use a2a_fabric::AgentCardBuilder;

/// Build a default agent card for testing.
pub fn test_agent_card(name: &str, url: &str) -> a2a_fabric::types::AgentCard {
    AgentCardBuilder::new(name)
        .description("A test agent")
        .version("0.1.0")
        .url(url)
        .streaming(true)
        .skill("echo", "Echo", Some("Echoes back messages"))
        .build()
        .unwrap()
}

/// Start an echo agent on a random port. Returns the base URL and a handle.
pub async fn start_echo_agent() -> (String, tokio::task::JoinHandle<()>) {
    start_agent_with(Arc::new(EchoProvider::new()), Arc::new(InMemoryTaskStore::new())).await
}

/// Start an agent with a specific provider and store.
pub async fn start_agent_with(
    provider: Arc<dyn Provider>,
    store: Arc<dyn TaskStore>,
) -> (String, tokio::task::JoinHandle<()>) {
    let manager = TaskManager::new("test-agent", store, provider, Arc::new(ToolRegistry::new()));
    start_agent(manager).await
}

/// Start a fully custom agent.
pub async fn start_agent(manager: TaskManager) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    let card = test_agent_card("test-agent", &base_url);
    let agent = Agent::new(card, manager).with_heartbeat(Duration::from_millis(200));
    let app = agent.router();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Brief wait for the server to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (base_url, handle)
}

/// Build a JSON-RPC request body.
pub fn jsonrpc_request(
    id: serde_json::Value,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

/// Build a tasks/send request body with a single text part.
pub fn send_request(id: i64, task_id: &str, text: &str) -> serde_json::Value {
    jsonrpc_request(
        serde_json::json!(id),
        "tasks/send",
        serde_json::json!({
            "id": task_id,
            "message": {
                "role": "user",
                "parts": [{"type": "text", "text": text}]
            }
        }),
    )
}

/// POST a JSON-RPC body to an agent and parse the response.
pub async fn rpc_call(base_url: &str, body: &serde_json::Value) -> serde_json::Value {
    reqwest::Client::new()
        .post(format!("{}/rpc", base_url))
        .json(body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

/// One parsed SSE frame: the `event:` name (if any) and the decoded data.
#[derive(Debug)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: serde_json::Value,
}

/// Read a raw SSE response to completion, collecting data frames.
///
/// Comment lines (heartbeats) are skipped.
pub async fn read_sse(response: reqwest::Response) -> Vec<SseFrame> {
    use futures::StreamExt;

    let mut frames = Vec::new();
    let mut buffer = String::new();
    let mut current_event: Option<String> = None;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        buffer.push_str(std::str::from_utf8(&chunk).unwrap());

        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].trim_end_matches('\r').to_string();
            buffer = buffer[pos + 1..].to_string();

            if line.starts_with(':') {
                continue;
            }
            if let Some(name) = line.strip_prefix("event:") {
                current_event = Some(name.trim().to_string());
            } else if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    frames.push(SseFrame {
                        event: current_event.take(),
                        data: serde_json::from_str(data).unwrap(),
                    });
                }
            }
        }
    }

    frames
}
