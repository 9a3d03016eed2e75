//! HTTP-level JSON-RPC transport behavior: envelopes, batches, errors.

mod common;

use common::{jsonrpc_request, rpc_call, send_request, start_echo_agent};
use serde_json::json;

#[tokio::test]
async fn unknown_method_returns_method_not_found() {
    let (base_url, _handle) = start_echo_agent().await;
    let resp = rpc_call(&base_url, &jsonrpc_request(json!(1), "tasks/unknown", json!({}))).await;
    assert_eq!(resp["jsonrpc"], "2.0");
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["error"]["code"], -32601);
}

#[tokio::test]
async fn unparseable_body_returns_parse_error_with_http_200() {
    let (base_url, _handle) = start_echo_agent().await;
    let resp = reqwest::Client::new()
        .post(format!("{}/rpc", base_url))
        .header("Content-Type", "application/json")
        .body("{definitely not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], json!(null));
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_invalid_request() {
    let (base_url, _handle) = start_echo_agent().await;
    let body = json!({"jsonrpc": "1.0", "id": 1, "method": "tasks/get", "params": {"id": "x"}});
    let resp = rpc_call(&base_url, &body).await;
    assert_eq!(resp["error"]["code"], -32600);
}

#[tokio::test]
async fn invalid_params_shape_is_reported() {
    let (base_url, _handle) = start_echo_agent().await;
    let resp = rpc_call(&base_url, &jsonrpc_request(json!(1), "tasks/get", json!({"noId": 1}))).await;
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn non_post_is_method_not_allowed() {
    let (base_url, _handle) = start_echo_agent().await;
    let resp = reqwest::Client::new()
        .get(format!("{}/rpc", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
}

#[tokio::test]
async fn batch_mixes_results_and_errors_and_drops_notifications() {
    let (base_url, _handle) = start_echo_agent().await;

    let batch = json!([
        send_request(1, "b1", "hello"),
        {"jsonrpc": "2.0", "method": "tasks/get", "params": {"id": "b1"}},
        {"jsonrpc": "2.0", "id": 2, "method": "no/such/method"}
    ]);

    let resp: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/rpc", base_url))
        .json(&batch)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let responses = resp.as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["status"]["state"], "completed");
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["error"]["code"], -32601);
}

#[tokio::test]
async fn all_notification_batch_returns_204() {
    let (base_url, _handle) = start_echo_agent().await;
    let batch = json!([
        {"jsonrpc": "2.0", "method": "tasks/get", "params": {"id": "missing"}}
    ]);
    let resp = reqwest::Client::new()
        .post(format!("{}/rpc", base_url))
        .json(&batch)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
}

#[tokio::test]
async fn empty_batch_is_invalid_request() {
    let (base_url, _handle) = start_echo_agent().await;
    let resp: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/rpc", base_url))
        .json(&json!([]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp["error"]["code"], -32600);
}

#[tokio::test]
async fn streaming_method_in_batch_is_unsupported() {
    let (base_url, _handle) = start_echo_agent().await;
    let batch = json!([
        {"jsonrpc": "2.0", "id": 1, "method": "tasks/sendSubscribe", "params": {
            "id": "t1", "message": {"role": "user", "parts": [{"type": "text", "text": "x"}]}
        }}
    ]);
    let resp: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/rpc", base_url))
        .json(&batch)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp[0]["error"]["code"], -32005);
}

#[tokio::test]
async fn liveness_and_agent_card_are_served() {
    let (base_url, _handle) = start_echo_agent().await;
    let client = reqwest::Client::new();

    let ok = client.get(&base_url).send().await.unwrap();
    assert_eq!(ok.text().await.unwrap(), "OK");

    let card: serde_json::Value = client
        .get(format!("{}/.well-known/agent.json", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(card["name"], "test-agent");
    assert_eq!(card["capabilities"]["streaming"], true);
}
