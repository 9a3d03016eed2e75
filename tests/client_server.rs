//! Typed client against a live agent: discovery, send, stream, multi-turn.

mod common;

use std::sync::Arc;
use std::time::Duration;

use a2a_fabric::client::A2AClient;
use a2a_fabric::provider::{ProviderEvent, ScriptedProvider};
use a2a_fabric::server::InMemoryTaskStore;
use a2a_fabric::types::{TaskEvent, TaskSendParams, TaskState};
use common::{start_agent_with, start_echo_agent};

#[tokio::test]
async fn from_url_resolves_card_and_sends() {
    let (base_url, _handle) = start_echo_agent().await;

    let client = A2AClient::from_url(&base_url).await.unwrap();
    assert_eq!(client.card().unwrap().name, "test-agent");

    let task = client.send_text("t1", "hello").await.unwrap();
    assert_eq!(task.status.state, TaskState::Completed);
    assert_eq!(
        task.artifacts.as_ref().unwrap()[0].parts[0].as_text(),
        Some("hello")
    );
}

#[tokio::test]
async fn rpc_errors_surface_with_their_codes() {
    let (base_url, _handle) = start_echo_agent().await;
    let client = A2AClient::from_endpoint(&base_url);

    let err = client.get_task("ghost", None).await.unwrap_err();
    assert_eq!(err.code(), -32001);
}

#[tokio::test]
async fn streaming_client_observes_ordered_events() {
    let (base_url, _handle) = start_echo_agent().await;
    let client = A2AClient::from_endpoint(&base_url);

    let stream = client
        .send_subscribe(TaskSendParams::text("t1", "hi"))
        .await
        .unwrap();
    let events = stream.collect().await.unwrap();

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], TaskEvent::Status(e) if e.status.state == TaskState::Working));
    assert!(
        matches!(&events[1], TaskEvent::Artifact(e) if e.artifact.parts[0].as_text() == Some("streamed echo: hi"))
    );
    assert!(matches!(&events[2], TaskEvent::Status(e) if e.r#final));
}

#[tokio::test]
async fn resubscribe_replays_for_late_clients() {
    let (base_url, _handle) = start_echo_agent().await;
    let client = A2AClient::from_endpoint(&base_url);

    client.send_text("t1", "hi").await.unwrap();

    let events = client
        .resubscribe("t1", Some(1))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], TaskEvent::Artifact(_)));
    assert!(matches!(&events[1], TaskEvent::Status(e) if e.r#final));
}

/// input-required pauses the conversation; a second send on the same id
/// resumes it (multi-turn).
#[tokio::test]
async fn multi_turn_conversation_through_input_required() {
    let provider = ScriptedProvider::new(vec![
        vec![
            ProviderEvent::StatusUpdate {
                state: TaskState::InputRequired,
                message: Some("which city?".into()),
            },
            ProviderEvent::Done,
        ],
        vec![
            ProviderEvent::TextDelta("22C and sunny".into()),
            ProviderEvent::Done,
        ],
    ]);
    let (base_url, _handle) =
        start_agent_with(Arc::new(provider), Arc::new(InMemoryTaskStore::new())).await;
    let client = A2AClient::from_endpoint(&base_url);

    let paused = client.send_text("t1", "what's the weather?").await.unwrap();
    assert_eq!(paused.status.state, TaskState::InputRequired);
    assert_eq!(
        paused.status.message.as_ref().unwrap().text_content(),
        "which city?"
    );

    let done = client.send_text("t1", "Lisbon").await.unwrap();
    assert_eq!(done.status.state, TaskState::Completed);
    assert_eq!(
        done.artifacts.as_ref().unwrap()[0].parts[0].as_text(),
        Some("22C and sunny")
    );
}

#[tokio::test]
async fn cancel_through_client_is_idempotent_on_terminal() {
    let (base_url, _handle) = start_agent_with(
        Arc::new(a2a_fabric::provider::EchoProvider::with_delay(
            Duration::from_secs(10),
        )),
        Arc::new(InMemoryTaskStore::new()),
    )
    .await;
    let client = A2AClient::from_endpoint(&base_url);

    let _stream = client
        .send_subscribe(TaskSendParams::text("t1", "slow"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let canceled = client.cancel_task("t1").await.unwrap();
    assert_eq!(canceled.status.state, TaskState::Canceled);

    let err = client.cancel_task("t1").await.unwrap_err();
    assert_eq!(err.code(), -32002);
}
