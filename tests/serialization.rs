//! Wire-shape tests: golden JSON forms and marshal/unmarshal round-trips.

use a2a_fabric::types::*;
use serde_json::json;

fn sample_task() -> Task {
    Task {
        id: "t1".to_string(),
        session_id: Some("s1".to_string()),
        status: TaskStatus {
            state: TaskState::Working,
            message: None,
            timestamp: Some("2026-01-01T00:00:00+00:00".to_string()),
        },
        artifacts: Some(vec![Artifact {
            name: Some("output".to_string()),
            description: None,
            parts: vec![Part::text("hello")],
            index: 0,
            append: None,
            last_chunk: Some(true),
            metadata: None,
        }]),
        history: Some(vec![Message::user_text("hi")]),
        metadata: None,
    }
}

#[test]
fn text_part_wire_shape() {
    let part = Part::text("hello");
    let json = serde_json::to_value(&part).unwrap();
    assert_eq!(json, json!({"type": "text", "text": "hello"}));
}

#[test]
fn file_part_wire_shape() {
    let part = Part::file_from_bytes("SGk=", Some("hi.txt".into()), Some("text/plain".into()));
    let json = serde_json::to_value(&part).unwrap();
    assert_eq!(
        json,
        json!({
            "type": "file",
            "file": {"bytes": "SGk=", "name": "hi.txt", "mimeType": "text/plain"}
        })
    );
}

#[test]
fn data_part_wire_shape() {
    let mut data = serde_json::Map::new();
    data.insert("key".to_string(), json!("value"));
    let part = Part::data(data);
    let json = serde_json::to_value(&part).unwrap();
    assert_eq!(json, json!({"type": "data", "data": {"key": "value"}}));
}

#[test]
fn task_states_use_kebab_case() {
    assert_eq!(serde_json::to_value(TaskState::InputRequired).unwrap(), json!("input-required"));
    assert_eq!(serde_json::to_value(TaskState::Submitted).unwrap(), json!("submitted"));
    assert_eq!(serde_json::to_value(TaskState::Unknown).unwrap(), json!("unknown"));
}

#[test]
fn roles_use_lowercase() {
    for (role, name) in [
        (Role::User, "user"),
        (Role::Agent, "agent"),
        (Role::System, "system"),
        (Role::Assistant, "assistant"),
    ] {
        assert_eq!(serde_json::to_value(role).unwrap(), json!(name));
    }
}

#[test]
fn task_round_trips() {
    let task = sample_task();
    let json = serde_json::to_string(&task).unwrap();
    let back: Task = serde_json::from_str(&json).unwrap();
    assert_eq!(back, task);
}

#[test]
fn optional_fields_are_omitted() {
    let mut task = sample_task();
    task.session_id = None;
    task.artifacts = None;
    task.history = None;
    let value = serde_json::to_value(&task).unwrap();
    let obj = value.as_object().unwrap();
    assert!(!obj.contains_key("sessionId"));
    assert!(!obj.contains_key("artifacts"));
    assert!(!obj.contains_key("history"));
    assert!(!obj.contains_key("metadata"));
}

#[test]
fn status_event_round_trips_with_final_field() {
    let event = TaskStatusUpdateEvent {
        id: "t1".to_string(),
        status: TaskStatus::new(TaskState::Completed),
        r#final: true,
        metadata: None,
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["final"], json!(true));
    let back: TaskStatusUpdateEvent = serde_json::from_value(value).unwrap();
    assert_eq!(back, event);
}

#[test]
fn artifact_event_round_trips() {
    let event = TaskArtifactUpdateEvent {
        id: "t1".to_string(),
        artifact: Artifact {
            name: None,
            description: None,
            parts: vec![Part::text("chunk")],
            index: 2,
            append: Some(true),
            last_chunk: None,
            metadata: None,
        },
        metadata: None,
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(!json.contains("\"lastChunk\""));
    assert!(json.contains("\"append\":true"));
    let back: TaskArtifactUpdateEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn task_event_discriminates_by_payload_shape() {
    let status: TaskEvent = serde_json::from_value(json!({
        "id": "t1",
        "status": {"state": "working"},
        "final": false
    }))
    .unwrap();
    assert_eq!(status.kind(), "status");

    let artifact: TaskEvent = serde_json::from_value(json!({
        "id": "t1",
        "artifact": {"parts": [{"type": "text", "text": "x"}], "index": 0}
    }))
    .unwrap();
    assert_eq!(artifact.kind(), "artifact");

    assert!(serde_json::from_value::<TaskEvent>(json!({"id": "t1"})).is_err());
}

#[test]
fn agent_card_round_trips() {
    let card = a2a_fabric::AgentCardBuilder::new("echo-agent")
        .description("echoes")
        .version("1.0.0")
        .url("http://localhost:7420")
        .streaming(true)
        .push_notifications(true)
        .authentication(vec!["Bearer".to_string()], None)
        .skill("echo", "Echo", Some("echo skill"))
        .build()
        .unwrap();

    let value = serde_json::to_value(&card).unwrap();
    assert_eq!(value["capabilities"]["pushNotifications"], json!(true));
    assert_eq!(value["defaultInputModes"], json!(["text"]));
    assert_eq!(value["skills"][0]["id"], json!("echo"));

    let back: AgentCard = serde_json::from_value(value).unwrap();
    assert_eq!(back, card);
}

#[test]
fn push_config_round_trips() {
    let config = TaskPushNotificationConfig {
        id: "t1".to_string(),
        push_notification_config: PushNotificationConfig {
            url: "http://localhost:9000/hook".to_string(),
            token: Some("opaque".to_string()),
            authentication: Some(PushNotificationAuthenticationInfo {
                schemes: vec!["Bearer".to_string()],
                credentials: None,
            }),
        },
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("pushNotificationConfig"));
    let back: TaskPushNotificationConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn json_rpc_id_accepts_string_number_null() {
    let s: JsonRpcId = serde_json::from_value(json!("abc")).unwrap();
    assert_eq!(s, JsonRpcId::String("abc".to_string()));
    let n: JsonRpcId = serde_json::from_value(json!(7)).unwrap();
    assert_eq!(n, JsonRpcId::Number(7));
    let null: JsonRpcId = serde_json::from_value(json!(null)).unwrap();
    assert_eq!(null, JsonRpcId::Null);
}

#[test]
fn send_params_accept_wire_form() {
    let params: TaskSendParams = serde_json::from_value(json!({
        "id": "t1",
        "sessionId": "s9",
        "message": {"role": "user", "parts": [{"type": "text", "text": "hi"}]},
        "historyLength": 2
    }))
    .unwrap();
    assert_eq!(params.session_id.as_deref(), Some("s9"));
    assert_eq!(params.history_length, Some(2));
}
