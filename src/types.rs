//! A2A wire types — the JSON shapes exchanged between agents.
//!
//! Everything here is pure data: tasks, messages, parts, artifacts, agent
//! cards, push-notification configs, and the JSON-RPC 2.0 envelope. The only
//! behavior is validation ([`Part::validate`], [`FileContent::validate`]).
//!
//! Serialization uses a stable camelCase wire form; optional fields are
//! omitted when absent, so `marshal → unmarshal` is the identity over the
//! documented shape.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Enums
// ============================================================================

/// The lifecycle state of a task.
///
/// Only `submitted`, `working`, and `input-required` are non-terminal.
/// `completed`, `canceled`, and `failed` are absorbing: once reached, no
/// further state mutation is observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task has been received but not yet started.
    Submitted,
    /// Task is actively being processed.
    Working,
    /// Task is paused waiting for another user turn.
    InputRequired,
    /// Task completed successfully (terminal).
    Completed,
    /// Task was canceled (terminal).
    Canceled,
    /// Task failed (terminal).
    Failed,
    /// State could not be determined.
    Unknown,
}

impl TaskState {
    /// Returns `true` for the absorbing states: completed, canceled, failed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::Completed => "completed",
            TaskState::Canceled => "canceled",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user / calling client.
    User,
    /// Message from the agent.
    Agent,
    /// System prompt seeded into a task's history.
    System,
    /// Raw model output carried in history (tool-call round-trips).
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Agent => write!(f, "agent"),
            Role::System => write!(f, "system"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

// ============================================================================
// Parts
// ============================================================================

/// File content carried by a file part.
///
/// Exactly one of `bytes` (base-64) or `uri` must be populated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    /// Base64-encoded inline file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,

    /// URI pointing at the file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Optional file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// MIME type of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileContent {
    /// Check the bytes/uri exclusivity invariant.
    pub fn validate(&self) -> Result<(), crate::error::A2AError> {
        match (&self.bytes, &self.uri) {
            (Some(_), Some(_)) => Err(crate::error::A2AError::invalid_params(
                "file part must not set both 'bytes' and 'uri'",
            )),
            (None, None) => Err(crate::error::A2AError::invalid_params(
                "file part must set exactly one of 'bytes' or 'uri'",
            )),
            _ => Ok(()),
        }
    }
}

/// A single piece of content inside a message or artifact.
///
/// Discriminated by the `type` field. Exactly one payload field is
/// populated, matching the discriminator; anything else fails
/// [`Part::validate`].
///
/// JSON wire format:
/// - Text: `{"type": "text", "text": "hello"}`
/// - File: `{"type": "file", "file": {"bytes": "SGk=", "mimeType": "text/plain"}}`
/// - Data: `{"type": "data", "data": {"key": "value"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Part {
    /// A text content part. Discriminator: `"text"`.
    #[serde(rename = "text")]
    Text {
        /// The text content. Must be non-empty.
        text: String,
        /// Optional metadata associated with this part.
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
    /// A file content part. Discriminator: `"file"`.
    #[serde(rename = "file")]
    File {
        /// The file payload (inline bytes or a URI, never both).
        file: FileContent,
        /// Optional metadata associated with this part.
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
    /// A structured data content part. Discriminator: `"data"`.
    #[serde(rename = "data")]
    Data {
        /// Key/value payload. Must be non-empty.
        data: serde_json::Map<String, serde_json::Value>,
        /// Optional metadata associated with this part.
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// Create a file part from base64-encoded bytes.
    pub fn file_from_bytes(
        bytes: impl Into<String>,
        name: Option<String>,
        mime_type: Option<String>,
    ) -> Self {
        Part::File {
            file: FileContent {
                bytes: Some(bytes.into()),
                uri: None,
                name,
                mime_type,
            },
            metadata: None,
        }
    }

    /// Create a file part referencing a URI.
    pub fn file_from_uri(
        uri: impl Into<String>,
        name: Option<String>,
        mime_type: Option<String>,
    ) -> Self {
        Part::File {
            file: FileContent {
                bytes: None,
                uri: Some(uri.into()),
                name,
                mime_type,
            },
            metadata: None,
        }
    }

    /// Create a structured data part.
    pub fn data(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Part::Data {
            data,
            metadata: None,
        }
    }

    /// Validate the payload invariant for this part.
    ///
    /// Text must be non-empty, a file must carry exactly one of bytes/uri,
    /// and a data object must be non-empty.
    pub fn validate(&self) -> Result<(), crate::error::A2AError> {
        match self {
            Part::Text { text, .. } => {
                if text.is_empty() {
                    Err(crate::error::A2AError::invalid_params(
                        "text part must have non-empty 'text'",
                    ))
                } else {
                    Ok(())
                }
            }
            Part::File { file, .. } => file.validate(),
            Part::Data { data, .. } => {
                if data.is_empty() {
                    Err(crate::error::A2AError::invalid_params(
                        "data part must have a non-empty 'data' object",
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// The text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }
}

// ============================================================================
// Message
// ============================================================================

/// Metadata marker value identifying a tool-call message in history.
pub const MESSAGE_KIND_TOOL_CALL: &str = "tool-call";

/// Metadata marker value identifying a tool-result message in history.
pub const MESSAGE_KIND_TOOL_RESULT: &str = "tool-result";

/// A single message in a task's ordered history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Who sent this message.
    pub role: Role,

    /// Content parts of the message.
    pub parts: Vec<Part>,

    /// Arbitrary metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    /// Create a user message with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Create an agent message with a single text part.
    pub fn agent_text(text: impl Into<String>) -> Self {
        Message {
            role: Role::Agent,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Create a system message with a single text part.
    pub fn system_text(text: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Record a provider tool call in history.
    ///
    /// The call is carried as a data part `{id, name, arguments}` and marked
    /// with `metadata.kind = "tool-call"` so providers can map it back onto
    /// their native wire format.
    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("id".into(), serde_json::Value::String(id.to_string()));
        data.insert("name".into(), serde_json::Value::String(name.to_string()));
        data.insert(
            "arguments".into(),
            serde_json::Value::String(arguments.to_string()),
        );
        Message {
            role: Role::Assistant,
            parts: vec![Part::data(data)],
            metadata: Some(serde_json::json!({ "kind": MESSAGE_KIND_TOOL_CALL })),
        }
    }

    /// Record a tool result in history, paired with the call it answers.
    pub fn tool_result(id: &str, name: &str, result: serde_json::Value) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("id".into(), serde_json::Value::String(id.to_string()));
        data.insert("name".into(), serde_json::Value::String(name.to_string()));
        data.insert("result".into(), result);
        Message {
            role: Role::Agent,
            parts: vec![Part::data(data)],
            metadata: Some(serde_json::json!({ "kind": MESSAGE_KIND_TOOL_RESULT })),
        }
    }

    /// The marker kind (`tool-call` / `tool-result`) if this message carries one.
    pub fn marker_kind(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("kind"))
            .and_then(|k| k.as_str())
    }

    /// Concatenated text content of all text parts.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Artifact
// ============================================================================

/// An append-only, indexed output stream produced by a task.
///
/// `index` is monotonic per task with no gaps; `lastChunk = true` seals the
/// artifact at that index. An update with the same index and `append = true`
/// extends the existing artifact's parts instead of replacing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Description of the artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Content parts of the artifact.
    pub parts: Vec<Part>,

    /// Position of this artifact in the task's artifact stream.
    pub index: u32,

    /// When `true`, parts extend the artifact already stored at `index`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,

    /// When `true`, no further parts will arrive for this index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_chunk: Option<bool>,

    /// Arbitrary metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Artifact {
    /// Create an artifact at `index` holding the given parts.
    pub fn new(index: u32, parts: Vec<Part>) -> Self {
        Artifact {
            name: None,
            description: None,
            parts,
            index,
            append: None,
            last_chunk: None,
            metadata: None,
        }
    }
}

// ============================================================================
// Task
// ============================================================================

/// Current status of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// The current state.
    pub state: TaskState,

    /// Optional message associated with this status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// RFC-3339 timestamp of when this status was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TaskStatus {
    /// Status in the given state, stamped with the current UTC time.
    pub fn now(state: TaskState) -> Self {
        TaskStatus {
            state,
            message: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Status in the given state with no message or timestamp.
    pub fn new(state: TaskState) -> Self {
        TaskStatus {
            state,
            message: None,
            timestamp: None,
        }
    }
}

/// The top-level task aggregate: status + history + artifacts.
///
/// `id` is unique within the owning agent's namespace; `history` and
/// `artifacts` are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: String,

    /// Optional grouping id shared by related tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Current task status.
    pub status: TaskStatus,

    /// Artifacts produced by the task, ordered by `index`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,

    /// Ordered message history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Message>>,

    /// Arbitrary metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Task {
    /// Returns `true` if the task is in an absorbing state.
    pub fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// A copy of this task with history trimmed to the most recent
    /// `history_length` messages.
    ///
    /// `None` or `0` returns the full history unchanged.
    pub fn windowed(&self, history_length: Option<u32>) -> Task {
        let mut task = self.clone();
        if let Some(n) = history_length {
            if n > 0 {
                if let Some(ref mut history) = task.history {
                    let n = n as usize;
                    if history.len() > n {
                        let start = history.len() - n;
                        *history = history.split_off(start);
                    }
                }
            }
        }
        task
    }

    /// Append a message to the task's history.
    pub fn push_history(&mut self, message: Message) {
        self.history.get_or_insert_with(Vec::new).push(message);
    }
}

// ============================================================================
// Streaming events
// ============================================================================

/// Notification that a task's status changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    /// ID of the task whose status changed.
    pub id: String,

    /// The new status.
    pub status: TaskStatus,

    /// Whether this is the last event the task will emit.
    #[serde(rename = "final")]
    pub r#final: bool,

    /// Arbitrary metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Notification that an artifact was created or extended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    /// ID of the task that produced the artifact.
    pub id: String,

    /// The artifact chunk (see [`Artifact::append`] / `last_chunk`).
    pub artifact: Artifact,

    /// Arbitrary metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// An event broadcast on a task's stream.
///
/// Serializes flat (the inner event's own shape); deserialization
/// discriminates on the `status` / `artifact` key. [`TaskEvent::kind`] names
/// the SSE `event:` type so generic SSE clients can route.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A status transition.
    Status(TaskStatusUpdateEvent),
    /// An artifact chunk.
    Artifact(TaskArtifactUpdateEvent),
}

impl TaskEvent {
    /// SSE event name for this event.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskEvent::Status(_) => "status",
            TaskEvent::Artifact(_) => "artifact",
        }
    }

    /// The task id this event belongs to.
    pub fn task_id(&self) -> &str {
        match self {
            TaskEvent::Status(e) => &e.id,
            TaskEvent::Artifact(e) => &e.id,
        }
    }

    /// Whether this event closes the stream.
    pub fn is_final(&self) -> bool {
        matches!(self, TaskEvent::Status(e) if e.r#final)
    }
}

impl Serialize for TaskEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TaskEvent::Status(inner) => inner.serialize(serializer),
            TaskEvent::Artifact(inner) => inner.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TaskEvent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("status").is_some() {
            let event: TaskStatusUpdateEvent =
                serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            Ok(TaskEvent::Status(event))
        } else if value.get("artifact").is_some() {
            let event: TaskArtifactUpdateEvent =
                serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            Ok(TaskEvent::Artifact(event))
        } else {
            Err(serde::de::Error::custom(
                "task event must carry either 'status' or 'artifact'",
            ))
        }
    }
}

// ============================================================================
// Request parameters
// ============================================================================

/// Parameters for `tasks/send` and `tasks/sendSubscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSendParams {
    /// Task identifier. A known id continues that task's conversation.
    pub id: String,

    /// Optional session grouping id; generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// The user message to process.
    pub message: Message,

    /// Push notification config to associate with the task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_notification: Option<PushNotificationConfig>,

    /// Trim the returned task's history to the most recent N messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<u32>,

    /// Arbitrary metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TaskSendParams {
    /// Minimal params: task id plus a user text message.
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        TaskSendParams {
            id: id.into(),
            session_id: None,
            message: Message::user_text(text),
            push_notification: None,
            history_length: None,
            metadata: None,
        }
    }
}

/// Parameters for `tasks/get` and `tasks/resubscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    /// The task ID.
    pub id: String,

    /// Trim history to the most recent N messages; `0`/absent keeps all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<u32>,

    /// Arbitrary metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Bare task-id parameters (`tasks/cancel`, `tasks/pushNotification/get`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdParams {
    /// The task ID.
    pub id: String,

    /// Arbitrary metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

// ============================================================================
// Push notifications
// ============================================================================

/// Authentication details for a push notification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationAuthenticationInfo {
    /// Supported authentication schemes (e.g. `["Bearer"]`).
    pub schemes: Vec<String>,

    /// Optional credentials required by the endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

/// Where and how to deliver out-of-band task notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationConfig {
    /// URL to deliver notifications to.
    pub url: String,

    /// Opaque verification token echoed back on delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Authentication configuration for the push endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<PushNotificationAuthenticationInfo>,
}

/// Push notification config bound to a specific task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPushNotificationConfig {
    /// The task this config applies to.
    pub id: String,

    /// The delivery configuration.
    pub push_notification_config: PushNotificationConfig,
}

// ============================================================================
// Agent card
// ============================================================================

/// Feature switches advertised by an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Whether the agent supports `tasks/sendSubscribe` streaming.
    #[serde(default)]
    pub streaming: bool,

    /// Whether the agent supports push notifications.
    #[serde(default)]
    pub push_notifications: bool,

    /// Whether the agent retains per-task state transition history.
    #[serde(default)]
    pub state_transition_history: bool,
}

/// Authentication requirements advertised on an agent card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAuthentication {
    /// Accepted authentication schemes.
    pub schemes: Vec<String>,

    /// Optional static credentials hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

/// The organization behind an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProvider {
    /// Organization name.
    pub organization: String,

    /// Organization URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A capability descriptor. The skill `id` maps to a tool inside the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    /// Unique skill identifier.
    pub id: String,

    /// Human-readable skill name.
    pub name: String,

    /// Description of what the skill does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Categorization tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Example prompts/inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,

    /// MIME types this skill accepts as input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_modes: Option<Vec<String>>,

    /// MIME types this skill produces as output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_modes: Option<Vec<String>>,
}

/// Public identity of an agent. Immutable after registration; identity is
/// the `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Unique name within a catalog.
    pub name: String,

    /// Description of the agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Base URL where the agent is served.
    pub url: String,

    /// Service provider information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,

    /// Agent version string.
    pub version: String,

    /// URL to the agent's documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,

    /// Feature switches.
    pub capabilities: AgentCapabilities,

    /// Authentication requirements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AgentAuthentication>,

    /// Default MIME types accepted as input.
    #[serde(default)]
    pub default_input_modes: Vec<String>,

    /// Default MIME types produced as output.
    #[serde(default)]
    pub default_output_modes: Vec<String>,

    /// Skills the agent supports.
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

// ============================================================================
// JSON-RPC foundation
// ============================================================================

/// A JSON-RPC 2.0 request/response ID: string, number, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    /// String identifier.
    String(String),
    /// Numeric identifier.
    Number(i64),
    /// Explicit null.
    Null,
}

impl fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonRpcId::String(s) => write!(f, "{}", s),
            JsonRpcId::Number(n) => write!(f, "{}", n),
            JsonRpcId::Null => write!(f, "null"),
        }
    }
}

impl From<String> for JsonRpcId {
    fn from(s: String) -> Self {
        JsonRpcId::String(s)
    }
}

impl From<&str> for JsonRpcId {
    fn from(s: &str) -> Self {
        JsonRpcId::String(s.to_string())
    }
}

impl From<i64> for JsonRpcId {
    fn from(n: i64) -> Self {
        JsonRpcId::Number(n)
    }
}

/// A JSON-RPC 2.0 request. Absence of `id` marks a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version — always `"2.0"`.
    pub jsonrpc: String,

    /// Request identifier. Absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonRpcId>,

    /// Method name.
    pub method: String,

    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request.
    pub fn new(
        id: impl Into<JsonRpcId>,
        method: impl Into<String>,
        params: Option<serde_json::Value>,
    ) -> Self {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Create a notification (no id, no response expected).
    pub fn notification(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    /// `true` when no response should be produced.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,

    /// Human-readable error message.
    pub message: String,

    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A JSON-RPC 2.0 response. Exactly one of `result` / `error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version — always `"2.0"`.
    pub jsonrpc: String,

    /// Request identifier this response answers.
    pub id: Option<JsonRpcId>,

    /// Successful result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Error result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a successful response.
    pub fn success(id: Option<JsonRpcId>, result: serde_json::Value) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<JsonRpcId>, error: JsonRpcError) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Create an error response from an [`A2AError`](crate::error::A2AError).
    pub fn from_a2a_error(id: Option<JsonRpcId>, err: crate::error::A2AError) -> Self {
        Self::error(id, err.into())
    }
}
