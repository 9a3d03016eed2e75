//! OpenAI-compatible chat/completions adapter.
//!
//! Speaks the `/chat/completions` SSE wire format shared by OpenAI and the
//! many gateways that clone it. History messages are mapped onto the chat
//! roles; tool-call and tool-result history markers become `tool_calls`
//! arrays and `tool` role messages. Tool-call argument fragments are
//! accumulated inside the stream so the engine only ever sees complete
//! [`ProviderEvent::ToolCall`]s.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::FabricConfig;
use crate::error::{A2AError, A2AResult};
use crate::types::{Message, Role};

use super::{Provider, ProviderEvent, ProviderParams, ProviderStream};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Provider adapter for OpenAI-compatible chat completion APIs.
pub struct OpenAiProvider {
    model: String,
    api_key: String,
    chat_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Construct an adapter for the given model and credentials.
    ///
    /// `base_url` ends before `/chat/completions`; `None` targets the
    /// OpenAI API.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: Option<&str>) -> Self {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Self {
            model: model.into(),
            api_key: api_key.into(),
            chat_url: format!("{base}/chat/completions"),
            client: reqwest::Client::new(),
        }
    }

    /// Construct from environment configuration (`OPENAI_API_KEY`).
    pub fn from_env(config: &FabricConfig) -> A2AResult<Self> {
        let key = config.openai_api_key.clone().ok_or_else(|| {
            A2AError::internal_error("OPENAI_API_KEY is not set")
        })?;
        Ok(Self::new(DEFAULT_MODEL, key, None))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, params: ProviderParams) -> A2AResult<ProviderStream> {
        let messages = build_chat_messages(&params.history);

        let tools: Vec<Value> = params
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();

        // The vendor connection always streams; `params.stream` only governs
        // how the caller frames the resulting events.
        let mut body = json!({
            "model": params.model.as_deref().unwrap_or(&self.model),
            "messages": messages,
            "stream": true,
            "max_tokens": params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });
        if let Some(ref stop) = params.stop {
            body["stop"] = json!(stop);
        }
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }

        debug!(
            model = %self.model,
            message_count = params.history.len(),
            tool_count = params.tools.len(),
            "sending chat completion request"
        );

        let resp = self
            .client
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| A2AError::Transport(format!("chat completion request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(A2AError::Http { status, body: text });
        }

        // SSE events may be split across TCP chunks: keep a line buffer, and
        // accumulate tool-call argument fragments until the stream ends.
        let byte_stream = resp.bytes_stream();
        let event_stream = byte_stream
            .scan(SseState::default(), |state, chunk| {
                let events = match chunk {
                    Ok(bytes) => {
                        state.buffer.push_str(&String::from_utf8_lossy(&bytes));
                        state.drain_lines()
                    }
                    Err(e) => vec![Err(A2AError::Transport(format!("stream read failed: {e}")))],
                };
                std::future::ready(Some(events))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(event_stream))
    }
}

/// Accumulated state for one SSE response body.
#[derive(Default)]
struct SseState {
    buffer: String,
    pending_calls: Vec<PendingToolCall>,
    done: bool,
}

struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl SseState {
    /// Consume complete lines from the buffer, emitting provider events.
    fn drain_lines(&mut self) -> Vec<A2AResult<ProviderEvent>> {
        let mut events = Vec::new();
        while let Some(nl_pos) = self.buffer.find('\n') {
            let line = self.buffer[..nl_pos].trim_end_matches('\r').to_string();
            self.buffer = self.buffer[nl_pos + 1..].to_string();
            self.consume_line(&line, &mut events);
        }
        events
    }

    fn consume_line(&mut self, line: &str, events: &mut Vec<A2AResult<ProviderEvent>>) {
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();
        if data.is_empty() || self.done {
            return;
        }

        if data == "[DONE]" {
            self.done = true;
            for call in self.pending_calls.drain(..) {
                events.push(Ok(ProviderEvent::ToolCall {
                    id: call.id,
                    name: call.name,
                    arguments: call.arguments,
                }));
            }
            events.push(Ok(ProviderEvent::Done));
            return;
        }

        let Ok(value) = serde_json::from_str::<Value>(data) else {
            return;
        };
        self.consume_chunk(&value, events);
    }

    fn consume_chunk(&mut self, value: &Value, events: &mut Vec<A2AResult<ProviderEvent>>) {
        let choice = &value["choices"][0];

        if let Some(err) = value.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("provider error")
                .to_string();
            events.push(Ok(ProviderEvent::Failed(message)));
            self.done = true;
            return;
        }

        let delta = &choice["delta"];

        if let Some(tool_calls) = delta.get("tool_calls").and_then(|tc| tc.as_array()) {
            for tc in tool_calls {
                let id = tc["id"].as_str().unwrap_or("");
                let name = tc["function"]["name"].as_str().unwrap_or("");
                let args = tc["function"]["arguments"].as_str().unwrap_or("");

                // A fragment with an id starts a new call; id-less fragments
                // extend the arguments of the call being assembled.
                if !id.is_empty() {
                    self.pending_calls.push(PendingToolCall {
                        id: id.to_string(),
                        name: name.to_string(),
                        arguments: args.to_string(),
                    });
                } else if let Some(last) = self.pending_calls.last_mut() {
                    if !name.is_empty() {
                        last.name.push_str(name);
                    }
                    last.arguments.push_str(args);
                }
            }
            return;
        }

        if let Some(text) = delta.get("content").and_then(|c| c.as_str()) {
            if !text.is_empty() {
                events.push(Ok(ProviderEvent::TextDelta(text.to_string())));
            }
        }
    }
}

/// Convert task history into the chat-completions message array.
///
/// Free function so the mapping is unit-testable without HTTP. Consecutive
/// tool-call messages from one assistant turn are coalesced into a single
/// assistant message carrying a `tool_calls` array, as the API requires.
pub(crate) fn build_chat_messages(history: &[Message]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    let mut open_calls: Vec<Value> = Vec::new();

    let flush_calls = |out: &mut Vec<Value>, calls: &mut Vec<Value>| {
        if !calls.is_empty() {
            out.push(json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": std::mem::take(calls),
            }));
        }
    };

    for message in history {
        match message.marker_kind() {
            Some(crate::types::MESSAGE_KIND_TOOL_CALL) => {
                if let Some(call) = tool_call_payload(message) {
                    open_calls.push(call);
                }
                continue;
            }
            Some(crate::types::MESSAGE_KIND_TOOL_RESULT) => {
                flush_calls(&mut out, &mut open_calls);
                if let Some(result) = tool_result_payload(message) {
                    out.push(result);
                }
                continue;
            }
            _ => {}
        }

        flush_calls(&mut out, &mut open_calls);

        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Agent | Role::Assistant => "assistant",
        };
        out.push(json!({ "role": role, "content": message.text_content() }));
    }

    flush_calls(&mut out, &mut open_calls);
    out
}

fn tool_call_payload(message: &Message) -> Option<Value> {
    let data = message.parts.iter().find_map(|p| match p {
        crate::types::Part::Data { data, .. } => Some(data),
        _ => None,
    })?;
    Some(json!({
        "id": data.get("id")?.as_str()?,
        "type": "function",
        "function": {
            "name": data.get("name")?.as_str()?,
            "arguments": data.get("arguments")?.as_str()?,
        }
    }))
}

fn tool_result_payload(message: &Message) -> Option<Value> {
    let data = message.parts.iter().find_map(|p| match p {
        crate::types::Part::Data { data, .. } => Some(data),
        _ => None,
    })?;
    let content = data
        .get("result")
        .map(|r| match r {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    Some(json!({
        "role": "tool",
        "tool_call_id": data.get("id")?.as_str()?,
        "content": content,
    }))
}
