//! SSE decoding for task event streams.
//!
//! [`SseStream`] pulls an HTTP response body through an incremental
//! `text/event-stream` decoder. The decoder assembles whole SSE frames
//! (blank-line delimited, multi-line `data:` fields joined), so heartbeat
//! comments and bare `event:`/`id:` fields never surface as events. Frames
//! wrapped in a JSON-RPC response envelope are unwrapped through
//! [`JsonRpcResponse`] before decoding into [`TaskEvent`]s.

use std::collections::VecDeque;

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::{A2AError, A2AResult};
use crate::types::{JsonRpcResponse, TaskEvent};

/// A stream of typed task events read lazily from an SSE response.
pub struct SseStream {
    chunks: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    decoder: SseDecoder,
    pending: VecDeque<RawFrame>,
    finished: bool,
}

impl std::fmt::Debug for SseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseStream").finish_non_exhaustive()
    }
}

impl SseStream {
    /// Wrap an open SSE response.
    pub(crate) fn new(response: reqwest::Response) -> Self {
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Self {
            chunks,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Next event, or `None` once the server closes the stream.
    pub async fn next(&mut self) -> Option<A2AResult<TaskEvent>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(decode_frame(frame));
            }
            if self.finished {
                return None;
            }
            match self.chunks.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.feed(&chunk)),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(A2AError::Transport(format!(
                        "event stream read failed: {e}"
                    ))));
                }
                None => {
                    self.finished = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    /// Drain the stream, returning all events up to close or first error.
    pub async fn collect(mut self) -> A2AResult<Vec<TaskEvent>> {
        let mut events = Vec::new();
        while let Some(item) = self.next().await {
            events.push(item?);
        }
        Ok(events)
    }
}

/// One assembled SSE frame.
#[derive(Debug, PartialEq)]
struct RawFrame {
    /// `event:` field, when the producer tagged the frame.
    event: Option<String>,
    /// All `data:` lines of the frame, joined with newlines.
    data: String,
}

/// Incremental `text/event-stream` decoder.
///
/// Bytes go in via [`feed`](Self::feed); complete frames come out once
/// their terminating blank line has arrived. Field state for the frame
/// being assembled is kept across calls, so frames may be split at any
/// byte boundary.
#[derive(Default)]
struct SseDecoder {
    text: String,
    event: Option<String>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    /// Consume a chunk of the response body, yielding finished frames.
    fn feed(&mut self, chunk: &[u8]) -> Vec<RawFrame> {
        self.text.push_str(&String::from_utf8_lossy(chunk));

        let mut frames = Vec::new();
        while let Some(pos) = self.text.find('\n') {
            let line: String = self.text.drain(..=pos).collect();
            match line.trim_end_matches(['\r', '\n']) {
                "" => frames.extend(self.end_frame()),
                field => self.accept_field(field),
            }
        }
        frames
    }

    /// Flush a trailing frame that was never terminated by a blank line.
    fn finish(&mut self) -> Option<RawFrame> {
        let tail = std::mem::take(&mut self.text);
        match tail.trim_end_matches('\r') {
            "" => {}
            field => self.accept_field(field),
        }
        self.end_frame()
    }

    fn accept_field(&mut self, line: &str) {
        // Lines starting with ':' are comments (heartbeats).
        if line.starts_with(':') {
            return;
        }
        let (name, value) = line
            .split_once(':')
            .map(|(n, v)| (n, v.strip_prefix(' ').unwrap_or(v)))
            .unwrap_or((line, ""));
        match name {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            // id: and retry: are irrelevant to event decoding.
            _ => {}
        }
    }

    fn end_frame(&mut self) -> Option<RawFrame> {
        let event = self.event.take();
        if self.data_lines.is_empty() {
            return None;
        }
        Some(RawFrame {
            event,
            data: self.data_lines.drain(..).collect::<Vec<_>>().join("\n"),
        })
    }
}

/// Decode one frame's data into a task event.
fn decode_frame(frame: RawFrame) -> A2AResult<TaskEvent> {
    let payload: serde_json::Value = serde_json::from_str(&frame.data)
        .map_err(|e| A2AError::InvalidJson(format!("bad SSE frame data: {e}")))?;
    let payload = unwrap_envelope(payload)?;
    serde_json::from_value(payload)
        .map_err(|e| A2AError::InvalidJson(format!("bad task event: {e}")))
}

/// Strip a JSON-RPC response envelope when the server framed events that
/// way; error envelopes become [`A2AError::JsonRpc`].
fn unwrap_envelope(payload: serde_json::Value) -> A2AResult<serde_json::Value> {
    if payload.get("jsonrpc").is_none() {
        return Ok(payload);
    }
    let response: JsonRpcResponse = serde_json::from_value(payload)
        .map_err(|e| A2AError::InvalidJson(format!("bad JSON-RPC frame: {e}")))?;
    if let Some(error) = response.error {
        return Err(A2AError::JsonRpc {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }
    response
        .result
        .ok_or_else(|| A2AError::InvalidJson("JSON-RPC frame has neither result nor error".into()))
}
