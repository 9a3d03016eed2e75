//! Deterministic providers for tests and demos.
//!
//! [`EchoProvider`] answers every turn by echoing the latest user text;
//! [`ScriptedProvider`] replays a fixed sequence of per-turn event scripts,
//! which is how tool-call round-trips are exercised without a live vendor.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::A2AResult;
use crate::types::Role;

use super::{Provider, ProviderEvent, ProviderParams, ProviderStream};

/// Echoes the latest user message back as generation output.
///
/// Streaming turns prefix the echo with `streamed echo: ` so tests can tell
/// the two paths apart. An optional artificial delay before the first event
/// gives cancellation tests a window to land in.
pub struct EchoProvider {
    delay: Option<Duration>,
}

impl EchoProvider {
    /// Echo immediately.
    pub fn new() -> Self {
        Self { delay: None }
    }

    /// Echo after pausing, to simulate a long-running generation.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, params: ProviderParams) -> A2AResult<ProviderStream> {
        let text = params
            .history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text_content())
            .unwrap_or_default();

        let output = if params.stream {
            format!("streamed echo: {}", text)
        } else {
            text
        };

        let delay = self.delay;
        let stream = async_stream::stream! {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            yield Ok(ProviderEvent::TextDelta(output));
            yield Ok(ProviderEvent::Done);
        };

        Ok(Box::pin(stream))
    }
}

/// Replays scripted event sequences, one script per `generate` call.
///
/// When the script queue runs dry the provider yields a bare `Done`, so a
/// trailing tool-result turn still terminates.
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Vec<ProviderEvent>>>,
}

impl ScriptedProvider {
    /// Build a provider that plays `turns` in order.
    pub fn new(turns: Vec<Vec<ProviderEvent>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _params: ProviderParams) -> A2AResult<ProviderStream> {
        let events = self
            .turns
            .lock()
            .expect("script queue poisoned")
            .pop_front()
            .unwrap_or_else(|| vec![ProviderEvent::Done]);

        let stream = async_stream::stream! {
            for event in events {
                yield Ok(event);
            }
        };

        Ok(Box::pin(stream))
    }
}
