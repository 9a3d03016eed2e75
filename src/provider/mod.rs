//! Provider contract — the abstraction over LLM vendors.
//!
//! A [`Provider`] turns a task's message history plus a tool descriptor set
//! into a lazy stream of typed [`ProviderEvent`]s. The task lifecycle engine
//! consumes that stream, dispatches tool calls, and resumes the provider by
//! invoking [`Provider::generate`] again with the tool results appended to
//! history. Dropping the stream releases the vendor connection, which is how
//! cancellation propagates.

mod echo;
mod openai;

pub use echo::{EchoProvider, ScriptedProvider};
pub use openai::OpenAiProvider;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::A2AResult;
use crate::tools::ToolSchema;
use crate::types::{Message, TaskState};

/// A lazy sequence of generation events.
pub type ProviderStream = Pin<Box<dyn Stream<Item = A2AResult<ProviderEvent>> + Send>>;

/// Inputs to a single generation turn.
#[derive(Debug, Clone)]
pub struct ProviderParams {
    /// Read-only view of the task's history, oldest first.
    pub history: Vec<Message>,

    /// Tools the provider may call, derived from the agent's skills.
    pub tools: Vec<ToolSchema>,

    /// Model override; providers fall back to their configured default.
    pub model: Option<String>,

    /// Maximum output tokens.
    pub max_tokens: Option<u32>,

    /// Stop sequences.
    pub stop: Option<Vec<String>>,

    /// Whether the caller wants incremental deltas.
    pub stream: bool,
}

impl ProviderParams {
    /// Params over a history with no tools and default knobs.
    pub fn new(history: Vec<Message>, stream: bool) -> Self {
        ProviderParams {
            history,
            tools: Vec::new(),
            model: None,
            max_tokens: None,
            stop: None,
            stream,
        }
    }
}

/// A single event yielded by a provider's generation stream.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// Incremental text output belonging to the current artifact.
    TextDelta(String),

    /// A complete artifact chunk emitted by the provider itself.
    ArtifactPart {
        /// Content for the chunk.
        part: crate::types::Part,
        /// `true` when the chunk extends the currently open artifact.
        append: bool,
        /// `true` when the artifact is sealed by this chunk.
        last_chunk: bool,
    },

    /// The provider requests a tool invocation.
    ToolCall {
        /// Provider-assigned call id, forwarded verbatim.
        id: String,
        /// Tool name.
        name: String,
        /// JSON-encoded argument object (accumulated across deltas).
        arguments: String,
    },

    /// The provider reports a mid-flight state change (e.g. input-required).
    StatusUpdate {
        /// New state.
        state: TaskState,
        /// Optional human-readable note.
        message: Option<String>,
    },

    /// The stream finished normally.
    Done,

    /// The stream finished with a provider-side failure.
    Failed(String),
}

/// Abstract LLM driver.
///
/// Implementations must terminate the stream promptly when it is dropped and
/// must not leak vendor-specific types to callers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name for logging and status display.
    fn name(&self) -> &str;

    /// Start one generation turn over the given history.
    async fn generate(&self, params: ProviderParams) -> A2AResult<ProviderStream>;
}
