//! Client for calling remote agents over JSON-RPC with SSE streaming.
//!
//! - [`A2AClient`] — typed methods for all seven task operations
//! - [`CardResolver`] — agent card discovery from `/.well-known/agent.json`
//! - [`JsonRpcTransport`] — HTTP binding with a credential-injection hook
//! - [`SseStream`] — typed task event stream

mod a2a_client;
mod card_resolver;
mod sse;
mod transport;

pub use a2a_client::A2AClient;
pub use card_resolver::CardResolver;
pub use sse::SseStream;
pub use transport::{JsonRpcTransport, RequestHook, Transport};
