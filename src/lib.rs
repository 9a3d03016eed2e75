//! # a2a-fabric — an agent-to-agent task runtime
//!
//! A distributed fabric of cooperating agents, each exposed as a network
//! service speaking a uniform JSON-RPC protocol for task submission,
//! streaming progress, cancellation, and push notification. Agents discover
//! each other through a central catalog; a long-running task accumulates a
//! durable message history and artifact stream that any authorized client
//! may subscribe to, re-subscribe to, or replay.
//!
//! ## What's inside
//!
//! - **Wire types** ([`types`]) — tasks, messages, parts, artifacts, agent
//!   cards, push configs, and the JSON-RPC envelope
//! - **Task lifecycle engine** ([`server::TaskManager`]) — resolves tasks,
//!   drives a [`provider::Provider`], round-trips tool calls, persists every
//!   transition, and publishes events
//! - **Event brokers** ([`server::EventBroker`]) — per-task and
//!   process-wide SSE fan-out with a drop-not-block slow-subscriber policy
//! - **Task stores** ([`server::TaskStore`]) — in-memory and directory
//!   backed persistence
//! - **Agent facade** ([`server::Agent`]) — the JSON-RPC method table and
//!   well-known HTTP paths as an axum router
//! - **Catalog** ([`server::CatalogRegistry`]) — agent directory with an
//!   HTTP server and a retrying client
//! - **Push dispatcher** ([`server::PushNotifier`]) — RS256-signed
//!   out-of-band delivery of final task state
//! - **Client** ([`client::A2AClient`]) — typed access to all seven task
//!   methods of a remote agent
//!
//! ## Feature flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `client` | yes     | HTTP client for calling agents (reqwest + SSE) |
//! | `server` | yes     | Engine, brokers, catalog, push, axum routes |
//!
//! ## Quick start: an echo agent
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use a2a_fabric::provider::EchoProvider;
//! use a2a_fabric::server::{Agent, InMemoryTaskStore, TaskManager};
//! use a2a_fabric::tools::ToolRegistry;
//! use a2a_fabric::AgentCardBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let card = AgentCardBuilder::new("echo-agent")
//!         .description("Echoes every message back")
//!         .version("1.0.0")
//!         .url("http://localhost:7420")
//!         .streaming(true)
//!         .build()?;
//!
//!     let manager = TaskManager::new(
//!         "echo-agent",
//!         Arc::new(InMemoryTaskStore::new()),
//!         Arc::new(EchoProvider::new()),
//!         Arc::new(ToolRegistry::new()),
//!     );
//!
//!     let agent = Agent::new(card, manager);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:7420").await?;
//!     axum::serve(listener, agent.router()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Quick start: calling an agent
//!
//! ```rust,ignore
//! use a2a_fabric::client::A2AClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = A2AClient::from_url("http://localhost:7420").await?;
//!     let task = client.send_text("t1", "hello there").await?;
//!     println!("final state: {}", task.status.state);
//!
//!     let mut stream = client.send_subscribe(
//!         a2a_fabric::types::TaskSendParams::text("t2", "stream this"),
//!     ).await?;
//!     while let Some(event) = stream.next().await {
//!         println!("event: {:?}", event?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod builders;
pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "server")]
pub mod provider;
#[cfg(feature = "server")]
pub mod tools;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod server;

/// Re-exports of the most frequently used types.
pub mod prelude {
    pub use crate::types::{
        AgentCapabilities, AgentCard, AgentSkill, Artifact, FileContent, Message, Part,
        PushNotificationConfig, Task, TaskArtifactUpdateEvent, TaskEvent, TaskIdParams,
        TaskPushNotificationConfig, TaskQueryParams, TaskSendParams, TaskState, TaskStatus,
        TaskStatusUpdateEvent,
    };

    pub use crate::error::{A2AError, A2AResult};

    pub use crate::builders::AgentCardBuilder;

    pub use crate::config::FabricConfig;

    #[cfg(feature = "client")]
    pub use crate::client::A2AClient;

    #[cfg(feature = "server")]
    pub use crate::provider::{Provider, ProviderEvent, ProviderParams};

    #[cfg(feature = "server")]
    pub use crate::server::{
        Agent, CatalogClient, CatalogRegistry, EventBroker, InMemoryTaskStore, PushNotifier,
        TaskManager, TaskService, TaskStore,
    };

    #[cfg(feature = "server")]
    pub use crate::tools::{Tool, ToolCall, ToolOutput, ToolRegistry};
}

pub use builders::AgentCardBuilder;
pub use error::{A2AError, A2AResult};
pub use types::*;
