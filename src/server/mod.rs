//! Server framework: the task lifecycle engine and its HTTP surface.
//!
//! The pieces compose bottom-up: a [`TaskStore`] persists tasks, the
//! [`TaskManager`] drives a [`Provider`](crate::provider::Provider) and owns
//! the lifecycle, brokers fan events out to SSE subscribers, and the
//! [`Agent`] facade binds everything to the JSON-RPC method table and the
//! well-known HTTP paths. The catalog pieces host and query the agent
//! directory.

mod agent;
mod broker;
mod catalog;
mod dir_task_store;
mod push;
mod rpc;
mod task_manager;
mod task_store;

pub use agent::Agent;
pub use broker::{sse_response, BrokerClosed, EventBroker, TaskBrokers, HEARTBEAT_INTERVAL};
pub use catalog::{catalog_router, CatalogClient, CatalogRegistry};
pub use dir_task_store::DirTaskStore;
pub use push::{PushClaims, PushNotifier, NOTIFICATION_TOKEN_HEADER};
pub use rpc::{DispatchOutcome, Handler, HandlerFuture, MethodDispatcher};
pub use task_manager::{TaskManager, TaskService};
pub use task_store::{InMemoryTaskStore, TaskStore};
