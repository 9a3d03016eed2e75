//! Task store — durable persistence of tasks keyed by id within an agent.
//!
//! The store is a logical mapping from task id to the serialized task. The
//! owning agent is the single writer by convention; readers elsewhere only
//! observe. [`InMemoryTaskStore`] backs tests and short-lived agents, the
//! directory store (`dir_task_store`) persists across restarts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::error::{A2AError, A2AResult};
use crate::types::{Task, TaskState, TaskStatus};

/// Persistence contract for tasks.
///
/// Required semantics: durable read-after-write within the owning agent;
/// `update` is an atomic replace with last-writer-wins inside that agent.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Store a new task. Fails if the id is already present.
    async fn create(&self, task: Task) -> A2AResult<()>;

    /// Load a task, windowing history to the most recent `history_length`
    /// messages when `Some(n)` with `n > 0`. The stored record is never
    /// mutated by windowing.
    async fn get(&self, task_id: &str, history_length: Option<u32>) -> A2AResult<Option<Task>>;

    /// Replace the stored task.
    async fn update(&self, task: Task) -> A2AResult<()>;

    /// Transition a task to `canceled` unless it is already terminal.
    ///
    /// Returns the stored task after the attempt (unchanged when terminal),
    /// or `None` when the id is unknown.
    async fn cancel(&self, task_id: &str) -> A2AResult<Option<Task>> {
        let Some(mut task) = self.get(task_id, None).await? else {
            return Ok(None);
        };
        if !task.is_terminal() {
            task.status = TaskStatus::now(TaskState::Canceled);
            self.update(task.clone()).await?;
        }
        Ok(Some(task))
    }

    /// Push task snapshots on every state change to the given channel.
    ///
    /// Optional; the default reports the operation as unsupported.
    async fn subscribe(&self, task_id: &str, _sender: mpsc::Sender<Task>) -> A2AResult<()> {
        Err(A2AError::unsupported_operation(format!(
            "task store does not support subscriptions (task {task_id})"
        )))
    }
}

/// In-memory task store backed by a `HashMap`.
///
/// Data is lost when the process exits. Thread-safe via `tokio::sync::RwLock`.
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
    watchers: RwLock<HashMap<String, Vec<mpsc::Sender<Task>>>>,
}

impl InMemoryTaskStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            watchers: RwLock::new(HashMap::new()),
        }
    }

    async fn notify_watchers(&self, task: &Task) {
        let mut watchers = self.watchers.write().await;
        if let Some(senders) = watchers.get_mut(&task.id) {
            senders.retain(|tx| match tx.try_send(task.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(task_id = %task.id, "dropping snapshot for slow watcher");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> A2AResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(A2AError::invalid_params(format!(
                "task {} already exists",
                task.id
            )));
        }
        debug!(task_id = %task.id, "task created");
        tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn get(&self, task_id: &str, history_length: Option<u32>) -> A2AResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        let task = tasks.get(task_id).map(|t| t.windowed(history_length));
        debug!(task_id = %task_id, found = task.is_some(), "task lookup");
        Ok(task)
    }

    async fn update(&self, task: Task) -> A2AResult<()> {
        {
            let mut tasks = self.tasks.write().await;
            tasks.insert(task.id.clone(), task.clone());
        }
        self.notify_watchers(&task).await;
        Ok(())
    }

    async fn subscribe(&self, task_id: &str, sender: mpsc::Sender<Task>) -> A2AResult<()> {
        let mut watchers = self.watchers.write().await;
        watchers
            .entry(task_id.to_string())
            .or_default()
            .push(sender);
        Ok(())
    }
}
