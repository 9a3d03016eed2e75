//! Directory-backed task store.
//!
//! Each task is a pretty-printed JSON file at
//! `<root>/tasks/<agent-name>/<task-id>.json`, so external tooling can watch
//! the tree and readers never depend on field order or whitespace. Reads
//! parse fresh from disk, giving durable read-after-write within the agent.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{A2AError, A2AResult};
use crate::types::Task;

use super::task_store::TaskStore;

/// Task store that persists each task as an individual JSON file.
#[derive(Debug, Clone)]
pub struct DirTaskStore {
    tasks_dir: PathBuf,
}

impl DirTaskStore {
    /// Open (and create if needed) the store for one agent under `root`.
    pub async fn new(root: impl Into<PathBuf>, agent_name: &str) -> A2AResult<Self> {
        let tasks_dir = root.into().join("tasks").join(agent_name);
        fs::create_dir_all(&tasks_dir)
            .await
            .map_err(|e| A2AError::internal_error(format!("failed to create task directory: {e}")))?;
        Ok(Self { tasks_dir })
    }

    fn task_path(&self, task_id: &str) -> PathBuf {
        self.tasks_dir.join(format!("{task_id}.json"))
    }

    async fn read_task(&self, task_id: &str) -> A2AResult<Option<Task>> {
        let path = self.task_path(task_id);
        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(A2AError::internal_error(format!(
                    "failed to read task file: {e}"
                )))
            }
        };
        match serde_json::from_str::<Task>(&contents) {
            Ok(task) => Ok(Some(task)),
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "task file is not valid JSON");
                Err(A2AError::internal_error(format!(
                    "task file for {task_id} is corrupt: {e}"
                )))
            }
        }
    }

    async fn write_task(&self, task: &Task) -> A2AResult<()> {
        let path = self.task_path(&task.id);
        let json = serde_json::to_string_pretty(task)
            .map_err(|e| A2AError::internal_error(format!("failed to serialize task: {e}")))?;
        fs::write(&path, json)
            .await
            .map_err(|e| A2AError::internal_error(format!("failed to write task file: {e}")))?;
        debug!(task_id = %task.id, path = ?path, "task written");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for DirTaskStore {
    async fn create(&self, task: Task) -> A2AResult<()> {
        if self.read_task(&task.id).await?.is_some() {
            return Err(A2AError::invalid_params(format!(
                "task {} already exists",
                task.id
            )));
        }
        self.write_task(&task).await
    }

    async fn get(&self, task_id: &str, history_length: Option<u32>) -> A2AResult<Option<Task>> {
        Ok(self
            .read_task(task_id)
            .await?
            .map(|t| t.windowed(history_length)))
    }

    async fn update(&self, task: Task) -> A2AResult<()> {
        self.write_task(&task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, TaskState, TaskStatus};

    fn make_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            session_id: Some("s1".to_string()),
            status: TaskStatus::new(TaskState::Submitted),
            artifacts: None,
            history: Some(vec![Message::user_text("hello")]),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirTaskStore::new(dir.path(), "echo").await.unwrap();

        store.create(make_task("t1")).await.unwrap();
        let loaded = store.get("t1", None).await.unwrap().unwrap();
        assert_eq!(loaded, make_task("t1"));

        // Layout: tasks/<agent>/<task-id>.json
        let path = dir.path().join("tasks").join("echo").join("t1.json");
        assert!(path.exists());
        let raw = std::fs::read_to_string(path).unwrap();
        assert!(raw.contains('\n'), "task files are pretty-printed");
    }

    #[tokio::test]
    async fn create_rejects_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirTaskStore::new(dir.path(), "echo").await.unwrap();

        store.create(make_task("t1")).await.unwrap();
        assert!(store.create(make_task("t1")).await.is_err());
    }

    #[tokio::test]
    async fn update_replaces_and_cancel_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirTaskStore::new(dir.path(), "echo").await.unwrap();

        store.create(make_task("t1")).await.unwrap();
        let mut task = make_task("t1");
        task.status = TaskStatus::new(TaskState::Working);
        store.update(task).await.unwrap();

        let canceled = store.cancel("t1").await.unwrap().unwrap();
        assert_eq!(canceled.status.state, TaskState::Canceled);

        let reloaded = store.get("t1", None).await.unwrap().unwrap();
        assert_eq!(reloaded.status.state, TaskState::Canceled);
    }
}
