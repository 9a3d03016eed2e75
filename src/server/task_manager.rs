//! Task lifecycle engine.
//!
//! The [`TaskManager`] owns what a task means end-to-end: it resolves or
//! creates the task for an incoming send, drives the provider, executes tool
//! calls, appends history, maintains the artifact stream, persists every
//! state-changing event, and publishes to the per-task and root brokers.
//!
//! The ordering invariant throughout is persist-then-publish: a subscriber
//! that observes state X may rely on X being durably stored.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{A2AError, A2AResult};
use crate::provider::{Provider, ProviderEvent, ProviderParams};
use crate::tools::{ToolCall, ToolRegistry};
use crate::types::{
    Artifact, Message, Part, Task, TaskArtifactUpdateEvent, TaskEvent, TaskIdParams,
    TaskPushNotificationConfig, TaskQueryParams, TaskSendParams, TaskState, TaskStatus,
    TaskStatusUpdateEvent,
};

use super::broker::{EventBroker, TaskBrokers};
use super::push::PushNotifier;
use super::task_store::TaskStore;

/// Default deadline for non-streaming `tasks/send`; escalates to cancellation.
const SEND_TIMEOUT: Duration = Duration::from_secs(120);

/// How long a cancel request waits for the run loop to finalize.
const CANCEL_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The task operation surface an agent exposes over RPC.
///
/// Implemented by [`TaskManager`]; the agent facade binds these operations
/// to the JSON-RPC method table.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Name of the agent that owns the task namespace.
    fn agent_name(&self) -> &str;

    /// `tasks/send` — run the task to quiescence and return the final task.
    async fn send_task(&self, params: TaskSendParams) -> A2AResult<Task>;

    /// `tasks/sendSubscribe` — start the task and stream its events.
    async fn send_subscribe(
        &self,
        params: TaskSendParams,
    ) -> A2AResult<(Task, mpsc::Receiver<TaskEvent>)>;

    /// `tasks/get` — load a task with optional history windowing.
    async fn get_task(&self, params: TaskQueryParams) -> A2AResult<Task>;

    /// `tasks/cancel` — cancel a running task.
    async fn cancel_task(&self, params: TaskIdParams) -> A2AResult<Task>;

    /// `tasks/resubscribe` — re-attach to a task's event stream.
    async fn resubscribe(&self, params: TaskQueryParams)
        -> A2AResult<mpsc::Receiver<TaskEvent>>;

    /// `tasks/pushNotification/set` — associate a push config with a task.
    async fn set_push_notification(
        &self,
        config: TaskPushNotificationConfig,
    ) -> A2AResult<TaskPushNotificationConfig>;

    /// `tasks/pushNotification/get` — read back a task's push config.
    async fn get_push_notification(
        &self,
        params: TaskIdParams,
    ) -> A2AResult<TaskPushNotificationConfig>;
}

/// Everything a running task needs, cloneable into the spawned run loop.
#[derive(Clone)]
struct RunContext {
    agent_name: String,
    store: Arc<dyn TaskStore>,
    brokers: Arc<TaskBrokers>,
    root_broker: Arc<EventBroker>,
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    push: Option<Arc<PushNotifier>>,
    push_configs: Arc<RwLock<HashMap<String, TaskPushNotificationConfig>>>,
    running: Arc<Mutex<HashMap<String, RunningTask>>>,
}

#[derive(Clone)]
struct RunningTask {
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
}

/// Builder-style configuration and the engine itself.
pub struct TaskManager {
    ctx: RunContext,
    system_prompt: Option<String>,
    send_timeout: Duration,
}

impl TaskManager {
    /// Create a manager for one agent.
    pub fn new(
        agent_name: impl Into<String>,
        store: Arc<dyn TaskStore>,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            ctx: RunContext {
                agent_name: agent_name.into(),
                store,
                brokers: Arc::new(TaskBrokers::new()),
                root_broker: Arc::new(EventBroker::new()),
                provider,
                tools,
                push: None,
                push_configs: Arc::new(RwLock::new(HashMap::new())),
                running: Arc::new(Mutex::new(HashMap::new())),
            },
            system_prompt: None,
            send_timeout: SEND_TIMEOUT,
        }
    }

    /// Seed every new task's history with a system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Enable push notifications through the given dispatcher.
    pub fn with_push_notifier(mut self, push: Arc<PushNotifier>) -> Self {
        self.ctx.push = Some(push);
        self
    }

    /// Override the non-streaming send deadline.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// The per-task broker map (used by the agent facade for `/events/{id}`).
    pub fn brokers(&self) -> Arc<TaskBrokers> {
        Arc::clone(&self.ctx.brokers)
    }

    /// The process-wide broker (used by the agent facade for `/events`).
    pub fn root_broker(&self) -> Arc<EventBroker> {
        Arc::clone(&self.ctx.root_broker)
    }

    /// The push dispatcher, when one was configured.
    pub fn push_notifier(&self) -> Option<Arc<PushNotifier>> {
        self.ctx.push.clone()
    }

    /// Resolve the task for an incoming send: reuse a known id, otherwise
    /// create a fresh `submitted` task. Persists before anything observable.
    async fn select_task(&self, params: &TaskSendParams) -> A2AResult<Task> {
        for part in &params.message.parts {
            part.validate()?;
        }

        if params.push_notification.is_some() && self.ctx.push.is_none() {
            return Err(A2AError::push_notification_not_supported(
                "this agent has no push notification dispatcher",
            ));
        }

        if let Some(mut task) = self.ctx.store.get(&params.id, None).await? {
            if task.is_terminal() {
                return Err(A2AError::invalid_params(format!(
                    "task {} is in terminal state {}",
                    task.id, task.status.state
                )));
            }
            if self.ctx.running.lock().await.contains_key(&task.id) {
                return Err(A2AError::invalid_params(format!(
                    "task {} is already running",
                    task.id
                )));
            }
            // Implicit continue: the send becomes another user turn.
            task.push_history(params.message.clone());
            self.ctx.store.update(task.clone()).await?;
            return Ok(task);
        }

        let mut history = Vec::new();
        if let Some(ref prompt) = self.system_prompt {
            history.push(Message::system_text(prompt.clone()));
        }
        history.push(params.message.clone());

        let task = Task {
            id: params.id.clone(),
            session_id: Some(
                params
                    .session_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            ),
            status: TaskStatus::now(TaskState::Submitted),
            artifacts: None,
            history: Some(history),
            metadata: params.metadata.clone(),
        };
        self.ctx.store.create(task.clone()).await?;
        info!(task_id = %task.id, agent = %self.ctx.agent_name, "task created");
        Ok(task)
    }

    /// Register the push config from send params, if any.
    async fn stash_push_config(&self, params: &TaskSendParams) {
        if let Some(ref config) = params.push_notification {
            let mut configs = self.ctx.push_configs.write().await;
            configs.insert(
                params.id.clone(),
                TaskPushNotificationConfig {
                    id: params.id.clone(),
                    push_notification_config: config.clone(),
                },
            );
        }
    }

    /// Spawn the run loop for a task and track it in the running map.
    async fn spawn_run(&self, task_id: &str, stream: bool) -> RunningTask {
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);
        let running = RunningTask {
            cancel: cancel.clone(),
            done: done_rx,
        };

        self.ctx
            .running
            .lock()
            .await
            .insert(task_id.to_string(), running.clone());

        let ctx = self.ctx.clone();
        let task_id = task_id.to_string();
        tokio::spawn(async move {
            run_task(ctx, task_id, stream, cancel, done_tx).await;
        });

        running
    }
}

#[async_trait]
impl TaskService for TaskManager {
    fn agent_name(&self) -> &str {
        &self.ctx.agent_name
    }

    async fn send_task(&self, params: TaskSendParams) -> A2AResult<Task> {
        let task = self.select_task(&params).await?;
        self.stash_push_config(&params).await;

        let running = self.spawn_run(&task.id, false).await;
        let mut done = running.done.clone();

        // wait_for inspects the current value first, so a run that finished
        // before we got here is observed immediately.
        if tokio::time::timeout(self.send_timeout, done.wait_for(|finished| *finished))
            .await
            .is_err()
        {
            warn!(task_id = %task.id, "send deadline reached, canceling task");
            running.cancel.cancel();
            let _ =
                tokio::time::timeout(CANCEL_DRAIN_TIMEOUT, done.wait_for(|finished| *finished))
                    .await;
        }

        let final_task = self
            .ctx
            .store
            .get(&task.id, params.history_length)
            .await?
            .ok_or_else(|| A2AError::task_not_found(task.id.clone()))?;
        Ok(final_task)
    }

    async fn send_subscribe(
        &self,
        params: TaskSendParams,
    ) -> A2AResult<(Task, mpsc::Receiver<TaskEvent>)> {
        let task = self.select_task(&params).await?;
        self.stash_push_config(&params).await;

        // Subscribe before spawning so the working transition is never missed.
        let broker = self.ctx.brokers.get_or_create(&task.id).await;
        let rx = broker
            .subscribe()
            .await
            .map_err(|_| A2AError::internal_error("task event stream already closed"))?;

        self.spawn_run(&task.id, true).await;
        Ok((task, rx))
    }

    async fn get_task(&self, params: TaskQueryParams) -> A2AResult<Task> {
        self.ctx
            .store
            .get(&params.id, params.history_length)
            .await?
            .ok_or_else(|| A2AError::task_not_found(params.id.clone()))
    }

    async fn cancel_task(&self, params: TaskIdParams) -> A2AResult<Task> {
        let task = self
            .ctx
            .store
            .get(&params.id, None)
            .await?
            .ok_or_else(|| A2AError::task_not_found(params.id.clone()))?;

        if task.is_terminal() {
            let data = serde_json::to_value(&task).ok();
            return Err(A2AError::task_not_cancelable(
                format!("task {} is in terminal state {}", task.id, task.status.state),
                data,
            ));
        }

        let running = self.ctx.running.lock().await.get(&params.id).cloned();
        if let Some(running) = running {
            running.cancel.cancel();
            let mut done = running.done.clone();
            let _ =
                tokio::time::timeout(CANCEL_DRAIN_TIMEOUT, done.wait_for(|finished| *finished))
                    .await;

            let task = self
                .ctx
                .store
                .get(&params.id, None)
                .await?
                .ok_or_else(|| A2AError::task_not_found(params.id.clone()))?;
            return match task.status.state {
                TaskState::Canceled => Ok(task),
                state if state.is_terminal() => {
                    let data = serde_json::to_value(&task).ok();
                    Err(A2AError::task_not_cancelable(
                        format!("task {} finished as {} before cancel", task.id, state),
                        data,
                    ))
                }
                _ => {
                    // Run loop did not drain in time; force the store transition.
                    finalize_idle_cancel(&self.ctx, &params.id).await
                }
            };
        }

        // No live run: transition through the store and emit the final event.
        finalize_idle_cancel(&self.ctx, &params.id).await
    }

    async fn resubscribe(
        &self,
        params: TaskQueryParams,
    ) -> A2AResult<mpsc::Receiver<TaskEvent>> {
        let task = self
            .ctx
            .store
            .get(&params.id, params.history_length)
            .await?
            .ok_or_else(|| A2AError::task_not_found(params.id.clone()))?;

        if task.is_terminal() {
            // Replay: artifacts in order, then the terminal status, then close.
            let artifacts = task.artifacts.clone().unwrap_or_default();
            let (tx, rx) = mpsc::channel(artifacts.len() + 1);
            for artifact in artifacts {
                let _ = tx
                    .send(TaskEvent::Artifact(TaskArtifactUpdateEvent {
                        id: task.id.clone(),
                        artifact,
                        metadata: None,
                    }))
                    .await;
            }
            let _ = tx
                .send(TaskEvent::Status(TaskStatusUpdateEvent {
                    id: task.id.clone(),
                    status: task.status.clone(),
                    r#final: true,
                    metadata: None,
                }))
                .await;
            return Ok(rx);
        }

        let broker = self.ctx.brokers.get_or_create(&params.id).await;
        broker
            .subscribe()
            .await
            .map_err(|_| A2AError::task_not_found(params.id.clone()))
    }

    async fn set_push_notification(
        &self,
        config: TaskPushNotificationConfig,
    ) -> A2AResult<TaskPushNotificationConfig> {
        let Some(ref push) = self.ctx.push else {
            return Err(A2AError::push_notification_not_supported(
                "this agent has no push notification dispatcher",
            ));
        };

        self.ctx
            .store
            .get(&config.id, None)
            .await?
            .ok_or_else(|| A2AError::task_not_found(config.id.clone()))?;

        push.verify_url(&config.push_notification_config.url)
            .await
            .map_err(|e| {
                A2AError::invalid_params(format!(
                    "push notification URL verification failed: {e}"
                ))
            })?;

        let mut configs = self.ctx.push_configs.write().await;
        configs.insert(config.id.clone(), config.clone());
        Ok(config)
    }

    async fn get_push_notification(
        &self,
        params: TaskIdParams,
    ) -> A2AResult<TaskPushNotificationConfig> {
        self.ctx
            .store
            .get(&params.id, None)
            .await?
            .ok_or_else(|| A2AError::task_not_found(params.id.clone()))?;

        let configs = self.ctx.push_configs.read().await;
        configs
            .get(&params.id)
            .cloned()
            .ok_or_else(|| A2AError::push_notification_config_not_found(params.id.clone()))
    }
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

/// How one run of the provider loop ended.
enum Outcome {
    Completed,
    Canceled,
    Failed(String),
    InputRequired,
}

/// Publish an event on the task's sub-broker and the process-wide broker.
async fn publish(ctx: &RunContext, task_id: &str, event: TaskEvent) {
    let broker = ctx.brokers.get_or_create(task_id).await;
    broker.broadcast(event.clone()).await;
    ctx.root_broker.broadcast(event).await;
}

/// Persist a non-terminal snapshot, tolerating store failures.
///
/// Returns `true` when the write landed; callers track staleness.
async fn persist_tolerant(ctx: &RunContext, task: &Task) -> bool {
    match ctx.store.update(task.clone()).await {
        Ok(()) => true,
        Err(e) => {
            warn!(task_id = %task.id, error = %e, "non-terminal persist failed, continuing stale");
            false
        }
    }
}

/// Top-level run: drive the provider, then finalize the task exactly once.
async fn run_task(
    ctx: RunContext,
    task_id: String,
    stream: bool,
    cancel: CancellationToken,
    done_tx: watch::Sender<bool>,
) {
    let (task, outcome) = match drive(&ctx, &task_id, stream, &cancel).await {
        Ok(pair) => pair,
        Err(e) => {
            error!(task_id = %task_id, error = %e, "task run failed before provider loop");
            match ctx.store.get(&task_id, None).await {
                Ok(Some(task)) => (task, Outcome::Failed(e.to_string())),
                _ => {
                    ctx.running.lock().await.remove(&task_id);
                    let _ = done_tx.send(true);
                    return;
                }
            }
        }
    };

    finalize(&ctx, task, outcome).await;
    ctx.running.lock().await.remove(&task_id);
    let _ = done_tx.send(true);
}

/// The provider loop: stream events, apply them, round-trip tool calls.
async fn drive(
    ctx: &RunContext,
    task_id: &str,
    stream: bool,
    cancel: &CancellationToken,
) -> A2AResult<(Task, Outcome)> {
    use futures::StreamExt;

    let mut task = ctx
        .store
        .get(task_id, None)
        .await?
        .ok_or_else(|| A2AError::task_not_found(task_id.to_string()))?;

    task.status = TaskStatus::now(TaskState::Working);
    let mut stale = !persist_tolerant(ctx, &task).await;
    publish(
        ctx,
        task_id,
        TaskEvent::Status(TaskStatusUpdateEvent {
            id: task.id.clone(),
            status: task.status.clone(),
            r#final: false,
            metadata: None,
        }),
    )
    .await;

    // Artifact cursor: `next_index` is where a fresh artifact lands,
    // `open` means index `next_index` already received chunks.
    let mut next_index = task.artifacts.as_ref().map_or(0, |a| a.len()) as u32;
    let mut open = false;

    loop {
        let params = ProviderParams {
            history: task.history.clone().unwrap_or_default(),
            tools: ctx.tools.schemas(),
            model: None,
            max_tokens: None,
            stop: None,
            stream,
        };

        let mut events = match ctx.provider.generate(params).await {
            Ok(s) => s,
            Err(e) => return Ok((task, Outcome::Failed(e.to_string()))),
        };

        let mut pending_calls: Vec<ToolCall> = Vec::new();
        let mut failure: Option<String> = None;
        let mut input_required = false;

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return Ok((task, Outcome::Canceled)),
                ev = events.next() => ev,
            };

            match event {
                None => break,
                Some(Err(e)) => {
                    failure = Some(e.to_string());
                    break;
                }
                Some(Ok(ProviderEvent::TextDelta(text))) => {
                    if text.is_empty() {
                        continue;
                    }
                    let append = open;
                    let event_artifact =
                        apply_chunk(&mut task, next_index, Part::text(text), append, false);
                    open = true;
                    stale |= !persist_tolerant(ctx, &task).await;
                    publish(
                        ctx,
                        task_id,
                        TaskEvent::Artifact(TaskArtifactUpdateEvent {
                            id: task.id.clone(),
                            artifact: event_artifact,
                            metadata: None,
                        }),
                    )
                    .await;
                }
                Some(Ok(ProviderEvent::ArtifactPart {
                    part,
                    append,
                    last_chunk,
                })) => {
                    let extend = append && open;
                    if !extend && open {
                        next_index += 1;
                    }
                    let event_artifact =
                        apply_chunk(&mut task, next_index, part, extend, last_chunk);
                    if last_chunk {
                        next_index += 1;
                        open = false;
                    } else {
                        open = true;
                    }
                    stale |= !persist_tolerant(ctx, &task).await;
                    publish(
                        ctx,
                        task_id,
                        TaskEvent::Artifact(TaskArtifactUpdateEvent {
                            id: task.id.clone(),
                            artifact: event_artifact,
                            metadata: None,
                        }),
                    )
                    .await;
                }
                Some(Ok(ProviderEvent::ToolCall {
                    id,
                    name,
                    arguments,
                })) => {
                    let args = serde_json::from_str(&arguments)
                        .unwrap_or(serde_json::Value::Null);
                    pending_calls.push(ToolCall { id, name, args });
                }
                Some(Ok(ProviderEvent::StatusUpdate { state, message })) => {
                    if state == TaskState::InputRequired {
                        input_required = true;
                    }
                    task.status = TaskStatus {
                        state,
                        message: message.map(Message::agent_text),
                        timestamp: Some(chrono::Utc::now().to_rfc3339()),
                    };
                    stale |= !persist_tolerant(ctx, &task).await;
                    publish(
                        ctx,
                        task_id,
                        TaskEvent::Status(TaskStatusUpdateEvent {
                            id: task.id.clone(),
                            status: task.status.clone(),
                            r#final: false,
                            metadata: None,
                        }),
                    )
                    .await;
                }
                Some(Ok(ProviderEvent::Done)) => break,
                Some(Ok(ProviderEvent::Failed(msg))) => {
                    failure = Some(msg);
                    break;
                }
            }
        }

        if let Some(msg) = failure {
            return Ok((task, Outcome::Failed(msg)));
        }

        if pending_calls.is_empty() {
            if stale {
                debug!(task_id = %task_id, "in-memory task is ahead of the store");
            }
            let outcome = if input_required {
                Outcome::InputRequired
            } else {
                Outcome::Completed
            };
            return Ok((task, outcome));
        }

        // Tool round-trip: record the call, execute, record the result, and
        // resume the provider with the extended history.
        for call in pending_calls.drain(..) {
            let arguments = call.args.to_string();
            task.push_history(Message::tool_call(&call.id, &call.name, &arguments));

            let output = tokio::select! {
                _ = cancel.cancelled() => return Ok((task, Outcome::Canceled)),
                out = ctx.tools.execute(&call) => out,
            };

            if output.is_error {
                warn!(
                    task_id = %task_id,
                    tool = %call.name,
                    "tool failed; feeding the error back to the provider"
                );
            }
            task.push_history(Message::tool_result(
                &output.call_id,
                &call.name,
                output.content,
            ));
            stale |= !persist_tolerant(ctx, &task).await;
        }
    }
}

/// Fold a chunk into the task's artifact list and return the event view.
///
/// The stored artifact accumulates parts; the returned artifact carries only
/// this chunk, with `append`/`lastChunk` set for subscribers.
fn apply_chunk(task: &mut Task, index: u32, part: Part, append: bool, last_chunk: bool) -> Artifact {
    let artifacts = task.artifacts.get_or_insert_with(Vec::new);

    if append {
        if let Some(existing) = artifacts.iter_mut().find(|a| a.index == index) {
            existing.parts.push(part.clone());
            if last_chunk {
                existing.last_chunk = Some(true);
            }
        } else {
            warn!(task_id = %task.id, index, "append to unknown artifact index; starting fresh");
            artifacts.push(Artifact::new(index, vec![part.clone()]));
        }
    } else {
        let mut artifact = Artifact::new(index, vec![part.clone()]);
        if last_chunk {
            artifact.last_chunk = Some(true);
        }
        artifacts.push(artifact);
    }

    let mut event_artifact = Artifact::new(index, vec![part]);
    event_artifact.append = append.then_some(true);
    event_artifact.last_chunk = last_chunk.then_some(true);
    event_artifact
}

/// Seal the task, persist the terminal state exactly once, publish the final
/// event, dispatch push notification, and close the sub-broker.
async fn finalize(ctx: &RunContext, mut task: Task, outcome: Outcome) {
    let state = match &outcome {
        Outcome::Completed => TaskState::Completed,
        Outcome::Canceled => TaskState::Canceled,
        Outcome::Failed(_) => TaskState::Failed,
        Outcome::InputRequired => {
            // Non-terminal pause: the status event was already published and
            // the broker stays open for the next user turn.
            if let Err(e) = ctx.store.update(task.clone()).await {
                warn!(task_id = %task.id, error = %e, "persist failed at input-required pause");
            }
            return;
        }
    };

    // Seal any artifact still open.
    if let Some(artifacts) = task.artifacts.as_mut() {
        if let Some(last) = artifacts.last_mut() {
            last.last_chunk.get_or_insert(true);
        }
    }

    // A successful run records the agent's reply in the conversation too.
    if state == TaskState::Completed {
        let reply = task
            .artifacts
            .as_ref()
            .and_then(|a| a.last())
            .map(|a| {
                a.parts
                    .iter()
                    .filter_map(Part::as_text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if !reply.is_empty() {
            task.push_history(Message::agent_text(reply));
        }
    }

    task.status = TaskStatus {
        state,
        message: match &outcome {
            Outcome::Failed(msg) => Some(Message::agent_text(msg.clone())),
            _ => None,
        },
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    };

    // The client is entitled to a durable final state: retry once, then
    // escalate to failed.
    if let Err(first) = ctx.store.update(task.clone()).await {
        warn!(task_id = %task.id, error = %first, "terminal persist failed, retrying");
        if let Err(second) = ctx.store.update(task.clone()).await {
            error!(task_id = %task.id, error = %second, "terminal persist failed twice");
            task.status = TaskStatus {
                state: TaskState::Failed,
                message: Some(Message::agent_text(format!(
                    "failed to persist terminal state: {second}"
                ))),
                timestamp: Some(chrono::Utc::now().to_rfc3339()),
            };
            let _ = ctx.store.update(task.clone()).await;
        }
    }

    publish(
        ctx,
        &task.id,
        TaskEvent::Status(TaskStatusUpdateEvent {
            id: task.id.clone(),
            status: task.status.clone(),
            r#final: true,
            metadata: None,
        }),
    )
    .await;

    dispatch_push(ctx, &task).await;
    ctx.brokers.close(&task.id).await;
    info!(task_id = %task.id, state = %task.status.state, "task finalized");
}

/// Cancel a task that has no live run loop.
async fn finalize_idle_cancel(ctx: &RunContext, task_id: &str) -> A2AResult<Task> {
    let task = ctx
        .store
        .cancel(task_id)
        .await?
        .ok_or_else(|| A2AError::task_not_found(task_id.to_string()))?;

    publish(
        ctx,
        task_id,
        TaskEvent::Status(TaskStatusUpdateEvent {
            id: task.id.clone(),
            status: task.status.clone(),
            r#final: true,
            metadata: None,
        }),
    )
    .await;

    dispatch_push(ctx, &task).await;
    ctx.brokers.close(task_id).await;
    Ok(task)
}

/// Hand a terminal task to the push dispatcher when a config is stored.
async fn dispatch_push(ctx: &RunContext, task: &Task) {
    let Some(ref push) = ctx.push else {
        return;
    };
    let config = {
        let configs = ctx.push_configs.read().await;
        configs.get(&task.id).cloned()
    };
    if let Some(config) = config {
        if let Err(e) = push.notify(&config.push_notification_config, task).await {
            warn!(task_id = %task.id, error = %e, "push notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{EchoProvider, ScriptedProvider};
    use crate::server::task_store::InMemoryTaskStore;
    use crate::tools::{Tool, ToolOutput};
    use serde_json::json;

    fn echo_manager() -> TaskManager {
        TaskManager::new(
            "echo-agent",
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(EchoProvider::new()),
            Arc::new(ToolRegistry::new()),
        )
    }

    #[tokio::test]
    async fn send_task_completes_with_echoed_artifact() {
        let manager = echo_manager();
        let task = manager
            .send_task(TaskSendParams::text("t1", "hi"))
            .await
            .unwrap();

        assert_eq!(task.status.state, TaskState::Completed);
        let artifacts = task.artifacts.as_ref().unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].index, 0);
        assert_eq!(artifacts[0].parts[0].as_text(), Some("hi"));
        assert_eq!(artifacts[0].last_chunk, Some(true));
    }

    #[tokio::test]
    async fn send_then_get_returns_same_final_state() {
        let manager = echo_manager();
        let sent = manager
            .send_task(TaskSendParams::text("t1", "hello"))
            .await
            .unwrap();

        let got = manager
            .get_task(TaskQueryParams {
                id: "t1".into(),
                history_length: None,
                metadata: None,
            })
            .await
            .unwrap();
        assert_eq!(sent.status.state, got.status.state);
        assert_eq!(sent.artifacts, got.artifacts);
    }

    #[tokio::test]
    async fn invalid_part_is_rejected_before_any_run() {
        let manager = echo_manager();
        let mut params = TaskSendParams::text("bad", "x");
        params.message.parts = vec![Part::File {
            file: crate::types::FileContent {
                bytes: Some("B".into()),
                uri: Some("U".into()),
                name: None,
                mime_type: None,
            },
            metadata: None,
        }];

        let err = manager.send_task(params).await.unwrap_err();
        assert_eq!(err.code(), crate::error::INVALID_PARAMS);
        assert!(err.to_string().contains("file"));
    }

    #[tokio::test]
    async fn cancel_mid_run_yields_canceled_task() {
        let manager = TaskManager::new(
            "echo-agent",
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(EchoProvider::with_delay(Duration::from_secs(5))),
            Arc::new(ToolRegistry::new()),
        );

        let (_task, mut rx) = manager
            .send_subscribe(TaskSendParams::text("t1", "slow"))
            .await
            .unwrap();

        // Let the run reach working, then cancel.
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, TaskEvent::Status(ref e) if e.status.state == TaskState::Working));

        let canceled = manager
            .cancel_task(TaskIdParams {
                id: "t1".into(),
                metadata: None,
            })
            .await
            .unwrap();
        assert_eq!(canceled.status.state, TaskState::Canceled);

        // The stream ends with the canceled final event.
        let last = rx.recv().await.unwrap();
        match last {
            TaskEvent::Status(e) => {
                assert_eq!(e.status.state, TaskState::Canceled);
                assert!(e.r#final);
            }
            other => panic!("expected final status, got {:?}", other),
        }

        // A second cancel reports not-cancelable with the task attached.
        let err = manager
            .cancel_task(TaskIdParams {
                id: "t1".into(),
                metadata: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::TASK_NOT_CANCELABLE);
    }

    #[tokio::test]
    async fn resubscribe_after_completion_replays_artifacts_then_final() {
        let manager = echo_manager();
        manager
            .send_task(TaskSendParams::text("t1", "hi"))
            .await
            .unwrap();

        let mut rx = manager
            .resubscribe(TaskQueryParams {
                id: "t1".into(),
                history_length: Some(1),
                metadata: None,
            })
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        match first {
            TaskEvent::Artifact(e) => {
                assert_eq!(e.artifact.index, 0);
                assert_eq!(e.artifact.parts[0].as_text(), Some("hi"));
            }
            other => panic!("expected artifact replay, got {:?}", other),
        }

        let second = rx.recv().await.unwrap();
        match second {
            TaskEvent::Status(e) => {
                assert_eq!(e.status.state, TaskState::Completed);
                assert!(e.r#final);
            }
            other => panic!("expected final status, got {:?}", other),
        }

        assert!(rx.recv().await.is_none(), "stream closes after replay");
    }

    struct AdderTool;

    #[async_trait]
    impl Tool for AdderTool {
        fn name(&self) -> &str {
            "adder"
        }
        fn description(&self) -> &str {
            "adds two numbers"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "number" },
                    "b": { "type": "number" }
                },
                "required": ["a", "b"]
            })
        }
        async fn execute(&self, call: &ToolCall) -> ToolOutput {
            let a = call.args["a"].as_i64().unwrap_or(0);
            let b = call.args["b"].as_i64().unwrap_or(0);
            ToolOutput::ok(&call.id, json!(a + b))
        }
    }

    #[tokio::test]
    async fn tool_round_trip_extends_history_and_resumes_provider() {
        let provider = ScriptedProvider::new(vec![
            vec![
                ProviderEvent::ToolCall {
                    id: "call_1".into(),
                    name: "adder".into(),
                    arguments: r#"{"a":1,"b":2}"#.into(),
                },
                ProviderEvent::Done,
            ],
            vec![
                ProviderEvent::TextDelta("the sum is 3".into()),
                ProviderEvent::Done,
            ],
        ]);

        let mut tools = ToolRegistry::new();
        tools.register(AdderTool);

        let manager = TaskManager::new(
            "calc-agent",
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(provider),
            Arc::new(tools),
        );

        let task = manager
            .send_task(TaskSendParams::text("t1", "add 1 and 2"))
            .await
            .unwrap();

        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(
            task.artifacts.as_ref().unwrap()[0].parts[0].as_text(),
            Some("the sum is 3")
        );

        let history = task.history.as_ref().unwrap();
        let kinds: Vec<_> = history.iter().filter_map(|m| m.marker_kind()).collect();
        assert_eq!(
            kinds,
            vec![
                crate::types::MESSAGE_KIND_TOOL_CALL,
                crate::types::MESSAGE_KIND_TOOL_RESULT
            ]
        );
    }

    #[tokio::test]
    async fn failing_tool_feeds_error_back_without_failing_task() {
        let provider = ScriptedProvider::new(vec![
            vec![
                ProviderEvent::ToolCall {
                    id: "call_1".into(),
                    name: "no-such-tool".into(),
                    arguments: "{}".into(),
                },
                ProviderEvent::Done,
            ],
            vec![
                ProviderEvent::TextDelta("recovered".into()),
                ProviderEvent::Done,
            ],
        ]);

        let manager = TaskManager::new(
            "calc-agent",
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(provider),
            Arc::new(ToolRegistry::new()),
        );

        let task = manager
            .send_task(TaskSendParams::text("t1", "call something"))
            .await
            .unwrap();

        // The task completes; the error travels as a tool result.
        assert_eq!(task.status.state, TaskState::Completed);
        let result_msg = task
            .history
            .as_ref()
            .unwrap()
            .iter()
            .find(|m| m.marker_kind() == Some(crate::types::MESSAGE_KIND_TOOL_RESULT))
            .unwrap();
        let text = serde_json::to_string(result_msg).unwrap();
        assert!(text.contains("unknown tool"));
    }

    #[tokio::test]
    async fn artifact_parts_advance_indices_monotonically() {
        let provider = ScriptedProvider::new(vec![vec![
            ProviderEvent::ArtifactPart {
                part: Part::text("report part one"),
                append: false,
                last_chunk: false,
            },
            ProviderEvent::ArtifactPart {
                part: Part::text("report part two"),
                append: true,
                last_chunk: true,
            },
            ProviderEvent::ArtifactPart {
                part: Part::text("summary"),
                append: false,
                last_chunk: true,
            },
            ProviderEvent::Done,
        ]]);

        let manager = TaskManager::new(
            "writer-agent",
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(provider),
            Arc::new(ToolRegistry::new()),
        );

        let task = manager
            .send_task(TaskSendParams::text("t1", "write"))
            .await
            .unwrap();

        let artifacts = task.artifacts.as_ref().unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].index, 0);
        assert_eq!(artifacts[0].parts.len(), 2);
        assert_eq!(artifacts[0].last_chunk, Some(true));
        assert_eq!(artifacts[1].index, 1);
        assert_eq!(artifacts[1].parts[0].as_text(), Some("summary"));
        assert_eq!(artifacts[1].last_chunk, Some(true));
    }

    #[tokio::test]
    async fn provider_failure_marks_task_failed() {
        let provider = ScriptedProvider::new(vec![vec![ProviderEvent::Failed(
            "model exploded".into(),
        )]]);
        let manager = TaskManager::new(
            "flaky-agent",
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(provider),
            Arc::new(ToolRegistry::new()),
        );

        let task = manager
            .send_task(TaskSendParams::text("t1", "boom"))
            .await
            .unwrap();
        assert_eq!(task.status.state, TaskState::Failed);
        let msg = task.status.message.as_ref().unwrap().text_content();
        assert!(msg.contains("model exploded"));
    }

    #[tokio::test]
    async fn input_required_pauses_and_follow_up_send_resumes() {
        let provider = ScriptedProvider::new(vec![
            vec![
                ProviderEvent::StatusUpdate {
                    state: TaskState::InputRequired,
                    message: Some("which city?".into()),
                },
                ProviderEvent::Done,
            ],
            vec![
                ProviderEvent::TextDelta("sunny in Lisbon".into()),
                ProviderEvent::Done,
            ],
        ]);

        let manager = TaskManager::new(
            "weather-agent",
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(provider),
            Arc::new(ToolRegistry::new()),
        );

        let paused = manager
            .send_task(TaskSendParams::text("t1", "weather?"))
            .await
            .unwrap();
        assert_eq!(paused.status.state, TaskState::InputRequired);

        let resumed = manager
            .send_task(TaskSendParams::text("t1", "Lisbon"))
            .await
            .unwrap();
        assert_eq!(resumed.status.state, TaskState::Completed);
        // Both user turns are in history.
        let texts: Vec<String> = resumed
            .history
            .as_ref()
            .unwrap()
            .iter()
            .filter(|m| m.role == crate::types::Role::User)
            .map(|m| m.text_content())
            .collect();
        assert_eq!(texts, vec!["weather?", "Lisbon"]);
    }

    #[tokio::test]
    async fn send_to_terminal_task_is_rejected() {
        let manager = echo_manager();
        manager
            .send_task(TaskSendParams::text("t1", "hi"))
            .await
            .unwrap();

        let err = manager
            .send_task(TaskSendParams::text("t1", "again"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn get_unknown_task_reports_not_found() {
        let manager = echo_manager();
        let err = manager
            .get_task(TaskQueryParams {
                id: "nope".into(),
                history_length: None,
                metadata: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::TASK_NOT_FOUND);
    }
}
