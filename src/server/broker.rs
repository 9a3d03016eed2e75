//! Event broker — fan-out of task events to SSE subscribers.
//!
//! Two tiers: one root broker per process (the `/events` firehose) and one
//! sub-broker per task, created on demand and closed by the task manager
//! when the task terminates.
//!
//! Each subscriber owns a bounded channel. Broadcasting never blocks: a
//! subscriber whose buffer is full simply misses that event, so a single
//! slow SSE reader cannot stall the provider loop. Clients that need
//! at-least-once delivery replay through `tasks/resubscribe` instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::types::TaskEvent;

/// Per-subscriber channel capacity.
const SUBSCRIBER_BUFFER: usize = 8;

/// Default heartbeat comment interval for SSE streams.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Error returned when subscribing to a broker that has been closed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("broker is closed")]
pub struct BrokerClosed;

struct BrokerInner {
    subscribers: Vec<mpsc::Sender<TaskEvent>>,
    closed: bool,
}

/// Fan-out hub for one event stream.
pub struct EventBroker {
    inner: Mutex<BrokerInner>,
}

impl EventBroker {
    /// Create an open broker with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BrokerInner {
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Register a new subscriber.
    ///
    /// Fails once the broker has been closed; HTTP surfaces map that to 410.
    pub async fn subscribe(&self) -> Result<mpsc::Receiver<TaskEvent>, BrokerClosed> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(BrokerClosed);
        }
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        inner.subscribers.push(tx);
        Ok(rx)
    }

    /// Deliver an event to every live subscriber without blocking.
    ///
    /// Full buffers drop the event for that subscriber only; disconnected
    /// subscribers are pruned.
    pub async fn broadcast(&self, event: TaskEvent) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }
        inner.subscribers.retain(|tx| {
            match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(kind = event.kind(), "dropping event for slow subscriber");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }

    /// Disconnect all subscribers and reject future subscriptions.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        inner.subscribers.clear();
    }

    /// `true` once [`close`](Self::close) has been called.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.subscribers.len()
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-task sub-brokers keyed by task id.
///
/// A sub-broker lives from its first use until the owning task manager
/// closes it at terminal state.
pub struct TaskBrokers {
    brokers: Mutex<HashMap<String, Arc<EventBroker>>>,
}

impl TaskBrokers {
    /// Create an empty broker map.
    pub fn new() -> Self {
        Self {
            brokers: Mutex::new(HashMap::new()),
        }
    }

    /// The sub-broker for a task, created on first use.
    pub async fn get_or_create(&self, task_id: &str) -> Arc<EventBroker> {
        let mut brokers = self.brokers.lock().await;
        brokers
            .entry(task_id.to_string())
            .or_insert_with(|| Arc::new(EventBroker::new()))
            .clone()
    }

    /// The sub-broker for a task, if one exists.
    pub async fn get(&self, task_id: &str) -> Option<Arc<EventBroker>> {
        self.brokers.lock().await.get(task_id).cloned()
    }

    /// Close the sub-broker for a task.
    ///
    /// The closed broker stays in the map so later subscription attempts
    /// observe the closure (HTTP 410) instead of a fresh, silent stream.
    pub async fn close(&self, task_id: &str) {
        let broker = self.brokers.lock().await.get(task_id).cloned();
        if let Some(broker) = broker {
            debug!(task_id = %task_id, "closing task broker");
            broker.close().await;
        }
    }
}

impl Default for TaskBrokers {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a subscription into an SSE response.
///
/// Frames are `event: <kind>` + `data: <single-line JSON>`; the keep-alive
/// writes a `:heartbeat` comment on the given interval (shortened in tests).
/// The stream ends after a final event or when the broker closes the channel.
pub fn sse_response(
    mut rx: mpsc::Receiver<TaskEvent>,
    heartbeat: Duration,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let is_final = event.is_final();
            match serde_json::to_string(&event) {
                Ok(json) => {
                    yield Ok(Event::default().event(event.kind()).data(json));
                }
                Err(e) => {
                    warn!(error = %e, "failed to serialize SSE event");
                }
            }
            if is_final {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(heartbeat).text("heartbeat"))
}
