//! Fire-and-forget event dispatch.
//!
//! The orchestrator hands events to an [`EventDispatcher`], which serializes
//! them and pushes them onto an unbounded in-process channel. A dedicated
//! worker task drains the channel and publishes each message once through an
//! [`EventPublisher`]. Nothing on this path is awaited by the orchestrator and
//! no failure here reaches its caller.
//!
//! ```text
//! orchestrator ──dispatch()──▶ mpsc ──▶ EventWorker ──publish()──▶ sink
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use domain::DomainEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A serialized event addressed to a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub topic: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Errors raised by a publisher while delivering a message.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publish transport error: {0}")]
    Transport(String),
}

/// Trait for the event transport.
///
/// Delivery is best-effort: at most once, no acknowledgment, no ordering
/// across topics.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    async fn publish(&self, message: &EventMessage) -> Result<(), PublishError>;
}

/// Cloneable, non-blocking handle for emitting events.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    tx: mpsc::UnboundedSender<EventMessage>,
}

impl EventDispatcher {
    /// Starts a worker publishing through `publisher`.
    ///
    /// The worker exits once every dispatcher clone has been dropped and the
    /// channel is drained.
    pub fn spawn<P: EventPublisher>(publisher: P) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(EventWorker::new(publisher).run(rx));
        (Self { tx }, handle)
    }

    /// Hands an event off to the worker without waiting for delivery.
    pub fn dispatch<E: DomainEvent>(&self, event: &E) {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(e) => {
                metrics::counter!("events_failed_total", "topic" => event.topic()).increment(1);
                tracing::error!(topic = event.topic(), error = %e, "failed to serialize event");
                return;
            }
        };

        let message = EventMessage {
            topic: event.topic().to_string(),
            event_type: event.event_type().to_string(),
            payload,
        };

        if self.tx.send(message).is_err() {
            metrics::counter!("events_failed_total", "topic" => event.topic()).increment(1);
            tracing::warn!(topic = event.topic(), "event worker stopped, event dropped");
        }
    }
}

/// Background consumer of the dispatch channel.
struct EventWorker<P> {
    publisher: P,
}

impl<P: EventPublisher> EventWorker<P> {
    fn new(publisher: P) -> Self {
        Self { publisher }
    }

    /// Runs until the channel is closed.
    async fn run(self, mut rx: mpsc::UnboundedReceiver<EventMessage>) {
        tracing::debug!("event worker started");

        while let Some(message) = rx.recv().await {
            match self.publisher.publish(&message).await {
                Ok(()) => {
                    metrics::counter!("events_published_total", "topic" => message.topic.clone())
                        .increment(1);
                    tracing::debug!(topic = %message.topic, event_type = %message.event_type, "event published");
                }
                Err(e) => {
                    metrics::counter!("events_failed_total", "topic" => message.topic.clone())
                        .increment(1);
                    tracing::error!(topic = %message.topic, error = %e, "failed to publish event");
                }
            }
        }

        tracing::debug!("event channel closed, worker stopping");
    }
}

/// Publisher that writes every message to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, message: &EventMessage) -> Result<(), PublishError> {
        tracing::info!(
            topic = %message.topic,
            event_type = %message.event_type,
            payload = %message.payload,
            "event"
        );
        Ok(())
    }
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    messages: Arc<Mutex<Vec<EventMessage>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns all published messages, oldest first.
    pub fn messages(&self) -> Vec<EventMessage> {
        self.lock().clone()
    }

    /// Returns the messages published on `topic`.
    pub fn messages_for(&self, topic: &str) -> Vec<EventMessage> {
        self.lock()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Polls until at least `count` messages were published on `topic`.
    ///
    /// Returns false if `timeout` elapses first.
    pub async fn wait_for(&self, topic: &str, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.messages_for(topic).len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, message: &EventMessage) -> Result<(), PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Transport("injected publish failure".to_string()));
        }
        self.lock().push(message.clone());
        Ok(())
    }
}
