use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;

const RESPONSE_CAPACITY: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("no async runtime available to carry the request")]
    NoRuntime,
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("transport closed")]
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The device answered. Carries the HTTP status.
    Completed { status: u16 },
    Failed(String),
    TimedOut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseEvent {
    pub command: String,
    pub outcome: ResponseOutcome,
}

impl ResponseEvent {
    pub fn completed(command: impl Into<String>, status: u16) -> Self {
        Self {
            command: command.into(),
            outcome: ResponseOutcome::Completed { status },
        }
    }

    pub fn failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            outcome: ResponseOutcome::Failed(reason.into()),
        }
    }

    pub fn timed_out(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            outcome: ResponseOutcome::TimedOut,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Completed { .. })
    }
}

/// Fan-out of response notifications. Every subscriber sees every event
/// published after it subscribed.
#[derive(Clone, Debug)]
pub struct ResponseFeed {
    tx: broadcast::Sender<ResponseEvent>,
}

impl ResponseFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(RESPONSE_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResponseEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: ResponseEvent) {
        tracing::debug!("response: {} -> {:?}", event.command, event.outcome);
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

impl Default for ResponseFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbound side of a camera connection.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Queues `command` for sending and returns without waiting for the
    /// device. The outcome arrives later on [`Transport::responses`].
    fn send_text(&self, command: &str) -> Result<(), TransportError>;

    fn responses(&self) -> ResponseFeed;
}

/// Transport that keeps sent commands in memory. Optionally answers each
/// command with a successful response, which is what `--dry-run` uses.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<String>>,
    feed: ResponseFeed,
    auto_reply: AtomicBool,
    refuse: AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_reply() -> Self {
        let transport = Self::new();
        transport.set_auto_reply(true);
        transport
    }

    pub fn set_auto_reply(&self, enabled: bool) {
        self.auto_reply.store(enabled, Ordering::Release);
    }

    /// While refusing, `send_text` fails with [`TransportError::Closed`].
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::Release);
    }

    pub fn sent(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    pub fn respond(&self, event: ResponseEvent) {
        self.feed.publish(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn send_text(&self, command: &str) -> Result<(), TransportError> {
        if self.refuse.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.lock().push(command.to_string());
        if self.auto_reply.load(Ordering::Acquire) {
            self.feed.publish(ResponseEvent::completed(command, 200));
        }
        Ok(())
    }

    fn responses(&self) -> ResponseFeed {
        self.feed.clone()
    }
}
