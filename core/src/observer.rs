//! Event observers.
//!
//! Observers are notified, in registration order, with every accepted event
//! after it has been committed to history and metrics. A failing or
//! panicking observer is isolated from the others.

use crate::models::LogEvent;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Errors reported by observers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// The receiving side of a channel observer was dropped.
    #[error("Observer channel is closed")]
    Disconnected,

    /// The observer panicked while handling an event.
    #[error("Observer panicked: {0}")]
    Panicked(String),

    /// The observer failed for its own reasons.
    #[error("Observer failed: {0}")]
    Failed(String),
}

/// Receives accepted, redacted events.
pub trait LogObserver: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the observer could not handle the event. The
    /// recorder logs it and carries on with the remaining observers.
    fn notify(&self, event: &LogEvent) -> Result<(), ObserverError>;
}

impl<F> LogObserver for F
where
    F: Fn(&LogEvent) -> Result<(), ObserverError> + Send + Sync,
{
    fn notify(&self, event: &LogEvent) -> Result<(), ObserverError> {
        self(event)
    }
}

/// Handle returned by [`ObserverRegistry::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Ordered list of observers.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<(ObserverId, Arc<dyn LogObserver>)>,
    next_id: u64,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl ObserverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer and returns its id.
    pub fn subscribe(&mut self, observer: Arc<dyn LogObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Removes an observer. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns true if no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Returns the observers in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(ObserverId, Arc<dyn LogObserver>)> {
        self.observers.clone()
    }
}

/// Delivers `event` to every observer in order and returns the failures.
///
/// Panics inside an observer are caught and reported as
/// [`ObserverError::Panicked`].
pub fn notify_all(
    observers: &[(ObserverId, Arc<dyn LogObserver>)],
    event: &LogEvent,
) -> Vec<(ObserverId, ObserverError)> {
    let mut failures = Vec::new();

    for (id, observer) in observers {
        let outcome = catch_unwind(AssertUnwindSafe(|| observer.notify(event)))
            .unwrap_or_else(|panic| Err(ObserverError::Panicked(panic_message(panic.as_ref()))));

        if let Err(error) = outcome {
            tracing::warn!(observer = ?id, %error, "Observer failed to handle event");
            failures.push((*id, error));
        }
    }

    failures
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Observer that forwards events into an unbounded tokio channel.
///
/// # Example
///
/// ```
/// use logbook_core::models::{LogEvent, Severity};
/// use logbook_core::observer::{ChannelObserver, LogObserver};
///
/// let (observer, mut rx) = ChannelObserver::new();
/// observer.notify(&LogEvent::new(Severity::Info, "app", "hello")).unwrap();
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.message, "hello");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: UnboundedSender<LogEvent>,
}

impl ChannelObserver {
    /// Creates an observer and the receiver it feeds.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<LogEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Wraps an existing sender.
    #[must_use]
    pub fn from_sender(sender: UnboundedSender<LogEvent>) -> Self {
        Self { sender }
    }
}

impl LogObserver for ChannelObserver {
    fn notify(&self, event: &LogEvent) -> Result<(), ObserverError> {
        self.sender
            .send(event.clone())
            .map_err(|_| ObserverError::Disconnected)
    }
}
