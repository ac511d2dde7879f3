//! Bounded event history.
//!
//! Provides the `BoundedHistory` ring buffer that retains the most recent
//! events up to a fixed capacity, and the `HistoryQuery` used to read
//! snapshots from it.

use crate::models::{LogEvent, Severity};
use std::collections::VecDeque;

/// Query parameters for reading the retained history.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    /// Keep only events with at least this severity.
    pub min_severity: Option<Severity>,

    /// Filter by component name (exact match).
    pub component: Option<String>,

    /// Filter by message content (case-insensitive substring match).
    pub message_contains: Option<String>,

    /// Keep only the most recent `limit` matching events.
    pub limit: Option<usize>,
}

impl HistoryQuery {
    /// Creates a new empty query (returns the whole history).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum severity filter.
    #[must_use]
    pub fn with_min_severity(mut self, level: Severity) -> Self {
        self.min_severity = Some(level);
        self
    }

    /// Sets the component filter (exact match).
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the message contains filter (case-insensitive substring match).
    #[must_use]
    pub fn with_message_contains(mut self, pattern: impl Into<String>) -> Self {
        self.message_contains = Some(pattern.into());
        self
    }

    /// Sets the maximum number of results.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, event: &LogEvent, message_pattern: Option<&str>) -> bool {
        if let Some(min) = self.min_severity {
            if event.level < min {
                return false;
            }
        }

        if let Some(ref component) = self.component {
            if &event.component != component {
                return false;
            }
        }

        if let Some(pattern) = message_pattern {
            if !event.message.to_lowercase().contains(pattern) {
                return false;
            }
        }

        true
    }
}

/// Capacity-limited, insertion-ordered event store.
///
/// Appending beyond capacity evicts from the front, so the history always
/// holds the newest `capacity` events in chronological order.
///
/// # Example
///
/// ```
/// use logbook_core::models::{LogEvent, Severity};
/// use logbook_core::storage::{BoundedHistory, HistoryQuery};
///
/// let mut history = BoundedHistory::new(2);
/// history.append(LogEvent::new(Severity::Info, "app", "one"));
/// history.append(LogEvent::new(Severity::Info, "app", "two"));
/// history.append(LogEvent::new(Severity::Info, "app", "three"));
///
/// let events = history.query(&HistoryQuery::new());
/// assert_eq!(events.len(), 2);
/// assert_eq!(events[0].message, "two");
/// ```
#[derive(Debug, Clone)]
pub struct BoundedHistory {
    events: VecDeque<LogEvent>,
    capacity: usize,
}

impl BoundedHistory {
    /// Creates an empty history. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Appends an event, evicting the oldest ones while over capacity.
    ///
    /// Returns the number of evicted events.
    pub fn append(&mut self, event: LogEvent) -> usize {
        self.events.push_back(event);
        let mut evicted = 0;
        while self.events.len() > self.capacity {
            self.events.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Returns a snapshot of the events matching `query`, oldest first.
    #[must_use]
    pub fn query(&self, query: &HistoryQuery) -> Vec<LogEvent> {
        let message_pattern = query.message_contains.as_ref().map(|s| s.to_lowercase());

        let filtered: Vec<&LogEvent> = self
            .events
            .iter()
            .filter(|event| query.matches(event, message_pattern.as_deref()))
            .collect();

        let skip = query
            .limit
            .map_or(0, |limit| filtered.len().saturating_sub(limit));

        filtered.into_iter().skip(skip).cloned().collect()
    }

    /// Returns a copy of every retained event, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogEvent> {
        self.events.iter().cloned().collect()
    }

    /// Removes all events and returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.events.len();
        self.events.clear();
        dropped
    }

    /// Returns the number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the newest retained event.
    #[must_use]
    pub fn last(&self) -> Option<&LogEvent> {
        self.events.back()
    }

    /// Iterates over retained events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter()
    }
}
