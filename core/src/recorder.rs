//! The event log recorder.
//!
//! A [`Recorder`] filters events by severity, redacts their payloads, appends
//! them to a bounded history, updates aggregate metrics, and then hands them
//! to the console sink and registered observers.

use crate::analysis::AnalysisReport;
use crate::config::{ConfigError, RecorderConfig};
use crate::export::{export_events, format_plain_line, ExportError, ExportFormat};
use crate::logger::{Logger, ScopedLogger};
use crate::metrics::{AggregateMetrics, MetricsSnapshot};
use crate::models::{ErrorDetail, LogEvent, Payload, PerformanceSample, Severity};
use crate::observer::{notify_all, panic_message, LogObserver, ObserverId, ObserverRegistry};
use crate::redact::{redact, RedactionError};
use crate::sink::{ConsoleSink, TracingSink};
use crate::storage::{BoundedHistory, HistoryQuery};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;
use thiserror::Error;

/// Failures inside the emission pipeline. Never returned to callers.
#[derive(Debug, Error)]
enum EmissionError {
    #[error("Redaction failed: {0}")]
    Redaction(#[from] RedactionError),

    #[error("Emission panicked: {0}")]
    Panicked(String),
}

/// An event before filtering, redaction and timestamping.
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub(crate) level: Severity,
    pub(crate) component: String,
    pub(crate) message: String,
    pub(crate) payload: Option<Payload>,
    pub(crate) error: Option<ErrorDetail>,
    pub(crate) performance: Option<PerformanceSample>,
    pub(crate) correlation_id: Option<String>,
}

impl Draft {
    pub(crate) fn new(
        level: Severity,
        component: String,
        message: String,
        payload: Option<Payload>,
        error: Option<ErrorDetail>,
    ) -> Self {
        Self {
            level,
            component,
            message,
            payload,
            error,
            performance: None,
            correlation_id: None,
        }
    }

    /// Minimal record used when the normal path fails. Carries no payload.
    fn fallback_line(&self) -> String {
        let mut event = LogEvent::new(self.level, self.component.clone(), self.message.clone());
        event.error.clone_from(&self.error);
        format_plain_line(&event)
    }
}

/// History and metrics, always updated together under one lock.
#[derive(Debug)]
struct RecorderState {
    history: BoundedHistory,
    metrics: AggregateMetrics,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Bounded, leveled event log with metrics, analysis and export.
///
/// The recorder is `Send + Sync`; history append and metric update happen
/// atomically per event, and observers only ever see committed events.
///
/// # Example
///
/// ```
/// use logbook_core::{Logger, Recorder, RecorderConfig};
/// use logbook_core::models::Severity;
///
/// let config = RecorderConfig::new("checkout")
///     .with_min_level(Severity::Info)
///     .with_max_entries(100);
/// let recorder = Recorder::new(config).unwrap();
///
/// recorder.debug("dropped by the filter", None);
/// recorder.warn("Inventory low", None);
///
/// let metrics = recorder.metrics();
/// assert_eq!(metrics.total_logs, 1);
/// assert_eq!(metrics.warnings, 1);
/// ```
pub struct Recorder {
    config: RecorderConfig,
    state: Mutex<RecorderState>,
    observers: RwLock<ObserverRegistry>,
    sink: Arc<dyn ConsoleSink>,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Recorder {
    /// Creates a recorder that writes to the [`TracingSink`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: RecorderConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Creates a recorder that writes to the given sink.
    ///
    /// A debug-level startup event describing the configuration is emitted
    /// through the normal path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_sink(config: RecorderConfig, sink: Arc<dyn ConsoleSink>) -> Result<Self, ConfigError> {
        config.validate_config()?;

        let recorder = Self {
            state: Mutex::new(RecorderState {
                history: BoundedHistory::new(config.max_entries),
                metrics: AggregateMetrics::new(),
                last_timestamp: None,
            }),
            observers: RwLock::new(ObserverRegistry::new()),
            sink,
            config,
        };

        let startup_payload = match serde_json::to_value(&recorder.config) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        };
        recorder.debug("Recorder initialized", startup_payload);

        tracing::debug!(
            component = %recorder.config.component,
            min_level = %recorder.config.min_level,
            max_entries = recorder.config.max_entries,
            "Recorder created"
        );

        Ok(recorder)
    }

    /// Creates a new recorder wrapped in an Arc.
    ///
    /// This is useful when sharing the recorder across threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new_shared(config: RecorderConfig) -> Result<Arc<Self>, ConfigError> {
        Self::new(config).map(Arc::new)
    }

    /// Returns the configuration the recorder was built with.
    #[must_use]
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Returns true if an event of `level` would be retained.
    #[must_use]
    pub fn accepts(&self, level: Severity) -> bool {
        self.config.accepts(level)
    }

    /// Returns a handle emitting under another component name.
    #[must_use]
    pub fn scoped(&self, component: impl Into<String>) -> ScopedLogger<'_> {
        ScopedLogger::new(self, component.into())
    }

    /// Emits an info event describing a measured operation.
    ///
    /// `duration_ms`, `memory_bytes` and `cpu_percent` are stamped onto the
    /// payload; the sample itself is attached when performance tracking is on.
    pub fn log_performance(
        &self,
        operation: impl Into<String>,
        sample: PerformanceSample,
        payload: Option<Payload>,
    ) {
        let operation = operation.into();
        let sample = sample.sanitized();
        let mut payload = payload.unwrap_or_default();
        payload.insert("operation".to_string(), Value::from(operation.clone()));
        payload.insert("duration_ms".to_string(), Value::from(sample.duration_ms));
        payload.insert("memory_bytes".to_string(), Value::from(sample.memory_bytes));
        payload.insert("cpu_percent".to_string(), Value::from(sample.cpu_percent));

        let mut draft = Draft::new(
            Severity::Info,
            self.config.component.clone(),
            format!("Performance: {operation}"),
            Some(payload),
            None,
        );
        draft.performance = Some(sample);
        self.emit(draft);
    }

    /// Returns retained events with at least `min_severity`, keeping the most
    /// recent `limit`, oldest first.
    #[must_use]
    pub fn history(&self, min_severity: Option<Severity>, limit: Option<usize>) -> Vec<LogEvent> {
        let query = HistoryQuery {
            min_severity,
            limit,
            ..HistoryQuery::default()
        };
        self.query(&query)
    }

    /// Returns retained events matching `query`, oldest first.
    #[must_use]
    pub fn query(&self, query: &HistoryQuery) -> Vec<LogEvent> {
        self.lock_state().history.query(query)
    }

    /// Returns the number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_state().history.len()
    }

    /// Returns true if no events are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_state().history.is_empty()
    }

    /// Returns the aggregate metrics over every accepted event.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.lock_state().metrics.snapshot()
    }

    /// Runs all analyses over a snapshot of the retained history.
    #[must_use]
    pub fn analyze(&self) -> AnalysisReport {
        let (events, average_latency) = {
            let state = self.lock_state();
            (state.history.snapshot(), state.metrics.average_latency())
        };
        AnalysisReport::build(&events, average_latency)
    }

    /// Exports the retained history.
    ///
    /// # Errors
    ///
    /// Returns an error if structured serialization fails.
    pub fn export(&self, format: ExportFormat) -> Result<String, ExportError> {
        let events = self.lock_state().history.snapshot();
        export_events(&events, format)
    }

    /// Empties the history, then logs the clear as the first new event.
    ///
    /// The clear and the commit of its event happen under one lock, so no
    /// concurrent event can land in between. Aggregate metrics are kept.
    pub fn clear(&self) {
        let mut draft = Draft::new(
            Severity::Info,
            self.config.component.clone(),
            "Log history cleared".to_string(),
            None,
            None,
        );
        let fallback_line = draft.fallback_line();
        let started = Instant::now();

        let mut state = self.lock_state();
        let cleared = state.history.clear();
        if !self.config.accepts(draft.level) {
            return;
        }

        let mut payload = Payload::new();
        payload.insert("cleared".to_string(), Value::from(cleared));
        draft.payload = Some(payload);

        let committed = catch_unwind(AssertUnwindSafe(|| -> Result<LogEvent, EmissionError> {
            let event = self.prepare(draft)?;
            Ok(Self::commit(&mut state, event, started))
        }));
        drop(state);

        self.finish(committed, &fallback_line);
    }

    /// Registers an observer; it is notified after observers registered earlier.
    pub fn subscribe(&self, observer: Arc<dyn LogObserver>) -> ObserverId {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe(observer)
    }

    /// Removes an observer. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unsubscribe(id)
    }

    /// Runs a draft through filter, redaction, storage and notification.
    pub(crate) fn emit(&self, draft: Draft) {
        if !self.config.accepts(draft.level) {
            return;
        }

        let fallback_line = draft.fallback_line();
        let started = Instant::now();
        let committed = catch_unwind(AssertUnwindSafe(|| -> Result<LogEvent, EmissionError> {
            let event = self.prepare(draft)?;
            Ok(Self::commit(&mut self.lock_state(), event, started))
        }));

        self.finish(committed, &fallback_line);
    }

    /// Delivers a committed event, or writes the fallback line if the event
    /// never reached the history.
    fn finish(
        &self,
        committed: std::thread::Result<Result<LogEvent, EmissionError>>,
        fallback_line: &str,
    ) {
        let error = match committed {
            Ok(Ok(event)) => {
                self.deliver(&event);
                return;
            }
            Ok(Err(error)) => error,
            Err(panic) => EmissionError::Panicked(panic_message(panic.as_ref())),
        };

        tracing::warn!(%error, "Failed to record log event, writing fallback line");
        let _ = catch_unwind(AssertUnwindSafe(|| self.sink.fallback(fallback_line)));
    }

    /// Hands a committed event to the sink and then to every observer.
    fn deliver(&self, event: &LogEvent) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| {
            self.sink.write(event.level.into(), event);
        })) {
            tracing::warn!(
                error = %panic_message(panic.as_ref()),
                "Console sink panicked while writing event"
            );
        }

        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot();
        notify_all(&observers, event);
    }

    /// Builds the final event: redacts the payload and applies the toggles.
    fn prepare(&self, draft: Draft) -> Result<LogEvent, EmissionError> {
        let payload = match draft.payload {
            Some(ref payload) if self.config.include_payload => Some(redact(payload)?),
            _ => None,
        };
        let performance = draft
            .performance
            .filter(|_| self.config.performance_tracking)
            .map(PerformanceSample::sanitized);

        Ok(LogEvent {
            timestamp: Utc::now(),
            level: draft.level,
            component: draft.component,
            message: draft.message,
            payload,
            error: draft.error,
            performance,
            correlation_id: draft.correlation_id,
        })
    }

    /// Stores the event together with its metric update.
    fn commit(state: &mut RecorderState, mut event: LogEvent, started: Instant) -> LogEvent {
        if let Some(last) = state.last_timestamp {
            if event.timestamp < last {
                event.timestamp = last;
            }
        }
        state.last_timestamp = Some(event.timestamp);

        state.history.append(event.clone());
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        state.metrics.record(event.level, latency_ms);

        event
    }

    fn lock_state(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Logger for Recorder {
    fn log(
        &self,
        level: Severity,
        message: impl Into<String>,
        payload: Option<Payload>,
        error: Option<ErrorDetail>,
    ) {
        self.emit(Draft::new(
            level,
            self.config.component.clone(),
            message.into(),
            payload,
            error,
        ));
    }
}
