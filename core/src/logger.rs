//! Ingestion interface.
//!
//! [`Logger`] is implemented by the [`Recorder`] and by the component-scoped
//! [`ScopedLogger`] handles it hands out. Only [`Logger::log`] is required;
//! the per-severity helpers delegate to it.

use crate::models::{ErrorDetail, Payload, Severity};
use crate::recorder::{Draft, Recorder};

/// Severity-leveled ingestion API.
///
/// Logging calls never fail: events below the configured minimum level are
/// dropped and internal failures degrade to a plain-text fallback write.
pub trait Logger {
    /// Emits one event.
    fn log(
        &self,
        level: Severity,
        message: impl Into<String>,
        payload: Option<Payload>,
        error: Option<ErrorDetail>,
    );

    /// Emits a trace event.
    fn trace(&self, message: impl Into<String>, payload: Option<Payload>) {
        self.log(Severity::Trace, message, payload, None);
    }

    /// Emits a debug event.
    fn debug(&self, message: impl Into<String>, payload: Option<Payload>) {
        self.log(Severity::Debug, message, payload, None);
    }

    /// Emits an info event.
    fn info(&self, message: impl Into<String>, payload: Option<Payload>) {
        self.log(Severity::Info, message, payload, None);
    }

    /// Emits a warn event.
    fn warn(&self, message: impl Into<String>, payload: Option<Payload>) {
        self.log(Severity::Warn, message, payload, None);
    }

    /// Emits an error event.
    fn error(&self, message: impl Into<String>, error: Option<ErrorDetail>, payload: Option<Payload>) {
        self.log(Severity::Error, message, payload, error);
    }

    /// Emits a fatal event.
    fn fatal(&self, message: impl Into<String>, error: Option<ErrorDetail>, payload: Option<Payload>) {
        self.log(Severity::Fatal, message, payload, error);
    }
}

/// Handle that emits through a recorder under another component name.
///
/// # Example
///
/// ```
/// use logbook_core::{Logger, Recorder, RecorderConfig};
///
/// let recorder = Recorder::new(RecorderConfig::new("app")).unwrap();
/// recorder.scoped("db").with_correlation_id("req-7").info("Connected", None);
///
/// let last = recorder.history(None, Some(1)).pop().unwrap();
/// assert_eq!(last.component, "db");
/// assert_eq!(last.correlation_id.as_deref(), Some("req-7"));
/// ```
#[derive(Debug, Clone)]
pub struct ScopedLogger<'a> {
    recorder: &'a Recorder,
    component: String,
    correlation_id: Option<String>,
}

impl<'a> ScopedLogger<'a> {
    pub(crate) fn new(recorder: &'a Recorder, component: String) -> Self {
        Self {
            recorder,
            component,
            correlation_id: None,
        }
    }

    /// Stamps every event from this handle with a correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Returns the component name of this handle.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Logger for ScopedLogger<'_> {
    fn log(
        &self,
        level: Severity,
        message: impl Into<String>,
        payload: Option<Payload>,
        error: Option<ErrorDetail>,
    ) {
        let mut draft = Draft::new(level, self.component.clone(), message.into(), payload, error);
        draft.correlation_id.clone_from(&self.correlation_id);
        self.recorder.emit(draft);
    }
}
