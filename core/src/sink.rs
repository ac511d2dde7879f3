//! Console sinks.
//!
//! Every accepted event is written to a pluggable [`ConsoleSink`], keyed by a
//! [`SinkChannel`] derived from its severity. What the sink does with it
//! (terminal output, shipping elsewhere) is up to the implementation.

use crate::export::format_plain_line;
use crate::models::{LogEvent, Severity};

/// Output channel selected by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkChannel {
    /// Trace and debug events.
    Debug,
    /// Info events.
    Info,
    /// Warn events.
    Warn,
    /// Error and fatal events.
    Error,
}

impl From<Severity> for SinkChannel {
    fn from(level: Severity) -> Self {
        match level {
            Severity::Trace | Severity::Debug => Self::Debug,
            Severity::Info => Self::Info,
            Severity::Warn => Self::Warn,
            Severity::Error | Severity::Fatal => Self::Error,
        }
    }
}

/// Destination for accepted events.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait ConsoleSink: Send + Sync {
    /// Writes an accepted, redacted event.
    fn write(&self, channel: SinkChannel, event: &LogEvent);

    /// Writes a minimal plain-text line when the normal emission path failed.
    fn fallback(&self, line: &str);
}

/// Sink that forwards events to `tracing` under the `logbook` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ConsoleSink for TracingSink {
    fn write(&self, channel: SinkChannel, event: &LogEvent) {
        let line = format_plain_line(event);
        match channel {
            SinkChannel::Debug => tracing::debug!(target: "logbook", component = %event.component, "{line}"),
            SinkChannel::Info => tracing::info!(target: "logbook", component = %event.component, "{line}"),
            SinkChannel::Warn => tracing::warn!(target: "logbook", component = %event.component, "{line}"),
            SinkChannel::Error => tracing::error!(target: "logbook", component = %event.component, "{line}"),
        }
    }

    fn fallback(&self, line: &str) {
        tracing::warn!(target: "logbook", fallback = true, "{line}");
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ConsoleSink for NullSink {
    fn write(&self, _channel: SinkChannel, _event: &LogEvent) {}

    fn fallback(&self, _line: &str) {}
}
