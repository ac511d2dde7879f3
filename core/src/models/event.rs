//! Log event data model.
//!
//! Defines the `LogEvent` record held by the recorder's history along with the
//! severity scale and the optional error and performance attachments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Structured key-value payload attached to an event.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Log severity level.
///
/// Totally ordered: `Trace < Debug < Info < Warn < Error < Fatal`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Detailed trace information.
    Trace,
    /// Debug information.
    Debug,
    /// Informational messages.
    #[default]
    Info,
    /// Warning conditions.
    Warn,
    /// Error conditions.
    Error,
    /// Critical/fatal conditions.
    Fatal,
}

impl Severity {
    /// Every severity, lowest rank first.
    pub const ALL: [Severity; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// Returns the integer rank of this severity (0 for trace, 5 for fatal).
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Returns true for `Error` and `Fatal`.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Returns the uppercase tag used by the plain-text export.
    #[must_use]
    pub const fn as_upper(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a severity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown severity level: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Error detail attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error kind or type name, used for error pattern grouping.
    pub kind: String,

    /// Human-readable error message.
    pub message: String,

    /// Optional stack trace or cause chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorDetail {
    /// Creates a new error detail without a stack trace.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// Sets the stack trace.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Builds an error detail from a Rust error value.
    ///
    /// The kind is the unqualified type name of `E`; the cause chain, if any,
    /// is recorded as the stack.
    ///
    /// # Example
    ///
    /// ```
    /// use logbook_core::models::ErrorDetail;
    ///
    /// let err = "abc".parse::<u32>().unwrap_err();
    /// let detail = ErrorDetail::from_error(&err);
    /// assert_eq!(detail.kind, "ParseIntError");
    /// ```
    #[must_use]
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let kind = type_name.rsplit("::").next().unwrap_or(type_name);

        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        Self {
            kind: kind.to_string(),
            message: err.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }
}

/// Resource measurement attached to an event.
///
/// The recorder only carries the shape; sampling is done by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformanceSample {
    /// Duration of the measured operation in milliseconds.
    pub duration_ms: f64,

    /// Memory usage in bytes.
    pub memory_bytes: u64,

    /// CPU usage in percent.
    pub cpu_percent: f64,
}

impl PerformanceSample {
    /// Creates a new sample. Negative or non-finite figures become zero.
    #[must_use]
    pub fn new(duration_ms: f64, memory_bytes: u64, cpu_percent: f64) -> Self {
        Self {
            duration_ms: finite_or_zero(duration_ms),
            memory_bytes,
            cpu_percent: finite_or_zero(cpu_percent),
        }
    }

    /// Returns a copy with the same clamping as [`new`](Self::new) applied.
    ///
    /// The fields are public, so samples built by hand may hold values JSON
    /// cannot represent.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self::new(self.duration_ms, self.memory_bytes, self.cpu_percent)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// A single recorded log event.
///
/// Events are built once at emission time and never changed afterwards; the
/// history hands out clones only.
///
/// # Example
///
/// ```
/// use logbook_core::models::{LogEvent, Severity};
///
/// let event = LogEvent::new(Severity::Warn, "db", "Slow query")
///     .with_attribute("table", "users");
///
/// assert_eq!(event.level, Severity::Warn);
/// assert!(event.payload.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Time the event was emitted.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the event.
    #[serde(default)]
    pub level: Severity,

    /// Name of the emitting subsystem.
    pub component: String,

    /// The log message content.
    pub message: String,

    /// Optional structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,

    /// Optional error detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,

    /// Optional performance sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceSample>,

    /// Optional correlation id supplied by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl LogEvent {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(level: Severity, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.into(),
            message: message.into(),
            payload: None,
            error: None,
            performance: None,
            correlation_id: None,
        }
    }

    /// Overrides the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a single payload attribute. Values that fail to serialize become `null`.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.payload.get_or_insert_with(Payload::new).insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }

    /// Attaches an error detail.
    #[must_use]
    pub fn with_error(mut self, error: ErrorDetail) -> Self {
        self.error = Some(error);
        self
    }

    /// Attaches a performance sample.
    #[must_use]
    pub fn with_performance(mut self, sample: PerformanceSample) -> Self {
        self.performance = Some(sample);
        self
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Returns true if the event is an error or fatal event.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level.is_error()
    }
}
