//! History export.
//!
//! Serializes retained events either as a lossless JSON document or as
//! human-readable plain text, one line per event.

use crate::models::LogEvent;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export or import.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The requested format name is not known.
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    /// JSON serialization or parsing failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pretty-printed JSON array of events.
    #[default]
    Structured,
    /// `[timestamp] [LEVEL] component: message` lines.
    Plain,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" | "json" => Ok(Self::Structured),
            "plain" | "text" | "plain-text" => Ok(Self::Plain),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Formats one event as `[ISO-8601 timestamp] [LEVEL] component: message`.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use logbook_core::export::format_plain_line;
/// use logbook_core::models::{LogEvent, Severity};
///
/// let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
/// let event = LogEvent::new(Severity::Warn, "db", "Slow query").with_timestamp(ts);
///
/// assert_eq!(
///     format_plain_line(&event),
///     "[2024-01-15T10:30:00.000Z] [WARN] db: Slow query"
/// );
/// ```
#[must_use]
pub fn format_plain_line(event: &LogEvent) -> String {
    format!(
        "[{}] [{}] {}: {}",
        event
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        event.level.as_upper(),
        event.component,
        event.message
    )
}

/// Serializes `events` in the given format, preserving their order.
///
/// # Errors
///
/// Returns an error if structured serialization fails.
pub fn export_events(events: &[LogEvent], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Structured => Ok(serde_json::to_string_pretty(events)?),
        ExportFormat::Plain => Ok(events
            .iter()
            .map(format_plain_line)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Parses a structured export back into events.
///
/// # Errors
///
/// Returns an error if the input is not a JSON array of events.
pub fn import_structured(input: &str) -> Result<Vec<LogEvent>, ExportError> {
    Ok(serde_json::from_str(input)?)
}
